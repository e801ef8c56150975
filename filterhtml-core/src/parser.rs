//! parser.rs - The single-pass structural filter.
//!
//! A forward-only state machine over a [`Cursor`]. Text accumulates in a pending
//! buffer and is flushed (escaped, or rewritten by the caller's text filter) at
//! every tag boundary. Opening tags are resolved against the whitelist and their
//! attributes filtered one by one; accepted non-void elements are pushed on the
//! tag stack and must be closed in order. `script` content is raw text whose
//! fate depends on how the whitelist treats `script`.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashSet;

use log::{debug, trace};

use crate::cursor::Cursor;
use crate::diagnostics::{log_dropped_attribute, loggable};
use crate::errors::{FilterHtmlError, Position};
use crate::profiles::{AllowedSchemes, TextFilter};
use crate::resolver::{alias_target, resolve, Resolution, ResolvedTag};
use crate::sanitizers::attributes::{filter_attribute, PurifyContext, Purified};
use crate::sanitizers::text::escape_text;
use crate::spec::{AttributeRules, DelegateOutcome, TagSpec, TagStackEntry, WhitelistSpec};

/// How many times text filter output may be fed back through the filter.
pub const MAX_REWRITE_DEPTH: usize = 4;

/// Elements that never have content or a closing tag.
pub const VOID_ELEMENTS: [&str; 20] = [
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr", "basefont", "bgsound", "frame", "isindex",
];

const RAW_TEXT_ELEMENT: &str = "script";

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

fn is_tag_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || ('1'..='6').contains(&c)
}

fn is_attribute_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'
}

fn ends_unquoted_value(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '=' | '<' | '>')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    /// Inside a removed element; everything is dropped until it closes.
    SkipData,
    RawText,
    RawTextLessThanSign,
}

/// What happens to `script` content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawMode {
    Drop,
    Escape,
    Verbatim,
}

#[derive(Debug)]
struct Removal {
    name: String,
    depth: usize,
}

/// Everything one filtering pass reads but never changes.
#[derive(Debug, Clone, Copy)]
pub struct FilterSettings<'a> {
    pub spec: &'a WhitelistSpec,
    pub schemes: &'a AllowedSchemes,
    pub removals: &'a HashSet<String>,
    pub text_filter: Option<&'a TextFilter>,
    /// Re-sanitization depth; 0 for the caller's own input.
    pub depth: usize,
}

impl<'a> FilterSettings<'a> {
    /// Filters `html` in one pass.
    pub fn run(&self, html: &str) -> Result<String, FilterHtmlError> {
        if self.depth > MAX_REWRITE_DEPTH {
            return Err(FilterHtmlError::RewriteDepthExceeded(MAX_REWRITE_DEPTH));
        }
        Parser::new(html, *self).run()
    }

    /// Settings for re-sanitizing text filter output. The nested pass has no
    /// text filter of its own.
    fn nested(&self) -> Self {
        Self {
            text_filter: None,
            depth: self.depth + 1,
            ..*self
        }
    }
}

struct Parser<'a> {
    settings: FilterSettings<'a>,
    cursor: Cursor<'a>,
    state: State,
    stack: Vec<TagStackEntry>,
    pending: String,
    output: String,
    raw_mode: RawMode,
    /// Whether the open `script` element was emitted and pushed.
    raw_pushed: bool,
    removing: Option<Removal>,
    /// Process the cursor's current character again instead of advancing.
    reconsume: bool,
}

impl<'a> Parser<'a> {
    fn new(html: &'a str, settings: FilterSettings<'a>) -> Self {
        Self {
            settings,
            cursor: Cursor::new(html),
            state: State::Data,
            stack: Vec::new(),
            pending: String::new(),
            output: String::with_capacity(html.len()),
            raw_mode: RawMode::Escape,
            raw_pushed: false,
            removing: None,
            reconsume: false,
        }
    }

    fn run(mut self) -> Result<String, FilterHtmlError> {
        loop {
            let next = if self.reconsume {
                self.reconsume = false;
                self.cursor.current()
            } else {
                self.cursor.advance()
            };
            let Some(c) = next else { break };

            match (self.state, c) {
                (State::Data, '<') => self.tag_open()?,
                (State::Data, _) => self.pending.push(c),
                (State::SkipData, '<') => self.skipped_tag(),
                (State::SkipData, _) => {}
                (State::RawText, '<') => self.raw_text_less_than_sign()?,
                (State::RawText, _) => self.push_raw(c),
                (State::RawTextLessThanSign, _) => {
                    // The probe always leaves this state before returning.
                    self.state = State::RawText;
                    self.reconsume = true;
                }
            }
        }
        self.finish()
    }

    fn finish(mut self) -> Result<String, FilterHtmlError> {
        self.flush_text()?;
        if !self.stack.is_empty() {
            return Err(FilterHtmlError::UnclosedTags {
                tags: self.stack.into_iter().map(|entry| entry.name).collect(),
                position: self.cursor.position(),
            });
        }
        Ok(self.output)
    }

    fn in_raw_text(&self) -> bool {
        matches!(self.state, State::RawText | State::RawTextLessThanSign)
    }

    fn flush_text(&mut self) -> Result<(), FilterHtmlError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.pending);
        let rendered = match self.raw_mode {
            RawMode::Verbatim if self.in_raw_text() => text,
            RawMode::Drop if self.in_raw_text() => String::new(),
            _ => self.process_text(&text)?,
        };
        self.output.push_str(&rendered);
        Ok(())
    }

    fn process_text(&self, text: &str) -> Result<String, FilterHtmlError> {
        match self.settings.text_filter {
            Some(filter) => {
                let rewritten = filter.call(text, &self.stack);
                trace!("Re-sanitizing text filter output at depth {}", self.settings.depth + 1);
                self.settings.nested().run(&rewritten)
            }
            None => Ok(escape_text(text, false)),
        }
    }

    /// Current character is `<` in the data state.
    fn tag_open(&mut self) -> Result<(), FilterHtmlError> {
        let start = self.cursor.position();
        self.flush_text()?;
        match self.cursor.advance() {
            Some('/') => {
                self.cursor.advance();
                self.closing_tag(start)
            }
            Some('!') => {
                self.skip_declaration();
                Ok(())
            }
            _ => self.opening_tag(start),
        }
    }

    /// Current character is the `!` of `<!`. Comments run to `-->`, anything
    /// else to the next `>`.
    fn skip_declaration(&mut self) {
        if self.cursor.advance() == Some('-') && self.cursor.advance() == Some('-') {
            let mut dashes = 0;
            while let Some(c) = self.cursor.advance() {
                match c {
                    '-' => dashes += 1,
                    '>' if dashes >= 2 => return,
                    _ => dashes = 0,
                }
            }
        } else {
            self.cursor.skip_to_tag_end();
        }
    }

    fn opening_tag(&mut self, start: Position) -> Result<(), FilterHtmlError> {
        self.cursor.skip_whitespace();
        let name = self.cursor.take_lowercase_while(is_tag_name_char);
        let resolution = if name.is_empty() {
            Resolution::Unknown
        } else {
            resolve(self.settings.spec, &name, &self.stack)
        };

        if name == RAW_TEXT_ELEMENT {
            return self.raw_text_open(resolution, start);
        }

        if matches!(resolution, Resolution::Removed) || self.settings.removals.contains(&name) {
            self.cursor.skip_to_tag_end();
            debug!(target: "filterhtml_core::parser", "Removing <{}> and its content", name);
            if !is_void_element(&name) {
                self.removing = Some(Removal { name, depth: 1 });
                self.state = State::SkipData;
            }
            return Ok(());
        }

        match resolution {
            Resolution::Resolved(tag) => self.emit_opening(tag, start),
            _ => {
                let rest = self.cursor.skip_to_tag_end();
                debug!(
                    target: "filterhtml_core::parser",
                    "Stripped unknown tag <{}> (attributes: {})",
                    name,
                    loggable(&rest)
                );
                Ok(())
            }
        }
    }

    /// Filters the attributes up to `>` and writes the opening tag.
    fn emit_opening(&mut self, tag: ResolvedTag<'_>, start: Position) -> Result<(), FilterHtmlError> {
        let spec = self.settings.spec;
        let ctx = PurifyContext {
            schemes: self.settings.schemes,
        };
        let mut attributes = tag.injected;

        while let Some(c) = self.cursor.current() {
            if c == '>' {
                break;
            }
            if c.is_whitespace() {
                self.cursor.skip_whitespace();
                continue;
            }
            if let Some(attribute) =
                self.attribute(&tag.name, &tag.rules, spec.global_attributes(), ctx, start)?
            {
                attributes.push(attribute);
            }
        }

        self.output.push('<');
        self.output.push_str(&tag.name);
        for attribute in &attributes {
            self.output.push(' ');
            self.output.push_str(attribute);
        }
        self.output.push('>');

        if !is_void_element(&tag.name) {
            self.stack.push(TagStackEntry {
                name: tag.name,
                attributes,
            });
        }
        Ok(())
    }

    /// Reads one attribute starting at a non-whitespace character and returns
    /// its rendering if it survives. Always consumes at least one character
    /// unless the current one is `>`.
    fn attribute(
        &mut self,
        tag: &str,
        rules: &AttributeRules,
        globals: &AttributeRules,
        ctx: PurifyContext<'_>,
        start: Position,
    ) -> Result<Option<String>, FilterHtmlError> {
        let name = self.cursor.take_lowercase_while(is_attribute_name_char);
        self.cursor.skip_whitespace();

        match self.cursor.current() {
            Some('=') => {
                self.cursor.advance();
                let (value, quote) = self.attribute_value(tag, &name, start)?;
                if name.is_empty() {
                    return Ok(None);
                }
                let rendered = match filter_attribute(&name, Some(value.as_str()), rules, globals, ctx) {
                    Some(Purified::Value(purified)) => Some(render_attribute(&name, &purified, quote)),
                    Some(Purified::Bare) => Some(name),
                    None => {
                        log_dropped_attribute(tag, &name, Some(value.as_str()));
                        None
                    }
                };
                Ok(rendered)
            }
            Some(c) if c != '>' && !is_attribute_name_char(c.to_ascii_lowercase()) => {
                // Junk after a name invalidates it; skip one character.
                self.cursor.advance();
                if !name.is_empty() {
                    log_dropped_attribute(tag, &name, None);
                }
                Ok(None)
            }
            _ if name.is_empty() => Ok(None),
            _ => match filter_attribute(&name, None, rules, globals, ctx) {
                Some(_) => Ok(Some(name)),
                None => {
                    log_dropped_attribute(tag, &name, None);
                    Ok(None)
                }
            },
        }
    }

    /// Reads a value after `=`. Returns the raw value and the quote character
    /// to render it with.
    fn attribute_value(
        &mut self,
        tag: &str,
        attribute: &str,
        start: Position,
    ) -> Result<(String, char), FilterHtmlError> {
        let spaces = self.cursor.skip_whitespace();
        let mut value = String::new();

        match self.cursor.current() {
            Some(quote @ ('"' | '\'')) => {
                loop {
                    match self.cursor.advance() {
                        None => {
                            return Err(FilterHtmlError::UnterminatedQuote {
                                tag: tag.to_string(),
                                attribute: attribute.to_string(),
                                position: start,
                            })
                        }
                        Some(c) if c == quote => break,
                        Some(c) => value.push(c),
                    }
                }
                self.cursor.advance();
                Ok((value, quote))
            }
            // `name= next` has an empty value; `next` is a new attribute.
            _ if spaces > 0 => Ok((value, '"')),
            _ => {
                while let Some(c) = self.cursor.current() {
                    if ends_unquoted_value(c) {
                        break;
                    }
                    value.push(c);
                    self.cursor.advance();
                }
                Ok((value, '"'))
            }
        }
    }

    fn closing_tag(&mut self, start: Position) -> Result<(), FilterHtmlError> {
        self.cursor.skip_whitespace();
        let name = self.cursor.take_lowercase_while(is_tag_name_char);
        let rest = self.cursor.skip_to_tag_end();
        if !rest.trim().is_empty() {
            trace!("Ignoring junk in closing tag </{}>: {}", name, loggable(&rest));
        }
        if name.is_empty() {
            return Ok(());
        }

        let spec = self.settings.spec;
        let (target, tag_spec) = alias_target(spec, &name);
        if is_void_element(&target) {
            return Ok(());
        }
        match tag_spec {
            Some(TagSpec::Allow(_)) => self.close_element(target, start),
            // Delegates decide per occurrence, so the closing tag asks again
            // with the elements open at this point.
            Some(TagSpec::Delegate(delegate)) => match delegate.call(&target, &self.stack) {
                DelegateOutcome::Allow(_) => self.close_element(target, start),
                DelegateOutcome::Remove | DelegateOutcome::Unknown => {
                    debug!(target: "filterhtml_core::parser", "Stripped closing tag </{}>", name);
                    Ok(())
                }
            },
            _ => {
                debug!(target: "filterhtml_core::parser", "Stripped closing tag </{}>", name);
                Ok(())
            }
        }
    }

    fn close_element(&mut self, name: String, start: Position) -> Result<(), FilterHtmlError> {
        let Some(open) = self.stack.last() else {
            return Err(FilterHtmlError::UnexpectedClosingTag {
                tag: name,
                position: start,
            });
        };
        if open.name != name {
            return Err(FilterHtmlError::MismatchedClosingTag {
                open: open.name.clone(),
                close: name,
                position: start,
            });
        }
        self.stack.pop();
        self.output.push_str("</");
        self.output.push_str(&name);
        self.output.push('>');
        Ok(())
    }

    /// Current character is `<` inside a removed element. Only tags with the
    /// removed element's name matter; they are depth-counted.
    fn skipped_tag(&mut self) {
        let closing = self.cursor.advance() == Some('/');
        if closing {
            self.cursor.advance();
        }
        let name = self.cursor.take_lowercase_while(is_tag_name_char);

        let Some(removal) = self.removing.as_mut() else {
            self.state = State::Data;
            return;
        };
        if name != removal.name {
            self.reconsume = true;
            return;
        }

        self.cursor.skip_to_tag_end();
        if closing {
            removal.depth -= 1;
        } else {
            removal.depth += 1;
        }
        if removal.depth == 0 {
            debug!(target: "filterhtml_core::parser", "Finished removing <{}>", removal.name);
            self.removing = None;
            self.state = State::Data;
        }
    }

    /// Opening `script` tag. The tag itself follows the normal rules; the raw
    /// text mode depends on how it resolved.
    fn raw_text_open(&mut self, resolution: Resolution<'_>, start: Position) -> Result<(), FilterHtmlError> {
        let removed = self.settings.removals.contains(RAW_TEXT_ELEMENT);
        self.raw_pushed = false;
        self.raw_mode = match (&resolution, removed) {
            (Resolution::Removed, _) | (_, true) => RawMode::Drop,
            (Resolution::Resolved(tag), false) if !tag.via_alias => RawMode::Verbatim,
            _ => RawMode::Escape,
        };

        match resolution {
            Resolution::Resolved(tag) if self.raw_mode != RawMode::Drop => {
                let depth = self.stack.len();
                self.emit_opening(tag, start)?;
                self.raw_pushed = self.stack.len() > depth;
            }
            _ => {
                self.cursor.skip_to_tag_end();
            }
        }
        trace!("Entering raw text ({:?})", self.raw_mode);
        self.state = State::RawText;
        Ok(())
    }

    fn push_raw(&mut self, c: char) {
        if self.raw_mode != RawMode::Drop {
            self.pending.push(c);
        }
    }

    /// Current character is `<` in raw text. Probes for `</script`; anything
    /// else is literal text and the first unmatched character is reconsumed.
    fn raw_text_less_than_sign(&mut self) -> Result<(), FilterHtmlError> {
        let start = self.cursor.position();
        self.state = State::RawTextLessThanSign;
        let mut probed = String::from("<");

        if self.cursor.advance() == Some('/') {
            probed.push('/');
            self.cursor.advance();
            let mut matched = 0;
            for expected in RAW_TEXT_ELEMENT.chars() {
                match self.cursor.current() {
                    Some(c) if c.to_ascii_lowercase() == expected => {
                        probed.push(c);
                        matched += 1;
                        self.cursor.advance();
                    }
                    _ => break,
                }
            }
            let terminated = match self.cursor.current() {
                None => true,
                Some(c) => c.is_whitespace() || c == '>' || c == '/',
            };
            if matched == RAW_TEXT_ELEMENT.len() && terminated {
                self.cursor.skip_to_tag_end();
                return self.raw_text_close(start);
            }
        }

        for c in probed.chars() {
            self.push_raw(c);
        }
        self.reconsume = true;
        self.state = State::RawText;
        Ok(())
    }

    fn raw_text_close(&mut self, start: Position) -> Result<(), FilterHtmlError> {
        self.flush_text()?;
        self.state = State::Data;
        if self.raw_pushed {
            self.raw_pushed = false;
            if let Some(open) = self.stack.last() {
                let name = open.name.clone();
                return self.close_element(name, start);
            }
        }
        Ok(())
    }
}

/// `name="value"`, keeping the source quote character and escaping it inside
/// the value.
fn render_attribute(name: &str, value: &str, quote: char) -> String {
    let escaped = match quote {
        '\'' => value.replace('\'', "&apos;"),
        _ => value.replace('"', "&quot;"),
    };
    format!("{}={}{}{}", name, quote, escaped, quote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Rule, Semantic};

    fn filter_with(html: &str, spec: &WhitelistSpec, text_filter: Option<&TextFilter>) -> Result<String, FilterHtmlError> {
        let schemes = AllowedSchemes::default();
        let removals = spec.default_removals();
        FilterSettings {
            spec,
            schemes: &schemes,
            removals: &removals,
            text_filter,
            depth: 0,
        }
        .run(html)
    }

    fn filter(html: &str, spec: &WhitelistSpec) -> String {
        filter_with(html, spec, None).unwrap()
    }

    fn basic() -> WhitelistSpec {
        WhitelistSpec::new()
            .tag("b", AttributeRules::new())
            .tag("br", AttributeRules::new())
            .tag("div", AttributeRules::new())
            .tag(
                "a",
                AttributeRules::new()
                    .allow("href", Semantic::Url)
                    .allow("title", Semantic::Text),
            )
            .tag("input", AttributeRules::new().allow("checked", Semantic::Boolean))
    }

    #[test]
    fn test_void_elements() {
        assert!(is_void_element("br") && is_void_element("isindex"));
        assert!(!is_void_element("div"));
        assert_eq!(filter("<br>a<br/>b", &basic()), "<br>a<br>b");
    }

    #[test]
    fn test_whitespace_after_angle_and_uppercase_names() {
        assert_eq!(filter("< B >x</ b >", &basic()), "<b>x</b>");
    }

    #[test]
    fn test_comments_and_declarations_are_skipped() {
        let spec = basic();
        assert_eq!(filter("<!DOCTYPE html><b>x</b>", &spec), "<b>x</b>");
        assert_eq!(filter("a<!-- <b> -- > -->b", &spec), "ab");
        assert_eq!(filter("a<!---->b", &spec), "ab");
    }

    #[test]
    fn test_unquoted_values_stop_at_delimiters() {
        let spec = basic();
        assert_eq!(
            filter("<a href=/x.html title=hi>x</a>", &spec),
            "<a href=\"/x.html\" title=\"hi\">x</a>"
        );
        assert_eq!(filter("<a href=`javascript:x`>x</a>", &spec), "<a href=\"#\">x</a>");
    }

    #[test]
    fn test_junk_invalidates_attribute() {
        let spec = basic();
        assert_eq!(filter("<input checked\"x\">", &spec), "<input>");
        assert_eq!(filter("<input \"checked>", &spec), "<input checked>");
        assert_eq!(filter("<input =x checked>", &spec), "<input checked>");
    }

    #[test]
    fn test_quote_kept_and_escaped() {
        let spec = WhitelistSpec::new().tag(
            "span",
            AttributeRules::new()
                .allow("title", Rule::Any)
                .allow("lang", Rule::delegate(|_| Some("a'b\"c".to_string()))),
        );
        assert_eq!(
            filter("<span title='say \"hi\"'>x</span>", &spec),
            "<span title='say \"hi\"'>x</span>"
        );
        assert_eq!(
            filter("<span lang=en>x</span>", &spec),
            "<span lang=\"a'b&quot;c\">x</span>"
        );
        assert_eq!(
            filter("<span lang='en'>x</span>", &spec),
            "<span lang='a&apos;b\"c'>x</span>"
        );
    }

    #[test]
    fn test_structural_errors() {
        let spec = basic();
        assert!(matches!(
            filter_with("<b>x", &spec, None),
            Err(FilterHtmlError::UnclosedTags { ref tags, .. }) if tags == &vec!["b".to_string()]
        ));
        assert!(matches!(
            filter_with("x</b>", &spec, None),
            Err(FilterHtmlError::UnexpectedClosingTag { ref tag, .. }) if tag == "b"
        ));
        assert!(matches!(
            filter_with("<div><b></div>", &spec, None),
            Err(FilterHtmlError::MismatchedClosingTag { ref open, ref close, .. }) if open == "b" && close == "div"
        ));
        // Closing tags of unknown and void elements are simply dropped.
        assert_eq!(filter("x</span></br>", &spec), "x");
    }

    #[test]
    fn test_unterminated_quote_position() {
        let err = filter_with("<br>\n<a href=\"foo", &basic(), None).unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.position().map(|p| p.line), Some(2));
    }

    #[test]
    fn test_removed_elements_are_depth_counted() {
        let spec = basic().remove("section");
        assert_eq!(
            filter("a<section><section>x</section>y</section>b", &spec),
            "ab"
        );
        assert_eq!(filter("a<section>1 < 2 </b></section>b", &spec), "ab");
    }

    #[test]
    fn test_tags_inside_removed_elements_are_ignored() {
        let spec = basic().remove("section");
        assert_eq!(filter("<section><b>x</section>ok", &spec), "ok");
    }

    #[test]
    fn test_raw_text_probe_pushes_back() {
        let spec = WhitelistSpec::new().alias("script", "pre").tag("pre", AttributeRules::new());
        assert_eq!(
            filter("<script>a </scrip <<b </scriptx></SCRIPT >c", &spec),
            "<pre>a &lt;/scrip &lt;&lt;b &lt;/scriptx&gt;</pre>c"
        );
    }

    #[test]
    fn test_raw_text_modes() {
        let verbatim = WhitelistSpec::new().tag("script", AttributeRules::new());
        assert_eq!(
            filter("<script>if (a < b) {}</script>", &verbatim),
            "<script>if (a < b) {}</script>"
        );

        let dropped = basic();
        assert_eq!(filter("<script>x < y</script>ok", &dropped), "ok");

        let schemes = AllowedSchemes::default();
        let removals = HashSet::new();
        let escaped = FilterSettings {
            spec: &dropped,
            schemes: &schemes,
            removals: &removals,
            text_filter: None,
            depth: 0,
        }
        .run("<script>x < <b>y</b></script>")
        .unwrap();
        assert_eq!(escaped, "x &lt; &lt;b&gt;y&lt;/b&gt;");
    }

    #[test]
    fn test_delegate_closing_tags() {
        let spec = basic().tag("span", AttributeRules::new()).delegate("em", |_, stack| {
            if stack.iter().any(|e| e.name == "span") {
                DelegateOutcome::Allow(AttributeRules::new())
            } else {
                DelegateOutcome::Unknown
            }
        });
        assert_eq!(
            filter("<em>a</em><span><em>b</em></span>", &spec),
            "a<span><em>b</em></span>"
        );
    }

    #[test]
    fn test_delegate_closing_tags_must_nest() {
        let spec = basic().delegate("em", |_, _| DelegateOutcome::Allow(AttributeRules::new()));
        let err = filter_with("<em><b></em></b></em>", &spec, None).unwrap_err();
        assert!(matches!(
            err,
            FilterHtmlError::MismatchedClosingTag { ref open, ref close, .. } if open == "b" && close == "em"
        ));
        let err = filter_with("x</em>", &spec, None).unwrap_err();
        assert!(matches!(err, FilterHtmlError::UnexpectedClosingTag { ref tag, .. } if tag == "em"));
    }

    #[test]
    fn test_text_filter_output_is_resanitized() {
        let spec = basic();
        let shout = TextFilter::new(|text, _| format!("<b onclick=x>{}</b><script>evil()</script>", text.trim()));
        assert_eq!(
            filter_with("<div> hi </div>", &spec, Some(&shout)).unwrap(),
            "<div><b>hi</b></div>"
        );
    }

    #[test]
    fn test_text_filter_sees_ancestry() {
        let spec = basic();
        let tagger = TextFilter::new(|text, stack| {
            let path: Vec<&str> = stack.iter().map(|e| e.name.as_str()).collect();
            format!("{}[{}]", text, path.join("/"))
        });
        assert_eq!(
            filter_with("<div><b>x</b></div>", &spec, Some(&tagger)).unwrap(),
            "<div><b>x[div/b]</b></div>"
        );
    }

    #[test]
    fn test_rewrite_depth_guard() {
        let spec = basic();
        let schemes = AllowedSchemes::default();
        let removals = spec.default_removals();
        let settings = FilterSettings {
            spec: &spec,
            schemes: &schemes,
            removals: &removals,
            text_filter: None,
            depth: MAX_REWRITE_DEPTH + 1,
        };
        assert!(matches!(
            settings.run("x"),
            Err(FilterHtmlError::RewriteDepthExceeded(MAX_REWRITE_DEPTH))
        ));
    }
}
