//! Entity-preserving escaping of character data and `text` attribute values.
//!
//! License: MIT OR APACHE 2.0

use once_cell::sync::Lazy;
use regex::Regex;

/// A well-formed named or numeric character reference.
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&[#0-9A-Za-z_]+;").expect("valid entity pattern"));

/// Rewrites every character of `value` that lies outside a match of `keep`
/// through `escape`; matched spans are copied unchanged.
pub(crate) fn escape_outside(value: &str, keep: &Regex, escape: impl Fn(char, &mut String)) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_end = 0;
    for kept in keep.find_iter(value) {
        value[last_end..kept.start()].chars().for_each(|c| escape(c, &mut out));
        out.push_str(kept.as_str());
        last_end = kept.end();
    }
    value[last_end..].chars().for_each(|c| escape(c, &mut out));
    out
}

fn escape_char(c: char, include_quotes: bool, out: &mut String) {
    match c {
        '>' => out.push_str("&gt;"),
        '<' => out.push_str("&lt;"),
        '&' => out.push_str("&amp;"),
        ';' => out.push_str("&semi;"),
        '"' if include_quotes => out.push_str("&quot;"),
        '\'' if include_quotes => out.push_str("&apos;"),
        _ => out.push(c),
    }
}

/// Escapes `<`, `>`, `&` and `;` (plus both quote characters when
/// `include_quotes` is set), leaving existing entities such as `&gt;` intact.
pub fn escape_text(value: &str, include_quotes: bool) -> String {
    escape_outside(value, &ENTITY, |c, out| escape_char(c, include_quotes, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_entities_are_kept() {
        assert_eq!(escape_text("-&gt;", false), "-&gt;");
        assert_eq!(escape_text("a > 5 & b < 3", false), "a &gt; 5 &amp; b &lt; 3");
        assert_eq!(escape_text("&#39;&x27;", false), "&#39;&x27;");
    }

    #[test]
    fn test_semicolons_and_bare_ampersands() {
        assert_eq!(escape_text("x = 1 << 2;", false), "x = 1 &lt;&lt; 2&semi;");
        assert_eq!(escape_text("&;", false), "&amp;&semi;");
    }

    #[test]
    fn test_quotes_only_when_requested() {
        assert_eq!(escape_text("\"hi\" 'there'", false), "\"hi\" 'there'");
        assert_eq!(
            escape_text("\"hello!\" <THIS> & is encoded &quot; &;", true),
            "&quot;hello!&quot; &lt;THIS&gt; &amp; is encoded &quot; &amp;&semi;"
        );
        assert_eq!(escape_text("it's", true), "it&apos;s");
    }

    #[test]
    fn test_escaping_is_stable() {
        let once = escape_text("<b>fish & chips; \"yes\"</b>", true);
        assert_eq!(escape_text(&once, true), once);
    }
}
