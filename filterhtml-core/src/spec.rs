//! spec.rs - The whitelist data model.
//!
//! A [`WhitelistSpec`] maps lowercase tag names to a [`TagSpec`]: an attribute rule
//! set, an alias, a removal marker or a delegate evaluated per occurrence. Each
//! attribute rule is a [`Rule`] describing which values survive. Specs are built
//! programmatically with the builder methods here, or compiled from a declarative
//! [`WhitelistConfig`](crate::config::WhitelistConfig).
//!
//! License: MIT OR APACHE 2.0

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::debug;
use regex::{Regex, RegexBuilder};

use crate::config::MAX_PATTERN_LENGTH;
use crate::errors::FilterHtmlError;

/// Size limit for a single compiled pattern.
const PATTERN_SIZE_LIMIT: usize = 10 * (1 << 20);

/// One open, non-void element: its resolved tag name and the attributes emitted for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagStackEntry {
    pub name: String,
    pub attributes: Vec<String>,
}

/// A compiled regular expression that must match a whole value.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source` anchored at both ends.
    pub fn new(source: &str) -> Result<Self, FilterHtmlError> {
        if source.len() > MAX_PATTERN_LENGTH {
            return Err(FilterHtmlError::PatternLengthExceeded(
                source.to_string(),
                source.len(),
                MAX_PATTERN_LENGTH,
            ));
        }
        let regex = RegexBuilder::new(&format!("^(?:{})$", source))
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|e| FilterHtmlError::RuleCompilationError(source.to_string(), e))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn full_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// The pattern as written, before anchoring.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// A caller-supplied value rewriter. Returning `None` rejects the value.
#[derive(Clone)]
pub struct ValueDelegate(Arc<dyn Fn(&str) -> Option<String> + Send + Sync>);

impl ValueDelegate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, value: &str) -> Option<String> {
        (self.0)(value)
    }
}

impl fmt::Debug for ValueDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueDelegate(..)")
    }
}

/// What a [`TagDelegate`] decided for one occurrence of a tag.
#[derive(Debug, Clone)]
pub enum DelegateOutcome {
    /// Keep the tag, filtering its attributes with these rules.
    Allow(AttributeRules),
    /// Delete the tag and everything inside it.
    Remove,
    /// Treat the tag as unknown: strip the markup, keep the content.
    Unknown,
}

/// A per-occurrence tag policy, given the tag name and the currently open ancestors.
#[derive(Clone)]
pub struct TagDelegate(Arc<dyn Fn(&str, &[TagStackEntry]) -> DelegateOutcome + Send + Sync>);

impl TagDelegate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &[TagStackEntry]) -> DelegateOutcome + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, tag_name: &str, ancestors: &[TagStackEntry]) -> DelegateOutcome {
        (self.0)(tag_name, ancestors)
    }
}

impl fmt::Debug for TagDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TagDelegate(..)")
    }
}

/// Built-in value shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantic {
    Url,
    /// Like `Url`, but an empty value is kept and a rejected one becomes empty.
    UrlOrEmpty,
    Color,
    Measurement,
    Int,
    Alpha,
    Alphanumeric,
    AlphaOrEmpty,
    AlphanumericOrEmpty,
    Text,
    Boolean,
}

impl Semantic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Semantic::Url => "url",
            Semantic::UrlOrEmpty => "url|empty",
            Semantic::Color => "color",
            Semantic::Measurement => "measurement",
            Semantic::Int => "int",
            Semantic::Alpha => "alpha",
            Semantic::Alphanumeric => "alphanumeric",
            Semantic::AlphaOrEmpty => "alpha|empty",
            Semantic::AlphanumericOrEmpty => "alphanumeric|empty",
            Semantic::Text => "text",
            Semantic::Boolean => "boolean",
        }
    }

    /// The value a rejected attribute of this kind is replaced with, if any.
    pub fn rejection_replacement(&self) -> Option<&'static str> {
        match self {
            Semantic::Url => Some("#"),
            Semantic::UrlOrEmpty => Some(""),
            _ => None,
        }
    }
}

impl FromStr for Semantic {
    type Err = FilterHtmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "url" => Semantic::Url,
            "url|empty" => Semantic::UrlOrEmpty,
            "color" => Semantic::Color,
            "measurement" => Semantic::Measurement,
            "int" => Semantic::Int,
            "alpha" => Semantic::Alpha,
            "alphanumeric" => Semantic::Alphanumeric,
            "alpha|empty" => Semantic::AlphaOrEmpty,
            "alphanumeric|empty" => Semantic::AlphanumericOrEmpty,
            "text" => Semantic::Text,
            "boolean" => Semantic::Boolean,
            other => {
                return Err(FilterHtmlError::InvalidRule(
                    other.to_string(),
                    "unknown value kind".to_string(),
                ))
            }
        })
    }
}

/// One entry of an enumerated value list.
#[derive(Debug, Clone)]
pub enum Choice {
    Literal(String),
    Pattern(Pattern),
    Delegate(ValueDelegate),
}

impl Choice {
    pub(crate) fn accept(&self, value: &str) -> Option<String> {
        match self {
            Choice::Literal(literal) => (literal == value).then(|| value.to_string()),
            Choice::Pattern(pattern) => pattern.full_match(value).then(|| value.to_string()),
            Choice::Delegate(delegate) => delegate.call(value),
        }
    }
}

impl From<&str> for Choice {
    fn from(literal: &str) -> Self {
        Choice::Literal(literal.to_string())
    }
}

/// CSS property rules for a `style` attribute.
#[derive(Debug, Clone, Default)]
pub struct StyleRules {
    properties: HashMap<String, Rule>,
}

impl StyleRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.properties.insert(name.into(), rule.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.properties.get(name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// The validation policy for one attribute or style property value.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Any value, kept verbatim.
    Any,
    /// The value must equal, match or be accepted by one of the choices. For
    /// `class` each whitespace-separated token is checked on its own.
    OneOf(Vec<Choice>),
    Pattern(Pattern),
    Semantic(Semantic),
    /// The value must be non-empty and use only these characters.
    CharSet(String),
    Style(StyleRules),
    Delegate(ValueDelegate),
}

impl Rule {
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Rule::OneOf(values.into_iter().map(|v| Choice::from(v.as_ref())).collect())
    }

    pub fn pattern(source: &str) -> Result<Self, FilterHtmlError> {
        Ok(Rule::Pattern(Pattern::new(source)?))
    }

    pub fn delegate<F>(f: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Rule::Delegate(ValueDelegate::new(f))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Rule::Semantic(Semantic::Boolean))
    }
}

impl From<Semantic> for Rule {
    fn from(kind: Semantic) -> Self {
        Rule::Semantic(kind)
    }
}

impl From<StyleRules> for Rule {
    fn from(rules: StyleRules) -> Self {
        Rule::Style(rules)
    }
}

/// Attribute rules for one tag, or the global attribute rules.
///
/// Patterns are kept in declaration order so matching stays deterministic.
#[derive(Debug, Clone, Default)]
pub struct AttributeRules {
    exact: HashMap<String, Rule>,
    patterns: Vec<(Pattern, Rule)>,
    wildcard: Option<Rule>,
}

impl AttributeRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows the attribute `name`. The name `*` allows every attribute.
    pub fn allow(mut self, name: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.insert(name, rule);
        self
    }

    /// Allows every attribute whose name fully matches `pattern`.
    pub fn allow_matching(mut self, pattern: Pattern, rule: impl Into<Rule>) -> Self {
        self.patterns.push((pattern, rule.into()));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, rule: impl Into<Rule>) {
        let name = name.into();
        if name == "*" {
            self.wildcard = Some(rule.into());
        } else {
            self.exact.insert(name.to_ascii_lowercase(), rule.into());
        }
    }

    pub fn exact(&self, name: &str) -> Option<&Rule> {
        self.exact.get(name)
    }

    /// The first pattern rule whose pattern matches `name`.
    pub fn matching(&self, name: &str) -> Option<&Rule> {
        self.patterns
            .iter()
            .find(|(pattern, _)| pattern.full_match(name))
            .map(|(_, rule)| rule)
    }

    pub fn wildcard(&self) -> Option<&Rule> {
        self.wildcard.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.patterns.is_empty() && self.wildcard.is_none()
    }
}

/// An alias: filter this tag as `target`, emitting `attributes` verbatim first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub target: String,
    pub attributes: Vec<String>,
}

impl Alias {
    /// Parses `target literal-attr...`, e.g. `p class="centered"`.
    pub fn parse(definition: &str) -> Self {
        let mut words = definition.split_whitespace();
        let target = words.next().unwrap_or_default().to_ascii_lowercase();
        Self {
            target,
            attributes: words.map(str::to_string).collect(),
        }
    }
}

/// The policy attached to one tag name.
#[derive(Debug, Clone)]
pub enum TagSpec {
    Allow(AttributeRules),
    Alias(Alias),
    Remove,
    Delegate(TagDelegate),
}

/// The whitelist: tag policies plus global attribute rules.
#[derive(Debug, Clone, Default)]
pub struct WhitelistSpec {
    tags: HashMap<String, TagSpec>,
    globals: AttributeRules,
}

impl WhitelistSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, name: &str, rules: AttributeRules) -> Self {
        self.insert(name, TagSpec::Allow(rules));
        self
    }

    pub fn alias(mut self, name: &str, definition: &str) -> Self {
        self.insert(name, TagSpec::Alias(Alias::parse(definition)));
        self
    }

    pub fn remove(mut self, name: &str) -> Self {
        self.insert(name, TagSpec::Remove);
        self
    }

    pub fn delegate<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&str, &[TagStackEntry]) -> DelegateOutcome + Send + Sync + 'static,
    {
        self.insert(name, TagSpec::Delegate(TagDelegate::new(f)));
        self
    }

    pub fn globals(mut self, rules: AttributeRules) -> Self {
        self.globals = rules;
        self
    }

    /// Inserts a tag policy. The reserved name `*` with an `Allow` policy sets
    /// the global attribute rules.
    pub fn insert(&mut self, name: &str, spec: TagSpec) {
        match (name, spec) {
            ("*", TagSpec::Allow(rules)) => self.globals = rules,
            (_, spec) => {
                self.tags.insert(name.to_ascii_lowercase(), spec);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TagSpec> {
        self.tags.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn global_attributes(&self) -> &AttributeRules {
        &self.globals
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// `script` and `style` are removed with their content unless the whitelist
    /// explicitly names them with something other than a removal marker.
    pub fn default_removals(&self) -> HashSet<String> {
        ["script", "style"]
            .into_iter()
            .filter(|name| matches!(self.get(name), None | Some(TagSpec::Remove)))
            .map(str::to_string)
            .collect()
    }

    /// Rejects specs whose aliases form a cycle.
    pub fn validate(&self) -> Result<(), FilterHtmlError> {
        for (name, spec) in &self.tags {
            let TagSpec::Alias(alias) = spec else { continue };
            let mut chain = vec![name.clone()];
            let mut target = &alias.target;
            loop {
                if chain.contains(target) {
                    chain.push(target.clone());
                    return Err(FilterHtmlError::AliasCycle(chain));
                }
                chain.push(target.clone());
                match self.tags.get(target) {
                    Some(TagSpec::Alias(next)) => target = &next.target,
                    _ => break,
                }
            }
        }
        debug!("Whitelist with {} tags validated.", self.tags.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_anchored() {
        let pattern = Pattern::new(r"icon-[a-z]+").unwrap();
        assert!(pattern.full_match("icon-home"));
        assert!(!pattern.full_match("x icon-home"));
        assert!(!pattern.full_match("icon-home>"));
        assert_eq!(pattern.as_str(), "icon-[a-z]+");
    }

    #[test]
    fn test_pattern_length_limit() {
        let long = "a".repeat(MAX_PATTERN_LENGTH + 1);
        assert!(matches!(
            Pattern::new(&long),
            Err(FilterHtmlError::PatternLengthExceeded(_, _, MAX_PATTERN_LENGTH))
        ));
    }

    #[test]
    fn test_alias_parse() {
        let alias = Alias::parse("P class=\"centered\"");
        assert_eq!(alias.target, "p");
        assert_eq!(alias.attributes, vec!["class=\"centered\"".to_string()]);
    }

    #[test]
    fn test_star_sets_globals_and_wildcard() {
        let mut spec = WhitelistSpec::new();
        spec.insert("*", TagSpec::Allow(AttributeRules::new().allow("id", Semantic::Alphanumeric)));
        assert!(spec.is_empty());
        assert!(spec.global_attributes().exact("id").is_some());

        let rules = AttributeRules::new().allow("*", Rule::Any);
        assert!(rules.wildcard().is_some());
        assert!(rules.exact("*").is_none());
    }

    #[test]
    fn test_default_removals() {
        let spec = WhitelistSpec::new().tag("b", AttributeRules::new());
        let removals = spec.default_removals();
        assert!(removals.contains("script") && removals.contains("style"));

        let spec = WhitelistSpec::new().alias("script", "pre").remove("style");
        let removals = spec.default_removals();
        assert!(!removals.contains("script"));
        assert!(removals.contains("style"));
    }

    #[test]
    fn test_validate_detects_alias_cycle() {
        let spec = WhitelistSpec::new()
            .alias("a", "b")
            .alias("b", "c x=\"1\"")
            .alias("c", "a");
        assert!(matches!(spec.validate(), Err(FilterHtmlError::AliasCycle(_))));

        let spec = WhitelistSpec::new().alias("self", "self");
        assert!(spec.validate().is_err());

        let spec = WhitelistSpec::new()
            .tag("strong", AttributeRules::new())
            .alias("b", "strong")
            .alias("bold", "b");
        assert!(spec.validate().is_ok());
    }
}
