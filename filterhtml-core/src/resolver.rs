//! resolver.rs - Turns a tag name into the rules it is filtered with.
//!
//! Resolution follows alias chains (collecting their literal attributes),
//! invokes per-occurrence delegates with the current ancestry, and reports
//! removal markers and unknown names. Attribute lookup helpers live here too so
//! that the matching order is defined in one place.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;

use log::warn;

use crate::spec::{AttributeRules, DelegateOutcome, Rule, TagSpec, TagStackEntry, WhitelistSpec};

/// A tag that survives filtering.
#[derive(Debug, Clone)]
pub struct ResolvedTag<'s> {
    /// The name written to the output: the alias target when an alias was followed.
    pub name: String,
    pub rules: Cow<'s, AttributeRules>,
    /// Literal attributes contributed by aliases, emitted before filtered ones.
    pub injected: Vec<String>,
    pub via_alias: bool,
}

#[derive(Debug, Clone)]
pub enum Resolution<'s> {
    Resolved(ResolvedTag<'s>),
    /// The tag and everything inside it are deleted.
    Removed,
    /// The markup is stripped, the content kept.
    Unknown,
}

/// Resolves `name` against `spec` given the currently open elements.
pub fn resolve<'s>(spec: &'s WhitelistSpec, name: &str, stack: &[TagStackEntry]) -> Resolution<'s> {
    let mut current = name.to_string();
    let mut injected = Vec::new();
    let mut via_alias = false;

    // A chain can visit each tag at most once before it must have cycled.
    for _ in 0..=spec.len() {
        let Some(tag_spec) = spec.get(&current) else {
            return Resolution::Unknown;
        };
        match tag_spec {
            TagSpec::Remove => return Resolution::Removed,
            TagSpec::Allow(rules) => {
                return Resolution::Resolved(ResolvedTag {
                    name: current,
                    rules: Cow::Borrowed(rules),
                    injected,
                    via_alias,
                })
            }
            TagSpec::Delegate(delegate) => {
                return match delegate.call(&current, stack) {
                    DelegateOutcome::Allow(rules) => Resolution::Resolved(ResolvedTag {
                        name: current,
                        rules: Cow::Owned(rules),
                        injected,
                        via_alias,
                    }),
                    DelegateOutcome::Remove => Resolution::Removed,
                    DelegateOutcome::Unknown => Resolution::Unknown,
                }
            }
            TagSpec::Alias(alias) => {
                injected.extend(alias.attributes.iter().cloned());
                current = alias.target.clone();
                via_alias = true;
            }
        }
    }

    warn!("Alias chain starting at <{}> does not terminate; treating tag as unknown.", name);
    Resolution::Unknown
}

/// Follows aliases without invoking delegates. Used for closing tags, which
/// must name the same output element as their opening tag.
pub fn alias_target<'s>(spec: &'s WhitelistSpec, name: &str) -> (String, Option<&'s TagSpec>) {
    let mut current = name.to_string();
    for _ in 0..=spec.len() {
        match spec.get(&current) {
            Some(TagSpec::Alias(alias)) => current = alias.target.clone(),
            other => return (current, other),
        }
    }
    (current, None)
}

/// The tag's own rule for `name`: exact name, then name patterns in declared
/// order, then the `*` wildcard.
pub fn element_rule<'r>(rules: &'r AttributeRules, name: &str) -> Option<&'r Rule> {
    rules
        .exact(name)
        .or_else(|| rules.matching(name))
        .or_else(|| rules.wildcard())
}

/// The global rule for `name`: exact name, then name patterns. A wildcard in
/// the global rules is not consulted.
pub fn global_rule<'r>(globals: &'r AttributeRules, name: &str) -> Option<&'r Rule> {
    globals.exact(name).or_else(|| globals.matching(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Pattern, Semantic};

    fn spec() -> WhitelistSpec {
        WhitelistSpec::new()
            .tag("p", AttributeRules::new().allow("class", Rule::one_of(["centered"])))
            .tag("strong", AttributeRules::new())
            .alias("b", "strong")
            .alias("bold", "b data-x=\"1\"")
            .alias("center", "p class=\"centered\"")
            .remove("iframe")
            .delegate("a", |_, stack| {
                if stack.iter().any(|e| e.name == "p") {
                    DelegateOutcome::Allow(AttributeRules::new().allow("href", Semantic::Url))
                } else {
                    DelegateOutcome::Unknown
                }
            })
    }

    #[test]
    fn test_alias_chain_collects_attributes() {
        let spec = spec();
        let Resolution::Resolved(tag) = resolve(&spec, "bold", &[]) else {
            panic!("expected bold to resolve");
        };
        assert_eq!(tag.name, "strong");
        assert_eq!(tag.injected, vec!["data-x=\"1\"".to_string()]);
        assert!(tag.via_alias);

        let Resolution::Resolved(tag) = resolve(&spec, "center", &[]) else {
            panic!("expected center to resolve");
        };
        assert_eq!(tag.name, "p");
        assert_eq!(tag.injected, vec!["class=\"centered\"".to_string()]);
    }

    #[test]
    fn test_removed_and_unknown() {
        let spec = spec();
        assert!(matches!(resolve(&spec, "iframe", &[]), Resolution::Removed));
        assert!(matches!(resolve(&spec, "marquee", &[]), Resolution::Unknown));
    }

    #[test]
    fn test_delegate_sees_ancestors() {
        let spec = spec();
        assert!(matches!(resolve(&spec, "a", &[]), Resolution::Unknown));
        let stack = vec![TagStackEntry {
            name: "p".into(),
            attributes: vec![],
        }];
        let Resolution::Resolved(tag) = resolve(&spec, "a", &stack) else {
            panic!("expected a to resolve inside p");
        };
        assert!(!tag.via_alias);
        assert!(tag.rules.exact("href").is_some());
    }

    #[test]
    fn test_cyclic_alias_is_unknown() {
        let spec = WhitelistSpec::new().alias("x", "y").alias("y", "x");
        assert!(matches!(resolve(&spec, "x", &[]), Resolution::Unknown));
        assert!(alias_target(&spec, "x").1.is_none());
    }

    #[test]
    fn test_attribute_matching_order() {
        let rules = AttributeRules::new()
            .allow("id", Rule::one_of(["exact"]))
            .allow_matching(Pattern::new(r"data-[a-z]+").unwrap(), Rule::one_of(["pattern"]))
            .allow("*", Rule::one_of(["wildcard"]));
        let id = element_rule(&rules, "id").unwrap();
        assert!(matches!(id, Rule::OneOf(c) if c[0].accept("exact").is_some()));
        let data = element_rule(&rules, "data-x").unwrap();
        assert!(matches!(data, Rule::OneOf(c) if c[0].accept("pattern").is_some()));
        let other = element_rule(&rules, "title").unwrap();
        assert!(matches!(other, Rule::OneOf(c) if c[0].accept("wildcard").is_some()));

        let globals = AttributeRules::new().allow("*", Rule::Any);
        assert!(global_rule(&globals, "title").is_none());
    }
}
