//! Attribute value purification.
//!
//! Given the rules that matched an attribute name, decides what (if anything) of
//! the source value survives. Rejections are `None`; the caller drops the
//! attribute. `url` rejections are the exception and come back as the inert
//! replacement value.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashSet;

use crate::profiles::AllowedSchemes;
use crate::resolver::{element_rule, global_rule};
use crate::sanitizers::{style, text};
use crate::spec::{AttributeRules, Choice, Rule, Semantic};
use crate::validators;

/// Settings shared by every purifier during one sanitization call.
#[derive(Debug, Clone, Copy)]
pub struct PurifyContext<'a> {
    pub schemes: &'a AllowedSchemes,
}

/// A purified attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purified {
    /// Rendered as `name="value"`.
    Value(String),
    /// Rendered as a bare `name` (boolean attributes).
    Bare,
}

/// Numeric character references can spell out any character, including the
/// ones the purifiers look for, so no value containing one is accepted.
fn has_numeric_reference(value: &str) -> bool {
    value.contains("&#")
}

/// Filters one source attribute against the tag's rules, falling back to the
/// global rules when the tag's rule rejects the value. `value` is `None` for an
/// attribute written without `=`.
pub fn filter_attribute(
    name: &str,
    value: Option<&str>,
    rules: &AttributeRules,
    globals: &AttributeRules,
    ctx: PurifyContext<'_>,
) -> Option<Purified> {
    let own = element_rule(rules, name);
    let global = global_rule(globals, name);

    let Some(value) = value else {
        let is_boolean = own.is_some_and(Rule::is_boolean) || global.is_some_and(Rule::is_boolean);
        return is_boolean.then_some(Purified::Bare);
    };

    own.and_then(|rule| purify_attribute(name, value, rule, ctx))
        .or_else(|| global.and_then(|rule| purify_attribute(name, value, rule, ctx)))
}

/// Purifies `value` for the attribute `name` under a single rule.
pub fn purify_attribute(name: &str, value: &str, rule: &Rule, ctx: PurifyContext<'_>) -> Option<Purified> {
    let purified = if has_numeric_reference(value) {
        None
    } else if let (Rule::OneOf(choices), "class") = (rule, name) {
        merge_class_tokens(value, choices).map(Purified::Value)
    } else {
        purify_value(value, rule, Some(name), ctx)
    };

    purified.or_else(|| match rule {
        Rule::Semantic(kind) => kind
            .rejection_replacement()
            .map(|replacement| Purified::Value(replacement.to_string())),
        _ => None,
    })
}

/// Purifies a single value. `attribute_name` is `None` for style properties,
/// where boolean values make no sense.
pub(crate) fn purify_value(
    value: &str,
    rule: &Rule,
    attribute_name: Option<&str>,
    ctx: PurifyContext<'_>,
) -> Option<Purified> {
    match rule {
        Rule::Any => Some(Purified::Value(value.to_string())),
        Rule::OneOf(choices) => choices
            .iter()
            .find_map(|choice| choice.accept(value))
            .map(Purified::Value),
        Rule::Pattern(pattern) => pattern
            .full_match(value)
            .then(|| Purified::Value(value.to_string())),
        Rule::Semantic(Semantic::Boolean) => attribute_name
            .filter(|name| validators::is_boolean_value(value, name))
            .map(|_| Purified::Bare),
        Rule::Semantic(kind) => purify_semantic(value, *kind, ctx).map(Purified::Value),
        Rule::CharSet(allowed) => validators::purify_charset(value, allowed).map(Purified::Value),
        Rule::Style(properties) => style::purify_style(value, properties, ctx).map(Purified::Value),
        Rule::Delegate(delegate) => delegate.call(value).map(Purified::Value),
    }
}

fn purify_semantic(value: &str, kind: Semantic, ctx: PurifyContext<'_>) -> Option<String> {
    match kind {
        Semantic::Url => validators::purify_url(value, ctx.schemes),
        Semantic::UrlOrEmpty => {
            if value.trim().is_empty() {
                Some(String::new())
            } else {
                validators::purify_url(value, ctx.schemes)
            }
        }
        Semantic::Color => validators::purify_color(value),
        Semantic::Measurement => validators::purify_measurement(value),
        Semantic::Int => validators::purify_int(value),
        Semantic::Alpha => validators::purify_alpha(value, false),
        Semantic::AlphaOrEmpty => validators::purify_alpha(value, true),
        Semantic::Alphanumeric => validators::purify_alphanumeric(value, false),
        Semantic::AlphanumericOrEmpty => validators::purify_alphanumeric(value, true),
        Semantic::Text => Some(text::escape_text(value, true)),
        Semantic::Boolean => None,
    }
}

/// Keeps the class tokens accepted by `choices`, first occurrence wins, source
/// order preserved. `None` when nothing survives.
fn merge_class_tokens(value: &str, choices: &[Choice]) -> Option<String> {
    let mut seen = HashSet::new();
    let kept: Vec<String> = value
        .split_whitespace()
        .filter_map(|token| choices.iter().find_map(|choice| choice.accept(token)))
        .filter(|token| !token.is_empty() && seen.insert(token.clone()))
        .collect();
    (!kept.is_empty()).then(|| kept.join(" "))
}
