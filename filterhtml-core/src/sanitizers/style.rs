//! Inline `style` declaration filtering.
//!
//! License: MIT OR APACHE 2.0

use once_cell::sync::Lazy;
use regex::Regex;

use crate::sanitizers::attributes::{purify_value, PurifyContext, Purified};
use crate::spec::StyleRules;

/// A CSS hex escape such as `\65`, which could smuggle in any character.
static CSS_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[0-9A-Fa-f]").expect("valid css escape pattern"));

/// Filters a `style` value declaration by declaration. Surviving declarations
/// are rendered `name:value` and joined with `;`, with a trailing `;`. Returns
/// `None` when nothing survives.
pub fn purify_style(value: &str, rules: &StyleRules, ctx: PurifyContext<'_>) -> Option<String> {
    let kept: Vec<String> = value
        .split(';')
        .filter_map(|declaration| purify_declaration(declaration, rules, ctx))
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(";") + ";")
    }
}

fn purify_declaration(declaration: &str, rules: &StyleRules, ctx: PurifyContext<'_>) -> Option<String> {
    let mut parts = declaration.split(':');
    let (Some(name), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    let (name, value) = (name.trim(), value.trim());
    if CSS_ESCAPE.is_match(value) || value.contains("&#") {
        return None;
    }

    let rule = rules.get(name)?;
    match purify_value(value, rule, None, ctx)? {
        Purified::Value(purified) if !purified.is_empty() => Some(format!("{}:{}", name, purified)),
        _ => None,
    }
}
