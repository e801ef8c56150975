//! compiler.rs - Compiles a declarative whitelist into a `WhitelistSpec`.
//!
//! Every pattern is compiled and every value kind is resolved up front, so that
//! filtering never fails because of the whitelist itself. Errors are collected
//! across the whole configuration and reported together.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};

use crate::config::{AttributeEntries, ChoiceEntry, RuleEntry, TagEntry, WhitelistConfig, GLOBAL_KEY};
use crate::errors::FilterHtmlError;
use crate::spec::{Alias, AttributeRules, Choice, Pattern, Rule, StyleRules, TagSpec, WhitelistSpec};

/// Compiles `config`, then checks the result for alias cycles.
pub fn compile_whitelist(config: &WhitelistConfig) -> Result<WhitelistSpec, FilterHtmlError> {
    debug!("Starting compilation of {} whitelist entries.", config.tags.len());

    let mut spec = WhitelistSpec::new();
    let mut compilation_errors = Vec::new();

    for (name, entry) in &config.tags {
        if name == GLOBAL_KEY {
            match entry {
                TagEntry::Attributes(entries) => {
                    let rules = compile_attributes(GLOBAL_KEY, entries, &mut compilation_errors);
                    spec.insert(GLOBAL_KEY, TagSpec::Allow(rules));
                }
                _ => compilation_errors.push(FilterHtmlError::InvalidRule(
                    GLOBAL_KEY.to_string(),
                    "global attributes must be an attribute map".to_string(),
                )),
            }
            continue;
        }

        let tag = name.to_ascii_lowercase();
        if !is_tag_name(&tag) {
            warn!("Skipping whitelist entry '{}': not a valid tag name.", name);
            continue;
        }

        let tag_spec = match entry {
            TagEntry::Flag(false) => TagSpec::Remove,
            TagEntry::Flag(true) => TagSpec::Allow(AttributeRules::new()),
            TagEntry::Alias(definition) => {
                let alias = Alias::parse(definition);
                if alias.target.is_empty() {
                    compilation_errors.push(FilterHtmlError::InvalidRule(
                        tag.clone(),
                        "alias has no target tag".to_string(),
                    ));
                    continue;
                }
                TagSpec::Alias(alias)
            }
            TagEntry::Attributes(entries) => {
                TagSpec::Allow(compile_attributes(&tag, entries, &mut compilation_errors))
            }
        };
        spec.insert(&tag, tag_spec);
    }

    if !compilation_errors.is_empty() {
        let error_message = compilation_errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<String>>()
            .join("\n");
        return Err(FilterHtmlError::Fatal(format!(
            "Failed to compile {} whitelist entr{}:\n{}",
            compilation_errors.len(),
            if compilation_errors.len() == 1 { "y" } else { "ies" },
            error_message
        )));
    }

    spec.validate()?;
    debug!("Finished compiling whitelist. Total tags: {}.", spec.len());
    Ok(spec)
}

fn is_tag_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase() || ('1'..='6').contains(&c))
}

fn compile_attributes(
    tag: &str,
    entries: &AttributeEntries,
    errors: &mut Vec<FilterHtmlError>,
) -> AttributeRules {
    let mut rules = AttributeRules::new();
    for (key, entry) in entries.iter() {
        let context = format!("{}.{}", tag, key);
        let rule = match compile_rule(&context, entry, key == "style") {
            Ok(rule) => rule,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };

        match key.strip_prefix('/').and_then(|k| k.strip_suffix('/')) {
            Some(source) if !source.is_empty() => match Pattern::new(source) {
                Ok(pattern) => rules = rules.allow_matching(pattern, rule),
                Err(e) => errors.push(e),
            },
            _ => rules.insert(key, rule),
        }
    }
    rules
}

fn compile_rule(context: &str, entry: &RuleEntry, style_allowed: bool) -> Result<Rule, FilterHtmlError> {
    match entry {
        RuleEntry::Keyword(keyword) => compile_keyword(context, keyword),
        RuleEntry::Pattern(entry) => Rule::pattern(&entry.pattern),
        RuleEntry::OneOf(choices) => choices
            .iter()
            .map(compile_choice)
            .collect::<Result<Vec<_>, _>>()
            .map(Rule::OneOf),
        RuleEntry::Style(properties) if style_allowed => {
            let mut style = StyleRules::new();
            for (property, entry) in properties {
                let context = format!("{}.{}", context, property);
                style = style.property(property.as_str(), compile_rule(&context, entry, false)?);
            }
            Ok(Rule::Style(style))
        }
        RuleEntry::Style(_) => Err(FilterHtmlError::InvalidRule(
            context.to_string(),
            "property rules are only allowed on the style attribute".to_string(),
        )),
    }
}

fn compile_keyword(context: &str, keyword: &str) -> Result<Rule, FilterHtmlError> {
    if keyword == "*" {
        return Ok(Rule::Any);
    }
    if let Some(chars) = keyword.strip_prefix('[').and_then(|k| k.strip_suffix(']')) {
        if chars.is_empty() {
            return Err(FilterHtmlError::InvalidRule(
                context.to_string(),
                "character set is empty".to_string(),
            ));
        }
        return Ok(Rule::CharSet(chars.to_string()));
    }
    keyword
        .parse()
        .map(Rule::Semantic)
        .map_err(|_| FilterHtmlError::InvalidRule(context.to_string(), format!("unknown value kind '{}'", keyword)))
}

fn compile_choice(entry: &ChoiceEntry) -> Result<Choice, FilterHtmlError> {
    Ok(match entry {
        ChoiceEntry::Literal(literal) => Choice::Literal(literal.clone()),
        ChoiceEntry::Integer(n) => Choice::Literal(n.to_string()),
        ChoiceEntry::Flag(b) => Choice::Literal(b.to_string()),
        ChoiceEntry::Pattern(entry) => Choice::Pattern(Pattern::new(&entry.pattern)?),
    })
}
