// File: filterhtml-core/src/headless.rs

//! `headless.rs`
//! One-shot helpers: filter a single string without keeping an engine around.

use anyhow::{Context, Result};

use crate::config::WhitelistConfig;
use crate::engine::SanitizationEngine;
use crate::engines::whitelist_engine::WhitelistEngine;
use crate::errors::FilterHtmlError;
use crate::parser::FilterSettings;
use crate::profiles::EngineOptions;
use crate::spec::WhitelistSpec;

/// Filters `html` against `spec`.
///
/// The removal set is `options.removals` when given, otherwise `script` and
/// `style` unless the whitelist names them. `spec` is validated first, so a
/// whitelist with an alias cycle fails with [`FilterHtmlError::AliasCycle`].
pub fn filter_html(
    html: &str,
    spec: &WhitelistSpec,
    options: &EngineOptions,
) -> Result<String, FilterHtmlError> {
    spec.validate()?;
    let default_removals;
    let removals = match &options.removals {
        Some(removals) => removals,
        None => {
            default_removals = spec.default_removals();
            &default_removals
        }
    };
    FilterSettings {
        spec,
        schemes: &options.allowed_schemes,
        removals,
        text_filter: options.text_filter.as_ref(),
        depth: 0,
    }
    .run(html)
}

/// Compiles `config` and filters `content` with it in a single call.
pub fn headless_filter_string(
    config: &WhitelistConfig,
    options: EngineOptions,
    content: &str,
) -> Result<String> {
    let engine = WhitelistEngine::from_config(config, options)
        .context("Failed to build a whitelist engine from the configuration")?;
    let filtered = engine.sanitize(content)?;
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{AttributeRules, Rule};

    #[test]
    fn test_filter_html_defaults() {
        let spec = WhitelistSpec::new()
            .tag("span", AttributeRules::new().allow("class", Rule::one_of(["pretty"])))
            .tag("br", AttributeRules::new());
        let out = filter_html(
            "<span class=\"pretty ugly\" onclick=\"x()\">hi</span><br><script>x</script>",
            &spec,
            &EngineOptions::default(),
        )
        .unwrap();
        assert_eq!(out, "<span class=\"pretty\">hi</span><br>");
    }

    #[test]
    fn test_filter_html_validates_aliases() {
        let spec = WhitelistSpec::new().alias("b", "strong").alias("strong", "b");
        let err = filter_html("<b>x</b>", &spec, &EngineOptions::default()).unwrap_err();
        assert!(matches!(err, FilterHtmlError::AliasCycle(_)));
    }

    #[test]
    fn test_headless_filter_string_from_yaml() -> Result<()> {
        let config = WhitelistConfig::from_yaml_str(
            "tags:\n  b: {}\n  strong: b\n",
        )?;
        let out = headless_filter_string(&config, EngineOptions::default(), "<strong>x</strong><i>y</i>")?;
        assert_eq!(out, "<b>x</b>y");
        Ok(())
    }

    #[test]
    fn test_headless_filter_string_reports_structure_errors() {
        let config = WhitelistConfig::from_yaml_str("tags:\n  b: {}\n").unwrap();
        let err = headless_filter_string(&config, EngineOptions::default(), "<b>x").unwrap_err();
        let err = err.downcast::<FilterHtmlError>().unwrap();
        assert!(err.is_structural());
    }
}
