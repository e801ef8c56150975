// filterhtml-core/src/engines/whitelist_engine.rs
//! A `SanitizationEngine` that filters markup against a whitelist.
//! License: MIT OR APACHE 2.0

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, info};

use crate::config::WhitelistConfig;
use crate::engine::SanitizationEngine;
use crate::errors::FilterHtmlError;
use crate::parser::FilterSettings;
use crate::profiles::EngineOptions;
use crate::sanitizers::compiler::compile_whitelist;
use crate::spec::WhitelistSpec;

#[derive(Debug, Clone)]
pub struct WhitelistEngine {
    spec: Arc<WhitelistSpec>,
    options: EngineOptions,
    removals: HashSet<String>,
}

impl WhitelistEngine {
    pub fn new(spec: impl Into<Arc<WhitelistSpec>>) -> Result<Self, FilterHtmlError> {
        Self::with_options(spec, EngineOptions::default())
    }

    /// Validates `spec` and fixes the removal set: the options' override when
    /// given, otherwise the whitelist's defaults.
    pub fn with_options(
        spec: impl Into<Arc<WhitelistSpec>>,
        options: EngineOptions,
    ) -> Result<Self, FilterHtmlError> {
        let spec = spec.into();
        spec.validate()?;
        let removals = options
            .removals
            .clone()
            .unwrap_or_else(|| spec.default_removals());
        debug!(
            "WhitelistEngine ready: {} tags, removing {:?}",
            spec.len(),
            removals
        );
        Ok(Self {
            spec,
            options,
            removals,
        })
    }

    /// Compiles a declarative whitelist and builds an engine from it.
    pub fn from_config(config: &WhitelistConfig, options: EngineOptions) -> Result<Self, FilterHtmlError> {
        let spec = compile_whitelist(config)?;
        info!("Compiled whitelist with {} tags.", spec.len());
        Self::with_options(spec, options)
    }

    fn settings(&self) -> FilterSettings<'_> {
        FilterSettings {
            spec: &self.spec,
            schemes: &self.options.allowed_schemes,
            removals: &self.removals,
            text_filter: self.options.text_filter.as_ref(),
            depth: 0,
        }
    }
}

impl SanitizationEngine for WhitelistEngine {
    fn sanitize(&self, html: &str) -> Result<String, FilterHtmlError> {
        debug!("Sanitizing {} bytes of markup.", html.len());
        self.settings().run(html)
    }

    fn spec(&self) -> &WhitelistSpec {
        &self.spec
    }

    fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn removals(&self) -> &HashSet<String> {
        &self.removals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::AllowedSchemes;
    use crate::spec::{AttributeRules, Semantic};

    fn spec() -> WhitelistSpec {
        WhitelistSpec::new()
            .tag("a", AttributeRules::new().allow("href", Semantic::Url))
            .tag("div", AttributeRules::new())
    }

    #[test]
    fn test_engine_rejects_alias_cycles() {
        let spec = WhitelistSpec::new().alias("a", "b").alias("b", "a");
        assert!(matches!(
            WhitelistEngine::new(spec),
            Err(FilterHtmlError::AliasCycle(_))
        ));
    }

    #[test]
    fn test_removal_override() {
        let engine = WhitelistEngine::new(spec()).unwrap();
        assert!(engine.removals().contains("script"));
        assert_eq!(engine.sanitize("<div>a</div><style>x</style>").unwrap(), "<div>a</div>");

        let options = EngineOptions::new().with_removals(["div"]);
        let engine = WhitelistEngine::with_options(spec(), options).unwrap();
        assert!(!engine.removals().contains("script"));
        assert_eq!(
            engine.sanitize("<div>a</div>b<script>1 < 2</script>").unwrap(),
            "b1 &lt; 2"
        );
    }

    #[test]
    fn test_allowed_schemes_option() {
        let options = EngineOptions::new()
            .with_allowed_schemes(AllowedSchemes::from_list(["https", "//"]));
        let engine = WhitelistEngine::with_options(spec(), options).unwrap();
        assert_eq!(
            engine.sanitize("<a href=\"http://x.example\"></a>").unwrap(),
            "<a href=\"#\"></a>"
        );
        assert_eq!(
            engine.sanitize("<a href=\"//x.example\"></a>").unwrap(),
            "<a href=\"//x.example\"></a>"
        );
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        let engine = Arc::new(WhitelistEngine::new(spec()).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || engine.sanitize(&format!("<div>{}</div>", i)))
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap().unwrap(), format!("<div>{}</div>", i));
        }
    }
}
