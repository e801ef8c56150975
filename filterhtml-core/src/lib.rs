// filterhtml-core/src/lib.rs
//! # FilterHTML Core Library
//!
//! `filterhtml-core` filters untrusted HTML against a whitelist. Every tag and
//! attribute not explicitly allowed is stripped, and every allowed attribute value
//! is checked against a rule for its kind (URL, color, measurement, enumerated
//! values, pattern, inline style, ...). The result is HTML that is safe to embed
//! in a page.
//!
//! Filtering is a single forward pass over the input. It does not build a DOM and
//! never repairs broken markup: tags that do not nest are an error, and so is an
//! attribute quote that never closes.
//!
//! ## Modules
//!
//! * `spec`: The whitelist data model ([`WhitelistSpec`], [`Rule`], ...) and its builders.
//! * `config`: The declarative YAML/JSON whitelist form, loading and merging.
//! * `sanitizers`: Attribute, style and text purification, plus the whitelist compiler.
//! * `validators`: The built-in value purifiers (`url`, `color`, `measurement`, ...).
//! * `parser`: The single-pass structural filter.
//! * `resolver`: Tag resolution through aliases and delegates.
//! * `engine`: Defines the [`SanitizationEngine`] trait.
//! * `engines`: Concrete implementations of the `SanitizationEngine` trait.
//! * `profiles`: Per-call options such as the allowed URL schemes.
//! * `headless`: One-shot helpers.
//! * `diagnostics`: Log-safe rendering of untrusted input.
//!
//! ## Usage Example
//!
//! ```rust
//! use filterhtml_core::{AttributeRules, EngineOptions, Semantic, WhitelistSpec, filter_html};
//!
//! let spec = WhitelistSpec::new()
//!     .tag("a", AttributeRules::new().allow("href", Semantic::Url))
//!     .tag("b", AttributeRules::new())
//!     .alias("strong", "b");
//!
//! let html = r#"<strong>hi</strong> <a href="javascript:alert(1)" onclick="x">link</a><script>evil()</script>"#;
//! let filtered = filter_html(html, &spec, &EngineOptions::default()).unwrap();
//! assert_eq!(filtered, r##"<b>hi</b> <a href="#">link</a>"##);
//! ```
//!
//! ## Error Handling
//!
//! Sanitization returns [`FilterHtmlError`]. Loaders and the headless helpers use
//! `anyhow::Error` with context attached.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod config;
pub mod cursor;
pub mod diagnostics;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod headless;
pub mod parser;
pub mod profiles;
pub mod resolver;
pub mod sanitizers;
pub mod spec;
pub mod validators;

/// Re-exports the declarative whitelist types and loaders.
pub use config::{merge_whitelists, TagEntry, RuleEntry, WhitelistConfig, MAX_PATTERN_LENGTH};

/// Re-exports the custom error type for clear error reporting.
pub use errors::{ErrorKind, FilterHtmlError, Position};

/// Re-exports types related to the core sanitization engine trait.
pub use engine::SanitizationEngine;
pub use engines::whitelist_engine::WhitelistEngine;

/// Re-exports the per-call options.
pub use profiles::{AllowedSchemes, EngineOptions, ProfileConfig, TextFilter};

/// Re-exports the whitelist data model.
pub use spec::{
    Alias, AttributeRules, Choice, DelegateOutcome, Pattern, Rule, Semantic, StyleRules,
    TagSpec, TagStackEntry, WhitelistSpec,
};

/// Re-exports types and functions for one-shot, non-interactive use.
pub use headless::{filter_html, headless_filter_string};

pub use sanitizers::compiler::compile_whitelist;
