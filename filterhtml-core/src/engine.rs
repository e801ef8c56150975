// filterhtml-core/src/engine.rs
//! Defines the core SanitizationEngine trait.
//!
//! The `SanitizationEngine` trait is the interface applications hold on to: a
//! compiled whitelist plus engine options, ready to filter any number of
//! inputs. Each call owns all of its parsing state, so one engine can be shared
//! between threads.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashSet;

use crate::errors::FilterHtmlError;
use crate::profiles::EngineOptions;
use crate::spec::WhitelistSpec;

/// A trait that defines the core functionality of a sanitization engine.
pub trait SanitizationEngine: Send + Sync {
    /// Filters `html`, returning the sanitized markup.
    ///
    /// # Errors
    /// Structural errors (unclosed, unexpected or mismatched tags) and syntax
    /// errors (unterminated attribute quotes) abort the call.
    fn sanitize(&self, html: &str) -> Result<String, FilterHtmlError>;

    /// Returns a reference to the whitelist the engine filters with.
    fn spec(&self) -> &WhitelistSpec;

    /// Returns a reference to the engine's options.
    fn options(&self) -> &EngineOptions;

    /// The tags removed together with their content.
    fn removals(&self) -> &HashSet<String>;
}
