// File: filterhtml-core/src/profiles.rs

//! profiles.rs - Per-call engine options and their declarative profile form.
//!
//! [`EngineOptions`] carries everything a sanitization call needs besides the
//! whitelist itself: the URL schemes that may appear in `url` values, an
//! optional override of the removal set, and the optional text rewrite hook.
//! A [`ProfileConfig`] is the YAML form of the serializable part of those
//! options, so deployments can keep scheme policy next to their whitelist.
//!
//! license: MIT OR Apache-2.0

use anyhow::{bail, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::spec::TagStackEntry;

/// Schemes allowed when no profile overrides them.
pub const DEFAULT_SCHEMES: [&str; 4] = ["http", "https", "mailto", "ftp"];

/// The marker entry that permits protocol-relative (`//host/...`) URLs.
pub const PROTOCOL_RELATIVE: &str = "//";

/// Case-insensitive set of URL schemes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedSchemes {
    schemes: HashSet<String>,
    protocol_relative: bool,
}

impl AllowedSchemes {
    /// Builds the set from a list of scheme names. The entry `//` permits
    /// protocol-relative URLs instead of naming a scheme.
    pub fn from_list<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut schemes = HashSet::new();
        let mut protocol_relative = false;
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry == PROTOCOL_RELATIVE {
                protocol_relative = true;
            } else if !entry.is_empty() {
                schemes.insert(entry.to_ascii_lowercase());
            }
        }
        Self {
            schemes,
            protocol_relative,
        }
    }

    pub fn allows(&self, scheme: &str) -> bool {
        self.schemes.contains(&scheme.to_ascii_lowercase())
    }

    pub fn allows_protocol_relative(&self) -> bool {
        self.protocol_relative
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

impl Default for AllowedSchemes {
    fn default() -> Self {
        Self::from_list(DEFAULT_SCHEMES)
    }
}

/// A caller-supplied rewrite for text runs. It receives the raw text and the
/// open elements; its output is sanitized again before being spliced in.
#[derive(Clone)]
pub struct TextFilter(Arc<dyn Fn(&str, &[TagStackEntry]) -> String + Send + Sync>);

impl TextFilter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &[TagStackEntry]) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, text: &str, stack: &[TagStackEntry]) -> String {
        (self.0)(text, stack)
    }
}

impl fmt::Debug for TextFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TextFilter(..)")
    }
}

/// Options for a sanitization call.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub allowed_schemes: AllowedSchemes,
    /// Replaces the whitelist's default removal set when present.
    pub removals: Option<HashSet<String>>,
    pub text_filter: Option<TextFilter>,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allowed_schemes(mut self, schemes: AllowedSchemes) -> Self {
        self.allowed_schemes = schemes;
        self
    }

    pub fn with_removals<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.removals = Some(
            tags.into_iter()
                .map(|t| t.as_ref().trim().to_ascii_lowercase())
                .collect(),
        );
        self
    }

    pub fn with_text_filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &[TagStackEntry]) -> String + Send + Sync + 'static,
    {
        self.text_filter = Some(TextFilter::new(f));
        self
    }
}

/// The serializable part of [`EngineOptions`].
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "snake_case", default)]
pub struct ProfileConfig {
    pub profile_name: String,
    pub description: Option<String>,
    /// `None` keeps the default schemes.
    pub allowed_schemes: Option<Vec<String>>,
    /// `None` keeps the whitelist's default removal set.
    pub remove: Option<Vec<String>>,
}

impl ProfileConfig {
    pub fn validate(&self) -> Result<()> {
        if self.profile_name.trim().is_empty() {
            bail!("Profile validation failed: 'profile_name' cannot be empty.");
        }
        if let Some(schemes) = &self.allowed_schemes {
            if let Some(bad) = schemes.iter().find(|s| !is_scheme_entry(s)) {
                bail!(
                    "Profile '{}' validation failed: '{}' is not a valid URL scheme.",
                    self.profile_name,
                    bad
                );
            }
        }
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading profile from: {}", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading profile file {}", path.display()))?;
        let profile: ProfileConfig = serde_yml::from_str(&text)
            .with_context(|| format!("parsing profile YAML {}", path.display()))?;
        profile.validate()?;
        debug!("Loaded profile '{}'.", profile.profile_name);
        Ok(profile)
    }

    /// Converts the profile into engine options with no text filter.
    pub fn into_options(self) -> EngineOptions {
        let mut options = EngineOptions::new();
        if let Some(schemes) = self.allowed_schemes {
            options = options.with_allowed_schemes(AllowedSchemes::from_list(schemes));
        }
        if let Some(remove) = self.remove {
            options = options.with_removals(remove);
        }
        options
    }
}

/// A scheme name (RFC 3986 `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`) or the
/// protocol-relative marker.
fn is_scheme_entry(entry: &str) -> bool {
    if entry == PROTOCOL_RELATIVE {
        return true;
    }
    let mut chars = entry.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
