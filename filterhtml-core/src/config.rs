//! Configuration management for `filterhtml-core`.
//!
//! This module defines the declarative, serializable form of a whitelist. It
//! handles YAML and JSON deserialization and provides utilities for loading,
//! merging and validating whitelist files. A [`WhitelistConfig`] is turned into
//! a [`WhitelistSpec`](crate::spec::WhitelistSpec) by
//! [`compile_whitelist`](crate::sanitizers::compiler::compile_whitelist).
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, info};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::sanitizers::compiler::compile_whitelist;

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// The key holding attributes allowed on every tag.
pub const GLOBAL_KEY: &str = "*";

/// A regex pattern entry, written `{ pattern: '...' }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PatternEntry {
    pub pattern: String,
}

/// One entry of an enumerated value list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ChoiceEntry {
    Literal(String),
    Integer(i64),
    Flag(bool),
    Pattern(PatternEntry),
}

/// The rule for one attribute or style property.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RuleEntry {
    /// A value kind (`url`, `color`, ...), `*` for any value, or `[chars]`.
    Keyword(String),
    Pattern(PatternEntry),
    OneOf(Vec<ChoiceEntry>),
    /// CSS property rules; only valid for `style`.
    Style(BTreeMap<String, RuleEntry>),
}

/// Attribute rules keyed by name, `/regex/` or `*`, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeEntries(pub Vec<(String, RuleEntry)>);

impl AttributeEntries {
    pub fn get(&self, name: &str) -> Option<&RuleEntry> {
        self.0.iter().find(|(key, _)| key == name).map(|(_, rule)| rule)
    }

    /// Replaces the rule for `name`, or appends it.
    pub fn insert(&mut self, name: String, rule: RuleEntry) {
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = rule,
            None => self.0.push((name, rule)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleEntry)> {
        self.0.iter().map(|(key, rule)| (key.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for AttributeEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, rule) in &self.0 {
            map.serialize_entry(key, rule)?;
        }
        map.end()
    }
}

struct AttributeEntriesVisitor;

impl<'de> Visitor<'de> for AttributeEntriesVisitor {
    type Value = AttributeEntries;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of attribute names to rules")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = AttributeEntries::default();
        while let Some((key, rule)) = access.next_entry::<String, RuleEntry>()? {
            entries.insert(key, rule);
        }
        Ok(entries)
    }
}

impl<'de> Deserialize<'de> for AttributeEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttributeEntriesVisitor)
    }
}

/// The policy for one tag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TagEntry {
    /// `false` removes the tag with its content; `true` allows it bare.
    Flag(bool),
    /// `target literal-attributes...`
    Alias(String),
    Attributes(AttributeEntries),
}

/// Represents the top-level whitelist configuration.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WhitelistConfig {
    pub description: Option<String>,
    pub tags: BTreeMap<String, TagEntry>,
}

impl WhitelistConfig {
    /// Loads a whitelist from a file. `.json` files are read as JSON, anything
    /// else as YAML.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading whitelist from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read whitelist file {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: WhitelistConfig = if is_json {
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse whitelist file {}", path.display()))?
        } else {
            serde_yml::from_str(&text)
                .with_context(|| format!("Failed to parse whitelist file {}", path.display()))?
        };

        config.validate()?;
        info!("Loaded {} tag entries from file {}.", config.tags.len(), path.display());
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: WhitelistConfig =
            serde_yml::from_str(yaml).context("Failed to parse whitelist YAML")?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: WhitelistConfig =
            serde_json::from_str(json).context("Failed to parse whitelist JSON")?;
        Ok(config)
    }

    /// Loads the embedded default whitelist.
    pub fn load_default() -> Result<Self> {
        debug!("Loading default whitelist from embedded string...");
        let default_yaml = include_str!("../config/default_whitelist.yaml");
        let config = Self::from_yaml_str(default_yaml).context("Failed to parse default whitelist")?;
        debug!("Loaded {} default tag entries.", config.tags.len());
        Ok(config)
    }

    /// Checks that the whitelist compiles: every keyword is known, every
    /// pattern compiles and no alias chain cycles.
    pub fn validate(&self) -> Result<()> {
        compile_whitelist(self).context("Whitelist validation failed")?;
        Ok(())
    }

    /// The global attribute entries, if any.
    pub fn global_attributes(&self) -> Option<&AttributeEntries> {
        match self.tags.get(GLOBAL_KEY) {
            Some(TagEntry::Attributes(entries)) => Some(entries),
            _ => None,
        }
    }
}

/// Merges a user whitelist into the defaults. User tag entries replace the
/// default entry for the same tag; global attributes are merged by name.
pub fn merge_whitelists(default_config: WhitelistConfig, user_config: Option<WhitelistConfig>) -> WhitelistConfig {
    debug!("merge_whitelists called. Default tag entries: {}", default_config.tags.len());
    let mut merged = default_config;

    if let Some(user_cfg) = user_config {
        debug!("User whitelist provided. Merging {} tag entries.", user_cfg.tags.len());
        if user_cfg.description.is_some() {
            merged.description = user_cfg.description;
        }
        for (name, entry) in user_cfg.tags {
            if name == GLOBAL_KEY {
                if let (TagEntry::Attributes(user_globals), Some(TagEntry::Attributes(globals))) =
                    (&entry, merged.tags.get_mut(GLOBAL_KEY))
                {
                    for (attribute, rule) in user_globals.iter() {
                        globals.insert(attribute.to_string(), rule.clone());
                    }
                    continue;
                }
            }
            merged.tags.insert(name, entry);
        }
    }

    debug!("Final tag entries after merge: {}", merged.tags.len());
    merged
}
