// filterhtml-core/tests/config_integration_tests.rs
use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;

use filterhtml_core::config::{self, TagEntry, WhitelistConfig};
use filterhtml_core::{headless_filter_string, EngineOptions, FilterHtmlError};

#[test]
fn test_load_default_whitelist() {
    let config = WhitelistConfig::load_default().unwrap();
    assert!(!config.tags.is_empty());
    assert!(config.tags.contains_key("table"));
    assert!(matches!(config.tags.get("center"), Some(TagEntry::Alias(_))));
}

#[test]
fn test_load_yaml_from_file() -> Result<()> {
    let yaml_content = r#"
description: "Comments"
tags:
  "*":
    title: text
  a:
    href: url
    rel: [nofollow]
  b: strong
  strong: {}
"#;
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml_content.as_bytes())?;
    let config = WhitelistConfig::load_from_file(file.path())?;
    assert_eq!(config.tags.len(), 4);
    assert_eq!(config.description.as_deref(), Some("Comments"));

    let out = headless_filter_string(
        &config,
        EngineOptions::default(),
        "<b title=\"hi & bye\">x</b> <a href=\"/p\" rel=\"me\">y</a>",
    )?;
    assert_eq!(out, "<strong title=\"hi &amp; bye\">x</strong> <a href=\"/p\">y</a>");
    Ok(())
}

#[test]
fn test_load_json_from_file() -> Result<()> {
    let json_content = r#"{
  "tags": {
    "span": { "class": ["a", "b"], "style": { "color": "color" } },
    "iframe": false
  }
}"#;
    let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
    file.write_all(json_content.as_bytes())?;
    let config = WhitelistConfig::load_from_file(file.path())?;

    let out = headless_filter_string(
        &config,
        EngineOptions::default(),
        "<span class=\"b c a\" style=\"color: RED; position: fixed\">x</span><iframe src=x><span>gone</span></iframe>",
    )?;
    assert_eq!(out, "<span class=\"b a\" style=\"color:red;\">x</span>");
    Ok(())
}

#[test]
fn test_load_rejects_invalid_whitelists() -> Result<()> {
    let mut unknown_kind = NamedTempFile::new()?;
    unknown_kind.write_all(b"tags:\n  a:\n    href: hyperlink\n")?;
    let err = WhitelistConfig::load_from_file(unknown_kind.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("hyperlink"));

    let mut cycle = NamedTempFile::new()?;
    cycle.write_all(b"tags:\n  b: strong\n  strong: b\n")?;
    let err = WhitelistConfig::load_from_file(cycle.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Alias cycle"));

    let mut malformed = NamedTempFile::new()?;
    malformed.write_all(b"tags: [a, b]\n")?;
    assert!(WhitelistConfig::load_from_file(malformed.path()).is_err());

    assert!(WhitelistConfig::load_from_file("/nonexistent/whitelist.yaml").is_err());
    Ok(())
}

#[test]
fn test_merge_whitelists_override() -> Result<()> {
    let default_config = WhitelistConfig::load_default()?;
    let user_config = WhitelistConfig::from_yaml_str(
        "tags:\n  '*': { lang: alpha }\n  script: false\n  u: {}\n",
    )?;
    let merged = config::merge_whitelists(default_config.clone(), Some(user_config));
    assert_eq!(merged.tags.len(), default_config.tags.len() + 2);

    let out = headless_filter_string(
        &merged,
        EngineOptions::default(),
        "<u lang=\"en\">x</u><script>alert(1)</script>",
    )?;
    assert_eq!(out, "<u lang=\"en\">x</u>");
    Ok(())
}

#[test]
fn test_merge_whitelists_no_user_config() {
    let default_config = WhitelistConfig::load_default().unwrap();
    let merged = config::merge_whitelists(default_config.clone(), None);
    assert_eq!(merged, default_config);
}

#[test]
fn test_headless_reports_structural_errors() {
    let config = WhitelistConfig::load_default().unwrap();
    let err = headless_filter_string(&config, EngineOptions::default(), "<b><i>x</b></i>").unwrap_err();
    let err = err.downcast::<FilterHtmlError>().unwrap();
    assert!(err.is_structural());
}
