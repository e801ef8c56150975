//! Value-level sanitization for the structural parser.
//!
//! `attributes` dispatches one attribute value to its [`Rule`](crate::spec::Rule),
//! `style` handles `style` declarations, `text` escapes character data, and
//! `compiler` turns a declarative whitelist configuration into a
//! [`WhitelistSpec`](crate::spec::WhitelistSpec).
//!
//! This module works closely with `spec` (rule definitions), `validators` (the
//! built-in value shapes) and `parser` (which feeds it raw values).

pub mod attributes;
pub mod compiler;
pub mod style;
pub mod text;
