//! Portal UI configuration keys.
//!
//! A configuration file is a JSON array of
//! `{"config_name": ..., "config_value": ..., "scopes": [...]}`. String
//! values may contain the placeholder `custID`, replaced by the host id.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::object;
use crate::api::{ConflictSignal, ResourceDescriptor};

const HOST_PLACEHOLDER: &str = "custID";

const COLOR_KEYS: &[&str] = &[
    "PORTAL_CSS_PRIMARY_1",
    "PORTAL_CSS_PRIMARY_2",
    "PORTAL_CSS_COLOR_MENU_BAR_PRIMARY_1",
    "PORTAL_CSS_COLOR_MENU_BAR_PRIMARY_2",
    "PORTAL_WEBPHONE_PWA_BACKGROUND_COLOR",
    "PORTAL_WEBPHONE_PWA_THEME_COLOR",
    "PORTAL_THEME_ACCENT",
];

const YES_NO_KEYS: &[&str] = &[
    "PORTAL_USERS_DIR_MATCH_FIRSTNAME",
    "PORTAL_THREE_WAY_CALL_DISCONNECT_OTHERS_ON_END",
];

const DIGIT_KEYS: &[&str] = &[
    "PORTAL_USERS_SECURE_PASSWORD_MIN_LENGTH",
    "PORTAL_USERS_SECURE_PASSWORD_MIN_CAPITAL_LETTER_COUNT",
    "PORTAL_USERS_SECURE_PASSWORD_MIN_NUMBER_COUNT",
    "PORTAL_USERS_MIN_PASSWORD_LENGTH",
    "PORTAL_USERS_SECURE_PASSWORD_MIN_SPECIAL_CHAR_COUNT",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    pub config_name: String,
    pub config_value: Value,
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Expand the shorthand scope names used in configuration files.
pub fn expand_scope(scope: &str) -> &str {
    match scope {
        "su" => "Super User",
        "res" => "Reseller",
        "om" => "Office Manager",
        "adv" => "Advanced User",
        other => other,
    }
}

/// What kind of value a configuration key accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Color,
    YesNo,
    Digit,
    Text,
}

pub fn classify(name: &str) -> ValueClass {
    if COLOR_KEYS.contains(&name) {
        ValueClass::Color
    } else if YES_NO_KEYS.contains(&name) {
        ValueClass::YesNo
    } else if DIGIT_KEYS.contains(&name) {
        ValueClass::Digit
    } else {
        ValueClass::Text
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate and normalise an override value for `name`.
pub fn validate_value(name: &str, raw: &str) -> anyhow::Result<String> {
    let value = raw.trim();
    match classify(name) {
        ValueClass::Color if is_hex_color(value) => Ok(value.to_string()),
        ValueClass::Color => anyhow::bail!(
            "Invalid hex code '{}' for {}. Expected a hex color such as #AABBCC",
            value,
            name
        ),
        ValueClass::YesNo => match value.to_ascii_lowercase().as_str() {
            "y" | "yes" => Ok("yes".into()),
            "n" | "no" => Ok("no".into()),
            _ => anyhow::bail!("Invalid value '{}' for {}. Expected yes or no", value, name),
        },
        ValueClass::Digit => {
            if value.len() == 1 && value.chars().all(|c| c.is_ascii_digit()) {
                Ok(value.to_string())
            } else {
                anyhow::bail!(
                    "Invalid value '{}' for {}. Expected a number between 0 and 9",
                    value,
                    name
                )
            }
        }
        ValueClass::Text => Ok(value.to_string()),
    }
}

/// Parse a `NAME=VALUE` command-line override.
pub fn parse_override(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty configuration name in '{}'", s));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Read a configuration file and substitute the host id placeholder.
pub fn load(path: &Path, host_id: &str) -> anyhow::Result<Vec<UiConfig>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read UI configuration file {}", path.display()))?;
    parse(&raw, host_id)
        .with_context(|| format!("Invalid UI configuration file {}", path.display()))
}

pub fn parse(raw: &str, host_id: &str) -> anyhow::Result<Vec<UiConfig>> {
    let mut configs: Vec<UiConfig> = serde_json::from_str(raw)?;
    for config in &mut configs {
        if let Value::String(s) = &config.config_value {
            config.config_value = Value::String(s.replace(HOST_PLACEHOLDER, host_id));
        }
    }
    Ok(configs)
}

/// Apply validated overrides. Keys absent from `configs` are appended unscoped.
pub fn apply_overrides(
    configs: &mut Vec<UiConfig>,
    overrides: &[(String, String)],
) -> anyhow::Result<()> {
    for (name, raw) in overrides {
        let value = Value::String(validate_value(name, raw)?);
        match configs.iter_mut().find(|c| &c.config_name == name) {
            Some(config) => config.config_value = value,
            None => configs.push(UiConfig {
                config_name: name.clone(),
                config_value: value,
                scopes: Vec::new(),
            }),
        }
    }
    Ok(())
}

impl UiConfig {
    /// One descriptor per scope, or a single wildcard-scoped one.
    pub fn descriptors(&self) -> Vec<ResourceDescriptor> {
        let base = ResourceDescriptor::new(self.config_name.as_str(), "/configurations")
            .with_defaults(object(json!({
                "admin-ui-account-type": "*",
                "reseller": "*",
                "user": "*",
                "user-scope": "*",
                "core-server": "*",
                "domain": "*",
                "description": "Created via API",
            })))
            .with_field("config-name", self.config_name.as_str())
            .with_field("config-value", self.config_value.clone())
            .conflict_signal(ConflictSignal::StatusOrBodyCode);

        if self.scopes.is_empty() {
            return vec![base];
        }
        self.scopes
            .iter()
            .map(|s| base.clone().with_scope("user-scope", expand_scope(s)))
            .collect()
    }
}
