//! Resolver options.
//!
//! Options are read from a JSON object with camelCase keys. Every key is
//! optional; booleans may also be written as strings (`"true"`, `"off"`, ...).

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Accepts both `true` and `"true"`.
fn deserialize_bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => {
            let normalized = s.trim().to_lowercase();
            match normalized.as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(Error::custom(format!(
                    "invalid boolean value: '{}'. Expected true, false, 'true', or 'false'",
                    s
                ))),
            }
        }
    }
}

/// Options as written in a configuration file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawOptions {
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    generate_hints: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    analyze_function_bodies: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    enable_deferred_loading: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    enable_union_types: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    strict_union_types: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_bool_or_string")]
    enable_type_promotion: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Report members missing on propagated types as hints.
    pub generate_hints: bool,
    /// Resolve the bodies of functions, methods and constructors.
    pub analyze_function_bodies: bool,
    /// Allow `deferred` imports and synthesize `loadLibrary`.
    pub enable_deferred_loading: bool,
    /// Merge branch overrides into union types.
    pub enable_union_types: bool,
    /// A union is more specific than `T` only when every member is.
    pub strict_union_types: bool,
    pub enable_type_promotion: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            generate_hints: true,
            analyze_function_bodies: true,
            enable_deferred_loading: true,
            enable_union_types: false,
            strict_union_types: false,
            enable_type_promotion: true,
        }
    }
}

impl From<RawOptions> for ResolverOptions {
    fn from(raw: RawOptions) -> Self {
        let defaults = ResolverOptions::default();
        Self {
            generate_hints: raw.generate_hints.unwrap_or(defaults.generate_hints),
            analyze_function_bodies: raw
                .analyze_function_bodies
                .unwrap_or(defaults.analyze_function_bodies),
            enable_deferred_loading: raw
                .enable_deferred_loading
                .unwrap_or(defaults.enable_deferred_loading),
            enable_union_types: raw.enable_union_types.unwrap_or(defaults.enable_union_types),
            strict_union_types: raw.strict_union_types.unwrap_or(defaults.strict_union_types),
            enable_type_promotion: raw
                .enable_type_promotion
                .unwrap_or(defaults.enable_type_promotion),
        }
    }
}

impl ResolverOptions {
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawOptions =
            serde_json::from_str(text).context("failed to parse resolver options JSON")?;
        Ok(raw.into())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read resolver options: {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("failed to parse resolver options: {}", path.display()))
    }
}

#[cfg(test)]
#[path = "../tests/options_tests.rs"]
mod tests;
