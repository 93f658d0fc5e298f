//! Malformed query fragments for parser-robustness probes
//!
//! Each mutation turns a well-formed `key=value` fragment into one whose key
//! no longer matches the parameter name the endpoint expects.

use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A way of corrupting a parameter name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Mutation {
    /// `id=42` → `i d=42`
    Split,
    /// `id=42` → `iid=42`
    Duplicate,
}

impl Mutation {
    pub const ALL: [Self; 2] = [Self::Split, Self::Duplicate];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Split => "split",
            Self::Duplicate => "duplicate",
        }
    }

    /// Build the malformed `key=value` fragment.
    #[must_use]
    pub fn apply(self, key: &str, value: &str) -> String {
        let mut chars = key.chars();
        let first = chars.next().map(String::from).unwrap_or_default();
        let rest = chars.as_str();
        match self {
            Self::Split => format!("{first} {rest}={value}"),
            Self::Duplicate => format!("{first}{key}={value}"),
        }
    }
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mutation '{0}' (expected split or duplicate)")]
pub struct UnknownMutation(pub String);

impl FromStr for Mutation {
    type Err = UnknownMutation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "split" => Ok(Self::Split),
            "duplicate" => Ok(Self::Duplicate),
            other => Err(UnknownMutation(other.to_string())),
        }
    }
}

/// Apply a mutation by name. Unknown names yield the well-formed fragment.
#[must_use]
pub fn destroy(method: &str, key: &str, value: &str) -> String {
    match method.parse::<Mutation>() {
        Ok(m) => m.apply(key, value),
        Err(_) => format!("{key}={value}"),
    }
}

/// Every malformed fragment for one parameter, in [`Mutation::ALL`] order.
#[must_use]
pub fn malformed_queries(key: &str, value: &str) -> Vec<(Mutation, String)> {
    Mutation::ALL
        .iter()
        .map(|m| (*m, m.apply(key, value)))
        .collect()
}
