//! Recognized settings keys and their defaults
//!
//! Settings live in the `settings` table as text. Any key may be stored;
//! the ones below are the keys the application itself reads.

use std::fmt;
use std::str::FromStr;

/// Schema version written by this build
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Application version recorded on initialization
pub const APP_VERSION: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    SchemaVersion,
    AppVersion,
    SimilarityThreshold,
    MaxResults,
    FuzzyDefaultDistance,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::SchemaVersion,
        SettingKey::AppVersion,
        SettingKey::SimilarityThreshold,
        SettingKey::MaxResults,
        SettingKey::FuzzyDefaultDistance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::SchemaVersion => "schema_version",
            SettingKey::AppVersion => "app_version",
            SettingKey::SimilarityThreshold => "similarity_threshold",
            SettingKey::MaxResults => "max_results",
            SettingKey::FuzzyDefaultDistance => "fuzzy_default_distance",
        }
    }

    /// Value used when the key is absent from the store
    pub fn default_value(&self) -> i64 {
        match self {
            SettingKey::SchemaVersion => CURRENT_SCHEMA_VERSION,
            SettingKey::AppVersion => APP_VERSION,
            SettingKey::SimilarityThreshold => 3,
            SettingKey::MaxResults => 20,
            SettingKey::FuzzyDefaultDistance => 3,
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unrecognized setting: {s}"))
    }
}
