//! Enum types for registry metadata and cache behaviour

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// METADATA KINDS
// ============================================================================

/// Category of registry object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataKind {
    DataSource,
    Entity,
    FeatureView,
    OnDemandFeatureView,
    StreamFeatureView,
    FeatureService,
    SavedDataset,
    ValidationReference,
    ProjectMetadata,
    Infra,
}

impl MetadataKind {
    /// Whether list operations for this kind accept a tag filter.
    pub fn supports_tags(&self) -> bool {
        matches!(
            self,
            MetadataKind::DataSource
                | MetadataKind::Entity
                | MetadataKind::FeatureView
                | MetadataKind::OnDemandFeatureView
                | MetadataKind::StreamFeatureView
                | MetadataKind::FeatureService
        )
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            MetadataKind::DataSource => "DataSource",
            MetadataKind::Entity => "Entity",
            MetadataKind::FeatureView => "FeatureView",
            MetadataKind::OnDemandFeatureView => "OnDemandFeatureView",
            MetadataKind::StreamFeatureView => "StreamFeatureView",
            MetadataKind::FeatureService => "FeatureService",
            MetadataKind::SavedDataset => "SavedDataset",
            MetadataKind::ValidationReference => "ValidationReference",
            MetadataKind::ProjectMetadata => "ProjectMetadata",
            MetadataKind::Infra => "Infra",
        };
        write!(f, "{}", value)
    }
}

// ============================================================================
// REFRESH MODE
// ============================================================================

/// How the cached snapshot is kept current.
///
/// Fixed at construction of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
    /// A background task replaces the snapshot every TTL, regardless of reads.
    #[serde(alias = "thread")]
    Background,
    /// A cached read that finds the snapshot stale refreshes it before returning.
    #[default]
    #[serde(alias = "sync", alias = "on-demand")]
    OnDemand,
    /// The snapshot only changes through an explicit refresh.
    Manual,
}

impl RefreshMode {
    /// Canonical configuration string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshMode::Background => "background",
            RefreshMode::OnDemand => "on_demand",
            RefreshMode::Manual => "manual",
        }
    }
}

impl fmt::Display for RefreshMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RefreshMode {
    type Err = RefreshModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "background" | "thread" => Ok(RefreshMode::Background),
            "ondemand" | "sync" => Ok(RefreshMode::OnDemand),
            "manual" => Ok(RefreshMode::Manual),
            _ => Err(RefreshModeParseError(s.to_string())),
        }
    }
}

/// Error when parsing an invalid refresh mode string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshModeParseError(pub String);

impl fmt::Display for RefreshModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid refresh mode: {}", self.0)
    }
}

impl std::error::Error for RefreshModeParseError {}

fn normalize_token(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_mode_parse_aliases() {
        assert_eq!("thread".parse::<RefreshMode>(), Ok(RefreshMode::Background));
        assert_eq!("Background".parse::<RefreshMode>(), Ok(RefreshMode::Background));
        assert_eq!("sync".parse::<RefreshMode>(), Ok(RefreshMode::OnDemand));
        assert_eq!("on-demand".parse::<RefreshMode>(), Ok(RefreshMode::OnDemand));
        assert_eq!("ON_DEMAND".parse::<RefreshMode>(), Ok(RefreshMode::OnDemand));
        assert_eq!("manual".parse::<RefreshMode>(), Ok(RefreshMode::Manual));
    }

    #[test]
    fn test_refresh_mode_parse_rejects_unknown() {
        let err = "eventually".parse::<RefreshMode>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid refresh mode: eventually");
    }

    #[test]
    fn test_refresh_mode_display_roundtrips_through_from_str() {
        for mode in [RefreshMode::Background, RefreshMode::OnDemand, RefreshMode::Manual] {
            assert_eq!(mode.to_string().parse::<RefreshMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_refresh_mode_serde_aliases() {
        let mode: RefreshMode = serde_json::from_str("\"thread\"").unwrap();
        assert_eq!(mode, RefreshMode::Background);
        let mode: RefreshMode = serde_json::from_str("\"sync\"").unwrap();
        assert_eq!(mode, RefreshMode::OnDemand);
        assert_eq!(serde_json::to_string(&RefreshMode::OnDemand).unwrap(), "\"on_demand\"");
    }

    #[test]
    fn test_default_mode_is_on_demand() {
        assert_eq!(RefreshMode::default(), RefreshMode::OnDemand);
    }

    #[test]
    fn test_tag_support_by_kind() {
        assert!(MetadataKind::Entity.supports_tags());
        assert!(MetadataKind::FeatureService.supports_tags());
        assert!(!MetadataKind::SavedDataset.supports_tags());
        assert!(!MetadataKind::ValidationReference.supports_tags());
        assert!(!MetadataKind::ProjectMetadata.supports_tags());
    }
}
