//! Catalog behavior settings.
//!
//! Every field has a default, so an empty JSON object is a valid settings
//! document.

use crate::service::projector::StaleSortPolicy;
use crate::service::reconciler::RemovalReportMode;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSettings {
    pub report_mode: RemovalReportMode,
    pub stale_sort_policy: StaleSortPolicy,
    /// Level passed to the logging bootstrap by hosts.
    pub log_level: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            report_mode: RemovalReportMode::default(),
            stale_sort_policy: StaleSortPolicy::default(),
            log_level: crate::logging::default_log_level().to_string(),
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read catalog settings: {err}"),
            Self::Parse(err) => write!(f, "invalid catalog settings: {err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl CatalogSettings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(SettingsError::Parse)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(SettingsError::Io)?;
        Self::from_json_str(&json)
    }
}
