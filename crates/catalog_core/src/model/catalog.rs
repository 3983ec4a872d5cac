//! Catalog entity model.
//!
//! # Responsibility
//! - Define the logical-model objects offered for selection.
//! - Provide the canonical object id form used for selection matching.
//!
//! # Invariants
//! - `ObjId` string form is always `"{object_type}/{id}"`.
//! - `CatalogObject::kind` decides which validity-service bucket the object
//!   is checked against.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static WORKSPACE_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9._-]{0,254}$").expect("valid workspace id regex")
});

/// Catalog object category, matching the validity service kind keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Fact,
    Metric,
    Attribute,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 3] = [Self::Fact, Self::Metric, Self::Attribute];

    /// Parses a validity-service kind key; unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == key)
    }

    /// Kind key used by the validity service.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fact => "fact",
            Self::Metric => "metric",
            Self::Attribute => "attribute",
        }
    }

    /// Plural label used in human-readable reports.
    pub fn plural(self) -> &'static str {
        match self {
            Self::Fact => "facts",
            Self::Metric => "metrics",
            Self::Attribute => "attributes",
        }
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed object identifier (`label/customer.region`, `metric/revenue`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjId {
    pub object_type: String,
    pub id: String,
}

impl ObjId {
    pub fn new(object_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            id: id.into(),
        }
    }
}

impl Display for ObjId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.object_type, self.id)
    }
}

/// Error returned when an object id string is not `type/id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjIdParseError(pub String);

impl Display for ObjIdParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "object id must have the form `type/id`, got `{}`", self.0)
    }
}

impl Error for ObjIdParseError {}

impl FromStr for ObjId {
    type Err = ObjIdParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once('/') {
            Some((object_type, id)) if !object_type.is_empty() && !id.is_empty() => {
                Ok(Self::new(object_type, id))
            }
            _ => Err(ObjIdParseError(value.to_string())),
        }
    }
}

// Wire form is the canonical string, same as selection keys.
impl Serialize for ObjId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Fact, metric or attribute from the workspace logical model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogObject {
    /// Raw catalog id, matched against validity-service results.
    pub id: String,
    /// Typed id, matched against user selections.
    pub obj_id: ObjId,
    pub kind: ObjectKind,
    pub title: String,
    /// Date granularity marker; only set on date attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<String>,
}

impl CatalogObject {
    pub fn fact(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::with_kind(ObjectKind::Fact, "fact", id, title)
    }

    pub fn metric(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::with_kind(ObjectKind::Metric, "metric", id, title)
    }

    /// Attributes are selected through their default label.
    pub fn attribute(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::with_kind(ObjectKind::Attribute, "label", id, title)
    }

    fn with_kind(
        kind: ObjectKind,
        object_type: &str,
        id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            obj_id: ObjId::new(object_type, id.clone()),
            id,
            kind,
            title: title.into(),
            granularity: None,
        }
    }

    pub fn with_granularity(mut self, granularity: impl Into<String>) -> Self {
        self.granularity = Some(granularity.into());
        self
    }

    /// Canonical selection key of this object.
    pub fn obj_id_key(&self) -> String {
        self.obj_id.to_string()
    }

    pub fn is_date(&self) -> bool {
        self.granularity.is_some()
    }
}

/// Saved visualization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub title: String,
}

/// Analytics workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

/// Dataset of the declarative logical model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdmDataset {
    pub id: String,
    #[serde(default)]
    pub data_source_id: Option<String>,
}

/// Returns whether `value` is an acceptable workspace id.
pub fn is_valid_workspace_id(value: &str) -> bool {
    WORKSPACE_ID_RE.is_match(value)
}
