//! Id, title and name resolution for selection widgets.
//!
//! Widgets offer an explicit "nothing selected" entry first. Inside the crate
//! that entry is `SelectOption::None`; the string key/title pair only exists
//! at the widget boundary.

use crate::model::catalog::{CatalogObject, Insight, ObjectKind, Workspace};
use once_cell::sync::Lazy;
use regex::Regex;

/// Widget key of the "nothing selected" entry.
pub const NO_SELECTION_KEY: &str = "__no_selection__";
/// Label of the "nothing selected" entry.
pub const NO_SELECTION_TITLE: &str = "---";

static NON_IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("valid identifier regex"));

/// One dropdown entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectOption {
    None,
    Selected(String),
}

impl SelectOption {
    pub fn from_key(key: &str) -> Self {
        if key == NO_SELECTION_KEY {
            Self::None
        } else {
            Self::Selected(key.to_string())
        }
    }

    pub fn as_key(&self) -> &str {
        match self {
            Self::None => NO_SELECTION_KEY,
            Self::Selected(id) => id.as_str(),
        }
    }

    pub fn selected(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Selected(id) => Some(id.as_str()),
        }
    }
}

/// Anything with a raw id.
pub trait Identified {
    fn id(&self) -> &str;
}

/// Anything shown by title.
pub trait Titled {
    fn title(&self) -> &str;
}

impl Identified for CatalogObject {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Insight {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Workspace {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Titled for CatalogObject {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Titled for Insight {
    fn title(&self) -> &str {
        &self.title
    }
}

pub fn ids<T: Identified>(objects: &[T]) -> Vec<String> {
    objects.iter().map(|o| o.id().to_string()).collect()
}

pub fn object_ids(objects: &[CatalogObject]) -> Vec<String> {
    objects.iter().map(CatalogObject::obj_id_key).collect()
}

/// Raw ids preceded by the "nothing selected" entry.
pub fn ids_with_default<T: Identified>(objects: &[T]) -> Vec<SelectOption> {
    std::iter::once(SelectOption::None)
        .chain(objects.iter().map(|o| SelectOption::Selected(o.id().to_string())))
        .collect()
}

/// Object ids preceded by the "nothing selected" entry.
pub fn obj_ids_with_default(objects: &[CatalogObject]) -> Vec<SelectOption> {
    std::iter::once(SelectOption::None)
        .chain(objects.iter().map(|o| SelectOption::Selected(o.obj_id_key())))
        .collect()
}

/// Title of the object with raw id `option`; `None` when nothing matches.
pub fn title_for_id<'a, T: Identified + Titled>(
    objects: &'a [T],
    option: &SelectOption,
) -> Option<&'a str> {
    match option {
        SelectOption::None => Some(NO_SELECTION_TITLE),
        SelectOption::Selected(id) => objects
            .iter()
            .find(|o| o.id() == id.as_str())
            .map(|o| o.title()),
    }
}

pub fn title_for_obj_id<'a>(
    objects: &'a [CatalogObject],
    option: &SelectOption,
) -> Option<&'a str> {
    match option {
        SelectOption::None => Some(NO_SELECTION_TITLE),
        SelectOption::Selected(obj_id) => objects
            .iter()
            .find(|o| o.obj_id_key() == *obj_id)
            .map(|o| o.title.as_str()),
    }
}

pub fn name_for_id<'a>(workspaces: &'a [Workspace], option: &SelectOption) -> Option<&'a str> {
    match option {
        SelectOption::None => Some(NO_SELECTION_TITLE),
        SelectOption::Selected(id) => workspaces
            .iter()
            .find(|w| w.id == *id)
            .map(|w| w.name.as_str()),
    }
}

/// Attributes carrying a date granularity.
pub fn date_attributes(attributes: &[CatalogObject]) -> Vec<&CatalogObject> {
    attributes.iter().filter(|a| a.is_date()).collect()
}

/// Default column-name encoding of an object id string.
pub fn local_id(obj_id: &str) -> String {
    NON_IDENTIFIER_RE.replace_all(obj_id, "_").into_owned()
}

/// Result column name of an object used as a metric.
///
/// Aggregated facts and attributes get a generated column; real metrics keep
/// their title.
pub fn metric_column_name(object: &CatalogObject, local_id: fn(&str) -> String) -> String {
    match object.kind {
        ObjectKind::Fact | ObjectKind::Attribute => local_id(&object.obj_id_key()),
        ObjectKind::Metric => object.title.clone(),
    }
}
