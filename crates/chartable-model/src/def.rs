//! Column definitions.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cell::{CellValue, Row};
use crate::kind::ColumnKind;

/// Row-level compute function for a derived column.
///
/// The table evaluates it once per row per table instance and stores the
/// result on the materialized rows.
#[derive(Clone)]
pub struct ComputeFn(Arc<dyn Fn(&Row) -> CellValue + Send + Sync>);

impl ComputeFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Row) -> CellValue + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, row: &Row) -> CellValue {
        (self.0)(row)
    }
}

impl fmt::Debug for ComputeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComputeFn(..)")
    }
}

/// Definition of a column: identity, kind, and display metadata.
///
/// The `slug` is the column's identity across transformation steps; the
/// `name` is only for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ColumnKind>,
    /// Maximum time distance accepted when filling gaps for this column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<i64>,
    /// Transform expression, e.g. `rollingAverage time entityName cases 7`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_decimal_places: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip)]
    pub compute: Option<ComputeFn>,
}

impl ColumnDef {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: ColumnKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tolerance(mut self, tolerance: i64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_transform(mut self, expression: impl Into<String>) -> Self {
        self.transform = Some(expression.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_short_unit(mut self, short_unit: impl Into<String>) -> Self {
        self.short_unit = Some(short_unit.into());
        self
    }

    pub fn with_num_decimal_places(mut self, places: u32) -> Self {
        self.num_decimal_places = Some(places);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_compute<F>(mut self, f: F) -> Self
    where
        F: Fn(&Row) -> CellValue + Send + Sync + 'static,
    {
        self.compute = Some(ComputeFn::new(f));
        self
    }

    /// Display name, falling back to the slug.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.slug)
    }

    /// Kind, falling back to `String` when none was declared or detected.
    pub fn kind_or_default(&self) -> ColumnKind {
        self.kind.unwrap_or(ColumnKind::String)
    }

    /// True when this column is derived from other columns at materialization.
    pub fn is_derived(&self) -> bool {
        self.compute.is_some() || self.transform.is_some()
    }

    /// Same definition under a new slug.
    pub fn renamed(&self, slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..self.clone()
        }
    }
}
