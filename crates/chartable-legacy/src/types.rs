use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level legacy payload: variables keyed by id, entity metadata keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyVariablesAndEntityKey {
    #[serde(default)]
    pub variables: BTreeMap<String, LegacyVariable>,
    #[serde(default)]
    pub entity_key: BTreeMap<String, LegacyEntityMeta>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyEntityMeta {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySource {
    #[serde(default)]
    pub name: Option<String>,
}

/// One variable. `years`, `entities` and `values` are parallel arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyVariable {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub short_unit: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<LegacySource>,
    #[serde(default)]
    pub years: Vec<i64>,
    #[serde(default)]
    pub entities: Vec<i64>,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default)]
    pub display: LegacyDisplay,
}

/// Display settings. Set on a variable, and again on a chart dimension whose
/// settings take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDisplay {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub short_unit: Option<String>,
    #[serde(default)]
    pub conversion_factor: Option<f64>,
    #[serde(default)]
    pub num_decimal_places: Option<u32>,
    #[serde(default)]
    pub tolerance: Option<i64>,
    /// Times are day offsets from `zero_day` rather than years.
    #[serde(default)]
    pub year_is_day: Option<bool>,
    /// `YYYY-MM-DD` origin for day offsets.
    #[serde(default)]
    pub zero_day: Option<String>,
}

impl LegacyDisplay {
    /// `self` with every field set in `over` replaced.
    pub fn overridden_by(&self, over: &LegacyDisplay) -> LegacyDisplay {
        LegacyDisplay {
            name: over.name.clone().or_else(|| self.name.clone()),
            unit: over.unit.clone().or_else(|| self.unit.clone()),
            short_unit: over.short_unit.clone().or_else(|| self.short_unit.clone()),
            conversion_factor: over.conversion_factor.or(self.conversion_factor),
            num_decimal_places: over.num_decimal_places.or(self.num_decimal_places),
            tolerance: over.tolerance.or(self.tolerance),
            year_is_day: over.year_is_day.or(self.year_is_day),
            zero_day: over.zero_day.clone().or_else(|| self.zero_day.clone()),
        }
    }
}

/// Chart-level settings for one variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDimension {
    pub variable_id: Value,
    #[serde(default)]
    pub display: LegacyDisplay,
}

impl ChartDimension {
    pub fn variable_key(&self) -> String {
        value_key(&self.variable_id)
    }
}

/// Map key for an id that may be written as a number or a string.
pub(crate) fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
