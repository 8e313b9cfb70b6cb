//! Adapter from legacy variable JSON (parallel `years`/`entities`/`values`
//! arrays plus an entity key) to a [`Table`](chartable_core::Table).

mod convert;
mod types;

pub use convert::{legacy_json_to_table, legacy_to_table};
pub use types::{
    ChartDimension, LegacyDisplay, LegacyEntityMeta, LegacySource, LegacyVariable,
    LegacyVariablesAndEntityKey,
};
