//! Data model shared by the chartable crates: cell values, sentinel error
//! values, column kinds, column definitions, and configuration options.

pub mod cell;
pub mod def;
pub mod error;
pub mod error_value;
pub mod kind;
pub mod options;
pub mod slugs;

pub use cell::{CellValue, ColumnStore, Row, format_plain_number, row};
pub use def::{ColumnDef, ComputeFn};
pub use error::{Result, TableError};
pub use error_value::ErrorValue;
pub use kind::ColumnKind;
pub use options::{DelimitedOptions, ErrorRendering, FormatOptions, ParseOptions};

/// Time value: a year, or a day offset from the day epoch.
pub type Time = i64;
