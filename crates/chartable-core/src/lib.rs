//! Immutable, typed tables. Every transformation returns a new table that
//! points back at its parent.
//!
//! ```
//! use chartable_core::Table;
//!
//! let table = Table::from_delimited("entityName,year,gdp\nFrance,2000,1.5\nPeru,2000,oops").unwrap();
//! let clean = table.drop_rows_with_error_values_for_column("gdp");
//! assert_eq!(clean.num_rows(), 1);
//! assert_eq!(clean.num_steps(), 2);
//! ```

pub mod column;
pub mod delimited;
mod export;
pub mod format;
pub mod kinds;
mod ops;
#[cfg(feature = "polars")]
mod polars_ext;
pub mod step;
pub mod storage;
pub mod summary;
mod table;
mod time_series;

pub use column::{Column, OwidRow};
pub use kinds::{KindBehavior, behavior, detect_kind};
pub use ops::{SortOrder, compare_cells};
#[cfg(feature = "polars")]
pub use polars_ext::any_to_cell;
pub use step::{TableStep, TransformKind};
pub use storage::{ColumnarStore, RowStore, StorageEngine, TableStorage};
pub use summary::ColumnSummary;
pub use table::Table;

pub use chartable_model::{
    CellValue, ColumnDef, ColumnKind, ColumnStore, DelimitedOptions, ErrorRendering, ErrorValue,
    FormatOptions, ParseOptions, Result, Row, TableError, Time,
};
