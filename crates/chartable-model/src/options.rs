//! Configuration options for parsing, formatting, and export.

use serde::{Deserialize, Serialize};

/// Options for rendering a single value.
///
/// Unset fields fall back to the column kind's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatOptions {
    pub num_decimal_places: Option<u32>,
    pub unit: Option<String>,
    /// Short unit: `$`/`£`/`€` are prefixed, `%` and others are suffixed.
    pub short_unit: Option<String>,
    pub use_short_unit: bool,
    /// Keep trailing zeros after the decimal point (`1.50` instead of `1.5`).
    pub keep_trailing_zeros: bool,
    pub no_grouping: bool,
    pub show_plus: bool,
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decimal_places(mut self, places: u32) -> Self {
        self.num_decimal_places = Some(places);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_short_unit(mut self, unit: impl Into<String>) -> Self {
        self.short_unit = Some(unit.into());
        self.use_short_unit = true;
        self
    }

    pub fn with_trailing_zeros(mut self, keep: bool) -> Self {
        self.keep_trailing_zeros = keep;
        self
    }

    pub fn with_plus(mut self, show: bool) -> Self {
        self.show_plus = show;
        self
    }

    pub fn without_grouping(mut self) -> Self {
        self.no_grouping = true;
        self
    }
}

/// How exporters render cells that hold a sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorRendering {
    #[default]
    Blank,
    Name,
}

/// Options for delimited (CSV/TSV) export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelimitedOptions {
    pub delimiter: u8,
    pub errors: ErrorRendering,
    /// Write display names instead of slugs in the header row.
    pub use_display_names: bool,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            errors: ErrorRendering::Blank,
            use_display_names: false,
        }
    }
}

impl DelimitedOptions {
    pub fn csv() -> Self {
        Self::default()
    }

    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::default()
        }
    }

    pub fn with_errors(mut self, errors: ErrorRendering) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_display_names(mut self, enable: bool) -> Self {
        self.use_display_names = enable;
        self
    }
}

/// Options for reading delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Field delimiter. `None` sniffs tab vs comma from the header line.
    pub delimiter: Option<u8>,
    pub trim: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            trim: true,
        }
    }
}

impl ParseOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }
}
