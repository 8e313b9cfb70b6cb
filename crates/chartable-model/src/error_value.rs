//! Sentinel values for cells that hold no usable real value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason a cell does not hold a real value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorValue {
    /// Inserted to pad a time series to a contiguous range; never user-visible.
    MissingValuePlaceholder,
    /// The input row had no value at all for a numeric column.
    UndefinedButShouldBeNumber,
    NullButShouldBeNumber,
    BlankButShouldBeNumber,
    NotParseableAsNumber,
    NaNButShouldBeNumber,
    UndefinedButShouldBeString,
    NullButShouldBeString,
    TypeMismatch,
    DivideByZero,
    NoValueWithinTolerance,
    NoMatchingValueAfterJoin,
    /// Below the threshold of `timeSinceEntityExceededThreshold`.
    ValueTooLow,
    NoPriorValueForComparison,
    /// Removed by a `where` transform.
    FilteredOut,
    InvalidQuarterValue,
    InvalidNegativeValue,
    InvalidOnLogScale,
    DroppedForTesting,
}

impl ErrorValue {
    /// All sentinel variants, in declaration order.
    pub const ALL: [ErrorValue; 19] = [
        ErrorValue::MissingValuePlaceholder,
        ErrorValue::UndefinedButShouldBeNumber,
        ErrorValue::NullButShouldBeNumber,
        ErrorValue::BlankButShouldBeNumber,
        ErrorValue::NotParseableAsNumber,
        ErrorValue::NaNButShouldBeNumber,
        ErrorValue::UndefinedButShouldBeString,
        ErrorValue::NullButShouldBeString,
        ErrorValue::TypeMismatch,
        ErrorValue::DivideByZero,
        ErrorValue::NoValueWithinTolerance,
        ErrorValue::NoMatchingValueAfterJoin,
        ErrorValue::ValueTooLow,
        ErrorValue::NoPriorValueForComparison,
        ErrorValue::FilteredOut,
        ErrorValue::InvalidQuarterValue,
        ErrorValue::InvalidNegativeValue,
        ErrorValue::InvalidOnLogScale,
        ErrorValue::DroppedForTesting,
    ];

    /// Name of the variant responsible for the missing value.
    pub fn error_string(&self) -> &'static str {
        match self {
            Self::MissingValuePlaceholder => "MissingValuePlaceholder",
            Self::UndefinedButShouldBeNumber => "UndefinedButShouldBeNumber",
            Self::NullButShouldBeNumber => "NullButShouldBeNumber",
            Self::BlankButShouldBeNumber => "BlankButShouldBeNumber",
            Self::NotParseableAsNumber => "NotParseableAsNumber",
            Self::NaNButShouldBeNumber => "NaNButShouldBeNumber",
            Self::UndefinedButShouldBeString => "UndefinedButShouldBeString",
            Self::NullButShouldBeString => "NullButShouldBeString",
            Self::TypeMismatch => "TypeMismatch",
            Self::DivideByZero => "DivideByZero",
            Self::NoValueWithinTolerance => "NoValueWithinTolerance",
            Self::NoMatchingValueAfterJoin => "NoMatchingValueAfterJoin",
            Self::ValueTooLow => "ValueTooLow",
            Self::NoPriorValueForComparison => "NoPriorValueForComparison",
            Self::FilteredOut => "FilteredOut",
            Self::InvalidQuarterValue => "InvalidQuarterValue",
            Self::InvalidNegativeValue => "InvalidNegativeValue",
            Self::InvalidOnLogScale => "InvalidOnLogScale",
            Self::DroppedForTesting => "DroppedForTesting",
        }
    }

    /// Human-readable explanation, suitable for diagnostics and tooltips.
    pub fn description(&self) -> &'static str {
        match self {
            Self::MissingValuePlaceholder => "placeholder for a missing time step",
            Self::UndefinedButShouldBeNumber => "no value provided for a numeric column",
            Self::NullButShouldBeNumber => "null in a numeric column",
            Self::BlankButShouldBeNumber => "blank cell in a numeric column",
            Self::NotParseableAsNumber => "text that is not a number",
            Self::NaNButShouldBeNumber => "NaN in a numeric column",
            Self::UndefinedButShouldBeString => "no value provided for a text column",
            Self::NullButShouldBeString => "null in a text column",
            Self::TypeMismatch => "value of the wrong type",
            Self::DivideByZero => "division by zero",
            Self::NoValueWithinTolerance => "no value within the time tolerance",
            Self::NoMatchingValueAfterJoin => "no matching row after join",
            Self::ValueTooLow => "value below threshold",
            Self::NoPriorValueForComparison => "no earlier value to compare against",
            Self::FilteredOut => "value filtered out",
            Self::InvalidQuarterValue => "not a valid quarter",
            Self::InvalidNegativeValue => "negative value not allowed",
            Self::InvalidOnLogScale => "value not representable on a log scale",
            Self::DroppedForTesting => "dropped for testing",
        }
    }

    /// Parse a variant from its [`error_string`](Self::error_string).
    pub fn from_error_string(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.error_string() == name)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_string_round_trips_every_variant() {
        for variant in ErrorValue::ALL {
            assert_eq!(ErrorValue::from_error_string(variant.error_string()), Some(variant));
        }
        assert_eq!(ErrorValue::from_error_string("Nope"), None);
    }

    #[test]
    fn test_display_names_variant() {
        assert_eq!(ErrorValue::DivideByZero.to_string(), "DivideByZero");
    }
}
