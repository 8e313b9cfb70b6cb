//! Column kinds. Refinements are expressed by [`ColumnKind::parent`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ColumnKind {
    String,
    SeriesAnnotation,
    Categorical,
    Region,
    Continent,
    Color,
    Boolean,
    EntityName,
    EntityId,
    EntityCode,
    Numeric,
    Integer,
    Currency,
    Percentage,
    DecimalPercentage,
    RelativePercentage,
    PercentChangeOverTime,
    Population,
    PopulationDensity,
    Age,
    Ratio,
    NumberOfYears,
    Year,
    Day,
    Date,
    Quarter,
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 26] = [
        ColumnKind::String,
        ColumnKind::SeriesAnnotation,
        ColumnKind::Categorical,
        ColumnKind::Region,
        ColumnKind::Continent,
        ColumnKind::Color,
        ColumnKind::Boolean,
        ColumnKind::EntityName,
        ColumnKind::EntityId,
        ColumnKind::EntityCode,
        ColumnKind::Numeric,
        ColumnKind::Integer,
        ColumnKind::Currency,
        ColumnKind::Percentage,
        ColumnKind::DecimalPercentage,
        ColumnKind::RelativePercentage,
        ColumnKind::PercentChangeOverTime,
        ColumnKind::Population,
        ColumnKind::PopulationDensity,
        ColumnKind::Age,
        ColumnKind::Ratio,
        ColumnKind::NumberOfYears,
        ColumnKind::Year,
        ColumnKind::Day,
        ColumnKind::Date,
        ColumnKind::Quarter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::SeriesAnnotation => "SeriesAnnotation",
            Self::Categorical => "Categorical",
            Self::Region => "Region",
            Self::Continent => "Continent",
            Self::Color => "Color",
            Self::Boolean => "Boolean",
            Self::EntityName => "EntityName",
            Self::EntityId => "EntityId",
            Self::EntityCode => "EntityCode",
            Self::Numeric => "Numeric",
            Self::Integer => "Integer",
            Self::Currency => "Currency",
            Self::Percentage => "Percentage",
            Self::DecimalPercentage => "DecimalPercentage",
            Self::RelativePercentage => "RelativePercentage",
            Self::PercentChangeOverTime => "PercentChangeOverTime",
            Self::Population => "Population",
            Self::PopulationDensity => "PopulationDensity",
            Self::Age => "Age",
            Self::Ratio => "Ratio",
            Self::NumberOfYears => "NumberOfYears",
            Self::Year => "Year",
            Self::Day => "Day",
            Self::Date => "Date",
            Self::Quarter => "Quarter",
        }
    }

    /// The kind this kind refines, or `None` for the two roots
    /// (`String` and `Numeric`).
    pub fn parent(&self) -> Option<ColumnKind> {
        match self {
            Self::String | Self::Numeric => None,
            Self::SeriesAnnotation | Self::Categorical | Self::Color | Self::EntityName => {
                Some(Self::String)
            }
            Self::EntityCode => Some(Self::String),
            Self::Region => Some(Self::Categorical),
            Self::Continent => Some(Self::Region),
            Self::Boolean => Some(Self::Categorical),
            Self::EntityId
            | Self::Integer
            | Self::Currency
            | Self::Percentage
            | Self::DecimalPercentage
            | Self::PopulationDensity
            | Self::Age
            | Self::Ratio
            | Self::NumberOfYears
            | Self::Quarter => Some(Self::Numeric),
            Self::RelativePercentage => Some(Self::Percentage),
            Self::PercentChangeOverTime => Some(Self::RelativePercentage),
            Self::Population => Some(Self::Integer),
            Self::Year | Self::Day => Some(Self::Integer),
            Self::Date => Some(Self::Day),
        }
    }

    /// True if `self` is `ancestor` or refines it (transitively).
    pub fn is_a(&self, ancestor: ColumnKind) -> bool {
        let mut current = Some(*self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// True for kinds whose values are numbers.
    pub fn is_numeric(&self) -> bool {
        self.is_a(Self::Numeric)
    }

    /// True for kinds whose values are times (years or days).
    pub fn is_time(&self) -> bool {
        matches!(self, Self::Year | Self::Day | Self::Date)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown column kind: {s}"))
    }
}
