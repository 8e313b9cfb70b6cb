//! One parse/format behavior record per [`ColumnKind`]. Refinements start
//! from the parent's record.

use chrono::{NaiveDate, TimeDelta};

use chartable_model::{
    CellValue, ColumnKind, ErrorValue, FormatOptions, Time, format_plain_number, slugs,
};

use crate::format::format_number;

/// Days are counted from this date.
pub fn day_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 21).unwrap_or_default()
}

/// Parse/format dispatch for one column kind.
#[derive(Debug, Clone, Copy)]
pub struct KindBehavior {
    pub kind: ColumnKind,
    pub is_numeric: bool,
    /// Convert a raw cell to a typed cell or a sentinel.
    pub parse: fn(&CellValue) -> CellValue,
    /// Render a parsed cell. Options are already merged with the defaults below.
    pub format: fn(&CellValue, &FormatOptions) -> String,
    pub decimal_places: u32,
    pub short_unit: Option<&'static str>,
    pub unit: Option<&'static str>,
    pub show_plus: bool,
}

impl KindBehavior {
    /// Parse a cell that may be absent from its row.
    pub fn parse_cell(&self, raw: Option<&CellValue>) -> CellValue {
        match raw {
            Some(cell) => (self.parse)(cell),
            None if self.is_numeric => ErrorValue::UndefinedButShouldBeNumber.into(),
            None => ErrorValue::UndefinedButShouldBeString.into(),
        }
    }

    /// Kind defaults layered under `options`.
    pub fn merge_options(&self, options: &FormatOptions) -> FormatOptions {
        let mut merged = options.clone();
        merged.num_decimal_places = merged.num_decimal_places.or(Some(self.decimal_places));
        if merged.short_unit.is_none() && merged.unit.is_none() {
            if let Some(short_unit) = self.short_unit {
                merged.short_unit = Some(short_unit.to_string());
                merged.use_short_unit = true;
            }
            merged.unit = self.unit.map(str::to_string);
        }
        merged.show_plus |= self.show_plus;
        merged
    }

    pub fn format_cell(&self, cell: &CellValue, options: &FormatOptions) -> String {
        (self.format)(cell, &self.merge_options(options))
    }
}

// Parsers

/// Numeric text: surrounding whitespace and thousands separators are ignored.
pub fn parse_numeric_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|ch| *ch != ',' && *ch != '\u{a0}')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    match cleaned.as_str() {
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        // `inf`/`nan` spellings are not numbers here
        other if other.chars().any(|ch| ch.is_ascii_alphabetic() && ch != 'e' && ch != 'E') => None,
        other => other.parse().ok(),
    }
}

fn parse_text(raw: &CellValue) -> CellValue {
    match raw {
        CellValue::Null => ErrorValue::NullButShouldBeString.into(),
        CellValue::Number(n) => CellValue::Text(format_plain_number(*n)),
        CellValue::Bool(b) => CellValue::Text(b.to_string()),
        CellValue::Text(_) | CellValue::Error(_) => raw.clone(),
    }
}

fn parse_numeric(raw: &CellValue) -> CellValue {
    let value = match raw {
        CellValue::Null => return ErrorValue::NullButShouldBeNumber.into(),
        CellValue::Error(_) => return raw.clone(),
        CellValue::Bool(_) => return ErrorValue::NotParseableAsNumber.into(),
        CellValue::Text(s) if s.trim().is_empty() => {
            return ErrorValue::BlankButShouldBeNumber.into();
        }
        CellValue::Text(s) => match parse_numeric_text(s) {
            Some(v) => v,
            None => return ErrorValue::NotParseableAsNumber.into(),
        },
        CellValue::Number(n) => *n,
    };
    if value.is_nan() {
        ErrorValue::NaNButShouldBeNumber.into()
    } else {
        CellValue::Number(value)
    }
}

fn parse_integer(raw: &CellValue) -> CellValue {
    match parse_numeric(raw) {
        CellValue::Number(n) => CellValue::Number(n.trunc()),
        other => other,
    }
}

fn parse_non_negative(raw: &CellValue) -> CellValue {
    match parse_numeric(raw) {
        CellValue::Number(n) if n < 0.0 => ErrorValue::InvalidNegativeValue.into(),
        other => other,
    }
}

fn parse_population(raw: &CellValue) -> CellValue {
    match parse_non_negative(raw) {
        CellValue::Number(n) => CellValue::Number(n.trunc()),
        other => other,
    }
}

/// Days since [`day_epoch`] for a `YYYY-MM-DD` string.
pub fn day_from_iso(text: &str) -> Option<Time> {
    let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()?;
    Some((date - day_epoch()).num_days())
}

/// The calendar date `days` after [`day_epoch`].
pub fn date_from_day(days: Time) -> Option<NaiveDate> {
    day_epoch().checked_add_signed(TimeDelta::try_days(days)?)
}

fn parse_day(raw: &CellValue) -> CellValue {
    match raw {
        CellValue::Text(s) => match day_from_iso(s) {
            Some(day) => CellValue::from(day),
            None => parse_integer(raw),
        },
        _ => parse_integer(raw),
    }
}

fn parse_quarter(raw: &CellValue) -> CellValue {
    match raw {
        CellValue::Text(s) => {
            let parsed = s.trim().split_once("-Q").and_then(|(year, quarter)| {
                let year: i64 = year.parse().ok()?;
                let quarter: i64 = quarter.parse().ok()?;
                (1..=4).contains(&quarter).then_some(year * 4 + quarter - 1)
            });
            match parsed {
                Some(value) => CellValue::from(value),
                None => ErrorValue::InvalidQuarterValue.into(),
            }
        }
        CellValue::Number(n) if n.fract() == 0.0 => raw.clone(),
        CellValue::Null | CellValue::Error(_) => parse_integer(raw),
        _ => ErrorValue::InvalidQuarterValue.into(),
    }
}

fn parse_boolean(raw: &CellValue) -> CellValue {
    match raw {
        CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => CellValue::Bool(true),
            "false" | "0" => CellValue::Bool(false),
            _ => raw.clone(),
        },
        CellValue::Number(n) if *n == 1.0 => CellValue::Bool(true),
        CellValue::Number(n) if *n == 0.0 => CellValue::Bool(false),
        CellValue::Bool(_) => raw.clone(),
        _ => parse_text(raw),
    }
}

// Formatters

fn format_text(cell: &CellValue, _: &FormatOptions) -> String {
    cell.to_plain_string()
}

fn format_numeric(cell: &CellValue, options: &FormatOptions) -> String {
    match cell {
        CellValue::Number(v) => format_number(*v, options, 0),
        other => other.to_plain_string(),
    }
}

fn format_decimal_percentage(cell: &CellValue, options: &FormatOptions) -> String {
    match cell {
        CellValue::Number(v) => format_number(v * 100.0, options, 0),
        other => other.to_plain_string(),
    }
}

fn format_year(cell: &CellValue, _: &FormatOptions) -> String {
    match cell {
        CellValue::Number(v) if *v < 0.0 => format!("{} BCE", format_plain_number(v.abs())),
        other => other.to_plain_string(),
    }
}

fn format_day(cell: &CellValue, _: &FormatOptions) -> String {
    match cell.as_number().and_then(|days| date_from_day(days as Time)) {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => cell.to_plain_string(),
    }
}

fn format_date(cell: &CellValue, _: &FormatOptions) -> String {
    match cell.as_number().and_then(|days| date_from_day(days as Time)) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => cell.to_plain_string(),
    }
}

fn format_quarter(cell: &CellValue, _: &FormatOptions) -> String {
    match cell.as_number() {
        Some(v) => {
            let v = v as i64;
            format!("{}-Q{}", v.div_euclid(4), v.rem_euclid(4) + 1)
        }
        None => cell.to_plain_string(),
    }
}

// Behavior records

const STRING: KindBehavior = KindBehavior {
    kind: ColumnKind::String,
    is_numeric: false,
    parse: parse_text,
    format: format_text,
    decimal_places: 0,
    short_unit: None,
    unit: None,
    show_plus: false,
};

const SERIES_ANNOTATION: KindBehavior = KindBehavior {
    kind: ColumnKind::SeriesAnnotation,
    ..STRING
};
const CATEGORICAL: KindBehavior = KindBehavior {
    kind: ColumnKind::Categorical,
    ..STRING
};
const REGION: KindBehavior = KindBehavior {
    kind: ColumnKind::Region,
    ..CATEGORICAL
};
const CONTINENT: KindBehavior = KindBehavior {
    kind: ColumnKind::Continent,
    ..REGION
};
const COLOR: KindBehavior = KindBehavior {
    kind: ColumnKind::Color,
    ..CATEGORICAL
};
const BOOLEAN: KindBehavior = KindBehavior {
    kind: ColumnKind::Boolean,
    parse: parse_boolean,
    ..CATEGORICAL
};
const ENTITY_NAME: KindBehavior = KindBehavior {
    kind: ColumnKind::EntityName,
    ..CATEGORICAL
};
const ENTITY_CODE: KindBehavior = KindBehavior {
    kind: ColumnKind::EntityCode,
    ..CATEGORICAL
};

const NUMERIC: KindBehavior = KindBehavior {
    kind: ColumnKind::Numeric,
    is_numeric: true,
    parse: parse_numeric,
    format: format_numeric,
    decimal_places: 2,
    ..STRING
};
const INTEGER: KindBehavior = KindBehavior {
    kind: ColumnKind::Integer,
    parse: parse_integer,
    decimal_places: 0,
    ..NUMERIC
};
const ENTITY_ID: KindBehavior = KindBehavior {
    kind: ColumnKind::EntityId,
    ..INTEGER
};
const CURRENCY: KindBehavior = KindBehavior {
    kind: ColumnKind::Currency,
    short_unit: Some("$"),
    ..NUMERIC
};
const PERCENTAGE: KindBehavior = KindBehavior {
    kind: ColumnKind::Percentage,
    short_unit: Some("%"),
    ..NUMERIC
};
const DECIMAL_PERCENTAGE: KindBehavior = KindBehavior {
    kind: ColumnKind::DecimalPercentage,
    format: format_decimal_percentage,
    ..PERCENTAGE
};
const RELATIVE_PERCENTAGE: KindBehavior = KindBehavior {
    kind: ColumnKind::RelativePercentage,
    show_plus: true,
    ..PERCENTAGE
};
const PERCENT_CHANGE_OVER_TIME: KindBehavior = KindBehavior {
    kind: ColumnKind::PercentChangeOverTime,
    ..RELATIVE_PERCENTAGE
};
const POPULATION: KindBehavior = KindBehavior {
    kind: ColumnKind::Population,
    parse: parse_population,
    ..INTEGER
};
const POPULATION_DENSITY: KindBehavior = KindBehavior {
    kind: ColumnKind::PopulationDensity,
    parse: parse_non_negative,
    decimal_places: 0,
    ..NUMERIC
};
const AGE: KindBehavior = KindBehavior {
    kind: ColumnKind::Age,
    unit: Some("years"),
    ..NUMERIC
};
const NUMBER_OF_YEARS: KindBehavior = KindBehavior {
    kind: ColumnKind::NumberOfYears,
    decimal_places: 1,
    ..AGE
};
const RATIO: KindBehavior = KindBehavior {
    kind: ColumnKind::Ratio,
    ..NUMERIC
};
const YEAR: KindBehavior = KindBehavior {
    kind: ColumnKind::Year,
    format: format_year,
    ..INTEGER
};
const DAY: KindBehavior = KindBehavior {
    kind: ColumnKind::Day,
    parse: parse_day,
    format: format_day,
    ..INTEGER
};
const DATE: KindBehavior = KindBehavior {
    kind: ColumnKind::Date,
    format: format_date,
    ..DAY
};
const QUARTER: KindBehavior = KindBehavior {
    kind: ColumnKind::Quarter,
    parse: parse_quarter,
    format: format_quarter,
    ..INTEGER
};

/// Behavior record for `kind`.
pub fn behavior(kind: ColumnKind) -> &'static KindBehavior {
    match kind {
        ColumnKind::String => &STRING,
        ColumnKind::SeriesAnnotation => &SERIES_ANNOTATION,
        ColumnKind::Categorical => &CATEGORICAL,
        ColumnKind::Region => &REGION,
        ColumnKind::Continent => &CONTINENT,
        ColumnKind::Color => &COLOR,
        ColumnKind::Boolean => &BOOLEAN,
        ColumnKind::EntityName => &ENTITY_NAME,
        ColumnKind::EntityId => &ENTITY_ID,
        ColumnKind::EntityCode => &ENTITY_CODE,
        ColumnKind::Numeric => &NUMERIC,
        ColumnKind::Integer => &INTEGER,
        ColumnKind::Currency => &CURRENCY,
        ColumnKind::Percentage => &PERCENTAGE,
        ColumnKind::DecimalPercentage => &DECIMAL_PERCENTAGE,
        ColumnKind::RelativePercentage => &RELATIVE_PERCENTAGE,
        ColumnKind::PercentChangeOverTime => &PERCENT_CHANGE_OVER_TIME,
        ColumnKind::Population => &POPULATION,
        ColumnKind::PopulationDensity => &POPULATION_DENSITY,
        ColumnKind::Age => &AGE,
        ColumnKind::Ratio => &RATIO,
        ColumnKind::NumberOfYears => &NUMBER_OF_YEARS,
        ColumnKind::Year => &YEAR,
        ColumnKind::Day => &DAY,
        ColumnKind::Date => &DATE,
        ColumnKind::Quarter => &QUARTER,
        _ => &STRING,
    }
}

/// Infer a kind for an undeclared column from its slug and first non-empty value.
pub fn detect_kind(slug: &str, sample: Option<&CellValue>) -> ColumnKind {
    match slug {
        slugs::ENTITY_NAME => return ColumnKind::EntityName,
        slugs::ENTITY_ID => return ColumnKind::EntityId,
        slugs::ENTITY_CODE => return ColumnKind::EntityCode,
        slugs::DAY => return ColumnKind::Day,
        slugs::YEAR => return ColumnKind::Year,
        slugs::DATE => return ColumnKind::Date,
        _ => {}
    }
    match sample {
        Some(CellValue::Number(_)) => ColumnKind::Numeric,
        Some(CellValue::Bool(_)) => ColumnKind::Boolean,
        Some(CellValue::Text(s)) if parse_numeric_text(s).is_some_and(f64::is_finite) => {
            ColumnKind::Numeric
        }
        _ => ColumnKind::String,
    }
}

/// First value worth inferring a kind from: not null, not a sentinel, not blank.
pub fn first_sample<'a, I>(cells: I) -> Option<&'a CellValue>
where
    I: IntoIterator<Item = Option<&'a CellValue>>,
{
    cells.into_iter().flatten().find(|cell| match cell {
        CellValue::Text(s) => !s.trim().is_empty(),
        other => other.is_real(),
    })
}
