//! Transform expression parsing.
//!
//! An expression is a transform name followed by whitespace-separated
//! arguments, e.g. `rollingAverage day entityName cases 7`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use chartable_model::{Result, TableError};

use crate::condition::Condition;

/// Transforms understood by [`apply_transform`](crate::apply_transform).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformName {
    /// `divideBy numeratorSlug denominatorSlug`
    DivideBy,
    /// `multiplyBy columnSlug factor`; the factor is a number or a slug.
    MultiplyBy,
    /// `subtract columnSlug subtrahendSlug`
    Subtract,
    /// `percentChange timeSlug entitySlug columnSlug windowSize`
    PercentChange,
    /// `rollingAverage timeSlug entitySlug columnSlug windowSize`
    RollingAverage,
    /// `asPercentageOf numeratorSlug denominatorSlug`
    AsPercentageOf,
    /// `where columnSlug conditionSlug operator operand...`
    Where,
    /// `timeSinceEntityExceededThreshold timeSlug entitySlug columnSlug threshold`
    TimeSinceEntityExceededThreshold,
    /// `duplicate columnSlug`
    Duplicate,
    /// `cumulativeSum entitySlug columnSlug`
    CumulativeSum,
}

impl TransformName {
    pub const ALL: [TransformName; 10] = [
        TransformName::DivideBy,
        TransformName::MultiplyBy,
        TransformName::Subtract,
        TransformName::PercentChange,
        TransformName::RollingAverage,
        TransformName::AsPercentageOf,
        TransformName::Where,
        TransformName::TimeSinceEntityExceededThreshold,
        TransformName::Duplicate,
        TransformName::CumulativeSum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformName::DivideBy => "divideBy",
            TransformName::MultiplyBy => "multiplyBy",
            TransformName::Subtract => "subtract",
            TransformName::PercentChange => "percentChange",
            TransformName::RollingAverage => "rollingAverage",
            TransformName::AsPercentageOf => "asPercentageOf",
            TransformName::Where => "where",
            TransformName::TimeSinceEntityExceededThreshold => "timeSinceEntityExceededThreshold",
            TransformName::Duplicate => "duplicate",
            TransformName::CumulativeSum => "cumulativeSum",
        }
    }

    /// Minimum and maximum argument counts. `None` means unbounded.
    fn arity(&self) -> (usize, Option<usize>) {
        match self {
            TransformName::DivideBy
            | TransformName::MultiplyBy
            | TransformName::Subtract
            | TransformName::AsPercentageOf
            | TransformName::CumulativeSum => (2, Some(2)),
            TransformName::PercentChange
            | TransformName::RollingAverage
            | TransformName::TimeSinceEntityExceededThreshold => (4, Some(4)),
            TransformName::Where => (4, None),
            TransformName::Duplicate => (1, Some(1)),
        }
    }
}

impl fmt::Display for TransformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformName {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        TransformName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| TableError::UnknownTransform {
                name: s.to_string(),
            })
    }
}

/// A transform expression whose argument count has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformExpression {
    name: TransformName,
    args: Vec<String>,
}

impl TransformExpression {
    /// Parse `name arg1 arg2 ...`, checking the argument count for the name.
    ///
    /// ```
    /// use chartable_transform::{TransformExpression, TransformName};
    ///
    /// let expr = TransformExpression::parse("divideBy deaths population").unwrap();
    /// assert_eq!(expr.name(), TransformName::DivideBy);
    /// assert_eq!(expr.args(), ["deaths", "population"]);
    /// ```
    pub fn parse(expression: &str) -> Result<Self> {
        let mut words = expression.split_whitespace();
        let Some(first) = words.next() else {
            return Err(TableError::InvalidTransform {
                expression: expression.to_string(),
                message: "empty expression".to_string(),
            });
        };
        let name: TransformName = first.parse()?;
        Self::checked(name, words.map(str::to_string).collect(), expression)
    }

    /// Build an expression from a name and arguments, with the same checks as
    /// [`parse`](Self::parse).
    pub fn new(name: TransformName, args: Vec<String>) -> Result<Self> {
        let expression = Self {
            name,
            args: args.clone(),
        }
        .to_string();
        Self::checked(name, args, &expression)
    }

    fn checked(name: TransformName, args: Vec<String>, expression: &str) -> Result<Self> {
        let (min, max) = name.arity();
        if args.len() < min || max.is_some_and(|max| args.len() > max) {
            let expected = match max {
                Some(max) if max == min => format!("{min}"),
                Some(max) => format!("{min} to {max}"),
                None => format!("at least {min}"),
            };
            return Err(TableError::InvalidTransform {
                expression: expression.to_string(),
                message: format!("{name} takes {expected} arguments, got {}", args.len()),
            });
        }
        let parsed = Self { name, args };
        parsed.check_literals(expression)?;
        Ok(parsed)
    }

    pub fn name(&self) -> TransformName {
        self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Reject literal arguments (window sizes, thresholds, conditions) that
    /// can never evaluate.
    fn check_literals(&self, expression: &str) -> Result<()> {
        let invalid = |message: String| TableError::InvalidTransform {
            expression: expression.to_string(),
            message,
        };
        match self.name {
            TransformName::PercentChange | TransformName::RollingAverage => {
                let raw = &self.args[3];
                raw.parse::<usize>().map_err(|_| {
                    invalid(format!("window size `{raw}` is not a non-negative integer"))
                })?;
            }
            TransformName::TimeSinceEntityExceededThreshold => {
                let raw = &self.args[3];
                raw.parse::<f64>()
                    .map_err(|_| invalid(format!("threshold `{raw}` is not a number")))?;
            }
            TransformName::Where => {
                Condition::parse(expression, &self.args[2], &self.args[3..])?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Column slugs this expression reads.
    ///
    /// A `multiplyBy` factor that parses as a number is a literal, not a slug.
    /// The operand of `where` is always a literal.
    pub fn referenced_slugs(&self) -> Vec<&str> {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        match self.name {
            TransformName::MultiplyBy => {
                let mut slugs = vec![args[0]];
                if args[1].parse::<f64>().is_err() {
                    slugs.push(args[1]);
                }
                slugs
            }
            TransformName::PercentChange
            | TransformName::RollingAverage
            | TransformName::TimeSinceEntityExceededThreshold => args[..3].to_vec(),
            TransformName::Where => args[..2].to_vec(),
            _ => args,
        }
    }
}

impl FromStr for TransformExpression {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TransformExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_any_whitespace() {
        let expr = TransformExpression::parse("  rollingAverage\tday  entityName cases 7 ").unwrap();
        assert_eq!(expr.name(), TransformName::RollingAverage);
        assert_eq!(expr.args(), ["day", "entityName", "cases", "7"]);
        assert_eq!(expr.to_string(), "rollingAverage day entityName cases 7");
    }

    #[test]
    fn test_unknown_name_is_a_fault() {
        let err = TransformExpression::parse("explode a b").unwrap_err();
        assert!(matches!(err, TableError::UnknownTransform { name } if name == "explode"));
    }

    #[test]
    fn test_wrong_arity_is_a_fault() {
        let err = TransformExpression::parse("divideBy a").unwrap_err();
        assert!(matches!(err, TableError::InvalidTransform { .. }));
        assert!(TransformExpression::parse("").is_err());
        assert!(TransformExpression::parse("where a b isGreaterThan").is_err());
        assert!(TransformExpression::parse("rollingAverage day entityName cases seven").is_err());
        assert!(TransformExpression::parse("where a b isGreaterThan ten").is_err());
    }

    #[test]
    fn test_new_checks_arity_like_parse() {
        let err = TransformExpression::new(TransformName::DivideBy, Vec::new()).unwrap_err();
        assert!(matches!(err, TableError::InvalidTransform { .. }));
        assert!(TransformExpression::new(TransformName::RollingAverage, vec!["day".into()]).is_err());
        let expr =
            TransformExpression::new(TransformName::Duplicate, vec!["cases".to_string()]).unwrap();
        assert_eq!(expr, TransformExpression::parse("duplicate cases").unwrap());
    }

    #[test]
    fn test_referenced_slugs() {
        let slugs = |s: &str| {
            TransformExpression::parse(s)
                .unwrap()
                .referenced_slugs()
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>()
        };
        assert_eq!(slugs("multiplyBy gdp 1000"), ["gdp"]);
        assert_eq!(slugs("multiplyBy gdp factor"), ["gdp", "factor"]);
        assert_eq!(slugs("percentChange day entityName cases 7"), ["day", "entityName", "cases"]);
        assert_eq!(slugs("where gdp year isGreaterThan 2000"), ["gdp", "year"]);
        assert_eq!(slugs("cumulativeSum entityName cases"), ["entityName", "cases"]);
    }

    #[test]
    fn test_names_round_trip() {
        for name in TransformName::ALL {
            assert_eq!(name.as_str().parse::<TransformName>().unwrap(), name);
        }
    }
}
