//! Well-known column slugs.

pub const ENTITY_NAME: &str = "entityName";
pub const ENTITY_ID: &str = "entityId";
pub const ENTITY_CODE: &str = "entityCode";
pub const YEAR: &str = "year";
pub const DAY: &str = "day";
pub const DATE: &str = "date";
pub const TIME: &str = "time";

/// Slugs recognised as the time column, in order of preference.
pub const TIME_SLUGS: [&str; 4] = [DAY, YEAR, DATE, TIME];

/// Slug of the column recording where interpolated values originated.
pub fn original_time_slug(slug: &str) -> String {
    format!("{slug}-originalTime")
}
