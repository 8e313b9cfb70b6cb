//! Time-series alignment algorithms.

pub mod closest;
pub mod interpolate;
pub mod pairs;
pub mod rolling;

pub use closest::{
    TimeBound, find_closest_time, find_closest_time_index, sorted_find_closest,
    sorted_find_closest_index,
};
pub use interpolate::interpolate_row_values_with_tolerance;
pub use pairs::get_closest_time_pairs;
pub use rolling::{
    MAX_DENSE_SPAN, RollingAlign, compute_rolling_average, insert_missing_value_placeholders,
};
