//! Number formatting shared by the numeric column kinds.

use chartable_model::{FormatOptions, format_plain_number};

const PREFIX_UNITS: [&str; 3] = ["$", "£", "€"];

/// Insert `,` every three digits of an unsigned integer string.
pub fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn trim_trailing_zeros(text: &mut String) {
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
}

/// Format `value` with `options`, falling back to `default_places` decimals.
///
/// ```
/// use chartable_core::format::format_number;
/// use chartable_model::FormatOptions;
///
/// let options = FormatOptions::new().with_short_unit("$");
/// assert_eq!(format_number(-1234.5, &options, 2), "-$1,234.5");
/// ```
pub fn format_number(value: f64, options: &FormatOptions, default_places: u32) -> String {
    if !value.is_finite() {
        return format_plain_number(value);
    }
    let places = options.num_decimal_places.unwrap_or(default_places) as usize;
    let mut digits = format!("{:.*}", places, value.abs());
    if !options.keep_trailing_zeros {
        trim_trailing_zeros(&mut digits);
    }
    let is_zero = digits.chars().all(|ch| ch == '0' || ch == '.');

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits.as_str(), None),
    };
    let mut number = if options.no_grouping {
        int_part.to_string()
    } else {
        group_thousands(int_part)
    };
    if let Some(frac_part) = frac_part {
        number.push('.');
        number.push_str(frac_part);
    }

    let sign = if is_zero {
        ""
    } else if value < 0.0 {
        "-"
    } else if options.show_plus {
        "+"
    } else {
        ""
    };

    let short_unit = options
        .short_unit
        .as_deref()
        .filter(|_| options.use_short_unit);
    match (short_unit, options.unit.as_deref()) {
        (Some(unit), _) if PREFIX_UNITS.contains(&unit) => format!("{sign}{unit}{number}"),
        (Some(unit), _) => format!("{sign}{number}{unit}"),
        (None, Some(unit)) if !unit.is_empty() => format!("{sign}{number} {unit}"),
        _ => format!("{sign}{number}"),
    }
}
