//! Field validation and the text normalisation rules applied to submissions.

use crate::error::ValidationError;
use crate::models::{Submission, REQUIRED_FIELDS};

/// A form value counts as missing when empty or the literal `"0"`.
pub fn is_blank(value: Option<&str>) -> bool {
    matches!(value, None | Some("") | Some("0"))
}

/// Run the required-field and price-floor checks, in reporting order.
pub fn validate_submission(submission: &Submission, minimum_price: f64) -> Vec<ValidationError> {
    let mut errors: Vec<ValidationError> = REQUIRED_FIELDS
        .iter()
        .filter(|field| is_blank(submission.get(field)))
        .map(|&field| ValidationError::MissingField { field })
        .collect();

    if parse_price(submission.desired_price()) < minimum_price {
        errors.push(ValidationError::PriceBelowFloor {
            floor: minimum_price,
        });
    }

    errors
}

/// Parse the longest numeric prefix of `raw` as a float.
///
/// Leading whitespace is skipped; anything without a numeric prefix is `0.0`.
/// `"15000 USD"` is 15000, `"$15000"` is 0, `"1.2e4"` is 12000.
pub fn parse_price(raw: &str) -> f64 {
    let s = raw.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let bytes = s.as_bytes();
    let len = bytes.len();
    let digits_from = |mut i: usize| {
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if end < len && bytes[end] == b'.' {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }

    if mantissa_digits == 0 {
        return 0.0;
    }

    if end < len && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < len && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(0.0)
}

/// Round to a whole number and group thousands with commas (`12345.6` → `"12,346"`).
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = format!("{:.0}", value.abs().round());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3 + 1);
    for (i, c) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if value.round() < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Upper-case the first character (`artworkTitle` → `ArtworkTitle`).
pub fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Filename-safe artist segment: spaces become underscores, then anything
/// outside `[A-Za-z0-9_]` is dropped.
pub fn sanitize_artist_name(name: &str) -> String {
    name.replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Drop every character that cannot appear in an email address.
pub fn sanitize_email(email: &str) -> String {
    const ALLOWED: &str = "!#$%&'*+-=?^_`{|}~@.[]";
    email
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || ALLOWED.contains(*c))
        .collect()
}

/// Extension of the submitted filename, verbatim: the text after the last `.`
/// of the base name, or empty when there is none.
pub fn file_extension(filename: &str) -> &str {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match base.rfind('.') {
        Some(idx) => &base[idx + 1..],
        None => "",
    }
}

/// `{tracking_id}_{artist}_PRIMARY.{extension}`
pub fn primary_image_filename(tracking_id: &str, safe_artist: &str, extension: &str) -> String {
    format!("{}_{}_PRIMARY.{}", tracking_id, safe_artist, extension)
}
