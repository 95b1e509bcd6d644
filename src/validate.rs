//! Draft validation and normalization.

use thiserror::Error;

use crate::{
    hike::{HikeDraft, HikeFields, non_blank},
    types::Coords,
};

/// Reason a draft was rejected, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Name is blank.
    #[error("Name is required")]
    MissingName,
    /// Location is blank.
    #[error("Location is required")]
    MissingLocation,
    /// Date is blank.
    #[error("Date & time is required")]
    MissingDate,
    /// Length is blank.
    #[error("Length (km) is required")]
    MissingLength,
    /// Length is not a finite, non-negative number.
    #[error("Length must be a number")]
    InvalidLength,
}

/// Checks required fields in order, stopping at the first failure.
pub fn validate(draft: &HikeDraft) -> Result<(), ValidationError> {
    normalize(draft, None).map(|_| ())
}

/// Validates `draft` and returns trimmed fields with the parsed length.
pub fn normalize(draft: &HikeDraft, coords: Option<Coords>) -> Result<HikeFields, ValidationError> {
    let name = non_blank(&draft.name).ok_or(ValidationError::MissingName)?;
    let location = non_blank(&draft.location).ok_or(ValidationError::MissingLocation)?;
    let date = non_blank(&draft.date).ok_or(ValidationError::MissingDate)?;
    let length_text = non_blank(&draft.length_km).ok_or(ValidationError::MissingLength)?;
    let length_km = parse_length(&length_text)?;

    Ok(HikeFields {
        name,
        location,
        date,
        length_km,
        difficulty: non_blank(&draft.difficulty),
        description: non_blank(&draft.description),
        coords,
    })
}

/// Parses the longest numeric prefix of the trimmed length text, so `"5 km"`
/// reads as 5. The value must be finite and non-negative.
pub fn parse_length(text: &str) -> Result<f64, ValidationError> {
    let trimmed = text.trim();
    let value: f64 = trimmed[..numeric_prefix_len(trimmed)]
        .parse()
        .map_err(|_| ValidationError::InvalidLength)?;
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidLength);
    }
    Ok(value)
}

/// Byte length of the leading `[+-]digits[.digits][e[+-]digits]` run.
///
/// Zero when no mantissa digit is present.
fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 {
            mantissa_digits += frac_end - (end + 1);
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    end
}
