//! Phone number normalization for chat ingestion.

/// Minimum digit count for a number to be looked up or stored.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Normalize a phone number to `+` followed by its digits.
///
/// Returns `None` when fewer than [`MIN_PHONE_DIGITS`] digits remain, so
/// callers can skip the number instead of failing the whole batch.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < MIN_PHONE_DIGITS {
        return None;
    }
    Some(format!("+{}", digits))
}
