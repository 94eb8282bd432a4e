use thiserror::Error;

/// Amounts are integer cents so running balances and totals add up exactly.
/// 1 unit = 100 cents, so 45.00 = 4500 cents.
pub type Cents = i64;

/// Largest accepted magnitude of a single amount: 100 billion units.
/// Running totals over fewer than 900,000 such amounts stay within `i64`.
pub const MAX_AMOUNT_CENTS: Cents = 10_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCentsError {
    #[error("empty amount")]
    Empty,
    #[error("invalid money format: {0}")]
    InvalidFormat(String),
    #[error("too many decimal places in {0} (at most 2)")]
    TooPrecise(String),
    #[error("amount {0} is out of range")]
    OutOfRange(String),
}

/// Format cents as a signed decimal string.
/// Example: 4500 -> "45.00", -7000 -> "-70.00"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a signed decimal string into cents.
/// Example: "-45" -> -4500, "12.5" -> 1250, ".05" -> 5
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseCentsError::Empty);
    }

    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let invalid = || ParseCentsError::InvalidFormat(trimmed.to_string());

    let (units_str, fraction_str) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if units_str.is_empty() && fraction_str.is_empty() {
        return Err(invalid());
    }
    if !units_str.chars().all(|c| c.is_ascii_digit())
        || !fraction_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    if fraction_str.len() > 2 {
        return Err(ParseCentsError::TooPrecise(trimmed.to_string()));
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| invalid())?
    };
    let fraction: i64 = match fraction_str.len() {
        0 => 0,
        1 => fraction_str.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction_str.parse().map_err(|_| invalid())?,
    };

    let out_of_range = || ParseCentsError::OutOfRange(trimmed.to_string());
    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or_else(out_of_range)?;
    if cents > MAX_AMOUNT_CENTS {
        return Err(out_of_range());
    }
    Ok(if negative { -cents } else { cents })
}
