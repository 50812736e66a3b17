// src/config/duration.rs

use std::time::Duration;

/// A duration string with an optional leading minus sign.
///
/// Negative values are representable so validation can reject them with a
/// precise error instead of a generic parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedDuration {
    pub negative: bool,
    pub magnitude: Duration,
}

impl SignedDuration {
    /// `Some` for zero or positive values.
    pub fn non_negative(self) -> Option<Duration> {
        if self.negative && !self.magnitude.is_zero() {
            None
        } else {
            Some(self.magnitude)
        }
    }
}

/// Parse strings like `"100ms"`, `"-5us"`, `"2s"`, `"1m"`.
///
/// Supported units: `ns`, `us`, `ms`, `s`, `m`.
pub fn parse_duration(s: &str) -> Result<SignedDuration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let idx = rest
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = rest.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;

    let magnitude = match unit_part.trim().to_lowercase().as_str() {
        "ns" => Duration::from_nanos(value),
        "us" => Duration::from_micros(value),
        "ms" => Duration::from_millis(value),
        "s" => Duration::from_secs(value),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration '{s}' overflows"))?,
        other => {
            return Err(format!(
                "unsupported duration unit '{other}'; expected ns, us, ms, s or m"
            ));
        }
    };

    Ok(SignedDuration {
        negative,
        magnitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_unit() {
        let d = |s| parse_duration(s).unwrap().magnitude;
        assert_eq!(d("7ns"), Duration::from_nanos(7));
        assert_eq!(d("7us"), Duration::from_micros(7));
        assert_eq!(d("250ms"), Duration::from_millis(250));
        assert_eq!(d("3s"), Duration::from_secs(3));
        assert_eq!(d("2m"), Duration::from_secs(120));
        assert_eq!(d(" 10 MS "), Duration::from_millis(10));
    }

    #[test]
    fn keeps_the_sign() {
        let d = parse_duration("-5ms").unwrap();
        assert!(d.negative);
        assert_eq!(d.non_negative(), None);
        assert_eq!(parse_duration("-0ms").unwrap().non_negative(), Some(Duration::ZERO));
        assert!(!parse_duration("+5ms").unwrap().negative);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("100").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("5h").is_err());
        assert!(parse_duration("1.5s").is_err());
    }
}
