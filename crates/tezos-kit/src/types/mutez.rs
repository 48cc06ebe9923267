//! Tez amounts with mutez precision.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseAmountError;

/// Number of mutez in one tez.
pub const MUTEZ_PER_TEZ: u64 = 1_000_000;

/// A tez amount in mutez (10⁻⁶ tez).
///
/// The node serializes amounts as decimal strings; this type follows that
/// convention in its serde implementations.
///
/// # Example
///
/// ```
/// use tezos_kit::Mutez;
///
/// let amount: Mutez = "5 tez".parse().unwrap();
/// assert_eq!(amount.as_mutez(), 5_000_000);
///
/// let fee: Mutez = "1420 mutez".parse().unwrap();
/// assert_eq!(fee.as_mutez(), 1420);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mutez(u64);

impl Mutez {
    /// Zero mutez.
    pub const ZERO: Mutez = Mutez(0);

    /// Create an amount from mutez.
    pub const fn from_mutez(mutez: u64) -> Self {
        Self(mutez)
    }

    /// Create an amount from whole tez.
    pub const fn from_tez(tez: u64) -> Self {
        Self(tez * MUTEZ_PER_TEZ)
    }

    /// The amount in mutez.
    pub const fn as_mutez(&self) -> u64 {
        self.0
    }

    /// Checked addition, for summing fees and batch totals.
    pub const fn checked_add(self, rhs: Mutez) -> Option<Mutez> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Mutez(v)),
            None => None,
        }
    }
}

impl Display for Mutez {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tez = self.0 / MUTEZ_PER_TEZ;
        let rem = self.0 % MUTEZ_PER_TEZ;
        if rem == 0 {
            write!(f, "{} tez", tez)
        } else {
            let frac = format!("{:06}", rem);
            write!(f, "{}.{} tez", tez, frac.trim_end_matches('0'))
        }
    }
}

impl FromStr for Mutez {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (number, unit) = match s.split_once(char::is_whitespace) {
            Some((n, u)) => (n.trim(), u.trim()),
            // Bare numbers are rejected: "5" could plausibly mean either
            // 5 tez or 5 mutez.
            None => return Err(ParseAmountError::AmbiguousAmount(s.to_string())),
        };

        match unit {
            "mutez" => {
                if number.contains('.') {
                    return Err(ParseAmountError::InvalidFormat(s.to_string()));
                }
                let value: u64 = number
                    .parse()
                    .map_err(|_| ParseAmountError::InvalidNumber(number.to_string()))?;
                Ok(Mutez(value))
            }
            "tez" | "xtz" | "XTZ" => {
                let (whole, frac) = match number.split_once('.') {
                    Some((w, f)) => (w, f),
                    None => (number, ""),
                };
                if frac.len() > 6 || !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ParseAmountError::InvalidFormat(s.to_string()));
                }
                let whole: u64 = if whole.is_empty() {
                    0
                } else {
                    whole
                        .parse()
                        .map_err(|_| ParseAmountError::InvalidNumber(number.to_string()))?
                };
                let frac_mutez: u64 = if frac.is_empty() {
                    0
                } else {
                    format!("{:0<6}", frac)
                        .parse()
                        .map_err(|_| ParseAmountError::InvalidNumber(number.to_string()))?
                };
                whole
                    .checked_mul(MUTEZ_PER_TEZ)
                    .and_then(|m| m.checked_add(frac_mutez))
                    .map(Mutez)
                    .ok_or(ParseAmountError::Overflow)
            }
            _ => Err(ParseAmountError::InvalidFormat(s.to_string())),
        }
    }
}

impl Serialize for Mutez {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Mutez {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s: String = serde::Deserialize::deserialize(d)?;
        s.parse::<u64>().map(Mutez).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tez() {
        assert_eq!("5 tez".parse::<Mutez>().unwrap(), Mutez::from_tez(5));
        assert_eq!(
            "0.5 tez".parse::<Mutez>().unwrap(),
            Mutez::from_mutez(500_000)
        );
        assert_eq!(
            "1.000001 tez".parse::<Mutez>().unwrap(),
            Mutez::from_mutez(1_000_001)
        );
    }

    #[test]
    fn test_parse_mutez() {
        assert_eq!("1420 mutez".parse::<Mutez>().unwrap(), Mutez::from_mutez(1420));
    }

    #[test]
    fn test_parse_ambiguous() {
        assert_eq!(
            "5".parse::<Mutez>().unwrap_err(),
            ParseAmountError::AmbiguousAmount("5".to_string())
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            "1.5 mutez".parse::<Mutez>(),
            Err(ParseAmountError::InvalidFormat(_))
        ));
        assert!(matches!(
            "abc tez".parse::<Mutez>(),
            Err(ParseAmountError::InvalidNumber(_))
        ));
        assert!(matches!(
            "0.1234567 tez".parse::<Mutez>(),
            Err(ParseAmountError::InvalidFormat(_))
        ));
        assert!(matches!(
            "5 doge".parse::<Mutez>(),
            Err(ParseAmountError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_overflow() {
        assert_eq!(
            "99999999999999999 tez".parse::<Mutez>().unwrap_err(),
            ParseAmountError::Overflow
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Mutez::from_tez(3).to_string(), "3 tez");
        assert_eq!(Mutez::from_mutez(1_500_000).to_string(), "1.5 tez");
        assert_eq!(Mutez::from_mutez(1420).to_string(), "0.00142 tez");
    }

    #[test]
    fn test_serde_string_convention() {
        let json = serde_json::to_string(&Mutez::from_mutez(1420)).unwrap();
        assert_eq!(json, "\"1420\"");

        let back: Mutez = serde_json::from_str("\"250000\"").unwrap();
        assert_eq!(back, Mutez::from_mutez(250_000));
    }

    #[test]
    fn test_checked_add() {
        assert_eq!(
            Mutez::from_mutez(1).checked_add(Mutez::from_mutez(2)),
            Some(Mutez::from_mutez(3))
        );
        assert_eq!(Mutez(u64::MAX).checked_add(Mutez(1)), None);
    }
}
