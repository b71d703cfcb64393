use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WaterParseError;

/// A water amount in grams.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grams(pub f64);

impl Grams {
    pub const ZERO: Grams = Grams(0.0);

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Parses the authoring format `"<number>g"`, e.g. `"150g"` or `"42.5 g"`.
impl FromStr for Grams {
    type Err = WaterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = s
            .trim()
            .strip_suffix('g')
            .ok_or(WaterParseError::MissingUnit)?
            .trim();
        let value: f64 = number
            .parse()
            .map_err(|_| WaterParseError::NotANumber(number.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(WaterParseError::OutOfRange);
        }
        Ok(Grams(value))
    }
}

impl fmt::Display for Grams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}g", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_spaced_amounts() {
        assert_eq!("50g".parse::<Grams>(), Ok(Grams(50.0)));
        assert_eq!(" 42.5 g ".parse::<Grams>(), Ok(Grams(42.5)));
        assert_eq!("0g".parse::<Grams>(), Ok(Grams::ZERO));
    }

    #[test]
    fn rejects_missing_unit() {
        assert_eq!("50".parse::<Grams>(), Err(WaterParseError::MissingUnit));
        assert_eq!("50ml".parse::<Grams>(), Err(WaterParseError::MissingUnit));
    }

    #[test]
    fn rejects_garbage_and_negative() {
        assert!(matches!(
            "abcg".parse::<Grams>(),
            Err(WaterParseError::NotANumber(_))
        ));
        assert_eq!("-5g".parse::<Grams>(), Err(WaterParseError::OutOfRange));
        assert_eq!("infg".parse::<Grams>(), Err(WaterParseError::OutOfRange));
    }

    #[test]
    fn display_uses_authoring_format() {
        assert_eq!(Grams(150.0).to_string(), "150g");
    }
}
