use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ISO 4217 codes treated as fiat. Every other code is classified as crypto.
const FIAT_CODES: &[&str] = &[
    "AUD", "CAD", "CHF", "CNY", "DKK", "EUR", "GBP", "HKD", "ISK", "JPY", "NOK", "NZD", "PLN",
    "SEK", "SGD", "USD",
];

/// Currency code, normalised to upper case.
///
/// Ordering is alphabetical, which is what the rate resolver relies on when
/// it ranks candidate rates by destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid currency code '{0}'")]
pub struct InvalidCurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: &str) -> Result<Self, InvalidCurrencyCode> {
        let code = code.trim();
        let valid = (2..=10).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid {
            return Err(InvalidCurrencyCode(code.to_string()));
        }
        Ok(CurrencyCode(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Class implied by the code alone.
    pub fn class(&self) -> CurrencyClass {
        if FIAT_CODES.contains(&self.0.as_str()) {
            CurrencyClass::Fiat
        } else {
            CurrencyClass::Crypto
        }
    }

    pub fn sek() -> Self {
        CurrencyCode("SEK".to_string())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrencyCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurrencyClass {
    Fiat,
    Crypto,
}

impl fmt::Display for CurrencyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrencyClass::Fiat => f.write_str("Fiat"),
            CurrencyClass::Crypto => f.write_str("Crypto"),
        }
    }
}

/// An amount of a single currency. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyValue {
    amount: Decimal,
    code: CurrencyCode,
    class: CurrencyClass,
}

impl CurrencyValue {
    pub fn new(amount: Decimal, code: CurrencyCode, class: CurrencyClass) -> Self {
        CurrencyValue {
            amount,
            code,
            class,
        }
    }

    /// Value whose class is derived from the code.
    pub fn of(amount: Decimal, code: CurrencyCode) -> Self {
        let class = code.class();
        CurrencyValue::new(amount, code, class)
    }

    pub fn zero(code: CurrencyCode) -> Self {
        CurrencyValue::of(Decimal::ZERO, code)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn code(&self) -> &CurrencyCode {
        &self.code
    }

    pub fn class(&self) -> CurrencyClass {
        self.class
    }
}

impl fmt::Display for CurrencyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount.normalize(), self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    #[test]
    fn codes_are_normalised_to_upper_case() {
        assert_eq!(code(" btc ").as_str(), "BTC");
        assert_eq!(code("sek"), CurrencyCode::sek());
    }

    #[test]
    fn rejects_invalid_codes() {
        assert!(CurrencyCode::new("").is_err());
        assert!(CurrencyCode::new("U$D").is_err());
        assert!(CurrencyCode::new("X").is_err());
    }

    #[test]
    fn class_follows_fiat_list() {
        assert_eq!(code("USD").class(), CurrencyClass::Fiat);
        assert_eq!(code("EUR").class(), CurrencyClass::Fiat);
        assert_eq!(code("BTC").class(), CurrencyClass::Crypto);
        assert_eq!(code("DOGE").class(), CurrencyClass::Crypto);
    }

    #[test]
    fn codes_order_alphabetically() {
        let mut codes = vec![code("USD"), code("BTC"), code("EUR")];
        codes.sort();
        assert_eq!(codes, vec![code("BTC"), code("EUR"), code("USD")]);
    }

    #[test]
    fn value_display() {
        let value = CurrencyValue::of(dec!(1.50000000), code("BTC"));
        assert_eq!(value.to_string(), "1.5 BTC");
        assert_eq!(value.class(), CurrencyClass::Crypto);
    }
}
