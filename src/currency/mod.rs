//! Currency identifiers and the single conversion choke point.
//!
//! Every cross-currency amount in the engine is produced by
//! [`RateTable::convert`]; no caller hand-rolls conversion arithmetic.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, Result};

/// ISO 4217-like currency representation, normalized to uppercase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Builds a code without validation. Prefer [`CurrencyCode::parse`] at
    /// input boundaries.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Validates and normalizes a user-entered code: exactly three ASCII
    /// letters, stored uppercase.
    pub fn parse(code: &str) -> Result<Self> {
        let trimmed = code.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::Validation(format!(
                "`{}` is not a recognized currency code",
                code
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("USD")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static SYMBOLS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("USD", "$"),
        ("EUR", "€"),
        ("GBP", "£"),
        ("JPY", "¥"),
        ("CNY", "¥"),
        ("INR", "₹"),
        ("AUD", "A$"),
        ("CAD", "C$"),
        ("CHF", "CHF"),
        ("BRL", "R$"),
    ])
});

/// Plain symbol identifier for a code; falls back to the code itself.
/// Rendering is a collaborator concern, this is lookup only.
pub fn symbol_for(code: &str) -> &str {
    SYMBOLS.get(code).copied().unwrap_or(code)
}

/// Number of minor units carried by a currency.
pub fn minor_units_for(code: &str) -> u32 {
    match code {
        "JPY" | "KRW" => 0,
        "KWD" | "BHD" => 3,
        _ => 2,
    }
}

/// Injected, refreshable table of exchange rates keyed by currency pair.
///
/// The engine never fetches rates; an external collaborator replaces the
/// table whenever fresh quotes arrive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateTable {
    rates: HashMap<String, Decimal>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rate(&mut self, from: &CurrencyCode, to: &CurrencyCode, rate: Decimal) {
        self.rates.insert(pair_key(from, to), rate);
    }

    /// Swaps in a freshly fetched set of quotes, dropping stale pairs.
    pub fn replace_all(&mut self, rates: impl IntoIterator<Item = (CurrencyCode, CurrencyCode, Decimal)>) {
        self.rates.clear();
        for (from, to, rate) in rates {
            self.set_rate(&from, &to, rate);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Converts `amount` from one currency into another.
    ///
    /// Same-currency conversion is the exact identity. Otherwise the direct
    /// pair is used, falling back to the inverse pair when only the opposite
    /// direction was quoted. Unknown pairs fail with
    /// [`DomainError::RateUnavailable`]; the caller decides the fallback.
    pub fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<Decimal> {
        if from == to {
            return Ok(amount);
        }
        if let Some(rate) = self.rates.get(&pair_key(from, to)) {
            return Ok(amount * *rate);
        }
        if let Some(rate) = self.rates.get(&pair_key(to, from)) {
            if !rate.is_zero() {
                return Ok(amount / *rate);
            }
        }
        Err(DomainError::RateUnavailable {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

fn pair_key(from: &CurrencyCode, to: &CurrencyCode) -> String {
    format!("{}->{}", from.as_str(), to.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD")
    }

    fn eur() -> CurrencyCode {
        CurrencyCode::new("EUR")
    }

    #[test]
    fn parse_normalizes_and_rejects_garbage() {
        let code = CurrencyCode::parse(" eur ").expect("valid code");
        assert_eq!(code.as_str(), "EUR");
        assert!(CurrencyCode::parse("EU").is_err());
        assert!(CurrencyCode::parse("EUR1").is_err());
        assert!(CurrencyCode::parse("").is_err());
    }

    #[test]
    fn identity_conversion_is_exact() {
        let table = RateTable::new();
        let amount = Decimal::new(12345, 2);
        let out = table.convert(amount, &usd(), &usd()).expect("identity");
        assert_eq!(out, amount);
    }

    #[test]
    fn inverse_pair_is_used_when_direct_rate_missing() {
        let mut table = RateTable::new();
        table.set_rate(&eur(), &usd(), Decimal::new(125, 2));
        let out = table
            .convert(Decimal::new(125, 0), &usd(), &eur())
            .expect("inverse rate");
        assert_eq!(out, Decimal::new(100, 0));
    }

    #[test]
    fn unknown_pair_reports_rate_unavailable() {
        let table = RateTable::new();
        let err = table
            .convert(Decimal::ONE, &usd(), &eur())
            .expect_err("no rate");
        assert!(matches!(err, DomainError::RateUnavailable { .. }));
    }
}
