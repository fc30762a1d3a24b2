//! Currency amounts
//!
//! Amounts are exact decimals tagged with an ISO currency code. Adding two
//! amounts in different currencies is an error; there is no exchange rate
//! handling.

use fundweb_config::{CurrencyConfig, SymbolPosition};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurrencyError {
    #[error("Invalid currency amount: '{input}'")]
    InvalidAmount { input: String },

    #[error("Currency mismatch: cannot combine {left} with {right}")]
    Mismatch { left: String, right: String },

    #[error("Negative amount not allowed here: {amount}")]
    Negative { amount: String },

    #[error("Amount overflow: {left} + {right} is out of range")]
    Overflow { left: String, right: String },
}

/// An exact amount of money in one currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    value: Decimal,
    code: String,
}

impl Currency {
    pub fn new(value: Decimal, code: impl Into<String>) -> Self {
        Self {
            value,
            code: code.into().to_uppercase(),
        }
    }

    pub fn zero(code: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, code)
    }

    /// Parse `"50"`, `"50.00 USD"`, `"$50.00"` or `"$50.00 USD"`.
    ///
    /// Input without a code is taken to be in `default_code`.
    pub fn parse(input: &str, default_code: &str) -> Result<Self, CurrencyError> {
        let invalid = || CurrencyError::InvalidAmount {
            input: input.to_string(),
        };

        let mut parts = input.split_whitespace();
        let amount = parts.next().ok_or_else(invalid)?;
        let code = parts.next().unwrap_or(default_code);
        if parts.next().is_some() || code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let (negative, amount) = match amount.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, amount),
        };
        let amount = amount.strip_prefix('$').unwrap_or(amount).replace(',', "");
        let mut value = Decimal::from_str(&amount).map_err(|_| invalid())?;
        if negative {
            value.set_sign_negative(true);
        }

        Ok(Self::new(value, code))
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_zero()
    }

    /// Sum of two amounts in the same currency
    pub fn add(&self, other: &Currency) -> Result<Currency, CurrencyError> {
        if self.code != other.code {
            return Err(CurrencyError::Mismatch {
                left: self.code.clone(),
                right: other.code.clone(),
            });
        }
        let value = self
            .value
            .checked_add(other.value)
            .ok_or_else(|| CurrencyError::Overflow {
                left: self.to_string(),
                right: other.to_string(),
            })?;
        Ok(Currency::new(value, self.code.clone()))
    }

    /// Convert into `target_code`, failing when the codes differ
    pub fn convert_to(&self, target_code: &str) -> Result<Currency, CurrencyError> {
        if !self.code.eq_ignore_ascii_case(target_code) {
            return Err(CurrencyError::Mismatch {
                left: self.code.clone(),
                right: target_code.to_uppercase(),
            });
        }
        Ok(self.clone())
    }

    /// Human readable form, e.g. `$1,250.00 USD`
    pub fn format(&self, config: &CurrencyConfig) -> String {
        let places = config.decimal_places as usize;
        let rounded = self.value.abs().round_dp(config.decimal_places);
        let plain = format!("{:.*}", places, rounded);
        let (int_part, frac_part) = match plain.split_once('.') {
            Some((i, f)) => (i.to_string(), Some(f.to_string())),
            None => (plain.clone(), None),
        };

        let mut number = fundweb_utils::format_number(int_part, &config.thousands_separator);
        if let Some(frac) = frac_part {
            number.push_str(&config.decimal_separator);
            number.push_str(&frac);
        }

        let sign = if self.is_negative() { "-" } else { "" };
        match config.symbol_position {
            SymbolPosition::Before => format!("{}{}{} {}", sign, config.symbol, number, self.code),
            SymbolPosition::After => format!("{}{}{} {}", sign, number, config.symbol, self.code),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.code)
    }
}
