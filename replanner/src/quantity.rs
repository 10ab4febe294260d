/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Resource quantity parsing.
//!
//! Snapshots express CPU and memory the way cluster manifests do:
//!
//! | Text       | Milli-value        |
//! |------------|--------------------|
//! | `"250m"`   | 250                |
//! | `"2"`      | 2 000              |
//! | `"1.5"`    | 1 500              |
//! | `"1Ki"`    | 1 024 000          |
//! | `"2G"`     | 2 000 000 000 000  |
//! | `"1e3"`    | 1 000 000          |
//!
//! Fractions that do not land on a whole milli-unit are rounded up.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid number in quantity '{0}'")]
    InvalidNumber(String),

    #[error("unknown suffix '{suffix}' in quantity '{text}'")]
    UnknownSuffix { text: String, suffix: String },

    #[error("quantity '{0}' is out of range")]
    OutOfRange(String),
}

/// A resource amount stored as an integer number of milli-units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "RawQuantity", into = "String")]
pub struct Quantity {
    milli: i64,
}

impl Quantity {
    pub const fn from_milli(milli: i64) -> Self {
        Self { milli }
    }

    pub const fn from_units(units: i64) -> Self {
        Self {
            milli: units.saturating_mul(1000),
        }
    }

    pub fn milli_value(self) -> i64 {
        self.milli
    }

    /// Whole units, truncated toward zero.
    pub fn value(self) -> i64 {
        self.milli / 1000
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.milli % 1000 == 0 {
            write!(f, "{}", self.milli / 1000)
        } else {
            write!(f, "{}m", self.milli)
        }
    }
}

impl From<Quantity> for String {
    fn from(q: Quantity) -> Self {
        q.to_string()
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let s = text.trim();
        if s.is_empty() {
            return Err(QuantityError::Empty);
        }

        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(split);

        let (negative, digits, frac_len) = parse_decimal(number)
            .ok_or_else(|| QuantityError::InvalidNumber(text.to_string()))?;

        let (num, den) = multiplier(suffix).ok_or_else(|| QuantityError::UnknownSuffix {
            text: text.to_string(),
            suffix: suffix.to_string(),
        })?;

        let out_of_range = || QuantityError::OutOfRange(text.to_string());

        // milli = ceil(digits * num * 1000 / (10^frac_len * den))
        let numerator = digits
            .checked_mul(num)
            .and_then(|v| v.checked_mul(1000))
            .ok_or_else(out_of_range)?;
        let denominator = 10i128
            .checked_pow(frac_len)
            .and_then(|v| v.checked_mul(den))
            .ok_or_else(out_of_range)?;
        // Ceiling of a negative value truncates toward zero.
        let milli = if negative {
            -(numerator / denominator)
        } else {
            numerator
                .checked_add(denominator - 1)
                .ok_or_else(out_of_range)?
                / denominator
        };
        let milli = i64::try_from(milli).map_err(|_| out_of_range())?;
        Ok(Self { milli })
    }
}

/// Splits `"[+-]123.45"` into `(negative, 12345, 2)`.
fn parse_decimal(number: &str) -> Option<(bool, i128, u32)> {
    let (negative, body) = match number.as_bytes().first() {
        Some(b'-') => (true, &number[1..]),
        Some(b'+') => (false, &number[1..]),
        _ => (false, number),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut digits: i128 = 0;
    for b in int_part.bytes().chain(frac_part.bytes()) {
        digits = digits.checked_mul(10)?.checked_add(i128::from(b - b'0'))?;
    }
    Some((negative, digits, frac_part.len() as u32))
}

/// Returns the suffix as a `num / den` ratio.
fn multiplier(suffix: &str) -> Option<(i128, i128)> {
    let ratio = match suffix {
        "" => (1, 1),
        "m" => (1, 1000),
        "k" => (1_000, 1),
        "M" => (1_000_000, 1),
        "G" => (1_000_000_000, 1),
        "T" => (1_000_000_000_000, 1),
        "P" => (1_000_000_000_000_000, 1),
        "E" => (1_000_000_000_000_000_000, 1),
        "Ki" => (1 << 10, 1),
        "Mi" => (1 << 20, 1),
        "Gi" => (1 << 30, 1),
        "Ti" => (1 << 40, 1),
        "Pi" => (1 << 50, 1),
        "Ei" => (1 << 60, 1),
        _ => {
            let exp = suffix.strip_prefix(['e', 'E'])?.parse::<i32>().ok()?;
            let scale = 10i128.checked_pow(exp.unsigned_abs())?;
            if exp >= 0 {
                (scale, 1)
            } else {
                (1, scale)
            }
        }
    };
    Some(ratio)
}

// ── Serde ─────────────────────────────────────────────────────────────────────

/// YAML writers emit `cpu: 2` as an integer and `cpu: "500m"` as a string;
/// both must load.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Int(i64),
    Float(f64),
    Text(String),
}

impl TryFrom<RawQuantity> for Quantity {
    type Error = QuantityError;

    fn try_from(raw: RawQuantity) -> Result<Self, Self::Error> {
        match raw {
            RawQuantity::Int(v) => v
                .checked_mul(1000)
                .map(Quantity::from_milli)
                .ok_or_else(|| QuantityError::OutOfRange(v.to_string())),
            RawQuantity::Float(v) => v.to_string().parse(),
            RawQuantity::Text(s) => s.parse(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
