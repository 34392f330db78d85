use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "INR";

/// The number of minor units (paise, cents) in one major unit of currency.
const MINOR_PER_MAJOR: i64 = 100;

//--------------------------------------     MinorUnits       --------------------------------------------------------
/// A monetary amount expressed in the gateway's minor unit (paise for INR, cents for USD).
///
/// The payment gateway only ever sees integer minor units. The conversion from a major-unit decimal amount happens
/// exactly once, in [`MinorUnits::from_major`], so that 499.50 always becomes 49950 and never 49949.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct MinorUnits(i64);

op!(binary MinorUnits, Add, add);
op!(binary MinorUnits, Sub, sub);
op!(inplace MinorUnits, SubAssign, sub_assign);
op!(unary MinorUnits, Neg, neg);

impl Mul<i64> for MinorUnits {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for MinorUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in minor units: {0}")]
pub struct MinorUnitsConversionError(String);

impl From<i64> for MinorUnits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for MinorUnits {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for MinorUnits {}

impl TryFrom<u64> for MinorUnits {
    type Error = MinorUnitsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MinorUnitsConversionError(format!("Value {} is too large to convert to MinorUnits", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // the sign is carried separately; -50 must read "-0.50", and the integer division would lose it
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let major = magnitude / MINOR_PER_MAJOR as u64;
        let minor = magnitude % MINOR_PER_MAJOR as u64;
        write!(f, "{sign}{major}.{minor:02}")
    }
}

impl MinorUnits {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Convert a major-unit decimal amount (e.g. 499.50) into minor units (49950). Rounds to the nearest minor unit,
    /// so amounts with at most two decimal places round-trip losslessly.
    pub fn from_major(amount: f64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        Self((amount * MINOR_PER_MAJOR as f64).round() as i64)
    }

    pub fn as_major(&self) -> f64 {
        self.0 as f64 / MINOR_PER_MAJOR as f64
    }
}
