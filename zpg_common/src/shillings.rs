use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const TZS_CURRENCY_CODE: &str = "TZS";

//--------------------------------------     Shillings       ---------------------------------------------------------
/// An amount of Tanzanian shillings. Mobile-money amounts are whole shillings, so there is no minor unit.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Shillings(i64);

op!(binary Shillings, Add, add);
op!(binary Shillings, Sub, sub);
op!(inplace Shillings, AddAssign, add_assign);
op!(inplace Shillings, SubAssign, sub_assign);
op!(unary Shillings, Neg, neg);

impl Mul<i64> for Shillings {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Shillings {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in shillings: {0}")]
pub struct ShillingsConversionError(String);

impl From<i64> for Shillings {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Shillings {
    type Error = ShillingsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| ShillingsConversionError(format!("{value} is too large to convert to Shillings")))
    }
}

impl Display for Shillings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Tsh", self.0)
    }
}

impl Shillings {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}
