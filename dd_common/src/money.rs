use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Sub},
    str::FromStr,
};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    sqlite::{Sqlite, SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef},
    Decode,
    Encode,
    Type,
};
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "GBP";

//--------------------------------------       Money         ---------------------------------------------------------
/// A monetary amount in major units (pounds, dollars). Stored and serialized as a decimal string, never as a float.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a monetary amount: {0}")]
pub struct MoneyConversionError(String);

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self).map_err(|e| MoneyConversionError(format!("{s}: {e}")))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.rounded().0)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl Money {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Builds an amount from whole pounds and pence, e.g. `Money::new(599, 2)` is 5.99.
    pub fn new(value: i64, scale: u32) -> Self {
        Self(Decimal::new(value, scale))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Rounds to two decimal places, half away from zero.
    pub fn rounded(&self) -> Self {
        Self(self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Clamps negative amounts to zero.
    pub fn or_zero(self) -> Self {
        if self.is_negative() {
            Self::zero()
        } else {
            self
        }
    }

    /// `percent` of this amount, e.g. `Money(50).percentage(10) == 5`.
    pub fn percentage(&self, percent: Decimal) -> Self {
        Self(self.0 * percent / Decimal::ONE_HUNDRED)
    }

    /// The amount in minor units (pence). Fails for amounts that don't fit into an i64.
    pub fn to_minor_units(&self) -> Result<i64, MoneyConversionError> {
        (self.rounded().0 * Decimal::ONE_HUNDRED)
            .to_i64()
            .ok_or_else(|| MoneyConversionError(format!("{self} is out of range")))
    }

    pub fn from_minor_units(value: i64) -> Self {
        Self(Decimal::new(value, 2))
    }
}

impl Type<Sqlite> for Money {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for Money {
    fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> IsNull {
        <String as Encode<'q, Sqlite>>::encode(self.to_string(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for Money {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <String as Decode<'r, Sqlite>>::decode(value)?;
        Ok(Money::from_str(&s)?)
    }
}
