use std::{
    fmt,
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{de, de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const RUPEE_CURRENCY_CODE: &str = "INR";

//--------------------------------------        Paise         ---------------------------------------------------------
/// An amount of Indian rupees, held as an integer number of paise (1/100 of a rupee).
///
/// On the wire, amounts are plain JSON numbers denominated in rupees (`499.5` is ₹499.50), since that is what the
/// storefront clients send and expect. Fractions of a paisa are rounded to the nearest paisa on the way in.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Paise(i64);

op!(binary Paise, Add, add);
op!(binary Paise, Sub, sub);
op!(inplace Paise, AddAssign, add_assign);
op!(inplace Paise, SubAssign, sub_assign);
op!(unary Paise, Neg, neg);
op!(scalar Paise, Mul, mul);

impl Sum for Paise {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as an amount in paise: {0}")]
pub struct PaiseConversionError(String);

impl From<i64> for Paise {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<f64> for Paise {
    type Error = PaiseConversionError;

    /// Converts an amount in rupees into paise.
    fn try_from(rupees: f64) -> Result<Self, Self::Error> {
        if !rupees.is_finite() {
            return Err(PaiseConversionError(format!("{rupees} is not a finite number")));
        }
        let paise = (rupees * 100.0).round();
        if paise.abs() > i64::MAX as f64 / 2.0 {
            return Err(PaiseConversionError(format!("{rupees} is too large")));
        }
        #[allow(clippy::cast_possible_truncation)]
        let paise = paise as i64;
        Ok(Self(paise))
    }
}

impl Display for Paise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}₹{}", self.abs_rupee_string())
    }
}

impl Paise {
    pub const ONE_PAISA: Paise = Paise(1);

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees * 100)
    }

    pub fn checked_add(self, rhs: Paise) -> Option<Paise> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Paise) -> Option<Paise> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// `self × rhs`, or `None` if the product does not fit.
    pub fn checked_mul(self, rhs: i64) -> Option<Paise> {
        self.0.checked_mul(rhs).map(Self)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// The amount in rupees as a decimal string with exactly two places, e.g. `"1250.00"`. This is the format used in
    /// UPI payment URIs.
    pub fn to_rupee_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{sign}{}", self.abs_rupee_string())
    }

    pub fn as_rupees(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    fn abs_rupee_string(&self) -> String {
        let abs = self.0.unsigned_abs();
        format!("{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Paise {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_rupees())
    }
}

struct RupeeVisitor;

impl<'de> Visitor<'de> for RupeeVisitor {
    type Value = Paise;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an amount in rupees")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Paise::try_from(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        v.checked_mul(100).map(Paise).ok_or_else(|| E::custom(format!("{v} rupees is too large")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(format!("{v} rupees is too large")))?;
        self.visit_i64(v)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let rupees = v.trim().parse::<f64>().map_err(|e| E::custom(format!("{v} is not an amount. {e}")))?;
        self.visit_f64(rupees)
    }
}

impl<'de> Deserialize<'de> for Paise {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RupeeVisitor)
    }
}
