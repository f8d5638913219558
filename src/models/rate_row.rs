use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

pub const NOT_AVAILABLE: &str = "N/A";

/// Exchange rate of a row: a resolved number, or `N/A` when the rate map has no entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rate {
    Value(f64),
    NotAvailable,
}

impl Rate {
    /// Zero counts as missing, like an absent key.
    pub fn from_lookup(rate: Option<f64>) -> Self {
        match rate {
            Some(r) if r != 0.0 && !r.is_nan() => Rate::Value(r),
            _ => Rate::NotAvailable,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Rate::Value(r) => Some(*r),
            Rate::NotAvailable => None,
        }
    }

    /// Numbers in ascending order; `N/A` after every number.
    pub fn sort_cmp(&self, other: &Rate) -> Ordering {
        match (self, other) {
            (Rate::Value(a), Rate::Value(b)) => a.total_cmp(b),
            (Rate::Value(_), Rate::NotAvailable) => Ordering::Less,
            (Rate::NotAvailable, Rate::Value(_)) => Ordering::Greater,
            (Rate::NotAvailable, Rate::NotAvailable) => Ordering::Equal,
        }
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rate::Value(r) => write!(f, "{r}"),
            Rate::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rate::Value(r) => serializer.serialize_f64(*r),
            Rate::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    pub flag: String,
    pub country: String,
    pub currency: String,
    pub rate: Rate,
}
