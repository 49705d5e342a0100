//! Typed per-point annotations.

use std::fmt;

/// Flag names written by the pipeline stages.
pub mod names {
    pub const AGOOD: &str = "agood";
    pub const APVALUE: &str = "apvalue";
    pub const CGOOD: &str = "cgood";
    pub const DREFNUM: &str = "drefnum";
    pub const DREFNAME: &str = "drefname";
    pub const DGOOD: &str = "dgood";
    pub const DSELFREF: &str = "dselfref";
    pub const DPVALUE: &str = "dpvalue";
    pub const EORIGIN: &str = "eorigin";
    pub const EORINAME: &str = "eoriname";
    pub const EEXTRAPOL: &str = "eextrapol";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Bool,
    Int,
    Float,
    Str,
}

impl FlagKind {
    pub fn name(self) -> &'static str {
        match self {
            FlagKind::Bool => "bool",
            FlagKind::Int => "int",
            FlagKind::Float => "float",
            FlagKind::Str => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl FlagValue {
    pub fn kind(&self) -> FlagKind {
        match self {
            FlagValue::Bool(_) => FlagKind::Bool,
            FlagValue::Int(_) => FlagKind::Int,
            FlagValue::Float(_) => FlagKind::Float,
            FlagValue::Str(_) => FlagKind::Str,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FlagValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FlagValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Text form for data files; booleans become `0`/`1`.
    pub fn to_column(&self) -> String {
        match self {
            FlagValue::Bool(b) => u8::from(*b).to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{b}"),
            FlagValue::Int(v) => write!(f, "{v}"),
            FlagValue::Float(v) => write!(f, "{v}"),
            FlagValue::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        FlagValue::Int(value)
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        FlagValue::Float(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::Str(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        FlagValue::Str(value)
    }
}

/// A declared flag and its per-point values (`None` = not set yet).
#[derive(Debug, Clone)]
pub struct FlagColumn {
    pub name: String,
    pub kind: FlagKind,
    pub values: Vec<Option<FlagValue>>,
}

impl FlagColumn {
    pub fn new(name: &str, kind: FlagKind, len: usize) -> Self {
        Self {
            name: name.to_string(),
            kind,
            values: vec![None; len],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_text_maps_bools_to_ints() {
        assert_eq!(FlagValue::Bool(true).to_column(), "1");
        assert_eq!(FlagValue::Bool(false).to_column(), "0");
        assert_eq!(FlagValue::Int(-1).to_column(), "-1");
        assert_eq!(FlagValue::from("a.dat").to_column(), "a.dat");
    }
}
