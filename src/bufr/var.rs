// Variables: a value bound to its metadata, plus attributes.

use std::fmt;

use super::error::{Error, Result};
use super::varcode::Varcode;
use super::varinfo::Varinfo;

/// Raw value held by a [`Var`].
///
/// Numeric values are kept as the scaled integer (`value * 10^scale`) so
/// they survive round trips without floating point drift.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// A value in a subset.
#[derive(Clone, Debug, PartialEq)]
pub struct Var {
    info: Varinfo,
    value: Option<Value>,
    attrs: Vec<Var>,
}

impl Var {
    /// Unset (missing) variable.
    pub fn new(info: Varinfo) -> Self {
        Self {
            info,
            value: None,
            attrs: Vec::new(),
        }
    }

    pub fn with_int(info: Varinfo, v: i32) -> Self {
        Self {
            info,
            value: Some(Value::Int(v)),
            attrs: Vec::new(),
        }
    }

    pub fn with_str(info: Varinfo, v: impl Into<String>) -> Self {
        Self {
            info,
            value: Some(Value::Str(v.into())),
            attrs: Vec::new(),
        }
    }

    pub fn code(&self) -> Varcode {
        self.info.code
    }

    pub fn info(&self) -> &Varinfo {
        &self.info
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn set(&mut self, value: Option<Value>) {
        self.value = value;
    }

    pub fn seti(&mut self, v: i32) {
        self.value = Some(Value::Int(v));
    }

    pub fn setc(&mut self, v: impl Into<String>) {
        self.value = Some(Value::Str(v.into()));
    }

    /// Integer value. Strings holding a decimal integer are accepted.
    pub fn enqi(&self) -> Result<i32> {
        match &self.value {
            Some(Value::Int(v)) => Ok(*v),
            Some(Value::Str(s)) => s.trim().parse().map_err(|_| {
                Error::Parse(format!("{}: '{s}' is not an integer", self.code()))
            }),
            None => Err(Error::Parse(format!("{}: value is not set", self.code()))),
        }
    }

    /// String value; integers are formatted.
    pub fn enqc(&self) -> Option<String> {
        self.value.as_ref().map(Value::to_string)
    }

    /// Unscaled floating point value.
    pub fn enqd(&self) -> Result<f64> {
        let raw = self.enqi()?;
        Ok(f64::from(raw) / 10f64.powi(self.info.scale))
    }

    pub fn attrs(&self) -> &[Var] {
        &self.attrs
    }

    /// Attribute with the given code.
    pub fn enqa(&self, code: Varcode) -> Option<&Var> {
        self.attrs.iter().find(|a| a.code() == code)
    }

    /// Set an attribute, replacing any with the same code.
    pub fn seta(&mut self, attr: Var) {
        match self.attrs.iter_mut().find(|a| a.code() == attr.code()) {
            Some(slot) => *slot = attr,
            None => self.attrs.push(attr),
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}[{}]: {v}", self.code(), self.info.desc),
            None => write!(f, "{}[{}]: (undef)", self.code(), self.info.desc),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bufr::varinfo::VarInfo;

    fn temp() -> Varinfo {
        Arc::new(VarInfo::numeric(Varcode::new(0, 12, 101), "TEMP", "K", 2, 0, 16))
    }

    #[test]
    fn scaled_values() {
        let v = Var::with_int(temp(), 27315);
        assert_eq!(v.enqi().unwrap(), 27315);
        assert!((v.enqd().unwrap() - 273.15).abs() < 1e-9);
        assert_eq!(v.enqc().as_deref(), Some("27315"));
    }

    #[test]
    fn unset_value_errors() {
        let v = Var::new(temp());
        assert!(!v.is_set());
        assert!(v.enqi().is_err());
        assert_eq!(v.enqc(), None);
    }

    #[test]
    fn attributes_replace_by_code() {
        let conf = Arc::new(VarInfo::numeric(Varcode::new(0, 33, 7), "CONF", "%", 0, 0, 7));
        let mut v = Var::with_int(temp(), 1);
        v.seta(Var::with_int(conf.clone(), 50));
        v.seta(Var::with_int(conf, 70));
        assert_eq!(v.attrs().len(), 1);
        assert_eq!(v.enqa(Varcode::new(0, 33, 7)).unwrap().enqi().unwrap(), 70);
    }
}
