//! Typed hook arguments
//!
//! Call strings carry arguments as text. Each hook declares the type of every
//! argument position, and arguments are coerced once when the chain is built.

use std::fmt;

/// Declared type of one hook argument position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    /// Verbatim string
    Str,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
}

impl ArgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
        }
    }

    /// Coerce a trimmed raw argument into this type
    pub fn coerce(&self, raw: &str) -> Option<HookArg> {
        match self {
            Self::Str => Some(HookArg::Str(raw.to_string())),
            Self::Int => raw.parse().ok().map(HookArg::Int),
            Self::Float => raw.parse().ok().map(HookArg::Float),
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bound, typed hook argument
#[derive(Debug, Clone, PartialEq)]
pub enum HookArg {
    Str(String),
    Int(i64),
    Float(f64),
}

impl HookArg {
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn arg_type(&self) -> ArgType {
        match self {
            Self::Str(_) => ArgType::Str,
            Self::Int(_) => ArgType::Int,
            Self::Float(_) => ArgType::Float,
        }
    }
}

impl fmt::Display for HookArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_str_is_verbatim() {
        assert_eq!(ArgType::Str.coerce("a b"), Some(HookArg::Str("a b".into())));
        assert_eq!(ArgType::Str.coerce(""), Some(HookArg::Str(String::new())));
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(ArgType::Int.coerce("-42"), Some(HookArg::Int(-42)));
        assert_eq!(ArgType::Int.coerce("4.2"), None);
        assert_eq!(ArgType::Int.coerce("ten"), None);
        assert_eq!(ArgType::Int.coerce(""), None);
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(ArgType::Float.coerce("1.5"), Some(HookArg::Float(1.5)));
        assert_eq!(ArgType::Float.coerce("3"), Some(HookArg::Float(3.0)));
        assert_eq!(ArgType::Float.coerce("x"), None);
    }

    #[test]
    fn test_accessors() {
        let arg = HookArg::Int(7);
        assert_eq!(arg.as_int(), Some(7));
        assert_eq!(arg.as_str(), None);
        assert_eq!(arg.as_float(), None);
        assert_eq!(arg.arg_type(), ArgType::Int);
        assert_eq!(arg.to_string(), "7");

        let arg = HookArg::Str("db1".into());
        assert_eq!(arg.as_str(), Some("db1"));
        assert_eq!(arg.arg_type(), ArgType::Str);
    }
}
