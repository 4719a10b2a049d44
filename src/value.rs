use std::fmt;

/// A scalar leaf value compared against a document field.
///
/// Conditions only ever hold scalars: arrays appear solely as the value set of
/// a membership test, and objects never appear at all.
///
/// # Type Preservation
///
/// Integers and floats are kept apart so that a compiled `term` clause carries
/// exactly the number the caller wrote (`2` stays `2`, `2.0` stays `2.0`).
///
/// # Examples
///
/// ```
/// use oqr::Scalar;
///
/// let null = Scalar::Null;
/// let boolean = Scalar::from(true);
/// let integer = Scalar::from(42);
/// let float = Scalar::from(3.14);
/// let string = Scalar::from("hello");
///
/// assert_eq!(integer.to_string(), "42");
/// assert_eq!(float.to_string(), "3.14");
/// assert_eq!(string.to_string(), "hello");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// JSON null
    Null,

    /// JSON boolean (true/false)
    Boolean(bool),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// UTF-8 string
    String(String),
}

impl Scalar {
    /// Human-readable type name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Boolean(_) => "boolean",
            Scalar::Integer(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Scalar::Integer(n) => Some(*n as f64),
            Scalar::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Convert to the equivalent `serde_json::Value`.
    ///
    /// Non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Null => serde_json::Value::Null,
            Scalar::Boolean(b) => serde_json::Value::Bool(*b),
            Scalar::Integer(i) => serde_json::Value::Number((*i).into()),
            Scalar::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Scalar::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Convert a JSON value into a scalar.
    ///
    /// Returns `None` for arrays and objects.
    pub fn from_json(v: &serde_json::Value) -> Option<Scalar> {
        match v {
            serde_json::Value::Null => Some(Scalar::Null),
            serde_json::Value::Bool(b) => Some(Scalar::Boolean(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Scalar::Integer(i))
                } else {
                    n.as_f64().map(Scalar::Float)
                }
            }
            serde_json::Value::String(s) => Some(Scalar::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

/// Renders the value the way canonical strings show it: strings unquoted,
/// floats always with a fractional part.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Integer(n) => write!(f, "{}", n),
            Scalar::Float(n) => write!(f, "{:?}", n),
            Scalar::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Boolean(b)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Integer(n.into())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Integer(n)
    }
}

impl From<u32> for Scalar {
    fn from(n: u32) -> Self {
        Scalar::Integer(n.into())
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Float(n)
    }
}

impl From<()> for Scalar {
    fn from(_: ()) -> Self {
        Scalar::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_display_keeps_fraction() {
        assert_eq!(Scalar::Float(2.0).to_string(), "2.0");
        assert_eq!(Scalar::Integer(2).to_string(), "2");
    }

    #[test]
    fn json_numbers_keep_integer_type() {
        assert_eq!(
            Scalar::from_json(&serde_json::json!(4200)),
            Some(Scalar::Integer(4200))
        );
        assert_eq!(
            Scalar::from_json(&serde_json::json!(0.5)),
            Some(Scalar::Float(0.5))
        );
        assert_eq!(Scalar::from_json(&serde_json::json!([1])), None);
    }

    #[test]
    fn non_finite_float_becomes_null() {
        assert_eq!(Scalar::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }
}
