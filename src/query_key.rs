use serde::{Serialize, Serializer};

/// A single primitive component of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPart {
    /// Serialized as `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer too large for [`KeyPart::Int`].
    UInt(u64),
    /// A floating point number. Non-finite values serialize as `null` and whole
    /// numbers serialize as integers, so `1.0` and `1` are the same key.
    Float(f64),
    /// A string.
    Str(String),
}

// Exclusive upper bound of the whole floats that convert to i64 exactly.
const I64_END: f64 = 9_223_372_036_854_775_808.0;

impl Serialize for KeyPart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            KeyPart::Null => serializer.serialize_unit(),
            KeyPart::Bool(value) => serializer.serialize_bool(*value),
            KeyPart::Int(value) => serializer.serialize_i64(*value),
            KeyPart::UInt(value) => serializer.serialize_u64(*value),
            KeyPart::Float(value)
                if value.fract() == 0.0 && *value >= i64::MIN as f64 && *value < I64_END =>
            {
                serializer.serialize_i64(*value as i64)
            }
            KeyPart::Float(value) => serializer.serialize_f64(*value),
            KeyPart::Str(value) => serializer.serialize_str(value),
        }
    }
}

/// Identifies one cached asynchronous result.
///
/// A key is an ordered sequence of primitives. Two keys refer to the same query
/// iff their canonical JSON serializations are equal, so `["item", 1]` and
/// `[1, "item"]` are different keys.
///
/// ```
/// use tiny_query::*;
///
/// let key = query_key!["item", 1];
/// assert_eq!(key.canonical().unwrap(), r#"["item",1]"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
    /// An empty key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a part to the key.
    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.0.push(part.into());
        self
    }

    /// The parts of this key, in order.
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// The canonical string used to look the key up in a [`QueryStore`](crate::QueryStore).
    pub fn canonical(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }
}

impl<P: Into<KeyPart>> FromIterator<P> for QueryKey {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        QueryKey(iter.into_iter().map(Into::into).collect())
    }
}

impl<P: Into<KeyPart>, const N: usize> From<[P; N]> for QueryKey {
    fn from(parts: [P; N]) -> Self {
        parts.into_iter().collect()
    }
}

impl<P: Into<KeyPart>> From<Vec<P>> for QueryKey {
    fn from(parts: Vec<P>) -> Self {
        parts.into_iter().collect()
    }
}

impl From<()> for KeyPart {
    fn from(_: ()) -> Self {
        KeyPart::Null
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<&String> for KeyPart {
    fn from(value: &String) -> Self {
        KeyPart::Str(value.clone())
    }
}

impl From<f32> for KeyPart {
    fn from(value: f32) -> Self {
        KeyPart::Float(value.into())
    }
}

impl From<f64> for KeyPart {
    fn from(value: f64) -> Self {
        KeyPart::Float(value)
    }
}

impl From<u64> for KeyPart {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(value) => KeyPart::Int(value),
            Err(_) => KeyPart::UInt(value),
        }
    }
}

impl From<usize> for KeyPart {
    fn from(value: usize) -> Self {
        (value as u64).into()
    }
}

macro_rules! int_key_part {
    ($($int:ty),*) => {
        $(
            impl From<$int> for KeyPart {
                fn from(value: $int) -> Self {
                    KeyPart::Int(value.into())
                }
            }
        )*
    };
}

int_key_part!(i8, i16, i32, i64, u8, u16, u32);

impl<P: Into<KeyPart>> From<Option<P>> for KeyPart {
    fn from(value: Option<P>) -> Self {
        value.map(Into::into).unwrap_or(KeyPart::Null)
    }
}

/// Builds a [`QueryKey`] from a list of primitives.
///
/// ```
/// use tiny_query::*;
///
/// let key = query_key!["todos", 1, true];
/// assert_eq!(key.parts().len(), 3);
/// ```
#[macro_export]
macro_rules! query_key {
    () => {
        $crate::QueryKey::new()
    };
    ($($part:expr),+ $(,)?) => {
        $crate::QueryKey::new()$(.with($part))+
    };
}
