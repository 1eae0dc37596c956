//! Data models for the school backend.
//!
//! Records themselves are free-form documents; these types describe the collections, the
//! criteria clients can list them by, and the report payloads.

mod admission;
mod class;
mod entity;
mod marks;
mod report;
mod staff;
mod student;

pub use admission::*;
pub use class::*;
pub use entity::*;
pub use marks::*;
pub use report::*;
pub use staff::*;
pub use student::*;

/// Lenient deserializers for loosely-typed request parameters.
pub mod de {
    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};

    /// Accept a string or a number and keep its string form.
    pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StringOrNumber;

        impl<'de> Visitor<'de> for StringOrNumber {
            type Value = Option<String>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or a number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Some(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(Some(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Some(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Some(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(Some(v.to_string()))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
                d.deserialize_any(StringOrNumber)
            }
        }

        deserializer.deserialize_any(StringOrNumber)
    }
}
