//! Wire normalization for tracker enumerations.
//!
//! The tracker API is not consistent about enumerations: list endpoints
//! return lowercase names, write endpoints take 1-based numbers, and older
//! records carry mixed case. Every enumeration passes through this module
//! exactly once, at deserialization, so the rest of the crate only ever
//! sees typed values.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, Visitor};

/// An enumeration with a canonical lowercase name and a 1-based wire number.
pub trait WireEnum: Sized + Copy + 'static {
    /// What the enumeration is called in error messages.
    const NAME: &'static str;

    /// Every variant, in wire-number order. The first variant is number 1.
    const ALL: &'static [Self];

    /// The canonical lowercase name.
    fn as_str(self) -> &'static str;
}

/// A value that names no variant of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

/// Strings that mean "no value" for optional enumerations.
const ABSENT: &[&str] = &["", "unspecified", "unknown"];

/// Parse a name (any case) or a numeric string.
pub fn parse<T: WireEnum>(raw: &str) -> Option<T> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u64>() {
        return from_number(n);
    }
    T::ALL
        .iter()
        .copied()
        .find(|v| v.as_str().eq_ignore_ascii_case(raw))
}

/// Look up a variant by its 1-based wire number.
pub fn from_number<T: WireEnum>(n: u64) -> Option<T> {
    let index = usize::try_from(n).ok()?.checked_sub(1)?;
    T::ALL.get(index).copied()
}

fn is_absent(raw: &str) -> bool {
    let raw = raw.trim();
    ABSENT.iter().any(|a| a.eq_ignore_ascii_case(raw))
}

/// Deserialize a required enumeration.
pub fn required<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: WireEnum,
{
    deserializer
        .deserialize_any(WireVisitor::<T>(PhantomData))?
        .ok_or_else(|| de::Error::custom(format!("missing {}", T::NAME)))
}

/// Deserialize an optional enumeration, mapping null, `0`, `""`,
/// `"unspecified"` and `"unknown"` to `None`.
pub fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: WireEnum,
{
    deserializer.deserialize_any(WireVisitor::<T>(PhantomData))
}

struct WireVisitor<T>(PhantomData<T>);

impl<'de, T: WireEnum> Visitor<'de> for WireVisitor<T> {
    type Value = Option<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a {} name or number", T::NAME)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if is_absent(v) || v.trim().parse::<u64>() == Ok(0) {
            return Ok(None);
        }
        parse(v)
            .map(Some)
            .ok_or_else(|| E::custom(format!("unknown {} `{v}`", T::NAME)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        if v == 0 {
            return Ok(None);
        }
        from_number(v)
            .map(Some)
            .ok_or_else(|| E::custom(format!("unknown {} number {v}", T::NAME)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        let v = u64::try_from(v)
            .map_err(|_| E::custom(format!("unknown {} number {v}", T::NAME)))?;
        self.visit_u64(v)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

/// Declare a tracker enumeration.
///
/// Generates the enum with ordering by declaration, its [`WireEnum`] impl,
/// `Display`/`FromStr` on the canonical name, and serde impls that write the
/// canonical name and read any wire form.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::model::wire::WireEnum for $name {
            const NAME: &'static str = $label;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::model::wire::WireEnum::as_str(*self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::model::wire::UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $crate::model::wire::parse(s).ok_or_else(|| $crate::model::wire::UnknownValue {
                    kind: $label,
                    value: s.to_string(),
                })
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::model::wire::WireEnum::as_str(*self))
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                $crate::model::wire::required(deserializer)
            }
        }
    };
}

pub(crate) use wire_enum;

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::model::{Environment, Priority, Status};

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "optional")]
        environment: Option<Environment>,
    }

    fn env_of(json: &str) -> Result<Option<Environment>, serde_json::Error> {
        serde_json::from_str::<Holder>(json).map(|h| h.environment)
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!(parse::<Environment>("Production"), Some(Environment::Production));
        assert_eq!(parse::<Environment>("PRODUCTION"), Some(Environment::Production));
        assert_eq!(parse::<Status>("User_Update"), Some(Status::UserUpdate));
    }

    #[test]
    fn numbers_follow_declaration_order() {
        assert_eq!(from_number::<Priority>(1), Some(Priority::P1));
        assert_eq!(from_number::<Environment>(7), Some(Environment::Production));
        assert_eq!(from_number::<Environment>(0), None);
        assert_eq!(from_number::<Environment>(99), None);
        assert_eq!(from_number::<Status>(11), Some(Status::Done));
    }

    #[test]
    fn every_wire_form_reads_the_same_environment() {
        for json in [
            r#"{"environment":"production"}"#,
            r#"{"environment":"Production"}"#,
            r#"{"environment":7}"#,
            r#"{"environment":"7"}"#,
        ] {
            assert_eq!(env_of(json).unwrap(), Some(Environment::Production), "{json}");
        }
    }

    #[test]
    fn absent_markers_read_as_none() {
        for json in [
            r"{}",
            r#"{"environment":null}"#,
            r#"{"environment":""}"#,
            r#"{"environment":"unspecified"}"#,
            r#"{"environment":"Unknown"}"#,
            r#"{"environment":0}"#,
            r#"{"environment":"0"}"#,
        ] {
            assert_eq!(env_of(json).unwrap(), None, "{json}");
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = env_of(r#"{"environment":"prod"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown environment `prod`"));
    }

    #[test]
    fn required_rejects_absent_markers() {
        let err = serde_json::from_str::<Priority>(r#""unspecified""#).unwrap_err();
        assert!(err.to_string().contains("missing priority"));
    }

    #[test]
    fn from_str_reports_kind_and_value() {
        let err = "p9".parse::<Priority>().unwrap_err();
        assert_eq!(err.to_string(), "unknown priority `p9`");
    }
}
