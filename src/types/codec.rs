//! Property codec
//!
//! Every resource kind declares a table of [`PropertyDescriptor`]s and
//! implements [`PropertyCodec`] on top of them. Decoding looks each
//! descriptor up in a [`Properties`] bag, substitutes defaults, coerces and
//! range-checks; [`Detail::decode`] additionally carries every unclaimed
//! key over as extras so nothing the server sent is lost.
//!
//! Encoding maps typed values back to [`RequestValues`] and re-applies the
//! same range checks through [`PropertyDescriptor::check_uint`].

use super::properties::Properties;
use crate::api::RequestValues;
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::str::FromStr;

/// Primitive shape expected on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Unsigned integer within `[min, max]`
    UInt { min: u64, max: u64 },
    String,
    Bool,
    /// String restricted to a fixed set of values
    Enum(&'static [&'static str]),
}

/// Default value literal for a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    UInt(u64),
    Str(&'static str),
    Bool(bool),
}

impl Literal {
    fn to_value(self) -> Value {
        match self {
            Literal::UInt(n) => Value::from(n),
            Literal::Str(s) => Value::from(s),
            Literal::Bool(b) => Value::from(b),
        }
    }
}

/// Whether a property must be present on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Default(Literal),
}

/// Rule set for one named property of one resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub presence: Presence,
}

impl PropertyDescriptor {
    pub const fn uint(name: &'static str, min: u64, max: u64) -> Self {
        Self {
            name,
            kind: PropertyKind::UInt { min, max },
            presence: Presence::Required,
        }
    }

    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: PropertyKind::String,
            presence: Presence::Required,
        }
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self {
            name,
            kind: PropertyKind::Bool,
            presence: Presence::Required,
        }
    }

    pub const fn enumeration(name: &'static str, values: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: PropertyKind::Enum(values),
            presence: Presence::Required,
        }
    }

    /// Make the property optional, substituting `value` when absent
    pub const fn with_default(self, value: Literal) -> Self {
        Self {
            presence: Presence::Default(value),
            ..self
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self.presence, Presence::Required)
    }

    fn invalid(&self, value: impl Into<Value>) -> Error {
        Error::invalid(self.name, value)
    }

    /// Present value, or the default, or `MissingProperty`
    fn lookup<'a>(&self, bag: &'a Properties) -> Result<Cow<'a, Value>> {
        match (bag.get(self.name), self.presence) {
            (Some(value), _) => Ok(Cow::Borrowed(value)),
            (None, Presence::Default(literal)) => Ok(Cow::Owned(literal.to_value())),
            (None, Presence::Required) => Err(Error::missing(self.name)),
        }
    }

    /// Range check shared by decode and encode
    pub fn check_uint(&self, value: u64) -> Result<u64> {
        match self.kind {
            PropertyKind::UInt { min, max } if value < min || value > max => {
                Err(self.invalid(value))
            }
            _ => Ok(value),
        }
    }

    pub fn decode_uint<T: TryFrom<u64>>(&self, bag: &Properties) -> Result<T> {
        let value = self.lookup(bag)?;
        let n = coerce_uint(&value).ok_or_else(|| self.invalid(value.clone().into_owned()))?;
        let n = self.check_uint(n)?;
        T::try_from(n).map_err(|_| self.invalid(n))
    }

    pub fn decode_string(&self, bag: &Properties) -> Result<String> {
        let value = self.lookup(bag)?;
        coerce_string(&value).ok_or_else(|| self.invalid(value.into_owned()))
    }

    pub fn decode_bool(&self, bag: &Properties) -> Result<bool> {
        let value = self.lookup(bag)?;
        coerce_bool(&value).ok_or_else(|| self.invalid(value.into_owned()))
    }

    pub fn decode_enum<T: FromStr>(&self, bag: &Properties) -> Result<T> {
        let value = self.lookup(bag)?;
        let allowed = match self.kind {
            PropertyKind::Enum(values) => values,
            _ => &[],
        };
        value
            .as_str()
            .filter(|s| allowed.contains(s))
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.invalid(value.into_owned()))
    }
}

/// Integer from a JSON integer, an integral float, or a decimal string.
/// Fractional and negative inputs are rejected rather than truncated.
fn coerce_uint(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f < u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// PVE reports booleans as `0`/`1` in most payloads
fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "0" | "false" => Some(false),
            "1" | "true" => Some(true),
            _ => None,
        },
        _ => None,
    }
}

/// Wire names claimed by a descriptor table
pub fn keys_of(descriptors: &[PropertyDescriptor]) -> Vec<&'static str> {
    descriptors.iter().map(|d| d.name).collect()
}

/// Typed, validated view of one resource kind's properties
pub trait PropertyCodec: Sized {
    /// Every wire key this type claims
    fn known_keys() -> Vec<&'static str>;

    /// Build the typed value from a bag, ignoring unclaimed keys
    fn decode(bag: &Properties) -> Result<Self>;

    /// Build the request body for a mutation call
    fn encode(&self) -> Result<RequestValues>;
}

/// Typed properties plus the wire fields they do not claim
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detail<P> {
    pub properties: P,
    pub extras: Properties,
}

impl<P> Detail<P> {
    pub fn new(properties: P, extras: Properties) -> Self {
        Self { properties, extras }
    }

    /// Decode with an explicit key set, for kinds whose claimed keys depend
    /// on a discriminator in the bag
    pub fn decode_with(
        bag: Properties,
        known: &[&str],
        decode: impl FnOnce(&Properties) -> Result<P>,
    ) -> Result<Self> {
        let properties = decode(&bag)?;
        let extras = bag.without(known);
        Ok(Self { properties, extras })
    }
}

impl<P: PropertyCodec> Detail<P> {
    pub fn decode(bag: Properties) -> Result<Self> {
        Self::decode_with(bag, &P::known_keys(), P::decode)
    }
}
