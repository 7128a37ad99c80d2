// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Captured property values of a log event.
//!
//! A [`PropertyValue`] is either a [`Scalar`], an ordered sequence, a [`Structure`] with named
//! fields, or a dictionary keyed by scalars. Values serialize to JSON through [`serde`] and
//! render to text through [`fmt::Display`].

use std::fmt;
use std::fmt::Write;

use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeMap;
use serde::ser::SerializeSeq;

const TYPE_TAG_PROPERTY: &str = "_typeTag";

/// A primitive property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    I128(i128),
    U128(u128),
    F64(f64),
    Char(char),
    String(String),
}

impl Scalar {
    /// The plain text of the scalar, as used for dictionary keys.
    ///
    /// Strings are not quoted.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::String(s) => s.clone(),
            Scalar::Char(c) => c.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::I64(v) => write!(f, "{v}"),
            Scalar::U64(v) => write!(f, "{v}"),
            Scalar::I128(v) => write!(f, "{v}"),
            Scalar::U128(v) => write!(f, "{v}"),
            Scalar::F64(v) => write!(f, "{v}"),
            Scalar::Char(v) => write_quoted(f, v.encode_utf8(&mut [0; 4])),
            Scalar::String(v) => write_quoted(f, v),
        }
    }
}

fn write_quoted(f: &mut impl Write, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

impl Serialize for Scalar {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(v) => serializer.serialize_bool(*v),
            Scalar::I64(v) => serializer.serialize_i64(*v),
            Scalar::U64(v) => serializer.serialize_u64(*v),
            Scalar::I128(v) => serializer.serialize_i128(*v),
            Scalar::U128(v) => serializer.serialize_u128(*v),
            Scalar::F64(v) if v.is_finite() => serializer.serialize_f64(*v),
            // JSON has no literal for these
            Scalar::F64(v) if v.is_nan() => serializer.serialize_str("NaN"),
            Scalar::F64(v) if *v > 0.0 => serializer.serialize_str("Infinity"),
            Scalar::F64(_) => serializer.serialize_str("-Infinity"),
            Scalar::Char(v) => serializer.serialize_char(*v),
            Scalar::String(v) => serializer.serialize_str(v),
        }
    }
}

/// A value with named fields and an optional type tag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure {
    type_tag: Option<String>,
    properties: Vec<(String, PropertyValue)>,
}

impl Structure {
    /// Create an untagged structure with no fields.
    pub fn new() -> Self {
        Structure::default()
    }

    /// Set the type tag of the structure.
    pub fn type_tag(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = Some(tag.into());
        self
    }

    /// Append a field. Fields keep their insertion order.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }

    /// The type tag, if any.
    pub fn tag(&self) -> Option<&str> {
        self.type_tag.as_deref()
    }

    /// The fields in declaration order.
    pub fn properties(&self) -> &[(String, PropertyValue)] {
        &self.properties
    }
}

/// A captured property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(Scalar),
    Sequence(Vec<PropertyValue>),
    Structure(Structure),
    Dictionary(Vec<(Scalar, PropertyValue)>),
}

impl PropertyValue {
    /// Returns the scalar if this value is one.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            PropertyValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as text, giving `scalar` the first chance to format each scalar.
    ///
    /// When `scalar` returns `None` the default rendering is used.
    pub(crate) fn render<F>(&self, out: &mut String, scalar: &F) -> fmt::Result
    where
        F: Fn(&Scalar) -> Option<String>,
    {
        match self {
            PropertyValue::Scalar(s) => match scalar(s) {
                Some(text) => out.write_str(&text),
                None => write!(out, "{s}"),
            },
            PropertyValue::Sequence(items) => {
                out.write_char('[')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    item.render(out, scalar)?;
                }
                out.write_char(']')
            }
            PropertyValue::Structure(structure) => {
                if let Some(tag) = structure.tag() {
                    write!(out, "{tag} ")?;
                }
                out.write_str("{ ")?;
                for (i, (name, value)) in structure.properties().iter().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    write!(out, "{name}: ")?;
                    value.render(out, scalar)?;
                }
                out.write_str(" }")
            }
            PropertyValue::Dictionary(entries) => {
                out.write_char('[')?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    out.write_char('(')?;
                    match scalar(key) {
                        Some(text) => out.write_str(&text)?,
                        None => write!(out, "{key}")?,
                    }
                    out.write_str(": ")?;
                    value.render(out, scalar)?;
                    out.write_char(')')?;
                }
                out.write_char(']')
            }
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = String::new();
        self.render(&mut text, &|_: &Scalar| None)?;
        f.write_str(&text)
    }
}

impl Serialize for PropertyValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            PropertyValue::Scalar(scalar) => scalar.serialize(serializer),
            PropertyValue::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            PropertyValue::Structure(structure) => {
                let len = structure.properties.len() + usize::from(structure.type_tag.is_some());
                let mut map = serializer.serialize_map(Some(len))?;
                for (name, value) in structure.properties.iter() {
                    map.serialize_entry(name, value)?;
                }
                if let Some(tag) = structure.type_tag.as_ref() {
                    map.serialize_entry(TYPE_TAG_PROPERTY, tag)?;
                }
                map.end()
            }
            PropertyValue::Dictionary(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(&key.to_text(), value)?;
                }
                map.end()
            }
        }
    }
}

impl From<Scalar> for PropertyValue {
    fn from(value: Scalar) -> Self {
        PropertyValue::Scalar(value)
    }
}

impl From<Structure> for PropertyValue {
    fn from(value: Structure) -> Self {
        PropertyValue::Structure(value)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(value: Vec<T>) -> Self {
        PropertyValue::Sequence(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => PropertyValue::Scalar(Scalar::Null),
        }
    }
}

macro_rules! impl_scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value.into())
                }
            }

            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

impl_scalar_from!(
    bool => Bool,
    i8 => I64,
    i16 => I64,
    i32 => I64,
    i64 => I64,
    u8 => U64,
    u16 => U64,
    u32 => U64,
    u64 => U64,
    i128 => I128,
    u128 => U128,
    f32 => F64,
    f64 => F64,
    char => Char,
    String => String,
    &str => String,
);
