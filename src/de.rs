//! Serde deserializer over a parsed document.
//!
//! Every call works on one [`Decoder`] handle, so there is no event stream to drain:
//! containers hand out child handles through [`Iter`], and ignored values are skipped
//! in O(1) because a subtree is a contiguous slice of the tape.
//!
//! Supported:
//! - Integers of every width, range checked; integral doubles convert.
//! - Floats, including the configured infinity/NaN spellings.
//! - Bytes through the context's data strategy.
//! - Externally tagged enums: `"Variant"` or `{"Variant": value}`.
//! - Maps with string keys, or integer keys written as decimal strings.
//!
//! Errors carry the coding path of the deepest node that failed. Coercion failures and
//! missing fields are also recorded in the context's error slot.

use serde::de::value::{BorrowedStrDeserializer, StrDeserializer};
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};

use crate::context::Context;
use crate::decoder::Decoder;
use crate::document::{NumberValue, Payload};
use crate::error::{Error, ErrorKind};
use crate::iter::Iter;
use crate::options::Options;
use crate::scalars::FromDecoder;

/// Deserialize a `T` from JSON bytes with default [`Options`].
///
/// ```rust
/// #[derive(serde::Deserialize)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let p: Point = tapejson::from_slice(br#"{"x": 1, "y": -2}"#).unwrap();
/// assert_eq!((p.x, p.y), (1, -2));
/// ```
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    from_slice_with_options(bytes, Options::default())
}

/// Deserialize a `T` from a JSON string with default [`Options`].
pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T, Error> {
    from_slice(input.as_bytes())
}

/// Deserialize a `T` from JSON bytes.
///
/// With `options.convert_snake_case` the keys are rewritten to camelCase before any
/// field is matched, so targets usually carry `#[serde(rename_all = "camelCase")]`.
pub fn from_slice_with_options<T: DeserializeOwned>(
    bytes: &[u8],
    options: Options,
) -> Result<T, Error> {
    let convert_case = options.convert_snake_case;
    let context = Context::with_options(bytes, options);
    let value = match context.create_document(convert_case) {
        Ok(root) => from_decoder(root),
        Err(failure) => Err(Error::Parse(failure)),
    };
    context.release();
    value
}

pub fn from_str_with_options<T: DeserializeOwned>(input: &str, options: Options) -> Result<T, Error> {
    from_slice_with_options(input.as_bytes(), options)
}

/// Deserialize a `T` from any node of a document the caller already created.
///
/// Strings and keys may be borrowed from the document for as long as the context lives.
pub fn from_decoder<'c, T: de::Deserialize<'c>>(decoder: Decoder<'c>) -> Result<T, Error> {
    T::deserialize(Deserializer::new(decoder))
}

/// Serde [`Deserializer`](de::Deserializer) positioned at one node.
#[derive(Clone, Copy, Debug)]
pub struct Deserializer<'de> {
    decoder: Decoder<'de>,
}

impl<'de> Deserializer<'de> {
    pub fn new(decoder: Decoder<'de>) -> Self {
        Self { decoder }
    }

    pub fn decoder(&self) -> Decoder<'de> {
        self.decoder
    }

    fn coerce<T: FromDecoder<'de>>(&self) -> Result<T, Error> {
        Ok(self.decoder.decode::<T>()?)
    }

    /// Attach this node's path to an error raised without one (usually by a visitor).
    fn locate(&self, err: Error) -> Error {
        if err.needs_path() {
            err.with_path(self.decoder.coding_path())
        } else {
            err
        }
    }

    /// Like [`locate`](Self::locate), but a missing field reported by a derived
    /// `Deserialize` becomes a recorded `KeyDoesNotExist` on this object.
    fn locate_in_object(&self, err: Error) -> Error {
        let located = err
            .unlocated_missing_key()
            .map(|key| self.decoder.missing_key(key));
        match located {
            Some(located) => Error::Decoding(located),
            None => self.locate(err),
        }
    }

    fn wrong_type(&self, expected: &str) -> Error {
        Error::Decoding(self.decoder.wrong_type(expected))
    }

    fn visit_elements<V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value, Error> {
        if !self.decoder.is_array() {
            return Err(self.wrong_type("an array"));
        }
        let mut access = ElementAccess {
            elements: self.decoder.iterator(),
        };
        let value = visitor.visit_seq(&mut access)?;
        if access.elements.is_at_end() {
            Ok(value)
        } else {
            Err(de::Error::invalid_length(
                access.elements.len(),
                &"fewer elements in array",
            ))
        }
    }

    fn visit_entries<V: Visitor<'de>>(&self, visitor: V) -> Result<V::Value, Error> {
        if !self.decoder.is_dictionary() {
            return Err(self.wrong_type("a dictionary"));
        }
        visitor.visit_map(EntryAccess {
            entries: self.decoder.iterator(),
            value: None,
        })
    }
}

macro_rules! deserialize_coerced {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
            let value = self.coerce::<$ty>()?;
            visitor.$visit(value).map_err(|err| self.locate(err))
        }
    )*};
}

impl<'de> de::Deserializer<'de> for Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let result = match self.decoder.payload() {
            Payload::Null => visitor.visit_unit(),
            Payload::Bool(b) => visitor.visit_bool(*b),
            Payload::Number {
                value: NumberValue::Int(n),
                ..
            } => visitor.visit_i64(*n),
            Payload::Number {
                value: NumberValue::UInt(n),
                ..
            } => visitor.visit_u64(*n),
            // Non-finite only when the literal overflowed; the coercion reports that.
            Payload::Number { .. } => visitor.visit_f64(self.coerce::<f64>()?),
            Payload::String(s) => visitor.visit_borrowed_str(s),
            Payload::Array { .. } => self.visit_elements(visitor),
            Payload::Object { .. } => self.visit_entries(visitor),
        };
        result.map_err(|err| self.locate(err))
    }

    deserialize_coerced! {
        deserialize_bool => visit_bool: bool,
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
        deserialize_f32 => visit_f32: f32,
        deserialize_f64 => visit_f64: f64,
        deserialize_char => visit_char: char,
        deserialize_str => visit_borrowed_str: &'de str,
        deserialize_string => visit_borrowed_str: &'de str,
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let bytes = self.decoder.decode_data()?;
        visitor.visit_byte_buf(bytes).map_err(|err| self.locate(err))
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        if self.decoder.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        if !self.decoder.is_null() {
            return Err(self.wrong_type("null"));
        }
        visitor.visit_unit().map_err(|err| self.locate(err))
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.visit_elements(visitor).map_err(|err| self.locate(err))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.visit_entries(visitor)
            .map_err(|err| self.locate_in_object(err))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let result = match self.decoder.payload() {
            Payload::String(variant) => {
                let variant: StrDeserializer<'_, Error> = (&**variant).into_deserializer();
                visitor.visit_enum(variant)
            }
            Payload::Object { len: 1 } => match self.decoder.iterator().next() {
                Some(value) => visitor.visit_enum(VariantEntry {
                    variant: value.key().unwrap_or_default(),
                    value,
                }),
                None => Err(self.wrong_type(name)),
            },
            Payload::Object { .. } => Err(Error::Decoding(self.decoder.fail(
                ErrorKind::WrongType,
                format!("expected a dictionary with exactly one key for enum {name}"),
            ))),
            _ => Err(self.wrong_type(name)),
        };
        result.map_err(|err| self.locate(err))
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }
}

struct ElementAccess<'de> {
    elements: Iter<'de>,
}

impl<'de> de::SeqAccess<'de> for ElementAccess<'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.elements.next() {
            Some(element) => seed.deserialize(Deserializer::new(element)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.elements.size_hint().0)
    }
}

struct EntryAccess<'de> {
    entries: Iter<'de>,
    /// Entry whose key was handed out last.
    value: Option<Decoder<'de>>,
}

impl<'de> de::MapAccess<'de> for EntryAccess<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Error>
    where
        K: DeserializeSeed<'de>,
    {
        let Some(entry) = self.entries.next() else {
            return Ok(None);
        };
        self.value = Some(entry);
        seed.deserialize(MapKey {
            key: entry.key().unwrap_or_default(),
            entry,
        })
        .map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Error>
    where
        V: DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(Deserializer::new(value)),
            None => Err(Error::msg("value requested before key")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.size_hint().0)
    }
}

/// Object key. Keys are strings, but map targets with integer keys accept decimal text.
struct MapKey<'de> {
    key: &'de str,
    entry: Decoder<'de>,
}

impl MapKey<'_> {
    fn not_a_number(&self, expected: &str) -> Error {
        Error::Decoding(self.entry.fail(
            ErrorKind::WrongType,
            format!(
                "expected to decode {expected} but found key \"{}\" instead",
                self.key
            ),
        ))
    }
}

macro_rules! deserialize_numeric_key {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
            match self.key.parse::<$ty>() {
                Ok(n) => visitor.$visit(n),
                Err(_) => Err(self.not_a_number(stringify!($ty))),
            }
        }
    )*};
}

impl<'de> de::Deserializer<'de> for MapKey<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_borrowed_str(self.key)
    }

    deserialize_numeric_key! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let variant: StrDeserializer<'_, Error> = self.key.into_deserializer();
        visitor.visit_enum(variant)
    }

    serde::forward_to_deserialize_any! {
        bool f32 f64 char str string bytes byte_buf unit unit_struct
        seq tuple tuple_struct map struct identifier ignored_any
    }
}

/// `{"Variant": value}`.
struct VariantEntry<'de> {
    variant: &'de str,
    value: Decoder<'de>,
}

impl<'de> de::EnumAccess<'de> for VariantEntry<'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<S>(self, seed: S) -> Result<(S::Value, Self::Variant), Error>
    where
        S: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(BorrowedStrDeserializer::<Error>::new(self.variant))?;
        Ok((variant, self))
    }
}

impl<'de> de::VariantAccess<'de> for VariantEntry<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        <() as de::Deserialize>::deserialize(Deserializer::new(self.value))
    }

    fn newtype_variant_seed<S>(self, seed: S) -> Result<S::Value, Error>
    where
        S: DeserializeSeed<'de>,
    {
        seed.deserialize(Deserializer::new(self.value))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        de::Deserializer::deserialize_seq(Deserializer::new(self.value), visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        de::Deserializer::deserialize_map(Deserializer::new(self.value), visitor)
    }
}
