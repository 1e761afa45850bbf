//! Scalar coercion: turning a probed node into a concrete Rust value.
//!
//! Rules:
//! - Integers are range checked against the target width. Out-of-range values record
//!   `NumberDoesNotFit`; nothing is truncated or wrapped. A number written with a fraction
//!   or exponent converts only when it is integral (`1.0`, `2e3`). Integer literals wider
//!   than 64 bits are checked against their exact text.
//! - Floats accept any number (narrowing to `f32` may lose precision, but a finite value
//!   beyond `f32::MAX` does not fit). A string equal to one of the context's sentinel
//!   spellings yields +∞, −∞ or NaN.
//! - Every other kind mismatch, `null` included, records `WrongType`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use num_traits::NumCast;

use crate::decoder::Decoder;
use crate::document::{NumberValue, Payload};
use crate::error::{DecodingError, ErrorKind};
use crate::options::{DataStrategy, DateStrategy};

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z.
const REFERENCE_DATE_OFFSET: f64 = 978_307_200.0;

/// Types a [`Decoder`] can coerce a node into.
pub trait FromDecoder<'c>: Sized {
    /// Name used in error descriptions.
    const TYPE_NAME: &'static str;

    fn from_decoder(decoder: Decoder<'c>) -> Result<Self, DecodingError>;
}

fn does_not_fit(decoder: &Decoder<'_>, text: &str, type_name: &str) -> DecodingError {
    decoder.fail(
        ErrorKind::NumberDoesNotFit,
        format!("parsed JSON number <{text}> does not fit in {type_name}"),
    )
}

fn decode_integer<T: NumCast>(decoder: Decoder<'_>, type_name: &str) -> Result<T, DecodingError> {
    let Payload::Number { value, text } = decoder.payload() else {
        return Err(decoder.wrong_type(type_name));
    };
    let converted = match *value {
        NumberValue::Int(v) => <T as NumCast>::from(v),
        NumberValue::UInt(v) => <T as NumCast>::from(v),
        // An integer literal beyond 64 bits: convert from the exact text, not the rounded double.
        NumberValue::Float(_) if !text.contains(['.', 'e', 'E']) => text
            .parse::<i128>()
            .ok()
            .and_then(<T as NumCast>::from)
            .or_else(|| text.parse::<u128>().ok().and_then(<T as NumCast>::from)),
        NumberValue::Float(v) if v.is_finite() && v.fract() == 0.0 => <T as NumCast>::from(v),
        NumberValue::Float(_) => None,
    };
    converted.ok_or_else(|| does_not_fit(&decoder, text, type_name))
}

macro_rules! integer_from_decoder {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'c> FromDecoder<'c> for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn from_decoder(decoder: Decoder<'c>) -> Result<Self, DecodingError> {
                    decode_integer(decoder, Self::TYPE_NAME)
                }
            }
        )*
    };
}

integer_from_decoder!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// Decode a float, honoring the sentinel spellings.
fn decode_float(decoder: Decoder<'_>, type_name: &str) -> Result<f64, DecodingError> {
    match decoder.payload() {
        Payload::Number { value, text } => match *value {
            // `-0` is an integer literal but keeps its sign as a double.
            NumberValue::Int(0) if text.starts_with('-') => Ok(-0.0),
            NumberValue::Int(v) => Ok(v as f64),
            NumberValue::UInt(v) => Ok(v as f64),
            // Non-finite only when the literal overflowed f64.
            NumberValue::Float(v) if v.is_finite() => Ok(v),
            NumberValue::Float(_) => Err(does_not_fit(&decoder, text, type_name)),
        },
        Payload::String(s) => decoder
            .context()
            .float_spellings()
            .special_value(s)
            .ok_or_else(|| decoder.wrong_type(type_name)),
        _ => Err(decoder.wrong_type(type_name)),
    }
}

impl<'c> FromDecoder<'c> for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_decoder(decoder: Decoder<'c>) -> Result<Self, DecodingError> {
        decode_float(decoder, Self::TYPE_NAME)
    }
}

impl<'c> FromDecoder<'c> for f32 {
    const TYPE_NAME: &'static str = "f32";

    fn from_decoder(decoder: Decoder<'c>) -> Result<Self, DecodingError> {
        let v = decode_float(decoder, Self::TYPE_NAME)?;
        if v.is_finite() && v.abs() > <f64 as From<f32>>::from(f32::MAX) {
            let text = match decoder.payload() {
                Payload::Number { text, .. } => text.to_string(),
                _ => v.to_string(),
            };
            return Err(does_not_fit(&decoder, &text, Self::TYPE_NAME));
        }
        Ok(v as f32)
    }
}

impl<'c> FromDecoder<'c> for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_decoder(decoder: Decoder<'c>) -> Result<Self, DecodingError> {
        match decoder.payload() {
            Payload::Bool(b) => Ok(*b),
            _ => Err(decoder.wrong_type(Self::TYPE_NAME)),
        }
    }
}

impl<'c> FromDecoder<'c> for &'c str {
    const TYPE_NAME: &'static str = "String";

    fn from_decoder(decoder: Decoder<'c>) -> Result<Self, DecodingError> {
        match decoder.payload() {
            Payload::String(s) => Ok(&**s),
            _ => Err(decoder.wrong_type(Self::TYPE_NAME)),
        }
    }
}

impl<'c> FromDecoder<'c> for String {
    const TYPE_NAME: &'static str = "String";

    fn from_decoder(decoder: Decoder<'c>) -> Result<Self, DecodingError> {
        <&'c str as FromDecoder<'c>>::from_decoder(decoder).map(str::to_owned)
    }
}

impl<'c> FromDecoder<'c> for char {
    const TYPE_NAME: &'static str = "char";

    fn from_decoder(decoder: Decoder<'c>) -> Result<Self, DecodingError> {
        let Payload::String(s) = decoder.payload() else {
            return Err(decoder.wrong_type(Self::TYPE_NAME));
        };
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(decoder.fail(
                ErrorKind::WrongType,
                format!("expected to decode char but found a string of {} characters", s.chars().count()),
            )),
        }
    }
}

impl<'c> FromDecoder<'c> for DateTime<Utc> {
    const TYPE_NAME: &'static str = "Date";

    fn from_decoder(decoder: Decoder<'c>) -> Result<Self, DecodingError> {
        decoder.decode_date()
    }
}

/// Date from fractional seconds since the Unix epoch.
fn timestamp(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    if whole < i64::MIN as f64 || whole >= i64::MAX as f64 {
        return None;
    }
    let mut secs = whole as i64;
    let mut nanos = ((seconds - whole) * 1e9).round() as u32;
    if nanos >= 1_000_000_000 {
        secs = secs.checked_add(1)?;
        nanos = 0;
    }
    DateTime::<Utc>::from_timestamp(secs, nanos)
}

impl<'c> Decoder<'c> {
    /// Number node as `f64`, for timestamp strategies. Sentinel spellings do not apply.
    fn timestamp_number(&self) -> Result<f64, DecodingError> {
        match self.payload() {
            Payload::Number { .. } => decode_float(*self, "Date"),
            _ => Err(self.wrong_type("Date")),
        }
    }

    fn date_string(&self) -> Result<&'c str, DecodingError> {
        match self.payload() {
            Payload::String(s) => Ok(&**s),
            _ => Err(self.wrong_type("Date")),
        }
    }

    /// Decode a date according to the context's [`DateStrategy`].
    ///
    /// Malformed date strings record `WrongType`; timestamps outside the representable
    /// range record `NumberDoesNotFit`.
    pub fn decode_date(&self) -> Result<DateTime<Utc>, DecodingError> {
        let seconds = match &self.context().options().date_strategy {
            DateStrategy::DeferredToDate => self.timestamp_number()? + REFERENCE_DATE_OFFSET,
            DateStrategy::SecondsSince1970 => self.timestamp_number()?,
            DateStrategy::MillisecondsSince1970 => self.timestamp_number()? / 1000.0,
            DateStrategy::Iso8601 => {
                let s = self.date_string()?;
                return DateTime::parse_from_rfc3339(s)
                    .map(|date| date.with_timezone(&Utc))
                    .map_err(|_| {
                        self.fail(
                            ErrorKind::WrongType,
                            format!("expected date string to be ISO8601-formatted, found \"{s}\""),
                        )
                    });
            }
            DateStrategy::Formatted(format) => {
                let s = self.date_string()?;
                return DateTime::parse_from_str(s, format)
                    .map(|date| date.with_timezone(&Utc))
                    .or_else(|_| NaiveDateTime::parse_from_str(s, format).map(|naive| naive.and_utc()))
                    .or_else(|_| {
                        NaiveDate::parse_from_str(s, format)
                            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
                    })
                    .map_err(|_| {
                        self.fail(
                            ErrorKind::WrongType,
                            format!("date string \"{s}\" does not match format \"{format}\""),
                        )
                    });
            }
        };
        timestamp(seconds).ok_or_else(|| {
            self.fail(
                ErrorKind::NumberDoesNotFit,
                format!("timestamp {seconds} is outside the representable date range"),
            )
        })
    }

    /// Decode binary data according to the context's [`DataStrategy`].
    ///
    /// The returned buffer is owned by the caller.
    pub fn decode_data(&self) -> Result<Vec<u8>, DecodingError> {
        match self.context().options().data_strategy {
            DataStrategy::Base64 => {
                let Payload::String(s) = self.payload() else {
                    return Err(self.wrong_type("Data"));
                };
                STANDARD.decode(s.as_bytes()).map_err(|_| {
                    self.fail(ErrorKind::WrongType, "encountered data is not valid base64")
                })
            }
            DataStrategy::DeferredToData => {
                if !self.is_array() {
                    return Err(self.wrong_type("Data"));
                }
                self.iterator().map(|byte| byte.decode::<u8>()).collect()
            }
        }
    }

    /// The exact source text of a number node, for arbitrary-precision decimal types.
    pub fn decode_decimal_string(&self) -> Result<&'c str, DecodingError> {
        match self.payload() {
            Payload::Number { text, .. } => Ok(&**text),
            _ => Err(self.wrong_type("Decimal")),
        }
    }
}
