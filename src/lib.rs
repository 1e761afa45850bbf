//! Typed decoding over a parsed JSON document.
//!
//! A [`Context`] owns the source bytes and, after [`Context::create_document`], a flat
//! tape of nodes. [`Decoder`] handles address one node each: probe its kind, iterate its
//! children, or coerce it into a Rust scalar. Failures are returned and also kept in the
//! context's single error slot, together with the coding path of the offending node.
//!
//! ```rust
//! use tapejson::{Context, ErrorKind};
//!
//! let ctx = Context::new(&br#"{"user_id": 7, "tags": ["a", null]}"#[..]);
//! let root = ctx.create_document(true).unwrap();
//!
//! assert_eq!(root.decode_keyed::<u32>("userId").unwrap(), 7);
//! let mut tags = root.fetch_value("tags").unwrap().iterator();
//! assert_eq!(tags.decode_next::<&str>().unwrap(), "a");
//! let err = tags.decode_next::<&str>().unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::ValueDoesNotExist);
//! assert_eq!(err.coding_path().to_string(), "tags[1]");
//! ```
//!
//! The same machinery backs a Serde deserializer: [`from_str`], [`from_slice`] and their
//! `_with_options` variants.

pub use context::Context;
pub use de::{
    Deserializer, from_decoder, from_slice, from_slice_with_options, from_str, from_str_with_options,
};
pub use decoder::Decoder;
pub use document::{NodeId, NodeKind};
pub use error::{DecodingError, Error, ErrorKind, ParseFailure, RetryReason};
pub use iter::Iter;
pub use key_case::snake_to_camel;
pub use options::{
    Budget, DataStrategy, DateStrategy, FloatSpellings, Options, default_floating_point_spellings,
    update_floating_point_spellings,
};
pub use path::{CodingPath, PathSegment};
pub use scalars::FromDecoder;

mod context;
pub mod de;
mod decoder;
mod document;
pub mod error;
mod iter;
mod key_case;
mod macros;
pub mod options;
mod path;
mod scalars;
