//! Decoder handles: borrowed, copyable references to one node of a parsed document.
//!
//! The expected call shape is probe, then act: ask [`Decoder::kind`] (or one of the
//! `is_*` probes), then either iterate a container or request a scalar coercion.
//! Lookups never record errors on a miss; they return `None`/`false` and the caller
//! decides whether the miss matters. The keyed and unkeyed `decode_*` helpers make that
//! decision for the common "value is mandatory" case.

use std::fmt;

use crate::context::Context;
use crate::document::{Document, NodeId, NodeKind, NumberValue, Payload};
use crate::error::{DecodingError, ErrorKind};
use crate::iter::Iter;
use crate::path::CodingPath;
use crate::scalars::FromDecoder;

/// Handle to one node of a document owned by a [`Context`].
#[derive(Clone, Copy)]
pub struct Decoder<'c> {
    context: &'c Context,
    document: &'c Document,
    node: NodeId,
}

impl<'c> Decoder<'c> {
    pub(crate) fn new(context: &'c Context, document: &'c Document, node: NodeId) -> Self {
        Self {
            context,
            document,
            node,
        }
    }

    pub fn context(&self) -> &'c Context {
        self.context
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub(crate) fn document(&self) -> &'c Document {
        self.document
    }

    pub(crate) fn payload(&self) -> &'c Payload {
        &self.document.node(self.node).payload
    }

    pub(crate) fn with_node(self, node: NodeId) -> Self {
        Self { node, ..self }
    }

    /// An independent handle to the same node.
    pub fn create_copy(&self) -> Decoder<'c> {
        *self
    }

    pub fn kind(&self) -> NodeKind {
        self.payload().kind()
    }

    /// True for the JSON `null` literal, whatever type the caller expects.
    pub fn decode_nil(&self) -> bool {
        self.is_null()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.payload(), Payload::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.payload(), Payload::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self.payload(), Payload::Number { .. })
    }

    /// A number written without fraction or exponent that fits 64 bits (signed or unsigned).
    pub fn is_integer(&self) -> bool {
        matches!(
            self.payload(),
            Payload::Number {
                value: NumberValue::Int(_) | NumberValue::UInt(_),
                ..
            }
        )
    }

    /// A number that is not an [integer](Decoder::is_integer).
    pub fn is_double(&self) -> bool {
        matches!(
            self.payload(),
            Payload::Number {
                value: NumberValue::Float(_),
                ..
            }
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self.payload(), Payload::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.payload(), Payload::Array { .. })
    }

    pub fn is_dictionary(&self) -> bool {
        matches!(self.payload(), Payload::Object { .. })
    }

    /// Number of array elements or object entries; 0 for scalars.
    pub fn array_count(&self) -> usize {
        match self.payload() {
            Payload::Array { len } | Payload::Object { len } => *len,
            _ => 0,
        }
    }

    /// True for a container without children. Scalars are not empty.
    pub fn is_empty(&self) -> bool {
        matches!(
            self.payload(),
            Payload::Array { len: 0 } | Payload::Object { len: 0 }
        )
    }

    /// Sequential traversal of array elements or object values.
    ///
    /// Check [`is_array`](Decoder::is_array) / [`is_dictionary`](Decoder::is_dictionary)
    /// first: for a scalar the iterator is already at its end.
    pub fn iterator(&self) -> Iter<'c> {
        Iter::new(*self)
    }

    /// The key under which this node is stored in its parent object.
    pub fn key(&self) -> Option<&'c str> {
        self.document.node(self.node).key.as_deref()
    }

    /// The containing array or object.
    pub fn parent(&self) -> Option<Decoder<'c>> {
        self.document
            .node(self.node)
            .parent
            .map(|parent| self.with_node(parent))
    }

    /// Whether this object has `key` (compared against keys as normalized at parse time).
    /// A key holding `null` counts as present. Always false for non-objects.
    pub fn contains(&self, key: &str) -> bool {
        self.fetch_value(key).is_some()
    }

    /// The value stored under `key`, or `None` on a miss. Does not touch the error slot.
    pub fn fetch_value(&self, key: &str) -> Option<Decoder<'c>> {
        if !self.is_dictionary() {
            return None;
        }
        self.iterator().find(|member| member.key() == Some(key))
    }

    /// Object keys in source order.
    pub fn all_keys(&self) -> Vec<&'c str> {
        if !self.is_dictionary() {
            return Vec::new();
        }
        self.iterator().filter_map(|member| member.key()).collect()
    }

    /// Invoke `callback` once per object entry, in source order (the order of
    /// [`all_keys`](Decoder::all_keys)).
    pub fn for_all_key_value_pairs<F>(&self, mut callback: F)
    where
        F: FnMut(&'c str, Decoder<'c>),
    {
        if !self.is_dictionary() {
            return;
        }
        for member in self.iterator() {
            if let Some(key) = member.key() {
                callback(key, member);
            }
        }
    }

    /// Keys and indices from the document root to this node.
    pub fn coding_path(&self) -> CodingPath {
        self.document.coding_path(self.node)
    }

    /// True when the owning context holds an error.
    pub fn document_error_did_occur(&self) -> bool {
        self.context.error_did_occur()
    }

    /// Coerce this node into `T`. Type mismatches and overflow are recorded in the
    /// context and returned.
    pub fn decode<T: FromDecoder<'c>>(self) -> Result<T, DecodingError> {
        T::from_decoder(self)
    }

    /// Decode the mandatory member `key` of this object.
    ///
    /// A missing key records `KeyDoesNotExist`, a `null` value records `ValueDoesNotExist`.
    /// Called on anything but an object it records `WrongType`.
    pub fn decode_keyed<T: FromDecoder<'c>>(self, key: &str) -> Result<T, DecodingError> {
        if !self.is_dictionary() {
            return Err(self.wrong_type("a dictionary"));
        }
        let Some(value) = self.fetch_value(key) else {
            return Err(self.missing_key(key));
        };
        if value.is_null() {
            let err = value
                .error(
                    ErrorKind::ValueDoesNotExist,
                    format!("expected {} value but found null instead", T::TYPE_NAME),
                )
                .with_key(key);
            return Err(self.context.record(err));
        }
        value.decode()
    }

    /// Decode the optional member `key`: a missing key or a `null` value yields `None`.
    /// Called on anything but an object it records `WrongType`.
    pub fn decode_keyed_if_present<T: FromDecoder<'c>>(
        self,
        key: &str,
    ) -> Result<Option<T>, DecodingError> {
        if !self.is_dictionary() {
            return Err(self.wrong_type("a dictionary"));
        }
        match self.fetch_value(key) {
            Some(value) if !value.is_null() => value.decode().map(Some),
            _ => Ok(None),
        }
    }

    /// Error located at this node, not yet recorded.
    pub(crate) fn error(&self, kind: ErrorKind, description: impl Into<String>) -> DecodingError {
        DecodingError::new(kind, description).at(self.node, self.coding_path())
    }

    /// Record an error located at this node and return it.
    pub(crate) fn fail(&self, kind: ErrorKind, description: impl Into<String>) -> DecodingError {
        self.context.record(self.error(kind, description))
    }

    /// Record `KeyDoesNotExist` for `key` on this object.
    pub(crate) fn missing_key(&self, key: &str) -> DecodingError {
        let err = DecodingError::new(
            ErrorKind::KeyDoesNotExist,
            format!("no value associated with key \"{key}\""),
        )
        .with_key(key)
        .at(self.node, self.coding_path().join(key));
        self.context.record(err)
    }

    /// Record `WrongType` for a request of `expected`.
    pub(crate) fn wrong_type(&self, expected: &str) -> DecodingError {
        self.fail(
            ErrorKind::WrongType,
            format!(
                "expected to decode {expected} but found {} instead",
                self.kind().describe()
            ),
        )
    }
}

impl fmt::Debug for Decoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("node", &self.node.offset())
            .field("kind", &self.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_report_node_kinds() {
        let ctx = Context::new(&br#"[null, true, 1, 1.5, "s", [], {}]"#[..]);
        let root = ctx.create_document(false).unwrap();
        let kinds: Vec<_> = root.iterator().map(|d| d.kind()).collect();
        assert_eq!(
            kinds,
            [
                NodeKind::Null,
                NodeKind::Bool,
                NodeKind::Number,
                NodeKind::Number,
                NodeKind::String,
                NodeKind::Array,
                NodeKind::Object
            ]
        );
        let items: Vec<_> = root.iterator().collect();
        assert!(items[0].decode_nil());
        assert!(items[2].is_integer() && !items[2].is_double());
        assert!(items[3].is_double() && !items[3].is_integer());
        assert!(items[5].is_empty() && items[6].is_empty());
        assert!(!items[1].is_empty());
        assert_eq!(root.array_count(), 7);
    }

    #[test]
    fn contains_ignores_value_nullness() {
        let ctx = Context::new(&br#"{"a": null, "b": 0}"#[..]);
        let root = ctx.create_document(false).unwrap();
        assert!(root.contains("a"));
        assert!(root.contains("b"));
        assert!(!root.contains("c"));
        assert!(!ctx.error_did_occur());
        assert!(root.fetch_value("c").is_none());
        assert!(!ctx.error_did_occur());
    }

    #[test]
    fn keyed_helpers_distinguish_missing_and_null() {
        let ctx = Context::new(&br#"{"a": null, "b": 5}"#[..]);
        let root = ctx.create_document(false).unwrap();

        let err = root.decode_keyed::<i32>("c").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyDoesNotExist);
        assert_eq!(err.key(), Some("c"));
        assert_eq!(err.coding_path().to_string(), "c");

        let err = root.decode_keyed::<i32>("a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueDoesNotExist);
        assert_eq!(ctx.error_kind(), Some(ErrorKind::ValueDoesNotExist));

        ctx.clear_error();
        assert_eq!(root.decode_keyed::<i32>("b").unwrap(), 5);
        assert_eq!(root.decode_keyed_if_present::<i32>("a").unwrap(), None);
        assert_eq!(root.decode_keyed_if_present::<i32>("c").unwrap(), None);
        assert_eq!(root.decode_keyed_if_present::<i32>("b").unwrap(), Some(5));
        assert!(!ctx.error_did_occur());
    }

    #[test]
    fn keyed_helpers_need_an_object() {
        let ctx = Context::new(&br#"{"list": [1, 2], "n": 3}"#[..]);
        let root = ctx.create_document(false).unwrap();
        let list = root.fetch_value("list").unwrap();

        let err = list.decode_keyed::<i32>("a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongType);
        assert_eq!(
            err.description(),
            "expected to decode a dictionary but found an array instead"
        );
        assert_eq!(err.coding_path().to_string(), "list");
        assert_eq!(ctx.error_kind(), Some(ErrorKind::WrongType));

        ctx.clear_error();
        let n = root.fetch_value("n").unwrap();
        let err = n.decode_keyed_if_present::<i32>("a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongType);
        assert_eq!(err.coding_path().to_string(), "n");
    }

    #[test]
    fn copies_and_parents_address_the_same_tree() {
        let ctx = Context::new(&br#"{"outer": {"inner": [1, 2]}}"#[..]);
        let root = ctx.create_document(false).unwrap();
        let inner = root
            .fetch_value("outer")
            .and_then(|outer| outer.fetch_value("inner"))
            .unwrap();
        let copy = inner.create_copy();
        assert_eq!(copy.node_id(), inner.node_id());
        assert_eq!(copy.key(), Some("inner"));
        assert_eq!(copy.parent().and_then(|p| p.key()), Some("outer"));
        assert!(root.parent().is_none());
    }
}
