//! Sequential traversal of array elements and object entries.
//!
//! An iterator is a position plus a cursor into the document tape. Advancing jumps the
//! cursor past the current child's subtree, so every step is O(1). The end state is
//! `position == len`; advancing there is a no-op.

use crate::decoder::Decoder;
use crate::document::NodeId;
use crate::error::{DecodingError, ErrorKind};
use crate::scalars::FromDecoder;

/// Cursor over the children of one array or object.
///
/// Arrays are visited in index order, objects in source order. There is one natural
/// order per container, so an iterator is restarted by asking the container for a new one.
#[derive(Debug)]
pub struct Iter<'c> {
    container: Decoder<'c>,
    len: usize,
    position: usize,
    cursor: NodeId,
}

impl<'c> Iter<'c> {
    pub(crate) fn new(container: Decoder<'c>) -> Self {
        let document = container.document();
        let len = container.array_count();
        let cursor = document
            .first_child(container.node_id())
            .unwrap_or_else(|| document.next_sibling(container.node_id()));
        Self {
            container,
            len,
            position: 0,
            cursor,
        }
    }

    /// The array or object being traversed.
    pub fn container(&self) -> Decoder<'c> {
        self.container
    }

    /// Zero-based index of the current child; equals [`len`](Iter::len) at the end.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of children in the container.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.len
    }

    /// Handle to the current child, `None` at the end.
    pub fn current(&self) -> Option<Decoder<'c>> {
        (!self.is_at_end()).then(|| self.container.with_node(self.cursor))
    }

    /// Key of the current object entry.
    pub fn key(&self) -> Option<&'c str> {
        self.current().and_then(|child| child.key())
    }

    /// Move to the next sibling. No-op at the end.
    pub fn advance(&mut self) {
        if self.is_at_end() {
            return;
        }
        self.position += 1;
        if !self.is_at_end() {
            self.cursor = self.container.document().next_sibling(self.cursor);
        }
    }

    /// Decode the current element as a mandatory value and advance.
    ///
    /// At the end, or on `null`, records `ValueDoesNotExist`. Coercion failures are
    /// recorded by the coercion itself; the iterator then stays on the failed element.
    pub fn decode_next<T: FromDecoder<'c>>(&mut self) -> Result<T, DecodingError> {
        let Some(current) = self.current() else {
            let err = DecodingError::new(
                ErrorKind::ValueDoesNotExist,
                format!("expected {} but unkeyed container is at end", T::TYPE_NAME),
            )
            .at(
                self.container.node_id(),
                self.container.coding_path().join(self.position),
            );
            return Err(self.container.context().record(err));
        };
        if current.is_null() {
            return Err(current.fail(
                ErrorKind::ValueDoesNotExist,
                format!("expected {} value but found null instead", T::TYPE_NAME),
            ));
        }
        let value = current.decode()?;
        self.advance();
        Ok(value)
    }

    /// Decode the current element as an optional value and advance. `null` yields `None`.
    pub fn decode_next_if_present<T: FromDecoder<'c>>(&mut self) -> Result<Option<T>, DecodingError> {
        match self.current() {
            Some(current) if current.is_null() => {
                self.advance();
                Ok(None)
            }
            Some(_) => self.decode_next().map(Some),
            None => Ok(None),
        }
    }
}

impl<'c> Iterator for Iter<'c> {
    type Item = Decoder<'c>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current()?;
        self.advance();
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
