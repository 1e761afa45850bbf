//! Decoding session state: the source bytes, the resolved configuration, the parsed
//! document and the single error slot.

use std::cell::{OnceCell, RefCell};

use tracing::{debug, trace};

use crate::decoder::Decoder;
use crate::document::{Document, NodeId};
use crate::error::{DecodingError, ErrorKind, ParseFailure, RetryReason};
use crate::options::{FloatSpellings, Options};

/// One decode session.
///
/// The context owns the source buffer and, once [`Context::create_document`] succeeds,
/// the parsed document. [`Decoder`] handles borrow the context, so none can outlive it.
///
/// A context is used by one caller at a time (it is `Send` but not `Sync`). Independent
/// contexts share nothing except the process-wide default float spellings.
///
/// The error slot holds at most one [`DecodingError`]. Recording a new error overwrites
/// the previous one.
#[derive(Debug)]
pub struct Context {
    source: Box<[u8]>,
    options: Options,
    spellings: FloatSpellings,
    document: OnceCell<Document>,
    error: RefCell<Option<DecodingError>>,
}

impl Context {
    /// Create a context with default options. Float spellings come from the
    /// process-wide default at this moment.
    pub fn new(source: impl Into<Box<[u8]>>) -> Self {
        Self::with_options(source, Options::default())
    }

    pub fn with_options(source: impl Into<Box<[u8]>>, options: Options) -> Self {
        let spellings = options.resolved_float_spellings();
        Self {
            source: source.into(),
            options,
            spellings,
            document: OnceCell::new(),
            error: RefCell::new(None),
        }
    }

    /// Shorthand for a context that only overrides the three sentinel spellings.
    pub fn with_spellings(
        source: impl Into<Box<[u8]>>,
        positive_infinity: &str,
        negative_infinity: &str,
        nan: &str,
    ) -> Self {
        let options = Options {
            float_spellings: Some(FloatSpellings::new(positive_infinity, negative_infinity, nan)),
            ..Options::default()
        };
        Self::with_options(source, options)
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Spellings captured when the context was created.
    pub fn float_spellings(&self) -> &FloatSpellings {
        &self.spellings
    }

    /// Parse the source buffer and return a handle to the document root.
    ///
    /// With `convert_case`, every object key is rewritten from `snake_case` to `camelCase`
    /// once, before the handle is returned.
    ///
    /// On failure no handle is produced, `JsonParsingFailed` is recorded in the error slot
    /// and the returned [`ParseFailure`] says why. Retrying (for example after stripping a
    /// byte-order mark) is up to the caller, with a fresh context.
    pub fn create_document(&self, convert_case: bool) -> Result<Decoder<'_>, ParseFailure> {
        if self.document.get().is_some() {
            return Err(ParseFailure::new(
                RetryReason::AlreadyParsed,
                "a document was already created for this context",
            ));
        }

        let mut document = match Document::parse(&self.source, &self.options.budget) {
            Ok(document) => document,
            Err(failure) => {
                debug!(reason = %failure.reason(), detail = failure.message(), "JSON parsing failed");
                self.record(DecodingError::new(ErrorKind::JsonParsingFailed, failure.to_string()));
                return Err(failure);
            }
        };

        let converted_keys = if convert_case { document.normalize_keys() } else { 0 };
        debug!(
            bytes = self.source.len(),
            nodes = document.node_count(),
            convert_case,
            converted_keys,
            "document created"
        );

        let document = self.document.get_or_init(|| document);
        Ok(Decoder::new(self, document, NodeId::ROOT))
    }

    /// Handle to the root of the parsed document, if one was created.
    pub fn root(&self) -> Option<Decoder<'_>> {
        self.decoder_at(NodeId::ROOT)
    }

    /// Resolve a node id (for example the one carried by a [`DecodingError`]) back to a handle.
    pub fn decoder_at(&self, node: NodeId) -> Option<Decoder<'_>> {
        let document = self.document.get()?;
        document
            .contains_node(node)
            .then(|| Decoder::new(self, document, node))
    }

    /// Number of nodes in the parsed document, 0 before a document was created.
    pub fn node_count(&self) -> usize {
        self.document.get().map_or(0, Document::node_count)
    }

    /// True when the error slot is occupied.
    pub fn error_did_occur(&self) -> bool {
        self.error.borrow().is_some()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.borrow().as_ref().map(DecodingError::kind)
    }

    /// Empty the error slot, typically after a recoverable error was handled with a default.
    pub fn clear_error(&self) {
        self.error.borrow_mut().take();
    }

    /// Read the current error as one atomic record: `Ok(())` when the slot is empty.
    ///
    /// The slot is left untouched; use [`Context::clear_error`] to empty it.
    pub fn process_error(&self) -> Result<(), DecodingError> {
        match self.error.borrow().as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Record an error decided by the caller, such as a missing mandatory key.
    ///
    /// `at` is the offending node; for a missing key pass the object and the key, and the
    /// recorded coding path ends with that key.
    pub fn report(
        &self,
        kind: ErrorKind,
        description: impl Into<String>,
        at: Option<Decoder<'_>>,
        key: Option<&str>,
    ) -> DecodingError {
        let mut err = DecodingError::new(kind, description);
        if let Some(decoder) = at {
            let mut path = decoder.coding_path();
            if let Some(key) = key {
                path = path.join(key);
            }
            err = err.at(decoder.node_id(), path);
        }
        if let Some(key) = key {
            err = err.with_key(key);
        }
        self.record(err)
    }

    /// Store `err` in the slot, replacing whatever was there, and hand it back.
    pub(crate) fn record(&self, err: DecodingError) -> DecodingError {
        trace!(kind = %err.kind(), path = %err.coding_path(), "decoding error recorded");
        *self.error.borrow_mut() = Some(err.clone());
        err
    }

    /// End the session, releasing the document. Handles cannot outlive this call.
    pub fn release(self) {
        trace!(nodes = self.node_count(), "context released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_slot_is_overwritten() {
        let ctx = Context::new(&b"{}"[..]);
        assert!(!ctx.error_did_occur());
        ctx.report(ErrorKind::KeyDoesNotExist, "first", None, Some("a"));
        ctx.report(ErrorKind::WrongType, "second", None, None);
        let err = ctx.process_error().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongType);
        assert_eq!(err.description(), "second");
        assert_eq!(err.key(), None);
        ctx.clear_error();
        assert!(ctx.process_error().is_ok());
        assert_eq!(ctx.error_kind(), None);
    }

    #[test]
    fn second_document_is_refused() {
        let ctx = Context::new(&b"[1]"[..]);
        assert!(ctx.create_document(false).is_ok());
        let err = ctx.create_document(false).unwrap_err();
        assert_eq!(err.reason(), RetryReason::AlreadyParsed);
        assert!(ctx.root().is_some());
    }

    #[test]
    fn failure_records_parsing_error() {
        let ctx = Context::new(&b"{\"a\":"[..]);
        assert!(ctx.create_document(false).is_err());
        assert_eq!(ctx.error_kind(), Some(ErrorKind::JsonParsingFailed));
        assert!(ctx.root().is_none());
    }

    #[test]
    fn decoder_at_checks_bounds() {
        let ctx = Context::new(&b"[true]"[..]);
        assert!(ctx.decoder_at(NodeId(1)).is_none());
        ctx.create_document(false).unwrap();
        assert!(ctx.decoder_at(NodeId(1)).is_some_and(|d| d.is_bool()));
        assert!(ctx.decoder_at(NodeId(2)).is_none());
    }
}
