//! Error taxonomy: decode errors recorded against a context, parse failures reported by the
//! external parser boundary, and the crate-level error surfaced by the Serde entry points.
use std::fmt;

use serde::de;

use crate::document::NodeId;
use crate::path::CodingPath;

/// Classification of a decode error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The object lacks the requested key.
    KeyDoesNotExist,
    /// The key (or array slot) is present but holds null, or nothing, where a value is required.
    ValueDoesNotExist,
    /// A number is present but does not fit the requested width.
    NumberDoesNotFit,
    /// The node kind does not match the requested coercion.
    WrongType,
    /// The input is not valid JSON.
    JsonParsingFailed,
}

impl ErrorKind {
    /// `KeyDoesNotExist` and `ValueDoesNotExist` can be answered with a default value;
    /// the other kinds invalidate the subtree.
    pub fn is_recoverable(self) -> bool {
        matches!(self, ErrorKind::KeyDoesNotExist | ErrorKind::ValueDoesNotExist)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::KeyDoesNotExist => "key does not exist",
            ErrorKind::ValueDoesNotExist => "value does not exist",
            ErrorKind::NumberDoesNotFit => "number does not fit",
            ErrorKind::WrongType => "wrong type",
            ErrorKind::JsonParsingFailed => "JSON parsing failed",
        })
    }
}

/// A decode error as held in a context's error slot.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodingError {
    pub(crate) kind: ErrorKind,
    pub(crate) description: String,
    pub(crate) key: Option<String>,
    pub(crate) coding_path: CodingPath,
    pub(crate) node: Option<NodeId>,
}

impl DecodingError {
    pub(crate) fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            key: None,
            coding_path: CodingPath::root(),
            node: None,
        }
    }

    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub(crate) fn at(mut self, node: NodeId, coding_path: CodingPath) -> Self {
        self.node = Some(node);
        self.coding_path = coding_path;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The offending key, for `KeyDoesNotExist` and keyed `ValueDoesNotExist` errors.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Path to the offending node. For a missing key this is the path of the object
    /// followed by the key.
    pub fn coding_path(&self) -> &CodingPath {
        &self.coding_path
    }

    /// The offending node; resolve it with [`crate::Context::decoder_at`] to re-inspect it.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

impl fmt::Display for DecodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_with_path(f, &self.description, &self.coding_path)
    }
}

impl std::error::Error for DecodingError {}

/// Why the external parser rejected the input. Tells the caller whether another attempt
/// (after stripping a byte-order mark, raising a budget, ...) may succeed.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RetryReason {
    /// The input starts with a UTF-8 byte-order mark, which JSON does not allow.
    ByteOrderMark,
    /// Grammar violation.
    Syntax,
    /// The input ended before the document was complete.
    TruncatedInput,
    /// Arrays and objects are nested deeper than the parser or the budget allows.
    NestingTooDeep,
    /// Input size or node count exceeds the configured budget.
    BudgetExceeded,
    /// This context already holds a parsed document.
    AlreadyParsed,
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RetryReason::ByteOrderMark => "input starts with a byte-order mark",
            RetryReason::Syntax => "syntax error",
            RetryReason::TruncatedInput => "input is truncated",
            RetryReason::NestingTooDeep => "nesting too deep",
            RetryReason::BudgetExceeded => "budget exceeded",
            RetryReason::AlreadyParsed => "document already parsed",
        })
    }
}

/// The external parser rejected the input; no document handle exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseFailure {
    pub(crate) reason: RetryReason,
    pub(crate) message: String,
    /// 1-indexed line, 0 when unknown.
    pub(crate) line: usize,
    /// 1-indexed column, 0 when unknown.
    pub(crate) column: usize,
}

impl ParseFailure {
    pub(crate) fn new(reason: RetryReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
            line: 0,
            column: 0,
        }
    }

    pub(crate) fn from_json_error(err: &serde_json::Error) -> Self {
        use serde_json::error::Category;

        let message = err.to_string();
        let reason = match err.classify() {
            Category::Eof => RetryReason::TruncatedInput,
            _ if message.starts_with("recursion limit exceeded") => RetryReason::NestingTooDeep,
            _ => RetryReason::Syntax,
        };
        Self {
            reason,
            message,
            line: err.line(),
            column: err.column(),
        }
    }

    pub fn reason(&self) -> RetryReason {
        self.reason
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `(line, column)` of the failure when the parser reported one.
    pub fn position(&self) -> Option<(usize, usize)> {
        if self.line == 0 {
            None
        } else {
            Some((self.line, self.column))
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the given data was not valid JSON ({}): {}", self.reason, self.message)
    }
}

impl std::error::Error for ParseFailure {}

/// Error type compatible with `serde::de::Error`.
#[derive(Debug)]
pub enum Error {
    /// A coercion or lookup failed.
    Decoding(DecodingError),
    /// The input could not be parsed.
    Parse(ParseFailure),
    /// Free-form error raised by a `Deserialize` implementation.
    Message { msg: String, path: CodingPath },
}

impl Error {
    pub(crate) fn msg<S: Into<String>>(s: S) -> Self {
        Error::Message {
            msg: s.into(),
            path: CodingPath::root(),
        }
    }

    /// The decode error kind, if any. Parse failures report `JsonParsingFailed`;
    /// free-form messages report `None`.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Decoding(err) => Some(err.kind),
            Error::Parse(_) => Some(ErrorKind::JsonParsingFailed),
            Error::Message { .. } => None,
        }
    }

    /// Where in the document the error occurred, when known.
    pub fn coding_path(&self) -> Option<&CodingPath> {
        match self {
            Error::Decoding(err) => Some(&err.coding_path),
            Error::Message { path, .. } => Some(path),
            Error::Parse(_) => None,
        }
    }

    /// True when no location is attached yet.
    pub(crate) fn needs_path(&self) -> bool {
        match self {
            Error::Decoding(err) => err.node.is_none() && err.coding_path.is_empty(),
            Error::Message { path, .. } => path.is_empty(),
            Error::Parse(_) => false,
        }
    }

    /// Attach `set_path` unless a location is already known.
    pub(crate) fn with_path(mut self, set_path: CodingPath) -> Self {
        if !self.needs_path() {
            return self;
        }
        match &mut self {
            Error::Decoding(err) => err.coding_path = set_path,
            Error::Message { path, .. } => *path = set_path,
            Error::Parse(_) => {}
        }
        self
    }

    /// The key of a `KeyDoesNotExist` error raised by a derived `Deserialize` (via
    /// [`de::Error::missing_field`]) that has not been located yet.
    pub(crate) fn unlocated_missing_key(&self) -> Option<&str> {
        match self {
            Error::Decoding(err) if err.kind == ErrorKind::KeyDoesNotExist && err.node.is_none() => {
                err.key.as_deref()
            }
            _ => None,
        }
    }
}

impl From<DecodingError> for Error {
    fn from(err: DecodingError) -> Self {
        Error::Decoding(err)
    }
}

impl From<ParseFailure> for Error {
    fn from(err: ParseFailure) -> Self {
        Error::Parse(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Decoding(err) => fmt::Display::fmt(err, f),
            Error::Parse(err) => fmt::Display::fmt(err, f),
            Error::Message { msg, path } => fmt_with_path(f, msg, path),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decoding(err) => Some(err),
            Error::Parse(err) => Some(err),
            Error::Message { .. } => None,
        }
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::msg(msg.to_string())
    }

    fn missing_field(field: &'static str) -> Self {
        Error::Decoding(
            DecodingError::new(
                ErrorKind::KeyDoesNotExist,
                format!("no value associated with key \"{field}\""),
            )
            .with_key(field),
        )
    }
}

/// Print a message suffixed with " at <path>" unless the path is the root.
fn fmt_with_path(f: &mut fmt::Formatter<'_>, msg: &str, path: &CodingPath) -> fmt::Result {
    if path.is_empty() {
        write!(f, "{msg}")
    } else {
        write!(f, "{msg} at {path}")
    }
}
