//! Boundary with the external grammar parser and the immutable document tape built from
//! its output.
//!
//! `serde_json` validates the grammar. Its value tree is then moved, node by node, into a
//! flat pre-order tape and dropped. Every node is addressed by a [`NodeId`] (its tape
//! index) and records:
//! - its payload (scalar value, or element/entry count for containers),
//! - its parent and its ordinal inside the parent,
//! - its key when it is an object member,
//! - `next`: the index one past its subtree, which is where its next sibling starts.
//!
//! The tape never changes after construction, except for the one-shot key normalization
//! pass that runs before any handle is created.

use serde_json::{Number, Value};

use crate::error::{ParseFailure, RetryReason};
use crate::key_case;
use crate::options::Budget;
use crate::path::{CodingPath, PathSegment};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Position of a node inside its document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);

    /// Zero-based tape offset.
    pub fn offset(self) -> usize {
        self.0
    }
}

/// The closed set of node kinds a probe can discover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl NodeKind {
    /// Article-prefixed name used in type mismatch messages.
    pub fn describe(self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Bool => "a bool",
            NodeKind::Number => "a number",
            NodeKind::String => "a string",
            NodeKind::Array => "an array",
            NodeKind::Object => "a dictionary",
        }
    }
}

/// Parsed representation of a number node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum NumberValue {
    /// Integer literal that fits `i64`.
    Int(i64),
    /// Integer literal above `i64::MAX` that fits `u64`.
    UInt(u64),
    /// Literal with a fraction or exponent, or an integer outside the 64-bit range.
    Float(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Payload {
    Null,
    Bool(bool),
    Number {
        value: NumberValue,
        /// Exact source spelling of the number.
        text: Box<str>,
    },
    String(Box<str>),
    Array {
        len: usize,
    },
    Object {
        len: usize,
    },
}

impl Payload {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Payload::Null => NodeKind::Null,
            Payload::Bool(_) => NodeKind::Bool,
            Payload::Number { .. } => NodeKind::Number,
            Payload::String(_) => NodeKind::String,
            Payload::Array { .. } => NodeKind::Array,
            Payload::Object { .. } => NodeKind::Object,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Node {
    pub(crate) payload: Payload,
    pub(crate) parent: Option<NodeId>,
    pub(crate) ordinal: usize,
    pub(crate) key: Option<Box<str>>,
    pub(crate) next: usize,
}

/// An immutable parsed JSON document.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Run the external parser over `bytes` and build the tape.
    ///
    /// Budget limits on input size are checked before parsing; node count and depth are
    /// checked while the tape is built.
    pub(crate) fn parse(bytes: &[u8], budget: &Budget) -> Result<Self, ParseFailure> {
        if bytes.starts_with(UTF8_BOM) {
            return Err(ParseFailure::new(
                RetryReason::ByteOrderMark,
                "input starts with a UTF-8 byte-order mark",
            ));
        }
        if bytes.len() > budget.max_input_bytes {
            return Err(ParseFailure::new(
                RetryReason::BudgetExceeded,
                format!(
                    "input is {} bytes, budget allows {}",
                    bytes.len(),
                    budget.max_input_bytes
                ),
            ));
        }

        let value: Value =
            serde_json::from_slice(bytes).map_err(|err| ParseFailure::from_json_error(&err))?;

        let mut builder = TapeBuilder {
            nodes: Vec::new(),
            budget,
        };
        builder.push(value, None, 0, None, 0)?;
        Ok(Document {
            nodes: builder.nodes,
        })
    }

    /// Rewrite every object key from `snake_case` to `camelCase`. Returns the number of
    /// keys that changed.
    pub(crate) fn normalize_keys(&mut self) -> usize {
        self.nodes
            .iter_mut()
            .filter_map(|node| node.key.as_mut())
            .map(key_case::normalize_in_place)
            .filter(|changed| *changed)
            .count()
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn contains_node(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// First child of a container, if it has any.
    pub(crate) fn first_child(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id).payload {
            Payload::Array { len } | Payload::Object { len } if len > 0 => Some(NodeId(id.0 + 1)),
            _ => None,
        }
    }

    /// Where the sibling after `id` starts. Only meaningful while `id` is not the last
    /// child of its parent.
    pub(crate) fn next_sibling(&self, id: NodeId) -> NodeId {
        NodeId(self.node(id).next)
    }

    /// Rebuild the path from the root by walking parent links.
    pub(crate) fn coding_path(&self, id: NodeId) -> CodingPath {
        let mut path = CodingPath::root();
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            let node = self.node(current);
            path.push(match &node.key {
                Some(key) => PathSegment::Key(key.to_string()),
                None => PathSegment::Index(node.ordinal),
            });
            current = parent;
        }
        path.reverse();
        path
    }
}

struct TapeBuilder<'b> {
    nodes: Vec<Node>,
    budget: &'b Budget,
}

impl TapeBuilder<'_> {
    /// Append `value` and its subtree. Recursion depth is bounded by the budget depth,
    /// which is checked before descending.
    fn push(
        &mut self,
        value: Value,
        parent: Option<NodeId>,
        ordinal: usize,
        key: Option<Box<str>>,
        depth: usize,
    ) -> Result<(), ParseFailure> {
        if self.nodes.len() >= self.budget.max_nodes {
            return Err(ParseFailure::new(
                RetryReason::BudgetExceeded,
                format!("document has more than {} nodes", self.budget.max_nodes),
            ));
        }
        let id = NodeId(self.nodes.len());

        let payload = match value {
            Value::Null => Payload::Null,
            Value::Bool(b) => Payload::Bool(b),
            Value::Number(n) => number_payload(&n)?,
            Value::String(s) => Payload::String(s.into_boxed_str()),
            Value::Array(items) => {
                self.check_depth(depth)?;
                self.open(Payload::Array { len: items.len() }, parent, ordinal, key);
                for (idx, item) in items.into_iter().enumerate() {
                    self.push(item, Some(id), idx, None, depth + 1)?;
                }
                self.close(id);
                return Ok(());
            }
            Value::Object(entries) => {
                self.check_depth(depth)?;
                self.open(Payload::Object { len: entries.len() }, parent, ordinal, key);
                for (idx, (member_key, item)) in entries.into_iter().enumerate() {
                    self.push(item, Some(id), idx, Some(member_key.into_boxed_str()), depth + 1)?;
                }
                self.close(id);
                return Ok(());
            }
        };

        self.nodes.push(Node {
            payload,
            parent,
            ordinal,
            key,
            next: id.0 + 1,
        });
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<(), ParseFailure> {
        let limit = self.budget.max_depth.min(Budget::PARSER_DEPTH_LIMIT);
        if depth >= limit {
            return Err(ParseFailure::new(
                RetryReason::NestingTooDeep,
                format!("nesting exceeds {limit} levels"),
            ));
        }
        Ok(())
    }

    fn open(&mut self, payload: Payload, parent: Option<NodeId>, ordinal: usize, key: Option<Box<str>>) {
        let next = self.nodes.len() + 1;
        self.nodes.push(Node {
            payload,
            parent,
            ordinal,
            key,
            next,
        });
    }

    fn close(&mut self, id: NodeId) {
        let end = self.nodes.len();
        self.nodes[id.0].next = end;
    }
}

fn number_payload(n: &Number) -> Result<Payload, ParseFailure> {
    // With `arbitrary_precision` the display form is the literal from the source.
    let text = n.to_string();
    let value = match (n.as_i64(), n.as_u64()) {
        (Some(v), _) if !text.contains(['.', 'e', 'E']) => NumberValue::Int(v),
        (None, Some(v)) if !text.contains(['.', 'e', 'E']) => NumberValue::UInt(v),
        _ => NumberValue::Float(parse_float_literal(&text)?),
    };
    Ok(Payload::Number {
        value,
        text: text.into_boxed_str(),
    })
}

/// Read a number literal as a double. Literals beyond the f64 range become infinite.
fn parse_float_literal(text: &str) -> Result<f64, ParseFailure> {
    text.parse().map_err(|_| {
        ParseFailure::new(
            RetryReason::Syntax,
            format!("number literal <{text}> is not a valid double"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Document {
        Document::parse(json.as_bytes(), &Budget::default()).expect("valid JSON")
    }

    #[test]
    fn tape_layout_is_preorder_with_subtree_ends() {
        let doc = parse(r#"{"a":[1,{"b":2}],"c":null}"#);
        // 0:{ 1:a=[ 2:1 3:{ 4:b=2 5:c=null
        assert_eq!(doc.node_count(), 6);
        assert_eq!(doc.node(NodeId(0)).next, 6);
        assert_eq!(doc.node(NodeId(1)).next, 5);
        assert_eq!(doc.node(NodeId(3)).next, 5);
        assert_eq!(doc.next_sibling(NodeId(1)), NodeId(5));
        assert_eq!(doc.node(NodeId(5)).key.as_deref(), Some("c"));
        assert_eq!(doc.node(NodeId(3)).ordinal, 1);
        assert_eq!(doc.first_child(NodeId(2)), None);
    }

    #[test]
    fn coding_path_walks_parents() {
        let doc = parse(r#"{"a":[{"b":1}]}"#);
        let path = doc.coding_path(NodeId(3));
        assert_eq!(path.to_string(), "a[0].b");
        assert!(doc.coding_path(NodeId::ROOT).is_empty());
    }

    #[test]
    fn numbers_keep_source_text() {
        let doc = parse("[1, -2, 18446744073709551615, 1.50, 1e3, 123456789012345678901234567890]");
        let numbers: Vec<_> = (1..=6)
            .map(|idx| match &doc.node(NodeId(idx)).payload {
                Payload::Number { value, text } => (*value, text.to_string()),
                other => panic!("expected number, got {other:?}"),
            })
            .collect();
        assert_eq!(numbers[0], (NumberValue::Int(1), "1".to_owned()));
        assert_eq!(numbers[1], (NumberValue::Int(-2), "-2".to_owned()));
        assert_eq!(numbers[2].0, NumberValue::UInt(u64::MAX));
        assert_eq!(numbers[3], (NumberValue::Float(1.5), "1.50".to_owned()));
        assert_eq!(numbers[4].0, NumberValue::Float(1000.0));
        assert!(matches!(numbers[5].0, NumberValue::Float(v) if v > 1e29));
        assert_eq!(numbers[5].1, "123456789012345678901234567890");
    }

    #[test]
    fn rejects_byte_order_mark() {
        let err = Document::parse(b"\xEF\xBB\xBF{}", &Budget::default()).unwrap_err();
        assert_eq!(err.reason(), RetryReason::ByteOrderMark);
    }

    #[test]
    fn enforces_budget() {
        let budget = Budget {
            max_nodes: 3,
            ..Budget::default()
        };
        let err = Document::parse(b"[1,2,3]", &budget).unwrap_err();
        assert_eq!(err.reason(), RetryReason::BudgetExceeded);

        let budget = Budget {
            max_depth: 2,
            ..Budget::default()
        };
        assert!(Document::parse(b"[[1]]", &budget).is_ok());
        let err = Document::parse(b"[[[1]]]", &budget).unwrap_err();
        assert_eq!(err.reason(), RetryReason::NestingTooDeep);

        let budget = Budget {
            max_input_bytes: 4,
            ..Budget::default()
        };
        let err = Document::parse(b"[1, 2]", &budget).unwrap_err();
        assert_eq!(err.reason(), RetryReason::BudgetExceeded);
    }

    #[test]
    fn classifies_parser_failures() {
        let err = Document::parse(b"[1, 2", &Budget::default()).unwrap_err();
        assert_eq!(err.reason(), RetryReason::TruncatedInput);
        let err = Document::parse(b"[1,]", &Budget::default()).unwrap_err();
        assert_eq!(err.reason(), RetryReason::Syntax);
        assert!(err.position().is_some());
        let deep = "[".repeat(1000) + &"]".repeat(1000);
        let err = Document::parse(deep.as_bytes(), &Budget::default()).unwrap_err();
        assert_eq!(err.reason(), RetryReason::NestingTooDeep);
    }

    fn nested(levels: usize) -> String {
        "[".repeat(levels) + &"]".repeat(levels)
    }

    #[test]
    fn default_depth_boundary() {
        let budget = Budget::default();
        assert!(Document::parse(nested(127).as_bytes(), &budget).is_ok());
        let err = Document::parse(nested(128).as_bytes(), &budget).unwrap_err();
        assert_eq!(err.reason(), RetryReason::NestingTooDeep);

        let generous = Budget {
            max_depth: 1000,
            ..Budget::default()
        };
        assert!(Document::parse(nested(127).as_bytes(), &generous).is_ok());
        let err = Document::parse(nested(200).as_bytes(), &generous).unwrap_err();
        assert_eq!(err.reason(), RetryReason::NestingTooDeep);

        let tight = Budget {
            max_depth: 5,
            ..Budget::default()
        };
        assert!(Document::parse(nested(5).as_bytes(), &tight).is_ok());
        let err = Document::parse(nested(6).as_bytes(), &tight).unwrap_err();
        assert_eq!(err.message(), "nesting exceeds 5 levels");
    }

    #[test]
    fn float_literals_never_turn_into_nan() {
        assert_eq!(parse_float_literal("1e400"), Ok(f64::INFINITY));
        assert_eq!(parse_float_literal("-2.5"), Ok(-2.5));
        let err = parse_float_literal("1.2.3").unwrap_err();
        assert_eq!(err.reason(), RetryReason::Syntax);
    }

    #[test]
    fn normalizes_keys_once() {
        let mut doc = parse(r#"{"first_name":"a","_id":1,"nested":{"last_name":"b"}}"#);
        assert_eq!(doc.normalize_keys(), 2);
        assert_eq!(doc.node(NodeId(1)).key.as_deref(), Some("firstName"));
        assert_eq!(doc.node(NodeId(2)).key.as_deref(), Some("_id"));
        assert_eq!(doc.node(NodeId(4)).key.as_deref(), Some("lastName"));
        assert_eq!(doc.normalize_keys(), 0);
    }
}
