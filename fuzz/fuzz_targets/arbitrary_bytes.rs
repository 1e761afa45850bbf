#![no_main]

use std::collections::BTreeMap;

use libfuzzer_sys::fuzz_target;
use serde::Deserialize;
use tapejson::{Context, Decoder};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
enum Shape {
    Unit,
    Value(f64),
    Pair(i32, u8),
    Named { name: String },
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Doc {
    id: Option<u64>,
    name: Option<String>,
    items: Option<Vec<i16>>,
    shape: Option<Shape>,
    extra: Option<BTreeMap<String, bool>>,
}

/// Touch every node through the handle API, requesting every scalar coercion.
fn walk(node: Decoder<'_>) {
    let _ = node.decode::<i64>();
    let _ = node.decode::<u8>();
    let _ = node.decode::<f32>();
    let _ = node.decode::<&str>();
    let _ = node.decode::<bool>();
    let _ = node.decode_decimal_string();
    let _ = node.coding_path().to_string();
    let _ = node.all_keys();
    for child in node.iterator() {
        assert_eq!(child.parent().map(|p| p.node_id()), Some(node.node_id()));
        walk(child);
    }
}

// Arbitrary input must either fail to parse or produce a document whose every node can
// be visited and coerced without panicking.
fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }

    let ctx = Context::new(data);
    if let Ok(root) = ctx.create_document(data.first().is_some_and(|b| b & 1 == 1)) {
        walk(root);
    }

    let _ = tapejson::from_slice::<Doc>(data);
    let _ = tapejson::from_slice::<Vec<Shape>>(data);
});
