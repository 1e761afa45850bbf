#![forbid(unsafe_code)]

use std::process::exit;

use tapejson::{Context, Decoder, NodeKind};

/// Deepest nesting level below `decoder`, counting containers only.
fn depth(decoder: Decoder<'_>) -> usize {
    match decoder.kind() {
        NodeKind::Array | NodeKind::Object => {
            1 + decoder.iterator().map(depth).max().unwrap_or(0)
        }
        _ => 0,
    }
}

/// Parse a JSON file and print the shape of its document tape. Useful to check whether
/// a file fits the default budget before decoding it. Single parameter is the file name.
fn main() {
    let path = match std::env::args()
        .nth(1)
        .ok_or("This program parses the given JSON file and prints its document shape, \
        can also be used as JSON validator. Expected a path to a JSON file as the first argument") {
        Ok(path) => path,
        Err(err) => {
            eprintln!("{err}");
            exit(1);
        }
    };

    let content = match std::fs::read(&path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Failed to read {path}: {err}");
            exit(2);
        }
    };

    let context = Context::new(content);
    let root = match context.create_document(false) {
        Ok(root) => root,
        Err(err) => {
            eprintln!("{path} invalid:\n{err}");
            exit(3);
        }
    };

    println!("root: {}", root.kind().describe());
    println!("children: {}", root.array_count());
    println!("nodes: {}", context.node_count());
    println!("depth: {}", depth(root));
}
