#![no_main]

use libfuzzer_sys::fuzz_target;
use tapejson::{Context, RetryReason};

// Build documents nested as deep as the input asks. Anything beyond the depth budget
// must be refused with NestingTooDeep, never overflow the stack.
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 || data.len() > 4096 {
        return;
    }
    let depth = usize::from(u16::from_le_bytes([data[0], data[1]]));
    let shape: Vec<bool> = data[2..].iter().cycle().take(depth).map(|b| b & 1 == 0).collect();

    let mut json = String::with_capacity(depth * 8);
    for (idx, is_array) in shape.iter().enumerate() {
        if *is_array {
            json.push('[');
        } else {
            json.push_str(&format!("{{\"k_{idx}\":"));
        }
    }
    json.push_str("null");
    for is_array in shape.iter().rev() {
        json.push(if *is_array { ']' } else { '}' });
    }

    let ctx = Context::new(json.as_bytes());
    match ctx.create_document(true) {
        Ok(root) => {
            let mut node = root;
            while let Some(child) = node.iterator().next() {
                node = child;
            }
            assert!(node.is_null());
            assert_eq!(node.coding_path().len(), depth);
        }
        Err(failure) => {
            assert!(depth >= 128, "unexpected failure at depth {depth}");
            assert_eq!(failure.reason(), RetryReason::NestingTooDeep);
        }
    }
});
