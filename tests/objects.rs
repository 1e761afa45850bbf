use indoc::indoc;
use tapejson::{Context, snake_to_camel};

const SAMPLE: &str = indoc! {r#"
    {
        "zeta": 1,
        "alpha": {"nested": true},
        "mid": null,
        "beta": [1, 2, 3],
        "alpha_two": "x"
    }
"#};

#[test]
fn keys_and_pairs_follow_source_order() {
    let ctx = Context::new(SAMPLE.as_bytes());
    let root = ctx.create_document(false).unwrap();

    let keys = root.all_keys();
    assert_eq!(keys, ["zeta", "alpha", "mid", "beta", "alpha_two"]);

    let mut visited = Vec::new();
    root.for_all_key_value_pairs(|key, value| visited.push((key, value.kind())));
    let visited_keys: Vec<_> = visited.iter().map(|(key, _)| *key).collect();
    assert_eq!(visited_keys, keys);

    let iterated: Vec<_> = root.iterator().filter_map(|member| member.key()).collect();
    assert_eq!(iterated, keys);
    assert_eq!(root.array_count(), keys.len());
}

#[test]
fn duplicate_keys_keep_first_position_and_last_value() {
    let ctx = Context::new(&br#"{"a": 1, "b": 2, "a": 3}"#[..]);
    let root = ctx.create_document(false).unwrap();
    assert_eq!(root.all_keys(), ["a", "b"]);
    assert_eq!(root.decode_keyed::<u8>("a").unwrap(), 3);
}

#[test]
fn non_objects_have_no_keys() {
    let ctx = Context::new(&b"[1, 2]"[..]);
    let root = ctx.create_document(false).unwrap();
    assert!(root.all_keys().is_empty());
    let mut calls = 0;
    root.for_all_key_value_pairs(|_, _| calls += 1);
    assert_eq!(calls, 0);
    assert!(!root.contains("0"));
    assert!(root.fetch_value("0").is_none());
}

#[test]
fn snake_case_keys_convert_at_document_creation() {
    let json = indoc! {r#"
        {
            "user_id": 1,
            "first_name": "Ada",
            "_private": true,
            "trailing_": 0,
            "nested_obj": {"inner_key": [{"deep_key": null}]},
            "already_camel": "keepThis_value"
        }
    "#};
    let ctx = Context::new(json.as_bytes());
    let root = ctx.create_document(true).unwrap();

    assert_eq!(
        root.all_keys(),
        ["userId", "firstName", "_private", "trailing_", "nestedObj", "alreadyCamel"]
    );
    let deep = root
        .fetch_value("nestedObj")
        .and_then(|obj| obj.fetch_value("innerKey"))
        .and_then(|arr| arr.iterator().next())
        .unwrap();
    assert_eq!(deep.all_keys(), ["deepKey"]);
    // Values are never rewritten.
    assert_eq!(
        root.decode_keyed::<&str>("alreadyCamel").unwrap(),
        "keepThis_value"
    );
    assert!(!root.contains("user_id"));
    assert_eq!(
        root.fetch_value("nestedObj")
            .unwrap()
            .iterator()
            .next()
            .unwrap()
            .coding_path()
            .to_string(),
        "nestedObj.innerKey"
    );
}

#[test]
fn conversion_table() {
    let table = [
        ("", ""),
        ("_", "_"),
        ("__", "__"),
        ("a", "a"),
        ("a_b", "aB"),
        ("a__b", "aB"),
        ("snake_case_key", "snakeCaseKey"),
        ("_leading", "_leading"),
        ("__two_leading", "__twoLeading"),
        ("trailing_", "trailing_"),
        ("both_ends_", "bothEnds_"),
        ("with_1_digit", "with1Digit"),
        ("ALL_CAPS", "ALLCAPS"),
        ("camelCase", "camelCase"),
    ];
    for (input, expected) in table {
        assert_eq!(snake_to_camel(input), expected, "{input:?}");
        assert_eq!(snake_to_camel(expected), expected, "idempotent on {expected:?}");
    }
}

#[test]
fn keys_without_underscores_are_not_converted() {
    let ctx = Context::new(&br#"{"plain": 1, "MixedCase": 2}"#[..]);
    let root = ctx.create_document(true).unwrap();
    assert_eq!(root.all_keys(), ["plain", "MixedCase"]);
}
