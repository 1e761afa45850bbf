use serde::Deserialize;
use tapejson::{Context, ErrorKind, FloatSpellings, options};

#[test]
fn configured_spellings_yield_special_values() {
    let ctx = Context::with_spellings(
        &br#"["+Infinity", "-Infinity", "NaN", "inf", 1.5]"#[..],
        "+Infinity",
        "-Infinity",
        "NaN",
    );
    let root = ctx.create_document(false).unwrap();
    let mut values = root.iterator();

    assert_eq!(values.decode_next::<f64>().unwrap(), f64::INFINITY);
    assert_eq!(values.decode_next::<f32>().unwrap(), f32::NEG_INFINITY);
    assert!(values.decode_next::<f64>().unwrap().is_nan());

    let err = values.decode_next::<f64>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongType);
    assert_eq!(err.coding_path().to_string(), "[3]");
    values.advance();
    assert_eq!(values.decode_next::<f64>().unwrap(), 1.5);
}

#[test]
fn spellings_only_apply_to_float_requests() {
    let ctx = Context::with_spellings(&br#"["inf"]"#[..], "inf", "-inf", "nan");
    let root = ctx.create_document(false).unwrap();
    let item = root.iterator().next().unwrap();
    assert_eq!(item.decode::<&str>().unwrap(), "inf");
    assert_eq!(item.decode::<i64>().unwrap_err().kind(), ErrorKind::WrongType);
}

#[test]
fn partial_spellings_disable_the_rest() {
    let options = options! {
        float_spellings: Some(FloatSpellings {
            nan: Some("n/a".to_owned()),
            ..FloatSpellings::NONE
        }),
    };
    let ctx = Context::with_options(&br#"["n/a", "Infinity"]"#[..], options);
    let root = ctx.create_document(false).unwrap();
    let items: Vec<_> = root.iterator().collect();
    assert!(items[0].decode::<f64>().unwrap().is_nan());
    assert_eq!(items[1].decode::<f64>().unwrap_err().kind(), ErrorKind::WrongType);
}

#[test]
fn serde_targets_see_sentinels() {
    #[derive(Deserialize)]
    struct Sample {
        low: f64,
        high: f32,
        regular: f64,
    }

    let options = options! {
        float_spellings: Some(FloatSpellings::new("inf", "-inf", "nan")),
    };
    let sample: Sample = tapejson::from_str_with_options(
        r#"{"low": "-inf", "high": "inf", "regular": -0.25}"#,
        options,
    )
    .unwrap();
    assert_eq!(sample.low, f64::NEG_INFINITY);
    assert_eq!(sample.high, f32::INFINITY);
    assert_eq!(sample.regular, -0.25);
}
