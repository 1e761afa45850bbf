use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// String spellings that stand in for the floating-point values JSON cannot express.
///
/// When a string node holds exactly one of these spellings, decoding it as `f64`/`f32`
/// yields the corresponding special value instead of a type mismatch. A `None` spelling
/// disables that special value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatSpellings {
    pub positive_infinity: Option<String>,
    pub negative_infinity: Option<String>,
    pub nan: Option<String>,
}

impl FloatSpellings {
    /// No spellings: special values encoded as strings are rejected.
    pub const NONE: Self = Self {
        positive_infinity: None,
        negative_infinity: None,
        nan: None,
    };

    pub fn new(
        positive_infinity: impl Into<String>,
        negative_infinity: impl Into<String>,
        nan: impl Into<String>,
    ) -> Self {
        Self {
            positive_infinity: Some(positive_infinity.into()),
            negative_infinity: Some(negative_infinity.into()),
            nan: Some(nan.into()),
        }
    }

    /// Match `text` against the configured spellings.
    pub(crate) fn special_value(&self, text: &str) -> Option<f64> {
        if self.positive_infinity.as_deref() == Some(text) {
            Some(f64::INFINITY)
        } else if self.negative_infinity.as_deref() == Some(text) {
            Some(f64::NEG_INFINITY)
        } else if self.nan.as_deref() == Some(text) {
            Some(f64::NAN)
        } else {
            None
        }
    }
}

static DEFAULT_FLOAT_SPELLINGS: RwLock<FloatSpellings> = RwLock::new(FloatSpellings::NONE);

/// Replace the process-wide default spellings used by contexts that carry no override.
///
/// Last writer wins. Set this once before any decoding starts; contexts already created
/// keep the spellings they captured.
pub fn update_floating_point_spellings(spellings: FloatSpellings) {
    let mut slot = DEFAULT_FLOAT_SPELLINGS
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = spellings;
}

/// Snapshot of the process-wide default spellings.
pub fn default_floating_point_spellings() -> FloatSpellings {
    DEFAULT_FLOAT_SPELLINGS
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// How dates are represented in the document.
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateStrategy {
    /// Number of seconds since 2001-01-01T00:00:00Z.
    #[default]
    DeferredToDate,
    /// Number of seconds since the Unix epoch.
    SecondsSince1970,
    /// Number of milliseconds since the Unix epoch.
    MillisecondsSince1970,
    /// RFC 3339 / ISO 8601 string such as `2024-05-01T12:00:00Z`.
    Iso8601,
    /// String in a `chrono` format. Formats without an offset are read as UTC.
    Formatted(String),
}

/// How binary data is represented in the document.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataStrategy {
    /// Standard-alphabet, padded base64 string.
    #[default]
    Base64,
    /// Array of integers, each in `0..=255`.
    DeferredToData,
}

/// Resource limits applied while the document tape is built.
///
/// The defaults accept any realistic payload while stopping inputs designed to exhaust
/// memory or the stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Maximum size of the input in bytes.
    ///
    /// Default: 64 MiB
    pub max_input_bytes: usize,
    /// Maximum number of nodes (every scalar and container counts as one).
    ///
    /// Default: 10,000,000
    pub max_nodes: usize,
    /// Maximum nesting depth of arrays and objects.
    ///
    /// The parser refuses anything nested deeper than [`Budget::PARSER_DEPTH_LIMIT`]
    /// on its own, so larger values behave like that limit.
    ///
    /// Default: 127
    pub max_depth: usize,
}

impl Budget {
    /// Deepest nesting `serde_json` accepts before reporting a recursion limit.
    pub const PARSER_DEPTH_LIMIT: usize = 127;
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_input_bytes: 64 * 1024 * 1024,
            max_nodes: 10_000_000,
            max_depth: Self::PARSER_DEPTH_LIMIT,
        }
    }
}

/// Decoding configuration.
///
/// ```rust
/// use serde::Deserialize;
/// use tapejson::options::{DateStrategy, FloatSpellings};
///
/// #[derive(Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Reading {
///     sensor_id: u32,
///     value: f64,
/// }
///
/// let options = tapejson::options! {
///     convert_snake_case: true,
///     float_spellings: Some(FloatSpellings::new("inf", "-inf", "nan")),
///     date_strategy: DateStrategy::Iso8601,
/// };
///
/// let json = r#"{"sensor_id": 7, "value": "inf"}"#;
/// let reading: Reading = tapejson::from_str_with_options(json, options).unwrap();
/// assert_eq!(reading.sensor_id, 7);
/// assert!(reading.value.is_infinite());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Per-context sentinel spellings. `None` uses the process-wide default
    /// (see [`update_floating_point_spellings`]).
    pub float_spellings: Option<FloatSpellings>,
    /// Rewrite `snake_case` object keys to `camelCase` once, right after parsing.
    /// Default: false.
    pub convert_snake_case: bool,
    pub date_strategy: DateStrategy,
    pub data_strategy: DataStrategy,
    /// Limits enforced while building the document.
    pub budget: Budget,
}

impl Options {
    /// Spellings this configuration resolves to: the override, or the process-wide default.
    pub fn resolved_float_spellings(&self) -> FloatSpellings {
        match &self.float_spellings {
            Some(spellings) => spellings.clone(),
            None => default_floating_point_spellings(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default() {
        let opts = Options::default();
        assert!(opts.float_spellings.is_none());
        assert!(!opts.convert_snake_case);
        assert_eq!(opts.date_strategy, DateStrategy::DeferredToDate);
        assert_eq!(opts.data_strategy, DataStrategy::Base64);
        assert_eq!(opts.budget.max_depth, 127);
    }

    #[test]
    fn special_value_matches_exact_spelling_only() {
        let spellings = FloatSpellings::new("+Infinity", "-Infinity", "NaN");
        assert_eq!(spellings.special_value("+Infinity"), Some(f64::INFINITY));
        assert_eq!(spellings.special_value("-Infinity"), Some(f64::NEG_INFINITY));
        assert!(spellings.special_value("NaN").is_some_and(f64::is_nan));
        assert_eq!(spellings.special_value("nan"), None);
        assert_eq!(spellings.special_value("Infinity"), None);
        assert_eq!(FloatSpellings::NONE.special_value(""), None);
    }

    #[test]
    fn override_wins_over_default() {
        let opts = Options {
            float_spellings: Some(FloatSpellings::new("a", "b", "c")),
            ..Options::default()
        };
        assert_eq!(opts.resolved_float_spellings().nan.as_deref(), Some("c"));
    }
}
