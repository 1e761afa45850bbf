//! Public macros for constructing option structs without relying on struct literal syntax.
//!
//! Call sites stay valid when fields are added to [`crate::Options`] or [`crate::Budget`].

/// Construct [`crate::Options`] from `Default` and a list of field assignments.
///
/// ```rust
/// use tapejson::DateStrategy;
///
/// let options = tapejson::options! {
///     convert_snake_case: true,
///     date_strategy: DateStrategy::SecondsSince1970,
/// };
/// assert!(options.convert_snake_case);
/// ```
#[macro_export]
macro_rules! options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::Options::default();
        $(
            #[allow(deprecated)]
            {
                opt.$field = $value;
            }
        )*
        opt
    }};
}

/// Construct [`crate::Budget`] from `Default` and a list of field assignments.
///
/// ```rust
/// let budget = tapejson::budget! {
///     max_depth: 16,
/// };
/// let options = tapejson::options! { budget: budget };
/// assert_eq!(options.budget.max_depth, 16);
/// ```
#[macro_export]
macro_rules! budget {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut budget = $crate::Budget::default();
        $(
            {
                budget.$field = $value;
            }
        )*
        budget
    }};
}
