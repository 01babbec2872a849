/// Inline conditional.  Rust's `if` is already an expression, but
/// `cargo fmt` spreads it over five lines, and the border rules for
/// gradients and predecessor windows read far better as a table of
/// one-liners.
#[macro_export]
macro_rules! cq {
    ($condition: expr, $_true: expr, $_false: expr) => {
        if $condition {
            $_true
        } else {
            $_false
        }
    };
}
