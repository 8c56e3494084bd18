mod parallelize_op;

pub use parallelize_op::{ParallelConfig, WindowDispatcher};

/// `access_check!(condition, message...)`
///
/// Descriptive assertion for the pixel-level fast paths. Active
/// when `debug_assertions` are on or when the crate is built with
/// the `checked-access` feature; compiled out otherwise, leaving
/// only the flat buffer's own bound.
///
/// ```rust, ignore
/// access_check!(
///     is_point_inside(&self.size, coord),
///     "Pixel {} outside of image of size {}", coord, self.size
/// );
/// ```
macro_rules! access_check {
    ($cond : expr, $($arg : tt)+) => {
        if cfg!(any(debug_assertions, feature = "checked-access")) {
            assert!($cond, $($arg)+);
        }
    };
}

pub (crate) use access_check;
