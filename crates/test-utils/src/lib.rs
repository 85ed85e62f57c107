//! Test support shared by the tiling crates.
//!
//! - [`generators`]: regular time axes and synthetic series (constant,
//!   linear ramp, gapped)
//! - [`fixtures`]: grid cells, reference stations and the GeoJSON documents
//!   the loaders read
//! - `assert_approx_eq!` for float comparisons
//!
//! Pull it in as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

/// Assert two floats differ by at most `epsilon` (default `1e-9`).
///
/// ```ignore
/// assert_approx_eq!(slope, 0.05, 1e-12);
/// assert_approx_eq!(mean, 1.5);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_approx_eq!($left, $right, 1e-9)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (l, r, eps) = ($left as f64, $right as f64, $epsilon as f64);
        if !((l - r).abs() <= eps) {
            panic!("assertion failed: {} ≈ {} (|diff| = {} > {})", l, r, (l - r).abs(), eps);
        }
    }};
}
