//! Path syntax transforms for the edgerules route compiler.
//!
//! Converts between the source framework's bracket syntax
//! (`/blog/[slug]`, `/docs/[...path]`, `/shop/[[...cat]]`) and the edge
//! engine's colon syntax (`/blog/:slug`, `/docs/:path+`, `/shop/:cat*`),
//! derives clean paths and build-scoped data routes, and wraps routes in
//! optional locale-capture groups.
//!
//! Everything in this crate is a pure function of its inputs: no I/O, no
//! shared state. The [`pattern`] module additionally compiles colon-syntax
//! patterns to regexes for concrete-path matching during classification.

mod format;
mod locale;
mod pattern;

pub use format::{
    DATA_ROUTE_PREFIX, RouteVariations, SOURCE_EXTENSIONS, get_data_route, get_route_variations,
    is_dynamic, to_clean_path, to_route_syntax,
};
pub use locale::Locales;
pub use pattern::{PatternError, has_named_capture, pattern_to_regex};
