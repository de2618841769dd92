//! Page classification for the edgerules route compiler.
//!
//! Turns the loaded manifests into one immutable [`PageDescriptor`] per
//! routable page: render-strategy type, fallback policy, and the concrete
//! prerendered instances (with default-locale aliases). Descriptors are
//! built once per compilation pass and are read-only to the route compiler;
//! a new pass fully replaces the set.

mod builder;
mod descriptor;
mod evidence;

pub use builder::build_descriptors;
pub use descriptor::{FallbackPolicy, PageDescriptor, PageType, PrerenderedRouteEntry};
pub use evidence::PrerenderEvidence;
