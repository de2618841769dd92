//! Route compilation for the edge request-routing layer.
//!
//! Orchestrates the manifest loader, path formatter, and page classifier
//! into an ordered rule list plus a prerender warm-up list. Rules are
//! emitted in a strict order; later steps may add more specific or
//! overlapping rules, which the consuming engine composes rather than
//! resolving first-match-wins.
//!
//! The compiler holds no mutable state. One compilation pass reads a loaded
//! [`BuildManifests`](edgerules_manifest::BuildManifests) and produces a
//! [`CompiledRoutes`]; [`ActiveRules`] publishes completed passes atomically
//! so in-flight rule evaluation never observes a partial set.

mod active;
mod compile;
mod error;
mod options;
mod rule;

pub use active::ActiveRules;
pub use compile::{Classification, CompiledRoutes, compile};
pub use error::CompileError;
pub use options::CompilerOptions;
pub use rule::{
    Action, CachePolicy, Condition, MatchCriteria, Method, ONE_DAY, ONE_HOUR, ONE_YEAR, PathMatch,
    Rule,
};
