//! Build-artifact loading for the edgerules route compiler.
//!
//! Reads a framework build's manifest files into normalized in-memory
//! structures ([`BuildManifests`]), snapshots the disk state the compiler
//! needs (prerendered HTML artifacts, public assets) so no I/O happens after
//! loading, and provides the development-mode fallback: scanning a source
//! page tree directly and watching it for changes.
//!
//! # Manifest files
//!
//! | File | Required | Contents |
//! |---|---|---|
//! | `pages-manifest.json` | yes | abstract page path → emitted asset |
//! | `prerender-manifest.json` | yes | concrete/dynamic prerender registry |
//! | `routes-manifest.json` | yes | redirects, rewrites, locales, route regexes |
//! | `middleware-manifest.json` | no | request-time matcher list |
//! | `images-manifest.json` | no | remote-image allow-list |
//! | `BUILD_ID` | yes | opaque build identifier token |
//!
//! Missing required files are fatal ([`ManifestError`]); missing optional
//! files fall back to empty defaults with a logged warning.

mod debounce;
mod dev;
mod error;
mod loader;
mod schema;
mod watch;

pub use dev::DevPageSource;
pub use error::ManifestError;
pub use loader::BuildManifests;
pub use schema::{
    ConditionKind, DynamicRouteEntry, FallbackField, ImagesManifest, MiddlewareManifest,
    MiddlewareMatcher, PrerenderManifest, PrerenderedEntry, RedirectRule, RemotePatternConfig,
    Revalidate, RouteCondition, RoutePattern, RoutesManifest, RewriteRule, RewritesField,
};
pub use watch::{ChangeEvent, ChangeKind, ChangeReceiver, WatchHandle};
