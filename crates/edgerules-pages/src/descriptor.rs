//! Page descriptor types.

use edgerules_manifest::Revalidate;
use serde::Serialize;

/// Render strategy assigned to a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageType {
    /// Rendered by the origin on every request.
    Ssr,
    /// Prerendered at build time.
    Ssg,
    /// Prerendered dynamic page whose non-enumerated paths are generated on
    /// first request and then cached indefinitely.
    Isg,
    /// Like [`PageType::Isg`] but with a revalidation window.
    Isr,
    /// API-namespace endpoint.
    Api,
    /// Reserved framework template, not routable.
    Template,
}

impl PageType {
    /// True for strategies whose freshness the origin owns.
    ///
    /// These pages must never receive a compiler-imposed edge TTL; the
    /// origin's own freshness header passes through untouched.
    #[must_use]
    pub fn is_origin_authoritative(self) -> bool {
        matches!(self, Self::Ssr | Self::Api)
    }
}

/// Fallback policy for a dynamic prerendered page's non-enumerated paths.
///
/// Registry encoding: `null` → [`Blocking`](Self::Blocking), a placeholder
/// asset path → [`Placeholder`](Self::Placeholder), `false` →
/// [`NotFound`](Self::NotFound).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Block until the page is rendered, then cache it.
    Blocking,
    /// Serve a placeholder immediately, swap in the real page when ready.
    Placeholder,
    /// Non-enumerated paths are permanently not found.
    NotFound,
}

/// One concrete, fully-resolved instance of a page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PrerenderedRouteEntry {
    /// Concrete framework-native path (possibly locale-prefixed).
    pub concrete_path: String,
    /// Edge-syntax route; no parameter is left open beyond the page's own
    /// declared dynamic segments.
    pub route: String,
    /// Build-scoped data path, when the page has a data-fetch function.
    pub data_route: Option<String>,
    /// Revalidation marker; `None` means the output is never checked again.
    pub revalidate: Option<Revalidate>,
}

impl PrerenderedRouteEntry {
    /// True if this instance may be served from a pre-baked artifact
    /// without consulting the origin.
    #[must_use]
    pub fn is_never_checked(&self) -> bool {
        self.revalidate.is_none()
    }
}

/// One routable page with its classification.
///
/// Immutable after construction; the route compiler only reads these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageDescriptor {
    /// Framework-native page name, possibly locale-prefixed.
    pub name: String,
    /// `name` with any configured locale prefix stripped.
    pub name_without_locale: String,
    /// Edge-syntax route.
    pub route: String,
    /// `route` wrapped in an optional locale-capture group.
    pub localized_route: String,
    /// Data-endpoint route, when the page has a data-fetch function.
    pub data_route: Option<String>,
    /// Localized variant of `data_route`.
    pub localized_data_route: Option<String>,
    /// True if the name contains dynamic bracket segments.
    pub is_dynamic: bool,
    /// True if any prerender signal holds for this page.
    pub is_prerendered: bool,
    /// True iff at least one prerendered entry has a finite window.
    pub has_revalidation: bool,
    /// Concrete prerendered instances; empty unless `is_prerendered`.
    pub prerendered_routes: Vec<PrerenderedRouteEntry>,
    /// Fallback policy; set only for prerendered dynamic pages.
    pub fallback: Option<FallbackPolicy>,
    /// Placeholder asset for [`FallbackPolicy::Placeholder`].
    pub fallback_page: Option<String>,
    /// Assigned render strategy.
    pub page_type: PageType,
    /// Emitted asset from the page registry.
    pub page_source: String,
}

impl PageDescriptor {
    /// True if request freshness must be decided by the origin.
    ///
    /// Covers SSR and API pages plus revalidating ISR pages; none of these
    /// may carry a compiler-imposed edge TTL.
    #[must_use]
    pub fn is_origin_authoritative(&self) -> bool {
        self.page_type.is_origin_authoritative()
            || (self.page_type == PageType::Isr && self.has_revalidation)
    }
}
