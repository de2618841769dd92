//! Prerender evidence aggregation.
//!
//! Whether a page is prerendered cannot be read off a single manifest
//! field: pure-static pages only show up through their emitted asset,
//! enumerated dynamic pages only through the prerender registry, and some
//! builds leave nothing but the artifact on disk. Each signal is collected
//! explicitly and the page counts as prerendered if any one of them holds.

use edgerules_manifest::BuildManifests;
use edgerules_paths::Locales;

/// The four independent prerender signals for one page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrerenderEvidence {
    /// The emitted asset carries the static-file marker extension.
    pub static_asset_marker: bool,
    /// The concrete path appears in the prerender registry under its
    /// locale-qualified key.
    pub concrete_registry_entry: bool,
    /// The abstract path appears in the registry's dynamic-route table.
    pub dynamic_registry_entry: bool,
    /// A prerendered HTML artifact was found on disk at load time.
    pub disk_artifact: bool,
}

impl PrerenderEvidence {
    /// Collect all four signals for a page.
    #[must_use]
    pub fn collect(
        name: &str,
        asset: &str,
        manifests: &BuildManifests,
        locales: &Locales,
    ) -> Self {
        let name_without_locale = locales.strip(name);
        // Pre-localized names pass through unchanged; locale-free names get
        // the default-locale prefix the registry keys by.
        let qualified = locales.qualify(name);

        Self {
            static_asset_marker: asset.ends_with(".html"),
            concrete_registry_entry: manifests.prerender.routes.contains_key(&qualified),
            dynamic_registry_entry: manifests
                .prerender
                .dynamic_routes
                .contains_key(&name_without_locale),
            disk_artifact: manifests.has_static_artifact(name)
                || manifests.has_static_artifact(&qualified),
        }
    }

    /// True if any signal holds. No single signal is authoritative for all
    /// render strategies, hence the OR.
    #[must_use]
    pub fn any(self) -> bool {
        self.static_asset_marker
            || self.concrete_registry_entry
            || self.dynamic_registry_entry
            || self.disk_artifact
    }
}

#[cfg(test)]
mod tests {
    use edgerules_manifest::{DynamicRouteEntry, PrerenderedEntry};

    use super::*;

    fn en_locales() -> Locales {
        Locales::new(vec!["en".to_owned()], Some("en".to_owned()))
    }

    #[test]
    fn test_no_signals() {
        let manifests = BuildManifests::default();

        let evidence =
            PrerenderEvidence::collect("/about", "pages/about.js", &manifests, &Locales::none());

        assert_eq!(evidence, PrerenderEvidence::default());
        assert!(!evidence.any());
    }

    #[test]
    fn test_static_asset_marker_signal() {
        let manifests = BuildManifests::default();

        let evidence =
            PrerenderEvidence::collect("/about", "pages/about.html", &manifests, &Locales::none());

        assert!(evidence.static_asset_marker);
        assert!(evidence.any());
    }

    #[test]
    fn test_concrete_registry_signal_uses_locale_qualified_key() {
        let mut manifests = BuildManifests::default();
        manifests
            .prerender
            .routes
            .insert("/en/about".to_owned(), PrerenderedEntry::default());

        let evidence =
            PrerenderEvidence::collect("/about", "pages/about.js", &manifests, &en_locales());

        assert!(evidence.concrete_registry_entry);
        assert!(evidence.any());
    }

    #[test]
    fn test_dynamic_registry_signal() {
        let mut manifests = BuildManifests::default();
        manifests
            .prerender
            .dynamic_routes
            .insert("/blog/[slug]".to_owned(), DynamicRouteEntry::default());

        let evidence = PrerenderEvidence::collect(
            "/blog/[slug]",
            "pages/blog/[slug].js",
            &manifests,
            &Locales::none(),
        );

        assert!(evidence.dynamic_registry_entry);
        assert!(!evidence.static_asset_marker);
        assert!(evidence.any());
    }

    #[test]
    fn test_disk_artifact_signal() {
        let mut manifests = BuildManifests::default();
        manifests.static_artifacts.insert("/about".to_owned());

        let evidence =
            PrerenderEvidence::collect("/about", "pages/about.js", &manifests, &Locales::none());

        assert!(evidence.disk_artifact);
        assert!(evidence.any());
    }

    #[test]
    fn test_signals_combine() {
        let mut manifests = BuildManifests::default();
        manifests
            .prerender
            .routes
            .insert("/about".to_owned(), PrerenderedEntry::default());
        manifests.static_artifacts.insert("/about".to_owned());

        let evidence =
            PrerenderEvidence::collect("/about", "pages/about.html", &manifests, &Locales::none());

        assert!(evidence.static_asset_marker);
        assert!(evidence.concrete_registry_entry);
        assert!(evidence.disk_artifact);
        assert!(!evidence.dynamic_registry_entry);
        assert!(evidence.any());
    }
}
