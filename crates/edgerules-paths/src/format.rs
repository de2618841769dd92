//! Bracket-syntax to edge-syntax conversion and data-route derivation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::locale::Locales;

/// Source extensions stripped by [`to_clean_path`].
///
/// `.html` is included because pure-static pages are registered with their
/// emitted asset name rather than a server entry point.
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "html"];

/// Namespace prefix for build-scoped data routes.
///
/// The build id segment makes every data path unique per deploy, which is
/// what allows the compiler to give these routes a permanent browser TTL.
pub const DATA_ROUTE_PREFIX: &str = "/__edge__/data";

/// Placeholder for the build id segment before a build exists (dev mode).
const BUILD_ID_PLACEHOLDER: &str = ":build";

static OPTIONAL_CATCH_ALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[\.\.\.([^\]]+)\]\]").unwrap());
static CATCH_ALL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\.\.\.([^\]]+)\]").unwrap());
static PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").unwrap());

/// Route spellings derived from a single page name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteVariations {
    /// Edge-syntax route for the page itself.
    pub route: String,
    /// `route` wrapped in an optional locale-capture group.
    ///
    /// Identical to `route` when no locales are configured or the page name
    /// is already locale-prefixed.
    pub localized_route: String,
    /// Build-scoped data-endpoint route.
    pub data_route: String,
    /// Localized variant of `data_route`.
    pub localized_data_route: String,
}

/// True if a page name contains dynamic bracket segments.
#[must_use]
pub fn is_dynamic(name: &str) -> bool {
    name.contains('[')
}

/// Normalize a page path to a clean URL path.
///
/// Strips a trailing source extension, collapses a trailing `index` segment,
/// removes duplicate slashes, and guarantees a leading `/`.
///
/// # Examples
///
/// - `"index.js"` → `"/"`
/// - `"blog/[slug].tsx"` → `"/blog/[slug]"`
/// - `"//a///b"` → `"/a/b"`
#[must_use]
pub fn to_clean_path(path: &str) -> String {
    let mut clean = String::with_capacity(path.len() + 1);
    clean.push('/');
    let mut prev_slash = true;
    for ch in path.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        clean.push(ch);
    }

    if clean.len() > 1 && clean.ends_with('/') {
        clean.pop();
    }

    // Strip a known source extension, but only from the final segment.
    if let Some((stem, ext)) = clean.rsplit_once('.')
        && !ext.contains('/')
        && !stem.ends_with('/')
        && stem.len() > 1
        && SOURCE_EXTENSIONS.contains(&ext)
    {
        clean.truncate(stem.len());
    }

    if clean == "/index" {
        return "/".to_owned();
    }
    if let Some(stripped) = clean.strip_suffix("/index")
        && !stripped.is_empty()
    {
        return stripped.to_owned();
    }
    clean
}

/// Convert a bracket-syntax page name to an edge colon-syntax route.
///
/// - `[name]` becomes `:name` (exactly one segment)
/// - `[...name]` becomes `:name+` (one or more segments)
/// - `[[...name]]` becomes `:name*` (zero or more segments)
///
/// The result is passed through [`to_clean_path`].
#[must_use]
pub fn to_route_syntax(name: &str) -> String {
    let route = OPTIONAL_CATCH_ALL.replace_all(name, ":$1*");
    let route = CATCH_ALL.replace_all(&route, ":$1+");
    let route = PARAM.replace_all(&route, ":$1");
    to_clean_path(&route)
}

/// Derive the data-endpoint route for a page.
///
/// The path is prefixed by [`DATA_ROUTE_PREFIX`] and a build-scoped segment;
/// when no build id is available yet (dev mode) a `:build` placeholder
/// parameter stands in. The root page maps to `/index` before the `.json`
/// suffix is applied.
#[must_use]
pub fn get_data_route(name: &str, build_id: Option<&str>) -> String {
    let route = to_route_syntax(name);
    let build = build_id.unwrap_or(BUILD_ID_PLACEHOLDER);
    let inner = if route == "/" { "/index" } else { route.as_str() };
    format!("{DATA_ROUTE_PREFIX}/{build}{inner}.json")
}

/// Compute all route spellings for a page name.
///
/// The localized variants wrap the route in an optional locale-capture group
/// unless `name` already starts with a configured locale (so pre-localized
/// manifest keys are never double-wrapped). The localized data route keeps
/// the locale group optional, which is what makes the bare `/index.json` at
/// the root reachable through the same pattern as the per-locale variants.
#[must_use]
pub fn get_route_variations(
    name: &str,
    build_id: Option<&str>,
    locales: &Locales,
) -> RouteVariations {
    let route = to_route_syntax(name);
    let build = build_id.unwrap_or(BUILD_ID_PLACEHOLDER);

    let already_localized = locales.locale_of(name).is_some();
    let localized_route = match locales.capture_group() {
        Some(group) if !already_localized => {
            if route == "/" {
                format!("/{group}")
            } else {
                format!("/{group}{route}")
            }
        }
        _ => route.clone(),
    };

    let data_inner = if route == "/" { "/index" } else { route.as_str() };
    let data_route = format!("{DATA_ROUTE_PREFIX}/{build}{data_inner}.json");
    let localized_data_route = match locales.capture_group() {
        Some(group) if !already_localized => {
            format!("{DATA_ROUTE_PREFIX}/{build}/{group}{data_inner}.json")
        }
        _ => data_route.clone(),
    };

    RouteVariations {
        route,
        localized_route,
        data_route,
        localized_data_route,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn locales(list: &[&str], default: &str) -> Locales {
        Locales::new(
            list.iter().map(|l| (*l).to_owned()).collect(),
            Some(default.to_owned()),
        )
    }

    #[test]
    fn test_to_clean_path_root_index() {
        assert_eq!(to_clean_path("index.js"), "/");
        assert_eq!(to_clean_path("/index"), "/");
        assert_eq!(to_clean_path("index"), "/");
    }

    #[test]
    fn test_to_clean_path_strips_extensions() {
        assert_eq!(to_clean_path("about.tsx"), "/about");
        assert_eq!(to_clean_path("blog/[slug].js"), "/blog/[slug]");
        assert_eq!(to_clean_path("pricing.html"), "/pricing");
    }

    #[test]
    fn test_to_clean_path_keeps_unknown_extensions() {
        assert_eq!(to_clean_path("sitemap.xml"), "/sitemap.xml");
    }

    #[test]
    fn test_to_clean_path_collapses_index_segment() {
        assert_eq!(to_clean_path("docs/index.js"), "/docs");
        assert_eq!(to_clean_path("a/b/index"), "/a/b");
    }

    #[test]
    fn test_to_clean_path_normalizes_slashes() {
        assert_eq!(to_clean_path("//a///b"), "/a/b");
        assert_eq!(to_clean_path("a/b/"), "/a/b");
        assert_eq!(to_clean_path(""), "/");
    }

    #[test]
    fn test_to_clean_path_dot_in_directory_segment() {
        assert_eq!(to_clean_path("v1.2/about.js"), "/v1.2/about");
    }

    #[test]
    fn test_to_route_syntax_single_param() {
        assert_eq!(to_route_syntax("/products/[id]"), "/products/:id");
    }

    #[test]
    fn test_to_route_syntax_catch_all() {
        assert_eq!(to_route_syntax("/docs/[...path]"), "/docs/:path+");
    }

    #[test]
    fn test_to_route_syntax_optional_catch_all() {
        assert_eq!(to_route_syntax("/shop/[[...category]]"), "/shop/:category*");
    }

    #[test]
    fn test_to_route_syntax_mixed_params() {
        assert_eq!(
            to_route_syntax("/[lang]/blog/[...rest].tsx"),
            "/:lang/blog/:rest+"
        );
    }

    #[test]
    fn test_to_route_syntax_static_page() {
        assert_eq!(to_route_syntax("/about"), "/about");
    }

    #[test]
    fn test_is_dynamic() {
        assert!(is_dynamic("/blog/[slug]"));
        assert!(is_dynamic("/docs/[...path]"));
        assert!(!is_dynamic("/about"));
    }

    #[test]
    fn test_get_data_route_with_build_id() {
        assert_eq!(
            get_data_route("/about", Some("abc123")),
            "/__edge__/data/abc123/about.json"
        );
    }

    #[test]
    fn test_get_data_route_root_becomes_index() {
        assert_eq!(
            get_data_route("/", Some("abc123")),
            "/__edge__/data/abc123/index.json"
        );
    }

    #[test]
    fn test_get_data_route_placeholder_without_build() {
        assert_eq!(
            get_data_route("/about", None),
            "/__edge__/data/:build/about.json"
        );
    }

    #[test]
    fn test_get_data_route_dynamic_page() {
        assert_eq!(
            get_data_route("/blog/[slug]", Some("b1")),
            "/__edge__/data/b1/blog/:slug.json"
        );
    }

    #[test]
    fn test_route_variations_without_locales() {
        let v = get_route_variations("/about", Some("b1"), &Locales::none());

        assert_eq!(v.route, "/about");
        assert_eq!(v.localized_route, "/about");
        assert_eq!(v.data_route, "/__edge__/data/b1/about.json");
        assert_eq!(v.localized_data_route, v.data_route);
    }

    #[test]
    fn test_route_variations_wraps_locales() {
        let v = get_route_variations("/about", Some("b1"), &locales(&["en", "fr"], "en"));

        assert_eq!(v.route, "/about");
        assert_eq!(v.localized_route, "/:locale(en|fr)?/about");
        assert_eq!(
            v.localized_data_route,
            "/__edge__/data/b1/:locale(en|fr)?/about.json"
        );
    }

    #[test]
    fn test_route_variations_root_page() {
        let v = get_route_variations("/", Some("b1"), &locales(&["en", "fr"], "en"));

        assert_eq!(v.route, "/");
        assert_eq!(v.localized_route, "/:locale(en|fr)?");
        assert_eq!(v.data_route, "/__edge__/data/b1/index.json");
        assert_eq!(
            v.localized_data_route,
            "/__edge__/data/b1/:locale(en|fr)?/index.json"
        );
    }

    #[test]
    fn test_route_variations_never_double_wraps() {
        let v = get_route_variations("/fr/about", Some("b1"), &locales(&["en", "fr"], "en"));

        assert_eq!(v.route, "/fr/about");
        assert_eq!(v.localized_route, "/fr/about");
        assert_eq!(v.localized_data_route, "/__edge__/data/b1/fr/about.json");
    }

    #[test]
    fn test_route_variations_dev_placeholder() {
        let v = get_route_variations("/blog/[slug]", None, &Locales::none());

        assert_eq!(v.data_route, "/__edge__/data/:build/blog/:slug.json");
    }
}
