//! Descriptor construction from loaded manifests.

use edgerules_manifest::{BuildManifests, FallbackField, Revalidate};
use edgerules_paths::{
    Locales, PatternError, get_data_route, get_route_variations, is_dynamic, pattern_to_regex,
    to_route_syntax,
};

use crate::descriptor::{FallbackPolicy, PageDescriptor, PageType, PrerenderedRouteEntry};
use crate::evidence::PrerenderEvidence;

/// Reserved framework template names.
const TEMPLATE_PAGES: &[&str] = &["/_app", "/_document", "/_error"];

/// API namespace prefix.
const API_PREFIX: &str = "/api";

/// Build one descriptor per page in the registry.
///
/// Pages are processed in registry (sorted) order, so the resulting set is
/// identical across runs for the same manifests.
///
/// # Errors
///
/// Returns [`PatternError`] if a page's localized route fails to compile for
/// the back-reference-less attribution check.
pub fn build_descriptors(manifests: &BuildManifests) -> Result<Vec<PageDescriptor>, PatternError> {
    let locales = manifests.locales();
    let build_id = manifests.build_id.as_deref();

    let mut descriptors = Vec::with_capacity(manifests.pages.len());
    for (name, asset) in &manifests.pages {
        descriptors.push(build_descriptor(name, asset, manifests, &locales, build_id)?);
    }
    Ok(descriptors)
}

fn build_descriptor(
    name: &str,
    asset: &str,
    manifests: &BuildManifests,
    locales: &Locales,
    build_id: Option<&str>,
) -> Result<PageDescriptor, PatternError> {
    let name_without_locale = locales.strip(name);
    let variations = get_route_variations(name, build_id, locales);
    let dynamic = is_dynamic(name);

    let is_template = TEMPLATE_PAGES.contains(&name_without_locale.as_str());
    let is_api = name_without_locale == API_PREFIX
        || name_without_locale.starts_with(&format!("{API_PREFIX}/"));

    let evidence = PrerenderEvidence::collect(name, asset, manifests, locales);
    let has_data = !is_template && !is_api && has_data_route(&name_without_locale, manifests);
    let is_prerendered = !is_template && !is_api && evidence.any();

    let prerendered_routes = if is_prerendered {
        collect_prerendered_routes(
            name,
            &variations.localized_route,
            manifests,
            locales,
            build_id,
            has_data,
            evidence.static_asset_marker && !has_data,
        )?
    } else {
        Vec::new()
    };

    let has_revalidation = prerendered_routes
        .iter()
        .any(|e| e.revalidate.is_some_and(Revalidate::is_finite));

    let page_type = decide_type(DecideType {
        is_template,
        is_api,
        is_prerendered,
        dynamic,
        static_asset_marker: evidence.static_asset_marker,
        has_revalidation,
    });

    let (fallback, fallback_page) = if is_prerendered && dynamic {
        decide_fallback(&name_without_locale, manifests)
    } else {
        (None, None)
    };

    Ok(PageDescriptor {
        name: name.to_owned(),
        name_without_locale,
        route: variations.route,
        localized_route: variations.localized_route,
        data_route: has_data.then(|| variations.data_route.clone()),
        localized_data_route: has_data.then(|| variations.localized_data_route.clone()),
        is_dynamic: dynamic,
        is_prerendered,
        has_revalidation,
        prerendered_routes,
        fallback,
        fallback_page,
        page_type,
        page_source: asset.to_owned(),
    })
}

struct DecideType {
    is_template: bool,
    is_api: bool,
    is_prerendered: bool,
    dynamic: bool,
    static_asset_marker: bool,
    has_revalidation: bool,
}

/// Assign the render strategy; first match wins.
fn decide_type(input: DecideType) -> PageType {
    if input.is_template {
        PageType::Template
    } else if input.is_api {
        PageType::Api
    } else if input.is_prerendered && input.dynamic && !input.static_asset_marker {
        if input.has_revalidation {
            PageType::Isr
        } else {
            PageType::Isg
        }
    } else if input.is_prerendered {
        PageType::Ssg
    } else {
        PageType::Ssr
    }
}

/// Map the registry fallback field to a policy.
///
/// `null` means blocking, a string names a placeholder asset, `false` means
/// permanently not found. A page missing from the dynamic-route table
/// entirely has no applicable policy.
fn decide_fallback(
    name_without_locale: &str,
    manifests: &BuildManifests,
) -> (Option<FallbackPolicy>, Option<String>) {
    match manifests.prerender.dynamic_routes.get(name_without_locale) {
        None => (None, None),
        Some(entry) => match &entry.fallback {
            None => (Some(FallbackPolicy::Blocking), None),
            Some(FallbackField::Page(page)) => {
                (Some(FallbackPolicy::Placeholder), Some(page.clone()))
            }
            Some(FallbackField::Disabled(_)) => (Some(FallbackPolicy::NotFound), None),
        },
    }
}

/// True if a page has a data-fetch function according to any registry.
fn has_data_route(name_without_locale: &str, manifests: &BuildManifests) -> bool {
    manifests
        .routes
        .data_routes
        .iter()
        .any(|d| d.page == name_without_locale)
        || manifests
            .prerender
            .dynamic_routes
            .get(name_without_locale)
            .is_some_and(|d| d.data_route.is_some())
        || manifests.prerender.routes.values().any(|e| {
            e.origin_page.as_deref() == Some(name_without_locale) && e.data_route.is_some()
        })
}

/// Collect concrete prerendered instances for a page.
///
/// Entries with an origin-page back-reference are attributed exactly; ones
/// without fall back to matching the page's localized pattern against the
/// concrete path. That fallback can attribute a concrete path to more than
/// one static page when their localized patterns overlap — intentional,
/// matching the source framework's behavior.
#[allow(clippy::too_many_arguments)]
fn collect_prerendered_routes(
    name: &str,
    localized_route: &str,
    manifests: &BuildManifests,
    locales: &Locales,
    build_id: Option<&str>,
    has_data: bool,
    pure_static_self_entry: bool,
) -> Result<Vec<PrerenderedRouteEntry>, PatternError> {
    let pattern = pattern_to_regex(localized_route)?;

    let mut entries = Vec::new();
    for (concrete, registry_entry) in &manifests.prerender.routes {
        let attributed = match registry_entry.origin_page.as_deref() {
            Some(origin) => origin == name,
            None => pattern.is_match(concrete),
        };
        if !attributed {
            continue;
        }

        entries.push(make_entry(
            concrete,
            build_id,
            has_data,
            registry_entry.revalidate_seconds,
        ));
    }

    // A pure-static page with no data-fetch function never appears in the
    // registry; its own name is its single concrete instance.
    if pure_static_self_entry {
        entries.push(make_entry(name, build_id, has_data, None));
    }

    // Default-locale-prefixed instances gain a locale-free alias, in
    // addition to the prefixed entry.
    let aliases: Vec<PrerenderedRouteEntry> = entries
        .iter()
        .filter_map(|entry| {
            locales.default_alias(&entry.concrete_path).map(|alias| {
                make_entry(&alias, build_id, has_data, entry.revalidate)
            })
        })
        .collect();
    entries.extend(aliases);

    // The self entry and an alias can coincide; keep the first occurrence.
    let mut seen = std::collections::BTreeSet::new();
    entries.retain(|entry| seen.insert(entry.concrete_path.clone()));

    Ok(entries)
}

fn make_entry(
    concrete: &str,
    build_id: Option<&str>,
    has_data: bool,
    revalidate: Option<Revalidate>,
) -> PrerenderedRouteEntry {
    PrerenderedRouteEntry {
        concrete_path: concrete.to_owned(),
        route: to_route_syntax(concrete),
        data_route: has_data.then(|| get_data_route(concrete, build_id)),
        revalidate,
    }
}
