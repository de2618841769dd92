//! Serde models for the build manifest files.
//!
//! Maps use `BTreeMap` throughout: manifest iteration order feeds directly
//! into rule emission order, and compiling the same manifests twice must
//! yield identical rule lists.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Revalidation marker on a concrete prerendered route.
///
/// The registry encodes three states: the field absent (the output is never
/// checked again), `false` (checked on every request), or a finite number of
/// seconds. Absence is modeled as `Option<Revalidate>::None` on the entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Revalidate {
    /// Registry value `false`: freshness is checked on every request.
    EveryRequest,
    /// Registry value `n`: stale after this many seconds.
    AfterSeconds(u64),
}

impl Revalidate {
    /// True for the finite-window variant.
    #[must_use]
    pub fn is_finite(self) -> bool {
        matches!(self, Self::AfterSeconds(_))
    }
}

impl<'de> Deserialize<'de> for Revalidate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Seconds(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(_) => Ok(Self::EveryRequest),
            Raw::Seconds(n) => Ok(Self::AfterSeconds(n)),
        }
    }
}

impl Serialize for Revalidate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::EveryRequest => serializer.serialize_bool(false),
            Self::AfterSeconds(n) => serializer.serialize_u64(*n),
        }
    }
}

/// One concrete, fully-resolved route in the prerender registry.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PrerenderedEntry {
    /// Revalidation marker; `None` when the field is absent.
    pub revalidate_seconds: Option<Revalidate>,
    /// Back-reference to the abstract page this route was generated from.
    pub origin_page: Option<String>,
    /// Pre-computed data route, if the page has a data-fetch function.
    pub data_route: Option<String>,
}

/// Fallback policy field on a dynamic prerender entry.
///
/// `null` in the registry deserializes to `None` on the entry (blocking);
/// this enum covers the other two spellings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FallbackField {
    /// `false`: non-enumerated paths are permanently not found.
    Disabled(bool),
    /// A placeholder asset path served while the real page renders.
    Page(String),
}

/// One abstract dynamic route in the prerender registry.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DynamicRouteEntry {
    /// Fallback policy; `None` means blocking.
    pub fallback: Option<FallbackField>,
    /// Data route pattern for the abstract page.
    pub data_route: Option<String>,
}

/// The prerender registry (`prerender-manifest.json`).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PrerenderManifest {
    /// Concrete path → entry.
    pub routes: BTreeMap<String, PrerenderedEntry>,
    /// Abstract path → dynamic entry.
    pub dynamic_routes: BTreeMap<String, DynamicRouteEntry>,
    /// Preview-mode bypass token, when preview mode is enabled.
    pub preview_mode_token: Option<String>,
}

/// Where a route condition reads its value from.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Header,
    Cookie,
    Query,
}

/// A request predicate on a redirect or rewrite declaration.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteCondition {
    /// Value source.
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    /// Header/cookie/query-parameter name.
    pub key: String,
    /// Value regex; `None` tests for presence only.
    #[serde(default)]
    pub value: Option<String>,
}

/// A redirect declaration from the route-policy registry.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RedirectRule {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Framework-auto-generated trailing-slash normalization redirect.
    #[serde(default)]
    pub internal: bool,
    #[serde(default, rename = "has")]
    pub conditions: Vec<RouteCondition>,
}

/// A rewrite declaration from the route-policy registry.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RewriteRule {
    pub source: String,
    pub destination: String,
    #[serde(default, rename = "has")]
    pub conditions: Vec<RouteCondition>,
}

/// The `rewrites` field, which comes in two spellings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RewritesField {
    /// Plain list; equivalent to `afterFiles` in the staged form.
    List(Vec<RewriteRule>),
    /// Staged form; flattened in before → after → fallback order.
    #[serde(rename_all = "camelCase")]
    Staged {
        #[serde(default)]
        before_files: Vec<RewriteRule>,
        #[serde(default)]
        after_files: Vec<RewriteRule>,
        #[serde(default)]
        fallback: Vec<RewriteRule>,
    },
}

impl RewritesField {
    /// Flatten into a single ordered list.
    #[must_use]
    pub fn flatten(&self) -> Vec<RewriteRule> {
        match self {
            Self::List(list) => list.clone(),
            Self::Staged {
                before_files,
                after_files,
                fallback,
            } => before_files
                .iter()
                .chain(after_files)
                .chain(fallback)
                .cloned()
                .collect(),
        }
    }
}

/// A dynamic or data route pattern list entry.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoutePattern {
    pub page: String,
    #[serde(default, alias = "dataRouteRegex")]
    pub regex: String,
}

/// The route-policy registry (`routes-manifest.json`).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutesManifest {
    pub base_path: String,
    pub redirects: Vec<RedirectRule>,
    pub rewrites: Option<RewritesField>,
    pub locales: Vec<String>,
    pub default_locale: Option<String>,
    pub dynamic_routes: Vec<RoutePattern>,
    pub data_routes: Vec<RoutePattern>,
}

impl RoutesManifest {
    /// All rewrites in evaluation order, regardless of spelling.
    #[must_use]
    pub fn rewrites(&self) -> Vec<RewriteRule> {
        self.rewrites
            .as_ref()
            .map(RewritesField::flatten)
            .unwrap_or_default()
    }
}

/// One request-time middleware matcher.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MiddlewareMatcher {
    /// Raw regex the middleware runs for.
    pub regexp: String,
}

/// The middleware registry (`middleware-manifest.json`, optional).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct MiddlewareManifest {
    pub matchers: Vec<MiddlewareMatcher>,
}

/// One remote-image allow-list pattern.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemotePatternConfig {
    #[serde(default)]
    pub protocol: Option<String>,
    pub hostname: String,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub pathname: Option<String>,
}

/// The image allow-list registry (`images-manifest.json`, optional).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagesManifest {
    pub remote_patterns: Vec<RemotePatternConfig>,
}
