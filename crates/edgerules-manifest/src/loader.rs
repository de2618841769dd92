//! Production manifest loading.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use edgerules_paths::{Locales, to_clean_path};
use serde::de::DeserializeOwned;

use crate::error::ManifestError;
use crate::schema::{ImagesManifest, MiddlewareManifest, PrerenderManifest, RoutesManifest};

/// Page registry file name.
pub const PAGES_MANIFEST: &str = "pages-manifest.json";
/// Prerender registry file name.
pub const PRERENDER_MANIFEST: &str = "prerender-manifest.json";
/// Route-policy registry file name.
pub const ROUTES_MANIFEST: &str = "routes-manifest.json";
/// Middleware registry file name (optional).
pub const MIDDLEWARE_MANIFEST: &str = "middleware-manifest.json";
/// Image allow-list registry file name (optional).
pub const IMAGES_MANIFEST: &str = "images-manifest.json";
/// Build identifier file name.
pub const BUILD_ID_FILE: &str = "BUILD_ID";

/// Subdirectory of the build output holding prerendered page assets.
const PAGES_DIR: &str = "pages";

/// All build artifacts, normalized and fully resident in memory.
///
/// Loading snapshots everything the compiler needs — including the two disk
/// sets (prerendered HTML artifacts and public assets) — so that a
/// compilation pass performs no I/O of its own. The structure is immutable
/// after loading; a rebuild loads a fresh one.
#[derive(Clone, Debug, Default)]
pub struct BuildManifests {
    /// Abstract page path → emitted asset. A `.html` asset marks pure
    /// static output; anything else is a server entry point.
    pub pages: BTreeMap<String, String>,
    /// Prerender registry.
    pub prerender: PrerenderManifest,
    /// Route-policy registry.
    pub routes: RoutesManifest,
    /// Middleware registry (empty default when the file is absent).
    pub middleware: MiddlewareManifest,
    /// Image allow-list registry (empty default when the file is absent).
    pub images: ImagesManifest,
    /// Opaque build identifier; `None` only in development mode.
    pub build_id: Option<String>,
    /// Clean paths of prerendered HTML artifacts found on disk at load time.
    pub static_artifacts: BTreeSet<String>,
    /// URL paths of unhashed public assets, sorted.
    pub public_assets: Vec<String>,
}

impl BuildManifests {
    /// Load manifests from a production build output directory.
    ///
    /// `public_dir` optionally points at the application's public asset
    /// directory; when given, its files feed the public-asset bulk rule.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when a required manifest or the build
    /// identifier is missing or unparsable. Missing optional registries are
    /// substituted with empty defaults and logged.
    pub fn load(dist_dir: &Path, public_dir: Option<&Path>) -> Result<Self, ManifestError> {
        let pages = read_required(&dist_dir.join(PAGES_MANIFEST))?;
        let prerender = read_required(&dist_dir.join(PRERENDER_MANIFEST))?;
        let routes = read_required(&dist_dir.join(ROUTES_MANIFEST))?;
        let middleware = read_optional(&dist_dir.join(MIDDLEWARE_MANIFEST))?;
        let images = read_optional(&dist_dir.join(IMAGES_MANIFEST))?;
        let build_id = read_build_id(&dist_dir.join(BUILD_ID_FILE))?;

        let static_artifacts = scan_static_artifacts(&dist_dir.join(PAGES_DIR));
        let public_assets = match public_dir {
            Some(dir) => scan_public_assets(dir),
            None => Vec::new(),
        };

        Ok(Self {
            pages,
            prerender,
            routes,
            middleware,
            images,
            build_id: Some(build_id),
            static_artifacts,
            public_assets,
        })
    }

    /// Locale configuration from the route-policy registry.
    #[must_use]
    pub fn locales(&self) -> Locales {
        Locales::new(
            self.routes.locales.clone(),
            self.routes.default_locale.clone(),
        )
    }

    /// True if a prerendered HTML artifact exists for a clean path.
    ///
    /// This is a pure lookup against the load-time snapshot; no disk access.
    #[must_use]
    pub fn has_static_artifact(&self, clean_path: &str) -> bool {
        self.static_artifacts.contains(clean_path)
    }
}

fn read_required<T: DeserializeOwned>(path: &Path) -> Result<T, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::Missing(path.to_path_buf()));
    }
    parse_file(path)
}

fn read_optional<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ManifestError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "optional manifest missing, using empty default");
        return Ok(T::default());
    }
    parse_file(path)
}

fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T, ManifestError> {
    let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_build_id(path: &Path) -> Result<String, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::MissingBuildId(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let id = text.trim();
    if id.is_empty() {
        return Err(ManifestError::MissingBuildId(path.to_path_buf()));
    }
    Ok(id.to_owned())
}

/// Collect clean paths of prerendered HTML artifacts under the pages dir.
fn scan_static_artifacts(pages_dir: &Path) -> BTreeSet<String> {
    let mut files = Vec::new();
    walk_files(pages_dir, Path::new(""), &mut files);

    files
        .into_iter()
        .filter(|rel| rel.extension().is_some_and(|e| e == "html"))
        .map(|rel| to_clean_path(&rel.to_string_lossy()))
        .collect()
}

/// Collect URL paths of public assets, sorted for deterministic output.
fn scan_public_assets(public_dir: &Path) -> Vec<String> {
    let mut files = Vec::new();
    walk_files(public_dir, Path::new(""), &mut files);

    let mut assets: Vec<String> = files
        .into_iter()
        .map(|rel| format!("/{}", rel.to_string_lossy().replace('\\', "/")))
        .collect();
    assets.sort();
    assets
}

fn walk_files(dir: &Path, base: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let rel = base.join(&name);
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            walk_files(&entry.path(), &rel, out);
        } else {
            out.push(rel);
        }
    }
}
