//! Development-mode page source.
//!
//! Before a build exists there are no manifests to load, so the loader falls
//! back to scanning the source page tree directly. Every discovered file is
//! synthesized as a server-rendered page: no static-generation decision has
//! been made yet, so nothing may be served from a pre-baked artifact.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use edgerules_paths::{SOURCE_EXTENSIONS, to_clean_path};
use glob::Pattern;
use notify::{RecursiveMode, Watcher};

use crate::debounce::ChangeDebouncer;
use crate::error::ManifestError;
use crate::loader::BuildManifests;
use crate::watch::{ChangeEvent, ChangeKind, ChangeReceiver, WatchHandle};

/// Quiet period before a burst of file events produces one change.
const DEBOUNCE_QUIET_PERIOD: Duration = Duration::from_millis(100);

/// Interval at which the drain thread checks for ready changes.
const DRAIN_INTERVAL: Duration = Duration::from_millis(50);

/// Directories that never contain page sources.
const SKIPPED_DIRS: &[&str] = &["node_modules", "dist", "build", "target", ".cache"];

/// Scans a source page directory and watches it for changes.
pub struct DevPageSource {
    source_dir: PathBuf,
    watch_patterns: Vec<Pattern>,
}

impl DevPageSource {
    /// Create a page source over a source directory (e.g. `pages/`).
    ///
    /// # Panics
    ///
    /// Panics if the built-in watch patterns fail to compile; they are
    /// derived from compile-time extension constants.
    #[must_use]
    pub fn new(source_dir: PathBuf) -> Self {
        let watch_patterns = SOURCE_EXTENSIONS
            .iter()
            .map(|ext| Pattern::new(&format!("**/*.{ext}")).expect("invalid glob pattern"))
            .collect();

        Self {
            source_dir,
            watch_patterns,
        }
    }

    /// Discover page names from source files.
    ///
    /// Returns clean page paths with bracket segments preserved, sorted.
    /// A missing source directory yields an empty list rather than an error
    /// so a fresh project can start the dev loop before creating pages.
    pub fn scan(&self) -> Result<Vec<String>, ManifestError> {
        let mut names: Vec<String> = self
            .collect_sources()?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Synthesize a manifest set from the source tree.
    ///
    /// Every page maps to its source file as a server entry point; the
    /// prerender registry is empty and there is no build identifier, so the
    /// classifier will type every page SSR and data routes use the
    /// placeholder build segment.
    pub fn synthesize(&self) -> Result<BuildManifests, ManifestError> {
        let mut manifests = BuildManifests::default();
        for (name, source) in self.collect_sources()? {
            manifests.pages.insert(name, source);
        }
        Ok(manifests)
    }

    /// Discover `(page name, relative source path)` pairs.
    fn collect_sources(&self) -> Result<Vec<(String, String)>, ManifestError> {
        if !self.source_dir.exists() {
            return Ok(Vec::new());
        }
        let mut sources = Vec::new();
        self.scan_directory(&self.source_dir, Path::new(""), &mut sources)?;
        Ok(sources)
    }

    fn scan_directory(
        &self,
        dir: &Path,
        base: &Path,
        sources: &mut Vec<(String, String)>,
    ) -> Result<(), ManifestError> {
        let entries = std::fs::read_dir(dir).map_err(|source| ManifestError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in entries.filter_map(Result::ok) {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            if is_dir {
                if SKIPPED_DIRS.contains(&name.as_str()) {
                    continue;
                }
                self.scan_directory(&entry.path(), &base.join(&name), sources)?;
            } else if has_source_extension(&name) {
                let rel = base.join(&name).to_string_lossy().replace('\\', "/");
                sources.push((to_clean_path(&rel), rel));
            }
        }
        Ok(())
    }

    /// Start watching the source tree for page changes.
    ///
    /// Events are debounced per path and delivered with paths relative to
    /// the source directory. Dropping the handle stops the watcher.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Watch`] if the watcher cannot be started.
    pub fn watch(&self) -> Result<(ChangeReceiver, WatchHandle), ManifestError> {
        let (event_tx, event_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel();

        let debouncer = Arc::new(ChangeDebouncer::new(DEBOUNCE_QUIET_PERIOD));

        let source_dir = self.source_dir.clone();
        let patterns = self.watch_patterns.clone();
        let debouncer_for_watcher = Arc::clone(&debouncer);

        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };

                let kind = match event.kind {
                    notify::EventKind::Create(_) => ChangeKind::Created,
                    notify::EventKind::Modify(_) => ChangeKind::Modified,
                    notify::EventKind::Remove(_) => ChangeKind::Removed,
                    _ => return,
                };

                for path in event.paths {
                    let Ok(rel) = path.strip_prefix(&source_dir) else {
                        continue;
                    };
                    if !patterns.iter().any(|p| p.matches_path(rel)) {
                        continue;
                    }
                    debouncer_for_watcher.record(path, kind);
                }
            })
            .map_err(ManifestError::Watch)?;

        watcher
            .watch(&self.source_dir, RecursiveMode::Recursive)
            .map_err(ManifestError::Watch)?;

        let source_dir = self.source_dir.clone();
        std::thread::spawn(move || {
            // The watcher must stay alive for as long as this thread runs.
            let _watcher = watcher;

            loop {
                match shutdown_rx.recv_timeout(DRAIN_INTERVAL) {
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }

                for change in debouncer.drain_ready() {
                    let Ok(rel) = change.path.strip_prefix(&source_dir) else {
                        continue;
                    };
                    let event = ChangeEvent {
                        path: rel.to_path_buf(),
                        kind: change.kind,
                    };
                    if event_tx.send(event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((ChangeReceiver::new(event_rx), WatchHandle::new(shutdown_tx)))
    }
}

fn has_source_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| SOURCE_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_scan_missing_dir_returns_empty() {
        let source = DevPageSource::new(PathBuf::from("/nonexistent/pages"));

        assert!(source.scan().unwrap().is_empty());
    }

    #[test]
    fn test_scan_discovers_pages() {
        let temp = tempfile::tempdir().unwrap();
        let pages = temp.path().join("pages");
        fs::create_dir_all(pages.join("blog")).unwrap();
        fs::write(pages.join("index.tsx"), "").unwrap();
        fs::write(pages.join("about.tsx"), "").unwrap();
        fs::write(pages.join("blog/[slug].tsx"), "").unwrap();
        fs::write(pages.join("styles.css"), "").unwrap();

        let names = DevPageSource::new(pages).scan().unwrap();

        assert_eq!(names, ["/", "/about", "/blog/[slug]"]);
    }

    #[test]
    fn test_scan_skips_hidden_and_vendored() {
        let temp = tempfile::tempdir().unwrap();
        let pages = temp.path().join("pages");
        fs::create_dir_all(pages.join("node_modules/pkg")).unwrap();
        fs::write(pages.join("node_modules/pkg/index.js"), "").unwrap();
        fs::write(pages.join(".draft.tsx"), "").unwrap();
        fs::write(pages.join("real.tsx"), "").unwrap();

        let names = DevPageSource::new(pages).scan().unwrap();

        assert_eq!(names, ["/real"]);
    }

    #[test]
    fn test_synthesize_has_no_prerender_data() {
        let temp = tempfile::tempdir().unwrap();
        let pages = temp.path().join("pages");
        fs::create_dir_all(&pages).unwrap();
        fs::write(pages.join("about.tsx"), "").unwrap();

        let manifests = DevPageSource::new(pages).synthesize().unwrap();

        assert!(manifests.pages.contains_key("/about"));
        assert!(manifests.prerender.routes.is_empty());
        assert!(manifests.prerender.dynamic_routes.is_empty());
        assert_eq!(manifests.build_id, None);
        assert!(manifests.static_artifacts.is_empty());
    }

    #[test]
    fn test_synthesized_assets_are_not_static_markers() {
        let temp = tempfile::tempdir().unwrap();
        let pages = temp.path().join("pages");
        fs::create_dir_all(&pages).unwrap();
        fs::write(pages.join("about.tsx"), "").unwrap();

        let manifests = DevPageSource::new(pages).synthesize().unwrap();

        // Synthesized pages point at source files, never .html artifacts.
        assert_eq!(manifests.pages["/about"], "about.tsx");
    }

    #[test]
    fn test_watch_starts() {
        let temp = tempfile::tempdir().unwrap();
        let source = DevPageSource::new(temp.path().to_path_buf());

        assert!(source.watch().is_ok());
    }
}
