//! Icon resolution.
//!
//! This module provides the [`IconResolver`] which turns an icon name and a
//! pixel size into a file path by walking a theme's inheritance chain, and
//! [`SharedIconResolver`] for use from several threads.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::trace;

use crate::cache::DirectoryCache;
use crate::config::IconThemeConfig;
use crate::error::Result;
use crate::registry::{ThemeChain, ThemeRegistry};

/// Resolves icon names to files.
///
/// The resolver owns the theme registry and the directory listing cache, so
/// repeated lookups against the same theme only touch the filesystem when a
/// poll interval has passed.
///
/// # Example
///
/// ```no_run
/// use horizon_lattice_icons::IconResolver;
///
/// let mut resolver = IconResolver::new();
/// if let Ok(Some(path)) = resolver.resolve("firefox", 48, "hicolor", &["png", "svg"]) {
///     println!("{}", path.display());
/// }
/// ```
#[derive(Debug)]
pub struct IconResolver {
    config: IconThemeConfig,
    registry: ThemeRegistry,
    cache: DirectoryCache,
}

impl IconResolver {
    /// Create a resolver using the platform's default search paths.
    pub fn new() -> Self {
        Self::with_config(IconThemeConfig::new())
    }

    /// Create a resolver with a custom configuration.
    pub fn with_config(config: IconThemeConfig) -> Self {
        Self {
            registry: ThemeRegistry::new(&config),
            cache: DirectoryCache::with_poll_interval(config.poll_interval()),
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &IconThemeConfig {
        &self.config
    }

    /// Get the theme registry.
    pub fn registry(&self) -> &ThemeRegistry {
        &self.registry
    }

    /// Get the directory listing cache.
    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    /// Inheritance chain of `theme`, loading it if needed.
    pub fn theme_chain(&mut self, theme: &str) -> Result<ThemeChain> {
        self.registry.resolve_chain(theme)
    }

    /// Names of every installed theme.
    pub fn available_themes(&self) -> Vec<String> {
        self.registry.discover()
    }

    /// Human-readable name of a theme in the configured locale.
    ///
    /// `Ok(None)` if the theme isn't installed or has no `Name`.
    pub fn theme_display_name(&mut self, theme: &str) -> Result<Option<String>> {
        Ok(self
            .registry
            .load_theme(theme)?
            .and_then(|t| t.display_name(self.config.locale()).map(str::to_string)))
    }

    /// Drop all loaded themes and cached listings.
    pub fn reset(&mut self) {
        self.registry.reset();
        self.cache.reset();
    }

    /// Resolve an icon.
    ///
    /// Absolute names are returned unchanged. Otherwise a trailing extension
    /// is stripped from `name` and `extensions` are tried in order. The first
    /// directory in the chain whose size rule accepts `size` wins; failing
    /// that, the directory with the closest size. As a last resort the search
    /// paths themselves are searched, outside any theme.
    ///
    /// Fails only when `theme` itself cannot be loaded (or, in strict mode,
    /// when part of its chain is missing).
    pub fn resolve<S: AsRef<str>>(
        &mut self,
        name: &str,
        size: i32,
        theme: &str,
        extensions: &[S],
    ) -> Result<Option<PathBuf>> {
        if Path::new(name).is_absolute() {
            return Ok(Some(PathBuf::from(name)));
        }

        let name = strip_extension(name);
        let extensions: Vec<&str> = extensions.iter().map(AsRef::as_ref).collect();
        let chain = self.registry.resolve_chain(theme)?;
        let now = Instant::now();

        let found = self
            .exact_match(&chain, name, size, &extensions, now)
            .or_else(|| self.closest_match(&chain, name, size, &extensions, now))
            .or_else(|| {
                self.config
                    .unthemed_lookup()
                    .then(|| self.unthemed_match(name, &extensions, now))
                    .flatten()
            });

        trace!(
            target: "horizon_lattice_icons::resolver",
            "Resolved '{}' at {}px in '{}': {:?}", name, size, theme, found
        );
        Ok(found)
    }

    /// Resolve an icon with the configured default extensions.
    pub fn resolve_default(&mut self, name: &str, size: i32, theme: &str) -> Result<Option<PathBuf>> {
        let extensions = self.config.default_extensions().to_vec();
        self.resolve(name, size, theme, &extensions)
    }

    /// First file in a directory whose size rule accepts `size`.
    fn exact_match(
        &mut self,
        chain: &ThemeChain,
        name: &str,
        size: i32,
        extensions: &[&str],
        now: Instant,
    ) -> Option<PathBuf> {
        for theme in chain.iter() {
            for dir in theme.directory_rules() {
                if !dir.matches_size(size) {
                    continue;
                }
                for root in self.config.search_paths() {
                    let path = root.join(theme.name()).join(&dir.path);
                    let files = self.cache.listing_at(&path, now);
                    if let Some(file) = find_file(&files, name, extensions) {
                        return Some(path.join(file));
                    }
                }
            }
        }
        None
    }

    /// File in the directory whose size rule is closest to `size`.
    ///
    /// Ties go to the directory met first.
    fn closest_match(
        &mut self,
        chain: &ThemeChain,
        name: &str,
        size: i32,
        extensions: &[&str],
        now: Instant,
    ) -> Option<PathBuf> {
        let mut best: Option<(u64, PathBuf)> = None;

        for theme in chain.iter() {
            for dir in theme.directory_rules() {
                let distance = dir.size_distance(size);
                if best.as_ref().is_some_and(|(d, _)| distance >= *d) {
                    continue;
                }
                for root in self.config.search_paths() {
                    let path = root.join(theme.name()).join(&dir.path);
                    let files = self.cache.listing_at(&path, now);
                    if let Some(file) = find_file(&files, name, extensions) {
                        best = Some((distance, path.join(file)));
                        break;
                    }
                }
            }
        }

        best.map(|(_, path)| path)
    }

    /// Icon placed directly in a search path, e.g. `/usr/share/pixmaps`.
    fn unthemed_match(&mut self, name: &str, extensions: &[&str], now: Instant) -> Option<PathBuf> {
        for root in self.config.search_paths() {
            let files = self.cache.listing_at(root, now);
            if let Some(file) = find_file(&files, name, extensions) {
                return Some(root.join(file));
            }
        }
        None
    }
}

impl Default for IconResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// A resolver that can be shared between threads.
///
/// All lookups go through one lock, so checking a listing for staleness and
/// refreshing it never race.
#[derive(Debug, Clone)]
pub struct SharedIconResolver {
    inner: Arc<Mutex<IconResolver>>,
}

impl SharedIconResolver {
    /// Wrap a resolver.
    pub fn new(resolver: IconResolver) -> Self {
        Self {
            inner: Arc::new(Mutex::new(resolver)),
        }
    }

    /// See [`IconResolver::resolve`].
    pub fn resolve<S: AsRef<str>>(
        &self,
        name: &str,
        size: i32,
        theme: &str,
        extensions: &[S],
    ) -> Result<Option<PathBuf>> {
        self.inner.lock().resolve(name, size, theme, extensions)
    }

    /// See [`IconResolver::resolve_default`].
    pub fn resolve_default(&self, name: &str, size: i32, theme: &str) -> Result<Option<PathBuf>> {
        self.inner.lock().resolve_default(name, size, theme)
    }

    /// Drop all loaded themes and cached listings.
    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    /// Run `f` with exclusive access to the underlying resolver.
    pub fn with_resolver<R>(&self, f: impl FnOnce(&mut IconResolver) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl From<IconResolver> for SharedIconResolver {
    fn from(resolver: IconResolver) -> Self {
        Self::new(resolver)
    }
}

/// Drop one trailing `.ext` from an icon name.
fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// First `name.ext` present in `files`, in extension preference order.
fn find_file(files: &HashSet<String>, name: &str, extensions: &[&str]) -> Option<String> {
    extensions
        .iter()
        .map(|ext| format!("{name}.{ext}"))
        .find(|file| files.contains(file))
}
