//! Theme discovery, loading and inheritance chains.
//!
//! The registry maps theme names to descriptors by scanning the search paths,
//! loads each theme at most once, and flattens a theme's inheritance graph
//! into the ordered chain the resolver walks.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::IconThemeConfig;
use crate::error::{Error, Result};
use crate::theme::ThemeDescriptor;

/// Descriptor file name.
pub const THEME_FILE: &str = "index.theme";

/// Deprecated descriptor file name, still accepted.
pub const LEGACY_THEME_FILE: &str = "index.desktop";

/// A flattened inheritance chain, requested theme first.
pub type ThemeChain = Arc<[Arc<ThemeDescriptor>]>;

/// Loads themes and resolves inheritance chains.
#[derive(Debug)]
pub struct ThemeRegistry {
    /// Search paths for icon themes
    search_paths: Vec<PathBuf>,
    /// Report inherited-theme problems instead of skipping them
    strict: bool,
    /// Theme appended to every chain
    fallback_theme: Option<String>,
    /// Loaded themes (name -> descriptor)
    themes: HashMap<String, Arc<ThemeDescriptor>>,
    /// Chain for the most recently requested theme
    chain: Option<(String, ThemeChain)>,
}

impl ThemeRegistry {
    /// Create a registry from a lookup configuration.
    pub fn new(config: &IconThemeConfig) -> Self {
        Self {
            search_paths: config.search_paths().to_vec(),
            strict: config.is_strict(),
            fallback_theme: config.fallback_theme().map(str::to_string),
            themes: HashMap::new(),
            chain: None,
        }
    }

    /// Create a registry over custom search paths, with no fallback theme.
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths: paths,
            strict: false,
            fallback_theme: None,
            themes: HashMap::new(),
            chain: None,
        }
    }

    /// Get current search paths.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Locate a theme's descriptor file.
    ///
    /// The first search path holding either `index.theme` or `index.desktop`
    /// wins; later paths are not consulted.
    pub fn find_descriptor(&self, name: &str) -> Option<PathBuf> {
        self.search_paths.iter().find_map(|root| {
            let theme_dir = root.join(name);
            [THEME_FILE, LEGACY_THEME_FILE]
                .iter()
                .map(|file| theme_dir.join(file))
                .find(|path| path.is_file())
        })
    }

    /// Load a theme, or return the already loaded descriptor.
    ///
    /// `Ok(None)` means no descriptor exists for `name`.
    pub fn load_theme(&mut self, name: &str) -> Result<Option<Arc<ThemeDescriptor>>> {
        if let Some(theme) = self.themes.get(name) {
            return Ok(Some(Arc::clone(theme)));
        }

        let Some(path) = self.find_descriptor(name) else {
            return Ok(None);
        };

        let theme = Arc::new(ThemeDescriptor::load(&path)?);
        debug!(
            target: "horizon_lattice_icons::registry",
            "Loaded theme '{}' from {}", name, path.display()
        );
        self.themes.insert(name.to_string(), Arc::clone(&theme));
        Ok(Some(theme))
    }

    /// Get a theme that has already been loaded.
    pub fn get_theme(&self, name: &str) -> Option<&Arc<ThemeDescriptor>> {
        self.themes.get(name)
    }

    /// Resolve the inheritance chain of `name`.
    ///
    /// The chain lists the theme itself, then its ancestors depth-first in
    /// declared order, each at most once, then the fallback theme if it isn't
    /// already present. The result is cached until a different theme is
    /// requested or the registry is [`reset`](Self::reset).
    ///
    /// A malformed descriptor for `name` itself is always an error. A missing
    /// `name` and any problem with inherited themes are errors in strict mode
    /// and skipped otherwise.
    pub fn resolve_chain(&mut self, name: &str) -> Result<ThemeChain> {
        if let Some((root, chain)) = &self.chain
            && root == name
        {
            return Ok(Arc::clone(chain));
        }

        let mut chain = Vec::new();
        match self.load_theme(name)? {
            Some(theme) => self.visit(theme, &mut chain)?,
            None if self.strict => return Err(Error::theme_not_found(name)),
            None => debug!(
                target: "horizon_lattice_icons::registry",
                "Theme '{}' not found", name
            ),
        }

        if let Some(fallback) = self.fallback_theme.clone()
            && !chain.iter().any(|t| t.name() == fallback)
        {
            match self.load_theme(&fallback) {
                Ok(Some(theme)) => self.visit(theme, &mut chain)?,
                Ok(None) => debug!(
                    target: "horizon_lattice_icons::registry",
                    "Fallback theme '{}' not found", fallback
                ),
                Err(e) => warn!(
                    target: "horizon_lattice_icons::registry",
                    "Skipping fallback theme '{}': {}", fallback, e
                ),
            }
        }

        let chain: ThemeChain = chain.into();
        self.chain = Some((name.to_string(), Arc::clone(&chain)));
        Ok(chain)
    }

    fn visit(
        &mut self,
        theme: Arc<ThemeDescriptor>,
        chain: &mut Vec<Arc<ThemeDescriptor>>,
    ) -> Result<()> {
        let parents = theme.inherits();
        chain.push(theme);

        for parent in parents {
            if chain.iter().any(|t| t.name() == parent) {
                continue;
            }
            match self.load_theme(&parent) {
                Ok(Some(theme)) => self.visit(theme, chain)?,
                Ok(None) if self.strict => return Err(Error::theme_not_found(parent)),
                Ok(None) => debug!(
                    target: "horizon_lattice_icons::registry",
                    "Inherited theme '{}' not found", parent
                ),
                Err(e) if self.strict => return Err(e),
                Err(e) => warn!(
                    target: "horizon_lattice_icons::registry",
                    "Skipping inherited theme '{}': {}", parent, e
                ),
            }
        }

        Ok(())
    }

    /// Name of the theme whose chain is currently cached.
    pub fn cached_chain_root(&self) -> Option<&str> {
        self.chain.as_ref().map(|(root, _)| root.as_str())
    }

    /// Names of every theme with a descriptor under any search path.
    ///
    /// Sorted and deduplicated; descriptors are not parsed.
    pub fn discover(&self) -> Vec<String> {
        let mut names = BTreeSet::new();

        for search_path in &self.search_paths {
            let Ok(entries) = fs::read_dir(search_path) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if has_descriptor(&path)
                    && let Some(name) = path.file_name().and_then(|n| n.to_str())
                {
                    names.insert(name.to_string());
                }
            }
        }

        names.into_iter().collect()
    }

    /// Forget every loaded theme and the cached chain.
    pub fn reset(&mut self) {
        self.themes.clear();
        self.chain = None;
    }
}

fn has_descriptor(theme_dir: &Path) -> bool {
    theme_dir.join(THEME_FILE).is_file() || theme_dir.join(LEGACY_THEME_FILE).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_theme(root: &Path, name: &str, file: &str, inherits: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(file),
            format!("[Icon Theme]\nName={name}\nInherits={inherits}\nDirectories=\n"),
        )
        .unwrap();
    }

    fn names(chain: &ThemeChain) -> Vec<&str> {
        chain.iter().map(|t| t.name()).collect()
    }

    #[test]
    fn test_chain_depth_first_without_duplicates() {
        let tmp = tempfile::tempdir().unwrap();
        write_theme(tmp.path(), "top", THEME_FILE, "left,right");
        write_theme(tmp.path(), "left", THEME_FILE, "base");
        write_theme(tmp.path(), "right", THEME_FILE, "base,top");
        write_theme(tmp.path(), "base", THEME_FILE, "");

        let mut registry = ThemeRegistry::with_paths(vec![tmp.path().to_path_buf()]);
        let chain = registry.resolve_chain("top").unwrap();
        assert_eq!(names(&chain), ["top", "left", "base", "right"]);
    }

    #[test]
    fn test_missing_inherited_theme_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write_theme(tmp.path(), "top", THEME_FILE, "ghost,base");
        write_theme(tmp.path(), "base", THEME_FILE, "");

        let mut registry = ThemeRegistry::with_paths(vec![tmp.path().to_path_buf()]);
        let chain = registry.resolve_chain("top").unwrap();
        assert_eq!(names(&chain), ["top", "base"]);
    }

    #[test]
    fn test_strict_mode_reports_missing_themes() {
        let tmp = tempfile::tempdir().unwrap();
        write_theme(tmp.path(), "top", THEME_FILE, "ghost");

        let config = IconThemeConfig::with_search_paths(vec![tmp.path().to_path_buf()])
            .strict(true)
            .without_fallback_theme();
        let mut registry = ThemeRegistry::new(&config);

        let err = registry.resolve_chain("top").unwrap_err();
        assert!(matches!(err, Error::ThemeNotFound { ref theme } if theme == "ghost"));
        assert!(registry.resolve_chain("absent").unwrap_err().is_not_found());
    }

    #[test]
    fn test_missing_root_is_empty_chain() {
        let tmp = tempfile::tempdir().unwrap();
        let mut registry = ThemeRegistry::with_paths(vec![tmp.path().to_path_buf()]);
        assert!(registry.resolve_chain("absent").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_root_is_error_but_inherited_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let broken = tmp.path().join("broken");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join(THEME_FILE), "[Not A Theme]\nName=x\n").unwrap();
        write_theme(tmp.path(), "top", THEME_FILE, "broken");

        let mut registry = ThemeRegistry::with_paths(vec![tmp.path().to_path_buf()]);
        assert!(matches!(
            registry.resolve_chain("broken"),
            Err(Error::Descriptor { .. })
        ));
        assert_eq!(names(&registry.resolve_chain("top").unwrap()), ["top"]);
    }

    #[test]
    fn test_first_search_path_wins_and_legacy_name() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_theme(first.path(), "old", LEGACY_THEME_FILE, "");
        write_theme(second.path(), "old", THEME_FILE, "other");

        let registry = ThemeRegistry::with_paths(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        assert_eq!(
            registry.find_descriptor("old"),
            Some(first.path().join("old").join(LEGACY_THEME_FILE))
        );
    }

    #[test]
    fn test_fallback_theme_appended_once() {
        let tmp = tempfile::tempdir().unwrap();
        write_theme(tmp.path(), "top", THEME_FILE, "");
        write_theme(tmp.path(), "inner", THEME_FILE, "hicolor");
        write_theme(tmp.path(), "hicolor", THEME_FILE, "");

        let config = IconThemeConfig::with_search_paths(vec![tmp.path().to_path_buf()]);
        let mut registry = ThemeRegistry::new(&config);
        assert_eq!(names(&registry.resolve_chain("top").unwrap()), ["top", "hicolor"]);
        assert_eq!(names(&registry.resolve_chain("inner").unwrap()), ["inner", "hicolor"]);
        assert_eq!(names(&registry.resolve_chain("hicolor").unwrap()), ["hicolor"]);
    }

    #[test]
    fn test_chain_cached_for_same_root() {
        let tmp = tempfile::tempdir().unwrap();
        write_theme(tmp.path(), "top", THEME_FILE, "");

        let mut registry = ThemeRegistry::with_paths(vec![tmp.path().to_path_buf()]);
        let first = registry.resolve_chain("top").unwrap();
        assert_eq!(registry.cached_chain_root(), Some("top"));

        // Descriptor removal goes unnoticed until another root or a reset
        fs::remove_dir_all(tmp.path().join("top")).unwrap();
        let second = registry.resolve_chain("top").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        registry.reset();
        assert!(registry.resolve_chain("top").unwrap().is_empty());
    }

    #[test]
    fn test_discover() {
        let tmp = tempfile::tempdir().unwrap();
        write_theme(tmp.path(), "b", THEME_FILE, "");
        write_theme(tmp.path(), "a", LEGACY_THEME_FILE, "");
        fs::create_dir_all(tmp.path().join("not-a-theme")).unwrap();

        let registry = ThemeRegistry::with_paths(vec![
            tmp.path().to_path_buf(),
            tmp.path().join("missing"),
        ]);
        assert_eq!(registry.discover(), ["a", "b"]);
    }
}
