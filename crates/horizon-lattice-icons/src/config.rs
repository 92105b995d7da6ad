//! Lookup configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::descriptor::Locale;

/// Minimum time between two scans of the same directory.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Theme appended to every inheritance chain unless disabled.
pub const DEFAULT_FALLBACK_THEME: &str = "hicolor";

/// Extensions tried when the caller doesn't supply any, in preference order.
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["png", "svg", "xpm"];

/// Configuration shared by the registry, the directory cache and the resolver.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use horizon_lattice_icons::IconThemeConfig;
///
/// let config = IconThemeConfig::with_search_paths(vec!["/opt/app/icons".into()])
///     .strict(true)
///     .with_poll_interval(Duration::from_secs(1))
///     .without_fallback_theme();
/// assert!(config.is_strict());
/// ```
#[derive(Debug, Clone)]
pub struct IconThemeConfig {
    /// Icon root directories, searched in order
    search_paths: Vec<PathBuf>,
    /// Report missing or malformed inherited themes instead of skipping them
    strict: bool,
    /// Directory rescan debounce
    poll_interval: Duration,
    /// Theme appended to every chain
    fallback_theme: Option<String>,
    /// Extensions for lookups without an explicit list
    default_extensions: Vec<String>,
    /// Search icon roots directly when no theme has the icon
    unthemed_lookup: bool,
    /// Locale for translated names
    locale: Option<Locale>,
}

impl IconThemeConfig {
    /// Configuration with the platform's default search paths.
    pub fn new() -> Self {
        Self::with_search_paths(default_search_paths())
    }

    /// Configuration with custom search paths.
    pub fn with_search_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths: paths,
            strict: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            fallback_theme: Some(DEFAULT_FALLBACK_THEME.to_string()),
            default_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            unthemed_lookup: true,
            locale: Locale::from_env(),
        }
    }

    /// Add a search path at the lowest priority.
    pub fn add_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !self.search_paths.contains(&path) {
            self.search_paths.push(path);
        }
        self
    }

    /// Enable or disable strict mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the directory rescan interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the theme appended to every inheritance chain.
    pub fn with_fallback_theme(mut self, theme: impl Into<String>) -> Self {
        self.fallback_theme = Some(theme.into());
        self
    }

    /// Don't append any theme to inheritance chains.
    pub fn without_fallback_theme(mut self) -> Self {
        self.fallback_theme = None;
        self
    }

    /// Set the default extension preference list.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable the search of icon roots outside any theme.
    pub fn with_unthemed_lookup(mut self, enabled: bool) -> Self {
        self.unthemed_lookup = enabled;
        self
    }

    /// Set the locale used for translated names.
    pub fn with_locale(mut self, locale: Option<Locale>) -> Self {
        self.locale = locale;
        self
    }

    /// Search paths, highest priority first.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Whether strict mode is on.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Directory rescan interval.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Theme appended to every chain, if any.
    pub fn fallback_theme(&self) -> Option<&str> {
        self.fallback_theme.as_deref()
    }

    /// Default extension preference list.
    pub fn default_extensions(&self) -> &[String] {
        &self.default_extensions
    }

    /// Whether unthemed lookup is enabled.
    pub fn unthemed_lookup(&self) -> bool {
        self.unthemed_lookup
    }

    /// Locale used for translated names.
    pub fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }
}

impl Default for IconThemeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Default icon search paths for the current platform.
///
/// On Linux this follows the XDG base directory layout: the user data
/// directory, `~/.icons`, every `XDG_DATA_DIRS` entry, then `/usr/share/pixmaps`.
#[cfg(target_os = "linux")]
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // User icons (XDG_DATA_HOME/icons or ~/.local/share/icons)
    match std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        Some(data_home) => paths.push(PathBuf::from(data_home).join("icons")),
        None => {
            if let Some(home) = dirs::home_dir() {
                paths.push(home.join(".local/share/icons"));
            }
        }
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".icons"));
    }

    // System icons (XDG_DATA_DIRS/icons)
    match std::env::var("XDG_DATA_DIRS").ok().filter(|v| !v.is_empty()) {
        Some(data_dirs) => {
            for dir in data_dirs.split(':').filter(|d| !d.is_empty()) {
                paths.push(PathBuf::from(dir).join("icons"));
            }
        }
        None => {
            paths.push(PathBuf::from("/usr/local/share/icons"));
            paths.push(PathBuf::from("/usr/share/icons"));
        }
    }

    // Pixmaps fallback
    paths.push(PathBuf::from("/usr/share/pixmaps"));

    paths.dedup();
    paths
}

/// Default icon search paths for other platforms.
#[cfg(not(target_os = "linux"))]
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(data) = dirs::data_local_dir() {
        paths.push(data.join("icons"));
    }
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".icons"));
    }

    paths
}
