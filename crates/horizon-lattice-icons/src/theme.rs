//! Icon theme descriptors.
//!
//! A theme lives in `<search path>/<theme name>/` and is described by an
//! `index.theme` file. Its `[Icon Theme]` group names the theme, lists the
//! themes it inherits from, and declares the icon subdirectories in priority
//! order. Each subdirectory has its own group with the size rules used to pick
//! icons for a requested pixel size.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::descriptor::{Descriptor, Locale};
use crate::error::{Error, Result};

/// Header group of a theme descriptor.
pub const THEME_GROUP: &str = "Icon Theme";

/// Deprecated header group still found in older KDE themes.
pub const LEGACY_THEME_GROUP: &str = "KDE Icon Theme";

/// Threshold used when a `Threshold` directory does not declare one.
pub const DEFAULT_THRESHOLD: i32 = 2;

/// How a theme directory matches requested sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeType {
    /// Icons are only usable at exactly the declared size
    Fixed,
    /// Icons scale to any size between `MinSize` and `MaxSize`
    Scalable,
    /// Icons are usable within `Threshold` pixels of the declared size
    #[default]
    Threshold,
}

impl SizeType {
    /// Parse a `Type` value. Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Some(SizeType::Fixed),
            "scalable" => Some(SizeType::Scalable),
            "threshold" => Some(SizeType::Threshold),
            _ => None,
        }
    }

    /// The descriptor spelling of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeType::Fixed => "Fixed",
            SizeType::Scalable => "Scalable",
            SizeType::Threshold => "Threshold",
        }
    }
}

/// Size rules for one theme subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeDirectory {
    /// Directory path relative to the theme root
    pub path: String,
    /// Nominal icon size
    pub size: i32,
    /// Size type
    pub size_type: SizeType,
    /// Smallest size a `Scalable` directory serves
    pub min_size: i32,
    /// Largest size a `Scalable` directory serves
    pub max_size: i32,
    /// Tolerance of a `Threshold` directory
    pub threshold: i32,
    /// Free-form context, e.g. `Applications`
    pub context: Option<String>,
}

impl ThemeDirectory {
    /// A `Fixed` directory.
    pub fn fixed(path: impl Into<String>, size: i32) -> Self {
        Self::new(path, size, SizeType::Fixed)
    }

    /// A `Scalable` directory covering `min..=max`.
    pub fn scalable(path: impl Into<String>, size: i32, min: i32, max: i32) -> Self {
        Self {
            min_size: min,
            max_size: max,
            ..Self::new(path, size, SizeType::Scalable)
        }
    }

    /// A `Threshold` directory with the given tolerance.
    pub fn threshold(path: impl Into<String>, size: i32, threshold: i32) -> Self {
        Self {
            threshold,
            ..Self::new(path, size, SizeType::Threshold)
        }
    }

    fn new(path: impl Into<String>, size: i32, size_type: SizeType) -> Self {
        Self {
            path: path.into(),
            size,
            size_type,
            min_size: size,
            max_size: size,
            threshold: DEFAULT_THRESHOLD,
            context: None,
        }
    }

    /// Inclusive range of sizes this directory serves without scaling.
    ///
    /// `Threshold` directories use `Size ± Threshold` both for matching and
    /// for distances; their `MinSize`/`MaxSize` keys are not consulted.
    fn bounds(&self) -> (i64, i64) {
        let size = i64::from(self.size);
        match self.size_type {
            SizeType::Fixed => (size, size),
            SizeType::Scalable => (i64::from(self.min_size), i64::from(self.max_size)),
            SizeType::Threshold => {
                let threshold = i64::from(self.threshold);
                (size - threshold, size + threshold)
            }
        }
    }

    /// Check if this directory serves `size` directly.
    pub fn matches_size(&self, size: i32) -> bool {
        let (min, max) = self.bounds();
        let size = i64::from(size);
        min <= size && size <= max
    }

    /// Distance from `size` to the nearest size this directory serves.
    ///
    /// Zero exactly when [`matches_size`](Self::matches_size) is true.
    pub fn size_distance(&self, size: i32) -> u64 {
        let (min, max) = self.bounds();
        let size = i64::from(size);
        if size < min {
            min.abs_diff(size)
        } else if size > max {
            size.abs_diff(max)
        } else {
            0
        }
    }
}

/// A parsed icon theme descriptor.
///
/// Built once by the registry and shared immutably afterwards.
#[derive(Debug, Clone)]
pub struct ThemeDescriptor {
    /// Theme name (name of the directory holding the descriptor)
    name: String,
    /// Directory holding the descriptor
    dir: PathBuf,
    /// Header group actually present in the file
    group: &'static str,
    /// Raw descriptor contents
    descriptor: Descriptor,
    /// Declared subdirectories, in declared order
    subdirectories: Vec<String>,
    /// Size rules for declared subdirectories that have a `Size`
    rules: Vec<ThemeDirectory>,
    hidden: bool,
}

impl ThemeDescriptor {
    /// Load a theme descriptor file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::from_descriptor(path, Descriptor::load(path)?)
    }

    /// Build a theme from an already parsed descriptor located at `path`.
    pub fn from_descriptor(path: &Path, descriptor: Descriptor) -> Result<Self> {
        let dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::descriptor(path, "cannot derive theme name from path"))?
            .to_string();

        let group = if descriptor.has_section(THEME_GROUP) {
            THEME_GROUP
        } else if descriptor.has_section(LEGACY_THEME_GROUP) {
            debug!(
                target: "horizon_lattice_icons::theme",
                "Theme '{}' uses the deprecated [{}] header", name, LEGACY_THEME_GROUP
            );
            LEGACY_THEME_GROUP
        } else {
            return Err(Error::descriptor(
                path,
                format!("missing [{THEME_GROUP}] group"),
            ));
        };

        let hidden = descriptor.get_bool(group, "Hidden")?.unwrap_or(false);
        let subdirectories = descriptor.get_list(group, "Directories");

        let mut theme = Self {
            name,
            dir,
            group,
            descriptor,
            subdirectories,
            rules: Vec::new(),
            hidden,
        };

        let mut rules = Vec::with_capacity(theme.subdirectories.len());
        for subdir in &theme.subdirectories {
            match theme.directory_rule(subdir)? {
                Some(rule) => rules.push(rule),
                None => debug!(
                    target: "horizon_lattice_icons::theme",
                    "Theme '{}' directory '{}' has no Size; ignoring it", theme.name, subdir
                ),
            }
        }
        theme.rules = rules;

        Ok(theme)
    }

    fn directory_rule(&self, subdir: &str) -> Result<Option<ThemeDirectory>> {
        let Some(size) = self.size(subdir)? else {
            return Ok(None);
        };
        Ok(Some(ThemeDirectory {
            path: subdir.to_string(),
            size,
            size_type: self.size_type(subdir),
            min_size: self.min_size(subdir)?.unwrap_or(size),
            max_size: self.max_size(subdir)?.unwrap_or(size),
            threshold: self.threshold(subdir)?,
            context: self.context(subdir).map(str::to_string),
        }))
    }

    /// Theme name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory containing the descriptor.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Descriptor file path.
    pub fn path(&self) -> &Path {
        self.descriptor.origin()
    }

    /// Raw descriptor, for keys this type has no accessor for.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    // ========================================================================
    // Header keys
    // ========================================================================

    /// Human-readable name, translated for `locale` when available.
    pub fn display_name(&self, locale: Option<&Locale>) -> Option<&str> {
        self.descriptor.get_locale_string(self.group, "Name", locale)
    }

    /// Theme description, translated for `locale` when available.
    pub fn comment(&self, locale: Option<&Locale>) -> Option<&str> {
        self.descriptor.get_locale_string(self.group, "Comment", locale)
    }

    /// Names of the themes this one falls back to, in declared order.
    pub fn inherits(&self) -> Vec<String> {
        self.descriptor.get_list(self.group, "Inherits")
    }

    /// Declared subdirectories, in lookup priority order.
    pub fn subdirectories(&self) -> &[String] {
        &self.subdirectories
    }

    /// Whether the theme should be hidden from theme pickers.
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    /// Example icon name used to preview the theme.
    pub fn example(&self) -> Option<&str> {
        self.descriptor.get(self.group, "Example")
    }

    /// Size rules of every usable subdirectory, in declared order.
    pub fn directory_rules(&self) -> &[ThemeDirectory] {
        &self.rules
    }

    // ========================================================================
    // Per-directory keys
    // ========================================================================

    /// Nominal size of a subdirectory.
    pub fn size(&self, subdir: &str) -> Result<Option<i32>> {
        self.descriptor.get_integer(subdir, "Size")
    }

    /// Context of a subdirectory.
    pub fn context(&self, subdir: &str) -> Option<&str> {
        self.descriptor.get(subdir, "Context")
    }

    /// Size type of a subdirectory; `Threshold` when absent or unrecognised.
    pub fn size_type(&self, subdir: &str) -> SizeType {
        match self.descriptor.get(subdir, "Type") {
            None => SizeType::default(),
            Some(raw) => SizeType::parse(raw).unwrap_or_else(|| {
                debug!(
                    target: "horizon_lattice_icons::theme",
                    "Theme '{}' directory '{}' has unknown Type '{}'", self.name, subdir, raw
                );
                SizeType::default()
            }),
        }
    }

    /// Largest size of a subdirectory; defaults to its `Size`.
    pub fn max_size(&self, subdir: &str) -> Result<Option<i32>> {
        match self.descriptor.get_integer(subdir, "MaxSize")? {
            Some(value) => Ok(Some(value)),
            None => self.size(subdir),
        }
    }

    /// Smallest size of a subdirectory; defaults to its `Size`.
    pub fn min_size(&self, subdir: &str) -> Result<Option<i32>> {
        match self.descriptor.get_integer(subdir, "MinSize")? {
            Some(value) => Ok(Some(value)),
            None => self.size(subdir),
        }
    }

    /// Threshold of a subdirectory; defaults to 2.
    pub fn threshold(&self, subdir: &str) -> Result<i32> {
        Ok(self
            .descriptor
            .get_integer(subdir, "Threshold")?
            .unwrap_or(DEFAULT_THRESHOLD))
    }
}

impl std::fmt::Display for ThemeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HICOLOR: &str = "\
[Icon Theme]
Name=Hicolor
Comment=Fallback icon theme
Hidden=true
Example=folder
Directories=48x48/apps,scalable/apps,22x22/actions,no-size

[48x48/apps]
Size=48
Context=Applications
Type=Fixed

[scalable/apps]
Size=128
MinSize=8
MaxSize=512
Type=Scalable

[22x22/actions]
Size=22
Threshold=0

[no-size]
Context=Status
";

    fn hicolor() -> ThemeDescriptor {
        let d = Descriptor::parse(HICOLOR, "/icons/hicolor/index.theme").unwrap();
        ThemeDescriptor::from_descriptor(Path::new("/icons/hicolor/index.theme"), d).unwrap()
    }

    #[test]
    fn test_header_keys() {
        let theme = hicolor();
        assert_eq!(theme.name(), "hicolor");
        assert_eq!(theme.dir(), Path::new("/icons/hicolor"));
        assert_eq!(theme.display_name(None), Some("Hicolor"));
        assert_eq!(theme.comment(None), Some("Fallback icon theme"));
        assert!(theme.hidden());
        assert_eq!(theme.example(), Some("folder"));
        assert!(theme.inherits().is_empty());
    }

    #[test]
    fn test_subdirectory_order_preserved() {
        let theme = hicolor();
        assert_eq!(
            theme.subdirectories(),
            ["48x48/apps", "scalable/apps", "22x22/actions", "no-size"]
        );
        let rules: Vec<_> = theme.directory_rules().iter().map(|d| d.path.as_str()).collect();
        assert_eq!(rules, ["48x48/apps", "scalable/apps", "22x22/actions"]);
    }

    #[test]
    fn test_per_directory_defaults() {
        let theme = hicolor();
        assert_eq!(theme.size_type("48x48/apps"), SizeType::Fixed);
        assert_eq!(theme.size_type("22x22/actions"), SizeType::Threshold);
        assert_eq!(theme.context("48x48/apps"), Some("Applications"));
        assert_eq!(theme.min_size("48x48/apps").unwrap(), Some(48));
        assert_eq!(theme.max_size("scalable/apps").unwrap(), Some(512));
        assert_eq!(theme.threshold("48x48/apps").unwrap(), 2);
        // Explicit zero is a value, not a missing key
        assert_eq!(theme.threshold("22x22/actions").unwrap(), 0);
        assert_eq!(theme.size("no-size").unwrap(), None);
    }

    #[test]
    fn test_legacy_header() {
        let text = "[KDE Icon Theme]\nName=Old\nDirectories=16x16\n\n[16x16]\nSize=16\n";
        let d = Descriptor::parse(text, "/icons/old/index.desktop").unwrap();
        let theme =
            ThemeDescriptor::from_descriptor(Path::new("/icons/old/index.desktop"), d).unwrap();
        assert_eq!(theme.display_name(None), Some("Old"));
        assert_eq!(theme.directory_rules().len(), 1);
    }

    #[test]
    fn test_missing_header_is_error() {
        let d = Descriptor::parse("[Something]\nName=x\n", "/icons/x/index.theme").unwrap();
        let err = ThemeDescriptor::from_descriptor(Path::new("/icons/x/index.theme"), d);
        assert!(matches!(err, Err(Error::Descriptor { .. })));
    }

    #[test]
    fn test_malformed_size_is_error() {
        let text = "[Icon Theme]\nDirectories=a\n\n[a]\nSize=large\n";
        let d = Descriptor::parse(text, "/icons/x/index.theme").unwrap();
        assert!(ThemeDescriptor::from_descriptor(Path::new("/icons/x/index.theme"), d).is_err());
    }

    #[test]
    fn test_unknown_type_falls_back_to_threshold() {
        let text = "[Icon Theme]\nDirectories=a\n\n[a]\nSize=16\nType=Weird\n";
        let d = Descriptor::parse(text, "/icons/x/index.theme").unwrap();
        let theme = ThemeDescriptor::from_descriptor(Path::new("/icons/x/index.theme"), d).unwrap();
        assert_eq!(theme.directory_rules()[0].size_type, SizeType::Threshold);
    }

    #[test]
    fn test_size_type_parse() {
        assert_eq!(SizeType::parse("Fixed"), Some(SizeType::Fixed));
        assert_eq!(SizeType::parse("scalable"), Some(SizeType::Scalable));
        assert_eq!(SizeType::parse("THRESHOLD"), Some(SizeType::Threshold));
        assert_eq!(SizeType::parse("other"), None);
        assert_eq!(SizeType::Scalable.as_str(), "Scalable");
    }

    #[test]
    fn test_fixed_matching() {
        let dir = ThemeDirectory::fixed("48x48/apps", 48);
        for s in 0..100 {
            assert_eq!(dir.matches_size(s), s == 48, "size {s}");
        }
        assert_eq!(dir.size_distance(32), 16);
        assert_eq!(dir.size_distance(64), 16);
        assert_eq!(dir.size_distance(48), 0);
    }

    #[test]
    fn test_threshold_matching() {
        let dir = ThemeDirectory::threshold("48x48/apps", 48, 2);
        for s in 0..100 {
            assert_eq!(dir.matches_size(s), (46..=50).contains(&s), "size {s}");
        }
        assert_eq!(dir.size_distance(40), 6);
        assert_eq!(dir.size_distance(55), 5);
        assert_eq!(dir.size_distance(47), 0);
    }

    #[test]
    fn test_scalable_matching() {
        let dir = ThemeDirectory::scalable("scalable/apps", 48, 16, 256);
        assert!(dir.matches_size(16));
        assert!(dir.matches_size(256));
        assert!(!dir.matches_size(15));
        assert!(!dir.matches_size(512));
        assert_eq!(dir.size_distance(8), 8);
        assert_eq!(dir.size_distance(300), 44);
        assert_eq!(dir.size_distance(100), 0);
    }

    #[test]
    fn test_non_positive_sizes() {
        let dir = ThemeDirectory::threshold("x", 1, 2);
        assert!(dir.matches_size(0));
        assert!(dir.matches_size(-1));
        assert!(!dir.matches_size(-2));
        assert_eq!(ThemeDirectory::fixed("y", 48).size_distance(i32::MIN), 48 + 2_147_483_648);
    }
}
