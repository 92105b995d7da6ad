//! Per-icon metadata files.
//!
//! An icon may ship a sibling `<file>.icon` descriptor, e.g.
//! `folder.png.icon` next to `folder.png`, carrying a `[Icon Data]` group with
//! a translated display name and layout hints.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::descriptor::{Descriptor, Locale};
use crate::error::Result;

/// Group holding icon metadata.
pub const ICON_DATA_GROUP: &str = "Icon Data";

/// Suffix appended to an icon file name to find its metadata.
pub const ICON_DATA_SUFFIX: &str = ".icon";

/// Parsed `.icon` metadata.
#[derive(Debug, Clone)]
pub struct IconData {
    descriptor: Descriptor,
}

impl IconData {
    /// Display name, translated for `locale` when available.
    pub fn display_name(&self, locale: Option<&Locale>) -> Option<&str> {
        self.descriptor
            .get_locale_string(ICON_DATA_GROUP, "DisplayName", locale)
    }

    /// The metadata file.
    pub fn path(&self) -> &Path {
        self.descriptor.origin()
    }

    /// Raw descriptor, for keys this type has no accessor for.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }
}

/// Path of the metadata file belonging to `icon_path`.
pub fn icon_data_path(icon_path: &Path) -> PathBuf {
    let mut name = OsString::from(icon_path.as_os_str());
    name.push(ICON_DATA_SUFFIX);
    PathBuf::from(name)
}

/// Load the metadata of a resolved icon.
///
/// Returns `Ok(None)` if the icon or its metadata file doesn't exist, and an
/// error if the metadata file exists but can't be read or parsed.
pub fn icon_data(icon_path: impl AsRef<Path>) -> Result<Option<IconData>> {
    let icon_path = icon_path.as_ref();
    if !icon_path.is_file() {
        return Ok(None);
    }

    let data_path = icon_data_path(icon_path);
    if !data_path.is_file() {
        return Ok(None);
    }

    Ok(Some(IconData {
        descriptor: Descriptor::load(&data_path)?,
    }))
}
