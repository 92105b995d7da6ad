//! Freedesktop icon theme lookup for Horizon Lattice.
//!
//! This crate resolves a symbolic icon name such as `"firefox"` and a pixel
//! size to an icon file on disk, following the freedesktop icon theme layout:
//!
//! - **Descriptors**: `index.theme` files parsed into typed [`ThemeDescriptor`]s
//! - **Inheritance**: themes fall back to the themes they inherit from, and
//!   finally to `hicolor`
//! - **Size matching**: `Fixed`, `Scalable` and `Threshold` directories, with a
//!   closest-size fallback when nothing matches exactly
//! - **Caching**: directory listings are reused and only re-read after a poll
//!   interval when the directory changed
//!
//! The crate doesn't decode or render images and doesn't watch the filesystem.
//!
//! # Example
//!
//! ```no_run
//! use horizon_lattice_icons::prelude::*;
//!
//! let config = IconThemeConfig::new().add_search_path("/opt/myapp/icons");
//! let mut resolver = IconResolver::with_config(config);
//!
//! match resolver.resolve("document-save", 24, "Adwaita", &["svg", "png"])? {
//!     Some(path) => println!("found {}", path.display()),
//!     None => println!("no icon"),
//! }
//! # Ok::<(), horizon_lattice_icons::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod descriptor;
pub mod icon_data;
pub mod registry;
pub mod resolver;
pub mod theme;

mod error;

pub use cache::DirectoryCache;
pub use config::IconThemeConfig;
pub use descriptor::{Descriptor, Locale};
pub use error::{Error, Result};
pub use icon_data::{IconData, icon_data};
pub use registry::{ThemeChain, ThemeRegistry};
pub use resolver::{IconResolver, SharedIconResolver};
pub use theme::{SizeType, ThemeDescriptor, ThemeDirectory};

/// Prelude module with commonly used types.
pub mod prelude {
    pub use crate::config::IconThemeConfig;
    pub use crate::descriptor::Locale;
    pub use crate::icon_data::{IconData, icon_data};
    pub use crate::registry::ThemeRegistry;
    pub use crate::resolver::{IconResolver, SharedIconResolver};
    pub use crate::theme::{SizeType, ThemeDescriptor, ThemeDirectory};
}
