//! Project model: build configuration, package location and the
//! Dependency Resolver.

mod context;
mod import_paths;
pub mod locate;
mod session;

pub use context::{BuildContext, KNOWN_ARCH, KNOWN_OS, STD_PACKAGES, Versioned};
pub use import_paths::{ImportDecl, ImportListing, file_imports, import_paths, importable_paths};
pub use locate::{LocatedPackage, locate, locate_dir};
pub use session::{BoundCursor, Cursor, PackageStatus, ResolveOptions, Session};
