//! Path validation.
//!
//! Storage paths are always relative to the storage root and may never leave
//! it.

use crate::error::{ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

/// Validate and normalize a storage path.
///
/// `.` components, repeated and trailing separators are dropped; `..` is
/// resolved but may not climb above the root. Null bytes and Windows path
/// prefixes are rejected, as is anything that normalizes to nothing.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use digivat_storage::validate_path;
///
/// assert!(validate_path("17/vatikan-bav-vat-lat-3225.pdf").is_ok());
/// assert!(validate_path("17/../18/file.pdf").is_ok());
/// assert!(validate_path("../outside.pdf").is_err());
/// assert!(validate_path("17/../../outside.pdf").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("./17//draft/../manuscript.pdf/").unwrap(),
///     Path::new("17/manuscript.pdf")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive Path::components() on Unix but truncate
                // paths in syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}
