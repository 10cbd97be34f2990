// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for engine package loading.

use crate::package::PackageDigest;
use std::fmt::{Display, Formatter};

/// Package loaded successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PackageLoaded<'a> {
    pub source: &'a str,
    pub size_bytes: usize,
    pub digest: &'a PackageDigest,
}

impl Display for PackageLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded engine package: {} ({} bytes, sha256 {})",
            self.source, self.size_bytes, self.digest
        )
    }
}

/// Package loading failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_switchboard::observability::messages::package::PackageLoadFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
/// let msg = PackageLoadFailed {
///     source: "engine/missing.wasm",
///     error: &error,
/// };
///
/// assert!(msg.to_string().contains("engine/missing.wasm"));
/// ```
pub struct PackageLoadFailed<'a> {
    pub source: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for PackageLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to load engine package '{}': {}",
            self.source, self.error
        )
    }
}
