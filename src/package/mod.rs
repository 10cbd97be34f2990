// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Compiled engine packages
//!
//! An `EnginePackage` is the opaque payload handed to a bridge: the engine's
//! WebAssembly module, raw or zlib-compressed. The payload is loaded once and
//! shared by reference; every bridge that initializes from the same package
//! sees identical bytes, which the SHA-256 digest makes easy to verify.
//!
//! * `detector` - container detection, inflation and encoding checks
//! * `error` - package error types

pub mod detector;
pub mod error;

pub use detector::PackageFormat;
pub use error::{PackageError, PackageResult};

use crate::observability::messages::package::{PackageLoadFailed, PackageLoaded};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;

/// Maximum allowed size for a package on disk (16 MB)
pub const MAX_PACKAGE_SIZE: usize = 16 * 1024 * 1024;

static EMBEDDED_PACKAGE: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/engine.pkg"));

/// SHA-256 of a package's bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PackageDigest([u8; 32]);

impl PackageDigest {
    fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for PackageDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Immutable, cheaply clonable engine payload.
#[derive(Clone)]
pub struct EnginePackage {
    bytes: Arc<[u8]>,
    digest: PackageDigest,
}

impl std::fmt::Debug for EnginePackage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnginePackage")
            .field("len", &self.bytes.len())
            .field("digest", &self.digest.to_string())
            .finish()
    }
}

impl EnginePackage {
    /// Wrap bytes already in memory. The format is not checked here.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self, PackageError> {
        let bytes: Arc<[u8]> = bytes.into();
        if bytes.is_empty() {
            return Err(PackageError::Empty);
        }
        if bytes.len() > MAX_PACKAGE_SIZE {
            return Err(PackageError::TooLarge {
                size: bytes.len(),
                max: MAX_PACKAGE_SIZE,
            });
        }
        let digest = PackageDigest::of(&bytes);
        Ok(Self { bytes, digest })
    }

    /// Wrap a payload compiled into the binary.
    pub fn from_static(bytes: &'static [u8]) -> Result<Self, PackageError> {
        Self::from_bytes(bytes)
    }

    /// Read a package from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PackageError> {
        let path = path.as_ref();
        let package = std::fs::read(path)
            .map_err(PackageError::from)
            .and_then(Self::from_bytes);

        match &package {
            Ok(package) => tracing::info!(
                "{}",
                PackageLoaded {
                    source: &path.display().to_string(),
                    size_bytes: package.len(),
                    digest: &package.digest,
                }
            ),
            Err(error) => tracing::error!(
                "{}",
                PackageLoadFailed {
                    source: &path.display().to_string(),
                    error,
                }
            ),
        }
        package
    }

    /// The package embedded at build time, if one was supplied.
    pub fn embedded() -> Option<Self> {
        if EMBEDDED_PACKAGE.is_empty() {
            return None;
        }
        let package = Self::from_static(EMBEDDED_PACKAGE).ok()?;
        tracing::info!(
            "{}",
            PackageLoaded {
                source: "embedded",
                size_bytes: package.len(),
                digest: &package.digest,
            }
        );
        Some(package)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn digest(&self) -> PackageDigest {
        self.digest
    }

    pub fn format(&self) -> Result<PackageFormat, PackageError> {
        detector::detect_format(&self.bytes)
    }

    /// Bytes of the core module, inflated if needed.
    pub fn decode(&self) -> Result<Vec<u8>, PackageError> {
        detector::decode_module(&self.bytes)
    }
}
