// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for engine package loading and decoding.

use thiserror::Error;

/// Error message for component-model binaries handed in as engine packages.
///
/// The engine ABI is defined over exports of a core module; components
/// cannot be linked against it.
pub const PACKAGE_UNSUPPORTED_ENCODING: &str = "Unsupported engine package: Component Model binary detected. \
The engine must be shipped as a core WebAssembly module, optionally zlib-compressed.";

/// Errors raised while loading, identifying or decoding an `EnginePackage`.
#[derive(Error, Debug)]
pub enum PackageError {
    /// The payload has no bytes.
    #[error("engine package is empty")]
    Empty,

    /// File I/O error during package loading.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Size limit exceeded, either on disk or after inflation.
    #[error("engine package too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },

    /// Neither a WebAssembly header nor a zlib header was found.
    #[error("unrecognized engine package format")]
    Unrecognized,

    /// The zlib stream could not be inflated.
    #[error("failed to inflate engine package: {0}")]
    Inflate(String),

    /// Unsupported WASM encoding (component model).
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// WASM binary parsing error from wasmparser.
    #[error("WASM parser error: {0}")]
    Parser(#[from] wasmparser::BinaryReaderError),
}

pub type PackageResult<T> = Result<T, PackageError>;
