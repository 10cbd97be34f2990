// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Engine package format detection and decoding
//!
//! A package is either a raw core WebAssembly module or the same module
//! wrapped in a zlib stream. Detection looks only at headers; decoding
//! inflates when needed and then confirms, using wasmparser, that the result
//! is a core module rather than a component.

use crate::package::error::{PackageError, PackageResult, PACKAGE_UNSUPPORTED_ENCODING};
use flate2::read::ZlibDecoder;
use std::io::Read;
use wasmparser::{Encoding, Parser, Payload};

/// Largest module accepted after inflation (64 MB)
pub const MAX_DECODED_SIZE: usize = 64 * 1024 * 1024;

const WASM_MAGIC: &[u8; 4] = b"\0asm";

/// Container format of an engine package.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PackageFormat {
    /// Uncompressed core module
    CoreModule,
    /// Core module inside a zlib stream
    ZlibModule,
}

impl PackageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CoreModule => "core-module",
            Self::ZlibModule => "zlib-module",
        }
    }
}

/// Identify the container format from the leading bytes.
pub fn detect_format(bytes: &[u8]) -> PackageResult<PackageFormat> {
    if bytes.is_empty() {
        return Err(PackageError::Empty);
    }
    if bytes.starts_with(WASM_MAGIC) {
        return Ok(PackageFormat::CoreModule);
    }
    if is_zlib_header(bytes) {
        return Ok(PackageFormat::ZlibModule);
    }
    Err(PackageError::Unrecognized)
}

/// RFC 1950 header: deflate method and a valid FCHECK.
fn is_zlib_header(bytes: &[u8]) -> bool {
    if bytes.len() < 2 {
        return false;
    }
    let cmf = bytes[0];
    let flg = bytes[1];
    cmf & 0x0F == 8 && cmf >> 4 <= 7 && ((u16::from(cmf) << 8) | u16::from(flg)) % 31 == 0
}

/// Decode a package into the bytes of a core module.
pub fn decode_module(bytes: &[u8]) -> PackageResult<Vec<u8>> {
    let module = match detect_format(bytes)? {
        PackageFormat::CoreModule => bytes.to_vec(),
        PackageFormat::ZlibModule => inflate(bytes)?,
    };
    ensure_core_module(&module)?;
    Ok(module)
}

fn inflate(bytes: &[u8]) -> PackageResult<Vec<u8>> {
    let mut decoded = Vec::new();
    ZlibDecoder::new(bytes)
        .take(MAX_DECODED_SIZE as u64 + 1)
        .read_to_end(&mut decoded)
        .map_err(|e| PackageError::Inflate(e.to_string()))?;

    if decoded.len() > MAX_DECODED_SIZE {
        return Err(PackageError::TooLarge {
            size: decoded.len(),
            max: MAX_DECODED_SIZE,
        });
    }
    Ok(decoded)
}

/// Confirm `bytes` is a core module; components are rejected.
pub fn ensure_core_module(bytes: &[u8]) -> PackageResult<()> {
    let parser = Parser::new(0);
    let mut encoding = None;

    for payload in parser.parse_all(bytes) {
        if let Payload::Version { encoding: enc, .. } = payload? {
            encoding = Some(enc);
        }
    }

    match encoding {
        Some(Encoding::Module) => Ok(()),
        Some(Encoding::Component) => Err(PackageError::UnsupportedEncoding(
            PACKAGE_UNSUPPORTED_ENCODING.to_string(),
        )),
        None => Err(PackageError::Unrecognized),
    }
}
