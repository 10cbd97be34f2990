// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::fs;
use std::path::PathBuf;

const PACKAGE_ENV: &str = "SWITCHBOARD_ENGINE_PACKAGE";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let target = out_dir.join("engine.pkg");

    // An empty blob means "nothing embedded"; EnginePackage::embedded() returns None.
    match env::var_os(PACKAGE_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            fs::copy(&path, &target)?;
            println!("cargo:rerun-if-changed={}", path.display());
        }
        None => fs::write(&target, [])?,
    }

    println!("cargo:rerun-if-env-changed={PACKAGE_ENV}");
    Ok(())
}
