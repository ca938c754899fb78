use std::path::{Path, PathBuf};

/// Nearest `VERSION` file at or above the crate directory.
fn version_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join("VERSION"))
        .find(|file| file.is_file())
}

fn main() {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    // Release builds stamp the workspace VERSION; a bare crate checkout
    // falls back to the package version.
    let version = match version_file(&manifest_dir) {
        Some(file) => {
            println!("cargo:rerun-if-changed={}", file.display());
            std::fs::read_to_string(&file)
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|e| panic!("reading {}: {e}", file.display()))
        }
        None => env!("CARGO_PKG_VERSION").to_string(),
    };

    println!("cargo:rustc-env=TUYATRAY_VERSION={version}");
    tauri_build::build()
}
