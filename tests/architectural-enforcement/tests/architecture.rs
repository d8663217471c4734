//! Source-tree checks for the engine's architectural rules.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Workspace root, resolved from this crate's manifest location.
fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .canonicalize()
        .expect("workspace root should resolve")
}

/// All Rust sources under a directory.
fn rust_sources(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| e.path().to_path_buf())
        .collect()
}

/// Strip `#[cfg(test)] mod tests { .. }` blocks so test-only code is exempt.
fn without_test_modules(source: &str) -> String {
    let Some(start) = source.find("#[cfg(test)]") else {
        return source.to_string();
    };
    source[..start].to_string()
}

#[test]
fn core_has_no_ui_dependencies() {
    let manifest = workspace_root().join("director/core/Cargo.toml");
    let contents = fs::read_to_string(&manifest).expect("core manifest should be readable");

    for forbidden in ["ratatui", "crossterm", "egui", "eframe", "iced", "gtk"] {
        assert!(
            !contents.contains(forbidden),
            "director-core must not depend on UI crate {forbidden}"
        );
    }
}

#[test]
fn no_blocking_sleep_in_production_code() {
    let core_src = workspace_root().join("director/core/src");

    for path in rust_sources(&core_src) {
        let source = fs::read_to_string(&path).expect("source should be readable");
        let production = without_test_modules(&source);
        assert!(
            !production.contains("std::thread::sleep"),
            "{} blocks the async runtime with std::thread::sleep",
            path.display()
        );
    }
}

#[test]
fn no_unwrap_in_production_code() {
    let core_src = workspace_root().join("director/core/src");

    // Mutex poisoning recovery uses into_inner, which is fine; plain
    // `.unwrap()` outside tests is not.
    let mut offenders = Vec::new();
    for path in rust_sources(&core_src) {
        let source = fs::read_to_string(&path).expect("source should be readable");
        let production = without_test_modules(&source);
        for (number, line) in production.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with("//") {
                continue;
            }
            if trimmed.contains(".unwrap()") && !trimmed.contains("unwrap_or") {
                offenders.push(format!("{}:{}", path.display(), number + 1));
            }
        }
    }

    assert!(
        offenders.is_empty(),
        "production code must propagate errors, found unwrap() at: {offenders:?}"
    );
}

#[test]
fn every_core_module_is_documented() {
    let core_src = workspace_root().join("director/core/src");

    for path in rust_sources(&core_src) {
        let source = fs::read_to_string(&path).expect("source should be readable");
        assert!(
            source.lines().any(|line| line.starts_with("//!")),
            "{} is missing module documentation",
            path.display()
        );
    }
}
