//! Stamps muslib-songs with its source revision
//!
//! Sets for both the library and the binary:
//! - `MUSLIB_GIT_HASH`: short commit, `-dirty` when the tree has local edits
//! - `MUSLIB_BUILD_TIMESTAMP`: UTC, RFC 3339
//! - `MUSLIB_BUILD_PROFILE`: cargo profile
//! - `MUSLIB_BUILD_ID`: `<version>+<hash>`, reported by `/health`

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn main() {
    let git_hash = match git(&["rev-parse", "--short=8", "HEAD"]) {
        Some(hash) => {
            let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
                .map(|status| !status.is_empty())
                .unwrap_or(false);
            if dirty {
                format!("{}-dirty", hash)
            } else {
                hash
            }
        }
        None => "unknown".to_string(),
    };

    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    println!("cargo:rustc-env=MUSLIB_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=MUSLIB_BUILD_TIMESTAMP={}", timestamp);
    println!("cargo:rustc-env=MUSLIB_BUILD_PROFILE={}", profile);
    println!("cargo:rustc-env=MUSLIB_BUILD_ID={}+{}", version, git_hash);

    // Re-stamp when the checked-out commit moves or a source file changes
    if let Some(head) = git(&["rev-parse", "--git-path", "HEAD"]) {
        println!("cargo:rerun-if-changed={}", head);
    }
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=build.rs");
}
