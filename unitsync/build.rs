//! Stamps the unitsync binary with the revision and time it was built from

use std::process::Command;

use chrono::Utc;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    // Packaged builds have no .git; they pass the revision in instead
    let git_hash = std::env::var("UNITSYNC_GIT_HASH")
        .ok()
        .or_else(|| git(&["describe", "--always", "--dirty"]))
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!(
        "cargo:rustc-env=BUILD_TIME={}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Ok(target) = std::env::var("TARGET") {
        println!("cargo:rustc-env=BUILD_TARGET={}", target);
    }

    println!("cargo:rerun-if-env-changed=UNITSYNC_GIT_HASH");
    println!("cargo:rerun-if-changed=../.git/HEAD");
}
