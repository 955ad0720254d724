use std::process::Command;
use std::env;

fn main() {
    set_build_info();
    set_platform_config();

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
}

fn set_build_info() {
    let build_time = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);

    let commit = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=GIT_COMMIT={}", commit);

    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=TARGET_TRIPLE={}", target);
}

fn set_platform_config() {
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();

    // Tells the platform module which command dialect the build targets.
    let family = match target_os.as_str() {
        "windows" => "windows",
        "macos" => "macos",
        _ => "linux",
    };
    println!("cargo:rustc-env=NDT_TARGET_FAMILY={}", family);
}
