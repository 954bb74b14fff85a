fn main() {
    // Re-run if git HEAD changes (new commits, checkouts, etc.)
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=VIPS_LIB_DIR");

    let hash = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default();

    let on_tag = std::process::Command::new("git")
        .args(["describe", "--exact-match", "--tags", "HEAD"])
        .output()
        .ok()
        .is_some_and(|o| o.status.success());

    println!("cargo:rustc-env=GIT_HASH={hash}");
    println!("cargo:rustc-env=ON_RELEASE_TAG={on_tag}");

    #[cfg(feature = "libvips")]
    link_libvips();
}

/// Link libvips for the native registry.
///
/// `VIPS_LIB_DIR` points at a library directory directly; otherwise
/// pkg-config locates libvips and its GLib dependencies.
#[cfg(feature = "libvips")]
fn link_libvips() {
    if let Some(dir) = std::env::var_os("VIPS_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
        println!("cargo:rustc-link-lib=vips");
        return;
    }
    if let Err(e) = pkg_config::Config::new().atleast_version("8.10").probe("vips") {
        panic!("libvips not found via pkg-config ({e}); install libvips or set VIPS_LIB_DIR");
    }
}
