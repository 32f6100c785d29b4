//! Build script recording the compiler version for the `User-Agent` header.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let rustc = rustc_version::version()
        .map(|version| format!("rustc{version}"))
        .unwrap_or_else(|_| "rustc-unknown".to_string());

    println!("cargo:rustc-env=OPSGENIE_RUSTC_VERSION={rustc}");
}
