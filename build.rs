use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=FFMPEG_DIR");
    println!("cargo:rerun-if-env-changed=VCPKG_ROOT");
    println!("cargo:rerun-if-env-changed=VCPKGRS_TRIPLET");

    // Only the FFmpeg source links native libraries.
    if env::var_os("CARGO_FEATURE_FFMPEG").is_none() {
        return;
    }

    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "windows" {
        return;
    }

    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=framepager: FFMPEG_DIR is not set. Build without default features, or point FFMPEG_DIR at an FFmpeg install (vcpkg works)."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(&vcpkg_root).join("installed").join(&triplet);

    if candidate.join("include").join("libavformat").exists() {
        println!(
            "cargo:warning=framepager: found FFmpeg under {}; set FFMPEG_DIR to it to silence this message.",
            candidate.display(),
        );
    } else {
        println!(
            "cargo:warning=framepager: VCPKG_ROOT is set but {} has no FFmpeg headers.",
            candidate.display(),
        );
    }
}
