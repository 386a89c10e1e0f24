use std::path::PathBuf;

use image::{Rgba, RgbaImage};

#[test]
fn cli_writes_a_gif_from_a_directory_of_stills() {
    let dir = PathBuf::from("target").join("cli_smoke");
    let img_dir = dir.join("images");
    std::fs::create_dir_all(&img_dir).unwrap();

    let out_path = dir.join("out.gif");
    let _ = std::fs::remove_file(&out_path);

    RgbaImage::from_pixel(6, 6, Rgba([200, 40, 40, 255]))
        .save(img_dir.join("frame_a.png"))
        .unwrap();
    RgbaImage::from_pixel(6, 6, Rgba([40, 200, 40, 255]))
        .save(img_dir.join("frame_b.png"))
        .unwrap();

    let exe = std::env::var_os("CARGO_BIN_EXE_giflapse")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "giflapse.exe"
            } else {
                "giflapse"
            });
            p
        });

    let in_arg = img_dir.to_string_lossy().to_string();
    let out_arg = out_path.to_string_lossy().to_string();

    let status = std::process::Command::new(exe)
        .args([
            "--in-dir",
            in_arg.as_str(),
            "--out",
            out_arg.as_str(),
            "--delay-ms",
            "50",
            "--background",
            "#FFFFFF",
        ])
        .status()
        .unwrap();

    assert!(status.success());
    let bytes = std::fs::read(&out_path).unwrap();
    assert!(bytes.starts_with(b"GIF89a"));
}

#[test]
fn cli_fails_on_an_empty_directory() {
    let dir = PathBuf::from("target").join("cli_smoke_empty");
    let img_dir = dir.join("images");
    std::fs::create_dir_all(&img_dir).unwrap();

    let out_path = dir.join("out.gif");
    let _ = std::fs::remove_file(&out_path);

    let exe = std::env::var_os("CARGO_BIN_EXE_giflapse")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target").join("debug").join("giflapse"));

    let in_arg = img_dir.to_string_lossy().to_string();
    let out_arg = out_path.to_string_lossy().to_string();

    let status = std::process::Command::new(exe)
        .args(["--in-dir", in_arg.as_str(), "--out", out_arg.as_str()])
        .status()
        .unwrap();

    assert!(!status.success());
    assert!(!out_path.exists());
}
