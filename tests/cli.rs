//! Drives the compiled `picserve` binary.

use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn picserve(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_picserve"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn assert_success(out: &Output) {
    assert!(
        out.status.success(),
        "picserve failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
}

fn write_png(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 0]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    std::fs::write(path, buf).unwrap();
}

#[test]
fn gen_config_prints_stock_file() {
    let tmp = TempDir::new().unwrap();
    let out = picserve(tmp.path(), &["gen-config"]);
    assert_success(&out);
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("[pipeline]"));
    assert!(stdout.contains("default_quality = 75"));
}

#[test]
fn process_writes_resized_output() {
    let tmp = TempDir::new().unwrap();
    write_png(&tmp.path().join("in.png"), 200, 100);

    let out = picserve(
        tmp.path(),
        &["process", "in.png", "format=jpeg", "resize.width=50", "-o", "out.jpg"],
    );
    assert_success(&out);

    let written = image::open(tmp.path().join("out.jpg")).unwrap();
    assert_eq!((written.width(), written.height()), (50, 25));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("→ out.jpg (jpeg, 50x25"), "{stdout}");
}

#[test]
fn process_reports_bad_param() {
    let tmp = TempDir::new().unwrap();
    write_png(&tmp.path().join("in.png"), 10, 10);

    let out = picserve(tmp.path(), &["process", "in.png", "resize.width=-1"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("resize.width"));
}

#[test]
fn pack_then_unpack_restores_bytes() {
    let tmp = TempDir::new().unwrap();
    write_png(&tmp.path().join("in.png"), 8, 8);

    assert_success(&picserve(tmp.path(), &["pack", "in.png", "in.pic"]));
    assert_success(&picserve(tmp.path(), &["unpack", "in.pic", "back.png"]));

    let original = std::fs::read(tmp.path().join("in.png")).unwrap();
    let restored = std::fs::read(tmp.path().join("back.png")).unwrap();
    assert_eq!(original, restored);

    let packed = std::fs::read(tmp.path().join("in.pic")).unwrap();
    assert_eq!(&packed[..7], &[3, 0, 0, 0, b'p', b'n', b'g']);
}

#[test]
fn config_file_changes_resize_key() {
    let tmp = TempDir::new().unwrap();
    write_png(&tmp.path().join("in.png"), 40, 40);
    std::fs::write(
        tmp.path().join("picserve.toml"),
        "[resize]\nparam = \"nfntresize\"\n",
    )
    .unwrap();

    let out = picserve(
        tmp.path(),
        &["process", "in.png", "nfntresize.width=20", "-o", "small.png"],
    );
    assert_success(&out);
    assert_eq!(image::open(tmp.path().join("small.png")).unwrap().width(), 20);
}

#[test]
fn batch_processes_directory() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join("in")).unwrap();
    write_png(&tmp.path().join("in/a.png"), 30, 30);
    write_png(&tmp.path().join("in/b.png"), 60, 30);

    let out = picserve(
        tmp.path(),
        &["batch", "in", "-o", "out", "format=gif", "resize.width=15"],
    );
    assert_success(&out);
    assert!(tmp.path().join("out/a.gif").exists());
    assert!(tmp.path().join("out/b.gif").exists());
    assert!(String::from_utf8(out.stdout).unwrap().contains("Processed 2 images"));
}
