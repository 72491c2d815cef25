//! Cassette replay integration tests, zero network I/O.
//!
//! All tests set `TRYON_REPLAY` to a cassette file path so that the binary
//! never contacts the live API.

use assert_cmd::Command;
use base64::Engine;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn cmd() -> Command {
    assert_cmd::cargo::cargo_bin_cmd!("tryon")
}

/// Absolute path to the `test_fixtures` directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_fixtures")
}

fn fixture(name: &str) -> String {
    fixtures_dir().join(name).to_string_lossy().into_owned()
}

/// A replaying command with the live credentials scrubbed.
fn replaying(cassette: &str) -> Command {
    let mut cmd = cmd();
    cmd.env("TRYON_REPLAY", cassette).env_remove("GEMINI_API_KEY").env_remove("API_KEY");
    cmd
}

fn fresh_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn generate_args(out: &Path) -> Vec<String> {
    vec![
        "generate".into(),
        "--selfie".into(),
        fixture("selfie.png"),
        "--outfit".into(),
        fixture("outfit.png"),
        "--output".into(),
        out.to_string_lossy().into_owned(),
    ]
}

#[test]
fn generate_happy_path_creates_file() {
    let dir = fresh_dir("tryon_test_generate_happy");
    let out = dir.join("look.png");

    replaying(&fixture("try_on.cassette.yaml"))
        .args(generate_args(&out))
        .assert()
        .success()
        .stderr(predicate::str::contains("Styling your look..."))
        .stderr(predicate::str::contains("Model: Here is your new look."))
        .stderr(predicate::str::contains("Saved:"));

    let data = std::fs::read(&out).unwrap();
    assert_eq!(data[..8], PNG_MAGIC);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn auto_filename_uses_kebab_case_with_timestamp() {
    let dir = fresh_dir("tryon_test_autofile");

    replaying(&fixture("try_on.cassette.yaml"))
        .args([
            "generate",
            "-s",
            &fixture("selfie.png"),
            "-u",
            &fixture("outfit.png"),
        ])
        .current_dir(&dir)
        .assert()
        .success();

    let files: Vec<_> = std::fs::read_dir(&dir).unwrap().flatten().collect();
    assert_eq!(files.len(), 1, "Exactly one file should be created");
    let name = files[0].file_name();
    let name = name.to_string_lossy();
    assert!(name.starts_with("try-on-"), "Filename should start with 'try-on-', got: {name}");
    assert!(name.ends_with(".png"), "Filename should end with .png, got: {name}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn generate_then_background_names_file_after_last_step() {
    let dir = fresh_dir("tryon_test_background");

    replaying(&fixture("try_on_then_background.cassette.yaml"))
        .args([
            "generate",
            "-s",
            &fixture("selfie.png"),
            "-u",
            &fixture("outfit.png"),
            "--background",
            "runway",
        ])
        .current_dir(&dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Changing background to Runway..."))
        .stderr(predicate::str::contains("Model: Moved you onto the runway."));

    let files: Vec<_> = std::fs::read_dir(&dir).unwrap().flatten().collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name();
    let name = name.to_string_lossy();
    assert!(name.starts_with("runway-background-"), "got: {name}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn refine_existing_image() {
    let dir = fresh_dir("tryon_test_refine");
    let out = dir.join("edited.png");

    // The first recorded reply is enough for a single edit.
    replaying(&fixture("try_on.cassette.yaml"))
        .args([
            "refine",
            &fixture("selfie.png"),
            "--edit",
            "add a red scarf",
            "--output",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Applying your edits..."))
        .stderr(predicate::str::contains("Saved:"));

    assert!(out.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn text_only_reply_reports_model_text() {
    let dir = fresh_dir("tryon_test_text_only");
    let out = dir.join("look.png");

    replaying(&fixture("text_only.cassette.yaml"))
        .args(generate_args(&out))
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "The model could not process the request: I can only edit photos",
        ));

    assert!(!out.exists(), "No file should be written without an image");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn failed_refinement_keeps_last_good_image() {
    let dir = fresh_dir("tryon_test_refine_fails");
    let out = dir.join("look.png");

    let mut args = generate_args(&out);
    args.extend(["--edit".to_string(), "make it sparkle".to_string()]);

    replaying(&fixture("refine_fails.cassette.yaml"))
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Saved:"))
        .stderr(predicate::str::contains("The model is overloaded"))
        .stderr(predicate::str::contains("Please try again"));

    assert!(out.exists(), "The generated image should survive a failed refinement");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn exhausted_cassette_is_reported() {
    let dir = fresh_dir("tryon_test_exhausted");
    let out = dir.join("edited.png");

    // One recorded reply, two edits: the first edit's image is still saved.
    replaying(&fixture("try_on.cassette.yaml"))
        .args([
            "refine",
            &fixture("selfie.png"),
            "-e",
            "first",
            "-e",
            "second",
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cassette exhausted"));

    assert!(out.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn empty_selfie_is_rejected() {
    let dir = fresh_dir("tryon_test_empty_selfie");
    let selfie = dir.join("empty.jpg");
    std::fs::write(&selfie, b"").unwrap();

    replaying(&fixture("try_on.cassette.yaml"))
        .args([
            "generate",
            "-s",
            selfie.to_str().unwrap(),
            "-u",
            &fixture("outfit.png"),
            "-o",
            dir.join("look.png").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing input"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn format_jpeg_converts_png_reply() {
    let dir = fresh_dir("tryon_test_convert");
    let out = dir.join("look.jpg");

    replaying(&fixture("try_on.cassette.yaml"))
        .args([
            "generate",
            "-s",
            &fixture("selfie.png"),
            "-u",
            &fixture("outfit.png"),
            "--format",
            "jpeg",
            "--output",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let data = std::fs::read(&out).unwrap();
    assert_eq!(&data[..3], &[0xFF, 0xD8, 0xFF], "Output should be a JPEG file");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn jpeg_reply_saved_as_png() {
    // Embed a real 1x1 JPEG in a temporary cassette and check that the
    // default output format re-encodes it.
    let jpeg_bytes = {
        let img = image::DynamicImage::new_rgb8(1, 1);
        let mut buf = std::io::Cursor::new(Vec::<u8>::new());
        img.write_to(&mut buf, image::ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    };
    let b64 = base64::engine::general_purpose::STANDARD.encode(&jpeg_bytes);

    let cassette_content = format!(
        "name: convert-test\nrecorded_at: \"2026-02-01T00:00:00Z\"\ncommit: test\ninteractions:\n  - seq: 0\n    port: capability\n    method: submit\n    input: {{}}\n    output:\n      Ok:\n        candidates:\n          - parts:\n              - image:\n                  data: {b64}\n                  mime_type: image/jpeg\n"
    );

    let dir = fresh_dir("tryon_test_jpeg_reply");
    let cassette_path = dir.join("convert.cassette.yaml");
    std::fs::write(&cassette_path, &cassette_content).unwrap();
    let out = dir.join("look.png");

    replaying(cassette_path.to_str().unwrap())
        .args(generate_args(&out))
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved:"));

    let data = std::fs::read(&out).unwrap();
    assert_eq!(data[..8], PNG_MAGIC, "Output should be a valid PNG file");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn accessorize_with_compare_writes_before_and_after() {
    let dir = fresh_dir("tryon_test_compare");
    let out = dir.join("look.png");

    let mut args = generate_args(&out);
    args.extend(["--accessorize".to_string(), "--compare".to_string()]);

    replaying(&fixture("try_on_then_background.cassette.yaml"))
        .args(args)
        .assert()
        .success()
        .stderr(predicate::str::contains("Applying your edits..."))
        .stderr(predicate::str::contains("Saved comparison:"));

    assert!(out.exists());
    let compare = image::open(dir.join("look-compare.png")).unwrap();
    assert_eq!((compare.width(), compare.height()), (2, 1), "selfie and result side by side");
    let _ = std::fs::remove_dir_all(&dir);
}
