use assert_cmd::prelude::*;
use image::{GenericImageView, Rgba, RgbaImage};
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn write_sample(path: &Path, width: u32, height: u32) {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        if x == width / 3 || y == height / 2 {
            Rgba([220, 40, 40, 255])
        } else {
            Rgba([(x * 8) as u8, (y * 8) as u8, 128, 255])
        }
    });
    image.save(path).unwrap();
}

#[test]
fn shrinks_an_image() {
    let dir = tempdir().unwrap();
    let (input, output) = (dir.path().join("in.png"), dir.path().join("out.png"));
    write_sample(&input, 24, 16);

    Command::cargo_bin("liquidcarve")
        .unwrap()
        .arg(&input)
        .arg(&output)
        .args(&["--width", "17", "--height", "12"])
        .assert()
        .success();

    let out = image::open(&output).unwrap();
    assert_eq!(out.dimensions(), (17, 12));
}

#[test]
fn enlarges_with_a_layer() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.png");
    let layer = dir.path().join("layer.png");
    let (output, layer_output) = (dir.path().join("out.png"), dir.path().join("layer-out.png"));
    write_sample(&input, 20, 10);
    write_sample(&layer, 20, 10);

    Command::cargo_bin("liquidcarve")
        .unwrap()
        .arg(&input)
        .arg(&output)
        .args(&["--width", "31", "--enl-step", "1.5", "--rigidity", "0.5"])
        .arg("--layer")
        .arg(&layer)
        .arg("--layer-output")
        .arg(&layer_output)
        .assert()
        .success();

    assert_eq!(image::open(&output).unwrap().dimensions(), (31, 10));
    assert_eq!(image::open(&layer_output).unwrap().dimensions(), (31, 10));
}

#[test]
fn writes_pam_to_stdout() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.png");
    write_sample(&input, 8, 6);

    Command::cargo_bin("liquidcarve")
        .unwrap()
        .arg(&input)
        .args(&["--width", "6"])
        .assert()
        .success()
        .stdout(predicate::function(|out: &[u8]| out.starts_with(b"P7")));
}

#[test]
fn dumps_the_energy_map() {
    let dir = tempdir().unwrap();
    let (input, energy) = (dir.path().join("in.png"), dir.path().join("energy.png"));
    write_sample(&input, 12, 9);

    Command::cargo_bin("liquidcarve")
        .unwrap()
        .arg(&input)
        .arg(dir.path().join("out.png"))
        .arg("--energy")
        .arg(&energy)
        .assert()
        .success();

    assert_eq!(image::open(&energy).unwrap().dimensions(), (12, 9));
}

#[test]
fn mismatched_masks_are_reported() {
    let dir = tempdir().unwrap();
    let (input, mask) = (dir.path().join("in.png"), dir.path().join("mask.png"));
    write_sample(&input, 12, 9);
    write_sample(&mask, 5, 5);

    Command::cargo_bin("liquidcarve")
        .unwrap()
        .arg(&input)
        .arg(dir.path().join("out.png"))
        .arg("--preserve")
        .arg(&mask)
        .assert()
        .failure()
        .stderr(predicate::str::contains("5x5"));
}

#[test]
fn rejects_a_zero_width() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.png");
    write_sample(&input, 6, 6);

    Command::cargo_bin("liquidcarve")
        .unwrap()
        .arg(&input)
        .arg(dir.path().join("out.png"))
        .args(&["--width", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid geometry"));
}
