//! End-to-end batches through the real encoder.
//!
//! Each test writes its fixtures into a temp dir, runs [`process::process`]
//! with [`RustBackend`], and checks the files that land on disk.

use image::{ImageFormat, Rgb, RgbImage};
use photo_fit::imaging::{DimensionConstraints, RustBackend, TargetFormat, TargetSpec, size_kb};
use photo_fit::intake::{Adjustments, Rotation};
use photo_fit::pdf::Orientation;
use photo_fit::process::{
    self, NO_FIT_MESSAGE, OutputLocation, Outcome, ProcessOptions, ProcessReport,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Smooth gradients: compresses well, like a typical photo background.
fn smooth(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

/// Per-pixel hash noise: defeats JPEG, so budgets bite.
fn noise(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let mut h = x.wrapping_mul(0x9E37_79B9) ^ y.wrapping_mul(0x85EB_CA6B);
        h ^= h >> 15;
        h = h.wrapping_mul(0x2C1B_3C6D);
        h ^= h >> 12;
        Rgb([h as u8, (h >> 8) as u8, (h >> 16) as u8])
    })
}

fn save(dir: &Path, name: &str, img: &RgbImage, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    img.save_with_format(&path, format).unwrap();
    path
}

fn run(inputs: &[PathBuf], spec: TargetSpec, output: OutputLocation) -> ProcessReport {
    let options = ProcessOptions {
        spec,
        adjustments: Adjustments::default(),
        output,
    };
    process::process(&RustBackend::new(), inputs, &options, None).unwrap()
}

fn spec(max_size_kb: f64, format: TargetFormat, auto_resize: bool) -> TargetSpec {
    TargetSpec::new(
        Some(max_size_kb),
        format,
        DimensionConstraints::default(),
        auto_resize,
    )
}

fn written(outcome: &Outcome) -> (PathBuf, u32, u32, f64) {
    match outcome {
        Outcome::Written {
            output,
            width,
            height,
            size_kb,
            ..
        } => (output.clone(), *width, *height, *size_kb),
        other => panic!("expected a written output, got {other:?}"),
    }
}

// =========================================================================
// JPEG
// =========================================================================

#[test]
fn large_png_becomes_capped_jpeg_under_budget() {
    let tmp = TempDir::new().unwrap();
    let input = save(tmp.path(), "scan.png", &smooth(1600, 1200), ImageFormat::Png);

    let report = run(
        &[input],
        spec(50.0, TargetFormat::Jpeg, false),
        OutputLocation::BesideSource,
    );

    let (output, width, height, reported_kb) = written(&report.results[0].outcome);
    assert_eq!(output, tmp.path().join("scan_compressed.jpg"));
    assert_eq!((width, height), (1200, 900));
    assert!(reported_kb <= 50.0);

    let on_disk = std::fs::metadata(&output).unwrap().len() as usize;
    assert!(size_kb(on_disk) <= 50.0);
    assert_eq!(image::image_dimensions(&output).unwrap(), (1200, 900));
}

#[test]
fn explicit_width_keeps_aspect_ratio() {
    let tmp = TempDir::new().unwrap();
    let input = save(tmp.path(), "photo.jpg", &smooth(800, 600), ImageFormat::Jpeg);
    let spec = TargetSpec::new(
        Some(50.0),
        TargetFormat::Jpeg,
        DimensionConstraints::from_raw(Some(400.0), None),
        false,
    );

    let report = run(&[input], spec, OutputLocation::BesideSource);

    let (output, width, height, _) = written(&report.results[0].outcome);
    assert_eq!((width, height), (400, 300));
    assert_eq!(image::image_dimensions(&output).unwrap(), (400, 300));
}

#[test]
fn rotation_is_applied_before_compression() {
    let tmp = TempDir::new().unwrap();
    let input = save(tmp.path(), "side.png", &smooth(300, 200), ImageFormat::Png);
    let options = ProcessOptions {
        spec: spec(50.0, TargetFormat::Jpeg, false),
        adjustments: Adjustments {
            rotation: Rotation::Cw90,
            crop: None,
        },
        output: OutputLocation::BesideSource,
    };

    let report = process::process(&RustBackend::new(), &[input], &options, None).unwrap();

    let (_, width, height, _) = written(&report.results[0].outcome);
    assert_eq!((width, height), (200, 300));
}

// =========================================================================
// PDF
// =========================================================================

#[test]
fn pdf_target_writes_single_page_document() {
    let tmp = TempDir::new().unwrap();
    let input = save(tmp.path(), "id.png", &smooth(300, 200), ImageFormat::Png);
    let out_dir = tmp.path().join("out");

    let report = run(
        &[input],
        spec(50.0, TargetFormat::Pdf, false),
        OutputLocation::Directory(out_dir.clone()),
    );

    let outcome = &report.results[0].outcome;
    let (output, width, height, _) = written(outcome);
    assert_eq!(output, out_dir.join("id_compressed.pdf"));
    assert!(matches!(
        outcome,
        Outcome::Written {
            orientation: Some(Orientation::Landscape),
            ..
        }
    ));

    let doc = lopdf::Document::load(&output).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1);
    let page = doc
        .get_dictionary(*pages.values().next().unwrap())
        .unwrap();
    let media_box: Vec<i64> = page
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o.as_i64().unwrap())
        .collect();
    assert_eq!(media_box, vec![0, 0, width as i64, height as i64]);
}

#[test]
fn portrait_pdf_reports_portrait() {
    let tmp = TempDir::new().unwrap();
    let input = save(tmp.path(), "tall.png", &smooth(200, 300), ImageFormat::Png);

    let report = run(
        &[input],
        spec(50.0, TargetFormat::Pdf, false),
        OutputLocation::BesideSource,
    );

    assert!(matches!(
        report.results[0].outcome,
        Outcome::Written {
            orientation: Some(Orientation::Portrait),
            ..
        }
    ));
}

// =========================================================================
// Rejection and no-fit
// =========================================================================

#[test]
fn gif_is_rejected_without_writing() {
    let tmp = TempDir::new().unwrap();
    let gif = tmp.path().join("anim.gif");
    std::fs::write(&gif, b"GIF89a\x01\x00\x01\x00\x00\x00\x00;").unwrap();

    let report = run(
        &[gif],
        spec(50.0, TargetFormat::Jpeg, false),
        OutputLocation::BesideSource,
    );

    match &report.results[0].outcome {
        Outcome::Rejected { reason } => assert!(reason.contains("only JPEG and PNG")),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(!tmp.path().join("anim_compressed.jpg").exists());
    assert!(!report.all_written());
}

#[test]
fn impossible_budget_reports_no_fit() {
    let tmp = TempDir::new().unwrap();
    let input = save(tmp.path(), "busy.png", &noise(600, 600), ImageFormat::Png);

    let report = run(
        &[input],
        spec(1.0, TargetFormat::Jpeg, false),
        OutputLocation::BesideSource,
    );

    match &report.results[0].outcome {
        Outcome::NoFit { message } => assert_eq!(message, NO_FIT_MESSAGE),
        other => panic!("expected no fit, got {other:?}"),
    }
    assert!(!tmp.path().join("busy_compressed.jpg").exists());
}

#[test]
fn auto_resize_never_goes_below_floor() {
    let tmp = TempDir::new().unwrap();
    let input = save(tmp.path(), "busy.png", &noise(800, 800), ImageFormat::Png);

    let report = run(
        &[input],
        spec(40.0, TargetFormat::Jpeg, true),
        OutputLocation::BesideSource,
    );

    match &report.results[0].outcome {
        Outcome::Written {
            width,
            height,
            size_kb,
            ..
        } => {
            assert!(*width >= 200 && *height >= 200);
            assert!(*size_kb <= 40.0);
        }
        Outcome::NoFit { .. } => {}
        other => panic!("unexpected outcome {other:?}"),
    }
}

// =========================================================================
// Batches
// =========================================================================

#[test]
fn one_bad_input_does_not_stop_the_batch() {
    let tmp = TempDir::new().unwrap();
    let good = save(tmp.path(), "a.png", &smooth(120, 90), ImageFormat::Png);
    let bad = tmp.path().join("b.jpg");
    std::fs::write(&bad, b"not an image at all").unwrap();

    let report = run(
        &[good, bad],
        spec(50.0, TargetFormat::Jpeg, false),
        OutputLocation::BesideSource,
    );

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.written_count(), 1);
    assert!(report.results[0].is_written());
    assert!(tmp.path().join("a_compressed.jpg").exists());
}

#[test]
fn directory_inputs_skip_previous_outputs() {
    let tmp = TempDir::new().unwrap();
    save(tmp.path(), "one.png", &smooth(64, 64), ImageFormat::Png);
    save(tmp.path(), "two.jpg", &smooth(64, 64), ImageFormat::Jpeg);
    save(
        tmp.path(),
        "one_compressed.jpg",
        &smooth(64, 64),
        ImageFormat::Jpeg,
    );
    std::fs::write(tmp.path().join("notes.txt"), "x").unwrap();

    let inputs = process::collect_inputs(&[tmp.path().to_path_buf()]).unwrap();

    assert_eq!(
        inputs,
        vec![tmp.path().join("one.png"), tmp.path().join("two.jpg")]
    );
}

#[test]
fn json_report_tags_outcomes() {
    let tmp = TempDir::new().unwrap();
    let input = save(tmp.path(), "a.png", &smooth(80, 60), ImageFormat::Png);

    let report = run(
        &[input],
        spec(50.0, TargetFormat::Png, false),
        OutputLocation::BesideSource,
    );
    let json: serde_json::Value = serde_json::to_value(&report).unwrap();

    assert_eq!(json["target"]["format"], "image/png");
    assert_eq!(json["results"][0]["outcome"]["status"], "written");
    assert_eq!(json["results"][0]["outcome"]["width"], 80);
}
