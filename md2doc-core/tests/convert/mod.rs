use crate::support::{stub_images, CancellingImages, StubCharts, REPORT};
use md2doc_core::convert::{default_output_path, read_markdown};
use md2doc_core::{CancelToken, ConvertError, ConvertOptions, Converter};
use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::tempdir;

fn options(cache: &Path) -> ConvertOptions {
    ConvertOptions {
        cache_dir: Some(cache.to_path_buf()),
        ..ConvertOptions::default()
    }
}

fn leftovers(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".skeleton.json") || name.starts_with(".tmp"))
        .collect()
}

#[test]
fn converts_the_report() {
    let dir = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let images = stub_images();
    let converter = Converter::new(options(cache.path()))
        .with_image_source(images.clone())
        .with_chart_renderer(Arc::new(StubCharts));

    let output = dir.path().join("out").join("report.docx");
    let report = converter
        .convert_str(REPORT, None, &output, &CancelToken::new())
        .unwrap();

    assert_eq!(report.output, output);
    assert_eq!(report.placeholders, 4);
    assert_eq!(report.resolved, 6);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(images.calls.load(Ordering::SeqCst), 1);

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"PK"));
    assert!(leftovers(output.parent().unwrap()).is_empty());
}

#[test]
fn convert_file_reads_from_disk() {
    let dir = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let input = dir.path().join("report.md");
    fs::write(&input, REPORT).unwrap();
    let output = default_output_path(&input);

    let converter = Converter::new(options(cache.path()))
        .with_image_source(stub_images())
        .with_chart_renderer(Arc::new(StubCharts));
    converter
        .convert_file(&input, &output, &CancelToken::new())
        .unwrap();
    assert!(output.exists());
    assert_eq!(output.extension().unwrap(), "docx");
}

#[test]
fn unresolved_content_is_reported_not_fatal() {
    let dir = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let converter = Converter::new(options(cache.path())).with_image_source(stub_images());
    let output = dir.path().join("partial.docx");
    let source = "# 报告\n\n![缺失](missing.png)\n\n```echarts\nnot json\n```\n";

    let report = converter
        .convert_str(source, None, &output, &CancelToken::new())
        .unwrap();
    assert!(output.exists());
    assert_eq!(report.placeholders, 2);
    // One failure while resolving and one fallback while substituting, per placeholder.
    assert_eq!(report.warnings.len(), 4);
    assert!(report.warnings.iter().any(|w| w.starts_with("image1:")));
    assert!(report.warnings.iter().any(|w| w.starts_with("chart1:")));
}

#[test]
fn cancelled_before_start_writes_nothing() {
    let dir = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();

    let output = dir.path().join("report.docx");
    let result = Converter::new(options(cache.path()))
        .with_image_source(stub_images())
        .convert_str(REPORT, None, &output, &cancel);
    assert!(matches!(result, Err(ConvertError::Cancelled)));
    assert!(!output.exists());
}

#[test]
fn cancelled_while_resolving_writes_nothing() {
    let dir = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let cancel = CancelToken::new();

    let output = dir.path().join("report.docx");
    let result = Converter::new(options(cache.path()))
        .with_image_source(Arc::new(CancellingImages(cancel.clone())))
        .with_chart_renderer(Arc::new(StubCharts))
        .convert_str(REPORT, None, &output, &cancel);
    assert!(matches!(result, Err(ConvertError::Cancelled)));
    assert!(!output.exists());
    assert!(leftovers(dir.path()).is_empty());
}

#[test]
fn input_validation() {
    let dir = tempdir().unwrap();
    let converter = Converter::new(ConvertOptions::default());
    let output = dir.path().join("x.docx");

    assert!(matches!(
        converter.convert_str(" \n\t", None, &output, &CancelToken::new()),
        Err(ConvertError::EmptyInput)
    ));

    let missing = dir.path().join("absent.md");
    assert!(matches!(
        read_markdown(&missing),
        Err(ConvertError::ReadInput { .. })
    ));

    let html = dir.path().join("page.html");
    fs::write(&html, "<h1>x</h1>").unwrap();
    assert!(matches!(
        converter.convert_file(&html, &output, &CancelToken::new()),
        Err(ConvertError::UnsupportedInput(_))
    ));
    assert!(!output.exists());
}
