use crate::support::{outline, stub_images, BrokenCharts, StubCharts, REPORT};
use md2doc_core::chart::render::{ChartRenderOptions, SvgChartRenderer};
use md2doc_core::resolve::Resolution;
use md2doc_core::skeleton::{Block, TextBlock, TextRole};
use md2doc_core::substitute::fit_picture;
use md2doc_core::text::format_thousands;
use md2doc_core::{
    substitute, CancelToken, PictureLayout, ResolveOptions, ResolvedValue, Resolver, Skeleton,
    SubstitutionError, Template, TemplateBuilder, TemplateOptions, ValueMap,
};
use proptest::prelude::*;
use std::sync::Arc;

fn report() -> Template {
    TemplateBuilder::new(TemplateOptions::default()).build(REPORT)
}

fn resolve(template: &Template, resolver: Resolver) -> Resolution {
    resolver
        .resolve(
            &template.skeleton,
            template.first_heading.as_deref(),
            &CancelToken::new(),
        )
        .unwrap()
}

#[test]
fn report_is_fully_substituted() {
    let template = report();
    let resolver = Resolver::new(stub_images(), ResolveOptions::default())
        .with_chart_renderer(Arc::new(StubCharts));
    let resolution = resolve(&template, resolver);
    assert!(resolution.failures.is_empty());

    let mut skeleton = template.skeleton.clone();
    let report = substitute(&mut skeleton, &resolution.values, true);
    assert_eq!(report.resolved, 6);
    assert!(report.errors.is_empty());
    assert!(skeleton.is_resolved());

    insta::assert_snapshot!(outline(&skeleton), @r"
title: 2,024年度经营分析报告
text:
H1 一、2024年度经营分析报告
H2 1、总体情况
text: 本年度实现营业收入1,234,567.89元，同比增长12%，客户数达到10,000户。
caption: 表格 1：
table table1 (3x3)
caption: 图表 1：
picture chart1 (1371600x857250 emu)
H3 1）区域分布
caption: 图片 1：区域分布
picture image1 (1371600x1028700 emu)
H2 2、流程说明
code: 【Mermaid 图表源码】
graph TD
A[采集] --> B[分析]
text: 本报告标题为2,024年度经营分析报告。
");
}

#[test]
fn numeric_cells_are_grouped() {
    let template = report();
    let resolution = resolve(
        &template,
        Resolver::new(stub_images(), ResolveOptions::default()),
    );
    let mut skeleton = template.skeleton.clone();
    substitute(&mut skeleton, &resolution.values, true);

    let table = skeleton
        .blocks
        .iter()
        .find_map(|block| match block {
            Block::Table(t) if t.key == "table1" => Some(t),
            _ => None,
        })
        .unwrap();
    assert_eq!(table.rows[1], vec!["华东", "1,200,000", "45%"]);
    assert_eq!(table.rows[2], vec!["华南", "880,000.5", "33%"]);
}

#[test]
fn failed_chart_render_falls_back_to_a_data_table() {
    let template = report();
    let resolver = Resolver::new(stub_images(), ResolveOptions::default())
        .with_chart_renderer(Arc::new(BrokenCharts));
    let resolution = resolve(&template, resolver);
    assert!(resolution.failures.is_empty());

    match resolution.values.get("chart1") {
        Some(ResolvedValue::Grid(rows)) => {
            assert_eq!(rows[0], vec!["类别", "收入"]);
            assert_eq!(rows.len(), 5);
        }
        other => panic!("expected a grid, got {other:?}"),
    }
}

#[cfg(feature = "chart-render")]
#[test]
fn pie_chart_fences_render_to_pictures() {
    let source = "# 渠道\n\n```echarts\n{\n  title: { text: '渠道占比' },\n  series: [{ type: 'pie', name: '占比', data: [{ name: '线上', value: 5 }, { name: '门店', value: 3 }] }],\n}\n```\n";
    let template = TemplateBuilder::new(TemplateOptions::default()).build(source);
    let renderer = SvgChartRenderer::new(ChartRenderOptions {
        width_px: 320,
        height_px: 200,
        ..ChartRenderOptions::default()
    });
    let resolver = Resolver::new(stub_images(), ResolveOptions::default())
        .with_chart_renderer(Arc::new(renderer));
    let resolution = resolve(&template, resolver);
    assert!(resolution.failures.is_empty());

    match resolution.values.get("chart1") {
        Some(ResolvedValue::Image { bytes, width, height }) => {
            assert!(bytes.starts_with(b"\x89PNG"));
            assert_eq!((*width, *height), (320, 200));
        }
        other => panic!("expected a picture, got {other:?}"),
    }
}

#[test]
fn charts_are_tables_when_rendering_is_off() {
    let template = report();
    let options = ResolveOptions {
        render_charts: false,
        ..ResolveOptions::default()
    };
    let resolver = Resolver::new(stub_images(), options).with_chart_renderer(Arc::new(StubCharts));
    let resolution = resolve(&template, resolver);
    assert_eq!(resolution.values.get("chart1").unwrap().kind_name(), "grid");
}

#[test]
fn missing_values_become_visible_labels() {
    let template = report();
    let mut skeleton = template.skeleton.clone();
    let report = substitute(&mut skeleton, &ValueMap::new(), true);

    assert_eq!(report.resolved, 0);
    assert_eq!(report.errors.len(), 4);
    assert_eq!(
        report.errors[0],
        SubstitutionError::Unresolved {
            key: "table1".to_string()
        }
    );
    let text = skeleton.outline();
    assert!(text.contains("[table placeholder not resolved: table1]"));
    assert!(text.contains("[image placeholder not resolved: image1]"));
    // Unknown inline tokens are left for the reader to see.
    assert!(text.contains("title: ${title}"));
}

#[test]
fn image_failures_do_not_stop_the_rest() {
    let template =
        TemplateBuilder::new(TemplateOptions::default()).build("![a](missing.png)\n![b](ok.png)");
    let resolution = resolve(
        &template,
        Resolver::new(stub_images(), ResolveOptions::default()),
    );
    assert_eq!(resolution.failures.len(), 1);
    assert_eq!(resolution.failures[0].0, "image1");

    let mut skeleton = template.skeleton.clone();
    let report = substitute(&mut skeleton, &resolution.values, true);
    assert_eq!(report.errors.len(), 1);
    assert!(skeleton
        .outline()
        .contains("[image placeholder not resolved: image1]"));
    assert!(skeleton.outline().contains("picture image2"));
}

#[test]
fn non_text_value_for_an_inline_token() {
    let mut skeleton = Skeleton::new();
    skeleton.push(Block::Text(TextBlock::new(TextRole::Body, "见${table1}")));
    let mut values = ValueMap::new();
    values.insert("table1", ResolvedValue::Grid(vec![vec!["a".into()]]));

    let report = substitute(&mut skeleton, &values, true);
    assert_eq!(
        report.errors,
        vec![SubstitutionError::KindMismatch {
            key: "table1".into(),
            expected: "text",
            found: "grid"
        }]
    );
    assert_eq!(
        skeleton.outline(),
        "text: 见[text placeholder not resolved: table1]"
    );
}

#[test]
fn substituted_values_are_not_rescanned() {
    let mut skeleton = Skeleton::new();
    skeleton.push(Block::Text(TextBlock::new(TextRole::Body, "${title}")));
    let mut values = ValueMap::new();
    values.insert("title", ResolvedValue::Text("${other}".into()));
    values.insert("other", ResolvedValue::Text("nope".into()));

    substitute(&mut skeleton, &values, true);
    assert_eq!(skeleton.outline(), "text: ${other}");
}

#[test]
fn substitution_is_idempotent() {
    let template = report();
    let resolution = resolve(
        &template,
        Resolver::new(stub_images(), ResolveOptions::default()),
    );
    let mut once = template.skeleton.clone();
    substitute(&mut once, &resolution.values, true);
    let mut twice = once.clone();
    let second = substitute(&mut twice, &resolution.values, true);
    assert_eq!(second.resolved, 0);
    assert!(second.errors.is_empty());
    assert_eq!(twice, once);
}

#[test]
fn plain_text_without_placeholders_is_unchanged() {
    let mut skeleton = Skeleton::new();
    skeleton.push(Block::Heading {
        level: 1,
        text: "一、概述".into(),
    });
    skeleton.push(Block::Text(TextBlock::literal(TextRole::Body, "共1,000人")));
    let before = skeleton.clone();
    let report = substitute(&mut skeleton, &ValueMap::new(), true);
    assert_eq!(report.resolved, 0);
    assert_eq!(skeleton, before);
}

#[test]
fn picture_fitting() {
    let layout = PictureLayout::default();
    // 1920x1080 at 96 dpi is 20in wide: shrunk to 6in.
    let (w, h) = fit_picture(1920, 1080, &layout);
    assert_eq!(w, 6 * 914_400);
    assert_eq!(h, (6.0 * 1080.0 / 1920.0 * 914_400.0_f64).round() as u32);

    // Tall and narrow: the height bound wins over the minimum width.
    let (w, h) = fit_picture(10, 2000, &layout);
    assert_eq!(h, 8 * 914_400);
    assert!(w < (1.5 * 914_400.0) as u32);

    // Already in bounds: unchanged.
    let (w, h) = fit_picture(288, 192, &layout);
    assert_eq!((w, h), (3 * 914_400, 2 * 914_400));
}

#[test]
fn thousands_examples() {
    assert_eq!(format_thousands("1234567.891"), "1,234,567.891");
    assert_eq!(format_thousands("增长12%"), "增长12%");
    assert_eq!(format_thousands("编号007"), "编号007");
    assert_eq!(format_thousands("0012345"), "0,012,345");
    assert_eq!(format_thousands("无数字"), "无数字");
}

proptest! {
    #[test]
    fn grouping_only_inserts_commas(digits in "[1-9][0-9]{0,17}") {
        let grouped = format_thousands(&digits);
        prop_assert_eq!(grouped.replace(',', ""), digits.clone());
        let groups: Vec<&str> = grouped.split(',').collect();
        prop_assert!(groups[0].len() >= 1 && groups[0].len() <= 3);
        prop_assert!(groups[1..].iter().all(|g| g.len() == 3));
    }

    #[test]
    fn grouping_is_stable(text in "[0-9a-z.,%元 ]{0,24}") {
        let once = format_thousands(&text);
        prop_assert_eq!(format_thousands(&once), once);
    }
}
