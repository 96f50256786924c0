use crate::support::{outline, REPORT};
use md2doc_core::skeleton::{Block, PlaceholderSource, TextRole};
use md2doc_core::{NumberingStyle, ParseError, TemplateBuilder, TemplateOptions};

fn build(md: &str) -> md2doc_core::Template {
    TemplateBuilder::new(TemplateOptions::default()).build(md)
}

#[test]
fn report_skeleton() {
    let template = build(REPORT);
    assert!(template.warnings.is_empty());
    assert_eq!(
        template.first_heading.as_deref(),
        Some("2024年度经营分析报告")
    );
    insta::assert_snapshot!(outline(&template.skeleton), @r"
title: ${title}
text:
H1 一、2024年度经营分析报告
H2 1、总体情况
text: 本年度实现营业收入1,234,567.89元，同比增长12%，客户数达到10,000户。
caption: 表格 1：
[table] ${table1}
caption: 图表 1：
[chart] ${chart1}
H3 1）区域分布
caption: 图片 1：区域分布
[image] ${image1}
H2 2、流程说明
[mermaid] ${mermaid1}
text: 本报告标题为${title}。
");
}

#[test]
fn dotted_numbering_without_captions() {
    let options = TemplateOptions {
        numbering: NumberingStyle::Dotted,
        captions: false,
        group_digits: false,
        ..TemplateOptions::default()
    };
    let template = TemplateBuilder::new(options).build(REPORT);
    let headings: Vec<&str> = template
        .skeleton
        .blocks
        .iter()
        .filter_map(|block| match block {
            Block::Heading { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        headings,
        vec![
            "1 2024年度经营分析报告",
            "1.1 总体情况",
            "1.1.1 区域分布",
            "1.2 流程说明"
        ]
    );
    assert!(!template.skeleton.outline().contains("caption:"));
    assert!(template.skeleton.outline().contains("营业收入1234567.89元"));
}

#[test]
fn placeholders_carry_their_markdown() {
    let template = build(REPORT);
    let payloads: Vec<&PlaceholderSource> =
        template.skeleton.placeholders().map(|p| &p.payload).collect();
    assert_eq!(payloads.len(), 4);
    match payloads[0] {
        PlaceholderSource::Table { raw } => assert!(raw.starts_with("| 地区 |")),
        other => panic!("expected a table, got {other:?}"),
    }
    match payloads[2] {
        PlaceholderSource::Image(image) => assert_eq!(image.url, "images/regions.png"),
        other => panic!("expected an image, got {other:?}"),
    }
}

#[test]
fn unterminated_fence_still_gets_a_placeholder() {
    let template = build("# 图表\n```echarts\n{title: {text: 'x'}}\n");
    assert_eq!(
        template.warnings,
        vec![ParseError::UnterminatedFence {
            line: 2,
            kind: "chart"
        }]
    );
    assert_eq!(template.skeleton.keys(), vec!["title", "chart1"]);
}

#[test]
fn text_around_an_image_comes_first() {
    let template = build("见下图 ![示意](a.png) 所示");
    let roles: Vec<String> = template
        .skeleton
        .blocks
        .iter()
        .skip(2)
        .map(|block| match block {
            Block::Text(t) if t.role == TextRole::Body => format!("text {}", t.text()),
            Block::Text(t) => format!("{:?}", t.role),
            Block::Placeholder(p) => p.key.clone(),
            other => format!("{other:?}"),
        })
        .collect();
    assert_eq!(roles, vec!["text 见下图  所示", "Caption", "image1"]);
}

#[test]
fn skeleton_always_opens_with_the_title_token() {
    let template = build("正文而已");
    assert_eq!(template.first_heading, None);
    match &template.skeleton.blocks[0] {
        Block::Text(t) => {
            assert_eq!(t.role, TextRole::Title);
            assert_eq!(t.tokens().collect::<Vec<_>>(), vec!["title"]);
        }
        other => panic!("unexpected first block {other:?}"),
    }
}
