use crate::support::REPORT;
use md2doc_core::markdown::{
    extract_chart_blocks, extract_headings, extract_images, extract_tables, first_heading,
    parse_table, FenceMarkers, Heading,
};
use md2doc_core::ParseError;
use proptest::prelude::*;

fn markers() -> FenceMarkers {
    FenceMarkers::default()
}

#[test]
fn report_headings_in_order() {
    let headings = extract_headings(REPORT, &markers());
    let levels: Vec<u8> = headings.iter().map(|h| h.level).collect();
    assert_eq!(levels, vec![1, 2, 3, 2]);
    assert_eq!(
        headings[0],
        Heading {
            level: 1,
            text: "2024年度经营分析报告".to_string()
        }
    );
}

#[test]
fn report_blocks_are_extracted_once_each() {
    assert_eq!(extract_tables(REPORT, &markers()).len(), 1);
    assert_eq!(extract_images(REPORT).len(), 1);

    let charts = extract_chart_blocks(REPORT, &markers());
    assert_eq!(charts.len(), 1);
    let body = charts[0].as_ref().unwrap();
    assert!(body.starts_with('{'));
    assert!(!body.contains("```"));
}

#[test]
fn hash_lines_inside_a_fence_are_not_headings() {
    let md = "# 真标题\n```mermaid\n# 注释\n```\n";
    let headings = extract_headings(md, &markers());
    assert_eq!(headings.len(), 1);
}

#[test]
fn image_title_falls_back_to_alt() {
    let images = extract_images("![流程图](a.png) 和 ![结构](b.jpg \"系统结构\")");
    assert_eq!(images[0].title, "流程图");
    assert_eq!(images[1].title, "系统结构");
    assert_eq!(images[1].url, "b.jpg");
}

#[test]
fn custom_chart_markers() {
    let markers = FenceMarkers {
        chart_open: vec!["~~~plot".to_string()],
        close: "~~~".to_string(),
        mermaid_open: "~~~mermaid".to_string(),
    };
    let md = "~~~plot\n{}\n~~~\n```echarts\n{}\n```";
    assert_eq!(extract_chart_blocks(md, &markers).len(), 1);
}

#[test]
fn unterminated_chart_keeps_later_charts() {
    let md = "```chart\n{a: 1}\n```\n\n```chart\n{b: 2}";
    let charts = extract_chart_blocks(md, &markers());
    assert_eq!(charts.len(), 2);
    assert!(charts[0].is_ok());
    assert!(matches!(
        charts[1],
        Err(ParseError::UnterminatedFence { line: 5, .. })
    ));
}

#[test]
fn first_heading_of_a_document_without_headings() {
    assert_eq!(first_heading("只有正文", &markers()), None);
    assert_eq!(
        first_heading(REPORT, &markers()).as_deref(),
        Some("2024年度经营分析报告")
    );
}

#[test]
fn table_grid_of_the_report() {
    let raw = &extract_tables(REPORT, &markers())[0];
    let grid = parse_table(raw);
    assert_eq!(grid.len(), 3);
    assert_eq!(grid[0], vec!["地区", "销售额", "占比"]);
    assert_eq!(grid[2], vec!["华南", "880000.5", "33%"]);
}

fn cell() -> impl Strategy<Value = String> {
    "[a-z0-9\u{4e00}-\u{4e20}]{1,6}"
}

fn table_text() -> impl Strategy<Value = String> {
    (1usize..5, 1usize..5).prop_flat_map(|(cols, rows)| {
        prop::collection::vec(prop::collection::vec(cell(), cols), rows + 1).prop_map(
            move |grid| {
                let mut lines = Vec::new();
                for (i, row) in grid.iter().enumerate() {
                    lines.push(format!("| {} |", row.join(" | ")));
                    if i == 0 {
                        lines.push(format!("|{}", "---|".repeat(cols)));
                    }
                }
                lines.join("\n")
            },
        )
    })
}

proptest! {
    #[test]
    fn extracting_an_extracted_table_is_stable(table in table_text()) {
        let doc = format!("前文\n\n{table}\n\n后文");
        let once = extract_tables(&doc, &markers());
        prop_assert_eq!(once.len(), 1);
        let twice = extract_tables(&once[0], &markers());
        prop_assert_eq!(&twice, &once);
        prop_assert_eq!(parse_table(&twice[0]), parse_table(&table));
    }

    #[test]
    fn parsed_rows_match_written_rows(table in table_text()) {
        let rows = table.lines().count() - 1;
        prop_assert_eq!(parse_table(&table).len(), rows);
    }
}
