use md2doc_core::numbering::{chinese_ordinal, DottedNumbering, OfficialNumbering};
use md2doc_core::{NumberingScheme, NumberingStyle};

fn labels(mut scheme: impl NumberingScheme, levels: &[u8]) -> Vec<String> {
    levels
        .iter()
        .map(|&level| {
            scheme.enter(level);
            scheme.label(level)
        })
        .collect()
}

#[test]
fn official_labels_per_level() {
    assert_eq!(
        labels(OfficialNumbering::new(), &[1, 2, 3, 4, 5]),
        vec!["一、", "1、", "1）", "1.1.1.1、", "1）"]
    );
}

#[test]
fn official_siblings_stay_consecutive_across_deeper_sections() {
    assert_eq!(
        labels(OfficialNumbering::new(), &[1, 2, 3, 3, 2, 3]),
        vec!["一、", "1、", "1）", "2）", "2、", "1）"]
    );
}

#[test]
fn official_restarts_when_parent_advanced() {
    assert_eq!(
        labels(OfficialNumbering::new(), &[1, 2, 1, 3, 2]),
        vec!["一、", "1、", "二、", "1）", "1、"]
    );
}

#[test]
fn official_level_one_runs_past_ten() {
    let levels = vec![1u8; 12];
    let got = labels(OfficialNumbering::new(), &levels);
    assert_eq!(got[9], "十、");
    assert_eq!(got[11], "十二、");
}

#[test]
fn dotted_paths() {
    assert_eq!(
        labels(DottedNumbering::new(), &[1, 2, 2, 3, 1, 2]),
        vec!["1", "1.1", "1.2", "1.2.1", "2", "2.1"]
    );
}

#[test]
fn styles_parse_by_name() {
    assert_eq!(NumberingStyle::parse("Official"), Some(NumberingStyle::Official));
    assert_eq!(NumberingStyle::parse("dotted"), Some(NumberingStyle::Dotted));
    assert_eq!(NumberingStyle::parse("roman"), None);

    let mut scheme = NumberingStyle::Dotted.numberer();
    scheme.enter(1);
    assert_eq!(scheme.numbered(1, "概述"), "1 概述");
}

#[test]
fn ordinals() {
    let got: Vec<String> = [1, 9, 10, 11, 20, 21, 99].iter().map(|n| chinese_ordinal(*n)).collect();
    assert_eq!(got, vec!["一", "九", "十", "十一", "二十", "二十一", "九十九"]);
}
