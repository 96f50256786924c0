//! Paragraph styles registered in every generated document

use super::{half_points, Typography};
use docx_rs::*;

pub const TITLE: &str = "ReportTitle";
pub const BODY: &str = "ReportBody";
pub const CAPTION: &str = "ReportCaption";
pub const CODE: &str = "ReportCode";

/// Heading sizes in points for levels 1 to 6.
const HEADING_SIZES_PT: [f32; 6] = [22.0, 16.0, 14.0, 12.0, 10.5, 10.5];

/// Style id of the heading style for `level` (1..=6).
pub fn heading(level: u8) -> String {
    format!("Heading{}", level.clamp(1, 6))
}

pub fn heading_size_pt(level: u8) -> f32 {
    HEADING_SIZES_PT[(level.clamp(1, 6) - 1) as usize]
}

pub fn fonts(name: &str) -> RunFonts {
    RunFonts::new()
        .ascii(name)
        .hi_ansi(name)
        .east_asia(name)
        .cs(name)
}

fn heading_style(level: u8, font: &str) -> Style {
    Style::new(&heading(level), StyleType::Paragraph)
        .name(format!("Heading {level}"))
        .fonts(fonts(font))
        .size(half_points(heading_size_pt(level)))
        .bold()
        .line_spacing(LineSpacing::new().before(240).after(120).line(360))
        .outline_lvl((level - 1) as usize)
}

/// Add the heading, title, body, caption and code styles to `docx`.
pub fn register(docx: Docx, typography: &Typography) -> Docx {
    let mut docx = docx;
    for level in 1..=6u8 {
        let font = if level == 1 {
            &typography.title_font
        } else {
            &typography.body_font
        };
        docx = docx.add_style(heading_style(level, font));
    }

    let title = Style::new(TITLE, StyleType::Paragraph)
        .name("Report Title")
        .fonts(fonts(&typography.title_font))
        .size(half_points(typography.title_size_pt))
        .bold()
        .align(AlignmentType::Center)
        .line_spacing(LineSpacing::new().before(240).after(240));

    let body = Style::new(BODY, StyleType::Paragraph)
        .name("Report Body")
        .fonts(fonts(&typography.body_font))
        .size(half_points(typography.body_size_pt))
        .line_spacing(LineSpacing::new().line(360));

    let caption = Style::new(CAPTION, StyleType::Paragraph)
        .name("Report Caption")
        .fonts(fonts(&typography.body_font))
        .size(half_points(typography.body_size_pt))
        .bold()
        .align(AlignmentType::Center);

    let code = Style::new(CODE, StyleType::Paragraph)
        .name("Report Code")
        .fonts(fonts("Courier New"))
        .size(18);

    docx.add_style(title)
        .add_style(body)
        .add_style(caption)
        .add_style(code)
}
