//! DOCX writer built on docx-rs

use super::styles::{self, fonts};
use super::{half_points, DocumentWriter, Typography};
use crate::error::ConvertError;
use crate::skeleton::{Block, PictureBlock, Skeleton, Span, TableBlock, TextBlock, TextRole};
use docx_rs::*;
use std::io::Cursor;

/// Body paragraphs are indented by two characters on the first line.
const FIRST_LINE_INDENT: i32 = 560;
const TABLE_FONT_SIZE_PT: f32 = 11.0;

pub struct DocxWriter {
    typography: Typography,
}

impl Default for DocxWriter {
    fn default() -> Self {
        Self::new(Typography::default())
    }
}

impl DocxWriter {
    pub fn new(typography: Typography) -> Self {
        Self { typography }
    }

    fn heading(&self, level: u8, text: &str) -> Paragraph {
        let font = if level == 1 {
            &self.typography.title_font
        } else {
            &self.typography.body_font
        };
        Paragraph::new().style(&styles::heading(level)).add_run(
            Run::new()
                .add_text(text)
                .bold()
                .fonts(fonts(font))
                .size(half_points(styles::heading_size_pt(level))),
        )
    }

    fn text(&self, block: &TextBlock) -> Vec<Paragraph> {
        let text: String = block
            .spans
            .iter()
            .map(|span| match span {
                Span::Literal(s) => s.clone(),
                Span::Token(key) => format!("${{{key}}}"),
            })
            .collect();

        match block.role {
            TextRole::Title => vec![Paragraph::new()
                .style(styles::TITLE)
                .align(AlignmentType::Center)
                .add_run(
                    Run::new()
                        .add_text(text)
                        .bold()
                        .fonts(fonts(&self.typography.title_font))
                        .size(half_points(self.typography.title_size_pt)),
                )],
            TextRole::Caption => vec![Paragraph::new()
                .style(styles::CAPTION)
                .align(AlignmentType::Center)
                .add_run(
                    Run::new()
                        .add_text(text)
                        .bold()
                        .fonts(fonts(&self.typography.body_font))
                        .size(half_points(self.typography.body_size_pt)),
                )],
            TextRole::Body => vec![Paragraph::new()
                .style(styles::BODY)
                .line_spacing(LineSpacing::new().line(360))
                .indent(
                    None,
                    Some(SpecialIndentType::FirstLine(FIRST_LINE_INDENT)),
                    None,
                    None,
                )
                .add_run(
                    Run::new()
                        .add_text(text)
                        .fonts(fonts(&self.typography.body_font))
                        .size(half_points(self.typography.body_size_pt)),
                )],
            TextRole::Code => text
                .lines()
                .map(|line| {
                    Paragraph::new()
                        .style(styles::CODE)
                        .add_run(Run::new().add_text(line).fonts(fonts("Courier New")).size(18))
                })
                .collect(),
        }
    }

    fn table(&self, block: &TableBlock) -> Option<Table> {
        let columns = block.rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return None;
        }

        let size = half_points(TABLE_FONT_SIZE_PT);
        let rows = block
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let header = i == 0;
                let cells = (0..columns)
                    .map(|c| {
                        let text = row.get(c).map(String::as_str).unwrap_or_default();
                        let mut run = Run::new()
                            .add_text(text)
                            .fonts(fonts(&self.typography.table_font))
                            .size(size);
                        if header {
                            run = run.bold();
                        }
                        let para = Paragraph::new()
                            .align(if header {
                                AlignmentType::Center
                            } else {
                                AlignmentType::Left
                            })
                            .add_run(run);
                        let mut cell = TableCell::new()
                            .vertical_align(VAlignType::Center)
                            .add_paragraph(para);
                        if header {
                            cell = cell.shading(Shading::new().fill(&self.typography.header_fill));
                        }
                        cell
                    })
                    .collect();
                TableRow::new(cells)
            })
            .collect();

        Some(Table::new(rows).align(TableAlignmentType::Center))
    }

    fn picture(&self, block: &PictureBlock) -> Paragraph {
        let pic = Pic::new(&block.bytes).size(block.width_emu, block.height_emu);
        Paragraph::new()
            .align(AlignmentType::Center)
            .add_run(Run::new().add_image(pic))
    }

    /// Assemble the document without packing it.
    pub fn build(&self, skeleton: &Skeleton) -> Docx {
        let mut docx = styles::register(Docx::new(), &self.typography);

        for block in &skeleton.blocks {
            docx = match block {
                Block::Heading { level, text } => docx.add_paragraph(self.heading(*level, text)),
                Block::Text(text) => self
                    .text(text)
                    .into_iter()
                    .fold(docx, |docx, para| docx.add_paragraph(para)),
                Block::Table(table) => match self.table(table) {
                    Some(table) => docx.add_table(table),
                    None => docx,
                },
                Block::Picture(picture) => docx.add_paragraph(self.picture(picture)),
                Block::Placeholder(placeholder) => {
                    log::warn!("{} reached the writer unresolved", placeholder.key);
                    let fallback = TextBlock::literal(TextRole::Body, placeholder.fallback_label());
                    self.text(&fallback)
                        .into_iter()
                        .fold(docx, |docx, para| docx.add_paragraph(para))
                }
            };
        }
        docx
    }
}

impl DocumentWriter for DocxWriter {
    fn name(&self) -> &str {
        "docx"
    }

    fn extension(&self) -> &str {
        "docx"
    }

    fn write(&self, skeleton: &Skeleton) -> Result<Vec<u8>, ConvertError> {
        let mut buffer = Vec::new();
        self.build(skeleton)
            .build()
            .pack(&mut Cursor::new(&mut buffer))
            .map_err(|e| ConvertError::Render(format!("failed to pack DOCX: {e}")))?;
        Ok(buffer)
    }
}
