pub mod docx;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::aggregate::AggregationStore;
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::model::QuestionBook;
use crate::parsing::lines::{format_percentage, QuestionTally, Tally};

/// A rendered-ready report: banner lines followed by one table per section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub banner: Vec<String>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub heading: String,
    pub table: ReportTable,
    pub page_break_after: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One section per teacher, in store order.
///
/// Columns are the campuses (sorted) in which the teacher has at least one
/// non-empty value. Rows are the teacher's questions by question number.
pub fn build_teacher_report(
    store: &AggregationStore,
    questions: &QuestionBook,
    campuses: &BTreeSet<String>,
    banner: &[String],
) -> Report {
    let mut all_campuses = campuses.clone();
    all_campuses.extend(store.campuses());

    let sections = store
        .teachers()
        .map(|teacher| {
            let active: Vec<&String> = all_campuses
                .iter()
                .filter(|c| teacher.has_value_for(c))
                .collect();

            let mut header = vec!["Question".to_string()];
            header.extend(active.iter().map(|c| c.to_string()));

            let rows = teacher
                .answers
                .iter()
                .map(|(id, values)| {
                    let mut row = vec![questions.label(*id)];
                    row.extend(
                        active
                            .iter()
                            .map(|c| values.get(*c).cloned().unwrap_or_default()),
                    );
                    row
                })
                .collect();

            Section {
                heading: format!("Teacher: {}", teacher.display_name),
                table: ReportTable { header, rows },
                page_break_after: true,
            }
        })
        .collect();

    Report {
        banner: banner.to_vec(),
        sections,
    }
}

/// One section per question tally. The ranking section is not followed by
/// a page break; every other section is.
pub fn build_tally_report(
    tallies: &[QuestionTally],
    banner: &[String],
    precision: u32,
) -> Report {
    let sections = tallies
        .iter()
        .map(|qt| {
            let (table, page_break_after) = match &qt.tally {
                Tally::Percentage { rows, .. } => (
                    ReportTable {
                        header: vec!["Name".into(), "Count".into(), "Percentage".into()],
                        rows: rows
                            .iter()
                            .map(|r| {
                                vec![
                                    r.name.clone(),
                                    r.count.to_string(),
                                    format_percentage(r.percentage, precision),
                                ]
                            })
                            .collect(),
                    },
                    true,
                ),
                Tally::Ranking { rows } => (
                    ReportTable {
                        header: vec!["Rank".into(), "Name".into()],
                        rows: rows
                            .iter()
                            .map(|r| vec![r.rank.clone(), r.name.clone()])
                            .collect(),
                    },
                    false,
                ),
            };
            Section {
                heading: qt.question.text.clone(),
                table,
                page_break_after,
            }
        })
        .collect();

    Report {
        banner: banner.to_vec(),
        sections,
    }
}

/// A per-request output path: `<dir>/<stem>-<uuid>.docx`.
pub fn unique_output_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}-{}.docx", uuid::Uuid::new_v4()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }
}

/// An image placed above the banner text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannerImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    /// Pixel size, when the header could be read.
    pub dimensions: Option<(u32, u32)>,
}

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

impl BannerImage {
    /// Sniff the format from magic bytes. Returns None for anything other
    /// than PNG or JPEG.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<BannerImage> {
        let (format, dimensions) = if bytes.starts_with(PNG_MAGIC) {
            (ImageFormat::Png, png_dimensions(&bytes))
        } else if bytes.starts_with(&[0xFF, 0xD8]) {
            (ImageFormat::Jpeg, jpeg_dimensions(&bytes))
        } else {
            return None;
        };
        Some(BannerImage {
            bytes,
            format,
            dimensions,
        })
    }
}

/// Load the optional banner image. A missing or unreadable image is a
/// warning, never an error.
pub fn load_banner_image(path: &Path, diagnostics: &mut Diagnostics) -> Option<BannerImage> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            diagnostics.warn(
                WarningKind::MissingBannerImage,
                None,
                format!("banner image {} could not be read: {e}", path.display()),
            );
            return None;
        }
    };
    let image = BannerImage::from_bytes(bytes);
    if image.is_none() {
        diagnostics.warn(
            WarningKind::MissingBannerImage,
            None,
            format!("banner image {} is not a PNG or JPEG file", path.display()),
        );
    }
    image
}

fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let width = u32::from_be_bytes(bytes.get(16..20)?.try_into().ok()?);
    let height = u32::from_be_bytes(bytes.get(20..24)?.try_into().ok()?);
    (width > 0 && height > 0).then_some((width, height))
}

fn jpeg_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let be16 = |i: usize| -> Option<usize> {
        Some(u16::from_be_bytes([*bytes.get(i)?, *bytes.get(i + 1)?]) as usize)
    };
    let mut i = 2;
    while i + 4 <= bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        // SOF0..SOF15, excluding DHT, JPG and DAC
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            let height = be16(i + 5)? as u32;
            let width = be16(i + 7)? as u32;
            return (width > 0 && height > 0).then_some((width, height));
        }
        i += 2 + be16(i + 2)?;
    }
    None
}
