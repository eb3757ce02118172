use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::CrosstabError;
use crate::extraction::{SourceDocument, Table};

const DOCUMENT_PART: &str = "word/document.xml";

/// Largest `w:gridSpan` honoured.
const MAX_GRID_SPAN: usize = 64;

/// Read a `.docx` file into its top-level paragraph stream and table stream.
pub fn read_docx(bytes: &[u8]) -> Result<SourceDocument, CrosstabError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| CrosstabError::Extraction(format!("not a DOCX file: {e}")))?;

    let mut part = archive.by_name(DOCUMENT_PART).map_err(|_| {
        CrosstabError::Extraction(format!("not a DOCX file: missing {DOCUMENT_PART}"))
    })?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;

    let doc = parse_document_xml(&xml)?;
    tracing::debug!(
        paragraphs = doc.paragraphs.len(),
        tables = doc.tables.len(),
        "read DOCX document"
    );
    Ok(doc)
}

#[derive(Default)]
struct TableBuilder {
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell_parts: Vec<String>,
    /// Grid columns covered by the open cell.
    span: usize,
    /// The open cell continues a vertical merge from the row above.
    merged_down: bool,
}

impl TableBuilder {
    fn start_cell(&mut self) {
        self.cell_parts.clear();
        self.span = 1;
        self.merged_down = false;
    }

    fn cell_property(&mut self, e: &BytesStart) {
        match e.local_name().as_ref() {
            b"gridSpan" => {
                self.span = val_attr(e)
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(1)
                    .clamp(1, MAX_GRID_SPAN);
            }
            b"vMerge" => self.merged_down = val_attr(e).as_deref() != Some("restart"),
            _ => {}
        }
    }

    /// Close the open cell, one entry per grid column it covers. A vertical
    /// continuation repeats the text above it.
    fn end_cell(&mut self) {
        let mut text = std::mem::take(&mut self.cell_parts).join("\n");
        if self.merged_down {
            let column = self.row.len();
            if let Some(above) = self.rows.last().and_then(|r| r.get(column)) {
                text = above.clone();
            }
        }
        for _ in 0..self.span.max(1) {
            self.row.push(text.clone());
        }
    }
}

fn val_attr(e: &BytesStart) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"val")
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Walk WordprocessingML body content.
///
/// Paragraphs inside table cells belong to the cell, not the paragraph
/// stream. A nested table is flattened into the text of its parent cell.
/// Merged cells are expanded so every row has one entry per grid column.
pub fn parse_document_xml(xml: &str) -> Result<SourceDocument, CrosstabError> {
    let mut reader = Reader::from_str(xml);

    let mut doc = SourceDocument::default();
    let mut tables: Vec<TableBuilder> = Vec::new();
    let mut para = String::new();
    let mut in_text = false;
    let mut in_run = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => para.clear(),
                b"r" => in_run = true,
                b"t" => in_text = true,
                b"tbl" => tables.push(TableBuilder::default()),
                b"tr" => {
                    if let Some(tb) = tables.last_mut() {
                        tb.row.clear();
                    }
                }
                b"tc" => {
                    if let Some(tb) = tables.last_mut() {
                        tb.start_cell();
                    }
                }
                b"gridSpan" | b"vMerge" => {
                    if let Some(tb) = tables.last_mut() {
                        tb.cell_property(&e);
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" if in_run => para.push('\t'),
                b"br" | b"cr" if in_run => para.push('\n'),
                b"p" => {
                    para.clear();
                    finish_paragraph(&mut para, &mut tables, &mut doc);
                }
                b"gridSpan" | b"vMerge" => {
                    if let Some(tb) = tables.last_mut() {
                        tb.cell_property(&e);
                    }
                }
                _ => {}
            },
            Event::Text(e) => {
                if in_text {
                    para.push_str(&e.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => in_run = false,
                b"p" => finish_paragraph(&mut para, &mut tables, &mut doc),
                b"tc" => {
                    if let Some(tb) = tables.last_mut() {
                        tb.end_cell();
                    }
                }
                b"tr" => {
                    if let Some(tb) = tables.last_mut() {
                        let row = std::mem::take(&mut tb.row);
                        tb.rows.push(row);
                    }
                }
                b"tbl" => {
                    if let Some(tb) = tables.pop() {
                        match tables.last_mut() {
                            Some(parent) => {
                                let flattened = tb
                                    .rows
                                    .iter()
                                    .map(|r| r.join(" "))
                                    .collect::<Vec<_>>()
                                    .join("\n");
                                parent.cell_parts.push(flattened);
                            }
                            None => doc.tables.push(Table::new(tb.rows)),
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(doc)
}

fn finish_paragraph(para: &mut String, tables: &mut [TableBuilder], doc: &mut SourceDocument) {
    let text = std::mem::take(para);
    match tables.last_mut() {
        Some(tb) => tb.cell_parts.push(text),
        None => doc.paragraphs.push(text),
    }
}
