use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::CrosstabError;
use crate::report::{BannerImage, Report, ReportTable, Section};

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const IMAGE_REL_ID: &str = "rIdBanner";

/// Banner image width on the page: 6 inches in EMU.
const IMAGE_WIDTH_EMU: u64 = 5_486_400;
/// Width:height used when the image header gave no size.
const DEFAULT_ASPECT: (u64, u64) = (4, 1);

const BANNER_FILL: &str = "D9E2F3";

/// Render a report as a `.docx` package.
pub fn write_docx(
    report: &Report,
    banner_image: Option<&BannerImage>,
) -> Result<Vec<u8>, CrosstabError> {
    if report.sections.is_empty() {
        return Err(CrosstabError::Render("report has no sections".into()));
    }
    let document = document_xml(report, banner_image)?;

    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buf);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(PACKAGE_RELS.as_bytes())?;

        zip.start_file("word/document.xml", options)?;
        zip.write_all(&document)?;

        zip.start_file("word/_rels/document.xml.rels", options)?;
        zip.write_all(document_rels(banner_image).as_bytes())?;

        if let Some(image) = banner_image {
            zip.start_file(media_path(image), options)?;
            zip.write_all(&image.bytes)?;
        }

        zip.finish()?;
    }

    tracing::debug!(
        sections = report.sections.len(),
        banner_lines = report.banner.len(),
        image = banner_image.is_some(),
        bytes = buf.get_ref().len(),
        "rendered DOCX"
    );
    Ok(buf.into_inner())
}

fn media_path(image: &BannerImage) -> String {
    format!("word/media/banner.{}", image.format.extension())
}

fn document_rels(banner_image: Option<&BannerImage>) -> String {
    let image_rel = banner_image
        .map(|image| {
            format!(
                r#"<Relationship Id="{IMAGE_REL_ID}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/banner.{}"/>"#,
                image.format.extension()
            )
        })
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{image_rel}</Relationships>"#
    )
}

fn document_xml(
    report: &Report,
    banner_image: Option<&BannerImage>,
) -> Result<Vec<u8>, CrosstabError> {
    let mut w = XmlOut::new();
    w.decl()?;
    w.start(
        "w:document",
        &[
            ("xmlns:w", NS_W),
            ("xmlns:r", NS_R),
            ("xmlns:wp", NS_WP),
            ("xmlns:a", NS_A),
            ("xmlns:pic", NS_PIC),
        ],
    )?;
    w.start("w:body", &[])?;

    if let Some(image) = banner_image {
        w.image_paragraph(image)?;
    }
    for line in &report.banner {
        w.banner_paragraph(line)?;
    }
    for section in &report.sections {
        w.section(section)?;
    }

    w.start("w:sectPr", &[])?;
    w.empty("w:pgSz", &[("w:w", "11906"), ("w:h", "16838")])?;
    w.empty(
        "w:pgMar",
        &[
            ("w:top", "1440"),
            ("w:right", "1440"),
            ("w:bottom", "1440"),
            ("w:left", "1440"),
            ("w:header", "708"),
            ("w:footer", "708"),
            ("w:gutter", "0"),
        ],
    )?;
    w.end("w:sectPr")?;

    w.end("w:body")?;
    w.end("w:document")?;
    Ok(w.into_inner())
}

struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        XmlOut {
            writer: Writer::new(Vec::new()),
        }
    }

    fn into_inner(self) -> Vec<u8> {
        self.writer.into_inner()
    }

    fn decl(&mut self) -> std::io::Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> std::io::Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(elem))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> std::io::Result<()> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(elem))
    }

    fn end(&mut self, name: &str) -> std::io::Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))
    }

    fn run(&mut self, text: &str, bold: bool) -> std::io::Result<()> {
        self.start("w:r", &[])?;
        if bold {
            self.start("w:rPr", &[])?;
            self.empty("w:b", &[])?;
            self.end("w:rPr")?;
        }
        self.start("w:t", &[("xml:space", "preserve")])?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end("w:t")?;
        self.end("w:r")
    }

    fn paragraph(&mut self, text: &str, bold: bool) -> std::io::Result<()> {
        self.start("w:p", &[])?;
        self.run(text, bold)?;
        self.end("w:p")
    }

    fn banner_paragraph(&mut self, text: &str) -> std::io::Result<()> {
        self.start("w:p", &[])?;
        self.start("w:pPr", &[])?;
        self.empty(
            "w:shd",
            &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", BANNER_FILL)],
        )?;
        self.empty("w:jc", &[("w:val", "center")])?;
        self.end("w:pPr")?;
        self.run(text, true)?;
        self.end("w:p")
    }

    fn page_break(&mut self) -> std::io::Result<()> {
        self.start("w:p", &[])?;
        self.start("w:r", &[])?;
        self.empty("w:br", &[("w:type", "page")])?;
        self.end("w:r")?;
        self.end("w:p")
    }

    fn section(&mut self, section: &Section) -> std::io::Result<()> {
        self.paragraph(&section.heading, true)?;
        self.table(&section.table)?;
        if section.page_break_after {
            self.page_break()?;
        }
        Ok(())
    }

    fn table(&mut self, table: &ReportTable) -> std::io::Result<()> {
        self.start("w:tbl", &[])?;
        self.start("w:tblPr", &[])?;
        self.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
        self.start("w:tblBorders", &[])?;
        for edge in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
            self.empty(
                edge,
                &[
                    ("w:val", "single"),
                    ("w:sz", "4"),
                    ("w:space", "0"),
                    ("w:color", "auto"),
                ],
            )?;
        }
        self.end("w:tblBorders")?;
        self.end("w:tblPr")?;

        self.row(&table.header, true)?;
        for row in &table.rows {
            self.row(row, false)?;
        }
        self.end("w:tbl")
    }

    fn row(&mut self, cells: &[String], bold: bool) -> std::io::Result<()> {
        self.start("w:tr", &[])?;
        for cell in cells {
            self.start("w:tc", &[])?;
            self.start("w:tcPr", &[])?;
            self.empty("w:tcW", &[("w:w", "0"), ("w:type", "auto")])?;
            self.end("w:tcPr")?;
            self.paragraph(cell, bold)?;
            self.end("w:tc")?;
        }
        self.end("w:tr")
    }

    fn image_paragraph(&mut self, image: &BannerImage) -> std::io::Result<()> {
        let (aspect_w, aspect_h) = image
            .dimensions
            .map(|(w, h)| (w as u64, h as u64))
            .unwrap_or(DEFAULT_ASPECT);
        let cx = IMAGE_WIDTH_EMU.to_string();
        let cy = (IMAGE_WIDTH_EMU * aspect_h / aspect_w).to_string();
        let file_name = format!("banner.{}", image.format.extension());
        let extent = [("cx", cx.as_str()), ("cy", cy.as_str())];

        self.start("w:p", &[])?;
        self.start("w:pPr", &[])?;
        self.empty("w:jc", &[("w:val", "center")])?;
        self.end("w:pPr")?;
        self.start("w:r", &[])?;
        self.start("w:drawing", &[])?;
        self.start(
            "wp:inline",
            &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
        )?;
        self.empty("wp:extent", &extent)?;
        self.empty("wp:docPr", &[("id", "1"), ("name", "Banner")])?;
        self.start("a:graphic", &[])?;
        self.start("a:graphicData", &[("uri", NS_PIC)])?;
        self.start("pic:pic", &[])?;

        self.start("pic:nvPicPr", &[])?;
        self.empty("pic:cNvPr", &[("id", "0"), ("name", file_name.as_str())])?;
        self.empty("pic:cNvPicPr", &[])?;
        self.end("pic:nvPicPr")?;

        self.start("pic:blipFill", &[])?;
        self.empty("a:blip", &[("r:embed", IMAGE_REL_ID)])?;
        self.start("a:stretch", &[])?;
        self.empty("a:fillRect", &[])?;
        self.end("a:stretch")?;
        self.end("pic:blipFill")?;

        self.start("pic:spPr", &[])?;
        self.start("a:xfrm", &[])?;
        self.empty("a:off", &[("x", "0"), ("y", "0")])?;
        self.empty("a:ext", &extent)?;
        self.end("a:xfrm")?;
        self.start("a:prstGeom", &[("prst", "rect")])?;
        self.empty("a:avLst", &[])?;
        self.end("a:prstGeom")?;
        self.end("pic:spPr")?;

        self.end("pic:pic")?;
        self.end("a:graphicData")?;
        self.end("a:graphic")?;
        self.end("wp:inline")?;
        self.end("w:drawing")?;
        self.end("w:r")?;
        self.end("w:p")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::docx::read_docx;
    use std::io::Read;

    fn report() -> Report {
        Report {
            banner: vec!["Learners Feedback".into(), "Academic Year 2024-25".into()],
            sections: vec![
                Section {
                    heading: "Teacher: Mr A".into(),
                    table: ReportTable {
                        header: vec!["Question".into(), "Mars".into()],
                        rows: vec![vec!["Q#1 Tom & Jerry <quiz>".into(), "40%".into()]],
                    },
                    page_break_after: true,
                },
                Section {
                    heading: "Q#2 Ranking".into(),
                    table: ReportTable {
                        header: vec!["Rank".into(), "Name".into()],
                        rows: vec![vec!["1".into(), "Ms C".into()]],
                    },
                    page_break_after: false,
                },
            ],
        }
    }

    fn part(bytes: &[u8], name: &str) -> Option<Vec<u8>> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).ok()?;
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        Some(out)
    }

    #[test]
    fn test_written_docx_reads_back() {
        let bytes = write_docx(&report(), None).unwrap();
        let doc = read_docx(&bytes).unwrap();

        assert!(doc.paragraphs.contains(&"Learners Feedback".to_string()));
        assert!(doc.paragraphs.contains(&"Teacher: Mr A".to_string()));
        assert_eq!(doc.tables.len(), 2);
        assert_eq!(doc.tables[0].rows[0], vec!["Question", "Mars"]);
        assert_eq!(doc.tables[0].rows[1], vec!["Q#1 Tom & Jerry <quiz>", "40%"]);
        assert_eq!(doc.tables[1].rows[1], vec!["1", "Ms C"]);
    }

    #[test]
    fn test_page_breaks_follow_sections() {
        let bytes = write_docx(&report(), None).unwrap();
        let xml = String::from_utf8(part(&bytes, "word/document.xml").unwrap()).unwrap();
        assert_eq!(xml.matches(r#"<w:br w:type="page"/>"#).count(), 1);
        assert!(xml.contains(&format!(r#"w:fill="{BANNER_FILL}""#)));
        assert!(xml.contains("<w:b/>"));
    }

    #[test]
    fn test_banner_image_is_embedded() {
        let image = BannerImage {
            bytes: b"\x89PNG\r\n\x1a\nfake".to_vec(),
            format: crate::report::ImageFormat::Png,
            dimensions: Some((800, 200)),
        };
        let bytes = write_docx(&report(), Some(&image)).unwrap();
        assert_eq!(part(&bytes, "word/media/banner.png").unwrap(), image.bytes);
        let rels =
            String::from_utf8(part(&bytes, "word/_rels/document.xml.rels").unwrap()).unwrap();
        assert!(rels.contains(IMAGE_REL_ID));
        let xml = String::from_utf8(part(&bytes, "word/document.xml").unwrap()).unwrap();
        assert!(xml.contains(r#"cy="1371600""#));
    }

    #[test]
    fn test_empty_report_is_not_rendered() {
        let err = write_docx(&Report::default(), None).unwrap_err();
        assert!(matches!(err, CrosstabError::Render(_)));
    }

    #[test]
    fn test_no_media_without_image() {
        let bytes = write_docx(&report(), None).unwrap();
        assert!(part(&bytes, "word/media/banner.png").is_none());
        assert!(part(&bytes, "[Content_Types].xml").is_some());
    }
}
