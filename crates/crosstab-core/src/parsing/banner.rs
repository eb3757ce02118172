/// Collects the report banner from the leading paragraphs of a document.
///
/// Lines containing one of the banner keywords are kept verbatim until the
/// first question heading closes the banner.
#[derive(Debug, Clone)]
pub struct BannerCollector {
    keywords: Vec<String>,
    lines: Vec<String>,
    closed: bool,
}

impl BannerCollector {
    pub fn new(keywords: &[String]) -> Self {
        BannerCollector {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            lines: Vec::new(),
            closed: false,
        }
    }

    /// Offer a paragraph. `is_question` closes the banner.
    pub fn offer(&mut self, line: &str, is_question: bool) {
        if self.closed {
            return;
        }
        if is_question {
            self.closed = true;
            return;
        }
        let lower = line.to_lowercase();
        if self.keywords.iter().any(|k| lower.contains(k.as_str())) {
            self.lines.push(line.trim().to_string());
        }
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}
