//! The exported document before layout: title, body lines, footer.

use crate::models::Document;

/// What goes onto the PDF page, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFragment {
    pub title: String,
    /// Body text split on line breaks. Blank lines are kept.
    pub body_lines: Vec<String>,
    pub footer: String,
}

impl ExportFragment {
    pub fn from_document(doc: &Document) -> Self {
        let metadata = &doc.content.metadata;
        let body_lines = doc
            .content
            .text
            .replace("\r\n", "\n")
            .replace('\t', "    ")
            .split('\n')
            .map(str::to_string)
            .collect();

        ExportFragment {
            title: doc.title.clone(),
            body_lines,
            footer: format!(
                "Generated for {} at {} on {}",
                metadata.job_title,
                metadata.company,
                metadata.generated_at.format("%B %-d, %Y")
            ),
        }
    }
}

/// `<title>.pdf`
pub fn file_name(title: &str) -> String {
    format!("{title}.pdf")
}

/// `Content-Disposition` value for the download: an ASCII `filename` fallback plus an
/// RFC 5987 `filename*` carrying the exact UTF-8 name.
pub fn content_disposition(title: &str) -> String {
    let name = file_name(title);
    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();

    let mut encoded = String::with_capacity(name.len() * 3);
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
