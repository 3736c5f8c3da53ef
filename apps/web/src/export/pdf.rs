//! Lays an `ExportFragment` out on US-letter pages and writes it with lopdf.
//!
//! # Page model
//! - 612 x 792 pt, portrait, 36 pt (half-inch) margins on every side.
//! - Title: Helvetica-Bold 24 pt, dark blue, followed by a 20 pt gap.
//! - Body: Helvetica 14 pt, line height 1.6. Blank lines advance the cursor.
//! - Footer: Helvetica 12 pt grey, after a 20 pt gap.
//!
//! Every line is wrapped to the text width first, then placed top-down. A line that
//! would cross the bottom margin starts a new page.
//!
//! This is synchronous CPU work. Callers run it through `tokio::task::spawn_blocking`.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use super::font_metrics::{get_metrics, to_win_ansi, FontFace};
use super::fragment::ExportFragment;
use super::ExportError;

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 36.0;
pub const TEXT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TITLE_SIZE: f32 = 24.0;
const TITLE_LINE_HEIGHT: f32 = 1.2;
const TITLE_COLOR: Rgb = Rgb(0.102, 0.212, 0.365); // #1a365d
const BODY_SIZE: f32 = 14.0;
const BODY_LINE_HEIGHT: f32 = 1.6;
const BODY_COLOR: Rgb = Rgb(0.0, 0.0, 0.0);
const FOOTER_SIZE: f32 = 12.0;
const FOOTER_LINE_HEIGHT: f32 = 1.2;
const FOOTER_COLOR: Rgb = Rgb(0.4, 0.4, 0.4);
const SECTION_GAP: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

/// One line of text at its final position. `y` is the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub face: FontFace,
    pub size: f32,
    pub color: Rgb,
    pub x: f32,
    pub y: f32,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

struct Style {
    face: FontFace,
    size: f32,
    line_height: f32,
    color: Rgb,
}

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Cursor {
            pages: vec![Page::default()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn place(&mut self, text: &str, style: &Style) {
        let metrics = get_metrics(style.face);
        let max_width_em = TEXT_WIDTH / style.size;
        let advance = style.size * style.line_height;

        for segment in metrics.wrap(text, max_width_em) {
            let on_fresh_page = self.y == PAGE_HEIGHT - MARGIN;
            if self.y - advance < MARGIN && !on_fresh_page {
                self.pages.push(Page::default());
                self.y = PAGE_HEIGHT - MARGIN;
            }
            // Baseline sits one font size below the top of the line box.
            let baseline = self.y - style.size;
            if let Some(page) = self.pages.last_mut() {
                page.lines.push(PlacedLine {
                    face: style.face,
                    size: style.size,
                    color: style.color,
                    x: MARGIN,
                    y: baseline,
                    text: segment,
                });
            }
            self.y -= advance;
        }
    }

    fn gap(&mut self, points: f32) {
        self.y = (self.y - points).max(MARGIN);
    }
}

pub fn layout(fragment: &ExportFragment) -> Vec<Page> {
    let title = Style {
        face: FontFace::Bold,
        size: TITLE_SIZE,
        line_height: TITLE_LINE_HEIGHT,
        color: TITLE_COLOR,
    };
    let body = Style {
        face: FontFace::Regular,
        size: BODY_SIZE,
        line_height: BODY_LINE_HEIGHT,
        color: BODY_COLOR,
    };
    let footer = Style {
        face: FontFace::Regular,
        size: FOOTER_SIZE,
        line_height: FOOTER_LINE_HEIGHT,
        color: FOOTER_COLOR,
    };

    let mut cursor = Cursor::new();
    cursor.place(&fragment.title, &title);
    cursor.gap(SECTION_GAP);
    for line in &fragment.body_lines {
        cursor.place(line, &body);
    }
    cursor.gap(SECTION_GAP);
    cursor.place(&fragment.footer, &footer);
    cursor.pages
}

// ────────────────────────────────────────────────────────────────────────────
// Serialisation
// ────────────────────────────────────────────────────────────────────────────

/// Renders the fragment to PDF bytes.
pub fn render(fragment: &ExportFragment) -> Result<Vec<u8>, ExportError> {
    let pages = layout(fragment);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for face in [FontFace::Regular, FontFace::Bold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in &pages {
        let page_id = write_page(&mut doc, page, pages_id, resources_id)?;
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(to_win_ansi(&fragment.title)),
        "Producer" => Object::string_literal("ResumeAI"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    Ok(bytes)
}

fn write_page(
    doc: &mut Document,
    page: &Page,
    parent: ObjectId,
    resources: ObjectId,
) -> Result<ObjectId, ExportError> {
    let mut operations = Vec::with_capacity(page.lines.len() * 5);
    for line in &page.lines {
        let Rgb(r, g, b) = line.color;
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        operations.push(Operation::new(
            "Tf",
            vec![line.face.resource_name().into(), line.size.into()],
        ));
        operations.push(Operation::new("Td", vec![line.x.into(), line.y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(to_win_ansi(&line.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    let content = Content { operations }
        .encode()
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "Resources" => resources,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        "Contents" => content_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(body: &[&str]) -> ExportFragment {
        ExportFragment {
            title: "Resume for Backend Engineer at Acme".to_string(),
            body_lines: body.iter().map(|s| s.to_string()).collect(),
            footer: "Generated for Backend Engineer at Acme on March 5, 2024".to_string(),
        }
    }

    /// (text, y) for every Tj on every page, in page order.
    fn shown_text(bytes: &[u8]) -> Vec<(String, f32)> {
        let doc = Document::load_mem(bytes).unwrap();
        let mut out = Vec::new();
        for (_, page_id) in doc.get_pages() {
            let data = doc.get_page_content(page_id).unwrap();
            let content = Content::decode(&data).unwrap();
            let mut y = 0.0;
            for op in content.operations {
                match op.operator.as_str() {
                    "Td" => y = op.operands[1].as_float().unwrap(),
                    "Tj" => {
                        let raw = op.operands[0].as_str().unwrap();
                        out.push((String::from_utf8_lossy(raw).into_owned(), y));
                    }
                    _ => {}
                }
            }
        }
        out
    }

    #[test]
    fn test_render_produces_parseable_letter_pdf() {
        let bytes = render(&fragment(&["JANE DOE", "Engineer"])).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let media_box = doc
            .get_object(page_id)
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(media_box, vec![0.0, 0.0, 612.0, 792.0]);
    }

    #[test]
    fn test_title_body_footer_in_order() {
        let bytes = render(&fragment(&["JANE DOE"])).unwrap();
        let texts: Vec<String> = shown_text(&bytes).into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            texts,
            vec![
                "Resume for Backend Engineer at Acme",
                "JANE DOE",
                "Generated for Backend Engineer at Acme on March 5, 2024",
            ]
        );
    }

    #[test]
    fn test_blank_line_advances_one_body_line() {
        let bytes = render(&fragment(&["A", "", "B"])).unwrap();
        let shown = shown_text(&bytes);
        let y_a = shown.iter().find(|(t, _)| t == "A").unwrap().1;
        let y_b = shown.iter().find(|(t, _)| t == "B").unwrap().1;
        assert!((y_a - y_b - 2.0 * BODY_SIZE * BODY_LINE_HEIGHT).abs() < 0.01);
    }

    #[test]
    fn test_lines_stay_inside_margins() {
        let long = "Delivered a multi-region rollout with zero downtime ".repeat(6);
        let dashes = "—".repeat(60);
        let typographic = "“Quoted” results… Œuvre™ ÆON – ‰ ".repeat(8);
        let body = vec![long.as_str(), dashes.as_str(), typographic.as_str(), long.as_str()];
        for page in layout(&fragment(&body)) {
            for line in page.lines {
                let width = get_metrics(line.face).measure_str(&line.text) * line.size;
                assert!(line.x >= MARGIN);
                assert!(line.x + width <= PAGE_WIDTH - MARGIN + 0.01, "{}", line.text);
                assert!(line.y >= MARGIN, "below bottom margin: {}", line.y);
            }
        }
    }

    #[test]
    fn test_long_body_paginates() {
        let body: Vec<String> = (0..80).map(|i| format!("Line {i}")).collect();
        let refs: Vec<&str> = body.iter().map(String::as_str).collect();
        let pages = layout(&fragment(&refs));
        assert!(pages.len() > 1);

        let bytes = render(&fragment(&refs)).unwrap();
        assert_eq!(Document::load_mem(&bytes).unwrap().get_pages().len(), pages.len());
        let texts: Vec<String> = shown_text(&bytes).into_iter().map(|(t, _)| t).collect();
        assert!(texts.contains(&"Line 79".to_string()));
    }
}
