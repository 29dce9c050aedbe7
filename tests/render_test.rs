//! End-to-end rendering tests through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use impress::{Error, ErrorKind, Fetcher, Format, Impress, Result};
use serde_json::{json, Value};

/// Serves fixed bytes for every URL and counts calls.
struct CountingFetcher {
    calls: AtomicUsize,
    body: Vec<u8>,
}

impl CountingFetcher {
    fn new(body: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            body,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for CountingFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        Ok(self.body.clone())
    }
}

/// Fails every fetch.
struct BrokenFetcher;

#[async_trait]
impl Fetcher for BrokenFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Err(Error::resource(url, "connection refused"))
    }
}

fn png() -> Vec<u8> {
    let image = image::RgbImage::from_pixel(8, 4, image::Rgb([200, 10, 10]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

fn paragraph(content: Value) -> Value {
    json!({ "type": "paragraph", "content": content })
}

fn request(content: Value, tags: Value, format: &str) -> Value {
    json!({
        "document": {
            "type": "doc",
            "attrs": { "title": "T", "language": "fr" },
            "content": content,
        },
        "tags": tags,
        "format": format,
    })
}

async fn render_with(fetcher: Arc<dyn Fetcher>, raw: &Value) -> Result<impress::Rendered> {
    Impress::new().with_fetcher(fetcher).render_json(raw).await
}

async fn render_text(raw: &Value) -> String {
    let rendered = render_with(CountingFetcher::new(Vec::new()), raw).await.unwrap();
    rendered.as_text().unwrap().to_string()
}

#[tokio::test]
async fn test_greeting_end_to_end() {
    let content = json!([paragraph(json!([
        { "type": "text", "text": "Bonjour " },
        { "type": "tag", "attrs": { "id": "name" } }
    ]))]);
    let tags = json!([{ "id": "name", "value": "Alice" }]);

    let html = render_text(&request(content.clone(), tags.clone(), "html")).await;
    assert!(html.contains("<p>Bonjour Alice</p>"));
    assert!(html.contains("<title>T</title>"));
    assert!(html.contains("lang=\"fr\""));

    let text = render_text(&request(content, tags, "text")).await;
    assert_eq!(text, "Bonjour Alice");
}

#[tokio::test]
async fn test_unmatched_tag_renders_empty() {
    let content = json!([paragraph(json!([
        { "type": "text", "text": "[" },
        { "type": "tag", "attrs": { "id": "missing" } },
        { "type": "text", "text": "]" }
    ]))]);

    for format in ["html", "mjml", "text"] {
        let out = render_text(&request(content.clone(), json!([]), format)).await;
        assert!(out.contains("[]"), "{} output: {}", format, out);
    }

    let fetcher = CountingFetcher::new(Vec::new());
    let pdf = render_with(fetcher, &request(content, json!([]), "pdf"))
        .await
        .unwrap();
    assert_eq!(pdf.page_count, Some(1));
}

#[tokio::test]
async fn test_pdf_without_images_never_fetches() {
    let fetcher = CountingFetcher::new(png());
    let content = json!([paragraph(json!([{ "type": "text", "text": "no pictures" }]))]);

    let rendered = render_with(fetcher.clone(), &request(content, json!([]), "pdf"))
        .await
        .unwrap();
    assert_eq!(rendered.content_type, "application/pdf");
    assert!(rendered.body.starts_with(b"%PDF"));
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_same_image_fetched_once() {
    let fetcher = CountingFetcher::new(png());
    let image = json!({ "type": "image", "attrs": { "src": "https://e.com/logo.png", "width": 80 } });
    let content = json!([image.clone(), paragraph(json!([{ "type": "text", "text": "x" }])), image]);

    let rendered = render_with(fetcher.clone(), &request(content, json!([]), "pdf"))
        .await
        .unwrap();
    assert_eq!(fetcher.calls(), 1);

    let pdf = lopdf::Document::load_mem(&rendered.body).unwrap();
    let images = pdf
        .objects
        .values()
        .filter_map(|object| object.as_stream().ok())
        .filter(|stream| {
            stream
                .dict
                .get(b"Subtype")
                .and_then(|subtype| subtype.as_name())
                .map(|name| name == b"Image")
                .unwrap_or(false)
        })
        .count();
    // One shared XObject, no alpha mask for an RGB image
    assert_eq!(images, 1);
}

#[tokio::test]
async fn test_markup_never_fetches() {
    let fetcher = CountingFetcher::new(png());
    let content = json!([{ "type": "image", "attrs": { "src": "https://e.com/chart.svg" } }]);

    let rendered = render_with(fetcher.clone(), &request(content, json!([]), "html"))
        .await
        .unwrap();
    assert_eq!(fetcher.calls(), 0);
    assert!(rendered.as_text().unwrap().contains("src=\"https://e.com/chart.svg\""));
}

#[tokio::test]
async fn test_svg_rasterized_for_pdf() {
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="blue"/></svg>"#;
    let fetcher = CountingFetcher::new(svg.to_vec());
    let content = json!([{ "type": "image", "attrs": { "src": "https://e.com/chart.SVG?v=2" } }]);

    let rendered = render_with(fetcher.clone(), &request(content, json!([]), "pdf"))
        .await
        .unwrap();
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(rendered.page_count, Some(1));
}

#[tokio::test]
async fn test_fetch_failure_is_resource_error() {
    let content = json!([{ "type": "image", "attrs": { "src": "https://e.com/gone.png" } }]);
    let err = render_with(Arc::new(BrokenFetcher), &request(content, json!([]), "pdf"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resource);
    assert!(err.to_string().contains("https://e.com/gone.png"));
}

#[tokio::test]
async fn test_invalid_request_is_validation_error() {
    let raw = request(json!([{ "type": "heading", "attrs": { "level": 7 } }]), json!([]), "html");
    let err = render_with(Arc::new(BrokenFetcher), &raw).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("level"));
}

#[tokio::test]
async fn test_mark_order_is_irrelevant() {
    let marked = |marks: Value| {
        json!([paragraph(json!([{ "type": "text", "text": "x", "marks": marks }]))])
    };
    let a = marked(json!([{ "type": "bold" }, { "type": "italic" }]));
    let b = marked(json!([{ "type": "italic" }, { "type": "bold" }]));

    for format in ["html", "mjml"] {
        let left = render_text(&request(a.clone(), json!([]), format)).await;
        let right = render_text(&request(b.clone(), json!([]), format)).await;
        assert_eq!(left, right);
    }
}

#[tokio::test]
async fn test_multiline_text() {
    let content = json!([paragraph(json!([{ "type": "text", "text": "a\nb\nc" }]))]);

    let html = render_text(&request(content.clone(), json!([]), "html")).await;
    assert_eq!(html.matches("<br>").count(), 2);
    assert!(html.contains("a<br>b<br>c</p>"));

    let text = render_text(&request(content, json!([]), "text")).await;
    assert_eq!(text, "a\nb\nc");
}

#[tokio::test]
async fn test_ordered_list_markup() {
    let item = |text: &str| {
        json!({ "type": "listItem", "content": [paragraph(json!([{ "type": "text", "text": text }]))] })
    };
    let content = json!([{ "type": "orderedList", "content": [item("one"), item("two")] }]);

    let html = render_text(&request(content.clone(), json!([]), "html")).await;
    assert_eq!(html.matches("<ol>").count(), 1);
    assert_eq!(html.matches("<li><p>").count(), 2);

    let text = render_text(&request(content, json!([]), "text")).await;
    assert_eq!(text, "1. one\n2. two");
}

#[tokio::test]
async fn test_number_tags_follow_locale() {
    let content = json!([paragraph(json!([{ "type": "tag", "attrs": { "id": "total" } }]))]);
    let tags = json!([{ "id": "total", "value": 1234.5 }]);

    let text = render_text(&request(content, tags, "text")).await;
    assert_eq!(text, "1\u{202f}234,5");
}

#[tokio::test]
async fn test_rendering_is_idempotent() {
    let content = json!([
        { "type": "heading", "attrs": { "level": 1 }, "content": [{ "type": "text", "text": "Title" }] },
        { "type": "image", "attrs": { "src": "https://e.com/a.png", "width": 40 } },
        { "type": "bulletList", "content": [
            { "type": "listItem", "content": [paragraph(json!([{ "type": "text", "text": "item" }]))] }
        ] }
    ]);

    for format in Format::ALL {
        let raw = request(content.clone(), json!([]), format.as_str());
        let first = render_with(CountingFetcher::new(png()), &raw).await.unwrap();
        let second = render_with(CountingFetcher::new(png()), &raw).await.unwrap();
        assert_eq!(first.body, second.body, "{} output differs", format);
    }
}

#[tokio::test]
async fn test_mention_and_hard_break() {
    let content = json!([paragraph(json!([
        { "type": "text", "text": "Hi " },
        { "type": "mention", "attrs": { "id": "name", "label": "NAME" } },
        { "type": "hardBreak" },
        { "type": "text", "text": "Bye" }
    ]))]);
    let tags = json!([{ "id": "name", "value": "Alice" }]);

    let html = render_text(&request(content.clone(), tags.clone(), "html")).await;
    assert!(html.contains("<p>Hi Alice<br>Bye</p>"));
    assert!(!html.contains("NAME"));

    let mjml = render_text(&request(content.clone(), tags.clone(), "mjml")).await;
    assert!(mjml.contains("<p>Hi Alice<br/>Bye</p>"));

    let text = render_text(&request(content, tags, "text")).await;
    assert_eq!(text, "Hi Alice\nBye");
}

/// `(y, text)` of every text operation, in PDF user space.
fn text_positions(bytes: &[u8]) -> Vec<(f32, String)> {
    let number = |object: &lopdf::Object| match object {
        lopdf::Object::Integer(i) => *i as f32,
        lopdf::Object::Real(r) => *r,
        other => panic!("not a number: {:?}", other),
    };
    let pdf = lopdf::Document::load_mem(bytes).unwrap();
    let mut out = Vec::new();
    for page_id in pdf.page_iter() {
        let content = pdf.get_page_content(page_id).unwrap();
        let ops = lopdf::content::Content::decode(&content).unwrap().operations;
        let mut y = 0.0;
        for op in &ops {
            match op.operator.as_str() {
                "Td" => y = number(&op.operands[1]),
                "Tj" => {
                    let text = op.operands[0].as_str().unwrap();
                    out.push((y, String::from_utf8_lossy(text).into_owned()));
                }
                _ => {}
            }
        }
    }
    out
}

#[tokio::test]
async fn test_tall_grid_spans_pages() {
    let column = |name: &str| {
        let blocks: Vec<Value> = (0..60)
            .map(|i| paragraph(json!([{ "type": "text", "text": format!("{} {}", name, i) }])))
            .collect();
        json!({ "type": "column", "content": blocks })
    };
    let content = json!([{ "type": "grid", "content": [column("left"), column("right")] }]);

    let rendered = render_with(CountingFetcher::new(Vec::new()), &request(content, json!([]), "pdf"))
        .await
        .unwrap();
    let pages = rendered.page_count.unwrap();
    assert!(pages > 1);

    let texts = text_positions(&rendered.body);
    let lines: Vec<&(f32, String)> = texts.iter().filter(|(_, text)| !text.contains(" / ")).collect();
    assert_eq!(lines.len(), 120);
    assert!(lines.iter().any(|(_, text)| text == "left 59"));
    assert!(lines.iter().any(|(_, text)| text == "right 59"));
    // Nothing is drawn in the bottom margin or below the page.
    assert!(lines.iter().all(|(y, _)| *y > 65.0));
    assert!(texts.iter().any(|(_, text)| *text == format!("{} / {}", pages, pages)));
}
