//! Benchmarks for impress rendering performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks render synthetic documents without any image I/O.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use impress::assets::AssetCache;
use impress::render::{render, Format, RenderOptions};
use impress::schema::validate;
use impress::{TagValue, Tags};
use serde_json::{json, Value};

/// Creates a raw document with the given number of paragraph/list pairs.
fn create_test_document(sections: usize) -> Value {
    let mut content = Vec::new();
    for i in 0..sections {
        content.push(json!({
            "type": "heading",
            "attrs": { "level": 2 },
            "content": [{ "type": "text", "text": format!("Section {}", i + 1) }]
        }));
        content.push(json!({
            "type": "paragraph",
            "content": [
                { "type": "text", "text": "Dear " },
                { "type": "tag", "attrs": { "id": "name" } },
                { "type": "text", "text": ", your balance is ", "marks": [{ "type": "bold" }] },
                { "type": "tag", "attrs": { "id": "balance" } },
                { "type": "text", "text": ". Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor incididunt ut labore et dolore magna aliqua." }
            ]
        }));
        content.push(json!({
            "type": "bulletList",
            "content": [
                { "type": "listItem", "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "first" }] }] },
                { "type": "listItem", "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "second" }] }] }
            ]
        }));
    }
    json!({ "type": "doc", "attrs": { "title": "Benchmark", "language": "fr" }, "content": content })
}

fn tags() -> Tags {
    Tags::new(vec![
        TagValue::new("name", "Alice"),
        TagValue::new("balance", 1234567.891),
    ])
}

fn bench_validation(c: &mut Criterion) {
    let raw = create_test_document(50);
    c.bench_function("validate_50_sections", |b| {
        b.iter(|| validate(black_box(&raw)));
    });
}

fn bench_formats(c: &mut Criterion) {
    let doc = match validate(&create_test_document(50)) {
        Ok(doc) => doc,
        Err(e) => panic!("benchmark document is invalid: {}", e),
    };
    let tags = tags();
    let cache = AssetCache::empty();
    let options = RenderOptions::default();

    let mut group = c.benchmark_group("render_50_sections");
    for format in Format::ALL {
        group.bench_function(format.as_str(), |b| {
            b.iter(|| render(black_box(&doc), &tags, &cache, format, &options));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_validation, bench_formats);
criterion_main!(benches);
