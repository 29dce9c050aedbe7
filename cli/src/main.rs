//! impress CLI - document rendering tool

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use impress::render::to_json;
use impress::schema::{validate, validate_request, validate_tags};
use impress::{
    Document, Format, HttpFetcher, Impress, JsonFormat, PageSize, RenderOptions, RenderRequest,
    Tags,
};

#[derive(Parser)]
#[command(name = "impress")]
#[command(version)]
#[command(about = "Render editor documents to PDF, HTML, MJML and text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a request or document
    Render {
        /// Render request JSON ({ document, tags, format }) or a bare document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Tag values JSON, used with a bare document
        #[arg(short, long, value_name = "FILE")]
        tags: Option<PathBuf>,

        /// Output format, overriding the request
        #[arg(short, long, value_enum, env = "IMPRESS_FORMAT")]
        format: Option<FormatArg>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE", env = "IMPRESS_OUTPUT")]
        output: Option<PathBuf>,

        /// Language overriding the document's own
        #[arg(short, long)]
        language: Option<String>,

        /// PDF page size
        #[arg(long, value_enum, default_value = "a4")]
        page_size: PageSizeArg,

        /// Allow file:// image sources
        #[arg(long)]
        local_files: bool,
    },

    /// Validate a request or document and print its normalized JSON
    Validate {
        /// Render request JSON or a bare document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// List the tag ids a document references
    Tags {
        /// Render request JSON or a bare document
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Standalone HTML page
    Html,
    /// Plain text
    Text,
    /// Paginated PDF
    Pdf,
    /// MJML email markup
    Mjml,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Html => Format::Html,
            FormatArg::Text => Format::Text,
            FormatArg::Pdf => Format::Pdf,
            FormatArg::Mjml => Format::Mjml,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PageSizeArg {
    /// ISO A4
    A4,
    /// US Letter
    Letter,
}

impl From<PageSizeArg> for PageSize {
    fn from(arg: PageSizeArg) -> Self {
        match arg {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::LETTER,
        }
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            input,
            tags,
            format,
            output,
            language,
            page_size,
            local_files,
        } => {
            cmd_render(
                &input,
                tags.as_deref(),
                format.map(Format::from),
                output.as_deref(),
                language,
                page_size.into(),
                local_files,
            )
            .await
        }
        Commands::Validate { input, compact } => cmd_validate(&input, compact),
        Commands::Tags { input } => cmd_tags(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn read_json(path: &Path) -> CliResult<Value> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Load a render request, or a bare document with optional tags from a file.
fn load_request(input: &Path, tags: Option<&Path>) -> CliResult<RenderRequest> {
    let raw = read_json(input)?;
    let mut request = if raw.get("document").is_some() {
        validate_request(&raw)?
    } else {
        RenderRequest {
            document: validate(&raw)?,
            tags: Tags::default(),
            format: Format::default(),
        }
    };

    if let Some(path) = tags {
        request.tags = Tags::new(validate_tags(&read_json(path)?)?);
    }
    Ok(request)
}

fn load_document(input: &Path) -> CliResult<Document> {
    Ok(load_request(input, None)?.document)
}

async fn cmd_render(
    input: &Path,
    tags: Option<&Path>,
    format: Option<Format>,
    output: Option<&Path>,
    language: Option<String>,
    page_size: PageSize,
    local_files: bool,
) -> CliResult<()> {
    let mut request = load_request(input, tags)?;
    if let Some(format) = format {
        request.format = format;
    }

    let mut options = RenderOptions::new().with_page_size(page_size);
    if let Some(language) = language {
        options = options.with_language(language);
    }

    let spinner = output.map(|_| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Rendering {}...", request.format));
        pb
    });

    let fetcher = HttpFetcher::new().with_local_files(local_files);
    let rendered = Impress::new()
        .with_options(options)
        .with_fetcher(Arc::new(fetcher))
        .render_request(&request)
        .await;
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    let rendered = rendered?;

    match output {
        Some(path) => {
            fs::write(path, &rendered.body)?;
            let pages = rendered
                .page_count
                .map(|n| format!(", {} page(s)", n))
                .unwrap_or_default();
            println!(
                "{} {} ({} bytes{})",
                "Saved to".green(),
                path.display(),
                rendered.len(),
                pages
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&rendered.body)?;
            if !rendered.format.is_binary() {
                writeln!(stdout)?;
            }
        }
    }

    Ok(())
}

fn cmd_validate(input: &Path, compact: bool) -> CliResult<()> {
    let document = load_document(input)?;
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    println!("{}", to_json(&document, format)?);
    Ok(())
}

fn cmd_tags(input: &Path) -> CliResult<()> {
    let document = load_document(input)?;
    let ids = document.tag_ids();
    if ids.is_empty() {
        println!("{}", "No tags referenced".dimmed());
    }
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "impress".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Document rendering tool");
    println!();
    println!("Formats: {}", "pdf, html, mjml, text".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOC: &str = r#"{
        "type": "doc",
        "attrs": { "title": "T", "language": "fr" },
        "content": [
            { "type": "paragraph", "content": [
                { "type": "text", "text": "Bonjour " },
                { "type": "tag", "attrs": { "id": "name" } }
            ] }
        ]
    }"#;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_bare_document_with_tags() {
        let dir = TempDir::new().unwrap();
        let doc = write(&dir, "doc.json", DOC);
        let tags = write(&dir, "tags.json", r#"[{ "id": "name", "value": "Alice" }]"#);

        let request = load_request(&doc, Some(&tags)).unwrap();
        assert_eq!(request.format, Format::Html);
        assert_eq!(request.document.title, "T");
        assert!(request.tags.get("name").is_some());
    }

    #[test]
    fn test_load_request() {
        let dir = TempDir::new().unwrap();
        let body = format!(r#"{{ "document": {}, "format": "text" }}"#, DOC);
        let path = write(&dir, "request.json", &body);

        let request = load_request(&path, None).unwrap();
        assert_eq!(request.format, Format::Text);
        assert!(request.tags.is_empty());
    }

    #[tokio::test]
    async fn test_render_to_file() {
        let dir = TempDir::new().unwrap();
        let doc = write(&dir, "doc.json", DOC);
        let tags = write(&dir, "tags.json", r#"[{ "id": "name", "value": "Alice" }]"#);
        let out = dir.path().join("out.txt");

        cmd_render(
            &doc,
            Some(&tags),
            Some(Format::Text),
            Some(&out),
            None,
            PageSize::A4,
            false,
        )
        .await
        .unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "Bonjour Alice");
    }

    #[tokio::test]
    async fn test_local_images_need_opt_in() {
        let dir = TempDir::new().unwrap();
        let svg = write(
            &dir,
            "dot.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="2" height="2"/>"#,
        );
        let body = format!(
            r#"{{ "type": "doc", "attrs": {{ "title": "T" }}, "content": [
                {{ "type": "image", "attrs": {{ "src": "file://{}" }} }}
            ] }}"#,
            svg.display()
        );
        let doc = write(&dir, "doc.json", &body);
        let out = dir.path().join("out.pdf");

        let denied = cmd_render(&doc, None, Some(Format::Pdf), Some(&out), None, PageSize::A4, false).await;
        assert!(denied.is_err());

        cmd_render(&doc, None, Some(Format::Pdf), Some(&out), None, PageSize::A4, true)
            .await
            .unwrap();
        assert!(fs::read(&out).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_invalid_document() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.json", r#"{ "type": "doc", "attrs": { "title": "T" }, "content": [{ "type": "table" }] }"#);
        let err = load_document(&path).unwrap_err();
        assert!(err.to_string().contains("content[0]"));
    }
}
