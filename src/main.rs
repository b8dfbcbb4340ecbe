mod error;
mod progress;
mod prompt;

use crate::error::{ErrorKind, Result};
use crate::progress::TerminalProgress;
use crate::prompt::{FixedRange, TerminalPrompt};
use clap::{Args, Parser, Subcommand};
use digivat_config::Config;
use digivat_extract::{ManifestLocation, TitleClassifier};
use digivat_fetch::{FetcherHandle, HttpFetcher};
use digivat_library::{
    Context, DialogRegistry, LibraryEvent, Outcome, RangePromptHandle, dispatch, fetch_manifest, resolve_manifest_url,
};
use digivat_render::{Assembler, Assembly, ProgressReporter, Stage};
use digivat_storage::backend::LocalBackend;
use digivat_store::{Database, ItemId, NewItem, Repository};
use exn::ResultExt;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Attach DigiVatLib manuscripts to library items as PDFs", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a web page to the library and process it
    Add {
        #[arg(long)]
        url: String,
        #[arg(long)]
        title: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Run the pipeline again for an existing item
    Process {
        id: ItemId,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Download a catalog page's manuscript to a PDF file, without the library
    Fetch {
        page_url: String,
        #[arg(long, short)]
        output: PathBuf,
        /// PDF title; defaults to the manifest label
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Show how a title would be recognised
    Classify { title: String },
    /// List library items and their attachments
    List,
}

/// Page range; asked on the terminal unless given here.
#[derive(Args, Debug, Clone, Copy)]
struct RangeArgs {
    /// First page to download (0-based)
    #[arg(long, allow_negative_numbers = true)]
    start: Option<i64>,
    /// Page to stop before
    #[arg(long, allow_negative_numbers = true)]
    end: Option<i64>,
}
impl RangeArgs {
    fn prompt(self) -> RangePromptHandle {
        if self.start.is_none() && self.end.is_none() {
            Arc::new(TerminalPrompt::default())
        } else {
            Arc::new(FixedRange { start: self.start, end: self.end })
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let classifier = TitleClassifier::new(&config.catalog.marker, &config.catalog.prefix);
    match cli.command {
        Commands::Classify { title } => {
            let classification = classifier.classify(&title);
            if classification.is_match {
                println!("match: {:?}", classification.canonical_title);
            } else {
                println!("no match");
            }
        },
        Commands::List => {
            let repository = repository(&config).await?;
            let items = repository.list_items().await.or_raise(|| ErrorKind::Database)?;
            for item in items {
                println!("{:>5}  {:<10}  {}", item.id.get(), item.item_type.to_string(), item.title);
                let attachments = repository.attachments_for(item.id).await.or_raise(|| ErrorKind::Database)?;
                for attachment in attachments {
                    println!("       └ {}  ({} bytes)", attachment.file.path.display(), attachment.file.size);
                }
            }
        },
        Commands::Add { url, title, range } => {
            let ctx = context(&config, classifier, range.prompt()).await?;
            let item = ctx.repository.create_item(&NewItem::webpage(title, url)).await.or_raise(|| ErrorKind::Database)?;
            tracing::info!(id = %item.id, "Item added");
            process(&ctx, vec![item.id]).await?;
        },
        Commands::Process { id, range } => {
            let ctx = context(&config, classifier, range.prompt()).await?;
            process(&ctx, vec![id]).await?;
        },
        Commands::Fetch { page_url, output, title, range } => {
            let fetcher = fetcher(&config)?;
            fetch_to_file(fetcher, &page_url, &output, title, range.prompt()).await?;
        },
    }
    Ok(())
}

fn fetcher(config: &Config) -> Result<FetcherHandle> {
    let fetcher = HttpFetcher::new(config.http.timeout(), &config.http.user_agent).or_raise(|| ErrorKind::Http)?;
    Ok(Arc::new(fetcher))
}

async fn repository(config: &Config) -> Result<Repository> {
    let database = Database::connect(&config.library.database).await.or_raise(|| ErrorKind::Database)?;
    Ok(Repository::from(&database))
}

async fn context(config: &Config, classifier: TitleClassifier, prompt: RangePromptHandle) -> Result<Context> {
    let root = std::path::absolute(&config.library.storage).or_raise(|| ErrorKind::Storage)?;
    let storage = LocalBackend::new("library", root).or_raise(|| ErrorKind::Storage)?;
    Ok(Context::new(repository(config).await?, Arc::new(storage), fetcher(config)?, prompt)
        .with_classifier(classifier)
        .with_progress(Arc::new(TerminalProgress)))
}

/// Dispatch an `Added` event and report each outcome.
async fn process(ctx: &Context, ids: Vec<ItemId>) -> Result<()> {
    let mut failed = false;
    let mut results = std::pin::pin!(dispatch(ctx, LibraryEvent::Added(ids)));
    while let Some((id, result)) = results.next().await {
        match result {
            Ok(Outcome::Skipped(reason)) => println!("{id}: skipped, {reason}"),
            Ok(Outcome::Stopped { item, reason }) => println!("{id}: {} ({reason})", item.title),
            Ok(Outcome::Attached { attachment, pages, requested, stopped, .. }) => {
                println!("{id}: attached {} ({pages} of {requested} pages)", attachment.file.path.display());
                if let Some(stopped) = stopped {
                    println!("{id}: stopped at page {}: {}", stopped.index, stopped.reason);
                }
            },
            Err(err) => {
                eprintln!("{id}: {err:?}");
                failed = true;
            },
        }
    }
    if failed {
        exn::bail!(ErrorKind::Pipeline);
    }
    Ok(())
}

/// Write the manuscript behind `page_url` to `output`. Returns `None`, and
/// writes nothing, when the page has no manifest or the manifest no images.
async fn fetch_to_file(
    fetcher: FetcherHandle,
    page_url: &str,
    output: &Path,
    title: Option<String>,
    prompt: RangePromptHandle,
) -> Result<Option<Assembly>> {
    let ManifestLocation::Found(manifest_url) =
        resolve_manifest_url(fetcher.as_ref(), page_url).await.or_raise(|| ErrorKind::Pipeline)?
    else {
        println!("{page_url}: no IIIF manifest found");
        return Ok(None);
    };
    let manifest = fetch_manifest(fetcher.as_ref(), &manifest_url).await.or_raise(|| ErrorKind::Pipeline)?;
    let title = title.or_else(|| manifest.label().map(str::to_string)).unwrap_or_else(|| page_url.to_string());
    let images = manifest.image_list();
    if images.is_empty() {
        println!("{page_url}: manifest lists no page images");
        return Ok(None);
    }

    // Not a library item; any id keeps the dialog slot unique here.
    let range = DialogRegistry::new(prompt).prompt_page_range(ItemId::from(0), &title, images.len()).await;
    let progress = TerminalProgress;
    let assembly = Assembler::new(fetcher)
        .build_pdf(range.select(&images.urls), &title, &progress)
        .await
        .or_raise(|| ErrorKind::Pipeline)?;
    progress.report(Stage::Writing);
    tokio::fs::write(output, &assembly.pdf).await.or_raise(|| ErrorKind::Output(output.to_path_buf()))?;
    progress.report(Stage::Finished);
    println!("{}: {} of {} pages", output.display(), assembly.pages, assembly.requested);
    if let Some(stopped) = &assembly.stopped {
        println!("{}: stopped at page {}: {}", output.display(), stopped.index, stopped.reason);
    }
    Ok(Some(assembly))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use digivat_fetch::{MockFetcher, MockResponse};
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    const PAGE: &str = "https://digi.vatlib.it/view/MSS_Pal.lat.1071";
    const MANIFEST: &str = "https://digi.vatlib.it/iiif/MSS_Pal.lat.1071/manifest.json";

    fn service(page: usize) -> String {
        format!("https://digi.vatlib.it/iiifimage/MSS_Pal.lat.1071/p{page}.jp2")
    }

    fn jpeg(width: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(width, 50))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    /// A catalog page whose manifest lists `pages` images, page `n` being
    /// `20 + n` pixels wide.
    fn catalog(pages: usize) -> Arc<MockFetcher> {
        let canvases: Vec<String> = (0..pages)
            .map(|page| {
                let service = service(page);
                format!(r#"{{"@id": "c{page}", "images": [{{"resource": {{"service": {{"@id": "{service}"}}}}}}]}}"#)
            })
            .collect();
        let canvases = canvases.join(",");
        let manifest = format!(r#"{{"label": "Pal.lat.1071", "sequences": [{{"canvases": [{canvases}]}}]}}"#);
        let html = format!(r#"<script>var viewer = {{"iiif_manifest_url": "{MANIFEST}"}};</script>"#);
        let mut fetcher = MockFetcher::default()
            .with_route(PAGE, MockResponse::ok(html))
            .with_route(MANIFEST, MockResponse::ok(manifest));
        for page in 0..pages {
            let url = format!("{}/full/full/0/default.jpg", service(page));
            fetcher = fetcher.with_route(url, MockResponse::ok(jpeg(20 + page as u32)));
        }
        Arc::new(fetcher)
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_range() {
        let cli = Cli::try_parse_from(["digivat", "-vv", "add", "--url", "https://x", "--title", "t", "--start", "-1"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Add { range, .. } = cli.command else {
            panic!("expected add");
        };
        assert_eq!((range.start, range.end), (Some(-1), None));
    }

    #[tokio::test]
    async fn test_fetch_writes_selected_pages() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output = temp_dir.path().join("pal-lat-1071.pdf");
        let prompt = Arc::new(FixedRange { start: Some(1), end: None });
        let assembly = fetch_to_file(catalog(3), PAGE, &output, None, prompt).await.unwrap().unwrap();
        assert_eq!((assembly.pages, assembly.requested), (2, 2));
        assert!(assembly.stopped.is_none());

        let written = std::fs::read(&output).unwrap();
        assert!(written.starts_with(b"%PDF"));
        assert_eq!(written, assembly.pdf);
        let doc = lopdf::Document::load_mem(&written).unwrap();
        let widths: Vec<i64> = doc
            .get_pages()
            .values()
            .map(|id| {
                let page = doc.get_object(*id).unwrap().as_dict().unwrap();
                page.get(b"MediaBox").unwrap().as_array().unwrap()[2].as_i64().unwrap()
            })
            .collect();
        assert_eq!(widths, vec![21, 22]);
        let info = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let title = doc.get_object(info).unwrap().as_dict().unwrap().get(b"Title").unwrap().as_str().unwrap();
        assert_eq!(title, b"Pal.lat.1071");
    }

    #[tokio::test]
    async fn test_fetch_without_manifest_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output = temp_dir.path().join("none.pdf");
        let fetcher = Arc::new(MockFetcher::default().with_route(PAGE, MockResponse::status(404, "<html>gone</html>")));
        let prompt = Arc::new(FixedRange { start: None, end: None });
        assert!(fetch_to_file(fetcher, PAGE, &output, None, prompt).await.unwrap().is_none());
        assert!(!output.exists());
    }
}
