use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;
use yodo_server::headers::guess_content_type;
use yodo_server::{ServerConfig, YodoServer, DEFAULT_MAX_CONTENT_LENGTH};
use yodo_store::{FsOnceStore, FsStoreConfig, Metadata, OnceStore, StoreError, StoredBlob};
use yodo_types::BlobId;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Put(args) => cmd_put(args, &cli.format),
        Command::Get(args) => cmd_get(args, &cli.format),
        Command::Peek(args) => cmd_peek(args, &cli.format),
    }
}

/// Layer flags and environment over the config file over defaults.
fn serve_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(dir) = &args.state_dir {
        config.state_dir = dir.clone();
    }
    if let Some(limit) = args.max_content_length {
        config.max_content_length = limit;
    }
    if config.state_dir.as_os_str().is_empty() || config.state_dir == Path::new(".") {
        bail!("STATE_DIRECTORY not set or empty");
    }
    Ok(config)
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = serve_config(&args)?;
    let server = YodoServer::new(config).context("failed to open state directory")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn open_store(args: &StoreArgs) -> anyhow::Result<FsOnceStore> {
    let root = std::path::absolute(&args.state_dir)
        .with_context(|| format!("invalid state directory {}", args.state_dir.display()))?;
    Ok(FsOnceStore::open(root, FsStoreConfig::default())?)
}

fn parse_id(raw: &str) -> anyhow::Result<BlobId> {
    BlobId::parse(raw).with_context(|| format!("{raw:?} is not a blob identifier"))
}

/// Metadata for a local upload: explicit values first, then whatever the
/// path tells us.
fn put_metadata(path: &Path, content_type: Option<String>, filename: Option<String>) -> Metadata {
    let filename = filename.or_else(|| {
        (path != Path::new("-"))
            .then(|| path.file_name())
            .flatten()
            .map(|name| name.to_string_lossy().into_owned())
    });
    let content_type = content_type.or_else(|| filename.as_deref().and_then(guess_content_type));
    Metadata::new(content_type, filename)
}

fn cmd_put(args: PutArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let store = open_store(&args.store)?;
    let limit = match args.max_content_length {
        Some(0) | None => DEFAULT_MAX_CONTENT_LENGTH,
        Some(limit) => limit,
    };
    let metadata = put_metadata(&args.path, args.content_type, args.filename);

    let mut source: Box<dyn Read> = if args.path == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        Box::new(
            File::open(&args.path)
                .with_context(|| format!("failed to open {}", args.path.display()))?,
        )
    };
    let id = store.allocate(&mut source, metadata, limit)?;

    match format {
        OutputFormat::Text => println!("{}", id.to_string().yellow()),
        OutputFormat::Json => println!("{}", json!({ "id": id.to_string() })),
    }
    Ok(())
}

fn describe(blob: &StoredBlob, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = format!(
                "{} {}\n  Content-Type: {}\n  Size: {} bytes",
                "Blob".bold(),
                blob.id.to_string().yellow(),
                blob.metadata.effective_content_type().cyan(),
                blob.size()
            );
            if let Some(name) = blob.metadata.display_filename() {
                out.push_str(&format!("\n  Filename: {name}"));
            }
            out
        }
        OutputFormat::Json => json!({
            "id": blob.id.to_string(),
            "content_type": blob.metadata.effective_content_type(),
            "filename": blob.metadata.display_filename(),
            "size": blob.size(),
        })
        .to_string(),
    }
}

fn report_missing(result: Result<StoredBlob, StoreError>) -> anyhow::Result<StoredBlob> {
    result.map_err(|e| match e {
        StoreError::NotFound(id) => anyhow::anyhow!("{} blob {id} not found", "✗".red()),
        other => other.into(),
    })
}

fn cmd_get(args: GetArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    let store = open_store(&args.store)?;
    let blob = report_missing(store.claim(&id))?;

    match &args.output {
        Some(path) => {
            write_payload(path, &blob.payload)?;
            println!("{}", describe(&blob, format));
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&blob.payload)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn write_payload(path: &Path, payload: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, payload).with_context(|| format!("failed to write {}", path.display()))
}

fn cmd_peek(args: PeekArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    let store = open_store(&args.store)?;
    let blob = report_missing(store.peek(&id))?;
    println!("{}", describe(&blob, format));
    Ok(())
}
