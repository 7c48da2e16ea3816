mod cli;

use animatch::{
    classifier, config,
    extractor::IndexExtractor,
    metadata::{BangumiClient, CachedMetadataService},
    ResolveRequest, ResolvedEpisode, Resolver,
};
use animatch_common::{paths::is_video_file, EpisodeId, SubjectId};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use futures::{stream, StreamExt};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

type BangumiResolver = Resolver<CachedMetadataService<BangumiClient>>;

fn build_resolver(config_path: Option<&Path>) -> Result<BangumiResolver> {
    let config = config::load_config_or_default(config_path)?;

    let client = BangumiClient::new(&config.bangumi, config.resolver.request_timeout())?;
    let service = CachedMetadataService::new(
        client,
        config.bangumi.cache_max_entries,
        Duration::from_secs(config.bangumi.cache_ttl_secs),
    );

    Ok(Resolver::with_defaults(service, config.resolver))
}

/// Token cancelled on Ctrl-C.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling outstanding lookups");
            trigger.cancel();
        }
    });
    token
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "animatch=debug,animatch_parser=debug,animatch_common=debug".to_string()
        } else {
            "animatch=info,animatch_parser=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Resolve {
            file,
            subject,
            season_subject,
            index,
            episode_id,
            json,
        } => {
            let mut request = ResolveRequest::new(file);
            request.series_subject_id = subject.map(SubjectId::new);
            request.season_subject_id = season_subject.map(SubjectId::new);
            request.known_index = index;
            request.cached_episode_id = episode_id.map(EpisodeId::new);

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(resolve_file(cli.config.as_deref(), request, json))
        }
        Commands::Scan {
            dir,
            subject,
            concurrency,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(scan_dir(
                cli.config.as_deref(),
                &dir,
                subject.map(SubjectId::new),
                concurrency,
                json,
            ))
        }
        Commands::Classify { file, json } => classify_file(&file, cli.config.as_deref(), json),
        Commands::Validate { config } => validate_config(config.as_deref()),
        Commands::Version => {
            println!("animatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn resolve_file(
    config_path: Option<&Path>,
    request: ResolveRequest,
    json: bool,
) -> Result<()> {
    let resolver = build_resolver(config_path)?;
    let cancel = shutdown_token();

    match resolver.resolve(&request, &cancel).await? {
        Some(episode) => print_episode(&request.path, &episode, json)?,
        None => {
            anyhow::bail!(
                "No subject id for {:?}: pass --subject or add a bangumi.ini",
                request.path
            );
        }
    }

    Ok(())
}

async fn scan_dir(
    config_path: Option<&Path>,
    dir: &Path,
    subject: Option<SubjectId>,
    concurrency: usize,
    json: bool,
) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {:?}", dir);
    }

    let resolver = build_resolver(config_path)?;
    let cancel = shutdown_token();

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_video_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    tracing::info!(count = files.len(), dir = ?dir, "Scanning directory");

    let resolver = &resolver;
    let cancel = &cancel;
    let mut results = stream::iter(files)
        .map(move |path| async move {
            let mut request = ResolveRequest::new(path);
            request.series_subject_id = subject;
            let outcome = resolver.resolve(&request, cancel).await;
            (request.path, outcome)
        })
        .buffered(concurrency.max(1));

    let mut resolved = 0usize;
    let mut failed = 0usize;
    while let Some((path, outcome)) = results.next().await {
        match outcome {
            Ok(Some(episode)) => {
                resolved += 1;
                print_episode(&path, &episode, json)?;
            }
            Ok(None) => {
                tracing::warn!(path = ?path, "No subject id, skipped");
            }
            Err(e) if e.is_cancelled() => return Err(e.into()),
            Err(e) => {
                failed += 1;
                tracing::error!(path = ?path, error = %e, "Resolution failed");
            }
        }
    }

    if !json {
        println!("\nResolved {} files, {} failed", resolved, failed);
    }
    Ok(())
}

fn print_episode(path: &Path, episode: &ResolvedEpisode, json: bool) -> Result<()> {
    if json {
        let line = serde_json::json!({
            "path": path,
            "episode": episode,
        });
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    println!("File: {}", path.display());
    println!("  Index: {}", episode.index);
    println!("  Type: {}", episode.episode_type);
    println!("  Title: {}", episode.title);
    if episode.original_title != episode.title {
        println!("  Original title: {}", episode.original_title);
    }
    if episode.remote_backed {
        println!("  Episode id: {}", episode.record.id);
    } else {
        println!("  Episode id: (placeholder)");
    }
    if let Some(date) = episode.premiere_date {
        println!("  Aired: {}", date);
    }
    if let Some(placement) = episode.placement {
        println!("  Placement: {:?}", placement);
    }
    Ok(())
}

fn classify_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let directory_name = file
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned());

    let classification = classifier::classify(&file_name, directory_name.as_deref());
    let stripped = classifier::strip_noise(&file_name);
    let tokens = animatch_parser::parse(animatch_common::paths::strip_media_extension(&file_name));
    let index = IndexExtractor::new(&config.resolver).extract(
        &stripped,
        None,
        None,
        tokens.episode_number(),
    );

    if json {
        let value = serde_json::json!({
            "file_name": file_name,
            "episode_type": classification.type_or_normal(),
            "type_token": classification.raw_token,
            "from_directory": classification.from_directory,
            "stripped": stripped,
            "index": index,
            "tokens": tokens,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("File: {}", file_name);
    println!("Type: {}", classification.type_or_normal());
    if let Some(ref token) = classification.raw_token {
        let source = if classification.from_directory {
            "directory"
        } else {
            "file name"
        };
        println!("Marker: {} (from {})", token, source);
    }
    println!("Stripped: {}", stripped);
    println!("Index: {}", index);
    if let Some(ref title) = tokens.title {
        println!("Title: {}", title);
    }
    if let Some(ref season) = tokens.season {
        println!("Season: {}", season);
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Catalogue: {}", config.bangumi.base_url);
            println!("  Requests per second: {}", config.bangumi.requests_per_second);
            println!(
                "  Access token: {}",
                if config.bangumi.access_token.is_some() {
                    "set"
                } else {
                    "not set"
                }
            );
            println!("  Request timeout: {}ms", config.resolver.request_timeout_ms);
            println!("  Max season hops: {}", config.resolver.max_season_hops);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Catalogue: {}", config.bangumi.base_url);
        }
    }

    Ok(())
}
