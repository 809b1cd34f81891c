mod args;
mod interrupt;
mod logging;
mod validators;

use anyhow::{Context, Result};
use args::Args;
use tokio_util::sync::CancellationToken;
use uk_tile_downloader::{
    format_bytes, BoundingBox, Config, Downloader, HttpTileClient, LogObserver,
    ProgressBarObserver, ProviderRegistry, TileStore, ESTIMATED_TILE_SIZE,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init(args.log_file.as_deref())?;
    let registry = ProviderRegistry::builtin();

    if args.list_providers {
        list_providers(&registry);
        return Ok(());
    }

    if args.stats {
        return print_stats(&TileStore::new(&args.tiles_dir)).await;
    }

    let config = args
        .config(&registry)
        .context("failed resolving tile provider")?;
    config.validate()?;

    if args.dry_run {
        return dry_run(&config);
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if interrupt::watch(tokio::signal::ctrl_c, cancel).await {
                std::process::exit(interrupt::EXIT_CODE);
            }
        }
    });

    let client = HttpTileClient::new(config.timeout)?;
    let downloader = Downloader::new(config, client);

    if args.progress_bar {
        downloader.run(&mut ProgressBarObserver::new(), &cancel).await?;
    } else {
        downloader.run(&mut LogObserver, &cancel).await?;
    }

    Ok(())
}

fn list_providers(registry: &ProviderRegistry) {
    println!("Available providers:");
    for p in registry.iter() {
        println!(
            "  {:<12} {:<24} {:<16}{}",
            p.key,
            p.display_name,
            p.storage_slug,
            if p.requires_api_key() {
                "requires --api-key"
            } else {
                ""
            }
        );
    }
}

fn dry_run(config: &Config) -> Result<()> {
    let total = config.total_tiles()?;
    let remaining = total.saturating_sub(config.start_offset);
    let tile_count = config.limit.map_or(remaining, |limit| remaining.min(limit));

    eprintln!(
        "would download up to {} of {} tiles from {} (approx {}, assuming 15 KiB per tile)",
        tile_count,
        total,
        config.provider.display_name,
        format_bytes(tile_count * ESTIMATED_TILE_SIZE)
    );

    Ok(())
}

async fn print_stats(store: &TileStore) -> Result<()> {
    let stats = store.stats().await?;

    if stats.is_empty() {
        println!("No tiles found in {}", store.root().display());
        return Ok(());
    }

    let region = BoundingBox::UNITED_KINGDOM;

    println!("Current tile statistics:");
    for (slug, levels) in &stats {
        println!("{}:", slug);

        let mut total = 0;
        for (&zoom, &count) in levels {
            total += count;
            let expected = region.tile_count(zoom)?;
            let percentage = count as f64 / expected as f64 * 100_f64;

            println!(
                "  Zoom {:2}: {:8} / {:8} tiles ({:5.1}%)",
                zoom, count, expected, percentage
            );
        }
        println!("  Total:   {:8} tiles", total);
    }

    Ok(())
}
