use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::client::{HttpTileClient, TileClient};
use crate::config::Config;
use crate::error::{Error, FetchError};
use crate::report::{FetchObserver, LogObserver, RunPlan, RunState, Session, Summary, TileOutcome};
use crate::store::TileStore;
use crate::tile::Tile;

/// Progress is reported whenever this many tiles have been processed, in
/// addition to after every download.
pub const PROGRESS_INTERVAL: u64 = 50;

/// Downloads the tiles of a [`Config`] one after another.
///
/// Tiles already on disk are skipped, every download is followed by a random
/// pause within the configured delay bounds, and failed tiles are counted and
/// left absent so that a later run fetches them again.
#[derive(Debug)]
pub struct Downloader<C> {
    cfg: Config,
    client: C,
    store: TileStore,
}

impl<C: TileClient> Downloader<C> {
    pub fn new(cfg: Config, client: C) -> Self {
        let store = TileStore::new(cfg.output_folder.clone());

        Self { cfg, client, store }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    /// Runs the download until the tile sequence is exhausted, the download
    /// limit is reached or `cancel` fires.
    ///
    /// Cancellation is checked between tiles and cuts short the pause after a
    /// download, but never aborts a request in flight. Only invalid
    /// configuration and an unusable output folder are returned as errors;
    /// failed tiles end up in the summary's error count.
    pub async fn run<O: FetchObserver>(
        &self,
        observer: &mut O,
        cancel: &CancellationToken,
    ) -> Result<Summary, Error> {
        self.cfg.validate()?;
        let total_tiles = self.cfg.total_tiles()?;
        let tiles = self.cfg.tiles()?;

        self.store.init().await?;

        observer.on_start(&RunPlan {
            bounding_box: self.cfg.bounding_box,
            provider: &self.cfg.provider.display_name,
            min_zoom: self.cfg.min_zoom,
            max_zoom: self.cfg.max_zoom,
            total_tiles,
            start_offset: self.cfg.start_offset,
            limit: self.cfg.limit,
        });

        let mut session = Session::new();
        let mut state = RunState::Completed;
        let mut level = None;

        for tile in tiles {
            if cancel.is_cancelled() {
                state = RunState::Interrupted;
                break;
            }
            if let Some(limit) = self.cfg.limit {
                if session.downloaded >= limit {
                    state = RunState::LimitReached;
                    break;
                }
            }

            if level != Some(tile.z) {
                level = Some(tile.z);
                observer.on_level(&self.cfg.bounding_box.bounds_at(tile.z));
            }

            let outcome = self.process(&tile).await;
            let downloaded = matches!(outcome, TileOutcome::Downloaded { .. });

            session.record(&outcome);
            observer.on_tile(&tile, &outcome);

            if downloaded || session.processed() % PROGRESS_INTERVAL == 0 {
                observer.on_progress(&session, Some(&tile).filter(|_| downloaded));
            }

            // only real requests are rate limited
            if downloaded {
                self.pause(cancel).await;
            }
        }

        let summary = Summary::new(&session, state);
        observer.on_finish(&summary);

        Ok(summary)
    }

    async fn process(&self, tile: &Tile) -> TileOutcome {
        let slug = self.cfg.provider.storage_slug.as_str();

        if self.store.exists(slug, tile).await {
            return TileOutcome::Skipped;
        }

        match self.download(slug, tile).await {
            Ok(bytes) => TileOutcome::Downloaded { bytes },
            Err(e) => {
                if let Err(rm) = self.store.remove_if_present(slug, tile).await {
                    tracing::warn!("failed removing partial tile {}: {}", tile, rm);
                }

                TileOutcome::Failed(e)
            }
        }
    }

    async fn download(&self, slug: &str, tile: &Tile) -> Result<u64, FetchError> {
        let url = self.cfg.provider.url.tile_url(tile);
        let bytes = self.client.get(&url).await?;

        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        self.store.save(slug, tile, &bytes).await?;

        Ok(bytes.len() as u64)
    }

    async fn pause(&self, cancel: &CancellationToken) {
        let delay = random_delay(self.cfg.min_delay, self.cfg.max_delay);
        if delay.is_zero() {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {}
        }
    }
}

/// Picks a delay uniformly from `min..=max`.
fn random_delay(min: Duration, max: Duration) -> Duration {
    if min >= max {
        return min;
    }

    let secs = rand::rng().random_range(min.as_secs_f64()..=max.as_secs_f64());
    Duration::from_secs_f64(secs)
}

/// Download the tiles specified in `cfg` over HTTP and save them to the file
/// system, logging progress through `tracing`.
///
/// # Example
/// ```rust,no_run
/// use uk_tile_downloader::{fetch, Config, ProviderRegistry};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() {
/// let provider = ProviderRegistry::builtin()
///     .resolve("osm", None, None, None)
///     .expect("unknown provider");
/// let config = Config {
///     max_zoom: 6,
///     ..Config::new(provider, "./tiles")
/// };
///
/// fetch(config, CancellationToken::new())
///     .await
///     .expect("failed fetching tiles");
/// # }
/// ```
pub async fn fetch(cfg: Config, cancel: CancellationToken) -> Result<Summary, Error> {
    let client = HttpTileClient::new(cfg.timeout)?;

    Downloader::new(cfg, client)
        .run(&mut LogObserver, &cancel)
        .await
}
