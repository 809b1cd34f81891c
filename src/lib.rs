//! Download web map tiles covering the United Kingdom to your disk.
//!
//! **Use with caution.** Downloading tiles en-masse can hog down a tile
//! server easily. Tiles are fetched strictly one at a time with a random
//! pause after every download; keep it that way and respect the tile usage
//! policy of the provider you download from.
//!
//! Tiles are stored as `<root>/<provider slug>/<z>/<x>/<y>.png`, the layout
//! web-mapping clients such as Leaflet expect. Runs can be resumed: tiles
//! already on disk are skipped, and the position of every tile in the
//! download order is fixed, so a run can start at any offset.
//!
//! # CLI Example
//!
//! ```bash
//! uk-tile-downloader \
//!   --provider osm \
//!   --min-zoom 0 \
//!   --max-zoom 10 \
//!   --start-tile 1000 \
//!   --limit 500
//! ```
//!
//! # Library Example
//! ```rust,no_run
//! use uk_tile_downloader::{Config, Downloader, HttpTileClient, LogObserver, ProviderRegistry};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), uk_tile_downloader::Error> {
//! let provider = ProviderRegistry::builtin().resolve("osm", None, None, None)?;
//! let config = Config {
//!     min_zoom: 5,
//!     max_zoom: 8,
//!     limit: Some(100),
//!     ..Config::new(provider, "./tiles")
//! };
//!
//! let client = HttpTileClient::new(config.timeout)?;
//! let summary = Downloader::new(config, client)
//!     .run(&mut LogObserver, &CancellationToken::new())
//!     .await?;
//! println!("downloaded {} tiles", summary.downloaded);
//! # Ok(())
//! # }
//! ```

mod bounding_box;
mod client;
mod config;
mod error;
mod fetch;
mod provider;
mod report;
mod sequence;
mod store;
mod tile;
mod url;

pub use bounding_box::{BoundingBox, TileBounds};
pub use client::{HttpTileClient, TileClient, DEFAULT_TIMEOUT};
pub use config::{Config, DEFAULT_MAX_DELAY, DEFAULT_MAX_ZOOM, DEFAULT_MIN_DELAY, DEFAULT_MIN_ZOOM};
pub use error::{ConfigError, Error, FetchError, RangeError};
pub use fetch::{fetch, Downloader, PROGRESS_INTERVAL};
pub use provider::{Provider, ProviderConfig, ProviderRegistry};
pub use report::{
    FetchObserver, LogObserver, ProgressBarObserver, RunPlan, RunState, Session, Summary,
    TileOutcome, ESTIMATED_TILE_SIZE,
};
pub use sequence::TileSequence;
pub use store::{Stats, TileStore};
pub use tile::{max_index, project, unproject, Tile, MAX_ZOOM};
pub use url::UrlFormat;

/// Formats a byte count for humans, e.g. `1.5 MB`.
pub fn format_bytes(bytes: u64) -> String {
    report::format_bytes(bytes)
}
