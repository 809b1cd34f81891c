use std::{path::PathBuf, time::Duration};

use crate::bounding_box::{check_zoom_range, BoundingBox};
use crate::client::DEFAULT_TIMEOUT;
use crate::error::RangeError;
use crate::provider::ProviderConfig;
use crate::sequence::TileSequence;

pub const DEFAULT_MIN_ZOOM: u8 = 0;
pub const DEFAULT_MAX_ZOOM: u8 = 10;
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(2000);

/// Tile fetching configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The region to download tiles for.
    pub bounding_box: BoundingBox,

    /// The resolved provider to download from.
    pub provider: ProviderConfig,

    /// The folder holding the tile store.
    pub output_folder: PathBuf,

    /// The minimum zoom level to download.
    pub min_zoom: u8,

    /// The maximum zoom level to download.
    pub max_zoom: u8,

    /// Position in the tile sequence to resume from.
    pub start_offset: u64,

    /// Stop after downloading this many tiles.
    pub limit: Option<u64>,

    /// Lower bound of the random pause after each download.
    pub min_delay: Duration,

    /// Upper bound of the random pause after each download.
    pub max_delay: Duration,

    /// Timeout for fetching a single tile.
    ///
    /// Pass the zero duration to disable the timeout.
    pub timeout: Duration,
}

impl Config {
    /// A configuration downloading the United Kingdom with default settings.
    pub fn new<P: Into<PathBuf>>(provider: ProviderConfig, output_folder: P) -> Self {
        Self {
            bounding_box: BoundingBox::UNITED_KINGDOM,
            provider,
            output_folder: output_folder.into(),
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            start_offset: 0,
            limit: None,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn validate(&self) -> Result<(), RangeError> {
        check_zoom_range(self.min_zoom, self.max_zoom)?;

        if self.min_delay > self.max_delay {
            return Err(RangeError::DelayOrder {
                min: self.min_delay,
                max: self.max_delay,
            });
        }
        if self.limit == Some(0) {
            return Err(RangeError::ZeroLimit);
        }

        Ok(())
    }

    /// Total number of tiles in the configured zoom range, ignoring the start
    /// offset.
    pub fn total_tiles(&self) -> Result<u64, RangeError> {
        self.bounding_box
            .tile_count_for_range(self.min_zoom, self.max_zoom)
    }

    /// Creates an iterator over the tiles to process, starting at the
    /// configured offset.
    pub fn tiles(&self) -> Result<TileSequence, RangeError> {
        self.bounding_box
            .tiles(self.min_zoom, self.max_zoom, self.start_offset)
    }
}
