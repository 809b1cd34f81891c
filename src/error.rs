use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors resolving the tile provider. Raised before any network activity.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown provider `{0}` and no custom URL template given")]
    UnknownProvider(String),

    #[error("provider `{0}` requires an API key")]
    MissingApiKey(String),

    #[error("URL template `{template}` lacks the `{{{placeholder}}}` placeholder")]
    MissingPlaceholder {
        template: String,
        placeholder: &'static str,
    },
}

/// Invalid numeric run parameters.
#[derive(Debug, Error, PartialEq)]
pub enum RangeError {
    #[error("min zoom {min_zoom} must be <= max zoom {max_zoom}")]
    ZoomOrder { min_zoom: u8, max_zoom: u8 },

    #[error("zoom level {zoom} exceeds the supported maximum of {max}")]
    ZoomTooLarge { zoom: u8, max: u8 },

    #[error("min delay {min:?} must be <= max delay {max:?}")]
    DelayOrder {
        min: std::time::Duration,
        max: std::time::Duration,
    },

    #[error("download limit must be positive")]
    ZeroLimit,
}

/// Failure fetching or persisting a single tile. Never fatal to a run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server responded with HTTP {0}")]
    Status(u16),

    #[error("server responded with an empty body")]
    EmptyBody,

    #[error("failed writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors that abort a download run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("output path {} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to create root output directory {}", path.display())]
    CreateRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading tile directory {}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed creating HTTP client")]
    Client(#[source] reqwest::Error),
}
