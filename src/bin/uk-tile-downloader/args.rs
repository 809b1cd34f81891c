use clap::{command, value_parser, Arg, ArgAction, ArgMatches};
use std::{path::PathBuf, time::Duration};

use crate::validators::*;
use uk_tile_downloader::{
    Config, ConfigError, ProviderRegistry, DEFAULT_MAX_DELAY, DEFAULT_MAX_ZOOM, DEFAULT_MIN_DELAY,
    DEFAULT_MIN_ZOOM, DEFAULT_TIMEOUT,
};

const PROVIDER_ARG: &str = "provider";
const URL_ARG: &str = "url";
const SLUG_ARG: &str = "slug";
const API_KEY_ARG: &str = "api_key";
const ZOOM_ARG: &str = "zoom";
const MIN_ZOOM_ARG: &str = "min_zoom";
const MAX_ZOOM_ARG: &str = "max_zoom";
const START_TILE_ARG: &str = "start_tile";
const LIMIT_ARG: &str = "limit";
const MIN_DELAY_ARG: &str = "min_delay";
const MAX_DELAY_ARG: &str = "max_delay";
const TIMEOUT_ARG: &str = "timeout";
const TILES_DIR_ARG: &str = "tiles_dir";
const STATS_ARG: &str = "stats";
const DRY_RUN_ARG: &str = "dry_run";
const LIST_PROVIDERS_ARG: &str = "list_providers";
const PROGRESS_BAR_ARG: &str = "progress_bar";
const LOG_FILE_ARG: &str = "log_file";

pub struct Args {
    pub provider: String,
    pub url: Option<String>,
    pub slug: Option<String>,
    pub api_key: Option<String>,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub start_tile: u64,
    pub limit: Option<u64>,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub timeout: Duration,
    pub tiles_dir: PathBuf,
    pub stats: bool,
    pub dry_run: bool,
    pub list_providers: bool,
    pub progress_bar: bool,
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn parse() -> Self {
        Self::from_matches(&get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let (min_zoom, max_zoom) = match matches.get_one::<u8>(ZOOM_ARG) {
            // if `zoom` is set, use it for both min/max
            Some(&zoom) => (zoom, zoom),
            None => (
                value(matches, MIN_ZOOM_ARG, DEFAULT_MIN_ZOOM),
                value(matches, MAX_ZOOM_ARG, DEFAULT_MAX_ZOOM),
            ),
        };

        Self {
            provider: value(matches, PROVIDER_ARG, "osm".to_owned()),
            url: matches.get_one::<String>(URL_ARG).cloned(),
            slug: matches.get_one::<String>(SLUG_ARG).cloned(),
            api_key: matches.get_one::<String>(API_KEY_ARG).cloned(),
            min_zoom,
            max_zoom,
            start_tile: value(matches, START_TILE_ARG, 0),
            limit: matches.get_one::<u64>(LIMIT_ARG).copied(),
            min_delay: value(matches, MIN_DELAY_ARG, DEFAULT_MIN_DELAY),
            max_delay: value(matches, MAX_DELAY_ARG, DEFAULT_MAX_DELAY),
            timeout: value(matches, TIMEOUT_ARG, DEFAULT_TIMEOUT),
            tiles_dir: value(matches, TILES_DIR_ARG, PathBuf::from("tiles")),
            stats: matches.get_flag(STATS_ARG),
            dry_run: matches.get_flag(DRY_RUN_ARG),
            list_providers: matches.get_flag(LIST_PROVIDERS_ARG),
            progress_bar: matches.get_flag(PROGRESS_BAR_ARG),
            log_file: matches.get_one::<PathBuf>(LOG_FILE_ARG).cloned(),
        }
    }

    /// Resolves the provider and builds the download configuration.
    pub fn config(&self, registry: &ProviderRegistry) -> Result<Config, ConfigError> {
        let provider = registry.resolve(
            &self.provider,
            self.url.as_deref(),
            self.slug.as_deref(),
            self.api_key.as_deref(),
        )?;

        Ok(Config {
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            start_offset: self.start_tile,
            limit: self.limit,
            min_delay: self.min_delay,
            max_delay: self.max_delay,
            timeout: self.timeout,
            ..Config::new(provider, self.tiles_dir.clone())
        })
    }
}

fn value<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str, default: T) -> T {
    matches.get_one::<T>(id).cloned().unwrap_or(default)
}

fn get_matches() -> ArgMatches {
    cli().get_matches()
}

fn cli() -> clap::Command {
    command!()
        .after_help(
            "Examples:\n  \
             # Download zoom levels 0-5\n  \
             uk-tile-downloader --min-zoom 0 --max-zoom 5\n\n  \
             # Resume at tile 1000 and download 500 more tiles\n  \
             uk-tile-downloader --max-zoom 10 --start-tile 1000 --limit 500\n\n  \
             # Show statistics only\n  \
             uk-tile-downloader --stats",
        )
        .arg(
            Arg::new(PROVIDER_ARG)
                .help("The tile provider to download from (see --list-providers)")
                .default_value("osm")
                .short('p')
                .long("provider"),
        )
        .arg(
            Arg::new(URL_ARG)
                .help("Custom URL with format specifiers `{z}`, `{x}`, `{y}` to fetch the tiles from, overriding the provider's. May contain `{key}` (replaced with the API key) and `{s}` (rotated through `a`, `b` and `c`).")
                .short('u')
                .long("url"),
        )
        .arg(
            Arg::new(SLUG_ARG)
                .help("Directory name below the tiles directory to store this provider's tiles in")
                .long("slug"),
        )
        .arg(
            Arg::new(API_KEY_ARG)
                .help("API key for providers whose URL contains `{key}`")
                .env("TILE_API_KEY")
                .hide_env_values(true)
                .short('k')
                .long("api-key"),
        )
        .arg(
            Arg::new(MIN_ZOOM_ARG)
                .help("The minimum zoom level to fetch")
                .value_parser(is_zoom)
                .default_value("0")
                .long("min-zoom"),
        )
        .arg(
            Arg::new(MAX_ZOOM_ARG)
                .help("The maximum zoom level to fetch")
                .value_parser(is_zoom)
                .default_value("10")
                .long("max-zoom"),
        )
        .arg(
            Arg::new(ZOOM_ARG)
                .help("Only fetch a single zoom level (implies min=x/max=x)")
                .value_parser(is_zoom)
                .conflicts_with_all([MIN_ZOOM_ARG, MAX_ZOOM_ARG])
                .short('z')
                .long("zoom"),
        )
        .arg(
            Arg::new(START_TILE_ARG)
                .help("Position in the tile sequence to start at, for resuming")
                .value_parser(value_parser!(u64))
                .default_value("0")
                .short('s')
                .long("start-tile"),
        )
        .arg(
            Arg::new(LIMIT_ARG)
                .help("Maximum number of tiles to download (default: unlimited)")
                .value_parser(is_positive)
                .short('l')
                .long("limit"),
        )
        .arg(
            Arg::new(MIN_DELAY_ARG)
                .help("Minimum pause after each download, in seconds")
                .value_parser(is_seconds)
                .default_value("0.5")
                .long("min-delay"),
        )
        .arg(
            Arg::new(MAX_DELAY_ARG)
                .help("Maximum pause after each download, in seconds")
                .value_parser(is_seconds)
                .default_value("2.0")
                .long("max-delay"),
        )
        .arg(
            Arg::new(TIMEOUT_ARG)
                .help("The timeout (in seconds) for fetching a single tile. Pass 0 for no timeout.")
                .value_parser(is_seconds)
                .default_value("30")
                .short('t')
                .long("timeout"),
        )
        .arg(
            Arg::new(TILES_DIR_ARG)
                .help("The folder to store the tiles in")
                .value_parser(value_parser!(PathBuf))
                .default_value("tiles")
                .short('o')
                .long("tiles-dir"),
        )
        .arg(
            Arg::new(STATS_ARG)
                .help("Show how many tiles are on disk and exit")
                .action(ArgAction::SetTrue)
                .long("stats"),
        )
        .arg(
            Arg::new(DRY_RUN_ARG)
                .help("Don't actually fetch anything, just determine how many tiles would be fetched.")
                .action(ArgAction::SetTrue)
                .long("dry-run"),
        )
        .arg(
            Arg::new(LIST_PROVIDERS_ARG)
                .help("List the built-in tile providers and exit")
                .action(ArgAction::SetTrue)
                .long("list-providers"),
        )
        .arg(
            Arg::new(PROGRESS_BAR_ARG)
                .help("Show a progress bar instead of periodic progress messages")
                .action(ArgAction::SetTrue)
                .long("progress-bar"),
        )
        .arg(
            Arg::new(LOG_FILE_ARG)
                .help("Also write the log to this file")
                .value_parser(value_parser!(PathBuf))
                .long("log-file"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let matches = cli()
            .try_get_matches_from(std::iter::once("uk-tile-downloader").chain(args.iter().copied()))
            .unwrap();
        Args::from_matches(&matches)
    }

    #[test]
    fn cli_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = parse(&[]);

        assert_eq!(args.provider, "osm");
        assert_eq!((args.min_zoom, args.max_zoom), (0, 10));
        assert_eq!(args.start_tile, 0);
        assert_eq!(args.limit, None);
        assert_eq!(args.min_delay, Duration::from_millis(500));
        assert_eq!(args.max_delay, Duration::from_secs(2));
        assert_eq!(args.timeout, Duration::from_secs(30));
        assert_eq!(args.tiles_dir, PathBuf::from("tiles"));
        assert!(!args.stats && !args.dry_run);
    }

    #[test]
    fn single_zoom_sets_both_bounds() {
        let args = parse(&["--zoom", "7"]);
        assert_eq!((args.min_zoom, args.max_zoom), (7, 7));
    }

    #[test]
    fn rejects_zero_limit() {
        assert!(cli()
            .try_get_matches_from(["uk-tile-downloader", "--limit", "0"])
            .is_err());
    }

    #[test]
    fn huge_delay_is_a_usage_error() {
        for flag in ["--min-delay", "--max-delay", "--timeout"] {
            let err = cli()
                .try_get_matches_from(["uk-tile-downloader", flag, "1e300"])
                .unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation, "{}", flag);
        }
    }

    #[test]
    fn builds_config() {
        let args = parse(&[
            "--provider",
            "custom",
            "--url",
            "https://tiles.example.com/{z}/{x}/{y}.png",
            "--start-tile",
            "1000",
            "--limit",
            "500",
            "--tiles-dir",
            "/tmp/tiles",
        ]);
        let cfg = args.config(&ProviderRegistry::builtin()).unwrap();

        assert_eq!(cfg.provider.storage_slug, "tiles_example_com");
        assert_eq!(cfg.start_offset, 1000);
        assert_eq!(cfg.limit, Some(500));
        assert_eq!(cfg.output_folder, PathBuf::from("/tmp/tiles"));
    }
}
