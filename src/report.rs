//! Events emitted during a download run and the observers consuming them.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

use crate::bounding_box::{BoundingBox, TileBounds};
use crate::error::FetchError;
use crate::tile::Tile;

/// Rough average size of a raster tile, used for volume estimates.
pub const ESTIMATED_TILE_SIZE: u64 = 15 * 1024;

/// Parameters of a run, reported once before the first tile.
#[derive(Clone, Debug)]
pub struct RunPlan<'a> {
    pub bounding_box: BoundingBox,
    pub provider: &'a str,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub total_tiles: u64,
    pub start_offset: u64,
    pub limit: Option<u64>,
}

/// What happened to a single tile.
#[derive(Debug)]
pub enum TileOutcome {
    /// Already on disk, not fetched.
    Skipped,

    /// Fetched and written to disk.
    Downloaded { bytes: u64 },

    /// Fetching or writing failed; nothing was left on disk.
    Failed(FetchError),
}

/// Counters of a single download run.
#[derive(Clone, Debug)]
pub struct Session {
    pub downloaded: u64,
    pub skipped: u64,
    pub errors: u64,

    /// Bytes actually written to disk.
    pub bytes: u64,

    pub started: Instant,
}

impl Session {
    pub fn new() -> Self {
        Self {
            downloaded: 0,
            skipped: 0,
            errors: 0,
            bytes: 0,
            started: Instant::now(),
        }
    }

    pub(crate) fn record(&mut self, outcome: &TileOutcome) {
        match outcome {
            TileOutcome::Skipped => self.skipped += 1,
            TileOutcome::Downloaded { bytes } => {
                self.downloaded += 1;
                self.bytes += bytes;
            }
            TileOutcome::Failed(_) => self.errors += 1,
        }
    }

    /// Tiles handled so far, whatever their outcome.
    pub fn processed(&self) -> u64 {
        self.downloaded + self.skipped + self.errors
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Downloads per second since the session started.
    pub fn rate(&self) -> f64 {
        rate(self.downloaded, self.elapsed())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunState {
    /// Every tile of the sequence was processed.
    Completed,

    /// The configured number of downloads was reached.
    LimitReached,

    /// Cancelled from outside, e.g. by Ctrl-C.
    Interrupted,
}

/// Final statistics of a run.
#[derive(Clone, Debug)]
pub struct Summary {
    pub state: RunState,
    pub downloaded: u64,
    pub skipped: u64,
    pub errors: u64,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl Summary {
    pub(crate) fn new(session: &Session, state: RunState) -> Self {
        Self {
            state,
            downloaded: session.downloaded,
            skipped: session.skipped,
            errors: session.errors,
            bytes: session.bytes,
            elapsed: session.elapsed(),
        }
    }

    pub fn processed(&self) -> u64 {
        self.downloaded + self.skipped + self.errors
    }

    pub fn average_rate(&self) -> f64 {
        rate(self.downloaded, self.elapsed)
    }

    /// Downloaded volume assuming every tile is [`ESTIMATED_TILE_SIZE`] bytes.
    pub fn estimated_bytes(&self) -> u64 {
        self.downloaded * ESTIMATED_TILE_SIZE
    }
}

fn rate(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0_f64 {
        count as f64 / secs
    } else {
        0_f64
    }
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    pretty_bytes::converter::convert(bytes as f64)
}

/// Receives the events of a download run.
///
/// All methods default to doing nothing.
pub trait FetchObserver {
    fn on_start(&mut self, _plan: &RunPlan<'_>) {}

    /// Called whenever the run enters a new zoom level.
    fn on_level(&mut self, _bounds: &TileBounds) {}

    fn on_tile(&mut self, _tile: &Tile, _outcome: &TileOutcome) {}

    /// Called every 50 processed tiles and after every download. `last` is
    /// the tile just downloaded, if any.
    fn on_progress(&mut self, _session: &Session, _last: Option<&Tile>) {}

    fn on_finish(&mut self, _summary: &Summary) {}
}

/// Ignores all events.
impl FetchObserver for () {}

/// Reports run events through `tracing`.
#[derive(Clone, Debug, Default)]
pub struct LogObserver;

impl FetchObserver for LogObserver {
    fn on_start(&mut self, plan: &RunPlan<'_>) {
        log_plan(plan);
    }

    fn on_level(&mut self, bounds: &TileBounds) {
        tracing::info!("Zoom {}: tiles {} ({} tiles)", bounds.zoom, bounds, bounds.count());
    }

    fn on_tile(&mut self, tile: &Tile, outcome: &TileOutcome) {
        match outcome {
            TileOutcome::Skipped => tracing::trace!("Skipped existing tile {}", tile),
            TileOutcome::Downloaded { bytes } => {
                tracing::debug!("Downloaded tile {} ({} bytes)", tile, bytes)
            }
            TileOutcome::Failed(e) => tracing::error!("Failed to download tile {}: {}", tile, e),
        }
    }

    fn on_progress(&mut self, session: &Session, last: Option<&Tile>) {
        let mut msg = format!(
            "Progress: {} processed (↓{} ⏭{} ✗{}) [{:.1} downloads/sec]",
            session.processed(),
            session.downloaded,
            session.skipped,
            session.errors,
            session.rate(),
        );
        if let Some(tile) = last {
            msg.push_str(&format!(" → z{}.png", tile));
        }

        tracing::info!("{}", msg);
    }

    fn on_finish(&mut self, summary: &Summary) {
        log_summary(summary);
    }
}

/// Shows an `indicatif` progress bar over the tiles of the run.
///
/// Log messages of the run are emitted while the bar is suspended.
#[derive(Debug)]
pub struct ProgressBarObserver {
    pb: ProgressBar,
    target: Option<ProgressDrawTarget>,
}

impl ProgressBarObserver {
    /// Draws the bar to stderr once the run starts.
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    pub fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::hidden();
        pb.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:60.cyan/blue} {pos:>7}/{len:7} ETA: {eta} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
        );

        Self {
            pb,
            target: Some(target),
        }
    }

    pub fn position(&self) -> u64 {
        self.pb.position()
    }

    pub fn length(&self) -> Option<u64> {
        self.pb.length()
    }

    pub fn is_finished(&self) -> bool {
        self.pb.is_finished()
    }
}

impl Default for ProgressBarObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchObserver for ProgressBarObserver {
    fn on_start(&mut self, plan: &RunPlan<'_>) {
        log_plan(plan);

        self.pb
            .set_length(plan.total_tiles.saturating_sub(plan.start_offset));
        if let Some(target) = self.target.take() {
            self.pb.set_draw_target(target);
        }
    }

    fn on_level(&mut self, bounds: &TileBounds) {
        self.pb.suspend(|| {
            tracing::debug!("Zoom {}: tiles {} ({} tiles)", bounds.zoom, bounds, bounds.count())
        });
    }

    fn on_tile(&mut self, tile: &Tile, outcome: &TileOutcome) {
        self.pb.inc(1);

        if let TileOutcome::Failed(e) = outcome {
            self.pb
                .suspend(|| tracing::error!("Failed to download tile {}: {}", tile, e));
        }
    }

    fn on_progress(&mut self, session: &Session, _last: Option<&Tile>) {
        self.pb.set_message(format!(
            "↓{} ⏭{} ✗{}",
            session.downloaded, session.skipped, session.errors
        ));
    }

    fn on_finish(&mut self, summary: &Summary) {
        self.pb.finish_and_clear();
        log_summary(summary);
    }
}

fn log_plan(plan: &RunPlan<'_>) {
    tracing::info!(
        "Starting download from {}: zoom {}-{}",
        plan.provider,
        plan.min_zoom,
        plan.max_zoom
    );
    tracing::info!("Bounding box: {}", plan.bounding_box);
    tracing::info!("Total tiles in range: {}", plan.total_tiles);
    if plan.start_offset > 0 {
        tracing::info!("Starting from tile #{}", plan.start_offset);
    }
    if let Some(limit) = plan.limit {
        tracing::info!("Download limit: {} tiles", limit);
    }
}

fn log_summary(summary: &Summary) {
    match summary.state {
        RunState::Completed => tracing::info!("Download session complete:"),
        RunState::LimitReached => tracing::info!("Download limit reached:"),
        RunState::Interrupted => tracing::info!("Download interrupted by user:"),
    }

    tracing::info!("  Downloaded: {} tiles", summary.downloaded);
    tracing::info!("  Skipped (existing): {} tiles", summary.skipped);
    tracing::info!("  Errors: {} tiles", summary.errors);
    tracing::info!("  Total processed: {} tiles", summary.processed());
    tracing::info!("  Session time: {:.1} seconds", summary.elapsed.as_secs_f64());
    tracing::info!(
        "  Average download rate: {:.2} tiles/second",
        summary.average_rate()
    );

    if summary.downloaded > 0 {
        tracing::info!(
            "  Data downloaded: {} (estimated {})",
            format_bytes(summary.bytes),
            format_bytes(summary.estimated_bytes())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_counts_outcomes() {
        let mut session = Session::new();

        session.record(&TileOutcome::Downloaded { bytes: 100 });
        session.record(&TileOutcome::Downloaded { bytes: 20 });
        session.record(&TileOutcome::Skipped);
        session.record(&TileOutcome::Failed(FetchError::Status(404)));

        assert_eq!(
            (session.downloaded, session.skipped, session.errors),
            (2, 1, 1)
        );
        assert_eq!(session.bytes, 120);
        assert_eq!(session.processed(), 4);
    }

    #[test]
    fn summary_estimates_volume() {
        let mut session = Session::new();
        for _ in 0..4 {
            session.record(&TileOutcome::Downloaded { bytes: 1 });
        }

        let summary = Summary::new(&session, RunState::Completed);
        assert_eq!(summary.estimated_bytes(), 4 * 15 * 1024);
        assert_eq!(summary.processed(), 4);
    }

    #[test]
    fn progress_bar_counts_remaining_tiles() {
        let mut bar = ProgressBarObserver::with_draw_target(ProgressDrawTarget::hidden());
        let mut session = Session::new();

        bar.on_start(&RunPlan {
            bounding_box: BoundingBox::UNITED_KINGDOM,
            provider: "Test",
            min_zoom: 0,
            max_zoom: 2,
            total_tiles: 5,
            start_offset: 2,
            limit: None,
        });
        assert_eq!(bar.length(), Some(3));

        let outcomes = [
            TileOutcome::Skipped,
            TileOutcome::Failed(FetchError::Status(500)),
            TileOutcome::Downloaded { bytes: 10 },
        ];
        for (y, outcome) in outcomes.iter().enumerate() {
            let tile = Tile::new(1, y as u32, 2);
            session.record(outcome);
            bar.on_tile(&tile, outcome);
            bar.on_progress(&session, Some(&tile));
        }
        assert_eq!(bar.position(), 3);
        assert!(!bar.is_finished());

        bar.on_finish(&Summary::new(&session, RunState::Completed));
        assert!(bar.is_finished());
    }

    #[test]
    fn rate_of_zero_elapsed_is_zero() {
        assert_eq!(rate(10, Duration::ZERO), 0_f64);
        assert_eq!(rate(10, Duration::from_secs(5)), 2_f64);
    }
}
