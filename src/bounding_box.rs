use std::fmt;

use crate::error::RangeError;
use crate::sequence::TileSequence;
use crate::tile::{Tile, MAX_ZOOM};

/// A bounding box consisting of west, south, east and north coordinate
/// boundaries given in degrees.
///
/// # Example
/// ```rust
/// # use uk_tile_downloader::BoundingBox;
/// let aachen_germany = BoundingBox::new(6.031, 50.7492, 6.1649, 50.811);
/// assert_eq!(aachen_germany.tile_count(0), Ok(1));
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// The inclusive rectangle of tile indices covering a bounding box at one
/// zoom level.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TileBounds {
    pub zoom: u8,
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl TileBounds {
    pub fn width(&self) -> u64 {
        (self.x_max - self.x_min) as u64 + 1
    }

    pub fn height(&self) -> u64 {
        (self.y_max - self.y_min) as u64 + 1
    }

    pub fn count(&self) -> u64 {
        self.width() * self.height()
    }

    pub fn contains(&self, tile: &Tile) -> bool {
        tile.z == self.zoom
            && (self.x_min..=self.x_max).contains(&tile.x)
            && (self.y_min..=self.y_max).contains(&tile.y)
    }
}

impl fmt::Display for TileBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x={}-{}, y={}-{}",
            self.x_min, self.x_max, self.y_min, self.y_max
        )
    }
}

impl BoundingBox {
    /// The United Kingdom including Northern Ireland and the surrounding
    /// islands.
    pub const UNITED_KINGDOM: BoundingBox = BoundingBox {
        west: -8.5,
        south: 49.5,
        east: 2.0,
        north: 61.0,
    };

    /// Create a new bounding box from the specified coordinates in degrees.
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        BoundingBox {
            west,
            south,
            east,
            north,
        }
    }

    /// Computes the rectangle of tiles covering this bounding box at `zoom`.
    ///
    /// Every index is clamped into `[0, 2^zoom - 1]` and each axis is
    /// reordered if needed, so the result always spans at least one tile.
    /// Zoom levels above [`MAX_ZOOM`] are rejected.
    pub fn tile_bounds(&self, zoom: u8) -> Result<TileBounds, RangeError> {
        check_zoom(zoom)?;

        Ok(self.bounds_at(zoom))
    }

    /// Number of tiles covering this bounding box at `zoom`.
    pub fn tile_count(&self, zoom: u8) -> Result<u64, RangeError> {
        self.tile_bounds(zoom).map(|b| b.count())
    }

    /// [`BoundingBox::tile_bounds`] for a zoom level already checked
    /// against [`MAX_ZOOM`].
    pub(crate) fn bounds_at(&self, zoom: u8) -> TileBounds {
        // tile y grows southwards, so the northwest corner yields y_min
        let nw = Tile::from_coords_and_zoom(self.north, self.west, zoom);
        let se = Tile::from_coords_and_zoom(self.south, self.east, zoom);

        let (x_min, x_max) = ordered(nw.x, se.x);
        let (y_min, y_max) = ordered(nw.y, se.y);

        TileBounds {
            zoom,
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Number of tiles covering this bounding box over the inclusive zoom
    /// range `min_zoom..=max_zoom`.
    pub fn tile_count_for_range(&self, min_zoom: u8, max_zoom: u8) -> Result<u64, RangeError> {
        check_zoom_range(min_zoom, max_zoom)?;

        Ok((min_zoom..=max_zoom).map(|z| self.bounds_at(z).count()).sum())
    }

    /// Creates an iterator over all tiles in the bounding box between the
    /// given zoom levels, starting at the `start_offset`-th tile of the full
    /// sequence.
    pub fn tiles(
        &self,
        min_zoom: u8,
        max_zoom: u8,
        start_offset: u64,
    ) -> Result<TileSequence, RangeError> {
        check_zoom_range(min_zoom, max_zoom)?;

        Ok(TileSequence::new(*self, min_zoom, max_zoom, start_offset))
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}° to {}° longitude, {}° to {}° latitude",
            self.west, self.east, self.south, self.north
        )
    }
}

fn check_zoom(zoom: u8) -> Result<(), RangeError> {
    if zoom > MAX_ZOOM {
        return Err(RangeError::ZoomTooLarge {
            zoom,
            max: MAX_ZOOM,
        });
    }

    Ok(())
}

pub(crate) fn check_zoom_range(min_zoom: u8, max_zoom: u8) -> Result<(), RangeError> {
    check_zoom(max_zoom)?;
    if min_zoom > max_zoom {
        return Err(RangeError::ZoomOrder { min_zoom, max_zoom });
    }

    Ok(())
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
