use std::{f64::consts::PI, fmt};

/// The highest zoom level supported. Keeps `2^zoom` tile indices within `u32`
/// and whole-range tile counts well within `u64`.
pub const MAX_ZOOM: u8 = 30;

/// An OSM slippy-map tile with x, y and z-coordinate.
/// ref: https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Tile {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl Tile {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { z, x, y }
    }

    /// Returns the tile containing the given coordinate (in degrees), clamped
    /// into the valid tile range of `zoom`.
    pub fn from_coords_and_zoom(lat: f64, lon: f64, zoom: u8) -> Self {
        let max = max_index(zoom);
        let (x, y) = project(lat, lon, zoom);

        Self::new(clamp(x, max), clamp(y, max), zoom)
    }

    /// The geographic coordinate (latitude, longitude in degrees) of this
    /// tile's northwest corner.
    pub fn northwest(&self) -> (f64, f64) {
        unproject(self.x, self.y, self.z)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Number of tiles along one axis at the given zoom level.
pub(crate) fn scale(zoom: u8) -> f64 {
    2_f64.powi(zoom as i32)
}

/// The largest valid tile index along one axis at the given zoom level,
/// saturating at `u32::MAX` for zoom levels beyond 32.
pub fn max_index(zoom: u8) -> u32 {
    1_u32
        .checked_shl(zoom as u32)
        .map_or(u32::MAX, |n| n - 1)
}

fn clamp(v: i64, max: u32) -> u32 {
    v.clamp(0, max as i64) as u32
}

/// Projects a geographic coordinate (in degrees) onto the Web Mercator tile
/// grid of the given zoom level.
///
/// The result is not clamped: coordinates outside the projectable area map
/// to indices below zero or above `2^zoom - 1`.
///
/// # Example
/// ```rust
/// # use uk_tile_downloader::project;
/// assert_eq!(project(51.5, -0.12, 0), (0, 0));
/// ```
pub fn project(lat: f64, lon: f64, zoom: u8) -> (i64, i64) {
    let n = scale(zoom);
    let lat_rad = lat.to_radians();

    let x = (lon + 180_f64) / 360_f64 * n;
    let y = (1_f64 - lat_rad.tan().asinh() / PI) / 2_f64 * n;

    (x.floor() as i64, y.floor() as i64)
}

/// Inverse of [`project`]: returns the latitude and longitude (in degrees) of
/// the northwest corner of tile `x`/`y` at the given zoom level.
pub fn unproject(x: u32, y: u32, zoom: u8) -> (f64, f64) {
    let n = scale(zoom);

    let lon = x as f64 / n * 360_f64 - 180_f64;
    let lat = (PI * (1_f64 - 2_f64 * y as f64 / n)).sinh().atan().to_degrees();

    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_zero_is_a_single_tile() {
        assert_eq!(project(51.5, -0.12, 0), (0, 0));
        assert_eq!(project(-33.9, 151.2, 0), (0, 0));
    }

    #[test]
    fn tile_index() {
        let tile = Tile::from_coords_and_zoom(50.7929, 6.0402, 18);
        assert_eq!((tile.x, tile.y), (135470, 87999));
    }

    #[test]
    fn project_does_not_clamp() {
        let (x, _) = project(0.0, 190.0, 1);
        assert_eq!(x, 2);

        let (_, y) = project(89.0, 0.0, 4);
        assert!(y < 0);
    }

    #[test]
    fn from_coords_clamps_into_range() {
        let tile = Tile::from_coords_and_zoom(89.9, 180.0, 3);
        assert_eq!((tile.x, tile.y), (7, 0));

        let tile = Tile::from_coords_and_zoom(-89.9, -181.0, 3);
        assert_eq!((tile.x, tile.y), (0, 7));
    }

    #[test]
    fn unproject_returns_northwest_corner() {
        let (lat, lon) = unproject(0, 0, 0);
        assert!((lon + 180.0).abs() < 1e-9);
        assert!((lat - 85.0511287798).abs() < 1e-6);

        let (lat, lon) = unproject(1, 1, 1);
        assert!(lon.abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }

    #[test]
    fn round_trip_lands_in_same_tile() {
        let points = [(51.5, -0.12), (55.95, -3.19), (49.9, -6.3), (60.8, -0.9)];

        for zoom in 0..=16 {
            for &(lat, lon) in &points {
                let tile = Tile::from_coords_and_zoom(lat, lon, zoom);
                let (north, west) = tile.northwest();
                let (south, east) = unproject(tile.x + 1, tile.y + 1, zoom);

                assert!(west <= lon && lon < east, "lon {} at z{}", lon, zoom);
                assert!(south < lat && lat <= north, "lat {} at z{}", lat, zoom);
            }
        }
    }

    #[test]
    fn max_index_saturates() {
        assert_eq!(max_index(0), 0);
        assert_eq!(max_index(MAX_ZOOM), (1 << 30) - 1);
        assert_eq!(max_index(31), (1 << 31) - 1);
        assert_eq!(max_index(32), u32::MAX);
        assert_eq!(max_index(u8::MAX), u32::MAX);
    }

    #[test]
    fn displays_as_path() {
        assert_eq!(Tile::new(3, 5, 4).to_string(), "4/3/5");
    }
}
