use crate::bounding_box::{BoundingBox, TileBounds};
use crate::tile::Tile;

/// Iterator over all tiles of a bounding box across a range of zoom levels.
///
/// Tiles are yielded zoom level by zoom level (ascending); within a level
/// column by column (`x` ascending) and within a column row by row (`y`
/// ascending). Every tile has a fixed position in this order, counted from
/// zero across all zoom levels, so a sequence created with `start_offset = n`
/// yields exactly the tail of the full sequence starting at its `n`-th tile.
#[derive(Clone, Debug)]
pub struct TileSequence {
    bbox: BoundingBox,
    max_zoom: u8,
    bounds: Option<TileBounds>,
    x: u32,
    y: u32,
    index: u64,
}

impl TileSequence {
    pub(crate) fn new(bbox: BoundingBox, min_zoom: u8, max_zoom: u8, start_offset: u64) -> Self {
        let mut remaining = start_offset;

        for zoom in min_zoom..=max_zoom {
            let bounds = bbox.bounds_at(zoom);
            let count = bounds.count();

            if remaining < count {
                let column = remaining / bounds.height();
                let row = remaining % bounds.height();

                return TileSequence {
                    bbox,
                    max_zoom,
                    bounds: Some(bounds),
                    x: bounds.x_min + column as u32,
                    y: bounds.y_min + row as u32,
                    index: start_offset,
                };
            }

            remaining -= count;
        }

        TileSequence {
            bbox,
            max_zoom,
            bounds: None,
            x: 0,
            y: 0,
            index: start_offset - remaining,
        }
    }

    /// Position of the next tile to be yielded within the full sequence.
    pub fn index(&self) -> u64 {
        self.index
    }

    fn remaining(&self) -> u64 {
        let bounds = match self.bounds {
            Some(b) => b,
            None => return 0,
        };

        let in_level = bounds.count()
            - (self.x - bounds.x_min) as u64 * bounds.height()
            - (self.y - bounds.y_min) as u64;
        let later_levels: u64 = (bounds.zoom + 1..=self.max_zoom)
            .map(|z| self.bbox.bounds_at(z).count())
            .sum();

        in_level + later_levels
    }

    fn advance(&mut self, bounds: TileBounds) {
        if self.y < bounds.y_max {
            self.y += 1;
        } else if self.x < bounds.x_max {
            self.x += 1;
            self.y = bounds.y_min;
        } else if bounds.zoom < self.max_zoom {
            let next = self.bbox.bounds_at(bounds.zoom + 1);
            self.bounds = Some(next);
            self.x = next.x_min;
            self.y = next.y_min;
        } else {
            self.bounds = None;
        }
    }
}

impl Iterator for TileSequence {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        let bounds = self.bounds?;
        let tile = Tile::new(self.x, self.y, bounds.zoom);

        self.advance(bounds);
        self.index += 1;

        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const UK: BoundingBox = BoundingBox::UNITED_KINGDOM;

    #[test]
    fn zoom_zero_yields_one_tile() {
        let tiles: Vec<_> = UK.tiles(0, 0, 0).unwrap().collect();
        assert_eq!(tiles, vec![Tile::new(0, 0, 0)]);
    }

    #[test]
    fn column_major_within_level() {
        let tiles: Vec<_> = UK.tiles(6, 6, 0).unwrap().collect();
        let expected: Vec<_> = (30..=32)
            .flat_map(|x| (18..=21).map(move |y| Tile::new(x, y, 6)))
            .collect();

        assert_eq!(tiles, expected);
    }

    #[test]
    fn zoom_levels_ascend() {
        let zooms: Vec<_> = UK.tiles(0, 7, 0).unwrap().map(|t| t.z).collect();
        let mut sorted = zooms.clone();
        sorted.sort_unstable();

        assert_eq!(zooms, sorted);
        assert_eq!(zooms.first(), Some(&0));
        assert_eq!(zooms.last(), Some(&7));
    }

    #[test]
    fn per_level_count_matches_distinct_tiles() {
        for zoom in 0..=10 {
            let distinct: HashSet<_> = UK.tiles(zoom, zoom, 0).unwrap().collect();
            assert_eq!(Ok(distinct.len() as u64), UK.tile_count(zoom), "z{}", zoom);
        }
    }

    #[test]
    fn offset_yields_suffix_of_full_sequence() {
        let full: Vec<_> = UK.tiles(0, 8, 0).unwrap().collect();

        for offset in [0, 1, 2, 5, 6, 17, 18, 50, 100, full.len() - 1] {
            let tail: Vec<_> = UK.tiles(0, 8, offset as u64).unwrap().collect();
            assert_eq!(tail, full[offset..], "offset {}", offset);
        }
    }

    #[test]
    fn offset_past_end_is_empty() {
        let total = UK.tile_count_for_range(0, 4).unwrap();

        assert_eq!(UK.tiles(0, 4, total).unwrap().count(), 0);
        assert_eq!(UK.tiles(0, 4, total + 100).unwrap().count(), 0);
    }

    #[test]
    fn tracks_index_and_size() {
        let total = UK.tile_count_for_range(3, 9).unwrap();
        let mut seq = UK.tiles(3, 9, 10).unwrap();

        assert_eq!(seq.index(), 10);
        assert_eq!(seq.size_hint(), ((total - 10) as usize, Some((total - 10) as usize)));

        seq.next();
        assert_eq!(seq.index(), 11);
        assert_eq!(seq.count() as u64, total - 11);
    }
}
