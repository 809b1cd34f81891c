use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

use crate::error::{Error, FetchError};
use crate::tile::{Tile, MAX_ZOOM};

/// Number of valid tiles on disk, per storage slug and zoom level.
pub type Stats = BTreeMap<String, BTreeMap<u8, u64>>;

/// Tiles on the file system, laid out as `<root>/<slug>/<z>/<x>/<y>.<ext>`.
///
/// A tile counts as present only if its file is non-empty, so truncated
/// writes from an earlier run get fetched again.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TileStore {
    root: PathBuf,
    extension: String,
}

impl TileStore {
    /// Creates a store of `.png` tiles below `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self::with_extension(root, "png")
    }

    pub fn with_extension<P: Into<PathBuf>>(root: P, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.to_owned(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory if it doesn't exist yet.
    ///
    /// Fails if the root exists but is not a directory.
    pub async fn init(&self) -> Result<(), Error> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => return Ok(()),
            Ok(_) => return Err(Error::NotADirectory(self.root.clone())),
            Err(_) => {}
        }

        tracing::debug!(root = %self.root.display(), "creating tile directory");
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| Error::CreateRoot {
                path: self.root.clone(),
                source,
            })
    }

    pub fn path_for(&self, slug: &str, tile: &Tile) -> PathBuf {
        let mut target = self.root.join(slug);
        target.push(tile.z.to_string());
        target.push(tile.x.to_string());
        target.push(format!("{}.{}", tile.y, self.extension));

        target
    }

    /// Whether the tile is on disk with a non-zero size.
    pub async fn exists(&self, slug: &str, tile: &Tile) -> bool {
        fs::metadata(self.path_for(slug, tile))
            .await
            .map(|meta| meta.is_file() && meta.len() > 0)
            .unwrap_or(false)
    }

    /// Writes the tile, creating its parent directories as needed.
    pub async fn save(&self, slug: &str, tile: &Tile, bytes: &[u8]) -> Result<(), FetchError> {
        let path = self.path_for(slug, tile);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::Io {
                    path: parent.to_owned(),
                    source,
                })?;
        }

        if let Err(source) = fs::write(&path, bytes).await {
            return Err(FetchError::Io { path, source });
        }

        Ok(())
    }

    /// Deletes whatever was written for the tile, if anything.
    pub async fn remove_if_present(&self, slug: &str, tile: &Tile) -> io::Result<()> {
        match fs::remove_file(self.path_for(slug, tile)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Counts the valid tiles on disk for every provider slug and zoom level.
    pub async fn stats(&self) -> Result<Stats, Error> {
        let mut stats = Stats::new();

        if fs::metadata(&self.root).await.is_err() {
            return Ok(stats);
        }

        for (slug, slug_dir) in subdirs(&self.root).await? {
            let mut levels = BTreeMap::new();

            for (zoom, zoom_dir) in subdirs(&slug_dir).await? {
                let zoom = match zoom.parse::<u8>() {
                    Ok(z) if z <= MAX_ZOOM => z,
                    _ => continue,
                };

                let mut count = 0;
                for (x, x_dir) in subdirs(&zoom_dir).await? {
                    if x.parse::<u32>().is_ok() {
                        count += self.count_tiles(&x_dir).await?;
                    }
                }

                levels.insert(zoom, count);
            }

            if !levels.is_empty() {
                stats.insert(slug, levels);
            }
        }

        Ok(stats)
    }

    async fn count_tiles(&self, dir: &Path) -> Result<u64, Error> {
        let scan_err = |source: io::Error| Error::Scan {
            path: dir.to_owned(),
            source,
        };

        let mut count = 0;
        let mut entries = fs::read_dir(dir).await.map_err(scan_err)?;

        while let Some(entry) = entries.next_entry().await.map_err(scan_err)? {
            let path = entry.path();
            let is_tile = path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
                && path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map_or(false, |s| s.parse::<u32>().is_ok());

            if !is_tile {
                continue;
            }

            let meta = entry.metadata().await.map_err(scan_err)?;
            if meta.is_file() && meta.len() > 0 {
                count += 1;
            }
        }

        Ok(count)
    }
}

/// Lists the subdirectories of `dir` with their names.
async fn subdirs(dir: &Path) -> Result<Vec<(String, PathBuf)>, Error> {
    let scan_err = |source: io::Error| Error::Scan {
        path: dir.to_owned(),
        source,
    };

    let mut dirs = Vec::new();
    let mut entries = fs::read_dir(dir).await.map_err(scan_err)?;

    while let Some(entry) = entries.next_entry().await.map_err(scan_err)? {
        if !entry.file_type().await.map_err(scan_err)?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            dirs.push((name.to_owned(), entry.path()));
        }
    }

    Ok(dirs)
}
