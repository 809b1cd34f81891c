use maplit::hashmap;
use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};
use strfmt::strfmt;

use crate::error::ConfigError;
use crate::tile::Tile;

const OSM_SERVERS: &[&str] = &["a", "b", "c"];

/// A tile URL template with the replacement specifiers `{z}`, `{x}`, `{y}`
/// and optionally `{s}`, which rotates through the `a`, `b` and `c`
/// subdomains.
pub struct UrlFormat {
    inc: AtomicUsize,
    format_str: String,
}

impl UrlFormat {
    /// Wraps `format_str`, checking it carries all of `{z}`, `{x}` and `{y}`.
    pub fn parse(format_str: &str) -> Result<Self, ConfigError> {
        for placeholder in ["z", "x", "y"] {
            if !format_str.contains(&format!("{{{}}}", placeholder)) {
                return Err(ConfigError::MissingPlaceholder {
                    template: format_str.to_owned(),
                    placeholder,
                });
            }
        }

        Ok(Self {
            inc: AtomicUsize::new(0),
            format_str: format_str.to_owned(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.format_str
    }

    fn get_inc(&self) -> usize {
        self.inc.fetch_add(1, Ordering::Relaxed)
    }

    pub fn tile_url(&self, tile: &Tile) -> String {
        let inc = self.get_inc();
        let vars = hashmap! {
            "s".to_owned() => OSM_SERVERS[inc % OSM_SERVERS.len()].to_owned(),
            "x".to_owned() => tile.x.to_string(),
            "y".to_owned() => tile.y.to_string(),
            "z".to_owned() => tile.z.to_string(),
        };

        // templates with stray braces (e.g. in a query string) fall back to
        // plain substitution
        strfmt(&self.format_str, &vars).unwrap_or_else(|_| {
            vars.iter().fold(self.format_str.clone(), |url, (k, v)| {
                url.replace(&format!("{{{}}}", k), v)
            })
        })
    }
}

impl Clone for UrlFormat {
    fn clone(&self) -> Self {
        Self {
            inc: AtomicUsize::new(self.inc.load(Ordering::Relaxed)),
            format_str: self.format_str.clone(),
        }
    }
}

impl PartialEq for UrlFormat {
    fn eq(&self, other: &Self) -> bool {
        self.format_str == other.format_str
    }
}

impl fmt::Debug for UrlFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlFormat")
            .field("format_str", &self.format_str)
            .finish()
    }
}

impl fmt::Display for UrlFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_coordinates() {
        let fmt = UrlFormat::parse("https://tile.openstreetmap.org/{z}/{x}/{y}.png").unwrap();
        assert_eq!(
            fmt.tile_url(&Tile::new(31, 20, 6)),
            "https://tile.openstreetmap.org/6/31/20.png"
        );
    }

    #[test]
    fn rotates_subdomains() {
        let fmt = UrlFormat::parse("https://{s}.tile.example.org/{z}/{x}/{y}.png").unwrap();
        let tile = Tile::new(0, 0, 0);
        let hosts: Vec<_> = (0..4).map(|_| fmt.tile_url(&tile)).collect();

        assert_eq!(
            hosts,
            vec![
                "https://a.tile.example.org/0/0/0.png",
                "https://b.tile.example.org/0/0/0.png",
                "https://c.tile.example.org/0/0/0.png",
                "https://a.tile.example.org/0/0/0.png",
            ]
        );
    }

    #[test]
    fn tolerates_unknown_braces() {
        let fmt = UrlFormat::parse("https://example.com/{z}/{x}/{y}.png?style={dark}").unwrap();
        assert_eq!(
            fmt.tile_url(&Tile::new(1, 2, 3)),
            "https://example.com/3/1/2.png?style={dark}"
        );
    }

    #[test]
    fn rejects_incomplete_template() {
        assert_eq!(
            UrlFormat::parse("https://example.com/{z}/{x}.png"),
            Err(ConfigError::MissingPlaceholder {
                template: "https://example.com/{z}/{x}.png".to_owned(),
                placeholder: "y",
            })
        );
    }
}
