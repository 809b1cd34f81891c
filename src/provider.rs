//! Known tile providers and resolution of the provider used for a run.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::url::UrlFormat;

const API_KEY_PLACEHOLDER: &str = "{key}";

/// A registry entry describing a tile server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Provider {
    pub key: String,
    pub display_name: String,

    /// Directory name the provider's tiles are stored under, so several
    /// providers can share one tile store.
    pub storage_slug: String,

    /// URL template with `{z}`, `{x}`, `{y}` and optionally `{key}` and `{s}`.
    pub url_template: String,
}

impl Provider {
    pub fn new(key: &str, display_name: &str, storage_slug: &str, url_template: &str) -> Self {
        Self {
            key: key.to_owned(),
            display_name: display_name.to_owned(),
            storage_slug: storage_slug.to_owned(),
            url_template: url_template.to_owned(),
        }
    }

    pub fn requires_api_key(&self) -> bool {
        self.url_template.contains(API_KEY_PLACEHOLDER)
    }
}

/// The fully resolved provider of a download run.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderConfig {
    pub key: String,
    pub display_name: String,
    pub storage_slug: String,

    /// Tile URL with any API key already substituted.
    pub url: UrlFormat,
}

/// Immutable lookup table from provider key to [`Provider`].
#[derive(Clone, Debug, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Provider>,
}

impl ProviderRegistry {
    pub fn new<I: IntoIterator<Item = Provider>>(providers: I) -> Self {
        Self {
            providers: providers
                .into_iter()
                .map(|p| (p.key.clone(), p))
                .collect(),
        }
    }

    /// The providers shipped with the downloader.
    pub fn builtin() -> Self {
        Self::new(vec![
            Provider::new(
                "osm",
                "OpenStreetMap",
                "OpenStreetMap",
                "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            ),
            Provider::new(
                "opentopomap",
                "OpenTopoMap",
                "OpenTopoMap",
                "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
            ),
            Provider::new(
                "os_outdoor",
                "Ordnance Survey Outdoor",
                "OSOutdoor",
                "https://api.os.uk/maps/raster/v1/zxy/Outdoor_3857/{z}/{x}/{y}.png?key={key}",
            ),
            Provider::new(
                "mapquest",
                "MapQuest",
                "MapQuest",
                "https://www.mapquestapi.com/tile/v1/map/{z}/{x}/{y}?key={key}",
            ),
        ])
    }

    pub fn get(&self, key: &str) -> Option<&Provider> {
        self.providers.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Provider> {
        self.providers.values()
    }

    /// Resolves the provider to download from.
    ///
    /// `custom_template` replaces the registered template of `key`, or
    /// defines an entirely custom provider if `key` isn't registered. A
    /// `{key}` placeholder in the template is replaced by `api_key`.
    ///
    /// The storage slug is the first of: `custom_slug`, the registered slug,
    /// one derived from the template's host name, and finally `key` itself.
    pub fn resolve(
        &self,
        key: &str,
        custom_template: Option<&str>,
        custom_slug: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<ProviderConfig, ConfigError> {
        let registered = self.get(key);

        let template = custom_template
            .or_else(|| registered.map(|p| p.url_template.as_str()))
            .ok_or_else(|| ConfigError::UnknownProvider(key.to_owned()))?;

        let url = if template.contains(API_KEY_PLACEHOLDER) {
            match api_key.filter(|k| !k.is_empty()) {
                Some(api_key) => template.replace(API_KEY_PLACEHOLDER, api_key),
                None => return Err(ConfigError::MissingApiKey(key.to_owned())),
            }
        } else {
            template.to_owned()
        };

        let storage_slug = custom_slug
            .map(str::to_owned)
            .or_else(|| registered.map(|p| p.storage_slug.clone()))
            .or_else(|| slug_from_template(template))
            .unwrap_or_else(|| key.to_owned());

        Ok(ProviderConfig {
            key: key.to_owned(),
            display_name: registered
                .map(|p| p.display_name.clone())
                .unwrap_or_else(|| key.to_owned()),
            storage_slug,
            url: UrlFormat::parse(&url)?,
        })
    }
}

/// Derives a storage slug from the host name of a URL template, e.g.
/// `tiles.example.com` becomes `tiles_example_com`.
fn slug_from_template(template: &str) -> Option<String> {
    let rest = template.split("://").nth(1)?;
    let host = rest.split(|c: char| c == '/' || c == ':' || c == '?').next()?;
    let host = host.strip_prefix("{s}.").unwrap_or(host);

    if host.is_empty() {
        return None;
    }

    Some(
        host.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect(),
    )
}
