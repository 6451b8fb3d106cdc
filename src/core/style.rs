//! Map style references and the catalog behind the style picker.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::core::constants::{DEMO_STYLE_URL, MAPTILER_API_KEY_ENV};

/// Reference to a renderer style document (usually a style.json URL)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleRef(String);

impl StyleRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The keyless MapLibre demo tiles style
    pub fn demo() -> Self {
        Self::new(DEMO_STYLE_URL)
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

impl Default for StyleRef {
    fn default() -> Self {
        Self::demo()
    }
}

impl std::fmt::Display for StyleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a catalog entry's style document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleSource {
    /// A MapTiler map id, needs an API key
    MapTiler(&'static str),
    /// A fixed URL
    Url(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub source: StyleSource,
    pub dark: bool,
    pub satellite: bool,
}

impl StyleEntry {
    fn maptiler(id: &'static str, name: &'static str, map_id: &'static str) -> Self {
        Self {
            id,
            name,
            source: StyleSource::MapTiler(map_id),
            dark: false,
            satellite: false,
        }
    }

    fn dark(mut self) -> Self {
        self.dark = true;
        self
    }

    fn satellite(mut self) -> Self {
        self.satellite = true;
        self
    }
}

static STANDARD_STYLES: Lazy<Vec<StyleEntry>> = Lazy::new(|| {
    vec![
        StyleEntry::maptiler("basic-v2", "Basic", "basic-v2"),
        StyleEntry::maptiler("streets-v2", "Streets", "streets-v2"),
        StyleEntry::maptiler("outdoor-v2", "Outdoor", "outdoor-v2"),
        StyleEntry::maptiler("winter-v2", "Winter", "winter-v2"),
        StyleEntry::maptiler("topo-v2", "Topo", "topo-v2"),
        StyleEntry::maptiler("bright-v2", "Bright", "bright-v2"),
        StyleEntry::maptiler("dataviz", "Dataviz", "dataviz"),
        StyleEntry::maptiler("ocean", "Ocean", "ocean"),
        StyleEntry::maptiler("openstreetmap", "OpenStreetMap", "openstreetmap"),
        StyleEntry::maptiler("streets-dark", "Streets Dark", "streets-v2-dark").dark(),
        StyleEntry::maptiler("basic-dark", "Basic Dark", "basic-v2-dark").dark(),
        StyleEntry::maptiler("satellite", "Satellite", "satellite").satellite(),
        StyleEntry::maptiler("hybrid", "Hybrid", "hybrid").satellite(),
        StyleEntry {
            id: "demotiles",
            name: "Demo Tiles",
            source: StyleSource::Url(DEMO_STYLE_URL),
            dark: false,
            satellite: false,
        },
    ]
});

/// The selectable styles plus the API key needed to resolve hosted ones
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    api_key: Option<String>,
}

impl StyleCatalog {
    pub fn new(api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|key| !key.trim().is_empty());
        Self { api_key }
    }

    /// Reads the MapTiler key from the environment
    pub fn from_env() -> Self {
        Self::new(std::env::var(MAPTILER_API_KEY_ENV).ok())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn entries(&self) -> &'static [StyleEntry] {
        &STANDARD_STYLES
    }

    pub fn entry(&self, id: &str) -> Option<&'static StyleEntry> {
        STANDARD_STYLES.iter().find(|entry| entry.id == id)
    }

    /// Resolves a style id to a URL.
    ///
    /// Unknown ids resolve to the first entry. Hosted styles resolve to the
    /// demo tiles when no API key is configured.
    pub fn resolve(&self, id: &str) -> StyleRef {
        let entry = self.entry(id).unwrap_or(&STANDARD_STYLES[0]);
        match (&entry.source, &self.api_key) {
            (StyleSource::Url(url), _) => StyleRef::new(*url),
            (StyleSource::MapTiler(map_id), Some(key)) => StyleRef::new(format!(
                "https://api.maptiler.com/maps/{}/style.json?key={}",
                map_id, key
            )),
            (StyleSource::MapTiler(map_id), None) => {
                log::warn!(
                    "{} is not set, using demo tiles instead of '{}'",
                    MAPTILER_API_KEY_ENV,
                    map_id
                );
                StyleRef::demo()
            }
        }
    }
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::new(None)
    }
}
