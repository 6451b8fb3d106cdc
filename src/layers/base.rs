use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Renderer layer types used by overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    Circle,
    Line,
    Fill,
    FillExtrusion,
    Symbol,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerKind::Circle => write!(f, "circle"),
            LayerKind::Line => write!(f, "line"),
            LayerKind::Fill => write!(f, "fill"),
            LayerKind::FillExtrusion => write!(f, "fill-extrusion"),
            LayerKind::Symbol => write!(f, "symbol"),
        }
    }
}

/// Paint/layout descriptor for one renderer layer.
///
/// Serializes to the style-spec layer object (`id`, `type`, `source`,
/// `source-layer`, `filter`, `minzoom`, `paint`, `layout`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    /// Filled in by the reconciler from the owning overlay unit
    #[serde(default)]
    pub source: String,
    #[serde(rename = "source-layer", default, skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(rename = "minzoom", default, skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,
    #[serde(default)]
    pub paint: Map<String, Value>,
    #[serde(default)]
    pub layout: Map<String, Value>,
}

impl LayerSpec {
    pub fn new(id: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            kind,
            source: String::new(),
            source_layer: None,
            filter: None,
            min_zoom: None,
            paint: Map::new(),
            layout: Map::new(),
        }
    }

    pub fn paint(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.paint.insert(property.to_string(), value.into());
        self
    }

    pub fn layout(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.layout.insert(property.to_string(), value.into());
        self
    }

    pub fn source_layer(mut self, source_layer: impl Into<String>) -> Self {
        self.source_layer = Some(source_layer.into());
        self
    }

    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn min_zoom(mut self, zoom: f64) -> Self {
        self.min_zoom = Some(zoom);
        self
    }

    /// Returns a copy bound to `source`
    pub fn bound_to(&self, source: &str) -> Self {
        let mut spec = self.clone();
        spec.source = source.to_string();
        spec
    }
}
