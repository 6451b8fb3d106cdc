use serde::{Deserialize, Serialize};

use crate::{data::geojson::GeoJson, layers::base::LayerSpec};

/// Where an overlay unit's layers read their data from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverlaySource {
    /// A GeoJSON source owned by the unit, keyed by the unit id
    GeoJson(GeoJson),
    /// A source the active style already defines
    Style(String),
}

/// A named source plus the ordered layers that draw it.
///
/// Units are created, updated and removed as a whole by the
/// [`OverlayReconciler`](super::OverlayReconciler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayUnit {
    pub id: String,
    pub source: OverlaySource,
    /// Bottom to top
    pub layers: Vec<LayerSpec>,
}

impl OverlayUnit {
    pub fn new(id: impl Into<String>, data: GeoJson) -> Self {
        Self {
            id: id.into(),
            source: OverlaySource::GeoJson(data),
            layers: Vec::new(),
        }
    }

    /// A unit whose layers draw from a source of the active style
    pub fn on_style_source(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: OverlaySource::Style(source.into()),
            layers: Vec::new(),
        }
    }

    pub fn with_layer(mut self, layer: LayerSpec) -> Self {
        self.layers.push(layer);
        self
    }

    /// Id of the renderer source the layers are bound to
    pub fn source_id(&self) -> &str {
        match &self.source {
            OverlaySource::GeoJson(_) => &self.id,
            OverlaySource::Style(source) => source,
        }
    }

    pub fn owns_source(&self) -> bool {
        matches!(self.source, OverlaySource::GeoJson(_))
    }

    pub fn data(&self) -> Option<&GeoJson> {
        match &self.source {
            OverlaySource::GeoJson(data) => Some(data),
            OverlaySource::Style(_) => None,
        }
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|layer| layer.id.as_str())
    }

    /// Layers with their `source` pointing at [`source_id`](Self::source_id)
    pub(crate) fn bound_layers(&self) -> Vec<LayerSpec> {
        let source = self.source_id();
        self.layers
            .iter()
            .map(|layer| layer.bound_to(source))
            .collect()
    }
}
