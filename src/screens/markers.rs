use crate::{
    core::{geo::LatLng, style::StyleRef, viewport::ViewState},
    overlay::{presets, MapMarker, MapServices},
    renderer::{RendererFactory, RendererHandle},
    screens::{deferred, Screen},
    MapError, Result,
};

/// Form state for a marker about to be added
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDraft {
    pub position: LatLng,
    pub label: String,
    pub color: String,
}

impl Default for MarkerDraft {
    fn default() -> Self {
        Self {
            position: LatLng::new(35.68, 139.75),
            label: String::new(),
            color: "#0000FF".to_string(),
        }
    }
}

/// User-editable list of labelled markers
pub struct MarkersScreen {
    handle: RendererHandle,
    markers: Vec<MapMarker>,
    next_id: u64,
}

impl MarkersScreen {
    pub fn handle(&self) -> RendererHandle {
        self.handle
    }

    pub fn mount<F: RendererFactory>(
        services: &mut MapServices<F>,
        container: &str,
        style: StyleRef,
        view: ViewState,
    ) -> Result<Self> {
        let handle = services.lifecycle.create(container, style, view)?;
        let markers = vec![
            MapMarker {
                id: "1".to_string(),
                position: LatLng::new(35.6812, 139.7634),
                label: "Tokyo Tower".to_string(),
                color: "#FF0000".to_string(),
            },
            MapMarker {
                id: "2".to_string(),
                position: LatLng::new(35.6846, 139.7500),
                label: "Imperial Palace".to_string(),
                color: "#00FF00".to_string(),
            },
        ];
        Ok(Self {
            handle,
            next_id: markers.len() as u64 + 1,
            markers,
        })
    }

    /// Adds the draft as a marker and returns its id. Drafts without a
    /// label are ignored.
    pub fn add_marker<F: RendererFactory>(
        &mut self,
        draft: MarkerDraft,
        services: &mut MapServices<F>,
    ) -> Result<Option<String>> {
        if draft.label.trim().is_empty() {
            return Ok(None);
        }
        if !draft.position.is_valid() {
            return Err(MapError::InvalidCoordinates(format!("{:?}", draft.position)));
        }

        let id = self.next_id.to_string();
        self.next_id += 1;
        self.markers.push(MapMarker {
            id: id.clone(),
            position: draft.position,
            label: draft.label,
            color: draft.color,
        });
        self.sync_markers(services)?;
        Ok(Some(id))
    }

    pub fn remove_marker<F: RendererFactory>(
        &mut self,
        id: &str,
        services: &mut MapServices<F>,
    ) -> Result<bool> {
        let before = self.markers.len();
        self.markers.retain(|marker| marker.id != id);
        if self.markers.len() == before {
            return Ok(false);
        }
        self.sync_markers(services)?;
        Ok(true)
    }

    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    fn sync_markers<F: RendererFactory>(&mut self, services: &mut MapServices<F>) -> Result<()> {
        if self.markers.is_empty() {
            deferred(services.remove_overlay(self.handle, presets::MARKERS_ID))?;
        } else {
            deferred(services.upsert(self.handle, &presets::markers(&self.markers)))?;
        }
        Ok(())
    }
}

impl<F: RendererFactory> Screen<F> for MarkersScreen {
    fn name(&self) -> &str {
        "markers"
    }

    fn handle(&self) -> RendererHandle {
        self.handle
    }

    fn sync(&mut self, services: &mut MapServices<F>) -> Result<()> {
        self.sync_markers(services)
    }
}
