use crate::{
    core::{style::StyleCatalog, viewport::ViewState},
    overlay::{presets, MapServices},
    renderer::{RendererFactory, RendererHandle},
    screens::{deferred, Screen},
    MapError, Result,
};

/// Style picker with an optional 3D buildings layer
pub struct StylesScreen {
    handle: RendererHandle,
    catalog: StyleCatalog,
    selected: String,
    show_3d_buildings: bool,
}

impl StylesScreen {
    pub fn handle(&self) -> RendererHandle {
        self.handle
    }

    pub fn mount<F: RendererFactory>(
        services: &mut MapServices<F>,
        container: &str,
        catalog: StyleCatalog,
        view: ViewState,
    ) -> Result<Self> {
        let selected = catalog
            .entries()
            .first()
            .map(|entry| entry.id.to_string())
            .unwrap_or_default();
        let handle = services
            .lifecycle
            .create(container, catalog.resolve(&selected), view)?;
        Ok(Self {
            handle,
            catalog,
            selected,
            show_3d_buildings: false,
        })
    }

    /// Switches to a catalog style. Returns `false` for unknown ids.
    pub fn select_style<F: RendererFactory>(
        &mut self,
        id: &str,
        services: &mut MapServices<F>,
    ) -> Result<bool> {
        if self.catalog.entry(id).is_none() {
            log::warn!("unknown style '{}'", id);
            return Ok(false);
        }
        self.selected = id.to_string();
        services
            .lifecycle
            .set_style(self.handle, self.catalog.resolve(id))?;
        Ok(true)
    }

    pub fn set_3d_buildings<F: RendererFactory>(
        &mut self,
        show: bool,
        services: &mut MapServices<F>,
    ) -> Result<()> {
        self.show_3d_buildings = show;
        self.sync_buildings(services)
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn shows_3d_buildings(&self) -> bool {
        self.show_3d_buildings
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    fn sync_buildings<F: RendererFactory>(&mut self, services: &mut MapServices<F>) -> Result<()> {
        let handle = self.handle;
        if self.show_3d_buildings {
            match deferred(services.upsert(handle, &presets::buildings_3d())) {
                Ok(Some(_)) => {
                    services.set_layer_visibility(handle, presets::BUILDINGS_3D_ID, true)?;
                }
                Ok(None) => {}
                // Styles without a building source simply get no extrusions.
                Err(MapError::SourceConflict(reason)) => {
                    log::warn!("3D buildings unavailable on {}: {}", handle, reason);
                }
                Err(err) => return Err(err),
            }
        } else if services
            .overlays
            .contains(&services.lifecycle, handle, presets::BUILDINGS_3D_ID)
        {
            services.set_layer_visibility(handle, presets::BUILDINGS_3D_ID, false)?;
        }
        Ok(())
    }
}

impl<F: RendererFactory> Screen<F> for StylesScreen {
    fn name(&self) -> &str {
        "styles"
    }

    fn handle(&self) -> RendererHandle {
        self.handle
    }

    fn sync(&mut self, services: &mut MapServices<F>) -> Result<()> {
        self.sync_buildings(services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{headless::HeadlessFactory, RendererEvent};

    fn mounted() -> (MapServices<HeadlessFactory>, StylesScreen) {
        let factory = HeadlessFactory::new().with_style_sources(&["composite"]);
        let mut services = MapServices::new(factory);
        let screen = StylesScreen::mount(
            &mut services,
            "map",
            StyleCatalog::new(Some("key".to_string())),
            ViewState::default(),
        )
        .unwrap();
        services.lifecycle.notify(screen.handle, RendererEvent::Load).unwrap();
        services.process_events();
        (services, screen)
    }

    #[test]
    fn test_buildings_survive_restyle() {
        let (mut services, mut screen) = mounted();
        screen.set_3d_buildings(true, &mut services).unwrap();

        let streets = screen.catalog().entries()[1].id;
        assert!(screen.select_style(streets, &mut services).unwrap());
        services
            .lifecycle
            .notify(screen.handle, RendererEvent::StyleLoad)
            .unwrap();
        for event in services.process_events() {
            screen.on_event(&event, &mut services).unwrap();
        }

        let renderer = services.lifecycle.renderer(screen.handle).unwrap();
        assert!(renderer.style().url().contains(streets));
        assert_eq!(renderer.layer_ids(), vec![presets::BUILDINGS_3D_ID]);
    }

    #[test]
    fn test_hide_keeps_layer() {
        let (mut services, mut screen) = mounted();
        screen.set_3d_buildings(true, &mut services).unwrap();
        screen.set_3d_buildings(false, &mut services).unwrap();

        let visibility = services
            .overlays
            .layer_visibility(&services.lifecycle, screen.handle, presets::BUILDINGS_3D_ID)
            .unwrap();
        assert_eq!(visibility, Some(false));

        screen.set_3d_buildings(true, &mut services).unwrap();
        let visibility = services
            .overlays
            .layer_visibility(&services.lifecycle, screen.handle, presets::BUILDINGS_3D_ID)
            .unwrap();
        assert_eq!(visibility, Some(true));
    }
}
