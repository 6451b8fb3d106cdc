use crate::{
    core::{geo::LatLng, style::StyleRef, viewport::ViewState},
    overlay::MapServices,
    renderer::{RendererFactory, RendererHandle},
    screens::Screen,
    Result,
};

pub const MIN_ZOOM: f64 = 3.0;
pub const MAX_ZOOM: f64 = 18.0;
pub const ZOOM_STEP: f64 = 0.5;
const INITIAL_ZOOM: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    pub name: &'static str,
    pub center: LatLng,
    pub zoom: f64,
}

pub const CITIES: [City; 5] = [
    City {
        name: "Tokyo",
        center: LatLng { lat: 35.6812, lng: 139.7634 },
        zoom: 8.0,
    },
    City {
        name: "Osaka",
        center: LatLng { lat: 34.6937, lng: 135.5023 },
        zoom: 8.0,
    },
    City {
        name: "Nagoya",
        center: LatLng { lat: 35.1815, lng: 136.9066 },
        zoom: 8.0,
    },
    City {
        name: "Sapporo",
        center: LatLng { lat: 43.0618, lng: 141.3469 },
        zoom: 8.0,
    },
    City {
        name: "Fukuoka",
        center: LatLng { lat: 33.5902, lng: 130.4017 },
        zoom: 8.0,
    },
];

/// City picker and zoom slider driving the camera
pub struct BasicMapScreen {
    handle: RendererHandle,
    city: City,
    zoom: f64,
}

impl BasicMapScreen {
    pub fn handle(&self) -> RendererHandle {
        self.handle
    }

    pub fn mount<F: RendererFactory>(
        services: &mut MapServices<F>,
        container: &str,
        style: StyleRef,
    ) -> Result<Self> {
        let city = CITIES[0];
        let handle = services
            .lifecycle
            .create(container, style, ViewState::new(city.center, INITIAL_ZOOM))?;
        Ok(Self {
            handle,
            city,
            zoom: INITIAL_ZOOM,
        })
    }

    /// Recenters on a city, keeping the current zoom. Returns `false` for
    /// unknown names.
    pub fn select_city<F: RendererFactory>(
        &mut self,
        name: &str,
        services: &mut MapServices<F>,
    ) -> Result<bool> {
        let Some(city) = CITIES.iter().find(|city| city.name == name) else {
            log::warn!("unknown city '{}'", name);
            return Ok(false);
        };
        self.city = *city;
        services.lifecycle.set_view(self.handle, self.view())?;
        Ok(true)
    }

    /// Sets the zoom, clamped to the slider range and snapped to its step.
    /// Returns the zoom actually applied.
    pub fn set_zoom<F: RendererFactory>(
        &mut self,
        zoom: f64,
        services: &mut MapServices<F>,
    ) -> Result<f64> {
        self.zoom = ((zoom.clamp(MIN_ZOOM, MAX_ZOOM) / ZOOM_STEP).round() * ZOOM_STEP)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        services.lifecycle.set_view(self.handle, self.view())?;
        Ok(self.zoom)
    }

    pub fn city(&self) -> &City {
        &self.city
    }

    pub fn view(&self) -> ViewState {
        ViewState::new(self.city.center, self.zoom)
    }
}

impl<F: RendererFactory> Screen<F> for BasicMapScreen {
    fn name(&self) -> &str {
        "basic-map"
    }

    fn handle(&self) -> RendererHandle {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{headless::HeadlessFactory, RendererEvent};

    #[test]
    fn test_city_and_zoom_reach_renderer() {
        let mut services = MapServices::new(HeadlessFactory::new());
        let mut screen = BasicMapScreen::mount(&mut services, "map", StyleRef::demo()).unwrap();

        // Picked before the renderer loads
        assert!(screen.select_city("Sapporo", &mut services).unwrap());
        services.lifecycle.notify(screen.handle, RendererEvent::Load).unwrap();

        assert_eq!(screen.set_zoom(12.3, &mut services).unwrap(), 12.5);
        assert_eq!(screen.set_zoom(40.0, &mut services).unwrap(), MAX_ZOOM);

        let view = services.lifecycle.renderer(screen.handle).unwrap().view();
        assert_eq!(view.center, LatLng::new(43.0618, 141.3469));
        assert_eq!(view.zoom, MAX_ZOOM);
        assert!(!screen.select_city("Kyoto", &mut services).unwrap());
    }
}
