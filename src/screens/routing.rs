use rand::rngs::StdRng;

use crate::{
    core::{config::RouteConfig, style::StyleRef, viewport::CameraMove, viewport::ViewState},
    location::simulator::seeded_rng,
    overlay::{presets, MapServices},
    renderer::{RendererFactory, RendererHandle},
    routing::{estimate_with, find_point_of_interest, points_of_interest, RouteEstimate, Waypoint},
    screens::{deferred, Screen},
    Result,
};

/// Start/end pickers and the estimated route between them
pub struct RoutingScreen {
    handle: RendererHandle,
    start: Waypoint,
    end: Waypoint,
    route: Option<RouteEstimate>,
    config: RouteConfig,
    rng: StdRng,
}

impl RoutingScreen {
    pub fn handle(&self) -> RendererHandle {
        self.handle
    }

    /// `seed` 0 draws midpoint jitter from entropy
    pub fn mount<F: RendererFactory>(
        services: &mut MapServices<F>,
        container: &str,
        style: StyleRef,
        config: RouteConfig,
        seed: u64,
    ) -> Result<Self> {
        let pois = points_of_interest();
        let (start, end) = (pois[0].clone(), pois[1].clone());
        let view = ViewState::new(start.position, 12.0);
        let handle = services.lifecycle.create(container, style, view)?;
        Ok(Self {
            handle,
            start,
            end,
            route: None,
            config,
            rng: seeded_rng(seed),
        })
    }

    /// Returns `false` for names outside the point-of-interest list
    pub fn select_start(&mut self, name: &str) -> bool {
        match find_point_of_interest(name) {
            Some(poi) => {
                self.start = poi.clone();
                true
            }
            None => false,
        }
    }

    pub fn select_end(&mut self, name: &str) -> bool {
        match find_point_of_interest(name) {
            Some(poi) => {
                self.end = poi.clone();
                true
            }
            None => false,
        }
    }

    /// Estimates the route, draws it with its endpoints and fits the camera
    /// to start and end
    pub fn calculate<F: RendererFactory>(
        &mut self,
        services: &mut MapServices<F>,
    ) -> Result<RouteEstimate> {
        let route = estimate_with(
            self.start.position,
            self.end.position,
            &self.config,
            &mut self.rng,
        );
        log::debug!(
            "route {} -> {}: {:.2} km, {} min",
            self.start.name,
            self.end.name,
            route.distance_km,
            route.eta_minutes
        );
        self.route = Some(route.clone());
        self.draw(services)?;

        if let Some(bounds) = route.endpoint_bounds() {
            services.lifecycle.move_camera(
                self.handle,
                CameraMove::FitBounds {
                    bounds,
                    padding: self.config.fit_padding,
                },
            )?;
        }
        Ok(route)
    }

    /// Removes the route and its endpoints
    pub fn clear<F: RendererFactory>(&mut self, services: &mut MapServices<F>) -> Result<()> {
        self.route = None;
        deferred(services.remove_overlay(self.handle, presets::WAYPOINTS_ID))?;
        deferred(services.remove_overlay(self.handle, presets::ROUTE_ID))?;
        Ok(())
    }

    pub fn start(&self) -> &Waypoint {
        &self.start
    }

    pub fn end(&self) -> &Waypoint {
        &self.end
    }

    pub fn route(&self) -> Option<&RouteEstimate> {
        self.route.as_ref()
    }

    fn draw<F: RendererFactory>(&mut self, services: &mut MapServices<F>) -> Result<()> {
        let Some(route) = &self.route else {
            return Ok(());
        };
        deferred(services.upsert(self.handle, &presets::route_line(&route.path)))?;
        deferred(services.upsert(self.handle, &presets::waypoints(&self.start, &self.end)))?;
        Ok(())
    }
}

impl<F: RendererFactory> Screen<F> for RoutingScreen {
    fn name(&self) -> &str {
        "routing"
    }

    fn handle(&self) -> RendererHandle {
        self.handle
    }

    fn sync(&mut self, services: &mut MapServices<F>) -> Result<()> {
        self.draw(services)
    }

    fn unmount(&mut self, services: &mut MapServices<F>) -> Result<()> {
        self.clear(services)?;
        services.lifecycle.destroy(self.handle)
    }
}
