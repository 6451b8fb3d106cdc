use std::time::Duration;

use anyhow::Context;
use mapsync::{
    core::config::SimulationProfile,
    prelude::*,
    screens::MarkerDraft,
};

const TRACKING_TICKS: usize = 5;

/// Walks every demo screen against headless renderers
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut config = SyncConfig::default();
    config.simulation = SimulationProfile::Steady.resolve();
    config.simulation.interval_ms = 250;
    config.validate()?;

    let mut services = MapServices::new(HeadlessFactory::new().with_style_sources(&["composite"]));

    basic_map(&mut services, &config)?;
    markers(&mut services, &config)?;
    routing(&mut services, &config)?;
    styles(&mut services, &config)?;
    geolocation(&mut services, &config).await?;

    log::info!("live renderers after unmount: {}", services.lifecycle.live_count());
    Ok(())
}

fn load<S: Screen<HeadlessFactory>>(
    services: &mut MapServices<HeadlessFactory>,
    screen: &mut S,
) -> anyhow::Result<()> {
    notify(services, screen, RendererEvent::Load)
}

/// Feeds a host renderer event and replays the resulting lifecycle events
fn notify<S: Screen<HeadlessFactory>>(
    services: &mut MapServices<HeadlessFactory>,
    screen: &mut S,
    event: RendererEvent,
) -> anyhow::Result<()> {
    services.lifecycle.notify(screen.handle(), event)?;
    for event in services.process_events() {
        screen.on_event(&event, services)?;
    }
    Ok(())
}

fn basic_map(services: &mut MapServices<HeadlessFactory>, config: &SyncConfig) -> anyhow::Result<()> {
    let mut screen = BasicMapScreen::mount(services, "basic-map", config.map.style.clone())?;
    load(services, &mut screen)?;

    screen.select_city("Osaka", services)?;
    let zoom = screen.set_zoom(11.2, services)?;
    log::info!("basic map: {} at zoom {}", screen.city().name, zoom);

    screen.unmount(services)?;
    Ok(())
}

fn markers(services: &mut MapServices<HeadlessFactory>, config: &SyncConfig) -> anyhow::Result<()> {
    let mut screen = MarkersScreen::mount(
        services,
        "markers",
        config.map.style.clone(),
        config.map.initial_view,
    )?;
    load(services, &mut screen)?;

    let draft = MarkerDraft {
        label: "Tokyo Skytree".to_string(),
        position: LatLng::new(35.7101, 139.8107),
        ..MarkerDraft::default()
    };
    if let Some(id) = screen.add_marker(draft, services)? {
        log::info!("added marker {}", id);
    }
    screen.remove_marker("1", services)?;
    log::info!("markers: {:?}", screen.markers().iter().map(|m| &m.label).collect::<Vec<_>>());

    screen.unmount(services)?;
    Ok(())
}

fn routing(services: &mut MapServices<HeadlessFactory>, config: &SyncConfig) -> anyhow::Result<()> {
    let mut screen = RoutingScreen::mount(
        services,
        "routing",
        config.map.style.clone(),
        config.route.clone(),
        0,
    )?;
    load(services, &mut screen)?;

    for (start, end) in [("Tokyo Station", "Shibuya Station"), ("Ueno Station", "Ikebukuro Station")] {
        screen.select_start(start);
        screen.select_end(end);
        let route = screen.calculate(services)?;
        log::info!(
            "{} -> {}: {:.2} km, about {} min on foot",
            start,
            end,
            route.distance_km,
            route.eta_minutes
        );
    }

    screen.unmount(services)?;
    Ok(())
}

fn styles(services: &mut MapServices<HeadlessFactory>, config: &SyncConfig) -> anyhow::Result<()> {
    let mut screen = StylesScreen::mount(
        services,
        "styles",
        StyleCatalog::from_env(),
        config.map.initial_view,
    )?;
    load(services, &mut screen)?;
    screen.set_3d_buildings(true, services)?;

    let ids: Vec<&str> = screen.catalog().entries().iter().map(|entry| entry.id).collect();
    for id in ids {
        screen.select_style(id, services)?;
        notify(services, &mut screen, RendererEvent::StyleLoad)?;
        log::info!("style {} loaded", screen.selected());
    }

    screen.unmount(services)?;
    Ok(())
}

async fn geolocation(
    services: &mut MapServices<HeadlessFactory>,
    config: &SyncConfig,
) -> anyhow::Result<()> {
    let (ticker, ticks) = TokioTicker::current().context("starting tick scheduler")?;
    // Headless: no host location service, so every fix is simulated.
    let session = TrackingSession::new(config, None, Box::new(ticker));
    let mut screen = GeolocationScreen::mount(
        services,
        "geolocation",
        config.map.style.clone(),
        config.map.initial_view,
        session,
    )?;
    load(services, &mut screen)?;

    screen.locate_once(services);
    screen.toggle_tracking();

    let period = Duration::from_millis(config.simulation.interval_ms);
    let mut delivered = 0;
    while delivered < TRACKING_TICKS {
        tokio::time::sleep(period).await;
        for timer in ticks.try_iter() {
            screen.on_tick(timer, services);
            delivered += 1;
        }
    }
    screen.toggle_tracking();

    let panel = screen.panel();
    println!("{}", serde_json::to_string_pretty(&panel)?);
    if let Some(advisory) = panel.advisory {
        log::warn!("{}", advisory);
    }

    screen.unmount(services)?;
    Ok(())
}
