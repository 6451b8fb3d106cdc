use std::collections::VecDeque;

use crate::{
    core::{style::StyleRef, viewport::CameraMove, viewport::ViewState},
    prelude::HashMap,
    renderer::{ContainerId, Renderer, RendererEvent, RendererFactory, RendererHandle},
    MapError, Result,
};

/// Where a renderer instance is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// No instance was ever created for the handle
    Uninitialized,
    /// Constructed, waiting for the initial load
    Constructing,
    Ready,
    /// A new style is loading; overlays are unavailable until it finishes
    StyleReloading,
    Destroyed,
}

impl LifecycleState {
    /// Whether the instance has fired its initial ready notification
    pub fn has_loaded(&self) -> bool {
        matches!(self, LifecycleState::Ready | LifecycleState::StyleReloading)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Constructing => "constructing",
            LifecycleState::Ready => "ready",
            LifecycleState::StyleReloading => "style-reloading",
            LifecycleState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Lifecycle notifications drained with
/// [`RendererLifecycleController::process_events`]
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// Initial load finished. Emitted once per handle.
    Ready(RendererHandle),
    /// A style change finished loading. Overlays added before it are gone.
    Restyled {
        handle: RendererHandle,
        style: StyleRef,
    },
    Destroyed(RendererHandle),
}

type ReadyCallback = Box<dyn FnOnce(RendererHandle)>;

struct Entry<R> {
    container: ContainerId,
    renderer: R,
    state: LifecycleState,
    style: StyleRef,
    pending_style: Option<StyleRef>,
    pending_camera: Option<CameraMove>,
    ready_callbacks: Vec<ReadyCallback>,
    generation: u64,
}

/// Creates, tracks and destroys renderer instances.
///
/// At most one live instance exists per container. Operations issued before
/// an instance is ready are captured and applied once it is: the latest
/// style wins, and so does the latest camera request. Readiness is fed in by
/// the host with [`notify`](Self::notify).
pub struct RendererLifecycleController<F: RendererFactory> {
    factory: F,
    entries: HashMap<RendererHandle, Entry<F::Renderer>>,
    containers: HashMap<ContainerId, RendererHandle>,
    next_id: u64,
    events: VecDeque<LifecycleEvent>,
}

impl<F: RendererFactory> RendererLifecycleController<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            entries: HashMap::default(),
            containers: HashMap::default(),
            next_id: 1,
            events: VecDeque::new(),
        }
    }

    /// Constructs a renderer inside `container`
    pub fn create(
        &mut self,
        container: &str,
        style: StyleRef,
        view: ViewState,
    ) -> Result<RendererHandle> {
        if let Some(existing) = self.containers.get(container) {
            log::warn!("container '{}' already hosts {}", container, existing);
            return Err(MapError::ContainerOccupied(container.to_string()));
        }

        let renderer = self.factory.construct(container, &style, &view)?;
        let handle = RendererHandle::new(self.next_id);
        self.next_id += 1;

        log::debug!("constructed {} in '{}' with {}", handle, container, style);

        self.entries.insert(
            handle,
            Entry {
                container: container.to_string(),
                renderer,
                state: LifecycleState::Constructing,
                style,
                pending_style: None,
                pending_camera: None,
                ready_callbacks: Vec::new(),
                generation: 0,
            },
        );
        self.containers.insert(container.to_string(), handle);
        Ok(handle)
    }

    /// Runs `callback` once the instance is ready, or immediately if it
    /// already is
    pub fn on_ready<C>(&mut self, handle: RendererHandle, callback: C) -> Result<()>
    where
        C: FnOnce(RendererHandle) + 'static,
    {
        let entry = self.entry_mut(handle)?;
        if entry.state.has_loaded() {
            callback(handle);
        } else {
            entry.ready_callbacks.push(Box::new(callback));
        }
        Ok(())
    }

    /// Replaces the style. Before the instance is ready the request is held
    /// and the latest one is applied on ready.
    pub fn set_style(&mut self, handle: RendererHandle, style: StyleRef) -> Result<()> {
        let entry = self.entry_mut(handle)?;
        match entry.state {
            LifecycleState::Ready => {
                entry.renderer.set_style(&style)?;
                log::debug!("{} restyling to {}", handle, style);
                entry.style = style;
                entry.state = LifecycleState::StyleReloading;
            }
            _ => {
                log::debug!("{} queued style {} while {}", handle, style, entry.state);
                entry.pending_style = Some(style);
            }
        }
        Ok(())
    }

    /// Jumps the camera to `view`
    pub fn set_view(&mut self, handle: RendererHandle, view: ViewState) -> Result<()> {
        self.move_camera(handle, CameraMove::JumpTo(view))
    }

    /// Moves the camera, capturing the request when the instance is not
    /// ready yet
    pub fn move_camera(&mut self, handle: RendererHandle, camera: CameraMove) -> Result<()> {
        let entry = self.entry_mut(handle)?;
        if entry.state.has_loaded() {
            apply_camera(&mut entry.renderer, &camera);
        } else {
            entry.pending_camera = Some(camera);
        }
        Ok(())
    }

    /// Feeds a renderer notification into the state machine
    pub fn notify(&mut self, handle: RendererHandle, event: RendererEvent) -> Result<()> {
        let entry = self.entry_mut(handle)?;
        let mut emitted = Vec::new();

        match (entry.state, event) {
            (LifecycleState::Constructing, RendererEvent::Load) => {
                entry.state = LifecycleState::Ready;
                if let Some(camera) = entry.pending_camera.take() {
                    apply_camera(&mut entry.renderer, &camera);
                }
                for callback in entry.ready_callbacks.drain(..) {
                    callback(handle);
                }
                emitted.push(LifecycleEvent::Ready(handle));

                if let Some(style) = entry.pending_style.take() {
                    match entry.renderer.set_style(&style) {
                        Ok(()) => {
                            log::debug!("{} applying queued style {}", handle, style);
                            entry.style = style;
                            entry.state = LifecycleState::StyleReloading;
                        }
                        Err(err) => log::warn!("{} rejected queued style {}: {}", handle, style, err),
                    }
                }
            }
            (LifecycleState::StyleReloading, RendererEvent::StyleLoad) => {
                entry.generation += 1;
                // A newer style requested mid-reload keeps the instance reloading.
                let reloading = match entry.pending_style.take() {
                    Some(style) => match entry.renderer.set_style(&style) {
                        Ok(()) => {
                            entry.style = style;
                            true
                        }
                        Err(err) => {
                            log::warn!("{} rejected queued style {}: {}", handle, style, err);
                            false
                        }
                    },
                    None => false,
                };
                if !reloading {
                    entry.state = LifecycleState::Ready;
                    emitted.push(LifecycleEvent::Restyled {
                        handle,
                        style: entry.style.clone(),
                    });
                }
            }
            (state, event) => {
                log::debug!("{} ignoring {:?} while {}", handle, event, state);
            }
        }

        self.events.extend(emitted);
        Ok(())
    }

    /// Tears the instance down. Calling it again, or on a handle that never
    /// existed, does nothing.
    pub fn destroy(&mut self, handle: RendererHandle) -> Result<()> {
        let Some(mut entry) = self.entries.remove(&handle) else {
            log::debug!("{} already gone", handle);
            return Ok(());
        };

        entry.renderer.remove();
        self.containers.remove(&entry.container);
        self.events.push_back(LifecycleEvent::Destroyed(handle));
        log::debug!("destroyed {} in '{}'", handle, entry.container);
        Ok(())
    }

    /// Drains queued lifecycle notifications in the order they happened
    pub fn process_events(&mut self) -> Vec<LifecycleEvent> {
        self.events.drain(..).collect()
    }

    pub fn state(&self, handle: RendererHandle) -> LifecycleState {
        match self.entries.get(&handle) {
            Some(entry) => entry.state,
            None if handle.id() < self.next_id => LifecycleState::Destroyed,
            None => LifecycleState::Uninitialized,
        }
    }

    pub fn is_ready(&self, handle: RendererHandle) -> bool {
        self.state(handle) == LifecycleState::Ready
    }

    /// Number of completed restyles, `None` for handles that are not live
    pub fn generation(&self, handle: RendererHandle) -> Option<u64> {
        self.entries.get(&handle).map(|entry| entry.generation)
    }

    /// The style currently applied or loading
    pub fn current_style(&self, handle: RendererHandle) -> Result<&StyleRef> {
        Ok(&self.entry(handle)?.style)
    }

    /// Read-only access to a live instance
    pub fn renderer(&self, handle: RendererHandle) -> Result<&F::Renderer> {
        Ok(&self.entry(handle)?.renderer)
    }

    /// The live handle for `container`, if any
    pub fn handle_for(&self, container: &str) -> Option<RendererHandle> {
        self.containers.get(container).copied()
    }

    pub fn live_count(&self) -> usize {
        self.entries.len()
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    /// Mutable access for the overlay reconciler, together with the number
    /// of completed restyles. Fails unless the instance is ready.
    pub(crate) fn ready_renderer_mut(
        &mut self,
        handle: RendererHandle,
    ) -> Result<(&mut F::Renderer, u64)> {
        let entry = self.entry_mut(handle)?;
        if entry.state != LifecycleState::Ready {
            return Err(MapError::RendererNotReady(handle));
        }
        Ok((&mut entry.renderer, entry.generation))
    }

    fn entry(&self, handle: RendererHandle) -> Result<&Entry<F::Renderer>> {
        self.entries
            .get(&handle)
            .ok_or(MapError::HandleDestroyed(handle))
    }

    fn entry_mut(&mut self, handle: RendererHandle) -> Result<&mut Entry<F::Renderer>> {
        self.entries
            .get_mut(&handle)
            .ok_or(MapError::HandleDestroyed(handle))
    }
}

impl<F: RendererFactory> Drop for RendererLifecycleController<F> {
    fn drop(&mut self) {
        for (handle, entry) in self.entries.iter_mut() {
            log::debug!("releasing {} on shutdown", handle);
            entry.renderer.remove();
        }
    }
}

fn apply_camera<R: Renderer>(renderer: &mut R, camera: &CameraMove) {
    match camera {
        CameraMove::JumpTo(view) => renderer.jump_to(view),
        CameraMove::FlyTo { center, zoom } => renderer.fly_to(*center, *zoom),
        CameraMove::PanTo { center } => renderer.pan_to(*center),
        CameraMove::FitBounds { bounds, padding } => renderer.fit_bounds(bounds, *padding),
    }
}
