use serde::{Deserialize, Serialize};

/// Opaque reference to one renderer instance owned by a
/// [`RendererLifecycleController`](super::RendererLifecycleController).
///
/// Handles are never reused, so a stale handle can always be told apart from
/// a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RendererHandle(u64);

impl RendererHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RendererHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "renderer#{}", self.0)
    }
}
