pub mod base;

pub use base::{LayerKind, LayerSpec};
