//! Exhibit entity composition

pub mod composite;
pub mod configuration;
pub mod markers;

pub use composite::{CompositeEntity, EntityComposer, SharedComposite};
pub use configuration::{Configuration, MarkerOverrides, MarkerSpec, SharedConfiguration};
pub use markers::attach_markers;
