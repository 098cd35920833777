//! Scene representation
//!
//! Capability traits for scene nodes plus a slot-map backed implementation.

pub mod bounds;
pub mod fit;
pub mod graph;
pub mod node;

pub use bounds::Aabb;
pub use fit::fit_model_transform;
pub use graph::{SceneGraph, SceneNode};
pub use node::{
    HasChildren, HasTransform, HasVisibility, Marker, MarkerCategory, MarkerLookup, NodeId,
    NodeKind, SceneError, SceneNodes,
};
