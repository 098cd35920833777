//! Scene node capabilities
//!
//! Composition code never depends on a concrete scene representation. It
//! needs three capabilities from whatever holds the nodes: a transform per
//! node, a parent/child hierarchy, and an enabled flag. [`SceneNodes`] bundles
//! them together with node creation.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use thiserror::Error;

use crate::assets::{Model, ModelNode};
use crate::core::MarkerStyle;
use crate::foundation::math::{Transform, Vec3};
use crate::scene::Aabb;

new_key_type! {
    /// Stable handle to a node in a scene
    pub struct NodeId;
}

/// Marker category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerCategory {
    /// Point of interest on the model
    Hotspot,
    /// Navigation point used for teleporting
    Waypoint,
}

/// Payload of a marker node
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Domain identifier (hotspot or waypoint id)
    pub id: String,
    /// Marker category
    pub category: MarkerCategory,
    /// Visual style for the renderer
    pub style: MarkerStyle,
}

/// What a node represents
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Pure grouping node
    Group,
    /// Renderable geometry with local-space bounds
    Mesh {
        /// Local-space bounds of the geometry
        bounds: Aabb,
    },
    /// Positionable marker
    Marker(Marker),
}

/// Scene graph errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    /// Node handle does not exist in this scene
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),

    /// Child already has a parent
    #[error("Node {child:?} is already parented to {parent:?}")]
    AlreadyParented {
        /// The node being attached
        child: NodeId,
        /// Its current parent
        parent: NodeId,
    },

    /// Attaching would create a cycle
    #[error("Node {0:?} cannot become its own ancestor")]
    Cycle(NodeId),
}

/// Nodes with a local transform
pub trait HasTransform {
    /// Local transform of a node
    fn transform(&self, node: NodeId) -> Option<&Transform>;

    /// Replace the local transform of a node
    fn set_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), SceneError>;

    /// Replace only the local position of a node
    fn set_position(&mut self, node: NodeId, position: Vec3) -> Result<(), SceneError>;
}

/// Nodes arranged in a parent/child hierarchy
pub trait HasChildren {
    /// Attach `child` under `parent`
    fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError>;

    /// Parent of a node, if any
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children of a node in attachment order
    fn children(&self, node: NodeId) -> &[NodeId];
}

/// Nodes that can be switched on and off
pub trait HasVisibility {
    /// Whether the node itself is enabled
    fn is_enabled(&self, node: NodeId) -> bool;

    /// Enable or disable a node (and implicitly its subtree)
    fn set_enabled(&mut self, node: NodeId, enabled: bool) -> Result<(), SceneError>;
}

/// Everything composition code needs from a scene
pub trait SceneNodes: HasTransform + HasChildren + HasVisibility {
    /// Create a detached node
    fn spawn(&mut self, name: &str, kind: NodeKind) -> NodeId;

    /// Spawn the node tree of a model instance, returning its detached root
    ///
    /// Takes the instance by value: the spawned nodes are the only copy.
    fn instantiate_model(&mut self, model: Model) -> Result<NodeId, SceneError> {
        spawn_model_node(self, model.root)
    }

    /// Whether a node and all of its ancestors are enabled
    fn is_visible_in_hierarchy(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if !self.is_enabled(id) {
                return false;
            }
            current = self.parent(id);
        }
        true
    }

    /// Transform of a node relative to the top of its hierarchy
    fn world_transform(&self, node: NodeId) -> Option<Transform> {
        let local = *self.transform(node)?;
        match self.parent(node) {
            Some(parent) => Some(self.world_transform(parent)?.combine(&local)),
            None => Some(local),
        }
    }
}

/// Scenes that can report the marker payload of a node
pub trait MarkerLookup {
    /// Marker carried by `node`, if it is a marker node
    fn marker(&self, node: NodeId) -> Option<&Marker>;
}

fn spawn_model_node<S: SceneNodes + ?Sized>(
    scene: &mut S,
    node: ModelNode,
) -> Result<NodeId, SceneError> {
    let kind = match node.bounds {
        Some(bounds) => NodeKind::Mesh { bounds },
        None => NodeKind::Group,
    };
    let id = scene.spawn(&node.name, kind);
    scene.set_transform(id, node.transform)?;
    for child in node.children {
        let child_id = spawn_model_node(scene, child)?;
        scene.add_child(id, child_id)?;
    }
    Ok(id)
}
