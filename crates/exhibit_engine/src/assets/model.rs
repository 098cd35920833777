//! Model prototypes
//!
//! A model is a tree of named nodes with local transforms. Leaf geometry is
//! reduced to its local bounds, which is all composition and fitting need.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Transform, Vec3};
use crate::scene::Aabb;

/// Node of a model tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelNode {
    /// Node name
    pub name: String,
    /// Transform relative to the parent node
    #[serde(default)]
    pub transform: Transform,
    /// Local bounds of this node's geometry, if it has any
    #[serde(default)]
    pub bounds: Option<Aabb>,
    /// Child nodes
    #[serde(default)]
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    /// Bounds of this subtree expressed in the frame of `parent`
    fn subtree_bounds(&self, parent: &Transform) -> Option<Aabb> {
        self.bounds_in_frame(&parent.combine(&self.transform))
    }

    /// Bounds of this node's geometry and descendants, with `frame` standing
    /// in for this node's own transform
    fn bounds_in_frame(&self, frame: &Transform) -> Option<Aabb> {
        let own = self.bounds.map(|bounds| bounds.transformed(frame));
        self.children
            .iter()
            .filter_map(|child| child.subtree_bounds(frame))
            .fold(own, |acc, bounds| match acc {
                Some(acc) => Some(acc.union(&bounds)),
                None => Some(bounds),
            })
    }
}

/// Loaded model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Model name
    pub name: String,
    /// Root node
    pub root: ModelNode,
}

impl Model {
    /// Height of the placeholder shape
    pub const PLACEHOLDER_HEIGHT: f32 = 0.6;
    /// Radius of the placeholder shape
    pub const PLACEHOLDER_RADIUS: f32 = 0.08;

    /// Small upright cylinder shown when no real model is available
    pub fn placeholder() -> Self {
        let half_extents = Vec3::new(
            Self::PLACEHOLDER_RADIUS,
            Self::PLACEHOLDER_HEIGHT * 0.5,
            Self::PLACEHOLDER_RADIUS,
        );
        Self {
            name: "placeholder".to_string(),
            root: ModelNode {
                name: "placeholder".to_string(),
                transform: Transform::identity(),
                bounds: Some(Aabb::from_center_extents(Vec3::zeros(), half_extents)),
                children: Vec::new(),
            },
        }
    }

    /// Bounds of all geometry after placing the model with `placement`
    pub fn visual_bounds(&self, placement: &Transform) -> Option<Aabb> {
        self.root.subtree_bounds(placement)
    }

    /// Bounds of all geometry in the root node's own frame
    ///
    /// Ignores the root transform, which is what gets replaced when the
    /// model is fitted into a preview volume.
    pub fn content_bounds(&self) -> Option<Aabb> {
        self.root.bounds_in_frame(&Transform::identity())
    }

    /// Total number of nodes
    pub fn node_count(&self) -> usize {
        fn count(node: &ModelNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }
}
