//! Slot-map backed scene graph
//!
//! The default implementation of [`SceneNodes`]. Nodes live in a
//! `SlotMap`, so handles stay valid for the lifetime of the graph.
//! Nodes are never removed; a graph is dropped as a whole with its owner.

use slotmap::SlotMap;

use crate::foundation::math::{Transform, Vec3};
use crate::scene::node::{
    HasChildren, HasTransform, HasVisibility, Marker, MarkerLookup, NodeId, NodeKind, SceneError,
    SceneNodes,
};

/// A single node
#[derive(Debug, Clone)]
pub struct SceneNode {
    name: String,
    kind: NodeKind,
    transform: Transform,
    enabled: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node payload
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }
}

/// Scene graph owning its nodes
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
}

impl SceneGraph {
    /// Create an empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node
    pub fn node(&self, node: NodeId) -> Option<&SceneNode> {
        self.nodes.get(node)
    }

    /// Nodes of the subtree rooted at `node`, depth first
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut visited = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(scene_node) = self.nodes.get(id) {
                visited.push(id);
                stack.extend(scene_node.children.iter().rev());
            }
        }
        visited
    }

    fn is_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.nodes.get_mut(node).ok_or(SceneError::UnknownNode(node))
    }
}

impl HasTransform for SceneGraph {
    fn transform(&self, node: NodeId) -> Option<&Transform> {
        self.nodes.get(node).map(|n| &n.transform)
    }

    fn set_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), SceneError> {
        self.node_mut(node)?.transform = transform;
        Ok(())
    }

    fn set_position(&mut self, node: NodeId, position: Vec3) -> Result<(), SceneError> {
        self.node_mut(node)?.transform.position = position;
        Ok(())
    }
}

impl HasChildren for SceneGraph {
    fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let child_node = self.nodes.get(child).ok_or(SceneError::UnknownNode(child))?;
        if let Some(existing) = child_node.parent {
            return Err(SceneError::AlreadyParented {
                child,
                parent: existing,
            });
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::Cycle(child));
        }
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(node).map_or(&[], |n| n.children.as_slice())
    }
}

impl HasVisibility for SceneGraph {
    fn is_enabled(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.enabled)
    }

    fn set_enabled(&mut self, node: NodeId, enabled: bool) -> Result<(), SceneError> {
        self.node_mut(node)?.enabled = enabled;
        Ok(())
    }
}

impl SceneNodes for SceneGraph {
    fn spawn(&mut self, name: &str, kind: NodeKind) -> NodeId {
        self.nodes.insert(SceneNode {
            name: name.to_string(),
            kind,
            transform: Transform::identity(),
            enabled: true,
            parent: None,
            children: Vec::new(),
        })
    }
}

impl MarkerLookup for SceneGraph {
    fn marker(&self, node: NodeId) -> Option<&Marker> {
        match self.nodes.get(node)?.kind {
            NodeKind::Marker(ref marker) => Some(marker),
            _ => None,
        }
    }
}
