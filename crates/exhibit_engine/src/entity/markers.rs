//! Marker attachment

use std::collections::HashMap;

use crate::core::MarkerStyle;
use crate::entity::MarkerSpec;
use crate::scene::{Marker, MarkerCategory, NodeId, NodeKind, SceneError, SceneNodes};

/// Spawn one marker per spec under `group`, returning them keyed by id
///
/// Markers are attached in list order. If an id repeats, the lookup keeps
/// the last marker for it.
pub fn attach_markers<S: SceneNodes>(
    scene: &mut S,
    group: NodeId,
    specs: &[MarkerSpec],
    category: MarkerCategory,
    style: &MarkerStyle,
) -> Result<HashMap<String, NodeId>, SceneError> {
    let mut markers = HashMap::with_capacity(specs.len());
    for spec in specs {
        let node = scene.spawn(
            &spec.id,
            NodeKind::Marker(Marker {
                id: spec.id.clone(),
                category,
                style: *style,
            }),
        );
        scene.set_position(node, spec.position)?;
        scene.add_child(group, node)?;

        if markers.insert(spec.id.clone(), node).is_some() {
            log::warn!("Duplicate {:?} marker id '{}', keeping the last one", category, spec.id);
        }
    }
    Ok(markers)
}
