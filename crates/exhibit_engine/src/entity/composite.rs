//! Composite exhibit entities
//!
//! A [`CompositeEntity`] owns one model instance plus two marker groups
//! (hotspots and waypoints) under a common root node. Construction captures
//! every marker's original position; later configuration updates only ever
//! choose between an override and that original.
//!
//! Hierarchy built by [`EntityComposer`]:
//!
//! ```text
//! root
//! ├── model instance
//! ├── hotspots
//! │   └── one marker per hotspot
//! └── waypoints
//!     └── one marker per waypoint
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::assets::{AssetId, Model, PrototypeLoader, PrototypePool};
use crate::core::{AnimationSettings, MarkerStyles};
use crate::entity::markers::attach_markers;
use crate::entity::{Configuration, MarkerSpec};
use crate::foundation::math::{utils, Quat, Transform, Vec3};
use crate::interaction::PoseTarget;
use crate::scene::{
    fit_model_transform, Aabb, Marker, MarkerCategory, MarkerLookup, NodeId, NodeKind, SceneError,
    SceneGraph, SceneNodes,
};

/// Composite shared between the host and background animation tasks
pub type SharedComposite<S = SceneGraph> = Arc<Mutex<CompositeEntity<S>>>;

/// In-progress animated configuration update
#[derive(Debug, Clone, Copy)]
struct PoseTransition {
    from: Transform,
    to: Transform,
    elapsed: f32,
    duration: f32,
}

impl PoseTransition {
    fn advance(&mut self, delta_secs: f32) -> (Transform, bool) {
        self.elapsed += delta_secs.max(0.0);
        let progress = (self.elapsed / self.duration).min(1.0);
        let pose = Transform::interpolate(&self.from, &self.to, utils::smoothstep(progress));
        (pose, progress >= 1.0)
    }
}

/// Model instance with hotspot and waypoint markers
#[derive(Debug)]
pub struct CompositeEntity<S: SceneNodes = SceneGraph> {
    scene: S,
    root: NodeId,
    model: NodeId,
    model_bounds: Option<Aabb>,
    is_placeholder: bool,
    hotspot_root: NodeId,
    waypoint_root: NodeId,
    hotspots: HashMap<String, NodeId>,
    waypoints: HashMap<String, NodeId>,
    hotspot_origins: HashMap<String, Vec3>,
    waypoint_origins: HashMap<String, Vec3>,
    transition_secs: f32,
    transition: Option<PoseTransition>,
}

impl<S: SceneNodes> CompositeEntity<S> {
    /// Root node of the composite
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Root node of the model instance
    pub fn model_node(&self) -> NodeId {
        self.model
    }

    /// Group node holding the hotspot markers
    pub fn hotspot_root(&self) -> NodeId {
        self.hotspot_root
    }

    /// Group node holding the waypoint markers
    pub fn waypoint_root(&self) -> NodeId {
        self.waypoint_root
    }

    /// Whether the model is the fallback placeholder
    pub fn is_placeholder(&self) -> bool {
        self.is_placeholder
    }

    /// Scene holding the composite's nodes
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Mutable access to the scene, for host-side nodes
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    /// Marker node for a hotspot id
    pub fn hotspot_node(&self, id: &str) -> Option<NodeId> {
        self.hotspots.get(id).copied()
    }

    /// Marker node for a waypoint id
    pub fn waypoint_node(&self, id: &str) -> Option<NodeId> {
        self.waypoints.get(id).copied()
    }

    /// Ids of all markers in a category
    pub fn marker_ids(&self, category: MarkerCategory) -> impl Iterator<Item = &str> {
        self.markers(category).keys().map(String::as_str)
    }

    /// Position a marker had when the composite was built
    pub fn original_position(&self, category: MarkerCategory, id: &str) -> Option<Vec3> {
        self.origins(category).get(id).copied()
    }

    /// Current local position of a marker
    pub fn marker_position(&self, category: MarkerCategory, id: &str) -> Option<Vec3> {
        let node = self.markers(category).get(id)?;
        self.scene.transform(*node).map(|transform| transform.position)
    }

    /// Position a waypoint takes under `configuration`
    pub fn resolved_waypoint_position(&self, id: &str, configuration: &Configuration) -> Option<Vec3> {
        configuration
            .waypoint_override(id)
            .or_else(|| self.waypoint_origins.get(id).copied())
    }

    /// Attach the composite root under a host node
    ///
    /// Only attached composites animate configuration updates.
    pub fn attach_to(&mut self, parent: NodeId) -> Result<(), SceneError> {
        self.scene.add_child(parent, self.root)
    }

    /// Whether the composite root has a parent
    pub fn has_parent(&self) -> bool {
        self.scene.parent(self.root).is_some()
    }

    /// Whether an animated configuration update is in progress
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Apply a configuration
    ///
    /// Markers are refreshed first. The root then moves to the configured
    /// pose: smoothly via [`advance`](Self::advance) when `animate` is set
    /// and the composite is attached, immediately otherwise. A configuration
    /// whose pose is degenerate (zero or non-finite scale, non-finite
    /// angles or position) leaves the root pose untouched.
    ///
    /// # Panics
    ///
    /// See [`update_markers`](Self::update_markers).
    pub fn update(&mut self, configuration: &Configuration, animate: bool) -> Result<(), SceneError> {
        self.update_markers(configuration)?;

        let target = configuration.target_transform();
        if !target.is_well_formed() {
            log::debug!("Skipping degenerate pose update (scale {})", configuration.scale);
            return Ok(());
        }

        if animate && self.has_parent() {
            self.transition = Some(PoseTransition {
                from: self.pose(),
                to: target,
                elapsed: 0.0,
                duration: self.transition_secs,
            });
            Ok(())
        } else {
            self.set_pose(target)
        }
    }

    /// Apply marker visibility and positions without touching the root pose
    ///
    /// Each marker takes its three-component override when present and its
    /// original position otherwise.
    ///
    /// # Panics
    ///
    /// Panics if a marker has no captured original position. Construction
    /// records one for every marker, so this indicates a broken composite.
    pub fn update_markers(&mut self, configuration: &Configuration) -> Result<(), SceneError> {
        self.scene.set_enabled(self.hotspot_root, configuration.shows_hotspots)?;
        self.scene.set_enabled(self.waypoint_root, configuration.shows_waypoints)?;

        for (id, node) in &self.hotspots {
            let position = configuration
                .hotspot_override(id)
                .unwrap_or_else(|| original_or_panic(&self.hotspot_origins, MarkerCategory::Hotspot, id));
            self.scene.set_position(*node, position)?;
        }
        for (id, node) in &self.waypoints {
            let position = configuration
                .waypoint_override(id)
                .unwrap_or_else(|| original_or_panic(&self.waypoint_origins, MarkerCategory::Waypoint, id));
            self.scene.set_position(*node, position)?;
        }
        Ok(())
    }

    /// Step an animated configuration update by `delta_secs`
    ///
    /// Returns whether the transition is still running afterwards.
    pub fn advance(&mut self, delta_secs: f32) -> Result<bool, SceneError> {
        let Some(transition) = self.transition.as_mut() else {
            return Ok(false);
        };
        let (pose, finished) = transition.advance(delta_secs);
        if finished {
            self.transition = None;
        }
        self.scene.set_transform(self.root, pose)?;
        Ok(!finished)
    }

    /// Fit the model into a preview volume
    ///
    /// Returns `false` and leaves the model untouched when the volume or the
    /// model bounds are degenerate.
    pub fn fit_model(&mut self, container_size: Vec3, orientation: Quat) -> Result<bool, SceneError> {
        let Some(bounds) = self.model_bounds else {
            return Ok(false);
        };
        match fit_model_transform(container_size, &bounds, orientation) {
            Some(transform) => {
                self.scene.set_transform(self.model, transform)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The marker a node represents, if any (used for hit testing)
    pub fn marker_at(&self, node: NodeId) -> Option<&Marker>
    where
        S: MarkerLookup,
    {
        self.scene.marker(node)
    }

    fn markers(&self, category: MarkerCategory) -> &HashMap<String, NodeId> {
        match category {
            MarkerCategory::Hotspot => &self.hotspots,
            MarkerCategory::Waypoint => &self.waypoints,
        }
    }

    fn origins(&self, category: MarkerCategory) -> &HashMap<String, Vec3> {
        match category {
            MarkerCategory::Hotspot => &self.hotspot_origins,
            MarkerCategory::Waypoint => &self.waypoint_origins,
        }
    }
}

fn original_or_panic(origins: &HashMap<String, Vec3>, category: MarkerCategory, id: &str) -> Vec3 {
    match origins.get(id) {
        Some(position) => *position,
        None => panic!("Missing original {category:?} position for id: {id}"),
    }
}

impl<S: SceneNodes> PoseTarget for CompositeEntity<S> {
    fn pose(&self) -> Transform {
        self.scene.transform(self.root).copied().unwrap_or_default()
    }

    /// Immediate pose writes replace any animated update in progress
    fn set_pose(&mut self, pose: Transform) -> Result<(), SceneError> {
        self.transition = None;
        self.scene.set_transform(self.root, pose)
    }
}

/// Builds composites from pooled prototypes
pub struct EntityComposer<L: PrototypeLoader<Prototype = Model>> {
    pool: Arc<PrototypePool<L>>,
    styles: MarkerStyles,
    transition_secs: f32,
}

impl<L: PrototypeLoader<Prototype = Model>> Clone for EntityComposer<L> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            styles: self.styles,
            transition_secs: self.transition_secs,
        }
    }
}

impl<L: PrototypeLoader<Prototype = Model>> EntityComposer<L> {
    /// Create a composer with default marker styles and timings
    pub fn new(pool: Arc<PrototypePool<L>>) -> Self {
        Self::with_settings(pool, MarkerStyles::default(), &AnimationSettings::default())
    }

    /// Create a composer with explicit marker styles and timings
    pub fn with_settings(
        pool: Arc<PrototypePool<L>>,
        styles: MarkerStyles,
        animation: &AnimationSettings,
    ) -> Self {
        Self {
            pool,
            styles,
            transition_secs: animation.update_transition_secs,
        }
    }

    /// Pool backing this composer
    pub fn pool(&self) -> &Arc<PrototypePool<L>> {
        &self.pool
    }

    /// Build a composite in a fresh [`SceneGraph`]
    ///
    /// Blocks while the prototype loads; call it off the frame loop.
    pub fn compose(
        &self,
        asset: Option<&AssetId>,
        hotspots: &[MarkerSpec],
        waypoints: &[MarkerSpec],
        configuration: &Configuration,
    ) -> Result<CompositeEntity, SceneError> {
        self.compose_in(SceneGraph::new(), asset, hotspots, waypoints, configuration)
    }

    /// Build a composite inside `scene`
    ///
    /// A missing asset id or a failed load yields the placeholder model, so
    /// a composite is always produced.
    pub fn compose_in<S: SceneNodes>(
        &self,
        mut scene: S,
        asset: Option<&AssetId>,
        hotspots: &[MarkerSpec],
        waypoints: &[MarkerSpec],
        configuration: &Configuration,
    ) -> Result<CompositeEntity<S>, SceneError> {
        let (model, is_placeholder) = self.resolve_model(asset);
        let model_bounds = model.content_bounds();

        let root = scene.spawn("exhibit", NodeKind::Group);
        let model = scene.instantiate_model(model)?;
        let hotspot_root = scene.spawn("hotspots", NodeKind::Group);
        let waypoint_root = scene.spawn("waypoints", NodeKind::Group);

        let hotspot_nodes = attach_markers(
            &mut scene,
            hotspot_root,
            hotspots,
            MarkerCategory::Hotspot,
            &self.styles.hotspot,
        )?;
        let waypoint_nodes = attach_markers(
            &mut scene,
            waypoint_root,
            waypoints,
            MarkerCategory::Waypoint,
            &self.styles.waypoint,
        )?;

        scene.add_child(root, model)?;
        scene.add_child(root, hotspot_root)?;
        scene.add_child(root, waypoint_root)?;

        let mut composite = CompositeEntity {
            scene,
            root,
            model,
            model_bounds,
            is_placeholder,
            hotspot_root,
            waypoint_root,
            hotspots: hotspot_nodes,
            waypoints: waypoint_nodes,
            hotspot_origins: origins(hotspots),
            waypoint_origins: origins(waypoints),
            transition_secs: self.transition_secs,
            transition: None,
        };
        composite.update(configuration, false)?;

        log::debug!(
            "Composed exhibit with {} hotspots and {} waypoints{}",
            composite.hotspots.len(),
            composite.waypoints.len(),
            if is_placeholder { " (placeholder model)" } else { "" }
        );
        Ok(composite)
    }

    fn resolve_model(&self, asset: Option<&AssetId>) -> (Model, bool) {
        let Some(id) = asset else {
            log::debug!("No model asset, using placeholder");
            return (Model::placeholder(), true);
        };
        match self.pool.instance(id) {
            Some(model) => (model, false),
            None => {
                log::warn!("Model '{}' unavailable, using placeholder", id);
                (Model::placeholder(), true)
            }
        }
    }
}

/// Last position per id, matching the marker lookup
fn origins(specs: &[MarkerSpec]) -> HashMap<String, Vec3> {
    specs
        .iter()
        .map(|spec| (spec.id.clone(), spec.position))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetError;
    use crate::scene::{HasChildren, HasTransform, HasVisibility};
    use approx::assert_relative_eq;

    struct FixedLoader;

    impl PrototypeLoader for FixedLoader {
        type Prototype = Model;

        fn load_prototype(&self, id: &AssetId) -> Result<Model, AssetError> {
            if id.as_str() != "hull" {
                return Err(AssetError::NotFound(id.clone()));
            }
            let mut model = Model::placeholder();
            model.name = "hull".to_string();
            model.root.name = "hull".to_string();
            model.root.bounds = Some(Aabb::new(Vec3::new(-1.0, -0.5, -4.0), Vec3::new(1.0, 0.5, 4.0)));
            Ok(model)
        }
    }

    fn composer() -> EntityComposer<FixedLoader> {
        EntityComposer::new(Arc::new(PrototypePool::new(FixedLoader, 2)))
    }

    fn hotspots() -> Vec<MarkerSpec> {
        vec![
            MarkerSpec::new("h1", Vec3::zeros()),
            MarkerSpec::new("h2", Vec3::new(0.0, 1.0, 2.0)),
        ]
    }

    fn waypoints() -> Vec<MarkerSpec> {
        vec![MarkerSpec::new("w1", Vec3::new(3.0, 0.0, 4.0))]
    }

    fn compose(configuration: &Configuration) -> CompositeEntity {
        composer()
            .compose(Some(&AssetId::from("hull")), &hotspots(), &waypoints(), configuration)
            .unwrap()
    }

    #[test]
    fn test_compose_builds_hierarchy() {
        let composite = compose(&Configuration::default());
        let scene = composite.scene();

        assert!(!composite.is_placeholder());
        assert_eq!(
            scene.children(composite.root()),
            &[composite.model_node(), composite.hotspot_root(), composite.waypoint_root()]
        );
        assert_eq!(scene.children(composite.hotspot_root()).len(), 2);
        assert_eq!(scene.children(composite.waypoint_root()).len(), 1);

        let w1 = composite.waypoint_node("w1").unwrap();
        assert_eq!(
            composite.marker_at(w1).map(|marker| marker.category),
            Some(MarkerCategory::Waypoint)
        );
        assert!(composite.marker_at(composite.model_node()).is_none());
    }

    #[test]
    fn test_failed_load_uses_placeholder() {
        let composite = composer()
            .compose(Some(&AssetId::from("missing")), &hotspots(), &[], &Configuration::default())
            .unwrap();
        assert!(composite.is_placeholder());
        assert_eq!(composite.scene().node(composite.model_node()).map(|n| n.name()), Some("placeholder"));

        let no_asset = composer().compose(None, &[], &[], &Configuration::default()).unwrap();
        assert!(no_asset.is_placeholder());
    }

    #[test]
    fn test_initial_configuration_applied() {
        let configuration = Configuration::explore_default();
        let composite = compose(&configuration);

        assert_eq!(composite.pose(), configuration.target_transform());
        assert!(composite.scene().is_enabled(composite.hotspot_root()));
    }

    #[test]
    fn test_override_and_restore() {
        let mut composite = compose(&Configuration::default());

        let mut configuration = Configuration::default();
        configuration.hotspot_overrides.insert("h1".to_string(), vec![1.0, 2.0, 3.0]);
        composite.update_markers(&configuration).unwrap();
        assert_eq!(
            composite.marker_position(MarkerCategory::Hotspot, "h1"),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );

        configuration.hotspot_overrides.remove("h1");
        composite.update_markers(&configuration).unwrap();
        assert_eq!(composite.marker_position(MarkerCategory::Hotspot, "h1"), Some(Vec3::zeros()));
    }

    #[test]
    fn test_malformed_override_ignored() {
        let mut composite = compose(&Configuration::default());
        let mut configuration = Configuration::default();
        configuration.waypoint_overrides.insert("w1".to_string(), vec![9.0, 9.0]);
        configuration.waypoint_overrides.insert("unknown".to_string(), vec![1.0, 1.0, 1.0]);

        composite.update_markers(&configuration).unwrap();
        assert_eq!(
            composite.marker_position(MarkerCategory::Waypoint, "w1"),
            Some(Vec3::new(3.0, 0.0, 4.0))
        );
    }

    #[test]
    fn test_update_markers_is_idempotent() {
        let mut composite = compose(&Configuration::default());
        let mut configuration = Configuration::default();
        configuration.hotspot_overrides.insert("h2".to_string(), vec![5.0, 5.0, 5.0]);
        configuration.shows_waypoints = false;

        composite.update_markers(&configuration).unwrap();
        let once: Vec<_> = ["h1", "h2"]
            .iter()
            .map(|id| composite.marker_position(MarkerCategory::Hotspot, id))
            .collect();
        composite.update_markers(&configuration).unwrap();
        let twice: Vec<_> = ["h1", "h2"]
            .iter()
            .map(|id| composite.marker_position(MarkerCategory::Hotspot, id))
            .collect();

        assert_eq!(once, twice);
        assert!(!composite.scene().is_enabled(composite.waypoint_root()));
    }

    #[test]
    fn test_degenerate_scale_keeps_previous_pose() {
        let mut composite = compose(&Configuration::explore_default());
        let before = composite.pose();

        let mut configuration = Configuration::explore_default();
        configuration.scale = 0.0;
        configuration.shows_hotspots = false;
        composite.update(&configuration, false).unwrap();

        assert_eq!(composite.pose(), before);
        assert!(!composite.scene().is_enabled(composite.hotspot_root()));
    }

    #[test]
    fn test_animated_update_requires_parent() {
        let mut composite = compose(&Configuration::default());
        let target = Configuration::immersive_default();

        composite.update(&target, true).unwrap();
        assert!(!composite.is_transitioning());
        assert_eq!(composite.pose(), target.target_transform());
    }

    #[test]
    fn test_animated_update_moves_over_transition() {
        let mut composite = compose(&Configuration::default());
        let anchor = composite.scene_mut().spawn("anchor", NodeKind::Group);
        composite.attach_to(anchor).unwrap();
        assert!(composite.has_parent());

        let start = composite.pose();
        let target = Configuration::immersive_default();
        composite.update(&target, true).unwrap();
        assert!(composite.is_transitioning());
        assert_eq!(composite.pose(), start);

        assert!(composite.advance(0.125).unwrap());
        let halfway = composite.pose();
        assert_relative_eq!(halfway.scale.x, 0.56, epsilon = 1e-5);

        assert!(!composite.advance(0.125).unwrap());
        assert_eq!(composite.pose(), target.target_transform());
        assert!(!composite.advance(0.1).unwrap());
    }

    #[test]
    fn test_immediate_write_cancels_transition() {
        let mut composite = compose(&Configuration::default());
        let anchor = composite.scene_mut().spawn("anchor", NodeKind::Group);
        composite.attach_to(anchor).unwrap();

        composite.update(&Configuration::immersive_default(), true).unwrap();
        let pinned = Transform::from_position(Vec3::new(0.0, 0.0, -3.0));
        composite.set_pose(pinned).unwrap();

        assert!(!composite.is_transitioning());
        assert!(!composite.advance(0.1).unwrap());
        assert_eq!(composite.scene().transform(composite.root()).copied(), Some(pinned));
    }

    #[test]
    fn test_resolved_waypoint_position_honours_override() {
        let composite = compose(&Configuration::default());
        let mut configuration = Configuration::default();
        assert_eq!(
            composite.resolved_waypoint_position("w1", &configuration),
            Some(Vec3::new(3.0, 0.0, 4.0))
        );

        configuration.waypoint_overrides.insert("w1".to_string(), vec![0.0, 1.0, 0.0]);
        assert_eq!(
            composite.resolved_waypoint_position("w1", &configuration),
            Some(Vec3::new(0.0, 1.0, 0.0))
        );
        assert_eq!(composite.resolved_waypoint_position("nope", &configuration), None);
    }

    #[test]
    #[should_panic(expected = "Missing original")]
    fn test_missing_original_position_is_fatal() {
        original_or_panic(&HashMap::new(), MarkerCategory::Hotspot, "h9");
    }

    #[test]
    fn test_fit_model_sets_model_transform() {
        let mut composite = compose(&Configuration::preview_default());
        assert!(composite.fit_model(Vec3::new(0.5, 0.5, 0.5), Quat::identity()).unwrap());

        let fitted = composite.scene().transform(composite.model_node()).copied().unwrap();
        assert_relative_eq!(fitted.scale, Vec3::repeat(0.25), epsilon = 1e-6);
        assert_relative_eq!(fitted.position.z, -1.0, epsilon = 1e-6);

        assert!(!composite.fit_model(Vec3::zeros(), Quat::identity()).unwrap());
        assert_eq!(composite.scene().transform(composite.model_node()).copied(), Some(fitted));
    }
}
