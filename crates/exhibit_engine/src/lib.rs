//! # Exhibit Engine
//!
//! Scene-side building blocks for interactive 3D exhibits.
//!
//! ## Features
//!
//! - **Prototype Pool**: Bounded LRU cache of loaded models with background
//!   preloading and memory-pressure eviction
//! - **Entity Composition**: Model plus hotspot and waypoint markers under one
//!   root, driven by a plain configuration record
//! - **Rotation**: Drag-to-rotate with damped coasting after release
//! - **Pose Animation**: Eased teleports to waypoints and reset to the
//!   initial pose
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exhibit_engine::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = MotionSettings::load_or_default("motion.toml")?;
//!     let pool = Arc::new(PrototypePool::new(
//!         RonModelLoader::new(["assets"]),
//!         settings.pool.max_prototype_count,
//!     ));
//!     let composer = EntityComposer::with_settings(pool, MarkerStyles::default(), &settings.animation);
//!
//!     let configuration = Configuration::explore_default();
//!     let waypoints = [MarkerSpec::new("bridge", Vec3::new(0.0, 2.0, 10.0))];
//!     let composite = composer.compose(Some(&AssetId::from("ship")), &[], &waypoints, &configuration)?;
//!
//!     let mut session = InteractionSession::new(composite, configuration.clone(), &settings, Arc::new(FrameTicker));
//!     session.teleport_to_waypoint("bridge", &configuration);
//!     session.wait_idle();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;

pub mod assets;
pub mod entity;
pub mod interaction;
pub mod scene;

#[cfg(test)]
mod tests;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{
            AssetError, AssetId, Evictable, MemoryPressureObserver, MemoryPressureSignal, Model,
            PrototypeLoader, PrototypePool, RonModelLoader,
        },
        config::{Config, ConfigError},
        core::{AnimationSettings, MarkerStyles, MotionSettings, PoolSettings, RotationSettings},
        entity::{CompositeEntity, Configuration, EntityComposer, MarkerSpec},
        foundation::{
            math::{Quat, Transform, Vec3},
            time::{FrameTicker, ImmediateTicker, Ticker},
        },
        interaction::{DragSample, InteractionSession, PoseAnimator, PoseTarget, RotationController},
        scene::{Aabb, MarkerCategory, NodeId, SceneError, SceneGraph, SceneNodes},
    };
}
