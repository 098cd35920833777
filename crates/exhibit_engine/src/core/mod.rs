//! Core engine settings

pub mod config;

pub use config::{
    AnimationSettings, MarkerStyle, MarkerStyles, MotionSettings, PoolSettings, RotationSettings,
};
