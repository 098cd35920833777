//! Gesture and animation drivers
//!
//! Everything here runs against shared state: the rotation controller edits a
//! [`SharedConfiguration`](crate::entity::SharedConfiguration), and the pose
//! animator writes poses to any [`PoseTarget`] behind a mutex.

pub mod pose_animator;
pub mod rotation;
pub mod session;
pub mod waypoint;

pub use pose_animator::{PoseAnimator, PoseTarget};
pub use rotation::{drag_angles, release_momentum, DragSample, Momentum, RotationController};
pub use session::InteractionSession;
pub use waypoint::{inferred_waypoint_rotation, resolve_active_waypoint, waypoint_local_transform, waypoint_target_pose};
