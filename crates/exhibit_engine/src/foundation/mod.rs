//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Frame ticking
//! - Cancelable background tasks
//! - Logging utilities

pub mod math;
pub mod time;
pub mod task;
pub mod logging;
