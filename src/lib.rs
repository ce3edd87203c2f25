//! Landmarks browser: a read-only landmark store, and a map overlay loader
//! that draws each landmark's park outline and marker on a headless map
//! surface.

pub mod bundle;
pub mod color;
pub mod config;
pub mod data;
pub mod detail;
pub mod dispatch;
pub mod errors;
pub mod icon;
pub mod map;
pub mod overlay;
pub mod render;

pub use errors::{Error, ErrorKind, Result};
