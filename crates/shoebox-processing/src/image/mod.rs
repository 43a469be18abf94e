//! Pixel transforms on the canonical RGBA buffer.

pub mod orientation;

pub use orientation::{reorient, walk_for, Edge, Walk};
