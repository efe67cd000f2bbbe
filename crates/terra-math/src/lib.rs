//! Small geometry primitives shared across the terra crates.

mod aabb;

pub use aabb::Aabb2;
