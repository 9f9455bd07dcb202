//! Math types for scene placement
//!
//! Thin aliases over nalgebra; the pipeline only moves geometry around,
//! it never solves anything.

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Flat 16-float row-major transform, as carried by scene descriptors
pub type Mat16 = [f32; 16];
