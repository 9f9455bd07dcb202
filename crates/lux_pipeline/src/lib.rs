//! # Lux Pipeline
//!
//! Scene conversion and render-job supervision for a file-hosting render farm.
//!
//! The pipeline turns user-supplied scene descriptions (OSGT scene trees,
//! Wavefront-style OBJ meshes, and an XML rendering descriptor) into the
//! plain-text scene language consumed by the external LuxRender console
//! renderer, then dispatches and supervises render jobs signalled through
//! sibling marker files.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use lux_pipeline::config::PipelineConfig;
//! use lux_pipeline::jobs;
//!
//! fn main() {
//!     lux_pipeline::foundation::logging::init();
//!     let config = PipelineConfig::default();
//!     jobs::watch(&config);
//! }
//! ```

// Foundational utilities
pub mod foundation;

// Input formats: scene trees, meshes, rendering descriptors
pub mod assets;

// Flat path index over a scanned directory tree
pub mod resolver;

// Scene graph and LuxRender scene-language emission
pub mod scene;

// External renderer invocation
pub mod render;

// Marker-file job scheduling
pub mod jobs;

// Configuration loading
pub mod config;

/// Common imports for pipeline users
pub mod prelude {
    pub use crate::{
        assets::{
            descriptor::SceneDescriptor,
            obj::Obj,
            osgt::Osgt,
            ParseError,
        },
        config::{Config, PipelineConfig},
        foundation::math::Vec3,
        jobs::SchedulerError,
        render::RenderError,
        resolver::{ResolveError, Resolver},
        scene::{SceneError, SceneNode},
    };
}
