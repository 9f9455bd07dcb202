//! Input format parsers
//!
//! Three user-facing formats arrive through the file store: OSGT scene
//! trees (brace-delimited text), Wavefront-style OBJ meshes, and the XML
//! rendering descriptor that ties a scene together.

pub mod descriptor;
pub mod obj;
pub mod osgt;

use thiserror::Error;

/// Errors raised while decoding source files
///
/// Document-level problems are hard failures; per-face mesh index problems
/// degrade with a logged warning instead (see [`obj`]).
#[derive(Error, Debug)]
pub enum ParseError {
    /// Low-level read failure; aborts the parse with partial state discarded
    #[error("failed to read source input: {0}")]
    Io(#[from] std::io::Error),

    /// The descriptor document itself could not be decoded
    #[error("malformed rendering descriptor: {0}")]
    Descriptor(#[from] quick_xml::DeError),

    /// A placed model carries a transform that is not exactly 16 floats
    #[error("model '{path}': transform is not a flat 16-float matrix")]
    BadTransform {
        /// Path of the offending model entry
        path: String,
    },
}
