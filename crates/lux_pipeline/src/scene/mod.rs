//! Scene graph and LuxRender scene-language emission
//!
//! Every node supports exactly one capability: serializing itself into an
//! output sink as the renderer's line-oriented plain-text grammar.
//! Composite nodes own their children outright; the graph is a tree with
//! no shared or cyclic references.
//!
//! Keyword spelling and block ordering are part of the contract with the
//! external renderer; incidental whitespace is not.

pub mod compose;

use crate::assets::obj::{Geode, Obj};
use crate::assets::ParseError;
use crate::foundation::math::{Mat16, Vec3};
use crate::resolver::ResolveError;
use std::collections::HashMap;
use std::io::Write;
use thiserror::Error;

/// Errors raised while composing or serializing a scene
#[derive(Error, Debug)]
pub enum SceneError {
    /// Write failure on the output sink
    #[error("failed to write scene output: {0}")]
    Io(#[from] std::io::Error),

    /// The descriptor's base scene tree could not be resolved
    #[error("unable to locate base scene '{path}': {source}")]
    UnresolvedScene {
        /// The path requested by the descriptor
        path: String,
        /// Underlying resolver miss
        source: ResolveError,
    },

    /// A required input could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A scene-graph node that can emit itself as renderer scene text
pub trait SceneNode {
    /// Serialize this node (and any owned children) into `out`
    fn serialize(&self, out: &mut dyn Write) -> Result<(), SceneError>;
}

/// Verbatim scene text
pub struct Literal(pub String);

impl SceneNode for Literal {
    fn serialize(&self, out: &mut dyn Write) -> Result<(), SceneError> {
        writeln!(out, "\n{}", self.0)?;
        Ok(())
    }
}

/// The default camera-relative distant light, used when a scene declares none
pub fn head_light() -> Literal {
    Literal(
        "AttributeBegin\n\
         CoordSysTransform \"camera\"\n\
         LightSource \"distant\"\n\
         \"point from\" [0 0 0] \"point to\" [0 0 1]\n\
         \"color L\" [3 3 3]\n\
         AttributeEnd"
            .to_string(),
    )
}

/// Children serialized in order; the first failure aborts the sequence
pub struct Sequence(pub Vec<Box<dyn SceneNode>>);

impl SceneNode for Sequence {
    fn serialize(&self, out: &mut dyn Write) -> Result<(), SceneError> {
        for child in &self.0 {
            child.serialize(out)?;
        }
        Ok(())
    }
}

/// Emits `<name>Begin`, the inner node, then `<name>End`
pub struct Wrap {
    /// Block keyword without the Begin/End suffix
    pub name: String,
    /// Wrapped node
    pub inner: Box<dyn SceneNode>,
}

impl SceneNode for Wrap {
    fn serialize(&self, out: &mut dyn Write) -> Result<(), SceneError> {
        writeln!(out, "\n{}Begin", self.name)?;
        self.inner.serialize(out)?;
        writeln!(out, "\n{}End", self.name)?;
        Ok(())
    }
}

/// Fixed-layout camera/film/sampler block opening every scene
pub struct Header {
    /// Camera eye position
    pub eye: Vec3,
    /// Look-at target
    pub center: Vec3,
    /// Up direction
    pub up: Vec3,
    /// Field of view in degrees
    pub fov: f32,
    /// Horizontal resolution
    pub width: u32,
    /// Vertical resolution
    pub height: u32,
    /// Sampler halt condition (samples per pixel), derived from quality
    pub halt_spp: u32,
}

impl SceneNode for Header {
    fn serialize(&self, out: &mut dyn Write) -> Result<(), SceneError> {
        let (e, c, u) = (&self.eye, &self.center, &self.up);
        writeln!(
            out,
            "# Global information\nLookAt {} {} {} {} {} {} {} {} {}",
            e.x, e.y, e.z, c.x, c.y, c.z, u.x, u.y, u.z
        )?;
        writeln!(out, "Camera \"perspective\" \"float fov\" [{}]", self.fov)?;
        writeln!(out, "\nFilm \"fleximage\"")?;
        writeln!(
            out,
            "\"integer xresolution\" [{}] \"integer yresolution\" [{}]",
            self.width, self.height
        )?;
        writeln!(out, "\"integer haltspp\" [{}]", self.halt_spp)?;
        writeln!(
            out,
            "\nPixelFilter \"mitchell\" \"float xwidth\" [2] \"float ywidth\" [2] \"bool supersample\" [\"true\"]"
        )?;
        writeln!(out, "\nSampler \"metropolis\"")?;
        writeln!(out, "\n# Scene specific information")?;
        Ok(())
    }
}

/// Emits a flat 16-float `ConcatTransform`
pub struct Transform(pub Mat16);

impl SceneNode for Transform {
    fn serialize(&self, out: &mut dyn Write) -> Result<(), SceneError> {
        write!(out, "\nConcatTransform [")?;
        for v in self.0 {
            write!(out, " {v}")?;
        }
        writeln!(out, " ]")?;
        Ok(())
    }
}

/// Wrap `node` in `TransformBegin`/`TransformEnd` applying `transform` first
pub fn transformed(transform: Mat16, node: Box<dyn SceneNode>) -> Wrap {
    Wrap {
        name: "Transform".to_string(),
        inner: Box::new(Sequence(vec![Box::new(Transform(transform)), node])),
    }
}

/// A point light at a fixed position
pub struct PointLight {
    /// Light position
    pub position: Vec3,
}

impl SceneNode for PointLight {
    fn serialize(&self, out: &mut dyn Write) -> Result<(), SceneError> {
        let p = &self.position;
        writeln!(
            out,
            "\nAttributeBegin\nLightSource \"point\"\n\"point from\" [{} {} {}]\n\"color L\" [3 3 3]\n\"float gain\" [100]\nAttributeEnd",
            p.x, p.y, p.z
        )?;
        Ok(())
    }
}

/// A spherical area light
pub struct AreaLight {
    /// Sphere radius
    pub size: f32,
    /// Light position
    pub position: Vec3,
}

impl SceneNode for AreaLight {
    fn serialize(&self, out: &mut dyn Write) -> Result<(), SceneError> {
        let p = &self.position;
        writeln!(out, "\nAttributeBegin")?;
        writeln!(out, "Translate {} {} {}", p.x, p.y, p.z)?;
        writeln!(out, "LightGroup \"default\"")?;
        writeln!(out, "AreaLightSource \"area\"")?;
        writeln!(out, "\"float importance\" [1]")?;
        writeln!(out, "\"float power\" [100]")?;
        writeln!(out, "\"float efficacy\" [17]")?;
        writeln!(out, "\"color L\" [0.8 0.8 0.8]")?;
        writeln!(out, "\"integer nsamples\" [1]")?;
        writeln!(out, "\"float gain\" [1]")?;
        writeln!(out, "Shape \"sphere\" \"float radius\" [{}]", self.size)?;
        writeln!(out, "AttributeEnd")?;
        Ok(())
    }
}

/// A named glossy material backed by an image map texture
pub struct NamedMaterial {
    /// Material name referenced by textured meshes
    pub name: String,
    /// Resolved image file path
    pub file: String,
}

impl SceneNode for NamedMaterial {
    fn serialize(&self, out: &mut dyn Write) -> Result<(), SceneError> {
        writeln!(out, "\nTexture \"{}_\" \"color\" \"imagemap\"", self.name)?;
        writeln!(out, "\"string filename\" [\"{}\"]", self.file)?;
        writeln!(out, "\"string wrap\" [\"repeat\"]")?;
        writeln!(out, "\"float gamma\" [2.2]")?;
        writeln!(out, "\nMakeNamedMaterial \"{}\"", self.name)?;
        writeln!(out, "\"bool multibounce\" [\"false\"]")?;
        writeln!(out, "\"texture Kd\" [\"{}_\"]", self.name)?;
        writeln!(out, "\"color Ks\" [0.34237525 0.64237525 0.34237525]")?;
        writeln!(out, "\"float index\" [0]")?;
        writeln!(out, "\"float uroughness\" [0.25]")?;
        writeln!(out, "\"float vroughness\" [0.25]")?;
        writeln!(out, "\"string type\" [\"glossy\"]")?;
        Ok(())
    }
}

/// A mesh that references a previously declared [`NamedMaterial`]
pub struct TexturedMesh {
    /// Name of the material to apply
    pub material: String,
    /// Compacted vertex positions
    pub points: Vec<[f32; 3]>,
    /// Per-vertex texture coordinates, same length as `points`
    pub uvs: Vec<[f32; 2]>,
    /// 0-based triangle indices into the compacted arrays
    pub triangles: Vec<usize>,
}

impl SceneNode for TexturedMesh {
    fn serialize(&self, out: &mut dyn Write) -> Result<(), SceneError> {
        writeln!(out, "\nAttributeBegin")?;
        writeln!(out, "NamedMaterial \"{}\"", self.material)?;
        writeln!(out, "Shape \"mesh\"")?;
        write_float_array(out, "point P", self.points.iter().flatten())?;
        write_float_array(out, "float uv", self.uvs.iter().flatten())?;
        write_index_array(out, &self.triangles)?;
        writeln!(out, "AttributeEnd")?;
        Ok(())
    }
}

/// Full scene: header, then the body wrapped in `WorldBegin`/`WorldEnd`
pub struct World {
    /// Camera/film/sampler header
    pub head: Header,
    /// World body: lights, static geometry, placed objects
    pub rest: Box<dyn SceneNode>,
}

impl SceneNode for World {
    fn serialize(&self, out: &mut dyn Write) -> Result<(), SceneError> {
        self.head.serialize(out)?;
        writeln!(out, "\nWorldBegin")?;
        self.rest.serialize(out)?;
        writeln!(out, "\nWorldEnd")?;
        Ok(())
    }
}

/// Per-geode geometry compacted to 0-based arrays for emission
struct CompactMesh {
    normals: Vec<[f32; 3]>,
    points: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    triangles: Vec<usize>,
}

/// Remap one geode's 1-based face indices to compacted per-mesh arrays
///
/// Faces are fan-triangulated as `(0, i, i+1)`. Each referenced triple is
/// deduplicated by its original vertex index; an out-of-range reference
/// logs a warning and substitutes compacted index 0 so the geode still
/// emits.
fn compact_geode(mesh: &Obj, geode: &Geode) -> CompactMesh {
    let mut lm = CompactMesh {
        normals: Vec::new(),
        points: Vec::new(),
        uvs: Vec::new(),
        triangles: Vec::new(),
    };
    let mut old_to_new: HashMap<usize, usize> = HashMap::new();

    for face in &geode.faces {
        for i in 1..face.len().saturating_sub(1) {
            for corner in [0, i, i + 1] {
                let fv = face[corner];
                let old_vertex = fv.vertex.wrapping_sub(1);
                if let Some(&new_index) = old_to_new.get(&old_vertex) {
                    lm.triangles.push(new_index);
                    continue;
                }
                let old_normal = fv.normal.wrapping_sub(1);
                let old_uv = fv.uv.checked_sub(1);
                let uv_in_range = old_uv.map_or(true, |t| t < mesh.uvs.len());
                if old_vertex >= mesh.vertices.len()
                    || old_normal >= mesh.normals.len()
                    || !uv_in_range
                {
                    lm.triangles.push(0);
                    log::warn!(
                        "geode '{}': face reference {:?} out of range (V:{} N:{} T:{})",
                        geode.name,
                        fv,
                        mesh.vertices.len(),
                        mesh.normals.len(),
                        mesh.uvs.len()
                    );
                    continue;
                }
                let new_index = lm.points.len();
                old_to_new.insert(old_vertex, new_index);
                lm.points.push(mesh.vertices[old_vertex]);
                lm.normals.push(mesh.normals[old_normal]);
                lm.uvs.push(old_uv.map_or([0.0, 0.0], |t| mesh.uvs[t]));
                lm.triangles.push(new_index);
            }
        }
    }
    lm
}

impl SceneNode for Obj {
    /// Emit each geode as an untextured `Shape "mesh"` block
    fn serialize(&self, out: &mut dyn Write) -> Result<(), SceneError> {
        for geode in &self.geodes {
            let lm = compact_geode(self, geode);
            writeln!(out, "\nAttributeBegin")?;
            writeln!(out, "Shape \"mesh\"")?;
            write_float_array(out, "normal N", lm.normals.iter().flatten())?;
            write_float_array(out, "point P", lm.points.iter().flatten())?;
            write_float_array(out, "float uv", lm.uvs.iter().flatten())?;
            write_index_array(out, &lm.triangles)?;
            writeln!(out, "AttributeEnd")?;
        }
        Ok(())
    }
}

fn write_float_array<'a>(
    out: &mut dyn Write,
    keyword: &str,
    values: impl Iterator<Item = &'a f32>,
) -> Result<(), SceneError> {
    write!(out, "\"{keyword}\" [")?;
    for v in values {
        write!(out, " {v}")?;
    }
    writeln!(out, " ]")?;
    Ok(())
}

fn write_index_array(out: &mut dyn Write, indices: &[usize]) -> Result<(), SceneError> {
    write!(out, "\"integer triindices\" [")?;
    for t in indices {
        write!(out, " {t}")?;
    }
    writeln!(out, " ]")?;
    Ok(())
}
