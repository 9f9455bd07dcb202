//! Full-scene composition
//!
//! Turns parsed inputs (rendering descriptor, OSGT scene tree, OBJ models)
//! into an owned scene graph rooted at a [`World`]. Composition resolves
//! every referenced file eagerly, so serialization afterwards can only fail
//! on the output sink.
//!
//! Leniency is deliberately asymmetric: the base scene tree is required
//! (hard failure), while individual placed models and textures degrade to
//! a logged warning and a skip.

use super::{
    head_light, Header, NamedMaterial, PointLight, SceneError, SceneNode, Sequence, TexturedMesh,
    Transform, World, Wrap,
};
use crate::assets::descriptor::SceneDescriptor;
use crate::assets::obj::{read_floats, Obj};
use crate::assets::osgt::Osgt;
use crate::foundation::math::{Mat16, Vec3};
use crate::resolver::Resolver;
use std::collections::HashSet;

/// Axis correction reconciling the authoring tool's Z-up convention with
/// the renderer's
pub const OSG_AXIS_FIX: Mat16 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, -1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Texture applied to tree geometry when a geode names no image
pub const DEFAULT_TEXTURE: &str = "Resources/WallTexture4.tga";

/// Acceptable output resolution range; anything outside becomes [`CLAMPED_RESOLUTION`]
pub const RESOLUTION_RANGE: (i32, i32) = (50, 1000);

/// Replacement dimension for out-of-range resolution requests
pub const CLAMPED_RESOLUTION: u32 = 150;

/// Knobs that alter composition without touching the descriptor
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    /// Force a small fixed resolution for fast iteration, overriding the
    /// descriptor's display settings
    pub preview: bool,
}

/// Clamp a requested dimension into the renderable range
///
/// Values outside `[50, 1000]` are rewritten to 150 with a logged warning.
pub fn clamp_dimension(requested: i32) -> u32 {
    if requested < RESOLUTION_RANGE.0 || requested > RESOLUTION_RANGE.1 {
        log::warn!("incorrect resolution {requested}; changed to {CLAMPED_RESOLUTION}");
        CLAMPED_RESOLUTION
    } else {
        // In-range values are non-negative by construction
        requested.unsigned_abs()
    }
}

/// Convert tree geometry into textured mesh nodes
///
/// Every subtree under a `"Geode"` key must hold exactly one `"VertexData"`
/// with one `"Array"` and one `"TexCoordData"` with one `"Array"` of equal
/// length; geodes failing any condition are skipped with a warning, never
/// failing the batch. Texture images come from an optional `"Image"` child
/// and are resolved through `files` when one is supplied; each distinct
/// material is declared at most once per output.
pub fn osgt_geometry(tree: &Osgt, files: Option<&Resolver>) -> Sequence {
    let mut nodes: Vec<Box<dyn SceneNode>> = Vec::new();
    let geodes = tree.find("Geode");
    if geodes.is_empty() {
        log::warn!("no geodes found in scene tree");
    }

    let mut known_materials: HashSet<String> = HashSet::new();

    for geode in geodes {
        let vertex_data = geode.find("VertexData");
        if vertex_data.len() != 1 {
            log::warn!("skipping geode: expected one VertexData, found {}", vertex_data.len());
            continue;
        }
        let arrays = vertex_data[0].find("Array");
        if arrays.len() != 1 {
            log::warn!("skipping geode: expected one vertex Array, found {}", arrays.len());
            continue;
        }
        let tex_data = geode.find("TexCoordData");
        if tex_data.len() != 1 {
            log::warn!("skipping geode: expected one TexCoordData, found {}", tex_data.len());
            continue;
        }
        let tex_arrays = tex_data[0].find("Array");
        if tex_arrays.len() != 1 {
            log::warn!("skipping geode: expected one texture Array, found {}", tex_arrays.len());
            continue;
        }
        let vertex_entries = &arrays[0].entries;
        let tex_entries = &tex_arrays[0].entries;
        if vertex_entries.len() != tex_entries.len() {
            log::warn!(
                "skipping geode: {} texture coordinates for {} vertices",
                tex_entries.len(),
                vertex_entries.len()
            );
            continue;
        }

        let mut material_image = DEFAULT_TEXTURE.to_string();
        let images = geode.find("Image");
        if images.len() == 1 {
            match images[0]
                .find_key("FileName")
                .and_then(|key| key.split('"').nth(1))
            {
                Some(name) => material_image = name.to_string(),
                None => log::warn!("unable to extract texture name from Image block"),
            }
        }

        if let Some(files) = files {
            match files.get(&material_image) {
                Ok(resolved) => material_image = resolved.to_string(),
                Err(err) => log::warn!("unable to look up texture {material_image}: {err}"),
            }
        }
        log::debug!("using material {material_image}");

        if known_materials.insert(material_image.clone()) {
            nodes.push(Box::new(NamedMaterial {
                name: material_image.clone(),
                file: material_image.clone(),
            }));
        }

        let points: Vec<[f32; 3]> = vertex_entries.iter().map(|e| read_floats(&e.key)).collect();
        let uvs: Vec<[f32; 2]> = tex_entries.iter().map(|e| read_floats(&e.key)).collect();
        let mut triangles = Vec::new();
        for i in 1..points.len().saturating_sub(1) {
            triangles.extend([0, i, i + 1]);
        }

        nodes.push(Box::new(TexturedMesh {
            material: material_image,
            points,
            uvs,
            triangles,
        }));
    }

    Sequence(nodes)
}

/// Compose a complete world from a rendering descriptor
///
/// The base scene tree must resolve and parse (hard failure otherwise).
/// Placed models that fail to resolve or parse are skipped with a warning.
/// An empty light list substitutes the default camera-relative head light.
pub fn compose_full(
    descriptor: &SceneDescriptor,
    files: &Resolver,
    options: &ComposeOptions,
) -> Result<World, SceneError> {
    let scene_path = files
        .get(&descriptor.scene)
        .map_err(|source| SceneError::UnresolvedScene {
            path: descriptor.scene.clone(),
            source,
        })?
        .to_string();
    let tree = Osgt::from_file(&scene_path)?;
    let static_geometry = osgt_geometry(&tree, Some(files));

    let cam = &descriptor.camera;
    let (mut width, mut height) = (clamp_dimension(cam.width), clamp_dimension(cam.height));
    if options.preview {
        (width, height) = (100, 100);
    }

    let lights: Vec<Box<dyn SceneNode>> = if descriptor.lights.is_empty() {
        vec![Box::new(head_light())]
    } else {
        descriptor
            .lights
            .iter()
            .map(|l| Box::new(PointLight { position: l.position }) as Box<dyn SceneNode>)
            .collect()
    };

    let mut placed: Vec<Box<dyn SceneNode>> = Vec::new();
    for model in &descriptor.models {
        let path = match files.get(&model.path) {
            Ok(path) => path.to_string(),
            Err(err) => {
                log::warn!("skipping model {}: {err}", model.path);
                continue;
            }
        };
        let mesh = match Obj::from_file(&path) {
            Ok(mesh) => mesh,
            Err(err) => {
                log::warn!("skipping model {path}: {err}");
                continue;
            }
        };
        placed.push(Box::new(Wrap {
            name: "Transform".to_string(),
            inner: Box::new(Sequence(vec![
                Box::new(Transform(model.transform)),
                Box::new(Transform(OSG_AXIS_FIX)),
                Box::new(mesh),
            ])),
        }));
    }

    Ok(World {
        head: Header {
            eye: cam.eye,
            center: cam.center,
            up: cam.up,
            fov: cam.fov,
            width,
            height,
            halt_spp: cam.quality.saturating_add(20).max(0).unsigned_abs(),
        },
        rest: Box::new(Sequence(vec![
            Box::new(Sequence(lights)),
            Box::new(static_geometry),
            Box::new(Sequence(placed)),
        ])),
    })
}

/// Compose a geometry-only world with a fixed overview camera
///
/// Used for bare scene-tree jobs, which carry no descriptor and therefore
/// no camera of their own.
pub fn fixed_camera_world(tree: &Osgt) -> World {
    World {
        head: Header {
            eye: Vec3::new(1220.0, 100.0, 1220.0),
            center: Vec3::new(0.0, 0.0, 0.0),
            up: Vec3::new(-1.0, 0.0, 0.0),
            fov: 31.0,
            width: 150,
            height: 150,
            halt_spp: 20,
        },
        rest: Box::new(Sequence(vec![
            Box::new(head_light()),
            Box::new(osgt_geometry(tree, None)),
        ])),
    }
}
