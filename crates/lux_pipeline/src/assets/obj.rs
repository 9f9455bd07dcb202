//! Wavefront-style OBJ mesh parser
//!
//! Parses the subset produced by the library's authoring tools: vertex
//! positions, normals, texture coordinates, faces, and named groups
//! ("geodes"). Indices are kept 1-based exactly as they appear in the
//! file; the scene serializer remaps them to compacted 0-based per-mesh
//! arrays at emission time.

use super::ParseError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One corner of a face: 1-based `(vertex, normal, uv)` indices
///
/// An index of 0 means the component was absent in the face token
/// (the `v//n` form carries no uv).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceVertex {
    /// 1-based vertex position index
    pub vertex: usize,
    /// 1-based normal index
    pub normal: usize,
    /// 1-based texture coordinate index, 0 when absent
    pub uv: usize,
}

/// An ordered list of face corners; polygons are fan-triangulated on emission
pub type Face = Vec<FaceVertex>;

/// A named group of faces, analogous to a sub-mesh
#[derive(Debug, Clone, Default)]
pub struct Geode {
    /// Group name from the `g` directive
    pub name: String,
    /// Faces collected for this group
    pub faces: Vec<Face>,
}

/// A parsed OBJ mesh: flat attribute arrays plus named geodes
#[derive(Debug, Clone, Default)]
pub struct Obj {
    /// Vertex positions
    pub vertices: Vec<[f32; 3]>,
    /// Vertex normals
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates (first two components of `vt`)
    pub uvs: Vec<[f32; 2]>,
    /// Named face groups
    pub geodes: Vec<Geode>,
}

impl Obj {
    /// Parse OBJ text from a buffered reader
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let mut mesh = Self::default();
        let mut geode = Geode {
            name: "unnamed".to_string(),
            faces: Vec::new(),
        };

        for line in reader.lines() {
            let line = line?;
            if let Some(rest) = line.strip_prefix("v ") {
                mesh.vertices.push(read_floats(rest));
            } else if let Some(rest) = line.strip_prefix("vn ") {
                mesh.normals.push(read_floats(rest));
            } else if let Some(rest) = line.strip_prefix("vt ") {
                // Only the first two components are kept; some exporters
                // write a third.
                let [u, v, _] = read_floats::<3>(rest);
                mesh.uvs.push([u, v]);
            } else if let Some(rest) = line.strip_prefix("f ") {
                geode.faces.push(read_face(rest));
            } else if let Some(rest) = line.strip_prefix("g ") {
                if !geode.faces.is_empty() {
                    mesh.geodes.push(std::mem::take(&mut geode));
                }
                geode.name = rest.trim().to_string();
                geode.faces.clear();
            }
        }

        if !geode.faces.is_empty() {
            mesh.geodes.push(geode);
        }
        Ok(mesh)
    }

    /// Parse an OBJ file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let file = File::open(path.as_ref())?;
        Self::parse(BufReader::new(file))
    }

    /// Componentwise bounding box over all vertices, seeded at ±`f32::MAX`
    pub fn bounding_box(&self) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::MAX; 3];
        let mut max = [-f32::MAX; 3];
        for v in &self.vertices {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }
        (min, max)
    }
}

/// Parse up to N whitespace-separated floats, zero-filling the remainder
pub(crate) fn read_floats<const N: usize>(rest: &str) -> [f32; N] {
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(rest.split_whitespace()) {
        *slot = token.parse().unwrap_or_default();
    }
    out
}

/// Parse the corners of an `f` directive; tokens without a slash are ignored
fn read_face(rest: &str) -> Face {
    let mut face = Face::new();
    for token in rest.split_whitespace() {
        if let Some((v, n)) = token.split_once("//") {
            face.push(FaceVertex {
                vertex: v.parse().unwrap_or_default(),
                normal: n.parse().unwrap_or_default(),
                uv: 0,
            });
        } else if token.contains('/') {
            let mut parts = token.split('/');
            let v = parts.next().unwrap_or_default();
            let t = parts.next().unwrap_or_default();
            let n = parts.next().unwrap_or_default();
            face.push(FaceVertex {
                vertex: v.parse().unwrap_or_default(),
                uv: t.parse().unwrap_or_default(),
                normal: n.parse().unwrap_or_default(),
            });
        }
    }
    face
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    const QUAD: &str = "\
v 0 0 0
v 0 21 0
v 21 21 0
v 21 0 0
vn 0 0 1
vt 0 0
vt 0 1
vt 1 1
vt 1 0
g plate
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    fn parse(text: &str) -> Obj {
        Obj::parse(Cursor::new(text)).unwrap()
    }

    #[test]
    fn test_parse_counts() {
        let mesh = parse(QUAD);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.normals.len(), 1);
        assert_eq!(mesh.uvs.len(), 4);
        assert_eq!(mesh.geodes.len(), 1);
        assert_eq!(mesh.geodes[0].name, "plate");
        assert_eq!(mesh.geodes[0].faces.len(), 1);
        assert_eq!(mesh.geodes[0].faces[0].len(), 4);
        assert_eq!(
            mesh.geodes[0].faces[0][2],
            FaceVertex {
                vertex: 3,
                normal: 1,
                uv: 3
            }
        );
    }

    #[test]
    fn test_double_slash_tokens_have_no_uv() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n");
        let face = &mesh.geodes[0].faces[0];
        assert_eq!(face.len(), 3);
        assert!(face.iter().all(|fv| fv.uv == 0));
        assert_eq!(face[1].vertex, 2);
        assert_eq!(face[1].normal, 1);
    }

    #[test]
    fn test_slashless_tokens_are_ignored() {
        let mesh = parse("v 0 0 0\nf 1 2 3\n");
        assert_eq!(mesh.geodes[0].faces[0].len(), 0);
    }

    #[test]
    fn test_geode_flush_rules() {
        // A leading `g` with no faces yet must not flush an empty geode;
        // the trailing geode flushes at end of input.
        let text = "g empty\ng first\nv 0 0 0\nvn 0 0 1\nf 1//1 1//1 1//1\ng second\nf 1//1 1//1 1//1\n";
        let mesh = parse(text);
        assert_eq!(mesh.geodes.len(), 2);
        assert_eq!(mesh.geodes[0].name, "first");
        assert_eq!(mesh.geodes[1].name, "second");
    }

    #[test]
    fn test_third_uv_component_dropped() {
        let mesh = parse("vt 0.5 0.25 0.9\n");
        assert_eq!(mesh.uvs, vec![[0.5, 0.25]]);
    }

    #[test]
    fn test_bounding_box() {
        let mesh = parse(QUAD);
        let (min, max) = mesh.bounding_box();
        assert_relative_eq!(min[0], 0.0);
        assert_relative_eq!(min[1], 0.0);
        assert_relative_eq!(max[0], 21.0);
        assert_relative_eq!(max[1], 21.0);
        assert_relative_eq!(max[2], 0.0);
    }

    #[test]
    fn test_bounding_box_empty_mesh_is_seeded() {
        let (min, max) = Obj::default().bounding_box();
        assert_eq!(min, [f32::MAX; 3]);
        assert_eq!(max, [-f32::MAX; 3]);
    }
}
