//! Rendering descriptor parser
//!
//! The descriptor is an XML document (`RenderingData`) tying a scene
//! together: the base scene-tree path, camera and display settings, the
//! list of placed library models with their transforms, and point lights.
//!
//! Decoding is strict at the document level: unreadable XML or a model
//! transform that is not exactly 16 floats is a hard [`ParseError`]. A
//! missing lights list is not an error; the scene composer substitutes a
//! default camera-relative light.

use super::ParseError;
use crate::foundation::math::{Mat16, Vec3};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Camera and display settings decoded from the descriptor
#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Camera eye position
    pub eye: Vec3,
    /// Look-at target
    pub center: Vec3,
    /// Up direction
    pub up: Vec3,
    /// Field of view in degrees
    pub fov: f32,
    /// Requested horizontal resolution (clamped later by the composer)
    pub width: i32,
    /// Requested vertical resolution (clamped later by the composer)
    pub height: i32,
    /// Horizontal aspect ratio
    pub aspect_x: f32,
    /// Vertical aspect ratio
    pub aspect_y: f32,
    /// Rendering quality; feeds the sampler halt condition
    pub quality: i32,
}

/// One placed model: a row-major transform and the model file path
#[derive(Debug, Clone)]
pub struct PlacedModel {
    /// Flat 16-float row-major transform
    pub transform: Mat16,
    /// Model file path as written by the authoring tool
    pub path: String,
}

/// One point light: position plus diffuse/specular color
#[derive(Debug, Clone)]
pub struct PointLight {
    /// Light position
    pub position: Vec3,
    /// Diffuse RGBA color
    pub diffuse: [f32; 4],
    /// Specular RGBA color
    pub specular: [f32; 4],
}

/// A fully decoded rendering descriptor
#[derive(Debug, Clone)]
pub struct SceneDescriptor {
    /// Base scene-tree reference path
    pub scene: String,
    /// Camera and display settings
    pub camera: CameraSettings,
    /// Placed models in document order
    pub models: Vec<PlacedModel>,
    /// Point lights in document order; may be empty
    pub lights: Vec<PointLight>,
}

impl SceneDescriptor {
    /// Decode a descriptor document from a reader
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ParseError> {
        let raw: XmlRenderingData = quick_xml::de::from_reader(reader)?;
        raw.try_into()
    }

    /// Decode a descriptor file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        let file = File::open(path.as_ref())?;
        Self::parse(BufReader::new(file))
    }
}

/// Parse a flat 16-float transform string, naming the model on failure
fn parse_transform(text: &str, model_path: &str) -> Result<Mat16, ParseError> {
    let bad = || ParseError::BadTransform {
        path: model_path.to_string(),
    };
    let mut out = [0.0f32; 16];
    let mut count = 0;
    for token in text.split_whitespace() {
        if count == 16 {
            return Err(bad());
        }
        out[count] = token.parse().map_err(|_| bad())?;
        count += 1;
    }
    if count != 16 {
        return Err(bad());
    }
    Ok(out)
}

// Raw document shape, mirroring the XML verbatim. Attribute fields carry
// the quick-xml `@` prefix; unknown elements (per-geode material blocks
// and spot-light attributes) are ignored.

#[derive(Debug, Deserialize)]
struct XmlPosition {
    #[serde(rename = "@x")]
    x: f32,
    #[serde(rename = "@y")]
    y: f32,
    #[serde(rename = "@z")]
    z: f32,
}

impl From<&XmlPosition> for Vec3 {
    fn from(p: &XmlPosition) -> Self {
        Self::new(p.x, p.y, p.z)
    }
}

#[derive(Debug, Default, Deserialize)]
struct XmlColor {
    #[serde(rename = "@r", default)]
    r: f32,
    #[serde(rename = "@g", default)]
    g: f32,
    #[serde(rename = "@b", default)]
    b: f32,
    #[serde(rename = "@a", default)]
    a: f32,
}

impl From<&XmlColor> for [f32; 4] {
    fn from(c: &XmlColor) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

#[derive(Debug, Deserialize)]
struct XmlRenderingData {
    #[serde(rename = "Scene")]
    scene: String,
    #[serde(rename = "Models", default)]
    models: XmlModels,
    #[serde(rename = "RenderingSettings")]
    settings: XmlRenderingSettings,
}

#[derive(Debug, Default, Deserialize)]
struct XmlModels {
    #[serde(rename = "LibraryItem", default)]
    items: Vec<XmlLibraryItem>,
}

#[derive(Debug, Deserialize)]
struct XmlLibraryItem {
    #[serde(rename = "Transform")]
    transform: String,
    #[serde(rename = "Path")]
    path: String,
}

#[derive(Debug, Deserialize)]
struct XmlRenderingSettings {
    #[serde(rename = "Camera")]
    camera: XmlCamera,
    #[serde(rename = "Lights", default)]
    lights: XmlLights,
}

#[derive(Debug, Deserialize)]
struct XmlCamera {
    #[serde(rename = "Quality", default)]
    quality: i32,
    #[serde(rename = "Eye")]
    eye: XmlPosition,
    #[serde(rename = "Center")]
    center: XmlPosition,
    #[serde(rename = "Up")]
    up: XmlPosition,
    #[serde(rename = "CameraDisplaySettings")]
    display: XmlDisplaySettings,
}

#[derive(Debug, Deserialize)]
struct XmlDisplaySettings {
    #[serde(rename = "@fov")]
    fov: f32,
    #[serde(rename = "@Resolution_X")]
    width: i32,
    #[serde(rename = "@Resolution_Y")]
    height: i32,
    #[serde(rename = "@AspectRatio_X", default)]
    aspect_x: f32,
    #[serde(rename = "@AspectRatio_Y", default)]
    aspect_y: f32,
}

#[derive(Debug, Default, Deserialize)]
struct XmlLights {
    #[serde(rename = "Lights", default)]
    lights: Vec<XmlLight>,
}

#[derive(Debug, Deserialize)]
struct XmlLight {
    #[serde(rename = "Position")]
    position: XmlPosition,
    #[serde(rename = "Diffuse", default)]
    diffuse: XmlColor,
    #[serde(rename = "Specular", default)]
    specular: XmlColor,
}

impl TryFrom<XmlRenderingData> for SceneDescriptor {
    type Error = ParseError;

    fn try_from(raw: XmlRenderingData) -> Result<Self, ParseError> {
        let models = raw
            .models
            .items
            .iter()
            .map(|item| {
                Ok(PlacedModel {
                    transform: parse_transform(&item.transform, &item.path)?,
                    path: item.path.clone(),
                })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;

        let lights = raw
            .settings
            .lights
            .lights
            .iter()
            .map(|l| PointLight {
                position: (&l.position).into(),
                diffuse: (&l.diffuse).into(),
                specular: (&l.specular).into(),
            })
            .collect();

        let cam = &raw.settings.camera;
        Ok(Self {
            scene: raw.scene,
            camera: CameraSettings {
                eye: (&cam.eye).into(),
                center: (&cam.center).into(),
                up: (&cam.up).into(),
                fov: cam.display.fov,
                width: cam.display.width,
                height: cam.display.height,
                aspect_x: cam.display.aspect_x,
                aspect_y: cam.display.aspect_y,
                quality: cam.quality,
            },
            models,
            lights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    const SAMPLE: &str = r#"<RenderingData><Scene>C:/store/Projects/testProj/Designer/testProj_design_1.osgt</Scene>
<Models>
 <LibraryItem>
  <Transform>1 0 0 0 0 1 0 0 0 0 1 0 368.645 -32.3973 69.1851 1 </Transform>
  <Path>C:/store/CSLibrairies/Models/Chair.obj</Path>
  <LibraryItemSubGeode name="ChamferBox02">
   <Material shinniness="128">
    <Diffuse g="0.8" r="0.8" a="1" b="0.8"/>
    <Ambience g="0.2" r="0.2" a="1" b="0.2"/>
    <Specular g="0.2" r="0.2" a="1" b="0.2"/>
   </Material>
  </LibraryItemSubGeode>
 </LibraryItem>
 <LibraryItem>
  <Transform>1 0 0 0 0 1 0 0 0 0 1 0 282.763 144.454 35.0989 1 </Transform>
  <Path>C:/store/CSLibrairies/Models/Coffe-Table.obj</Path>
 </LibraryItem>
 <LibraryItem>
  <Transform>1 0 0 0 0 1 0 0 0 0 1 0 -268.839 -81.8807 88.0165 1 </Transform>
  <Path>C:/store/CSLibrairies/Models/Swivel_Chair.obj</Path>
 </LibraryItem>
</Models>
<RenderingSettings>
 <Camera CameraType="Prespective">
  <Eye x="195.32" y="531.84" z="499.43"/>
  <Center x="0" y="0" z="0"/>
  <Up x="0" y="0" z="1"/>
  <CameraDisplaySettings fov="30" Resolution_X="800" Resolution_Y="600" AspectRatio_X="1" AspectRatio_Y="1"/>
 </Camera>
 <Lights>
  <Lights SpotCutOffAngle="-1" type="PointSource">
   <Position x="692.01" y="156.55" z="433.62"/>
   <Diffuse g="0.5" r="1" a="1" b="0.5"/>
   <Specular g="1" r="1" a="1" b="1"/>
  </Lights>
 </Lights>
</RenderingSettings>
</RenderingData>"#;

    #[test]
    fn test_decode_reference_document() {
        let desc = SceneDescriptor::parse(Cursor::new(SAMPLE)).unwrap();
        assert!(desc.scene.contains("testProj_design_1.osgt"));
        assert_eq!(desc.models.len(), 3);
        assert_relative_eq!(desc.models[0].transform[12], 368.645);
        assert!(desc.models[1].path.ends_with("Coffe-Table.obj"));
        assert_relative_eq!(desc.camera.fov, 30.0);
        assert_eq!(desc.camera.width, 800);
        assert_eq!(desc.camera.height, 600);
        assert_eq!(desc.camera.quality, 0);
        assert_eq!(desc.lights.len(), 1);
        assert_relative_eq!(desc.lights[0].position.x, 692.01);
        assert_relative_eq!(desc.lights[0].diffuse[1], 0.5);
    }

    #[test]
    fn test_missing_lights_yields_empty_list() {
        let text = r#"<RenderingData><Scene>a.osgt</Scene>
<RenderingSettings>
 <Camera>
  <Eye x="0" y="0" z="1"/><Center x="0" y="0" z="0"/><Up x="0" y="1" z="0"/>
  <CameraDisplaySettings fov="45" Resolution_X="100" Resolution_Y="100"/>
 </Camera>
</RenderingSettings>
</RenderingData>"#;
        let desc = SceneDescriptor::parse(Cursor::new(text)).unwrap();
        assert!(desc.lights.is_empty());
        assert!(desc.models.is_empty());
    }

    #[test]
    fn test_short_transform_is_a_hard_error() {
        let text = r#"<RenderingData><Scene>a.osgt</Scene>
<Models>
 <LibraryItem>
  <Transform>1 0 0 0</Transform>
  <Path>Models/Broken.obj</Path>
 </LibraryItem>
</Models>
<RenderingSettings>
 <Camera>
  <Eye x="0" y="0" z="1"/><Center x="0" y="0" z="0"/><Up x="0" y="1" z="0"/>
  <CameraDisplaySettings fov="45" Resolution_X="100" Resolution_Y="100"/>
 </Camera>
</RenderingSettings>
</RenderingData>"#;
        let err = SceneDescriptor::parse(Cursor::new(text)).unwrap_err();
        match err {
            ParseError::BadTransform { path } => assert_eq!(path, "Models/Broken.obj"),
            other => panic!("expected BadTransform, got {other}"),
        }
    }

    #[test]
    fn test_garbage_document_is_a_hard_error() {
        let err = SceneDescriptor::parse(Cursor::new("not xml at all")).unwrap_err();
        assert!(matches!(err, ParseError::Descriptor(_)));
    }
}
