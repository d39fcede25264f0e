//! The host application's scripting API, as seen by the executor
//!
//! [`SceneHost`] is the seam between the bridge and whatever actually owns the
//! 3D scene. Inside Blender it wraps `bpy`; [`MemoryScene`](crate::MemoryScene)
//! implements it in-process. Names are the only handles: the host is the
//! source of truth and rejects names it does not know.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use glam::DVec3;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by the host API
///
/// The `Display` text is sent to the AI agent verbatim, so it names the
/// offending object or material.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Object '{0}' not found")]
    ObjectNotFound(String),

    #[error("Material '{0}' not found")]
    MaterialNotFound(String),

    #[error("Unknown object type: {0}")]
    UnknownPrimitive(String),

    #[error("Object '{0}' cannot hold materials")]
    NoMaterialSlots(String),

    #[error("Property '{property}' not found on material '{material}'")]
    UnknownProperty { material: String, property: String },

    #[error("Invalid value for '{property}': {reason}")]
    InvalidValue { property: String, reason: String },

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Unsupported render format: {0}")]
    UnsupportedFormat(String),

    #[error("Render failed: {0}")]
    Render(String),
}

/// Mesh primitives that can be added to the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Primitive {
    Cube,
    Sphere,
    Cylinder,
    Plane,
    Cone,
    Torus,
    Monkey,
}

impl Primitive {
    pub const ALL: [Self; 7] = [
        Self::Cube,
        Self::Sphere,
        Self::Cylinder,
        Self::Plane,
        Self::Cone,
        Self::Torus,
        Self::Monkey,
    ];

    /// Upper-case identifier used on the wire
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cube => "CUBE",
            Self::Sphere => "SPHERE",
            Self::Cylinder => "CYLINDER",
            Self::Plane => "PLANE",
            Self::Cone => "CONE",
            Self::Torus => "TORUS",
            Self::Monkey => "MONKEY",
        }
    }

    /// Name Blender gives a freshly added primitive
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::Cube => "Cube",
            Self::Sphere => "Sphere",
            Self::Cylinder => "Cylinder",
            Self::Plane => "Plane",
            Self::Cone => "Cone",
            Self::Torus => "Torus",
            Self::Monkey => "Suzanne",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Primitive {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == upper)
            .ok_or_else(|| SceneError::UnknownPrimitive(s.to_string()))
    }
}

/// Blender object type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectKind {
    Mesh,
    Camera,
    Light,
}

/// Snapshot of one scene object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primitive: Option<Primitive>,
    pub location: [f64; 3],
    /// Euler XYZ, radians
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
    pub materials: Vec<String>,
}

/// Snapshot of one material
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialInfo {
    pub name: String,
    /// Principled BSDF inputs by their UI name ("Base Color", "Metallic", ...)
    pub properties: serde_json::Map<String, Value>,
    /// Number of objects using the material
    pub users: usize,
}

/// Parameters of a render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub output_path: PathBuf,
    /// Upper-case format name ("PNG", "JPEG", ...)
    pub format: String,
    /// Overrides the scene resolution when set
    pub resolution: Option<(u32, u32)>,
}

/// What a render produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderInfo {
    pub output_path: String,
    pub format: String,
    pub resolution: [u32; 2],
    pub objects_rendered: usize,
}

/// Native scene operations, one method per host API call
///
/// Implementations run on the scene thread only and need not be `Send`.
pub trait SceneHost {
    /// Add a primitive; a taken name is suffixed `.001`, `.002`, ...
    fn add_primitive(
        &mut self,
        primitive: Primitive,
        location: DVec3,
        name: Option<&str>,
    ) -> Result<ObjectInfo, SceneError>;

    fn remove_object(&mut self, name: &str) -> Result<(), SceneError>;

    fn object(&self, name: &str) -> Result<ObjectInfo, SceneError>;

    /// All objects in scene order
    fn objects(&self) -> Vec<ObjectInfo>;

    fn active_object(&self) -> Option<String>;

    fn set_location(&mut self, name: &str, location: DVec3) -> Result<ObjectInfo, SceneError>;

    fn set_rotation(&mut self, name: &str, rotation: DVec3) -> Result<ObjectInfo, SceneError>;

    fn set_scale(&mut self, name: &str, scale: DVec3) -> Result<ObjectInfo, SceneError>;

    /// Create a material with a base color; a taken name is suffixed
    fn new_material(&mut self, name: &str, color: [f64; 4]) -> Result<MaterialInfo, SceneError>;

    fn materials(&self) -> Vec<MaterialInfo>;

    /// Put the material in the object's first slot, appending one if needed
    fn assign_material(&mut self, object: &str, material: &str) -> Result<(), SceneError>;

    fn set_material_input(
        &mut self,
        material: &str,
        input: &str,
        value: &Value,
    ) -> Result<MaterialInfo, SceneError>;

    /// Move the scene camera, creating one if the scene has none
    fn set_camera(&mut self, location: DVec3, rotation: DVec3) -> Result<ObjectInfo, SceneError>;

    fn render(&mut self, request: &RenderRequest) -> Result<RenderInfo, SceneError>;
}
