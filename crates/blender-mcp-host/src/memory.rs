//! In-process scene implementing the host API
//!
//! Behaves the way Blender does for the operations the bridge uses: names
//! are unique and collisions get a numeric suffix, new objects become active,
//! materials live in per-object slots, and the startup scene holds a cube, a
//! camera, and a light.

use std::path::Path;

use glam::DVec3;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::render::{self, PreviewItem};
use crate::scene::{
    MaterialInfo, ObjectInfo, ObjectKind, Primitive, RenderInfo, RenderRequest, SceneError,
    SceneHost,
};

/// Default render resolution, matching Blender's startup file
pub const DEFAULT_RESOLUTION: (u32, u32) = (1920, 1080);

const DEFAULT_COLOR: [f64; 4] = [0.8, 0.8, 0.8, 1.0];

/// Scalar Principled BSDF inputs and their defaults
const SCALAR_INPUTS: [(&str, f64); 6] = [
    ("Metallic", 0.0),
    ("Roughness", 0.5),
    ("Specular IOR Level", 0.5),
    ("IOR", 1.5),
    ("Alpha", 1.0),
    ("Emission Strength", 0.0),
];

const BASE_COLOR: &str = "Base Color";

#[derive(Debug, Clone)]
struct SceneObject {
    name: String,
    kind: ObjectKind,
    primitive: Option<Primitive>,
    location: DVec3,
    rotation: DVec3,
    scale: DVec3,
    materials: Vec<String>,
}

impl SceneObject {
    fn new(name: String, kind: ObjectKind, primitive: Option<Primitive>, location: DVec3) -> Self {
        Self {
            name,
            kind,
            primitive,
            location,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
            materials: Vec::new(),
        }
    }

    fn info(&self) -> ObjectInfo {
        ObjectInfo {
            name: self.name.clone(),
            kind: self.kind,
            primitive: self.primitive,
            location: self.location.to_array(),
            rotation: self.rotation.to_array(),
            scale: self.scale.to_array(),
            materials: self.materials.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct Material {
    name: String,
    base_color: [f64; 4],
    scalars: Vec<(&'static str, f64)>,
}

impl Material {
    fn new(name: String, base_color: [f64; 4]) -> Self {
        Self {
            name,
            base_color,
            scalars: SCALAR_INPUTS.to_vec(),
        }
    }

    fn properties(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        properties.insert(BASE_COLOR.to_string(), json!(self.base_color));
        for (input, value) in &self.scalars {
            properties.insert((*input).to_string(), json!(value));
        }
        properties
    }
}

/// A scene held entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryScene {
    objects: Vec<SceneObject>,
    materials: Vec<Material>,
    active: Option<String>,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::startup()
    }
}

impl MemoryScene {
    /// A scene with no objects and no materials
    pub fn empty() -> Self {
        Self {
            objects: Vec::new(),
            materials: Vec::new(),
            active: None,
        }
    }

    /// Blender's startup scene: `Cube` with `Material`, `Camera`, `Light`
    pub fn startup() -> Self {
        let mut scene = Self::empty();

        let mut cube = SceneObject::new(
            "Cube".into(),
            ObjectKind::Mesh,
            Some(Primitive::Cube),
            DVec3::ZERO,
        );
        cube.materials.push("Material".into());
        scene.objects.push(cube);

        let mut camera = SceneObject::new(
            "Camera".into(),
            ObjectKind::Camera,
            None,
            DVec3::new(7.3589, -6.9258, 4.9583),
        );
        camera.rotation = DVec3::new(1.1093, 0.0, 0.8149);
        scene.objects.push(camera);

        scene.objects.push(SceneObject::new(
            "Light".into(),
            ObjectKind::Light,
            None,
            DVec3::new(4.0762, 1.0055, 5.9039),
        ));

        scene
            .materials
            .push(Material::new("Material".into(), DEFAULT_COLOR));
        scene.active = Some("Cube".into());
        scene
    }

    fn find(&self, name: &str) -> Result<&SceneObject, SceneError> {
        self.objects
            .iter()
            .find(|o| o.name == name)
            .ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut SceneObject, SceneError> {
        self.objects
            .iter_mut()
            .find(|o| o.name == name)
            .ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))
    }

    fn material_mut(&mut self, name: &str) -> Result<&mut Material, SceneError> {
        self.materials
            .iter_mut()
            .find(|m| m.name == name)
            .ok_or_else(|| SceneError::MaterialNotFound(name.to_string()))
    }

    fn material_info(&self, material: &Material) -> MaterialInfo {
        let users = self
            .objects
            .iter()
            .filter(|o| o.materials.iter().any(|m| *m == material.name))
            .count();
        MaterialInfo {
            name: material.name.clone(),
            properties: material.properties(),
            users,
        }
    }

    fn preview_items(&self) -> Vec<PreviewItem> {
        self.objects
            .iter()
            .filter_map(|object| {
                let primitive = object.primitive?;
                let color = object
                    .materials
                    .first()
                    .and_then(|name| self.materials.iter().find(|m| m.name == *name))
                    .map_or(DEFAULT_COLOR, |m| m.base_color);
                Some(PreviewItem {
                    primitive,
                    location: object.location,
                    rotation: object.rotation,
                    scale: object.scale,
                    color,
                })
            })
            .collect()
    }
}

/// Blender-style unique naming: `Cube`, `Cube.001`, `Cube.002`, ...
///
/// A requested name that already carries a numeric suffix is treated as its
/// stem, so asking for `Cube.001` when it exists yields the next free suffix.
pub fn unique_name(requested: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(requested) {
        return requested.to_string();
    }

    let stem = match requested.rsplit_once('.') {
        Some((stem, suffix))
            if !stem.is_empty() && suffix.len() >= 3 && suffix.bytes().all(|b| b.is_ascii_digit()) =>
        {
            stem
        }
        _ => requested,
    };

    (1u32..)
        .map(|n| format!("{stem}.{n:03}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| requested.to_string())
}

fn validate_name(name: &str) -> Result<&str, SceneError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SceneError::InvalidName("name must not be empty".into()));
    }
    Ok(trimmed)
}

fn number_list(property: &str, value: &Value) -> Result<Vec<f64>, SceneError> {
    let invalid = |reason: &str| SceneError::InvalidValue {
        property: property.to_string(),
        reason: reason.to_string(),
    };
    value
        .as_array()
        .ok_or_else(|| invalid("expected a list of numbers"))?
        .iter()
        .map(|v| v.as_f64().ok_or_else(|| invalid("expected a list of numbers")))
        .collect()
}

impl SceneHost for MemoryScene {
    fn add_primitive(
        &mut self,
        primitive: Primitive,
        location: DVec3,
        name: Option<&str>,
    ) -> Result<ObjectInfo, SceneError> {
        let requested = match name {
            Some(name) => validate_name(name)?,
            None => primitive.default_name(),
        };
        let name = unique_name(requested, |n| self.objects.iter().any(|o| o.name == n));
        debug!(%primitive, %name, "adding primitive");

        let object = SceneObject::new(name.clone(), ObjectKind::Mesh, Some(primitive), location);
        let info = object.info();
        self.objects.push(object);
        self.active = Some(name);
        Ok(info)
    }

    fn remove_object(&mut self, name: &str) -> Result<(), SceneError> {
        let index = self
            .objects
            .iter()
            .position(|o| o.name == name)
            .ok_or_else(|| SceneError::ObjectNotFound(name.to_string()))?;
        self.objects.remove(index);
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        Ok(())
    }

    fn object(&self, name: &str) -> Result<ObjectInfo, SceneError> {
        self.find(name).map(SceneObject::info)
    }

    fn objects(&self) -> Vec<ObjectInfo> {
        self.objects.iter().map(SceneObject::info).collect()
    }

    fn active_object(&self) -> Option<String> {
        self.active.clone()
    }

    fn set_location(&mut self, name: &str, location: DVec3) -> Result<ObjectInfo, SceneError> {
        let object = self.find_mut(name)?;
        object.location = location;
        Ok(object.info())
    }

    fn set_rotation(&mut self, name: &str, rotation: DVec3) -> Result<ObjectInfo, SceneError> {
        let object = self.find_mut(name)?;
        object.rotation = rotation;
        Ok(object.info())
    }

    fn set_scale(&mut self, name: &str, scale: DVec3) -> Result<ObjectInfo, SceneError> {
        let object = self.find_mut(name)?;
        object.scale = scale;
        Ok(object.info())
    }

    fn new_material(&mut self, name: &str, color: [f64; 4]) -> Result<MaterialInfo, SceneError> {
        let requested = validate_name(name)?;
        let name = unique_name(requested, |n| self.materials.iter().any(|m| m.name == n));
        let material = Material::new(name, color);
        let info = self.material_info(&material);
        self.materials.push(material);
        Ok(info)
    }

    fn materials(&self) -> Vec<MaterialInfo> {
        self.materials
            .iter()
            .map(|m| self.material_info(m))
            .collect()
    }

    fn assign_material(&mut self, object: &str, material: &str) -> Result<(), SceneError> {
        // Check the object first; that is the error Blender reports first
        self.find(object)?;
        if !self.materials.iter().any(|m| m.name == material) {
            return Err(SceneError::MaterialNotFound(material.to_string()));
        }

        let target = self.find_mut(object)?;
        if target.kind != ObjectKind::Mesh {
            return Err(SceneError::NoMaterialSlots(object.to_string()));
        }
        match target.materials.first_mut() {
            Some(slot) => *slot = material.to_string(),
            None => target.materials.push(material.to_string()),
        }
        Ok(())
    }

    fn set_material_input(
        &mut self,
        material: &str,
        input: &str,
        value: &Value,
    ) -> Result<MaterialInfo, SceneError> {
        let target = self.material_mut(material)?;

        if input == BASE_COLOR {
            let components = number_list(input, value)?;
            let color = match components.as_slice() {
                [r, g, b] => [*r, *g, *b, 1.0],
                [r, g, b, a] => [*r, *g, *b, *a],
                _ => {
                    return Err(SceneError::InvalidValue {
                        property: input.to_string(),
                        reason: format!("expected 3 or 4 numbers, got {}", components.len()),
                    });
                }
            };
            target.base_color = color;
        } else {
            let slot = target
                .scalars
                .iter_mut()
                .find(|(name, _)| *name == input)
                .ok_or_else(|| SceneError::UnknownProperty {
                    material: material.to_string(),
                    property: input.to_string(),
                })?;
            slot.1 = value.as_f64().ok_or_else(|| SceneError::InvalidValue {
                property: input.to_string(),
                reason: format!("expected a number, got {value}"),
            })?;
        }

        let snapshot = self
            .materials
            .iter()
            .find(|m| m.name == material)
            .map(|m| self.material_info(m))
            .ok_or_else(|| SceneError::MaterialNotFound(material.to_string()))?;
        Ok(snapshot)
    }

    fn set_camera(&mut self, location: DVec3, rotation: DVec3) -> Result<ObjectInfo, SceneError> {
        let index = match self.objects.iter().position(|o| o.kind == ObjectKind::Camera) {
            Some(index) => index,
            None => {
                let name = unique_name("Camera", |n| self.objects.iter().any(|o| o.name == n));
                self.objects
                    .push(SceneObject::new(name, ObjectKind::Camera, None, location));
                self.objects.len() - 1
            }
        };

        let camera = &mut self.objects[index];
        camera.location = location;
        camera.rotation = rotation;
        Ok(camera.info())
    }

    fn render(&mut self, request: &RenderRequest) -> Result<RenderInfo, SceneError> {
        let format = render::image_format(&request.format)?;
        let (width, height) = request.resolution.unwrap_or(DEFAULT_RESOLUTION);
        let items = self.preview_items();

        let image = render::rasterize(&items, width, height);
        render::save(&image, &request.output_path, format)?;

        Ok(RenderInfo {
            output_path: display_path(&request.output_path),
            format: request.format.to_ascii_uppercase(),
            resolution: [width, height],
            objects_rendered: items.len(),
        })
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_startup_scene() {
        let scene = MemoryScene::startup();
        let names: Vec<String> = scene.objects().into_iter().map(|o| o.name).collect();
        assert_eq!(names, ["Cube", "Camera", "Light"]);
        assert_eq!(scene.active_object().as_deref(), Some("Cube"));
        assert_eq!(scene.materials()[0].users, 1);
    }

    #[test]
    fn test_unique_name() {
        let taken = ["Cube", "Cube.001"];
        let is_taken = |n: &str| taken.contains(&n);
        assert_eq!(unique_name("Sphere", is_taken), "Sphere");
        assert_eq!(unique_name("Cube", is_taken), "Cube.002");
        assert_eq!(unique_name("Cube.001", is_taken), "Cube.002");
    }

    #[test]
    fn test_same_name_twice_yields_two_objects() {
        let mut scene = MemoryScene::empty();
        let first = scene
            .add_primitive(Primitive::Cube, DVec3::ZERO, Some("MyCube"))
            .unwrap();
        let second = scene
            .add_primitive(Primitive::Cube, DVec3::X, Some("MyCube"))
            .unwrap();
        assert_eq!(first.name, "MyCube");
        assert_eq!(second.name, "MyCube.001");
        assert_eq!(scene.objects().len(), 2);
        assert_eq!(scene.active_object().as_deref(), Some("MyCube.001"));
    }

    #[test]
    fn test_default_names() {
        let mut scene = MemoryScene::empty();
        let monkey = scene
            .add_primitive(Primitive::Monkey, DVec3::ZERO, None)
            .unwrap();
        assert_eq!(monkey.name, "Suzanne");
        assert!(scene.add_primitive(Primitive::Cube, DVec3::ZERO, Some("  ")).is_err());
    }

    #[test]
    fn test_remove_clears_active() {
        let mut scene = MemoryScene::startup();
        scene.remove_object("Cube").unwrap();
        assert_eq!(scene.active_object(), None);
        assert_eq!(
            scene.remove_object("Cube"),
            Err(SceneError::ObjectNotFound("Cube".into()))
        );
    }

    #[test]
    fn test_assign_material_replaces_first_slot() {
        let mut scene = MemoryScene::startup();
        scene.new_material("Red", [1.0, 0.0, 0.0, 1.0]).unwrap();
        scene.assign_material("Cube", "Red").unwrap();

        assert_eq!(scene.object("Cube").unwrap().materials, ["Red"]);
        let users: Vec<(String, usize)> = scene
            .materials()
            .into_iter()
            .map(|m| (m.name, m.users))
            .collect();
        assert_eq!(users, [("Material".to_string(), 0), ("Red".to_string(), 1)]);
    }

    #[test]
    fn test_assign_material_errors() {
        let mut scene = MemoryScene::startup();
        assert_eq!(
            scene.assign_material("Ghost", "Material"),
            Err(SceneError::ObjectNotFound("Ghost".into()))
        );
        assert_eq!(
            scene.assign_material("Cube", "Nope"),
            Err(SceneError::MaterialNotFound("Nope".into()))
        );
        assert_eq!(
            scene.assign_material("Camera", "Material"),
            Err(SceneError::NoMaterialSlots("Camera".into()))
        );
    }

    #[test]
    fn test_set_material_inputs() {
        let mut scene = MemoryScene::startup();
        let info = scene
            .set_material_input("Material", "Metallic", &json!(1.0))
            .unwrap();
        assert_eq!(info.properties["Metallic"], json!(1.0));

        let info = scene
            .set_material_input("Material", "Base Color", &json!([0.1, 0.2, 0.3]))
            .unwrap();
        assert_eq!(info.properties["Base Color"], json!([0.1, 0.2, 0.3, 1.0]));

        assert!(matches!(
            scene.set_material_input("Material", "Sheen Tint", &json!(1.0)),
            Err(SceneError::UnknownProperty { .. })
        ));
        assert!(matches!(
            scene.set_material_input("Material", "Roughness", &json!("shiny")),
            Err(SceneError::InvalidValue { .. })
        ));
        assert!(matches!(
            scene.set_material_input("Material", "Base Color", &json!([1.0, 0.0])),
            Err(SceneError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_set_camera_creates_when_missing() {
        let mut scene = MemoryScene::empty();
        let camera = scene
            .set_camera(DVec3::new(0.0, -10.0, 5.0), DVec3::new(1.2, 0.0, 0.0))
            .unwrap();
        assert_eq!(camera.name, "Camera");
        assert_eq!(camera.kind, ObjectKind::Camera);
        assert_relative_eq!(camera.rotation[0], 1.2);

        let moved = scene.set_camera(DVec3::ZERO, DVec3::ZERO).unwrap();
        assert_eq!(moved.name, "Camera");
        assert_eq!(scene.objects().len(), 1);
    }

    #[test]
    fn test_render_writes_image() {
        let mut scene = MemoryScene::startup();
        let path = std::env::temp_dir().join(format!(
            "blender_mcp_memory_render_{}.png",
            std::process::id()
        ));
        let info = scene
            .render(&RenderRequest {
                output_path: path.clone(),
                format: "png".into(),
                resolution: Some((32, 18)),
            })
            .unwrap();

        assert_eq!(info.format, "PNG");
        assert_eq!(info.resolution, [32, 18]);
        assert_eq!(info.objects_rendered, 1);
        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (32, 18));
        std::fs::remove_file(&path).ok();
    }
}
