//! Object tools

use blender_mcp_protocol::CommandKind;
use schemars::{JsonSchema, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::ToolSpec;
use crate::schema::Rule;

/// Primitive types Blender can add
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectType {
    Cube,
    Sphere,
    Cylinder,
    Plane,
    Cone,
    Torus,
    Monkey,
}

fn origin() -> [f64; 3] {
    [0.0; 3]
}

/// Every scale factor must be strictly positive
fn positive_items(schema: &mut Schema) {
    if let Some(items) = schema.get_mut("items").and_then(Value::as_object_mut) {
        items.insert("exclusiveMinimum".to_string(), json!(0.0));
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateObjectRequest {
    /// Type of object to create: CUBE, SPHERE, CYLINDER, PLANE, CONE, TORUS or MONKEY (case-insensitive)
    pub object_type: ObjectType,

    /// XYZ location for the object
    #[serde(default = "origin")]
    pub location: [f64; 3],

    /// Name for the object. If taken, Blender appends .001, .002, ... and the result reports the actual name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeleteObjectRequest {
    /// Name of the object to delete
    pub object_name: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MoveObjectRequest {
    /// Name of the object to move
    pub object_name: String,

    /// New absolute XYZ location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<[f64; 3]>,

    /// XYZ offset added to the current location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<[f64; 3]>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ScaleObjectRequest {
    /// Name of the object
    pub object_name: String,

    /// XYZ scale factors, each greater than zero
    #[schemars(transform = positive_items)]
    pub scale: [f64; 3],
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RotateObjectRequest {
    /// Name of the object
    pub object_name: String,

    /// XYZ Euler rotation in radians
    pub rotation: [f64; 3],
}

pub const CREATE_OBJECT: ToolSpec = ToolSpec::new::<CreateObjectRequest>(
    "create_object",
    "Create a new 3D object in Blender. Returns the name the object actually received.",
    CommandKind::CreateObject,
)
.upper_case(&["object_type"]);

pub const DELETE_OBJECT: ToolSpec = ToolSpec::new::<DeleteObjectRequest>(
    "delete_object",
    "Delete an object from the Blender scene.",
    CommandKind::DeleteObject,
);

pub const MOVE_OBJECT: ToolSpec = ToolSpec::new::<MoveObjectRequest>(
    "move_object",
    "Move an object, either to an absolute location or by a relative delta (give exactly one).",
    CommandKind::MoveObject,
)
.aliases(&[("name", "object_name")])
.rules(&[Rule::ExactlyOne(&["location", "delta"])]);

pub const SCALE_OBJECT: ToolSpec = ToolSpec::new::<ScaleObjectRequest>(
    "scale_object",
    "Set an object's scale factors.",
    CommandKind::ScaleObject,
);

pub const ROTATE_OBJECT: ToolSpec = ToolSpec::new::<RotateObjectRequest>(
    "rotate_object",
    "Set an object's rotation in radians.",
    CommandKind::RotateObject,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ArgumentError;
    use serde_json::Map;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn invalid(err: ArgumentError) -> crate::schema::ValidationError {
        match err {
            ArgumentError::Invalid(err) => err,
            ArgumentError::Schema(err) => panic!("{err}"),
        }
    }

    #[test]
    fn test_create_object_params() {
        let params = CREATE_OBJECT
            .validate(&args(json!({"object_type": "cube", "location": [2, 0, 1], "name": "MyCube"})))
            .unwrap();
        assert_eq!(
            Value::Object(params),
            json!({"object_type": "CUBE", "location": [2.0, 0.0, 1.0], "name": "MyCube"})
        );
    }

    #[test]
    fn test_create_object_defaults_location() {
        let params = CREATE_OBJECT.validate(&args(json!({"object_type": "MONKEY"}))).unwrap();
        assert_eq!(params["location"], json!([0.0, 0.0, 0.0]));
        assert!(!params.contains_key("name"));
    }

    #[test]
    fn test_missing_object_type_is_named() {
        let err = invalid(CREATE_OBJECT.validate(&Map::new()).unwrap_err());
        assert!(err.names("object_type"));
    }

    #[test]
    fn test_unknown_object_type_is_rejected() {
        let err = invalid(
            CREATE_OBJECT
                .validate(&args(json!({"object_type": "teapot"})))
                .unwrap_err(),
        );
        assert!(err.names("object_type"));
    }

    #[test]
    fn test_move_object_accepts_name_alias() {
        let params = MOVE_OBJECT
            .validate(&args(json!({"name": "MyCube", "delta": [0, 0, 2]})))
            .unwrap();
        assert_eq!(params["object_name"], "MyCube");
        assert_eq!(params["delta"], json!([0.0, 0.0, 2.0]));
        assert!(!params.contains_key("location"));
    }

    #[test]
    fn test_scale_must_be_positive() {
        let err = invalid(
            SCALE_OBJECT
                .validate(&args(json!({"object_name": "Cube", "scale": [1, 0, 2]})))
                .unwrap_err(),
        );
        assert!(err.names("scale"));
    }

    #[test]
    fn test_schema_advertises_choices_and_bounds() {
        let create = CREATE_OBJECT.arguments().unwrap().input_schema();
        assert_eq!(create["required"], json!(["object_type"]));
        assert_eq!(create["properties"]["location"]["default"], json!([0.0, 0.0, 0.0]));

        let scale = SCALE_OBJECT.arguments().unwrap().input_schema();
        assert_eq!(scale["properties"]["scale"]["minItems"], json!(3));
        assert_eq!(scale["properties"]["scale"]["items"]["exclusiveMinimum"], json!(0.0));
    }
}
