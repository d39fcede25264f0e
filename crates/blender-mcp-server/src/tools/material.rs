//! Material tools

use blender_mcp_protocol::CommandKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ToolSpec;

fn clay() -> [f64; 4] {
    [0.8, 0.8, 0.8, 1.0]
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateMaterialRequest {
    /// Name for the new material
    pub name: String,

    /// RGBA base color, each channel from 0 to 1
    #[serde(default = "clay")]
    #[schemars(inner(range(min = 0.0, max = 1.0)))]
    pub color: [f64; 4],
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AssignMaterialRequest {
    /// Name of the object
    pub object_name: String,

    /// Name of the material to assign
    pub material_name: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SetMaterialPropertyRequest {
    /// Name of the material
    pub material_name: String,

    /// Principled BSDF input to set, e.g. 'Base Color', 'Metallic', 'Roughness'
    pub property_name: String,

    /// Value for the input: a number, or 3-4 numbers for colors
    pub value: Value,
}

pub const CREATE_MATERIAL: ToolSpec = ToolSpec::new::<CreateMaterialRequest>(
    "create_material",
    "Create a new material with the given base color.",
    CommandKind::CreateMaterial,
);

pub const ASSIGN_MATERIAL: ToolSpec = ToolSpec::new::<AssignMaterialRequest>(
    "assign_material",
    "Assign a material to a mesh object, replacing its first material slot.",
    CommandKind::AssignMaterial,
);

pub const SET_MATERIAL_PROPERTY: ToolSpec = ToolSpec::new::<SetMaterialPropertyRequest>(
    "set_material_property",
    "Set an input of a material's Principled BSDF shader.",
    CommandKind::SetMaterialProperty,
);
