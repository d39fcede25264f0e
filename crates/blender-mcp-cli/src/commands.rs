//! Subcommands and their translation to tool calls

use std::path::PathBuf;

use clap::Subcommand;
use serde_json::{Map, Value, json};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an object (CUBE, SPHERE, CYLINDER, PLANE, CONE, TORUS, MONKEY)
    #[command(allow_negative_numbers = true)]
    Create {
        /// Object type
        object_type: String,

        /// Location
        #[arg(short, long, num_args = 3, value_names = ["X", "Y", "Z"])]
        location: Option<Vec<f64>>,

        /// Object name (Blender appends .001 if taken)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Delete an object
    Delete {
        /// Object name
        name: String,
    },

    /// Move an object to a location, or by an offset with --relative
    #[command(allow_negative_numbers = true)]
    Move {
        /// Object name
        name: String,
        x: f64,
        y: f64,
        z: f64,

        /// Treat X Y Z as an offset from the current location
        #[arg(short, long)]
        relative: bool,
    },

    /// Set an object's scale
    Scale {
        /// Object name
        name: String,
        x: f64,
        y: f64,
        z: f64,
    },

    /// Set an object's rotation (radians)
    #[command(allow_negative_numbers = true)]
    Rotate {
        /// Object name
        name: String,
        x: f64,
        y: f64,
        z: f64,
    },

    /// Create a material
    Material {
        /// Material name
        name: String,

        /// RGBA base color, each 0 to 1
        #[arg(short, long, num_args = 4, value_names = ["R", "G", "B", "A"])]
        color: Option<Vec<f64>>,
    },

    /// Assign a material to an object
    Assign {
        /// Object name
        object: String,

        /// Material name
        material: String,
    },

    /// Set a material's shader input
    SetProperty {
        /// Material name
        material: String,

        /// Input name, e.g. "Metallic" or "Base Color"
        property: String,

        /// Value as JSON (e.g. 0.5 or [1,0,0,1]); anything else is sent as a string
        #[arg(allow_negative_numbers = true)]
        value: String,
    },

    /// Show the whole scene
    Scene,

    /// List objects
    Objects,

    /// List materials with their inputs
    Materials,

    /// Show one object
    Object {
        /// Object name
        name: String,
    },

    /// Position the scene camera
    #[command(allow_negative_numbers = true)]
    Camera {
        /// Camera location
        #[arg(short, long, num_args = 3, required = true, value_names = ["X", "Y", "Z"])]
        location: Vec<f64>,

        /// Camera rotation in radians
        #[arg(short, long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [0.0, 0.0, 0.0])]
        rotation: Vec<f64>,
    },

    /// Render the scene to an image file
    Render {
        /// Output image file
        output: PathBuf,

        /// Image format (PNG, JPEG, BMP, TIFF)
        #[arg(short, long)]
        format: Option<String>,

        /// Output size; defaults to the scene's render settings
        #[arg(short, long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
        resolution: Option<Vec<u32>>,
    },

    /// Print a workflow prompt, or list them
    Prompt {
        /// Prompt name
        name: Option<String>,
    },

    /// List the MCP tools with their argument schemas
    Tools,

    /// Check that Blender is answering
    Ping,

    /// Run an in-memory stand-in for Blender on --host/--port
    ServeMock {
        /// Start with no objects instead of Blender's default scene
        #[arg(long)]
        empty: bool,

        /// Seconds a command may take before it is answered with a timeout
        #[arg(long, default_value_t = 5.0)]
        exec_timeout: f64,
    },
}

impl Commands {
    /// The MCP tool and arguments this subcommand stands for, if any
    pub fn tool_call(&self) -> Option<(&'static str, Map<String, Value>)> {
        let mut args = Map::new();
        let tool = match self {
            Self::Create {
                object_type,
                location,
                name,
            } => {
                args.insert("object_type".into(), json!(object_type));
                if let Some(location) = location {
                    args.insert("location".into(), json!(location));
                }
                if let Some(name) = name {
                    args.insert("name".into(), json!(name));
                }
                "create_object"
            }
            Self::Delete { name } => {
                args.insert("object_name".into(), json!(name));
                "delete_object"
            }
            Self::Move {
                name,
                x,
                y,
                z,
                relative,
            } => {
                let key = if *relative { "delta" } else { "location" };
                args.insert("object_name".into(), json!(name));
                args.insert(key.into(), json!([x, y, z]));
                "move_object"
            }
            Self::Scale { name, x, y, z } => {
                args.insert("object_name".into(), json!(name));
                args.insert("scale".into(), json!([x, y, z]));
                "scale_object"
            }
            Self::Rotate { name, x, y, z } => {
                args.insert("object_name".into(), json!(name));
                args.insert("rotation".into(), json!([x, y, z]));
                "rotate_object"
            }
            Self::Material { name, color } => {
                args.insert("name".into(), json!(name));
                if let Some(color) = color {
                    args.insert("color".into(), json!(color));
                }
                "create_material"
            }
            Self::Assign { object, material } => {
                args.insert("object_name".into(), json!(object));
                args.insert("material_name".into(), json!(material));
                "assign_material"
            }
            Self::SetProperty {
                material,
                property,
                value,
            } => {
                let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.clone()));
                args.insert("material_name".into(), json!(material));
                args.insert("property_name".into(), json!(property));
                args.insert("value".into(), value);
                "set_material_property"
            }
            Self::Scene => "get_scene_info",
            Self::Camera { location, rotation } => {
                args.insert("location".into(), json!(location));
                args.insert("rotation".into(), json!(rotation));
                "set_camera_position"
            }
            Self::Render {
                output,
                format,
                resolution,
            } => {
                args.insert("output_path".into(), json!(output.to_string_lossy()));
                if let Some(format) = format {
                    args.insert("format".into(), json!(format));
                }
                if let Some(resolution) = resolution {
                    args.insert("resolution".into(), json!(resolution));
                }
                "render_scene"
            }
            Self::Objects
            | Self::Materials
            | Self::Object { .. }
            | Self::Prompt { .. }
            | Self::Tools
            | Self::Ping
            | Self::ServeMock { .. } => return None,
        };
        Some((tool, args))
    }
}
