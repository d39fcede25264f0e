//! Command execution against a [`SceneHost`]
//!
//! [`execute`] is the failure containment boundary of the host side: whatever
//! goes wrong inside a host call, including a panic, comes back as an error
//! [`Response`] and the caller keeps serving.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use blender_mcp_protocol::{Command, CommandKind, MAX_RESOLUTION, Response};
use glam::DVec3;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, error};

use crate::scene::{Primitive, RenderRequest, SceneError, SceneHost};

/// Why a command could not be carried out
#[derive(Error, Debug)]
pub enum ExecError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("Missing parameter '{0}'")]
    MissingParam(&'static str),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParam { name: &'static str, reason: String },
}

/// Run one command on the host and produce its response
pub fn execute(host: &mut dyn SceneHost, command: &Command) -> Response {
    let kind = match command.kind() {
        Ok(kind) => kind,
        Err(unknown) => return Response::error(unknown.to_string()),
    };

    match panic::catch_unwind(AssertUnwindSafe(|| run(host, kind, command.params()))) {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            debug!(command = %kind, "command failed: {err}");
            Response::error(err.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(command = %kind, "host operation panicked: {message}");
            Response::error(format!("Host operation panicked: {message}"))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn run(host: &mut dyn SceneHost, kind: CommandKind, params: &Map<String, Value>) -> Result<Response, ExecError> {
    let p = Params(params);

    let response = match kind {
        CommandKind::CreateObject => {
            let primitive: Primitive = p.str_or("object_type", "CUBE")?.parse()?;
            let location = p.vec3_or("location", DVec3::ZERO)?;
            let info = host.add_primitive(primitive, location, p.opt_str("name")?)?;
            Response::success(json!({
                "name": info.name,
                "location": info.location,
                "type": primitive,
            }))
        }

        CommandKind::DeleteObject => {
            let name = p.str("object_name")?;
            host.remove_object(name)?;
            Response::acknowledged(format!("Object '{name}' deleted"))
        }

        CommandKind::MoveObject => {
            let name = p.str("object_name")?;
            let location = match (p.opt_vec3("location")?, p.opt_vec3("delta")?) {
                (Some(_), Some(_)) => {
                    return Err(ExecError::InvalidParam {
                        name: "delta",
                        reason: "give either 'location' or 'delta', not both".into(),
                    });
                }
                (Some(location), None) => location,
                (None, Some(delta)) => DVec3::from_array(host.object(name)?.location) + delta,
                (None, None) => return Err(ExecError::MissingParam("location")),
            };
            let info = host.set_location(name, location)?;
            Response::success(json!({ "name": info.name, "location": info.location }))
        }

        CommandKind::ScaleObject => {
            let name = p.str("object_name")?;
            let info = host.set_scale(name, p.vec3("scale")?)?;
            Response::success(json!({ "name": info.name, "scale": info.scale }))
        }

        CommandKind::RotateObject => {
            let name = p.str("object_name")?;
            let info = host.set_rotation(name, p.vec3("rotation")?)?;
            Response::success(json!({ "name": info.name, "rotation": info.rotation }))
        }

        CommandKind::CreateMaterial => {
            let name = p.str_or("name", "Material")?;
            let color = p.color_or("color", [0.8, 0.8, 0.8, 1.0])?;
            let info = host.new_material(name, color)?;
            Response::success(json!({ "name": info.name, "color": color }))
        }

        CommandKind::AssignMaterial => {
            let object = p.str("object_name")?;
            let material = p.str("material_name")?;
            host.assign_material(object, material)?;
            Response::acknowledged(format!("Material '{material}' assigned to '{object}'"))
        }

        CommandKind::SetMaterialProperty => {
            let material = p.str("material_name")?;
            let property = p.str("property_name")?;
            let value = params.get("value").ok_or(ExecError::MissingParam("value"))?;
            let info = host.set_material_input(material, property, value)?;
            Response::success(json!({
                "name": info.name,
                "property": property,
                "value": info.properties.get(property).cloned().unwrap_or(Value::Null),
            }))
        }

        CommandKind::GetSceneInfo => {
            let objects = host.objects();
            let materials: Vec<String> = host.materials().into_iter().map(|m| m.name).collect();
            Response::success(json!({
                "objects": objects,
                "active_object": host.active_object(),
                "materials": materials,
            }))
        }

        CommandKind::GetMaterials => Response::success(json!(host.materials())),

        CommandKind::GetObjectInfo => {
            let name = p.str("object_name")?;
            Response::success(json!(host.object(name)?))
        }

        CommandKind::SetCameraPosition => {
            let location = p.vec3("location")?;
            let rotation = p.vec3_or("rotation", DVec3::ZERO)?;
            let info = host.set_camera(location, rotation)?;
            Response::success(json!({
                "name": info.name,
                "location": info.location,
                "rotation": info.rotation,
            }))
        }

        CommandKind::RenderScene => {
            let request = RenderRequest {
                output_path: PathBuf::from(p.str("output_path")?),
                format: p.str_or("format", "PNG")?.to_ascii_uppercase(),
                resolution: p.opt_resolution("resolution")?,
            };
            Response::success(json!(host.render(&request)?))
        }

        CommandKind::Ping => Response::success(json!({ "pong": true })),

        CommandKind::Disconnect => Response::acknowledged("Disconnecting"),
    };

    Ok(response)
}

/// Typed access to command parameters
struct Params<'a>(&'a Map<String, Value>);

impl<'a> Params<'a> {
    /// Present and non-null
    fn get(&self, name: &str) -> Option<&'a Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    fn str(&self, name: &'static str) -> Result<&'a str, ExecError> {
        self.opt_str(name)?.ok_or(ExecError::MissingParam(name))
    }

    fn opt_str(&self, name: &'static str) -> Result<Option<&'a str>, ExecError> {
        self.get(name)
            .map(|v| {
                v.as_str().ok_or_else(|| ExecError::InvalidParam {
                    name,
                    reason: format!("expected a string, got {v}"),
                })
            })
            .transpose()
    }

    fn str_or(&self, name: &'static str, default: &'a str) -> Result<&'a str, ExecError> {
        Ok(self.opt_str(name)?.unwrap_or(default))
    }

    fn numbers<const N: usize>(&self, name: &'static str) -> Result<Option<[f64; N]>, ExecError> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        let invalid = || ExecError::InvalidParam {
            name,
            reason: format!("expected a list of {N} numbers, got {value}"),
        };

        let items = value.as_array().ok_or_else(invalid)?;
        if items.len() != N {
            return Err(invalid());
        }
        let mut out = [0.0; N];
        for (slot, item) in out.iter_mut().zip(items) {
            *slot = item.as_f64().ok_or_else(invalid)?;
        }
        Ok(Some(out))
    }

    fn opt_vec3(&self, name: &'static str) -> Result<Option<DVec3>, ExecError> {
        Ok(self.numbers::<3>(name)?.map(DVec3::from_array))
    }

    fn vec3(&self, name: &'static str) -> Result<DVec3, ExecError> {
        self.opt_vec3(name)?.ok_or(ExecError::MissingParam(name))
    }

    fn vec3_or(&self, name: &'static str, default: DVec3) -> Result<DVec3, ExecError> {
        Ok(self.opt_vec3(name)?.unwrap_or(default))
    }

    /// RGBA; an RGB triple gets alpha 1
    fn color_or(&self, name: &'static str, default: [f64; 4]) -> Result<[f64; 4], ExecError> {
        if let Ok(Some([r, g, b])) = self.numbers::<3>(name) {
            return Ok([r, g, b, 1.0]);
        }
        Ok(self.numbers::<4>(name)?.unwrap_or(default))
    }

    /// Width and height, each a whole number in `1..=MAX_RESOLUTION`
    fn opt_resolution(&self, name: &'static str) -> Result<Option<(u32, u32)>, ExecError> {
        let Some([w, h]) = self.numbers::<2>(name)? else {
            return Ok(None);
        };
        let dimension = |d: f64| {
            (d >= 1.0 && d <= f64::from(MAX_RESOLUTION) && d.fract() == 0.0)
                .then_some(d as u32)
                .ok_or_else(|| ExecError::InvalidParam {
                    name,
                    reason: format!("{d} is not a whole number of pixels from 1 to {MAX_RESOLUTION}"),
                })
        };
        Ok(Some((dimension(w)?, dimension(h)?)))
    }
}
