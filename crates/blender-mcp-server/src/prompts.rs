//! Canned workflow guidance served as MCP prompts

/// A prompt with no arguments and fixed text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub text: &'static str,
}

pub const PROMPTS: &[PromptSpec] = &[
    PromptSpec {
        name: "create_basic_scene",
        description: "Steps for building a simple scene from scratch",
        text: BASIC_SCENE,
    },
    PromptSpec {
        name: "lighting_setup",
        description: "Common lighting arrangements and when to use them",
        text: LIGHTING,
    },
    PromptSpec {
        name: "material_workflow",
        description: "Creating, tuning and assigning materials",
        text: MATERIALS,
    },
];

pub fn find(name: &str) -> Option<&'static PromptSpec> {
    PROMPTS.iter().find(|prompt| prompt.name == name)
}

const BASIC_SCENE: &str = r#"Build a basic 3D scene:

1. Call get_scene_info to see what is already there (a new file has Cube, Camera and Light)
2. Remove the default cube if it is in the way
3. Add a plane as the ground
4. Add a cube resting on the plane and a sphere beside it
5. Create a material and assign it to both objects
6. Point the camera at the objects
7. Render a preview

Example calls:
- delete_object {"object_name": "Cube"}
- create_object {"object_type": "PLANE", "location": [0, 0, 0], "name": "Ground"}
- create_object {"object_type": "CUBE", "location": [0, 0, 1], "name": "MainCube"}
- create_object {"object_type": "SPHERE", "location": [2.5, 0, 1], "name": "MainSphere"}
- create_material {"name": "Terracotta", "color": [0.8, 0.3, 0.2, 1.0]}
- assign_material {"object_name": "MainCube", "material_name": "Terracotta"}
- set_camera_position {"location": [7, -7, 5], "rotation": [1.1, 0, 0.785]}
- render_scene {"output_path": "/tmp/scene.png"}

Object names are unique. If a name is taken the new object becomes Name.001,
so always use the name returned by create_object in later calls."#;

const LIGHTING: &str = r#"Common lighting setups:

Three-point lighting
- Key light: the main source, about 45 degrees to one side of the subject
- Fill light: dimmer, on the opposite side, softens the key's shadows
- Rim light: behind the subject, separates it from the background

Environment lighting
- An HDRI world texture gives ambient light and reflections in one step
- Good for product shots and anything reflective

Studio lighting
- Several large soft sources (area lights) for even illumination
- Suits character and product renders

Position the camera with set_camera_position and check the result with
render_scene after each change."#;

const MATERIALS: &str = r#"Material workflow:

1. Create the material
   - create_material with a descriptive name and an RGBA base color

2. Tune its Principled BSDF inputs with set_material_property
   - Base Color: surface color, 3 or 4 numbers from 0 to 1
   - Metallic: 0 for dielectrics, 1 for metals
   - Roughness: 0 is a mirror, 1 is fully diffuse
   - IOR, Alpha, Specular IOR Level, Emission Strength: single numbers

3. Assign it
   - assign_material puts it in the object's first slot
   - One material can be shared by many objects

4. Check and refine
   - render_scene for a preview, then adjust

Example:
- create_material {"name": "BrushedSteel", "color": [0.8, 0.8, 0.9, 1.0]}
- set_material_property {"material_name": "BrushedSteel", "property_name": "Metallic", "value": 1.0}
- set_material_property {"material_name": "BrushedSteel", "property_name": "Roughness", "value": 0.35}
- assign_material {"object_name": "MainCube", "material_name": "BrushedSteel"}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_are_findable() {
        for prompt in PROMPTS {
            assert_eq!(find(prompt.name), Some(prompt));
            assert!(!prompt.text.is_empty());
        }
        assert!(find("sculpt_dragon").is_none());
    }
}
