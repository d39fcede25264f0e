//! Tool calls driven through the whole stack: dispatcher, bridge client,
//! listener, scene thread, in-memory scene.

use std::time::Duration;

use blender_mcp_protocol::CommandKind;
use blender_mcp_host::{HostConfig, HostServer, MemoryScene, SceneContext};
use blender_mcp_server::client::{BridgeClient, BridgeConfig};
use blender_mcp_server::{BlenderMcpService, Dispatcher, ToolError};
use serde_json::{Map, Value, json};

async fn start_host() -> Dispatcher {
    let context = SceneContext::spawn(MemoryScene::startup).unwrap();
    let config = HostConfig::default().with_host("127.0.0.1").with_port(0);
    let server = HostServer::bind(config, context).await.unwrap();
    let port = server.local_addr().unwrap().port();
    tokio::spawn(server.serve());

    let bridge = BridgeConfig::default()
        .with_host("127.0.0.1")
        .with_port(port)
        .with_timeout(Duration::from_secs(5));
    Dispatcher::new(BridgeClient::new(bridge))
}

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("arguments must be an object"),
    }
}

async fn object_count(dispatcher: &Dispatcher) -> usize {
    let info = dispatcher.invoke("get_scene_info", &Map::new()).await.unwrap();
    info["objects"].as_array().unwrap().len()
}

#[tokio::test]
async fn test_create_object_reports_name() {
    let dispatcher = start_host().await;
    let result = dispatcher
        .invoke(
            "create_object",
            &args(json!({"object_type": "CUBE", "location": [2, 0, 1], "name": "MyCube"})),
        )
        .await
        .unwrap();
    assert_eq!(result["name"], "MyCube");
    assert_eq!(result["location"], json!([2.0, 0.0, 1.0]));
}

#[tokio::test]
async fn test_duplicate_names_never_overwrite() {
    let dispatcher = start_host().await;
    let create = args(json!({"object_type": "SPHERE", "name": "Ball"}));

    let first = dispatcher.invoke("create_object", &create).await.unwrap();
    let second = dispatcher.invoke("create_object", &create).await.unwrap();
    assert_eq!(first["name"], "Ball");
    assert_eq!(second["name"], "Ball.001");
    assert_eq!(object_count(&dispatcher).await, 5);
}

#[tokio::test]
async fn test_move_missing_object_names_it() {
    let dispatcher = start_host().await;
    let err = dispatcher
        .invoke("move_object", &args(json!({"name": "MyCube", "delta": [0, 0, 2]})))
        .await
        .unwrap_err();
    match err {
        ToolError::Execution { message } => assert_eq!(message, "Object 'MyCube' not found"),
        other => panic!("expected an execution error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_move_by_delta_then_to_location() {
    let dispatcher = start_host().await;
    let moved = dispatcher
        .invoke("move_object", &args(json!({"object_name": "Cube", "delta": [0, 0, 2]})))
        .await
        .unwrap();
    assert_eq!(moved["location"], json!([0.0, 0.0, 2.0]));

    let moved = dispatcher
        .invoke("move_object", &args(json!({"object_name": "Cube", "location": [1, 2, 3]})))
        .await
        .unwrap();
    assert_eq!(moved["location"], json!([1.0, 2.0, 3.0]));
}

#[tokio::test]
async fn test_invalid_call_leaves_scene_untouched() {
    let dispatcher = start_host().await;
    let err = dispatcher
        .invoke(
            "create_object",
            &args(json!({"object_type": "TEAPOT", "location": [0, 0], "colour": "red"})),
        )
        .await
        .unwrap_err();
    let ToolError::Validation(err) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(err.violations.len(), 3);
    assert_eq!(object_count(&dispatcher).await, 3);
}

#[tokio::test]
async fn test_material_workflow() {
    let dispatcher = start_host().await;

    let created = dispatcher
        .invoke("create_material", &args(json!({"name": "Steel", "color": [0.8, 0.8, 0.9, 1.0]})))
        .await
        .unwrap();
    assert_eq!(created["name"], "Steel");

    let set = dispatcher
        .invoke(
            "set_material_property",
            &args(json!({"material_name": "Steel", "property_name": "Metallic", "value": 1.0})),
        )
        .await
        .unwrap();
    assert_eq!(set["value"], json!(1.0));

    let assigned = dispatcher
        .invoke(
            "assign_material",
            &args(json!({"object_name": "Cube", "material_name": "Steel"})),
        )
        .await
        .unwrap();
    assert_eq!(assigned["message"], "Material 'Steel' assigned to 'Cube'");

    let cube = dispatcher
        .query(CommandKind::GetObjectInfo, args(json!({"object_name": "Cube"})))
        .await
        .unwrap();
    assert_eq!(cube["materials"], json!(["Steel"]));
}

#[tokio::test]
async fn test_unknown_material_property_is_reported_verbatim() {
    let dispatcher = start_host().await;
    let err = dispatcher
        .invoke(
            "set_material_property",
            &args(json!({"material_name": "Material", "property_name": "Sparkle", "value": 1})),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Property 'Sparkle' not found on material 'Material'"
    );
}

#[tokio::test]
async fn test_render_writes_file() {
    let dispatcher = start_host().await;
    let dir = std::env::temp_dir().join(format!("blender-mcp-e2e-{}", std::process::id()));
    let path = dir.join("preview.png");

    let result = dispatcher
        .invoke(
            "render_scene",
            &args(json!({"output_path": path.to_string_lossy(), "resolution": [64, 48]})),
        )
        .await
        .unwrap();
    assert_eq!(result["format"], "PNG");
    assert_eq!(result["resolution"], json!([64, 48]));
    assert!(path.exists());

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_camera_position() {
    let dispatcher = start_host().await;
    let result = dispatcher
        .invoke(
            "set_camera_position",
            &args(json!({"location": [0, -10, 2], "rotation": [1.5, 0, 0]})),
        )
        .await
        .unwrap();
    assert_eq!(result["name"], "Camera");
    assert_eq!(result["location"], json!([0.0, -10.0, 2.0]));
}

#[tokio::test]
async fn test_resources_read_live_scene() {
    let dispatcher = start_host().await;
    let service = BlenderMcpService::new(dispatcher);

    let objects: Value = serde_json::from_str(&service.read("blender://scene/objects").await.unwrap()).unwrap();
    assert_eq!(objects.as_array().unwrap().len(), 3);

    let materials: Value =
        serde_json::from_str(&service.read("blender://scene/materials").await.unwrap()).unwrap();
    assert_eq!(materials[0]["name"], "Material");

    let cube: Value = serde_json::from_str(&service.read("blender://object/Cube").await.unwrap()).unwrap();
    assert_eq!(cube["type"], "MESH");

    assert!(service.read("blender://object/Ghost").await.is_err());
}

#[tokio::test]
async fn test_host_errors_are_flagged_tool_results() {
    let service = BlenderMcpService::new(start_host().await);
    let result = service
        .run_tool("delete_object", &args(json!({"object_name": "Ghost"})))
        .await
        .unwrap();
    assert_eq!(result.is_error, Some(true));

    let result = service
        .run_tool("delete_object", &args(json!({"object_name": "Light"})))
        .await
        .unwrap();
    assert_ne!(result.is_error, Some(true));
}

#[tokio::test]
async fn test_concurrent_calls_each_get_their_own_object() {
    let dispatcher = start_host().await;
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .invoke("create_object", &args(json!({"object_type": "CONE", "name": "Spike"})))
                    .await
            })
        })
        .collect();

    let mut names = Vec::new();
    for task in tasks {
        let result = task.await.unwrap().unwrap();
        names.push(result["name"].as_str().unwrap().to_string());
    }
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 8);
}
