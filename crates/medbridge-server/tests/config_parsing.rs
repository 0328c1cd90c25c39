use std::{env, fs};

use medbridge_server::ServiceRole;
use medbridge_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("medbridge.toml");

    let toml_content = r#"
role = "intake"

[server]
host = "127.0.0.1"
port = 8080

[mllp]
hub_addr = "his.hospital.local:2575"
timeout_ms = 2000

[fhir]
hub_url = "http://his.hospital.local:9090"

[websocket]
client_queue = 32

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses, unset sections keep their defaults
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.role, ServiceRole::Intake);
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.mllp.hub_addr.as_deref(), Some("his.hospital.local:2575"));
    assert_eq!(cfg.mllp.timeout_ms, 2000);
    assert_eq!(cfg.websocket.client_queue, 32);
    assert_eq!(cfg.websocket.command_queue, 256);
    assert_eq!(cfg.notifications.timeout_ms, 5000);
    assert_eq!(cfg.logging.level, "debug");

    // 2) Env override wins over the file
    unsafe {
        env::set_var("MEDBRIDGE__SERVER__PORT", "8181");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.server.port, 8181);
    unsafe {
        env::remove_var("MEDBRIDGE__SERVER__PORT");
    }

    // 3) A hub without satellites is rejected
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
role = "hub"

[notifications]
intake_url = "http://intake:8080"
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("notifications.clinician_url"));

    // 4) Unknown roles fail to deserialize
    let bad_role = dir.path().join("bad_role.toml");
    fs::write(&bad_role, "role = \"pharmacy\"\n").expect("write toml");
    let err = load_config(bad_role.to_str()).expect_err("expected deserialize error");
    assert!(err.contains("deserialize"));
}
