mod common;

use medbridge_server::{AppConfig, ServerBuilder, ServiceRole};
use serde_json::{Value, json};
use tokio::sync::oneshot;

fn hub_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.mllp.host = "127.0.0.1".into();
    cfg.mllp.port = 0;
    cfg.notifications.intake_url = Some("http://127.0.0.1:1".into());
    cfg.notifications.clinician_url = Some("http://127.0.0.1:1".into());
    cfg
}

#[tokio::test]
async fn hub_serves_http_and_mllp() {
    let server = ServerBuilder::new()
        .with_config(hub_config())
        .build()
        .await
        .expect("build hub");
    assert_eq!(server.role(), ServiceRole::Hub);
    let mllp_addr = server.mllp_addr().expect("hub binds MLLP");
    assert_ne!(mllp_addr.port(), 0);

    let listener = common::bind().await;
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve(listener, async move {
        let _ = rx.await;
    }));

    let health: Value = reqwest::get(format!("http://{addr}/healthz"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "ok", "role": "hub"}));

    let mllp = medbridge_hl7::MllpClient::new(mllp_addr.to_string());
    let ack = mllp
        .send(bytes::Bytes::from_static(
            b"MSH|^~\\&|RECEPTION|HOSPITAL|HIS|HOSPITAL|20240301101530||ADT^A04|CTRL1|P|2.5\rPID|1||1||Smith^Jane||19900101|F",
        ))
        .await
        .unwrap();
    let ack = medbridge_hl7::AckMessage::parse(&ack).unwrap();
    assert_eq!(ack.control_id, "CTRL1");
    assert!(ack.code.is_accept());
    assert!(ack.patient_id.is_some());

    let _ = tx.send(());
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn satellites_build_without_binding_mllp() {
    let mut cfg = AppConfig {
        role: ServiceRole::Clinician,
        ..Default::default()
    };
    cfg.fhir.hub_url = Some("http://127.0.0.1:9090".into());
    let clinician = ServerBuilder::new().with_config(cfg.clone()).build().await.unwrap();
    assert_eq!(clinician.role(), ServiceRole::Clinician);
    assert!(clinician.mllp_addr().is_none());

    cfg.role = ServiceRole::Intake;
    cfg.mllp.hub_addr = Some("127.0.0.1:2575".into());
    let intake = ServerBuilder::new().with_config(cfg.clone()).build().await.unwrap();
    assert!(intake.mllp_addr().is_none());

    cfg.fhir.hub_url = None;
    assert!(ServerBuilder::new().with_config(cfg).build().await.is_err());
}
