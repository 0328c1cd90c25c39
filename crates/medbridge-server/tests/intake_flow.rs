//! Intake against a live hub: MLLP admission, FHIR encounters and the
//! notification path back into the intake UI.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use medbridge_core::{EncounterStatus, NewPractitioner};
use medbridge_fhir::FhirClient;
use medbridge_hl7::{AdtSender, MllpClient, MllpServer};
use medbridge_notifications::{EncounterNotifier, NotificationTarget, WebhookAdapter};
use medbridge_server::ServiceRole;
use medbridge_server::build_app;
use medbridge_server::config::WebSocketConfig;
use medbridge_server::roles::hub::{self, HubState};
use medbridge_server::roles::intake::{self, IntakeState};
use medbridge_server::ws::HubHandle;
use medbridge_storage::{
    EncounterRepository, IdStrategy, MemoryStore, PatientRepository, PractitionerRepository,
};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{TestServer, bind, eventually, serve, serve_on};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Deployment {
    intake: TestServer,
    intake_ws: HubHandle,
    _hub: TestServer,
    hub_store: Arc<MemoryStore>,
    _clinician: MockServer,
    _mllp_shutdown: oneshot::Sender<()>,
}

async fn deploy() -> Deployment {
    let intake_listener = bind().await;
    let intake_url = format!("http://{}", intake_listener.local_addr().unwrap());
    let clinician = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .mount(&clinician)
        .await;

    let (hub_ws, _) = HubHandle::spawn(WebSocketConfig::default());
    let hub_store = Arc::new(MemoryStore::new(IdStrategy::Uuid));
    let notifier = EncounterNotifier::new(
        Arc::new(WebhookAdapter::new()),
        vec![
            NotificationTarget::new("intake", intake_url),
            NotificationTarget::new("clinician", clinician.uri()),
        ],
    );
    let hub_state = HubState::new(hub_store.clone(), notifier, hub_ws);

    let mllp = MllpServer::bind("127.0.0.1:0", hub::adt_handler(&hub_state))
        .await
        .unwrap();
    let mllp_addr = mllp.local_addr().unwrap().to_string();
    let (mllp_shutdown, stop) = oneshot::channel::<()>();
    tokio::spawn(mllp.run_with_shutdown(async move {
        let _ = stop.await;
    }));
    let hub = serve(build_app(hub::routes(hub_state), ServiceRole::Hub, 1 << 20)).await;

    let (intake_ws, _) = HubHandle::spawn(WebSocketConfig::default());
    let intake_store = Arc::new(MemoryStore::new(IdStrategy::Sequential));
    let adt = AdtSender::new(
        MllpClient::new(mllp_addr).with_timeout(Duration::from_secs(2)),
        intake_store.clone(),
        intake_store.clone(),
        Arc::new(intake_ws.clone()),
    );
    let fhir = FhirClient::new(hub.url(""), None).unwrap();
    let state = IntakeState::new(intake_store, adt, fhir, intake_ws.clone());
    let intake = serve_on(
        intake_listener,
        build_app(intake::routes(state), ServiceRole::Intake, 1 << 20),
    );

    Deployment {
        intake,
        intake_ws,
        _hub: hub,
        hub_store,
        _clinician: clinician,
        _mllp_shutdown: mllp_shutdown,
    }
}

async fn next_frame(socket: &mut Socket) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("frame within timeout")
            .unwrap()
            .unwrap();
        if msg.is_text() {
            return serde_json::from_str(msg.to_text().unwrap()).unwrap();
        }
    }
}

async fn connect(deployment: &Deployment) -> Socket {
    let (socket, _) = connect_async(deployment.intake.ws_url()).await.unwrap();
    let ws = &deployment.intake_ws;
    assert!(eventually(move || async move { ws.client_count().await == 1 }).await);
    socket
}

#[tokio::test]
async fn admission_encounter_and_discharge_round_trip() {
    let deployment = deploy().await;
    let mut socket = connect(&deployment).await;
    let http = reqwest::Client::new();

    let res = http
        .post(deployment.intake.url("/api/patients"))
        .json(&json!({
            "first_name": "Jane",
            "last_name": "Smith",
            "date_of_birth": "1990-01-01",
            "gender": "female"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["id"], "1");
    assert!(created["his_patient_id"].is_null());

    let frame = next_frame(&mut socket).await;
    assert_eq!(frame["type"], "patient_created");
    let frame = next_frame(&mut socket).await;
    assert_eq!(frame["type"], "patient_his_id_update");
    let hub_id = frame["data"]["his_patient_id"].as_str().unwrap().to_string();
    assert_eq!(frame["data"]["id"], "1");

    let local: Value = http
        .get(deployment.intake.url("/api/patients/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(local["his_patient_id"], hub_id.as_str());

    let canonical = deployment.hub_store.get_patient_by_id(&hub_id).await.unwrap();
    assert_eq!(canonical.last_name, "Smith");
    assert_eq!(canonical.date_of_birth, "1990-01-01");
    assert_eq!(canonical.gender, "female");

    let practitioner = deployment
        .hub_store
        .create_practitioner(NewPractitioner {
            first_name: "Gregory".into(),
            last_name: "House".into(),
            middle_name: None,
            specialization: "Diagnostics".into(),
        })
        .await
        .unwrap();

    let res = http
        .post(deployment.intake.url("/api/encounters"))
        .json(&json!({
            "patient_id": 1,
            "practitioner_id": practitioner.id,
            "start_time": "2024-03-01T10:15:30Z"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let encounter_id = res.json::<Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let stored = deployment
        .hub_store
        .get_encounter_by_id(&encounter_id)
        .await
        .unwrap();
    assert_eq!(stored.encounter.status, EncounterStatus::Planned);
    assert_eq!(stored.encounter.patient_id, hub_id);

    let frame = next_frame(&mut socket).await;
    assert_eq!(frame["type"], "encounter_created");
    assert_eq!(frame["data"]["id"], encounter_id.as_str());
    assert_eq!(frame["data"]["patientName"], "Smith Jane");
    assert_eq!(frame["data"]["patientGender"], "female");
    assert_eq!(frame["data"]["practitionerName"], "House Gregory");
    assert_eq!(frame["data"]["practitionerSpecialization"], "Diagnostics");
    assert_eq!(frame["data"]["status"], "planned");
    assert_eq!(frame["data"]["createdAt"], "2024-03-01T10:15:30Z");

    let listed: Vec<Value> = http
        .get(deployment.intake.url("/api/encounters"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["patientId"], hub_id.as_str());

    let res = http
        .patch(deployment.intake.url(&format!("/api/encounters/{encounter_id}/status")))
        .json(&json!({"status": "in-progress"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"message": "Status updated successfully"})
    );
    let frame = next_frame(&mut socket).await;
    assert_eq!(frame["type"], "encounter_status_updated");
    assert_eq!(frame["data"]["status"], "in-progress");

    let res = http
        .delete(deployment.intake.url("/api/patients/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let frame = next_frame(&mut socket).await;
    assert_eq!(frame["type"], "patient_deleted");
    assert_eq!(frame["data"]["id"], "1");

    let hub_store = &deployment.hub_store;
    let hub_id = hub_id.as_str();
    assert!(
        eventually(move || async move { hub_store.get_patient_by_id(hub_id).await.is_err() })
            .await
    );
}

#[tokio::test]
async fn encounter_requests_need_a_registered_patient() {
    let hub = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&hub)
        .await;

    let (ws, _) = HubHandle::spawn(WebSocketConfig::default());
    let store = Arc::new(MemoryStore::new(IdStrategy::Sequential));
    // Nothing listens on port 1, so admissions never complete.
    let adt = AdtSender::new(
        MllpClient::new("127.0.0.1:1").with_timeout(Duration::from_millis(200)),
        store.clone(),
        store.clone(),
        Arc::new(ws.clone()),
    );
    let fhir = FhirClient::new(hub.uri(), None).unwrap();
    let intake = serve(build_app(
        intake::routes(IntakeState::new(store, adt, fhir, ws)),
        ServiceRole::Intake,
        1 << 20,
    ))
    .await;
    let http = reqwest::Client::new();

    let res = http
        .post(intake.url("/api/patients"))
        .json(&json!({"first_name": "Jane", "last_name": "Smith", "date_of_birth": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(
        res.json::<Value>().await.unwrap()["error"],
        "first_name, last_name, and date_of_birth are required"
    );

    let res = http
        .post(intake.url("/api/patients"))
        .json(&json!({"first_name": "Jane", "last_name": "Smith", "date_of_birth": "1990-01-01"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);

    let encounter = |patient_id: Value| {
        http.post(intake.url("/api/encounters"))
            .json(&json!({
                "patient_id": patient_id,
                "practitioner_id": "pr-1",
                "start_time": "2024-03-01T10:15:30Z"
            }))
            .send()
    };

    let res = encounter(json!("1")).await.unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(
        res.json::<Value>().await.unwrap()["error"],
        "patient does not have HIS Patient ID yet"
    );

    let res = encounter(json!(42)).await.unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(res.json::<Value>().await.unwrap()["error"], "patient not found");

    let res = http
        .patch(intake.url("/api/encounters/e-1/status"))
        .json(&json!({"status": "discharged"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = http.delete(intake.url("/api/patients/99")).send().await.unwrap();
    assert_eq!(res.status(), 404);

    let res = http.delete(intake.url("/api/patients/1")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"message": "patient deleted successfully"})
    );
}
