use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{Json, Router};
use medbridge_fhir::FhirClient;
use medbridge_hl7::{AdtSender, MllpClient, MllpServer};
use medbridge_notifications::{EncounterNotifier, NotificationTarget, WebhookAdapter};
use medbridge_storage::{IdStrategy, MemoryStore};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_rustls::rustls::pki_types::ServerName;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, ServiceRole};
use crate::roles::clinician::{self, ClinicianState};
use crate::roles::hub::{self, HubState};
use crate::roles::intake::{self, IntakeState};
use crate::tls;
use crate::ws::HubHandle;

/// Wrap role routes with `/healthz` and the shared middleware stack.
pub fn build_app(routes: Router, role: ServiceRole, body_limit: usize) -> Router {
    routes
        .route(
            "/healthz",
            get(move || async move { Json(json!({ "status": "ok", "role": role.to_string() })) }),
        )
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(
                        |req: &axum::http::Request<_>| {
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri(),
                            )
                        },
                    ),
                )
                .layer(CorsLayer::permissive()),
        )
        .layer(DefaultBodyLimit::max(body_limit))
}

pub struct MedbridgeServer {
    role: ServiceRole,
    addr: SocketAddr,
    app: Router,
    mllp: Option<MllpServer>,
}

pub struct ServerBuilder {
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    /// Wire the configured role. The hub's MLLP listener is bound here.
    pub async fn build(self) -> anyhow::Result<MedbridgeServer> {
        let cfg = self.config;
        let (ws, _coordinator) = HubHandle::spawn(cfg.websocket.clone());

        let (routes, mllp) = match cfg.role {
            ServiceRole::Hub => {
                let store = Arc::new(MemoryStore::new(IdStrategy::Uuid));
                let state = HubState::new(store, build_notifier(&cfg)?, ws);

                let mut server = MllpServer::bind(cfg.mllp_addr(), hub::adt_handler(&state))
                    .await
                    .with_context(|| format!("binding MLLP listener on {}", cfg.mllp_addr()))?;
                if let (Some(cert), Some(key)) = (&cfg.tls.cert_path, &cfg.tls.key_path) {
                    server = server.with_tls(tls::load_acceptor(Path::new(cert), Path::new(key))?);
                }
                (hub::routes(state), Some(server))
            }
            ServiceRole::Intake => {
                let store = Arc::new(MemoryStore::new(IdStrategy::Sequential));
                let adt = AdtSender::new(
                    build_mllp_client(&cfg)?,
                    store.clone(),
                    store.clone(),
                    Arc::new(ws.clone()),
                );
                let state = IntakeState::new(store, adt, build_fhir_client(&cfg)?, ws);
                (intake::routes(state), None)
            }
            ServiceRole::Clinician => {
                let state = ClinicianState {
                    fhir: build_fhir_client(&cfg)?,
                    ws,
                };
                (clinician::routes(state), None)
            }
        };

        Ok(MedbridgeServer {
            role: cfg.role,
            addr: cfg.addr(),
            app: build_app(routes, cfg.role, cfg.server.body_limit_bytes),
            mllp,
        })
    }
}

fn read_ca(cfg: &AppConfig) -> anyhow::Result<Option<Vec<u8>>> {
    cfg.tls
        .ca_path
        .as_deref()
        .map(|path| std::fs::read(path).with_context(|| format!("reading CA bundle {path}")))
        .transpose()
}

fn build_fhir_client(cfg: &AppConfig) -> anyhow::Result<FhirClient> {
    let hub_url = cfg
        .fhir
        .hub_url
        .clone()
        .context("fhir.hub_url is not configured")?;
    let ca = read_ca(cfg)?;
    Ok(FhirClient::new(hub_url, ca.as_deref())?)
}

fn build_notifier(cfg: &AppConfig) -> anyhow::Result<EncounterNotifier> {
    let adapter = match read_ca(cfg)? {
        Some(pem) => WebhookAdapter::with_ca_certificate(&pem)?,
        None => WebhookAdapter::new(),
    }
    .with_timeout(cfg.notifications.timeout());

    let targets = [
        ("intake", &cfg.notifications.intake_url),
        ("clinician", &cfg.notifications.clinician_url),
    ]
    .into_iter()
    .filter_map(|(name, url)| url.as_ref().map(|url| NotificationTarget::new(name, url.as_str())))
    .collect();

    Ok(EncounterNotifier::new(Arc::new(adapter), targets))
}

fn build_mllp_client(cfg: &AppConfig) -> anyhow::Result<MllpClient> {
    let hub_addr = cfg
        .mllp
        .hub_addr
        .clone()
        .context("mllp.hub_addr is not configured")?;
    let mut client = MllpClient::new(hub_addr).with_timeout(cfg.mllp.timeout());

    if let Some(ca_path) = &cfg.tls.ca_path {
        let connector = tls::load_connector(Path::new(ca_path))?;
        let name = cfg
            .mllp
            .tls_server_name()
            .context("cannot derive a TLS server name for the hub")?;
        let server_name = ServerName::try_from(name)?;
        client = client.with_tls(connector, server_name);
    }
    Ok(client)
}

impl MedbridgeServer {
    pub fn role(&self) -> ServiceRole {
        self.role
    }

    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Address of the hub's MLLP listener, if this role has one.
    pub fn mllp_addr(&self) -> Option<SocketAddr> {
        self.mllp.as_ref().and_then(|server| server.local_addr().ok())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("binding HTTP listener on {}", self.addr))?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve HTTP (and MLLP for the hub) until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(());
        let mllp_task = self.mllp.map(|server| {
            let mut stop = stop_rx.clone();
            tokio::spawn(server.run_with_shutdown(async move {
                let _ = stop.changed().await;
            }))
        });

        tracing::info!(role = %self.role, addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;

        drop(stop_tx);
        if let Some(task) = mllp_task {
            let _ = task.await;
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
