//! HTTP client the satellites use to reach the hub's FHIR surface.

use std::time::Duration;

use medbridge_core::EncounterStatus;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use time::OffsetDateTime;

use crate::bundle;
use crate::encounter::{EncounterResource, EncounterSummary, encounter_request, status_patch};
use crate::error::{FhirError, Result};
use crate::practitioner::{PractitionerResource, PractitionerSummary};
use crate::value::string_value;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct FhirClient {
    base_url: String,
    http: Client,
}

impl FhirClient {
    /// Client with the default timeout. `ca_certificate` is a PEM bundle
    /// trusted in addition to the platform roots.
    pub fn new(base_url: impl Into<String>, ca_certificate: Option<&[u8]>) -> Result<Self> {
        let mut builder = Client::builder().timeout(DEFAULT_TIMEOUT);
        if let Some(pem) = ca_certificate {
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(pem)?);
        }
        Ok(Self::with_client(base_url, builder.build()?))
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/fhir/{path}", self.base_url)
    }

    async fn check(response: Response, expected: StatusCode) -> Result<Response> {
        let status = response.status();
        if status == expected {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(FhirError::upstream(status.as_u16(), body))
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let response = self.http.get(self.url(path)).send().await?;
        let response = Self::check(response, StatusCode::OK).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| FhirError::decode(e.to_string()))
    }

    /// POST a new encounter (status `PLANNED`) and return its hub id.
    pub async fn create_encounter(
        &self,
        patient_hub_id: &str,
        practitioner_id: &str,
        start_time: OffsetDateTime,
    ) -> Result<String> {
        let body = encounter_request(patient_hub_id, practitioner_id, start_time);
        tracing::info!(patient_hub_id, practitioner_id, "creating encounter at hub");

        let response = self
            .http
            .post(self.url("Encounter"))
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response, StatusCode::CREATED).await?;
        let created: Value = response
            .json()
            .await
            .map_err(|e| FhirError::decode(e.to_string()))?;

        string_value(created.get("id"))
            .filter(|id| !id.is_empty())
            .ok_or_else(|| FhirError::decode("created encounter has no id"))
    }

    /// Validate `status` locally, then PATCH it to the hub.
    pub async fn update_encounter_status(&self, encounter_id: &str, status: &str) -> Result<()> {
        let status = EncounterStatus::parse(status)?;
        tracing::info!(encounter_id, status = %status, "updating encounter status at hub");

        let response = self
            .http
            .patch(self.url(&format!("Encounter/{encounter_id}")))
            .json(&status_patch(status))
            .send()
            .await?;
        Self::check(response, StatusCode::OK).await?;
        Ok(())
    }

    pub async fn get_encounters(&self) -> Result<Vec<EncounterSummary>> {
        let searchset = self.get_json("Encounter").await?;
        Ok(bundle::entries(&searchset)
            .into_iter()
            .map(|resource| EncounterResource::new(resource).summary())
            .collect())
    }

    pub async fn get_encounters_by_practitioner(
        &self,
        practitioner_id: &str,
    ) -> Result<Vec<EncounterSummary>> {
        let searchset = self.get_json("Encounter").await?;
        let encounters: Vec<_> = bundle::entries(&searchset)
            .into_iter()
            .map(EncounterResource::new)
            .filter(|resource| resource.has_participant(practitioner_id))
            .map(|resource| resource.summary())
            .collect();
        tracing::debug!(practitioner_id, count = encounters.len(), "encounters for practitioner");
        Ok(encounters)
    }

    pub async fn get_practitioners(&self) -> Result<Vec<PractitionerSummary>> {
        let searchset = self.get_json("Practitioner").await?;
        Ok(bundle::entries(&searchset)
            .into_iter()
            .map(|resource| PractitionerResource::new(resource).summary())
            .collect())
    }

    pub async fn get_practitioner(&self, practitioner_id: &str) -> Result<PractitionerSummary> {
        let resource = self
            .get_json(&format!("Practitioner/{practitioner_id}"))
            .await?;
        Ok(PractitionerResource::new(&resource).summary())
    }
}
