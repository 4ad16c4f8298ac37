// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ShiftBackend` implementation over the configured endpoint URLs.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use plantao_config::model::{BackendConfig, WebhookConfig};
use plantao_core::backend::{
    ClinicalDataUpdate, ReportSummaryUpdate, ScheduleInfo, ScheduleResponseUpdate, ShiftNote,
};
use plantao_core::types::mask_phone;
use plantao_core::{PlantaoError, ShiftBackend};

use crate::client::BackendHttp;

/// HTTP shift backend: one function per endpoint, each behind its own
/// circuit breaker.
pub struct HttpShiftBackend {
    http: BackendHttp,
    get_schedule_url: Option<String>,
    update_schedule_url: Option<String>,
    update_clinical_url: Option<String>,
    update_summary_url: Option<String>,
    get_note_report_url: Option<String>,
    webhook_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NoteReportResponse {
    #[serde(default)]
    notes: Vec<ShiftNote>,
}

impl HttpShiftBackend {
    pub fn new(backend: &BackendConfig, webhook: &WebhookConfig) -> Result<Self, PlantaoError> {
        let http = BackendHttp::new(backend.timeout_secs, backend.max_retries)
            .map_err(PlantaoError::from)?;
        Ok(Self {
            http,
            get_schedule_url: backend.get_schedule_url.clone(),
            update_schedule_url: backend.update_schedule_url.clone(),
            update_clinical_url: backend.update_clinical_url.clone(),
            update_summary_url: backend.update_summary_url.clone(),
            get_note_report_url: backend.get_note_report_url.clone(),
            webhook_url: webhook.url.clone(),
        })
    }

    fn url_for(
        url: &Option<String>,
        endpoint: &'static str,
    ) -> Result<String, PlantaoError> {
        url.clone()
            .ok_or_else(|| PlantaoError::Config(format!("no URL configured for {endpoint}")))
    }
}

#[async_trait]
impl ShiftBackend for HttpShiftBackend {
    async fn get_schedule_started(
        &self,
        phone_number: &str,
    ) -> Result<ScheduleInfo, PlantaoError> {
        let url = Self::url_for(&self.get_schedule_url, "getScheduleStarted")?;
        info!(phone = %mask_phone(phone_number), "fetching shift context");
        let body = serde_json::json!({ "phoneNumber": phone_number });
        let response = self
            .http
            .post_json("getScheduleStarted", &url, &body)
            .await
            .map_err(PlantaoError::from)?;
        serde_json::from_value(response).map_err(|e| PlantaoError::BackendPermanent(format!(
            "getScheduleStarted returned an unexpected shape: {e}"
        )))
    }

    async fn update_work_schedule_response(
        &self,
        request: &ScheduleResponseUpdate,
    ) -> Result<(), PlantaoError> {
        let url = Self::url_for(&self.update_schedule_url, "updateWorkScheduleResponse")?;
        let body = serde_json::to_value(request).map_err(PlantaoError::storage)?;
        self.http
            .post_json("updateWorkScheduleResponse", &url, &body)
            .await
            .map_err(PlantaoError::from)?;
        info!(schedule = request.schedule_identifier.as_str(), response = request.response_value.as_str(), "schedule response updated");
        Ok(())
    }

    async fn update_clinical_data(
        &self,
        request: &ClinicalDataUpdate,
    ) -> Result<(), PlantaoError> {
        let url = Self::url_for(&self.update_clinical_url, "updateClinicalData")?;
        let body = serde_json::to_value(request).map_err(PlantaoError::storage)?;
        self.http
            .post_json("updateClinicalData", &url, &body)
            .await
            .map_err(PlantaoError::from)?;
        info!(report = request.report_id.as_str(), scenario = ?request.scenario(), "clinical data updated");
        Ok(())
    }

    async fn update_report_summary(
        &self,
        request: &ReportSummaryUpdate,
    ) -> Result<(), PlantaoError> {
        let url = Self::url_for(&self.update_summary_url, "updatereportsummaryad")?;
        let body = serde_json::to_value(request).map_err(PlantaoError::storage)?;
        self.http
            .post_json("updatereportsummaryad", &url, &body)
            .await
            .map_err(PlantaoError::from)?;
        info!(report = request.report_id.as_str(), "report summary updated");
        Ok(())
    }

    async fn get_note_report(
        &self,
        report_id: &str,
        report_date: &str,
    ) -> Result<Vec<ShiftNote>, PlantaoError> {
        let url = Self::url_for(&self.get_note_report_url, "getNoteReport")?;
        let body = serde_json::json!({ "reportID": report_id, "reportDate": report_date });
        let response = self
            .http
            .post_json("getNoteReport", &url, &body)
            .await
            .map_err(PlantaoError::from)?;
        let parsed: NoteReportResponse = serde_json::from_value(response).map_err(|e| {
            PlantaoError::BackendPermanent(format!(
                "getNoteReport returned an unexpected shape: {e}"
            ))
        })?;
        Ok(parsed.notes)
    }

    async fn post_workflow_event(
        &self,
        payload: &serde_json::Value,
    ) -> Result<(), PlantaoError> {
        let url = Self::url_for(&self.webhook_url, "workflowWebhook")?;
        self.http
            .post_json("workflowWebhook", &url, payload)
            .await
            .map_err(PlantaoError::from)?;
        Ok(())
    }

    fn is_reachable(&self) -> bool {
        self.http.all_circuits_closed()
    }
}
