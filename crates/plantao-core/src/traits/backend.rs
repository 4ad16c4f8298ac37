// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shift backend seam: the four business endpoints, the note-fetch endpoint
//! and the workflow webhook.
//!
//! Implementations own retries and per-endpoint circuit breaking; callers see
//! only `BackendTransient` / `BackendPermanent` / `Timeout`.

use async_trait::async_trait;

use crate::backend::{
    ClinicalDataUpdate, ReportSummaryUpdate, ScheduleInfo, ScheduleResponseUpdate, ShiftNote,
};
use crate::error::PlantaoError;

#[async_trait]
pub trait ShiftBackend: Send + Sync {
    /// Fetch the shift context for a caregiver phone number.
    async fn get_schedule_started(
        &self,
        phone_number: &str,
    ) -> Result<ScheduleInfo, PlantaoError>;

    /// Record the caregiver's attendance answer for a schedule.
    async fn update_work_schedule_response(
        &self,
        request: &ScheduleResponseUpdate,
    ) -> Result<(), PlantaoError>;

    /// Persist a clinical measurement or note on the shift report.
    async fn update_clinical_data(
        &self,
        request: &ClinicalDataUpdate,
    ) -> Result<(), PlantaoError>;

    /// Persist the final shift summary.
    async fn update_report_summary(
        &self,
        request: &ReportSummaryUpdate,
    ) -> Result<(), PlantaoError>;

    /// Fetch the notes already recorded on a report (finalization seeding).
    async fn get_note_report(
        &self,
        report_id: &str,
        report_date: &str,
    ) -> Result<Vec<ShiftNote>, PlantaoError>;

    /// Deliver a clinical/operational payload to the workflow webhook.
    /// Idempotent on the receiving side.
    async fn post_workflow_event(
        &self,
        payload: &serde_json::Value,
    ) -> Result<(), PlantaoError>;

    /// True when no endpoint circuit is currently open (readiness probe).
    fn is_reachable(&self) -> bool;
}
