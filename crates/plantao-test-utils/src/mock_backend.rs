// SPDX-FileCopyrightText: 2026 Plantao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock shift backend that records every call and replays configured data.

use std::sync::Mutex;

use async_trait::async_trait;

use plantao_core::backend::{
    ClinicalDataUpdate, ReportSummaryUpdate, ScheduleInfo, ScheduleResponseUpdate, ShiftNote,
};
use plantao_core::{PlantaoError, ShiftBackend};

/// One recorded backend interaction.
#[derive(Debug, Clone)]
pub enum BackendCall {
    GetSchedule(String),
    UpdateSchedule(ScheduleResponseUpdate),
    UpdateClinical(ClinicalDataUpdate),
    UpdateSummary(ReportSummaryUpdate),
    GetNoteReport { report_id: String },
    WorkflowEvent(serde_json::Value),
}

/// Failure injected into mutating calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    Transient,
    Permanent,
}

/// Recording backend double. `get_schedule_started` replays the configured
/// [`ScheduleInfo`], which tests may swap mid-scenario to emulate backend
/// state changes (e.g. after an attendance commit).
#[derive(Default)]
pub struct MockBackend {
    schedule: Mutex<ScheduleInfo>,
    notes: Mutex<Vec<ShiftNote>>,
    fail_mode: Mutex<Option<FailMode>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedule(self, info: ScheduleInfo) -> Self {
        *self.schedule.lock().unwrap() = info;
        self
    }

    pub fn with_notes(self, notes: Vec<ShiftNote>) -> Self {
        *self.notes.lock().unwrap() = notes;
        self
    }

    /// Replace the schedule the next bootstrap will see.
    pub fn set_schedule(&self, info: ScheduleInfo) {
        *self.schedule.lock().unwrap() = info;
    }

    /// Make mutating calls fail until cleared.
    pub fn set_fail_mode(&self, mode: Option<FailMode>) {
        *self.fail_mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn schedule_update_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::UpdateSchedule(_)))
    }

    pub fn clinical_update_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::UpdateClinical(_)))
    }

    pub fn summary_update_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::UpdateSummary(_)))
    }

    pub fn workflow_event_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::WorkflowEvent(_)))
    }

    fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn maybe_fail(&self) -> Result<(), PlantaoError> {
        match *self.fail_mode.lock().unwrap() {
            Some(FailMode::Transient) => {
                Err(PlantaoError::BackendTransient("mock transient failure".into()))
            }
            Some(FailMode::Permanent) => {
                Err(PlantaoError::BackendPermanent("mock permanent failure".into()))
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ShiftBackend for MockBackend {
    async fn get_schedule_started(
        &self,
        phone_number: &str,
    ) -> Result<ScheduleInfo, PlantaoError> {
        self.record(BackendCall::GetSchedule(phone_number.to_string()));
        Ok(self.schedule.lock().unwrap().clone())
    }

    async fn update_work_schedule_response(
        &self,
        request: &ScheduleResponseUpdate,
    ) -> Result<(), PlantaoError> {
        self.maybe_fail()?;
        self.record(BackendCall::UpdateSchedule(request.clone()));
        Ok(())
    }

    async fn update_clinical_data(
        &self,
        request: &ClinicalDataUpdate,
    ) -> Result<(), PlantaoError> {
        self.maybe_fail()?;
        self.record(BackendCall::UpdateClinical(request.clone()));
        Ok(())
    }

    async fn update_report_summary(
        &self,
        request: &ReportSummaryUpdate,
    ) -> Result<(), PlantaoError> {
        self.maybe_fail()?;
        self.record(BackendCall::UpdateSummary(request.clone()));
        Ok(())
    }

    async fn get_note_report(
        &self,
        report_id: &str,
        _report_date: &str,
    ) -> Result<Vec<ShiftNote>, PlantaoError> {
        self.record(BackendCall::GetNoteReport {
            report_id: report_id.to_string(),
        });
        Ok(self.notes.lock().unwrap().clone())
    }

    async fn post_workflow_event(
        &self,
        payload: &serde_json::Value,
    ) -> Result<(), PlantaoError> {
        self.maybe_fail()?;
        self.record(BackendCall::WorkflowEvent(payload.clone()));
        Ok(())
    }

    fn is_reachable(&self) -> bool {
        true
    }
}
