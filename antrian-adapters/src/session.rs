//! Three-step postback session against the queue site.
//!
//! ```text
//!   GET  /                          -> FormState(Landing)   + unit options
//!   POST / __EVENTTARGET=ddUNIT     -> FormState(Unit=X)    + doctor options
//!   POST / __EVENTTARGET=ddDaftarDokter                     -> queue page HTML
//! ```
//!
//! The server only populates the practitioner list, and only accepts a
//! practitioner postback, after the unit postback. Each step therefore
//! consumes the [`FormState`] issued by the step before it.

use std::sync::atomic::{AtomicU64, Ordering};

use scraper::Html;

use antrian_types::{FacilityOption, QueueSnapshot};

use crate::form::{HiddenFields, Stage, DOCTOR_SELECT_ID, UNIT_SELECT_ID};
use crate::html::select_options;
use crate::parser::parse_queue_page;
use crate::transport::Transport;
use crate::{AdapterError, FormState};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// One poll cycle's worth of postback interaction.
///
/// Sessions are cheap and meant to be discarded after a cycle; server state
/// is not assumed to survive the polling interval.
#[derive(Debug)]
pub struct FormSession<T> {
    transport: T,
    endpoint: String,
    id: u64,
    /// Generation of the most recently issued state. Zero before step 1.
    generation: u64,
}

impl<T: Transport> FormSession<T> {
    /// Create a session that talks to `endpoint` through `transport`.
    pub fn new(transport: T, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
        }
    }

    /// Step 1: load the landing page.
    pub async fn fetch_unit_options(
        &mut self,
    ) -> Result<(FormState, Vec<FacilityOption>), AdapterError> {
        if self.generation != 0 {
            return Err(AdapterError::session("landing page already loaded in this session"));
        }

        tracing::debug!(session = self.id, "loading landing page");
        let body = self.transport.get(&self.endpoint).await?;

        let doc = Html::parse_document(&body);
        let fields = HiddenFields::extract(&doc)?;
        let units = required_options(&doc, UNIT_SELECT_ID)?;
        Ok((self.issue(fields, Stage::Landing), units))
    }

    /// Step 2: post the unit selection.
    pub async fn fetch_doctor_options(
        &mut self,
        state: FormState,
        unit_code: &str,
    ) -> Result<(FormState, Vec<FacilityOption>), AdapterError> {
        self.check(&state, &Stage::Landing)?;
        if unit_code.is_empty() {
            return Err(AdapterError::session("unit code is empty"));
        }

        tracing::debug!(session = self.id, unit = unit_code, "posting unit selection");
        let body = state.postback(
            UNIT_SELECT_ID,
            &[(UNIT_SELECT_ID, unit_code), (DOCTOR_SELECT_ID, "")],
        );
        let body = self.transport.post_form(&self.endpoint, &body).await?;

        let doc = Html::parse_document(&body);
        let fields = HiddenFields::extract(&doc)?;
        let doctors = required_options(&doc, DOCTOR_SELECT_ID)?;
        let stage = Stage::UnitSelected {
            unit_code: unit_code.to_string(),
        };
        Ok((self.issue(fields, stage), doctors))
    }

    /// Step 3: post the practitioner selection and return the queue page.
    pub async fn fetch_queue_page(
        &mut self,
        state: FormState,
        unit_code: &str,
        doctor_code: &str,
    ) -> Result<String, AdapterError> {
        let expected = Stage::UnitSelected {
            unit_code: unit_code.to_string(),
        };
        self.check(&state, &expected)?;
        if doctor_code.is_empty() {
            return Err(AdapterError::session("doctor code is empty"));
        }

        tracing::debug!(
            session = self.id,
            unit = unit_code,
            doctor = doctor_code,
            "posting doctor selection"
        );
        let body = state.postback(
            DOCTOR_SELECT_ID,
            &[(UNIT_SELECT_ID, unit_code), (DOCTOR_SELECT_ID, doctor_code)],
        );
        let page = self.transport.post_form(&self.endpoint, &body).await?;

        // The queue page ends the session; no state is handed out for it.
        self.generation += 1;
        Ok(page)
    }

    /// List units (step 1 only).
    pub async fn units(mut self) -> Result<Vec<FacilityOption>, AdapterError> {
        let (_, units) = self.fetch_unit_options().await?;
        Ok(units)
    }

    /// List practitioners of a unit (steps 1 and 2).
    pub async fn doctors(mut self, unit_code: &str) -> Result<Vec<FacilityOption>, AdapterError> {
        let (state, _) = self.fetch_unit_options().await?;
        let (_, doctors) = self.fetch_doctor_options(state, unit_code).await?;
        Ok(doctors)
    }

    /// Run all three steps and parse the resulting page.
    pub async fn collect(
        mut self,
        unit_code: &str,
        doctor_code: &str,
    ) -> Result<QueueSnapshot, AdapterError> {
        let (state, _) = self.fetch_unit_options().await?;
        let (state, doctors) = self.fetch_doctor_options(state, unit_code).await?;
        if !doctors.iter().any(|d| d.code == doctor_code) {
            tracing::warn!(
                unit = unit_code,
                doctor = doctor_code,
                "doctor not listed for unit, posting anyway"
            );
        }
        let page = self.fetch_queue_page(state, unit_code, doctor_code).await?;
        parse_queue_page(&page, unit_code, doctor_code)
    }

    fn issue(&mut self, fields: HiddenFields, stage: Stage) -> FormState {
        self.generation += 1;
        FormState {
            fields,
            session_id: self.id,
            generation: self.generation,
            stage,
        }
    }

    fn check(&self, state: &FormState, expected: &Stage) -> Result<(), AdapterError> {
        if state.session_id != self.id {
            return Err(AdapterError::session(format!(
                "state from session {} used in session {}",
                state.session_id, self.id
            )));
        }
        if state.generation != self.generation {
            return Err(AdapterError::session(format!(
                "stale state (generation {}, current {})",
                state.generation, self.generation
            )));
        }
        if &state.stage != expected {
            return Err(AdapterError::session(format!(
                "state captured at {:?} cannot be used for {:?}",
                state.stage, expected
            )));
        }
        Ok(())
    }
}

fn required_options(doc: &Html, id: &str) -> Result<Vec<FacilityOption>, AdapterError> {
    select_options(doc, id).ok_or_else(|| AdapterError::shape(format!("select `{}` not found", id)))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::form::{EVENT_TARGET_FIELD, VIEWSTATE_FIELD};

    const LANDING: &str = include_str!("../fixtures/landing.html");
    const UNIT_SELECTED: &str = include_str!("../fixtures/unit_selected.html");
    const QUEUE: &str = include_str!("../fixtures/queue.html");
    const ENDPOINT: &str = "https://antrian.example/";

    #[derive(Debug, Clone, PartialEq)]
    enum Request {
        Get(String),
        Post(String, Vec<(String, String)>),
    }

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String, AdapterError>>>,
        requests: Mutex<Vec<Request>>,
    }

    impl ScriptedTransport {
        fn with_pages(pages: &[&str]) -> Arc<Self> {
            let transport = Self::default();
            for page in pages {
                transport.push(Ok(page.to_string()));
            }
            Arc::new(transport)
        }

        fn push(&self, response: Result<String, AdapterError>) {
            self.responses.lock().unwrap().push_back(response);
        }

        fn requests(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }

        fn next(&self) -> Result<String, AdapterError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(AdapterError::Connection("script exhausted".into())))
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str) -> Result<String, AdapterError> {
            self.requests.lock().unwrap().push(Request::Get(url.to_string()));
            self.next()
        }

        async fn post_form(
            &self,
            url: &str,
            fields: &[(String, String)],
        ) -> Result<String, AdapterError> {
            self.requests
                .lock()
                .unwrap()
                .push(Request::Post(url.to_string(), fields.to_vec()));
            self.next()
        }
    }

    fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
        fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    #[tokio::test]
    async fn test_collect_runs_three_steps_in_order() {
        let transport = ScriptedTransport::with_pages(&[LANDING, UNIT_SELECTED, QUEUE]);
        let session = FormSession::new(transport.clone(), ENDPOINT);

        let snapshot = session.collect("INT", "DR01").await.unwrap();
        assert_eq!(snapshot.total_count, 24);
        assert_eq!(snapshot.current_number, "A-012");

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0], Request::Get(ENDPOINT.to_string()));

        let Request::Post(_, unit_post) = &requests[1] else {
            panic!("expected unit postback");
        };
        assert_eq!(field(unit_post, EVENT_TARGET_FIELD), Some("ddUNIT"));
        assert_eq!(field(unit_post, "ddUNIT"), Some("INT"));
        assert_eq!(field(unit_post, "ddDaftarDokter"), Some(""));
        assert_eq!(field(unit_post, "__EVENTVALIDATION"), Some("/wEdAAbLANDING0001"));

        let Request::Post(_, doctor_post) = &requests[2] else {
            panic!("expected doctor postback");
        };
        assert_eq!(field(doctor_post, EVENT_TARGET_FIELD), Some("ddDaftarDokter"));
        assert_eq!(field(doctor_post, "ddUNIT"), Some("INT"));
        assert_eq!(field(doctor_post, "ddDaftarDokter"), Some("DR01"));
        // Step 3 must carry the state rendered by step 2, not step 1.
        assert_eq!(field(doctor_post, "__EVENTVALIDATION"), Some("/wEdAAbUNIT0002"));
        assert_eq!(
            field(doctor_post, VIEWSTATE_FIELD),
            Some("/wEPDwUKLTg0NzY2NzE4MQ9kFgICAw9kFgQCAQ8QZA8WBGYCAQICAgMWBBAFE1VOSVRTRUxFQ1RFRA==")
        );
        assert_ne!(
            field(doctor_post, VIEWSTATE_FIELD),
            field(unit_post, VIEWSTATE_FIELD)
        );
    }

    #[tokio::test]
    async fn test_unit_and_doctor_options() {
        let transport = ScriptedTransport::with_pages(&[LANDING, UNIT_SELECTED]);
        let mut session = FormSession::new(transport, ENDPOINT);

        let (state, units) = session.fetch_unit_options().await.unwrap();
        assert_eq!(units.len(), 4);
        assert_eq!(units[2], FacilityOption::new("OBG", "Poli Kebidanan & Kandungan"));
        assert_eq!(state.event_validation(), Some("/wEdAAbLANDING0001"));

        let (state, doctors) = session.fetch_doctor_options(state, "INT").await.unwrap();
        let codes: Vec<&str> = doctors.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["DR01", "DR02", "DR03"]);
        assert_eq!(doctors[2].label, "dr. Bambang Hartono, Sp.PD-KGEH");
        assert_eq!(state.event_validation(), Some("/wEdAAbUNIT0002"));
        assert!(state
            .extra_hidden_fields()
            .iter()
            .any(|(name, _)| name == "__VIEWSTATEGENERATOR"));
    }

    #[tokio::test]
    async fn test_skipping_unit_step_is_rejected() {
        let transport = ScriptedTransport::with_pages(&[LANDING, QUEUE]);
        let mut session = FormSession::new(transport.clone(), ENDPOINT);

        let (landing, _) = session.fetch_unit_options().await.unwrap();
        let err = session
            .fetch_queue_page(landing, "INT", "DR01")
            .await
            .unwrap_err();

        assert!(matches!(err, AdapterError::SessionProtocol(_)));
        assert_eq!(transport.requests().len(), 1, "no request may be sent");
    }

    #[tokio::test]
    async fn test_state_for_other_unit_is_rejected() {
        let transport = ScriptedTransport::with_pages(&[LANDING, UNIT_SELECTED, QUEUE]);
        let mut session = FormSession::new(transport, ENDPOINT);

        let (landing, _) = session.fetch_unit_options().await.unwrap();
        let (unit_state, _) = session.fetch_doctor_options(landing, "INT").await.unwrap();
        let err = session
            .fetch_queue_page(unit_state, "ANK", "DR07")
            .await
            .unwrap_err();

        assert!(matches!(err, AdapterError::SessionProtocol(_)));
    }

    #[tokio::test]
    async fn test_state_from_other_session_is_rejected() {
        let mut first = FormSession::new(ScriptedTransport::with_pages(&[LANDING]), ENDPOINT);
        let mut second = FormSession::new(ScriptedTransport::with_pages(&[LANDING]), ENDPOINT);

        let (foreign, _) = first.fetch_unit_options().await.unwrap();
        let _ = second.fetch_unit_options().await.unwrap();

        let err = second.fetch_doctor_options(foreign, "INT").await.unwrap_err();
        assert!(err.to_string().contains("session"));
    }

    #[tokio::test]
    async fn test_landing_loads_once_per_session() {
        let transport = ScriptedTransport::with_pages(&[LANDING, LANDING]);
        let mut session = FormSession::new(transport, ENDPOINT);

        session.fetch_unit_options().await.unwrap();
        let err = session.fetch_unit_options().await.unwrap_err();
        assert!(matches!(err, AdapterError::SessionProtocol(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Err(AdapterError::Timeout));
        let session = FormSession::new(transport, ENDPOINT);

        let err = session.collect("INT", "DR01").await.unwrap_err();
        assert!(matches!(err, AdapterError::Timeout));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_unit_response_without_doctor_select_is_shape_error() {
        let page = r#"<form id="frm"><input type="hidden" name="__VIEWSTATE" value="v"/></form>"#;
        let transport = ScriptedTransport::with_pages(&[LANDING, page]);
        let session = FormSession::new(transport, ENDPOINT);

        let err = session.doctors("INT").await.unwrap_err();
        assert!(matches!(err, AdapterError::ProtocolShape(_)));
    }

    #[tokio::test]
    async fn test_empty_codes_are_rejected() {
        let transport = ScriptedTransport::with_pages(&[LANDING]);
        let mut session = FormSession::new(transport, ENDPOINT);

        let (landing, _) = session.fetch_unit_options().await.unwrap();
        let err = session.fetch_doctor_options(landing, "").await.unwrap_err();
        assert!(matches!(err, AdapterError::SessionProtocol(_)));
    }
}
