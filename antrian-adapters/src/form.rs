//! Postback state carried between the requests of one session.
//!
//! ASP.NET WebForms pages keep their server-side state in hidden inputs.
//! Every postback must send back exactly what the previous response
//! rendered, so the state is captured as an opaque [`FormState`] token and
//! threaded through the session by value.

use scraper::Html;

use crate::html::selector;
use crate::AdapterError;

/// Id of the form wrapping the whole page.
pub const FORM_ID: &str = "frm";
/// Hidden field holding the serialized page state.
pub const VIEWSTATE_FIELD: &str = "__VIEWSTATE";
/// Hidden field holding the allowed postback values.
pub const EVENT_VALIDATION_FIELD: &str = "__EVENTVALIDATION";
/// Hidden field naming the control that raised the postback.
pub const EVENT_TARGET_FIELD: &str = "__EVENTTARGET";
/// Hidden field carrying the postback argument.
pub const EVENT_ARGUMENT_FIELD: &str = "__EVENTARGUMENT";
/// Select control listing units.
pub const UNIT_SELECT_ID: &str = "ddUNIT";
/// Select control listing practitioners of the selected unit.
pub const DOCTOR_SELECT_ID: &str = "ddDaftarDokter";

/// Which postback a state token unlocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Stage {
    /// Captured from the landing page; allows the unit postback.
    Landing,
    /// Captured after selecting a unit; allows the practitioner postback.
    UnitSelected { unit_code: String },
}

/// Hidden inputs rendered by one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HiddenFields {
    pub view_state: String,
    pub event_validation: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl HiddenFields {
    /// Read every named input of the page form.
    pub fn extract(doc: &Html) -> Result<Self, AdapterError> {
        let form_selector = selector(&format!("form#{}", FORM_ID));
        let form = doc
            .select(&form_selector)
            .next()
            .ok_or_else(|| AdapterError::shape(format!("form `{}` not found", FORM_ID)))?;

        let mut view_state = None;
        let mut event_validation = None;
        let mut extra = Vec::new();

        for input in form.select(&selector("input")) {
            let Some(name) = input.value().attr("name") else {
                continue;
            };
            let value = input.value().attr("value").unwrap_or_default().to_string();
            match name {
                VIEWSTATE_FIELD => view_state = Some(value),
                EVENT_VALIDATION_FIELD => event_validation = Some(value),
                _ => extra.push((name.to_string(), value)),
            }
        }

        let view_state = view_state
            .ok_or_else(|| AdapterError::shape(format!("hidden field `{}` missing", VIEWSTATE_FIELD)))?;

        Ok(Self {
            view_state,
            event_validation,
            extra,
        })
    }
}

/// Opaque postback state captured from a response.
///
/// A token is bound to the [`FormSession`](crate::FormSession) that issued
/// it and to the step it unlocks. Passing it to the next step consumes it;
/// a token from another session, an older response, or a different unit is
/// rejected with [`AdapterError::SessionProtocol`].
#[derive(Debug)]
pub struct FormState {
    pub(crate) fields: HiddenFields,
    pub(crate) session_id: u64,
    pub(crate) generation: u64,
    pub(crate) stage: Stage,
}

impl FormState {
    /// The `__VIEWSTATE` value.
    pub fn view_state(&self) -> &str {
        &self.fields.view_state
    }

    /// The `__EVENTVALIDATION` value, when the page renders one.
    pub fn event_validation(&self) -> Option<&str> {
        self.fields.event_validation.as_deref()
    }

    /// All other named inputs of the form, in document order.
    pub fn extra_hidden_fields(&self) -> &[(String, String)] {
        &self.fields.extra
    }

    /// Build the body of a postback raised by `target`.
    ///
    /// Starts from the captured inputs and overrides the event fields and
    /// the given control values.
    pub(crate) fn postback(&self, target: &str, values: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut body = Vec::with_capacity(self.fields.extra.len() + 4);
        body.push((VIEWSTATE_FIELD.to_string(), self.fields.view_state.clone()));
        if let Some(validation) = &self.fields.event_validation {
            body.push((EVENT_VALIDATION_FIELD.to_string(), validation.clone()));
        }
        body.extend(self.fields.extra.iter().cloned());

        set_field(&mut body, EVENT_TARGET_FIELD, target);
        set_field(&mut body, EVENT_ARGUMENT_FIELD, "");
        for (name, value) in values {
            set_field(&mut body, name, value);
        }
        body
    }
}

fn set_field(body: &mut Vec<(String, String)>, name: &str, value: &str) {
    match body.iter_mut().find(|(n, _)| n == name) {
        Some((_, v)) => *v = value.to_string(),
        None => body.push((name.to_string(), value.to_string())),
    }
}
