//! Queue page parsing.
//!
//! Pure functions from raw HTML to [`QueueSnapshot`]. Nothing here touches
//! the network, so every edge case can be checked against captured pages.
//!
//! ## Page layout
//!
//! ```text
//! <span id="lblTotal">42</span>          total tickets issued
//! <span id="lblCurrent">A-017</span>     ticket being served
//!
//! <div class="row">
//!   <div><h4>Antrian Selanjutnya</h4></div>   section header
//!   <div>                                      values: one <h1> per ticket
//!     <h1>A-018</h1> <h1>A-019*</h1> ...
//!   </div>
//! </div>
//! ```
//!
//! A trailing `*` marks a ticket whose holder has not checked in.

use scraper::{ElementRef, Html};

use antrian_types::{current_timestamp_ms, label_for, QueueEntry, QueueSnapshot, CHECK_IN_MARKER};

use crate::form::{DOCTOR_SELECT_ID, UNIT_SELECT_ID};
use crate::html::{has_select, normalized_text, select_options, selector, text_by_id};
use crate::AdapterError;

/// Id of the label showing the number of issued tickets.
pub const TOTAL_LABEL_ID: &str = "lblTotal";
/// Id of the label showing the ticket being served.
pub const CURRENT_LABEL_ID: &str = "lblCurrent";
/// Header of the waiting tickets section.
pub const NEXT_SECTION: &str = "Antrian Selanjutnya";
/// Header of the skipped tickets section.
pub const SKIPPED_SECTION: &str = "Antrian Dilewati";
/// Header of the served tickets section.
pub const DONE_SECTION: &str = "Antrian Selesai";

/// Parse a queue page, stamping the current time.
pub fn parse_queue_page(
    html: &str,
    unit_code: &str,
    doctor_code: &str,
) -> Result<QueueSnapshot, AdapterError> {
    parse_queue_page_at(html, unit_code, doctor_code, current_timestamp_ms())
}

/// Parse a queue page with an explicit capture time.
///
/// The page does not echo the selection structurally, so the caller passes
/// the unit and practitioner codes it submitted.
pub fn parse_queue_page_at(
    html: &str,
    unit_code: &str,
    doctor_code: &str,
    captured_at_ms: u64,
) -> Result<QueueSnapshot, AdapterError> {
    let doc = Html::parse_document(html);

    if !has_select(&doc, DOCTOR_SELECT_ID) {
        return Err(AdapterError::shape(format!(
            "select `{}` missing from queue page",
            DOCTOR_SELECT_ID
        )));
    }

    let next = section_entries(&doc, NEXT_SECTION)?;
    let skipped = section_entries(&doc, SKIPPED_SECTION)?;
    let done = section_entries(&doc, DONE_SECTION)?;
    let has_sections = next.is_some() || skipped.is_some() || done.is_some();

    let total = text_by_id(&doc, TOTAL_LABEL_ID);
    let current = text_by_id(&doc, CURRENT_LABEL_ID);

    let mut builder = QueueSnapshot::builder(unit_code, doctor_code).captured_at_ms(captured_at_ms);
    if let Some(label) = select_options(&doc, UNIT_SELECT_ID)
        .as_deref()
        .and_then(|options| label_for(options, unit_code))
    {
        builder = builder.unit_label(label);
    }
    if let Some(label) = select_options(&doc, DOCTOR_SELECT_ID)
        .as_deref()
        .and_then(|options| label_for(options, doctor_code))
    {
        builder = builder.doctor_label(label);
    }

    let (total, current) = match (total, current) {
        (None, None) if !has_sections => {
            tracing::debug!(unit = unit_code, doctor = doctor_code, "no active session on page");
            return Ok(builder.build());
        }
        (Some(total), Some(current)) => (total, current),
        (None, _) => {
            return Err(AdapterError::shape(format!("label `#{}` missing", TOTAL_LABEL_ID)))
        }
        (_, None) => {
            return Err(AdapterError::shape(format!("label `#{}` missing", CURRENT_LABEL_ID)))
        }
    };

    Ok(builder
        .total_count(parse_total(&total)?)
        .current_number(current)
        .next_entries(next.unwrap_or_default())
        .skipped_entries(skipped.unwrap_or_default())
        .done_entries(done.unwrap_or_default())
        .build())
}

/// Parse one ticket token as rendered inside a section.
///
/// `"045*"` is a ticket whose holder has not checked in, `"045"` one who
/// has. The marker is only accepted as the last character.
pub fn parse_token(token: &str) -> Result<QueueEntry, AdapterError> {
    let token = token.trim();
    let (number, checked_in) = match token.strip_suffix(CHECK_IN_MARKER) {
        Some(rest) => (rest.trim_end(), false),
        None => (token, true),
    };

    if number.contains(CHECK_IN_MARKER) {
        return Err(AdapterError::shape(format!(
            "check-in marker in unexpected position: {:?}",
            token
        )));
    }
    if number.is_empty() {
        return Err(AdapterError::shape(format!("empty ticket token: {:?}", token)));
    }

    Ok(QueueEntry::new(number, checked_in))
}

fn parse_total(text: &str) -> Result<u32, AdapterError> {
    if text.is_empty() {
        return Ok(0);
    }
    text.parse()
        .map_err(|_| AdapterError::shape(format!("`#{}` is not a number: {:?}", TOTAL_LABEL_ID, text)))
}

/// Tickets listed under the section with the given header.
///
/// Returns `None` when the header is absent.
fn section_entries(doc: &Html, title: &str) -> Result<Option<Vec<QueueEntry>>, AdapterError> {
    let Some(heading) = doc
        .select(&selector("h4, h5"))
        .find(|h| normalized_text(*h).eq_ignore_ascii_case(title))
    else {
        return Ok(None);
    };

    let values = heading
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "div")
        .and_then(|container| {
            container
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|e| e.value().name() == "div")
        });

    let Some(values) = values else {
        return Ok(Some(Vec::new()));
    };

    values
        .select(&selector("h1"))
        .map(normalized_text)
        .filter(|text| !text.is_empty())
        .map(|text| parse_token(&text))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
