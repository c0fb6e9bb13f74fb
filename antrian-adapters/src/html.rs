//! Small helpers over `scraper` shared by the form and page parsers.

use scraper::{ElementRef, Html, Selector};

use antrian_types::FacilityOption;

/// Compile a selector known at build time.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("selectors are built from constant ids")
}

/// Text content of an element with whitespace runs collapsed.
pub(crate) fn normalized_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the element with the given id, if present.
pub(crate) fn text_by_id(doc: &Html, id: &str) -> Option<String> {
    doc.select(&selector(&format!("#{}", id)))
        .next()
        .map(normalized_text)
}

/// Whether the document contains a `<select>` with the given id.
pub(crate) fn has_select(doc: &Html, id: &str) -> bool {
    doc.select(&selector(&format!("select#{}", id))).next().is_some()
}

/// Options of the `<select>` with the given id.
///
/// Placeholder entries with an empty value are skipped and duplicate codes
/// keep their first occurrence. Returns `None` when the select is absent.
pub(crate) fn select_options(doc: &Html, id: &str) -> Option<Vec<FacilityOption>> {
    let select = doc
        .select(&selector(&format!("select#{}", id)))
        .next()?;

    let mut options: Vec<FacilityOption> = Vec::new();
    for option in select.select(&selector("option")) {
        let code = option.value().attr("value").unwrap_or_default().trim();
        if code.is_empty() || options.iter().any(|o| o.code == code) {
            continue;
        }
        options.push(FacilityOption::new(code, normalized_text(option)));
    }
    Some(options)
}
