//! Composite display strings.
//!
//! The exchanged resources have no structured slot for patient gender or
//! practitioner specialization, so both travel inside `display` strings:
//!
//! - patient: `"Smith Jane [female]"`
//! - practitioner: `"Smith Jane - Cardiology"`

use std::sync::LazyLock;

use regex::Regex;

const SPECIALIZATION_SEPARATOR: &str = " - ";

static GENDER_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(male|female)\]$").expect("Invalid gender tag regex"));

static GENDER_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[(male|female)\]$").expect("Invalid gender suffix regex"));

/// `"<last> <first>[ <middle>]"`
pub fn person_name(last: &str, first: &str, middle: &str) -> String {
    let mut name = format!("{last} {first}");
    if !middle.is_empty() {
        name.push(' ');
        name.push_str(middle);
    }
    name
}

/// Patient display with a trailing `[male]`/`[female]` tag when the gender is known.
pub fn patient_display(last: &str, first: &str, middle: &str, gender: &str) -> String {
    let name = person_name(last, first, middle);
    match gender.to_lowercase().as_str() {
        tag @ ("male" | "female") => format!("{name} [{tag}]"),
        _ => name,
    }
}

/// `"male"`, `"female"` or `""`.
pub fn extract_gender(display: &str) -> String {
    GENDER_TAG
        .captures(display)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default()
}

/// Display with the gender tag and any whitespace before it removed.
pub fn strip_gender(display: &str) -> String {
    GENDER_SUFFIX.replace(display, "").into_owned()
}

/// `"<last> <first>[ <middle>] - <specialization>"`
pub fn practitioner_display(last: &str, first: &str, middle: &str, specialization: &str) -> String {
    format!(
        "{}{SPECIALIZATION_SEPARATOR}{specialization}",
        person_name(last, first, middle)
    )
}

/// Split on the first `" - "` into (name, specialization).
pub fn parse_practitioner_display(display: &str) -> (String, String) {
    match display.split_once(SPECIALIZATION_SEPARATOR) {
        Some((name, specialization)) => (name.to_string(), specialization.to_string()),
        None => (display.to_string(), String::new()),
    }
}

/// `"<resource_type>/<id>"`
pub fn reference(resource_type: &str, id: &str) -> String {
    format!("{resource_type}/{id}")
}

/// Id part of a `Type/id` reference; anything else is returned verbatim.
pub fn id_from_reference(reference: &str) -> String {
    let mut parts = reference.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(id), None) => id.to_string(),
        _ => reference.to_string(),
    }
}
