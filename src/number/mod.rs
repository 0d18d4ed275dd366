//! Phone number normalization
//!
//! Raw input (typed text, `tel:` links, pasted numbers) is reduced to a
//! canonical digit string before anything is sent to the phone system.
//! The display form only exists for echoing back to the user.

mod launch;

pub use launch::{launch_number, query_parameter};

use regex::Regex;
use std::sync::OnceLock;

/// Reduce raw input to the canonical dialable form.
///
/// Only digits survive; a leading `+` becomes the international prefix `00`.
pub fn clean(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    let (prefix, rest) = match kept.strip_prefix('+') {
        Some(rest) => ("00", rest),
        None => ("", kept.as_str()),
    };

    let mut out = String::with_capacity(prefix.len() + rest.len());
    out.push_str(prefix);
    out.extend(rest.chars().filter(|c| c.is_ascii_digit()));
    out
}

/// Group a canonical Swiss number with spaces for display.
///
/// Numbers matching neither known pattern are returned unchanged.
pub fn format(canonical: &str) -> String {
    static SPECIAL: OnceLock<Regex> = OnceLock::new();
    static NATIONAL: OnceLock<Regex> = OnceLock::new();

    // 08xx / 09xx service numbers: 0800 123 456
    let special = SPECIAL.get_or_init(|| {
        Regex::new(r"^(?:\+41|0041|0)([89][0-9]{2})([0-9]{3})([0-9]{3})$").unwrap()
    });
    if let Some(caps) = special.captures(canonical) {
        return format!("0{} {} {}", &caps[1], &caps[2], &caps[3]);
    }

    // Everything else with nine national digits: 079 123 45 67
    let national = NATIONAL.get_or_init(|| {
        Regex::new(r"^(?:\+41|0041|0)([0-9]{2})([0-9]{3})([0-9]{2})([0-9]{2})$").unwrap()
    });
    if let Some(caps) = national.captures(canonical) {
        return format!("0{} {} {} {}", &caps[1], &caps[2], &caps[3], &caps[4]);
    }

    canonical.to_string()
}

/// Clean then format; what a number field shows after losing focus.
pub fn display(raw: &str) -> String {
    format(&clean(raw))
}
