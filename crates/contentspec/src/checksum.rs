use std::sync::OnceLock;

use md5::{Digest, Md5};
use regex::Regex;

/// Matches a `CHECKSUM = <alnum>` line.
pub fn checksum_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)^CHECKSUM[ ]*=[ ]*([A-Za-z0-9]+)[ ]*\r?\n?").expect("Invalid regex")
    })
}

/// Matches an `ID = <digits>` line.
pub fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?m)^ID[ ]*=[ ]*([0-9]+)[ ]*\r?\n?").expect("Invalid regex"))
}

pub fn remove_checksum(text: &str) -> String {
    checksum_pattern().replacen(text, 1, "").into_owned()
}

/// Strips the first checksum line and the first id line, leaving the body.
pub fn remove_checksum_and_id(text: &str) -> String {
    let without_checksum = remove_checksum(text);
    id_pattern().replacen(&without_checksum, 1, "").into_owned()
}

pub fn checksum_of(text: &str) -> Option<&str> {
    checksum_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|value| value.as_str())
}

pub fn id_of(text: &str) -> Option<i32> {
    id_pattern()
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Lowercase hex MD5 of `ID = <id>\n` followed by `body`.
pub fn generate_checksum(id: i32, body: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(format!("ID = {id}\n").as_bytes());
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recomputes the embedded checksum. `None` when the text carries no checksum or id.
pub fn verify_checksum(text: &str) -> Option<bool> {
    let expected = checksum_of(text)?;
    let id = id_of(text)?;
    let body = remove_checksum_and_id(text);
    Some(generate_checksum(id, &body).eq_ignore_ascii_case(expected))
}
