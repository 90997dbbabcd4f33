//! Wire decoding for the snapshot and commit responses.
//!
//! Servers wrap their payloads in different ways (`{"data": ...}` or bare,
//! URL as a string or inside an object). Everything is decoded here into the
//! canonical slot→URL shape so nothing past this module branches on response
//! shape.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::constants::CACHE_BUST_PARAM;
use crate::error::ApiError;
use crate::model::SlotUrlMap;
use crate::registry::{SlotCode, SlotRegistry};

/// Object keys that may carry a URL, in preference order.
const URL_KEYS: &[&str] = &["url", "imageUrl", "fileUrl", "teamImg", "path"];

/// Object keys that may carry a slot code in array-shaped snapshots.
const SLOT_KEYS: &[&str] = &["slotCode", "slot", "code"];

/// Object keys that may carry a failure reason.
const REASON_KEYS: &[&str] = &["reason", "message", "error"];

/// Decoded per-slot result of a batch commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Slots the server persisted, with their new URL
    pub uploaded: SlotUrlMap,
    /// Slots the server rejected, with its reason
    pub failed: BTreeMap<SlotCode, String>,
}

/// Strip a `{"data": ...}` envelope if present.
fn unwrap_envelope(body: &Value) -> &Value {
    match body.get("data") {
        Some(inner) if inner.is_object() || inner.is_array() => inner,
        _ => body,
    }
}

/// First non-empty string among `keys` in an object.
fn first_string<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// URL carried by a slot value: a bare string or an object with a URL key.
fn extract_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Object(object) => first_string(object, URL_KEYS).map(str::to_string),
        _ => None,
    }
}

fn extract_reason(value: &Value) -> String {
    match value {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Object(object) => first_string(object, REASON_KEYS)
            .unwrap_or("upload failed")
            .to_string(),
        _ => "upload failed".to_string(),
    }
}

fn resolve(registry: &SlotRegistry, code: &str) -> Option<SlotCode> {
    match registry.lookup(code) {
        Ok(slot) => Some(slot),
        Err(e) => {
            log::warn!("Ignoring response entry: {}", e);
            None
        }
    }
}

/// Decode a snapshot body into persisted URLs.
///
/// Accepts a map of slot code to URL, or an array of entries each carrying a
/// slot code and URL. Slots without a usable URL and unknown codes are left
/// out; `null` means nothing is persisted.
pub fn decode_snapshot(registry: &SlotRegistry, body: &Value) -> Result<SlotUrlMap, ApiError> {
    let mut snapshot = SlotUrlMap::new();
    match unwrap_envelope(body) {
        Value::Null => {}
        Value::Object(object) => {
            for (code, value) in object {
                let Some(slot) = resolve(registry, code) else {
                    continue;
                };
                if let Some(url) = extract_url(value) {
                    snapshot.insert(slot, url);
                }
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                let Some(object) = entry.as_object() else {
                    log::warn!("Ignoring non-object snapshot entry: {}", entry);
                    continue;
                };
                let Some(code) = first_string(object, SLOT_KEYS) else {
                    log::warn!("Ignoring snapshot entry without slot code: {}", entry);
                    continue;
                };
                let Some(slot) = resolve(registry, code) else {
                    continue;
                };
                if let Some(url) = extract_url(entry) {
                    snapshot.insert(slot, url);
                }
            }
        }
        other => {
            return Err(ApiError::malformed(format!(
                "snapshot must be an object, got {}",
                other
            )));
        }
    }
    Ok(snapshot)
}

/// Decode a commit body into per-slot outcomes.
///
/// A body without an `uploaded` map is malformed; callers treat that as a
/// total failure.
pub fn decode_commit(registry: &SlotRegistry, body: &Value) -> Result<CommitOutcome, ApiError> {
    let body = unwrap_envelope(body);
    let uploaded = body
        .get("uploaded")
        .and_then(Value::as_object)
        .ok_or_else(|| ApiError::malformed("commit response lacks an 'uploaded' map"))?;

    let mut outcome = CommitOutcome::default();

    if let Some(failed) = body.get("failed") {
        let failed = failed
            .as_object()
            .ok_or_else(|| ApiError::malformed("'failed' must be an object"))?;
        for (code, reason) in failed {
            if let Some(slot) = resolve(registry, code) {
                outcome.failed.insert(slot, extract_reason(reason));
            }
        }
    }

    for (code, value) in uploaded {
        let Some(slot) = resolve(registry, code) else {
            continue;
        };
        match extract_url(value) {
            Some(url) => {
                outcome.uploaded.insert(slot, url);
            }
            None => {
                outcome
                    .failed
                    .entry(slot)
                    .or_insert_with(|| "server returned no URL".to_string());
            }
        }
    }

    // A slot reported both ways is not trusted as persisted
    let both: Vec<SlotCode> = outcome
        .uploaded
        .keys()
        .filter(|slot| outcome.failed.contains_key(slot))
        .copied()
        .collect();
    for slot in both {
        log::warn!("Slot {} reported as both uploaded and failed", slot);
        outcome.uploaded.remove(&slot);
    }

    Ok(outcome)
}

/// Turn a response status and text into a JSON body.
///
/// Non-2xx statuses become [`ApiError::Server`] carrying the text. An empty
/// success body is `Null`.
pub fn parse_body(status: u16, text: String) -> Result<Value, ApiError> {
    if !(200..=299).contains(&status) {
        return Err(ApiError::Server {
            status,
            message: text,
        });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| ApiError::malformed(e.to_string()))
}

/// Append a cache-busting timestamp query parameter.
pub fn cache_busted(url: &str, stamp_millis: u128) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", url, separator, CACHE_BUST_PARAM, stamp_millis)
}
