//! Lenient decoding of persisted blobs.
//!
//! Stored data is untrusted: it may have been written by an older version of
//! the schema or corrupted outright. Decoding goes through loosely-typed
//! `Raw*` shapes and never fails as a whole; unusable elements are dropped and
//! logged. Writers go through [`decode_list`] instead so that elements this
//! version cannot read are written back untouched.

use serde::Deserialize;
use serde_json::Value;

use crate::{
  experience::{Experience, ExperienceStatus, WaitBucket, parse_timestamp},
  user::StoredUser,
};

// ─── Experiences ─────────────────────────────────────────────────────────────

/// Every field optional and loosely typed; see [`RawExperience::into_experience`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawExperience {
  id:             Option<Value>,
  company:        Option<String>,
  role:           Option<String>,
  source:         Option<String>,
  city:           Option<String>,
  sector:         Option<String>,
  post_url:       Option<String>,
  comment:        Option<String>,
  status:         Option<String>,
  no_reply_wait:  Option<Value>,
  response_delay: Option<Value>,
  created_at:     Option<String>,
}

impl RawExperience {
  /// Returns `None` when a required field is missing or unusable. Unknown
  /// wait buckets decode as absent.
  fn into_experience(self) -> Option<Experience> {
    let id = match self.id? {
      Value::String(s) => s,
      Value::Number(n) => n.to_string(),
      _ => return None,
    };
    let status: ExperienceStatus =
      serde_json::from_value(Value::String(self.status?)).ok()?;
    let created_at = parse_timestamp(&self.created_at?).ok()?;

    Some(Experience {
      id,
      company: self.company?,
      role: self.role,
      source: self.source,
      city: self.city,
      sector: self.sector,
      post_url: self.post_url,
      comment: self.comment,
      status,
      no_reply_wait: self.no_reply_wait.and_then(decode_bucket),
      response_delay: self.response_delay.and_then(decode_bucket),
      created_at,
    })
  }
}

fn decode_bucket(value: Value) -> Option<WaitBucket> {
  serde_json::from_value(value).ok()
}

/// Decode the `experiences_v1` blob. Anything other than a JSON array yields
/// an empty list.
pub fn decode_experiences(bytes: &[u8]) -> Vec<Experience> {
  decode_list(bytes, "experiences")
    .into_iter()
    .enumerate()
    .filter_map(|(i, value)| {
      let decoded = serde_json::from_value::<RawExperience>(value)
        .ok()
        .and_then(RawExperience::into_experience);
      if decoded.is_none() {
        tracing::warn!(index = i, "skipping undecodable experience record");
      }
      decoded
    })
    .collect()
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// Decode the `auth_users_v1` blob. Elements without an id, email or
/// password hash are dropped; a missing username falls back to the local
/// part of the email.
pub fn decode_users(bytes: &[u8]) -> Vec<StoredUser> {
  decode_list(bytes, "users")
    .into_iter()
    .filter_map(|value| match serde_json::from_value::<StoredUser>(value) {
      Ok(mut stored) => {
        if stored.user.username.trim().is_empty() {
          stored.user.username = local_part(&stored.user.email).to_owned();
        }
        Some(stored)
      }
      Err(e) => {
        tracing::warn!(error = %e, "skipping undecodable user record");
        None
      }
    })
    .collect()
}

/// The part of `email` before the `@`.
pub fn local_part(email: &str) -> &str {
  email.trim().split('@').next().unwrap_or_default()
}

/// The trimmed `email` field of a raw user element, if it has one.
pub fn raw_email(value: &Value) -> Option<&str> {
  value.get("email")?.as_str().map(str::trim)
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// Decode the `auth_session_v1` blob into a user id.
///
/// The id is normally stored as raw text; a JSON-quoted string is accepted
/// too. Blank or non-UTF-8 content counts as no session.
pub fn decode_session(bytes: &[u8]) -> Option<String> {
  let text = std::str::from_utf8(bytes).ok()?.trim();
  let id = serde_json::from_str::<String>(text).unwrap_or_else(|_| text.to_owned());
  (!id.is_empty()).then_some(id)
}

/// The elements of a stored JSON array, each left undecoded. Anything other
/// than an array yields an empty list.
pub fn decode_list(bytes: &[u8], what: &str) -> Vec<Value> {
  match serde_json::from_slice::<Value>(bytes) {
    Ok(Value::Array(items)) => items,
    Ok(_) => {
      tracing::warn!(what, "stored blob is not a JSON array; treating as empty");
      Vec::new()
    }
    Err(e) => {
      tracing::warn!(what, error = %e, "stored blob is malformed; treating as empty");
      Vec::new()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn legacy_record_without_wait_fields() {
    let blob = br#"[{
      "id": "1712345678901",
      "company": "Acme",
      "role": "Junior Frontend",
      "source": "LinkedIn",
      "status": "Replied",
      "createdAt": "2024-04-05T19:34:38.901Z"
    }]"#;
    let records = decode_experiences(blob);

    assert_eq!(records.len(), 1);
    let e = &records[0];
    assert_eq!(e.id, "1712345678901");
    assert_eq!(e.status, ExperienceStatus::Replied);
    assert_eq!(e.no_reply_wait, None);
    assert_eq!(e.response_delay, None);
    assert_eq!(e.source.as_deref(), Some("LinkedIn"));
  }

  #[test]
  fn malformed_blob_is_empty() {
    assert!(decode_experiences(b"not json").is_empty());
    assert!(decode_experiences(br#"{"id":"1"}"#).is_empty());
    assert!(decode_experiences(b"").is_empty());
  }

  #[test]
  fn bad_elements_are_skipped_individually() {
    let blob = br#"[
      {"id": "a", "company": "Acme", "status": "Offer", "createdAt": "2024-01-01T00:00:00.000Z"},
      {"id": "b", "company": "Acme", "status": "Ghosted", "createdAt": "2024-01-01T00:00:00.000Z"},
      {"id": "c", "status": "Offer", "createdAt": "2024-01-01T00:00:00.000Z"},
      {"id": "d", "company": "Acme", "status": "Offer", "createdAt": "yesterday"},
      42,
      {"id": 7, "company": "Globex", "status": "NoReply", "createdAt": "2024-01-02T00:00:00+03:00",
       "noReplyWait": "forever", "responseDelay": "<1w"}
    ]"#;
    let records = decode_experiences(blob);

    let ids: Vec<_> = records.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "7"]);
    let globex = &records[1];
    assert_eq!(globex.no_reply_wait, None);
    assert_eq!(globex.response_delay, Some(WaitBucket::UnderOneWeek));
    assert_eq!(globex.created_at.to_rfc3339(), "2024-01-01T21:00:00+00:00");
  }

  #[test]
  fn users_skip_incomplete_entries() {
    let blob = br#"[
      {"id": "1", "email": "a@x.com", "username": "a", "passwordHash": "ab"},
      {"id": "2", "email": "b@x.com"}
    ]"#;
    let users = decode_users(blob);
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].user.email, "a@x.com");
  }

  #[test]
  fn user_without_username_uses_email_local_part() {
    let blob = br#"[{"id": "1", "email": "old@x.com", "passwordHash": "ab"}]"#;
    let users = decode_users(blob);
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].user.username, "old");
  }

  #[test]
  fn raw_list_keeps_elements_that_do_not_decode() {
    let blob = br#"[{"id": "b", "status": "Ghosted"}, 42]"#;
    assert_eq!(decode_list(blob, "experiences").len(), 2);
    assert!(decode_experiences(blob).is_empty());
    assert!(decode_list(b"{broken", "experiences").is_empty());
  }

  #[test]
  fn raw_email_is_trimmed() {
    let value = serde_json::json!({"email": " old@x.com "});
    assert_eq!(raw_email(&value), Some("old@x.com"));
    assert_eq!(raw_email(&serde_json::json!({"id": "1"})), None);
    assert_eq!(raw_email(&serde_json::json!(7)), None);
  }

  #[test]
  fn session_accepts_raw_and_quoted_ids() {
    assert_eq!(decode_session(b"1712345678901").as_deref(), Some("1712345678901"));
    assert_eq!(decode_session(br#""abc""#).as_deref(), Some("abc"));
    assert_eq!(decode_session(b"  "), None);
    assert_eq!(decode_session(&[0xff, 0xfe]), None);
  }
}
