//! Experience records — one self-reported job-application outcome each.
//!
//! Records are append-only: once written they are never edited or deleted.
//! The JSON property names are part of the at-rest format and must stay
//! readable by every later version.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter, EnumString};

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

/// The furthest point an application reached.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  EnumIter,
  EnumString,
  strum::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum ExperienceStatus {
  #[strum(to_string = "NoReply", serialize = "no-reply")]
  NoReply,
  Replied,
  Interview,
  Offer,
}

impl ExperienceStatus {
  /// Whether the company answered at all.
  pub fn is_response(self) -> bool { !matches!(self, Self::NoReply) }

  pub fn label(self) -> &'static str {
    match self {
      Self::NoReply => "No reply",
      Self::Replied => "Replied",
      Self::Interview => "Interview",
      Self::Offer => "Offer",
    }
  }
}

// ─── Wait buckets ────────────────────────────────────────────────────────────

/// A coarse elapsed-time range. Used both for "waited this long with no
/// reply" and for "the reply took this long".
///
/// Variants are declared shortest first; the declaration order is the display
/// order.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  EnumIter,
  EnumCount,
  EnumString,
  strum::Display,
)]
pub enum WaitBucket {
  #[serde(rename = "<1w", alias = "<1week")]
  #[strum(to_string = "<1w", serialize = "<1week")]
  UnderOneWeek,
  #[serde(rename = "1-2w", alias = "1-2weeks")]
  #[strum(to_string = "1-2w", serialize = "1-2weeks")]
  OneToTwoWeeks,
  #[serde(rename = "2-4w", alias = "2-4weeks")]
  #[strum(to_string = "2-4w", serialize = "2-4weeks")]
  TwoToFourWeeks,
  #[serde(rename = "1-2m", alias = "1-2months")]
  #[strum(to_string = "1-2m", serialize = "1-2months")]
  OneToTwoMonths,
  #[serde(rename = ">2m", alias = ">2months")]
  #[strum(to_string = ">2m", serialize = ">2months")]
  OverTwoMonths,
}

impl WaitBucket {
  /// Position in display order, `0` for the shortest range.
  pub fn ordinal(self) -> usize { self as usize }

  pub fn label(self) -> &'static str {
    match self {
      Self::UnderOneWeek => "< 1 week",
      Self::OneToTwoWeeks => "1-2 weeks",
      Self::TwoToFourWeeks => "2-4 weeks",
      Self::OneToTwoMonths => "1-2 months",
      Self::OverTwoMonths => "> 2 months",
    }
  }
}

// ─── Experience ──────────────────────────────────────────────────────────────

/// One reported application outcome.
///
/// At most one of `no_reply_wait` / `response_delay` is meant to be set, as
/// chosen by `status`. Stored data is not trusted to honour that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
  pub id:             String,
  pub company:        String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub role:           Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source:         Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub city:           Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sector:         Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub post_url:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comment:        Option<String>,
  pub status:         ExperienceStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub no_reply_wait:  Option<WaitBucket>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub response_delay: Option<WaitBucket>,
  #[serde(with = "iso_timestamp")]
  pub created_at:     DateTime<Utc>,
}

impl Experience {
  /// The grouping key: the company name with surrounding whitespace removed.
  pub fn company_key(&self) -> &str { self.company.trim() }

  /// The wait bucket that is meaningful for this record's status, if any.
  pub fn relevant_wait(&self) -> Option<WaitBucket> {
    if self.status.is_response() {
      self.response_delay
    } else {
      self.no_reply_wait
    }
  }
}

/// `createdAt` is written as `2024-05-01T09:30:00.000Z`. Sub-millisecond
/// digits are kept when present so that reading back yields the same instant.
mod iso_timestamp {
  use chrono::{DateTime, SecondsFormat, Timelike, Utc};
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(
    dt: &DateTime<Utc>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    let format = if dt.nanosecond() % 1_000_000 == 0 {
      SecondsFormat::Millis
    } else {
      SecondsFormat::AutoSi
    };
    serializer.serialize_str(&dt.to_rfc3339_opts(format, true))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<DateTime<Utc>, D::Error> {
    let s = String::deserialize(deserializer)?;
    super::parse_timestamp(&s).map_err(serde::de::Error::custom)
  }
}

/// Parse an ISO-8601 timestamp with any offset into UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
  DateTime::parse_from_rfc3339(s.trim()).map(|dt| dt.with_timezone(&Utc))
}

// ─── NewExperience ───────────────────────────────────────────────────────────

/// Input from the add form. `id` and `created_at` are assigned on creation.
#[derive(Debug, Clone)]
pub struct NewExperience {
  pub company:  String,
  pub role:     Option<String>,
  pub source:   Option<String>,
  pub city:     Option<String>,
  pub sector:   Option<String>,
  pub post_url: Option<String>,
  pub comment:  Option<String>,
  pub status:   ExperienceStatus,
  /// Stored as `response_delay` for answered applications and as
  /// `no_reply_wait` otherwise.
  pub wait:     Option<WaitBucket>,
}

impl NewExperience {
  /// Convenience constructor with all optional fields empty.
  pub fn new(company: impl Into<String>, status: ExperienceStatus) -> Self {
    Self {
      company: company.into(),
      role: None,
      source: None,
      city: None,
      sector: None,
      post_url: None,
      comment: None,
      status,
      wait: None,
    }
  }

  /// Validate and normalise into a storable [`Experience`].
  ///
  /// Fails only when the company name is blank. Text fields are trimmed and
  /// blank ones dropped; `created_at` is truncated to milliseconds so that it
  /// survives the at-rest format unchanged.
  pub fn into_experience(
    self,
    id: String,
    now: DateTime<Utc>,
  ) -> Result<Experience> {
    let company = self.company.trim();
    if company.is_empty() {
      return Err(Error::Validation("company name is required".into()));
    }

    let (no_reply_wait, response_delay) = if self.status.is_response() {
      (None, self.wait)
    } else {
      (self.wait, None)
    };

    Ok(Experience {
      id,
      company: company.to_owned(),
      role: non_blank(self.role),
      source: non_blank(self.source),
      city: non_blank(self.city),
      sector: non_blank(self.sector),
      post_url: non_blank(self.post_url),
      comment: non_blank(self.comment),
      status: self.status,
      no_reply_wait,
      response_delay,
      created_at: now.trunc_subsecs(3),
    })
  }
}

fn non_blank(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use strum::IntoEnumIterator;

  use super::*;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  #[test]
  fn wait_buckets_are_ordered_shortest_first() {
    let ordinals: Vec<usize> = WaitBucket::iter().map(WaitBucket::ordinal).collect();
    assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
    assert!(WaitBucket::UnderOneWeek < WaitBucket::OverTwoMonths);
  }

  #[test]
  fn wait_bucket_accepts_long_aliases() {
    let short: WaitBucket = serde_json::from_str("\"1-2w\"").unwrap();
    let long: WaitBucket = serde_json::from_str("\"1-2weeks\"").unwrap();
    assert_eq!(short, WaitBucket::OneToTwoWeeks);
    assert_eq!(long, WaitBucket::OneToTwoWeeks);
    assert_eq!(serde_json::to_string(&long).unwrap(), "\"1-2w\"");
    assert_eq!(">2months".parse::<WaitBucket>().unwrap(), WaitBucket::OverTwoMonths);
  }

  #[test]
  fn status_parses_case_insensitively() {
    assert_eq!("offer".parse::<ExperienceStatus>().unwrap(), ExperienceStatus::Offer);
    assert_eq!(
      "no-reply".parse::<ExperienceStatus>().unwrap(),
      ExperienceStatus::NoReply
    );
    assert_eq!(ExperienceStatus::NoReply.to_string(), "NoReply");
  }

  #[test]
  fn json_shape_uses_camel_case_and_omits_absent_fields() {
    let mut input = NewExperience::new("Acme", ExperienceStatus::NoReply);
    input.post_url = Some("https://acme.example/jobs/1".into());
    input.wait = Some(WaitBucket::TwoToFourWeeks);
    let e = input.into_experience("1".into(), at(1_700_000_000)).unwrap();

    let json = serde_json::to_value(&e).unwrap();
    assert_eq!(json["postUrl"], "https://acme.example/jobs/1");
    assert_eq!(json["noReplyWait"], "2-4w");
    assert_eq!(json["createdAt"], "2023-11-14T22:13:20.000Z");
    assert!(json.get("role").is_none());
    assert!(json.get("responseDelay").is_none());
  }

  #[test]
  fn blank_company_is_rejected() {
    let err = NewExperience::new("   ", ExperienceStatus::Offer)
      .into_experience("1".into(), at(0))
      .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn wait_is_routed_by_status() {
    let mut replied = NewExperience::new("Acme", ExperienceStatus::Replied);
    replied.wait = Some(WaitBucket::UnderOneWeek);
    let e = replied.into_experience("1".into(), at(0)).unwrap();
    assert_eq!(e.response_delay, Some(WaitBucket::UnderOneWeek));
    assert_eq!(e.no_reply_wait, None);

    let mut silent = NewExperience::new("Acme", ExperienceStatus::NoReply);
    silent.wait = Some(WaitBucket::OverTwoMonths);
    let e = silent.into_experience("2".into(), at(0)).unwrap();
    assert_eq!(e.no_reply_wait, Some(WaitBucket::OverTwoMonths));
    assert_eq!(e.response_delay, None);
  }

  #[test]
  fn text_fields_are_trimmed_and_blanks_dropped() {
    let mut input = NewExperience::new("  Acme  ", ExperienceStatus::Interview);
    input.role = Some("  Backend Engineer ".into());
    input.comment = Some("   ".into());
    let e = input.into_experience("1".into(), at(0)).unwrap();
    assert_eq!(e.company, "Acme");
    assert_eq!(e.role.as_deref(), Some("Backend Engineer"));
    assert_eq!(e.comment, None);
  }

  #[test]
  fn created_at_is_truncated_to_millis() {
    let now = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    let e = NewExperience::new("Acme", ExperienceStatus::Offer)
      .into_experience("1".into(), now)
      .unwrap();
    assert_eq!(e.created_at.timestamp_subsec_nanos(), 123_000_000);

    let json = serde_json::to_string(&e).unwrap();
    let back: Experience = serde_json::from_str(&json).unwrap();
    assert_eq!(back, e);
  }

  #[test]
  fn finer_timestamps_survive_serialization() {
    let mut e = NewExperience::new("Acme", ExperienceStatus::Offer)
      .into_experience("1".into(), at(1_700_000_000))
      .unwrap();
    e.created_at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();

    let json = serde_json::to_value(&e).unwrap();
    assert_eq!(json["createdAt"], "2023-11-14T22:13:20.123456789Z");
    let back: Experience = serde_json::from_value(json).unwrap();
    assert_eq!(back, e);
  }
}
