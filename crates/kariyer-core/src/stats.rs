//! Aggregation of experience records into per-company and per-role
//! statistics.
//!
//! Everything here is a pure function over already-decoded records. Results
//! are recomputed on every read and never persisted.

use std::collections::HashMap;

use serde::{Serialize, Serializer, ser::SerializeMap};
use strum::{EnumCount, IntoEnumIterator};

use crate::experience::{Experience, ExperienceStatus, WaitBucket};

/// Role key used for records with no (or a blank) role.
pub const OTHER_ROLE: &str = "Other";

// ─── WaitDistribution ────────────────────────────────────────────────────────

/// A count per [`WaitBucket`]. Every bucket is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitDistribution([u32; WaitBucket::COUNT]);

impl WaitDistribution {
  pub fn get(&self, bucket: WaitBucket) -> u32 { self.0[bucket.ordinal()] }

  pub fn increment(&mut self, bucket: WaitBucket) { self.0[bucket.ordinal()] += 1; }

  /// Sum over all buckets.
  pub fn total(&self) -> u32 { self.0.iter().sum() }

  /// `(bucket, count)` pairs in display order, shortest wait first.
  pub fn iter(&self) -> impl Iterator<Item = (WaitBucket, u32)> + '_ {
    WaitBucket::iter().map(|b| (b, self.get(b)))
  }
}

impl Serialize for WaitDistribution {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(WaitBucket::COUNT))?;
    for (bucket, count) in self.iter() {
      map.serialize_entry(&bucket, &count)?;
    }
    map.end()
  }
}

// ─── CompanyStats ────────────────────────────────────────────────────────────

/// Aggregate over every experience reported for one company.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStats {
  /// The trimmed company name shared by every record in the group.
  pub company:       String,
  pub total:         u32,
  pub no_reply:      u32,
  pub replied:       u32,
  pub interviewed:   u32,
  pub offer:         u32,
  /// `(replied + interviewed + offer) / total`, in `[0, 1]`.
  pub reply_rate:    f64,
  pub no_reply_dist: WaitDistribution,
  pub response_dist: WaitDistribution,
}

impl CompanyStats {
  fn empty(company: String) -> Self {
    Self {
      company,
      total: 0,
      no_reply: 0,
      replied: 0,
      interviewed: 0,
      offer: 0,
      reply_rate: 0.0,
      no_reply_dist: WaitDistribution::default(),
      response_dist: WaitDistribution::default(),
    }
  }

  fn record(&mut self, e: &Experience) {
    self.total += 1;
    match e.status {
      ExperienceStatus::NoReply => {
        self.no_reply += 1;
        if let Some(bucket) = e.no_reply_wait {
          self.no_reply_dist.increment(bucket);
        }
      }
      status => {
        match status {
          ExperienceStatus::Replied => self.replied += 1,
          ExperienceStatus::Interview => self.interviewed += 1,
          _ => self.offer += 1,
        }
        if let Some(bucket) = e.response_delay {
          self.response_dist.increment(bucket);
        }
      }
    }
  }

  /// Number of records where the company answered in any way.
  pub fn responded(&self) -> u32 { self.replied + self.interviewed + self.offer }
}

/// Group `records` by trimmed company name and rank the groups.
///
/// Records whose company is blank after trimming are skipped. Groups are
/// ordered by reply rate (highest first), then by record count (highest
/// first); remaining ties keep the order in which each company first appears
/// in `records`.
pub fn group_by_company(records: &[Experience]) -> Vec<CompanyStats> {
  let mut index: HashMap<&str, usize> = HashMap::new();
  let mut groups: Vec<CompanyStats> = Vec::new();

  for e in records {
    let key = e.company_key();
    if key.is_empty() {
      continue;
    }
    let slot = *index.entry(key).or_insert_with(|| {
      groups.push(CompanyStats::empty(key.to_owned()));
      groups.len() - 1
    });
    groups[slot].record(e);
  }

  for g in &mut groups {
    g.reply_rate = ratio(g.responded(), g.total);
  }

  // `sort_by` is stable, which gives the first-seen tie-break.
  groups.sort_by(|a, b| {
    b.reply_rate
      .total_cmp(&a.reply_rate)
      .then_with(|| b.total.cmp(&a.total))
  });
  groups
}

/// Filter ranked stats by a case-insensitive substring of the company name.
///
/// A blank query matches everything. Ranking order is preserved.
pub fn search_companies<'a>(
  stats: &'a [CompanyStats],
  query: &str,
) -> Vec<&'a CompanyStats> {
  let needle = query.trim().to_lowercase();
  stats
    .iter()
    .filter(|s| s.company.to_lowercase().contains(&needle))
    .collect()
}

// ─── RoleStats ───────────────────────────────────────────────────────────────

/// Aggregate over the records for one role, normally within one company.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleStats {
  pub role:          String,
  pub total:         u32,
  /// Records with any status other than `NoReply`.
  pub responded:     u32,
  pub response_rate: f64,
}

/// Group `records` by trimmed role, folding blank roles into
/// [`OTHER_ROLE`]. Larger groups come first; ties keep first-seen order.
pub fn group_by_role(records: &[Experience]) -> Vec<RoleStats> {
  let mut index: HashMap<&str, usize> = HashMap::new();
  let mut groups: Vec<RoleStats> = Vec::new();

  for e in records {
    let key = e
      .role
      .as_deref()
      .map(str::trim)
      .filter(|r| !r.is_empty())
      .unwrap_or(OTHER_ROLE);
    let slot = *index.entry(key).or_insert_with(|| {
      groups.push(RoleStats {
        role:          key.to_owned(),
        total:         0,
        responded:     0,
        response_rate: 0.0,
      });
      groups.len() - 1
    });
    let g = &mut groups[slot];
    g.total += 1;
    if e.status.is_response() {
      g.responded += 1;
    }
  }

  for g in &mut groups {
    g.response_rate = ratio(g.responded, g.total);
  }

  groups.sort_by(|a, b| b.total.cmp(&a.total));
  groups
}

fn ratio(part: u32, whole: u32) -> f64 {
  if whole == 0 {
    0.0
  } else {
    f64::from(part) / f64::from(whole)
  }
}
