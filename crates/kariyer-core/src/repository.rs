//! [`ExperienceRepository`] — the append-only experience ledger on top of a
//! [`RecordStore`].

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  decode::{decode_experiences, decode_list},
  experience::{Experience, NewExperience},
  store::{RecordStore, keys},
};

/// Reads and writes the single persisted list of experiences.
///
/// There is no update or delete: records are only ever prepended.
#[derive(Debug)]
pub struct ExperienceRepository<S> {
  store: Arc<S>,
}

impl<S> Clone for ExperienceRepository<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: RecordStore> ExperienceRepository<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// All records, newest first.
  ///
  /// Missing or malformed stored data yields an empty list; only a failing
  /// store is reported as an error.
  pub async fn list(&self) -> Result<Vec<Experience>> {
    let raw = self
      .store
      .get(keys::EXPERIENCES)
      .await
      .map_err(Error::store)?;
    Ok(raw.as_deref().map(decode_experiences).unwrap_or_default())
  }

  /// Insert `record` at the head of the list and write the list back.
  ///
  /// Stored elements that [`list`](Self::list) skips are written back as they
  /// were. Read-modify-write without any locking; callers must not append
  /// concurrently.
  pub async fn append(&self, record: Experience) -> Result<()> {
    let raw = self
      .store
      .get(keys::EXPERIENCES)
      .await
      .map_err(Error::store)?;
    let mut items = raw
      .as_deref()
      .map(|bytes| decode_list(bytes, "experiences"))
      .unwrap_or_default();
    items.insert(0, serde_json::to_value(&record)?);

    let bytes = serde_json::to_vec(&items)?;
    self
      .store
      .set(keys::EXPERIENCES, bytes)
      .await
      .map_err(Error::store)?;

    tracing::debug!(id = %record.id, total = items.len(), "appended experience");
    Ok(())
  }

  /// Validate `input`, assign an id and timestamp, and append it.
  ///
  /// Nothing is written when validation fails.
  pub async fn add(&self, input: NewExperience) -> Result<Experience> {
    let record = input.into_experience(Uuid::new_v4().to_string(), Utc::now())?;
    self.append(record.clone()).await?;
    Ok(record)
  }

  /// Records whose trimmed company equals the trimmed `company`, newest
  /// first.
  pub async fn for_company(&self, company: &str) -> Result<Vec<Experience>> {
    let company = company.trim();
    let mut records = self.list().await?;
    records.retain(|e| e.company_key() == company);
    Ok(records)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::{
    experience::{ExperienceStatus, WaitBucket},
    store::MemoryStore,
  };

  fn repo() -> (Arc<MemoryStore>, ExperienceRepository<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (store.clone(), ExperienceRepository::new(store))
  }

  fn record(id: &str, company: &str) -> Experience {
    Experience {
      id: id.into(),
      company: company.into(),
      role: Some("Data Analyst".into()),
      source: Some("Kariyer".into()),
      city: Some("Izmir".into()),
      sector: Some("Finance".into()),
      post_url: None,
      comment: Some("two rounds".into()),
      status: ExperienceStatus::Interview,
      no_reply_wait: None,
      response_delay: Some(WaitBucket::TwoToFourWeeks),
      created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    }
  }

  #[tokio::test]
  async fn list_of_empty_store_is_empty() {
    let (_, repo) = repo();
    assert!(repo.list().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn appended_record_comes_back_first() {
    let (_, repo) = repo();
    let first = record("1", "Acme");
    let second = record("2", "Globex");

    repo.append(first.clone()).await.unwrap();
    repo.append(second.clone()).await.unwrap();

    let listed = repo.list().await.unwrap();
    assert_eq!(listed, vec![second, first]);
  }

  #[tokio::test]
  async fn malformed_blob_lists_empty_and_is_replaced_on_append() {
    let (store, repo) = repo();
    store
      .set(keys::EXPERIENCES, b"{broken".to_vec())
      .await
      .unwrap();
    assert!(repo.list().await.unwrap().is_empty());

    repo.append(record("1", "Acme")).await.unwrap();
    assert_eq!(repo.list().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn append_keeps_sub_millisecond_timestamp() {
    let (_, repo) = repo();
    let mut e = record("1", "Acme");
    e.created_at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();

    repo.append(e.clone()).await.unwrap();
    assert_eq!(repo.list().await.unwrap()[0], e);
  }

  #[tokio::test]
  async fn append_preserves_records_that_do_not_decode() {
    let (store, repo) = repo();
    let stored = serde_json::json!([
      {"id": "old", "company": "Acme", "status": "Ghosted",
       "createdAt": "2024-01-01T00:00:00.000Z"},
      {"id": "old2", "company": "Acme", "role": 7, "status": "Offer",
       "createdAt": "2024-01-01T00:00:00.000Z"},
    ]);
    store
      .set(keys::EXPERIENCES, serde_json::to_vec(&stored).unwrap())
      .await
      .unwrap();

    let created = repo
      .add(NewExperience::new("Globex", ExperienceStatus::Replied))
      .await
      .unwrap();
    assert_eq!(repo.list().await.unwrap(), vec![created.clone()]);

    let raw = store.get(keys::EXPERIENCES).await.unwrap().unwrap();
    let items: Vec<serde_json::Value> = serde_json::from_slice(&raw).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["id"], created.id.as_str());
    assert_eq!(items[1], stored[0]);
    assert_eq!(items[2], stored[1]);
  }

  #[tokio::test]
  async fn add_assigns_id_and_persists() {
    let (_, repo) = repo();
    let mut input = NewExperience::new(" Acme ", ExperienceStatus::NoReply);
    input.wait = Some(WaitBucket::OneToTwoMonths);

    let created = repo.add(input).await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.company, "Acme");
    assert_eq!(created.no_reply_wait, Some(WaitBucket::OneToTwoMonths));

    let listed = repo.list().await.unwrap();
    assert_eq!(listed, vec![created]);
  }

  #[tokio::test]
  async fn add_with_blank_company_writes_nothing() {
    let (store, repo) = repo();
    let result = repo.add(NewExperience::new("  ", ExperienceStatus::Offer)).await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(store.get(keys::EXPERIENCES).await.unwrap(), None);
  }

  #[tokio::test]
  async fn for_company_matches_trimmed_name() {
    let (_, repo) = repo();
    repo.append(record("1", "Acme")).await.unwrap();
    repo.append(record("2", "Globex")).await.unwrap();
    repo.append(record("3", " Acme  ")).await.unwrap();
    repo.append(record("4", "acme")).await.unwrap();

    let ids: Vec<_> = repo
      .for_company("Acme ")
      .await
      .unwrap()
      .into_iter()
      .map(|e| e.id)
      .collect();
    assert_eq!(ids, vec!["3", "1"]);
  }
}
