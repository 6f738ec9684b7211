//! End-to-end mapping tests over an in-memory store double.
//!
//! `MemoryStore` implements both client traits against the same map, so the
//! blocking and non-blocking persistence paths can be exercised without a
//! live store.

use std::collections::BTreeMap;
use std::sync::Mutex;

use redmap_client::{AsyncStoreClient, StoreClient};
use redmap_common::{StoreError, StoreResult};
use redmap_entry::persist;
use redmap_entry::{
    dump, entries_equal, sub_key_for, FieldKind, FieldSpec, FieldValue, FieldValues, StoreEntry,
};

struct MemoryStore {
    hashes: Mutex<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    fn new() -> Self {
        MemoryStore {
            hashes: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, BTreeMap<String, Vec<u8>>>> {
        self.hashes.lock().expect("store mutex poisoned")
    }
}

impl StoreClient for MemoryStore {
    fn ping(&self) -> StoreResult<String> {
        Ok("PONG".to_string())
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.lock().contains_key(key))
    }

    fn keys(&self, _pattern: &str) -> StoreResult<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }

    fn hset(&self, key: &str, field: &str, value: &[u8]) -> StoreResult<bool> {
        let mut hashes = self.lock();
        let hash = hashes.entry(key.to_string()).or_default();
        Ok(hash.insert(field.to_string(), value.to_vec()).is_none())
    }

    fn hget(&self, key: &str, field: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(self
            .lock()
            .get(key)
            .and_then(|hash| hash.get(field))
            .cloned())
    }

    fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, Vec<u8>>> {
        Ok(self.lock().get(key).cloned().unwrap_or_default())
    }

    fn hkeys(&self, key: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .lock()
            .get(key)
            .map(|hash| hash.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn hexists(&self, key: &str, field: &str) -> StoreResult<bool> {
        Ok(self
            .lock()
            .get(key)
            .is_some_and(|hash| hash.contains_key(field)))
    }

    fn hdel(&self, key: &str, field: &str) -> StoreResult<bool> {
        let mut hashes = self.lock();
        Ok(hashes
            .get_mut(key)
            .is_some_and(|hash| hash.remove(field).is_some()))
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.lock().remove(key).is_some())
    }
}

impl AsyncStoreClient for MemoryStore {
    async fn ping(&self) -> StoreResult<String> {
        StoreClient::ping(self)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        StoreClient::exists(self, key)
    }

    async fn keys(&self, pattern: &str) -> StoreResult<Vec<String>> {
        StoreClient::keys(self, pattern)
    }

    async fn hset(&self, key: &str, field: &str, value: &[u8]) -> StoreResult<bool> {
        StoreClient::hset(self, key, field, value)
    }

    async fn hget(&self, key: &str, field: &str) -> StoreResult<Option<Vec<u8>>> {
        StoreClient::hget(self, key, field)
    }

    async fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, Vec<u8>>> {
        StoreClient::hgetall(self, key)
    }

    async fn hkeys(&self, key: &str) -> StoreResult<Vec<String>> {
        StoreClient::hkeys(self, key)
    }

    async fn hexists(&self, key: &str, field: &str) -> StoreResult<bool> {
        StoreClient::hexists(self, key, field)
    }

    async fn hdel(&self, key: &str, field: &str) -> StoreResult<bool> {
        StoreClient::hdel(self, key, field)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        StoreClient::delete(self, key)
    }
}

/// Double that rejects every command the way a live store refuses a
/// wrong-typed key.
struct RejectingStore;

impl RejectingStore {
    fn refusal(&self) -> StoreError {
        StoreError::Command {
            message: "WRONGTYPE Operation against a key holding the wrong kind of value"
                .to_string(),
        }
    }
}

impl StoreClient for RejectingStore {
    fn ping(&self) -> StoreResult<String> {
        Err(self.refusal())
    }

    fn exists(&self, _key: &str) -> StoreResult<bool> {
        Err(self.refusal())
    }

    fn keys(&self, _pattern: &str) -> StoreResult<Vec<String>> {
        Err(self.refusal())
    }

    fn hset(&self, _key: &str, _field: &str, _value: &[u8]) -> StoreResult<bool> {
        Err(self.refusal())
    }

    fn hget(&self, _key: &str, _field: &str) -> StoreResult<Option<Vec<u8>>> {
        Err(self.refusal())
    }

    fn hgetall(&self, _key: &str) -> StoreResult<BTreeMap<String, Vec<u8>>> {
        Err(self.refusal())
    }

    fn hkeys(&self, _key: &str) -> StoreResult<Vec<String>> {
        Err(self.refusal())
    }

    fn hexists(&self, _key: &str, _field: &str) -> StoreResult<bool> {
        Err(self.refusal())
    }

    fn hdel(&self, _key: &str, _field: &str) -> StoreResult<bool> {
        Err(self.refusal())
    }

    fn delete(&self, _key: &str) -> StoreResult<bool> {
        Err(self.refusal())
    }
}

#[derive(Debug, Clone)]
struct Reminder {
    sub_key: String,
    member_id: String,
    member_name: String,
    channel_id: i64,
    channel_name: String,
    provided_when: String,
    content: String,
    trigger_ts: f64,
    created_ts: f64,
    is_complete: bool,
}

const REMINDER_SCHEMA: &[FieldSpec] = &[
    FieldSpec::new("member_id", FieldKind::Str),
    FieldSpec::new("member_name", FieldKind::Str),
    FieldSpec::new("channel_id", FieldKind::Int),
    FieldSpec::new("channel_name", FieldKind::Str),
    FieldSpec::new("provided_when", FieldKind::Str),
    FieldSpec::new("content", FieldKind::Str),
    FieldSpec::new("trigger_ts", FieldKind::Float),
    FieldSpec::new("created_ts", FieldKind::Float),
    FieldSpec::new("is_complete", FieldKind::Bool),
];

impl Reminder {
    #[allow(clippy::too_many_arguments)]
    fn new(
        member_id: &str,
        member_name: &str,
        channel_id: i64,
        channel_name: &str,
        provided_when: &str,
        content: &str,
        trigger_ts: f64,
        created_ts: f64,
    ) -> Self {
        Reminder {
            sub_key: sub_key_for(member_id, created_ts),
            member_id: member_id.to_string(),
            member_name: member_name.to_string(),
            channel_id,
            channel_name: channel_name.to_string(),
            provided_when: provided_when.to_string(),
            content: content.to_string(),
            trigger_ts,
            created_ts,
            is_complete: false,
        }
    }
}

impl StoreEntry for Reminder {
    const KIND: &'static str = "Reminder";

    fn schema() -> &'static [FieldSpec] {
        REMINDER_SCHEMA
    }

    fn store_key(&self) -> &str {
        "reminders"
    }

    fn sub_key(&self) -> &str {
        &self.sub_key
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "member_id" => Some(self.member_id.as_str().into()),
            "member_name" => Some(self.member_name.as_str().into()),
            "channel_id" => Some(self.channel_id.into()),
            "channel_name" => Some(self.channel_name.as_str().into()),
            "provided_when" => Some(self.provided_when.as_str().into()),
            "content" => Some(self.content.as_str().into()),
            "trigger_ts" => Some(self.trigger_ts.into()),
            "created_ts" => Some(self.created_ts.into()),
            "is_complete" => Some(self.is_complete.into()),
            _ => None,
        }
    }

    fn from_fields(_store_key: &str, sub_key: &str, mut fields: FieldValues) -> StoreResult<Self> {
        Ok(Reminder {
            sub_key: sub_key.to_string(),
            member_id: fields.take_str("member_id")?,
            member_name: fields.take_str("member_name")?,
            channel_id: fields.take_int("channel_id")?,
            channel_name: fields.take_str("channel_name")?,
            provided_when: fields.take_str("provided_when")?,
            content: fields.take_str("content")?,
            trigger_ts: fields.take_float("trigger_ts")?,
            created_ts: fields.take_float("created_ts")?,
            is_complete: fields.take_bool("is_complete")?,
        })
    }
}

fn sample_reminder() -> Reminder {
    Reminder::new(
        "12345",
        "tumblekit",
        67890,
        "general",
        "in two hours",
        "water the plants",
        1610330101.801648,
        1610322901.801648,
    )
}

#[test]
fn reminder_roundtrips_through_the_store() {
    let store = MemoryStore::new();
    let reminder = sample_reminder();

    let written = persist::store(&reminder, &store).expect("store");
    assert_eq!(written, 9);

    let fetched: Reminder =
        persist::fetch(&store, "reminders", reminder.sub_key()).expect("fetch");
    assert!(entries_equal(&reminder, &fetched));
}

#[test]
fn sub_key_combines_identity_and_creation_time() {
    let reminder = sample_reminder();
    assert_eq!(reminder.sub_key(), "12345:1610322901.801648");

    let later = Reminder::new(
        "12345",
        "tumblekit",
        67890,
        "general",
        "tomorrow",
        "water the plants again",
        1610416501.0,
        1610409301.25,
    );
    assert_ne!(reminder.sub_key(), later.sub_key());
}

#[test]
fn fetch_of_absent_sub_key_is_not_found() {
    let store = MemoryStore::new();
    match persist::fetch::<Reminder, _>(&store, "reminders", "nobody:0") {
        Err(StoreError::NotFound { store_key, sub_key }) => {
            assert_eq!(store_key, "reminders");
            assert_eq!(sub_key, "nobody:0");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn store_refusal_surfaces_as_command_error() {
    let reminder = sample_reminder();
    match persist::store(&reminder, &RejectingStore) {
        Err(StoreError::Command { message }) => assert!(message.starts_with("WRONGTYPE")),
        other => panic!("expected Command error, got {other:?}"),
    }
    match persist::fetch::<Reminder, _>(&RejectingStore, "reminders", "12345:0") {
        Err(StoreError::Command { .. }) => {}
        other => panic!("expected Command error, got {other:?}"),
    }
}

#[test]
fn corrupt_stored_entry_is_deserialize_error() {
    let store = MemoryStore::new();
    StoreClient::hset(&store, "reminders", "12345:1.0", b"\x80\x04not a payload").expect("hset");

    match persist::fetch::<Reminder, _>(&store, "reminders", "12345:1.0") {
        Err(StoreError::Deserialize { .. }) => {}
        other => panic!("expected Deserialize error, got {other:?}"),
    }
}

#[test]
fn completion_flip_persists_across_roundtrips() {
    let store = MemoryStore::new();
    let reminder = sample_reminder();
    persist::store(&reminder, &store).expect("store");

    let mut fetched: Reminder =
        persist::fetch(&store, "reminders", reminder.sub_key()).expect("fetch");
    assert!(!fetched.is_complete);

    fetched.is_complete = true;
    persist::store(&fetched, &store).expect("re-store");

    let again: Reminder =
        persist::fetch(&store, "reminders", reminder.sub_key()).expect("re-fetch");
    assert!(again.is_complete);
    assert!(!entries_equal(&reminder, &again));
}

#[test]
fn fetch_all_returns_every_stored_reminder() {
    let store = MemoryStore::new();
    let first = sample_reminder();
    let second = Reminder::new(
        "67890",
        "penwright",
        67890,
        "general",
        "next week",
        "renew the domain",
        1610934901.5,
        1610927701.5,
    );
    persist::store(&first, &store).expect("store first");
    persist::store(&second, &store).expect("store second");

    let all: Vec<Reminder> = persist::fetch_all(&store, "reminders").expect("fetch all");
    assert_eq!(all.len(), 2);

    let keys = persist::sub_keys(&store, "reminders").expect("sub keys");
    assert!(keys.contains(&first.sub_key().to_string()));
    assert!(keys.contains(&second.sub_key().to_string()));
}

#[test]
fn remove_deletes_the_entry_and_reports_absence() {
    let store = MemoryStore::new();
    let reminder = sample_reminder();
    persist::store(&reminder, &store).expect("store");
    assert!(persist::exists(&store, "reminders", reminder.sub_key()).expect("exists"));

    assert!(persist::remove(&reminder, &store).expect("remove"));
    assert!(!persist::exists(&store, "reminders", reminder.sub_key()).expect("exists"));

    // A second removal is a no-op, reported through the return value.
    assert!(!persist::remove(&reminder, &store).expect("remove again"));
}

#[test]
fn dump_names_the_record_and_every_field() {
    let reminder = sample_reminder();
    let text = dump(&reminder);
    assert!(text.starts_with(
        "Reminder entry for key \"reminders\" (sub-key \"12345:1610322901.801648\")"
    ));
    assert!(text.contains("  content -> \"water the plants\""));
    assert!(text.contains("  is_complete -> \"false\""));
    assert_eq!(text.lines().count(), 10);
}

#[tokio::test]
async fn async_roundtrip_matches_blocking_semantics() {
    let store = MemoryStore::new();
    let reminder = sample_reminder();

    let written = persist::store_async(&reminder, &store).await.expect("store");
    assert_eq!(written, 9);

    let fetched: Reminder = persist::fetch_async(&store, "reminders", reminder.sub_key())
        .await
        .expect("fetch");
    assert!(entries_equal(&reminder, &fetched));

    let keys = persist::sub_keys_async(&store, "reminders").await.expect("keys");
    assert_eq!(keys, vec![reminder.sub_key().to_string()]);

    assert!(persist::remove_async(&reminder, &store).await.expect("remove"));
    match persist::fetch_async::<Reminder, _>(&store, "reminders", reminder.sub_key()).await {
        Err(StoreError::NotFound { .. }) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}
