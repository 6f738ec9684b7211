//! Stores a reminder record in a live store, fetches it back, marks it
//! complete, and stores it again.
//!
//! Needs a Redis-compatible server; set `REDMAP_ADDR` to point somewhere
//! other than the default local instance.
//!
//! ```text
//! REDMAP_ADDR=127.0.0.1:6379 cargo run -p redmap-entry --example reminder
//! ```

use anyhow::Result;
use redmap_client::{BlockingStore, StoreClient};
use redmap_common::StoreResult;
use redmap_entry::{
    dump, persist, sub_key_for, FieldKind, FieldSpec, FieldValue, FieldValues, StoreEntry,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Reminder {
    sub_key: String,
    member_id: String,
    content: String,
    trigger_ts: f64,
    created_ts: f64,
    is_complete: bool,
}

const REMINDER_SCHEMA: &[FieldSpec] = &[
    FieldSpec::new("member_id", FieldKind::Str),
    FieldSpec::new("content", FieldKind::Str),
    FieldSpec::new("trigger_ts", FieldKind::Float),
    FieldSpec::new("created_ts", FieldKind::Float),
    FieldSpec::new("is_complete", FieldKind::Bool),
];

impl Reminder {
    fn new(member_id: &str, content: &str, trigger_ts: f64, created_ts: f64) -> Self {
        Reminder {
            sub_key: sub_key_for(member_id, created_ts),
            member_id: member_id.to_string(),
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
            content: fields.take_str("content")?,
            trigger_ts: fields.take_float("trigger_ts")?,
            created_ts: fields.take_float("created_ts")?,
            is_complete: fields.take_bool("is_complete")?,
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let addr = std::env::var("REDMAP_ADDR").unwrap_or_else(|_| "127.0.0.1:6379".to_string());
    let client = BlockingStore::connect(addr);
    info!(reply = %client.ping()?, "connected to store");

    let reminder = Reminder::new(
        "12345",
        "water the plants",
        1610330101.801648,
        1610322901.801648,
    );
    let written = persist::store(&reminder, &client)?;
    info!(fields = written, sub_key = reminder.sub_key(), "stored reminder");

    let mut fetched: Reminder = persist::fetch(&client, "reminders", reminder.sub_key())?;
    println!("{}", dump(&fetched));

    fetched.is_complete = true;
    persist::store(&fetched, &client)?;

    let done: Reminder = persist::fetch(&client, "reminders", reminder.sub_key())?;
    println!("{}", dump(&done));

    persist::remove(&done, &client)?;
    Ok(())
}
