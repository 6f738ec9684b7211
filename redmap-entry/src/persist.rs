//! # Generic Persistence Operations
//!
//! Purpose: The store/fetch operations for any [`StoreEntry`] type, generic
//! over the client mode. Blocking callers use the `StoreClient` bound,
//! non-blocking callers the `_async` twins; the semantics are identical.
//!
//! Every operation is one independent store round-trip; nothing here
//! composes calls atomically or retries.

use redmap_client::{AsyncStoreClient, StoreClient};
use redmap_common::{StoreError, StoreResult};
use tracing::{debug, warn};

use crate::entry::{to_field_map, StoreEntry};
use crate::value::{decode_field, pack_field_map, unpack_field_map, FieldValues};

/// Persists a record under its store-key and sub-key.
///
/// Returns the number of fields written into the packed map.
pub fn store<E: StoreEntry, C: StoreClient>(entry: &E, client: &C) -> StoreResult<usize> {
    let map = to_field_map(entry)?;
    let blob = pack_field_map(&map)?;
    debug!(
        kind = E::KIND,
        store_key = entry.store_key(),
        sub_key = entry.sub_key(),
        fields = map.len(),
        "storing entry"
    );
    client.hset(entry.store_key(), entry.sub_key(), &blob)?;
    Ok(map.len())
}

/// Fetches a record by its key pair.
///
/// An absent sub-key is `NotFound`; a present but undecodable entry is a
/// `Deserialize` error naming the offending field.
pub fn fetch<E: StoreEntry, C: StoreClient>(
    client: &C,
    store_key: &str,
    sub_key: &str,
) -> StoreResult<E> {
    let blob = client
        .hget(store_key, sub_key)?
        .ok_or_else(|| not_found(store_key, sub_key))?;
    decode_entry(store_key, sub_key, &blob)
}

/// Fetches every record stored under a store-key.
pub fn fetch_all<E: StoreEntry, C: StoreClient>(
    client: &C,
    store_key: &str,
) -> StoreResult<Vec<E>> {
    let entries = client.hgetall(store_key)?;
    entries
        .iter()
        .map(|(sub_key, blob)| decode_entry(store_key, sub_key, blob))
        .collect()
}

/// Lists the sub-keys stored under a store-key.
pub fn sub_keys<C: StoreClient>(client: &C, store_key: &str) -> StoreResult<Vec<String>> {
    client.hkeys(store_key)
}

/// True when a record exists for the key pair.
pub fn exists<C: StoreClient>(client: &C, store_key: &str, sub_key: &str) -> StoreResult<bool> {
    client.hexists(store_key, sub_key)
}

/// Removes a record's stored entry; true when something was deleted.
pub fn remove<E: StoreEntry, C: StoreClient>(entry: &E, client: &C) -> StoreResult<bool> {
    let removed = client.hdel(entry.store_key(), entry.sub_key())?;
    if !removed {
        warn!(
            kind = E::KIND,
            store_key = entry.store_key(),
            sub_key = entry.sub_key(),
            "remove requested for an entry the store does not hold"
        );
    }
    Ok(removed)
}

/// Non-blocking twin of [`store`].
pub async fn store_async<E: StoreEntry, C: AsyncStoreClient>(
    entry: &E,
    client: &C,
) -> StoreResult<usize> {
    let map = to_field_map(entry)?;
    let blob = pack_field_map(&map)?;
    debug!(
        kind = E::KIND,
        store_key = entry.store_key(),
        sub_key = entry.sub_key(),
        fields = map.len(),
        "storing entry"
    );
    client.hset(entry.store_key(), entry.sub_key(), &blob).await?;
    Ok(map.len())
}

/// Non-blocking twin of [`fetch`].
pub async fn fetch_async<E: StoreEntry, C: AsyncStoreClient>(
    client: &C,
    store_key: &str,
    sub_key: &str,
) -> StoreResult<E> {
    let blob = client
        .hget(store_key, sub_key)
        .await?
        .ok_or_else(|| not_found(store_key, sub_key))?;
    decode_entry(store_key, sub_key, &blob)
}

/// Non-blocking twin of [`fetch_all`].
pub async fn fetch_all_async<E: StoreEntry, C: AsyncStoreClient>(
    client: &C,
    store_key: &str,
) -> StoreResult<Vec<E>> {
    let entries = client.hgetall(store_key).await?;
    entries
        .iter()
        .map(|(sub_key, blob)| decode_entry(store_key, sub_key, blob))
        .collect()
}

/// Non-blocking twin of [`sub_keys`].
pub async fn sub_keys_async<C: AsyncStoreClient>(
    client: &C,
    store_key: &str,
) -> StoreResult<Vec<String>> {
    client.hkeys(store_key).await
}

/// Non-blocking twin of [`exists`].
pub async fn exists_async<C: AsyncStoreClient>(
    client: &C,
    store_key: &str,
    sub_key: &str,
) -> StoreResult<bool> {
    client.hexists(store_key, sub_key).await
}

/// Non-blocking twin of [`remove`].
pub async fn remove_async<E: StoreEntry, C: AsyncStoreClient>(
    entry: &E,
    client: &C,
) -> StoreResult<bool> {
    let removed = client.hdel(entry.store_key(), entry.sub_key()).await?;
    if !removed {
        warn!(
            kind = E::KIND,
            store_key = entry.store_key(),
            sub_key = entry.sub_key(),
            "remove requested for an entry the store does not hold"
        );
    }
    Ok(removed)
}

fn not_found(store_key: &str, sub_key: &str) -> StoreError {
    debug!(store_key, sub_key, "no stored entry for sub-key");
    StoreError::NotFound {
        store_key: store_key.to_string(),
        sub_key: sub_key.to_string(),
    }
}

fn decode_entry<E: StoreEntry>(store_key: &str, sub_key: &str, blob: &[u8]) -> StoreResult<E> {
    let map = unpack_field_map(blob)?;
    let mut values = FieldValues::default();
    for spec in E::schema() {
        if spec.derived {
            continue;
        }
        let bytes = map.get(spec.name).ok_or_else(|| StoreError::Deserialize {
            field: spec.name.to_string(),
            reason: "field missing from stored map".to_string(),
        })?;
        let value = decode_field(spec.name, bytes)?;
        if value.kind() != spec.kind {
            return Err(StoreError::Deserialize {
                field: spec.name.to_string(),
                reason: format!(
                    "declared as {}, stored value is {}",
                    spec.kind.name(),
                    value.kind().name()
                ),
            });
        }
        values.insert(spec.name, value);
    }
    E::from_fields(store_key, sub_key, values)
}
