//! Cached response CRUD operations.
//!
//! Entries are keyed by `(partition, absolute URL)`. A write replaces any
//! previous entry for the same key, so concurrent writers for one URL end up
//! with the last response written.

use super::connection::CacheDb;
use super::hash::body_digest;
use crate::{Error, Response};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

/// Metadata describing a cached entry without its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryMeta {
    pub partition: String,
    pub url: String,
    pub host: String,
    pub status: u16,
    pub body_len: u64,
    pub body_sha256: String,
    pub stored_at: String,
}

/// Which entries a maintenance purge removes.
///
/// Every filter that is set is applied, and the deleted counts add up.
/// Build one with [`PurgeFilter::new`] so a rejected request never deletes
/// anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeFilter {
    pub partition: Option<String>,
    pub host: Option<String>,
    pub older_than: Option<DateTime<Utc>>,
}

impl PurgeFilter {
    /// Validate caller input and resolve the age cutoff against now.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when no filter is given, a name is
    /// blank, or `older_than_days` is negative or out of the date range.
    pub fn new(partition: Option<String>, host: Option<String>, older_than_days: Option<i64>) -> Result<Self, Error> {
        if partition.is_none() && host.is_none() && older_than_days.is_none() {
            return Err(Error::InvalidInput(
                "At least one of partition, host, or older_than_days must be specified".into(),
            ));
        }

        let partition = partition.map(|p| p.trim().to_string());
        if partition.as_deref().is_some_and(str::is_empty) {
            return Err(Error::InvalidInput("partition must not be empty".into()));
        }
        let host = host.map(|h| h.trim().to_ascii_lowercase());
        if host.as_deref().is_some_and(str::is_empty) {
            return Err(Error::InvalidInput("host must not be empty".into()));
        }

        let older_than = older_than_days.map(cutoff_days_ago).transpose()?;
        Ok(Self { partition, host, older_than })
    }
}

fn cutoff_days_ago(days: i64) -> Result<DateTime<Utc>, Error> {
    if days < 0 {
        return Err(Error::InvalidInput("older_than_days must not be negative".into()));
    }
    chrono::Duration::try_days(days)
        .and_then(|age| Utc::now().checked_sub_signed(age))
        .ok_or_else(|| Error::InvalidInput(format!("older_than_days out of range: {days}")))
}

impl CacheDb {
    /// Store a response under `url` in `partition`, opening the partition if needed.
    ///
    /// Callers decide what is cacheable; this layer stores whatever it is given.
    pub async fn put_entry(&self, partition: &str, url: &Url, response: &Response) -> Result<(), Error> {
        let partition = partition.to_string();
        let key = url.to_string();
        let host = url.host_str().unwrap_or_default().to_string();
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let digest = body_digest(&response.body);
        let status = response.status;
        let body = response.body.clone();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let stored_at = super::now();
                tx.execute(
                    "INSERT OR IGNORE INTO cache_partitions (name, created_at) VALUES (?1, ?2)",
                    params![&partition, &stored_at],
                )?;
                tx.execute(
                    "INSERT INTO cache_entries (
                        partition_name, url, host, status, headers_json, body, body_sha256, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(partition_name, url) DO UPDATE SET
                        host = excluded.host,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        body_sha256 = excluded.body_sha256,
                        stored_at = excluded.stored_at",
                    params![&partition, &key, &host, status, &headers_json, &body[..], &digest, &stored_at],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the stored response for `url` in `partition`.
    ///
    /// Returns None on a miss, including when the partition does not exist.
    pub async fn match_response(&self, partition: &str, url: &str) -> Result<Option<Response>, Error> {
        let partition = partition.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let result = conn.query_row(
                    "SELECT status, headers_json, body FROM cache_entries
                     WHERE partition_name = ?1 AND url = ?2",
                    params![partition, url],
                    |row| Ok((row.get::<_, u16>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                );

                match result {
                    Ok((status, headers_json, body)) => {
                        let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::CorruptEntry(format!("{url}: {e}")))?;
                        Ok(Some(Response { status, headers, body: Bytes::from(body) }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether `url` is stored in `partition`.
    pub async fn contains_entry(&self, partition: &str, url: &str) -> Result<bool, Error> {
        let partition = partition.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_entries WHERE partition_name = ?1 AND url = ?2)",
                    params![partition, url],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Whether any partition holds an entry for `url`.
    pub async fn any_partition_contains(&self, url: &str) -> Result<bool, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_entries WHERE url = ?1)",
                    params![url],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Metadata for one entry.
    pub async fn get_entry_meta(&self, partition: &str, url: &str) -> Result<Option<EntryMeta>, Error> {
        let partition = partition.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<EntryMeta>, Error> {
                let mut stmt = conn.prepare(&format!("{META_SELECT} WHERE partition_name = ?1 AND url = ?2"))?;
                match stmt.query_row(params![partition, url], meta_from_row) {
                    Ok(meta) => Ok(Some(meta)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Metadata for every entry in a partition, ordered by URL.
    pub async fn list_entries(&self, partition: &str) -> Result<Vec<EntryMeta>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntryMeta>, Error> {
                let mut stmt = conn.prepare(&format!("{META_SELECT} WHERE partition_name = ?1 ORDER BY url"))?;
                let rows = stmt.query_map(params![partition], meta_from_row)?;
                let entries = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries, in one partition or across all of them.
    pub async fn count_entries(&self, partition: Option<&str>) -> Result<u64, Error> {
        let partition = partition.map(str::to_string);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = match partition {
                    Some(p) => conn.query_row(
                        "SELECT COUNT(*) FROM cache_entries WHERE partition_name = ?1",
                        params![p],
                        |row| row.get(0),
                    )?,
                    None => conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?,
                };
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry.
    ///
    /// Returns false if there was nothing to delete.
    pub async fn delete_entry(&self, partition: &str, url: &str) -> Result<bool, Error> {
        let partition = partition.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM cache_entries WHERE partition_name = ?1 AND url = ?2",
                    params![partition, url],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry in a partition, keeping the partition itself.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_partition(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE partition_name = ?1", params![partition])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Apply every filter in `filter` inside one transaction.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge(&self, filter: &PurgeFilter) -> Result<u64, Error> {
        let filter = filter.clone();
        let older_than = filter.older_than.map(super::timestamp);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let mut deleted = 0;
                if let Some(partition) = &filter.partition {
                    deleted += tx.execute("DELETE FROM cache_entries WHERE partition_name = ?1", params![partition])?;
                }
                if let Some(host) = &filter.host {
                    deleted += tx.execute("DELETE FROM cache_entries WHERE host = ?1", params![host])?;
                }
                if let Some(cutoff) = &older_than {
                    deleted += tx.execute("DELETE FROM cache_entries WHERE stored_at < ?1", params![cutoff])?;
                }
                tx.commit()?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}

const META_SELECT: &str =
    "SELECT partition_name, url, host, status, LENGTH(body), body_sha256, stored_at FROM cache_entries";

fn meta_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryMeta> {
    Ok(EntryMeta {
        partition: row.get(0)?,
        url: row.get(1)?,
        host: row.get(2)?,
        status: row.get(3)?,
        body_len: row.get::<_, i64>(4)? as u64,
        body_sha256: row.get(5)?,
        stored_at: row.get(6)?,
    })
}
