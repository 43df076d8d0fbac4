//! Partition lifecycle: open, list, delete.
//!
//! A partition is a named set of cached responses. Opening is idempotent and
//! creates the partition when it is absent.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A partition together with its current size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PartitionSummary {
    pub name: String,
    pub created_at: String,
    pub entries: u64,
    pub body_bytes: u64,
}

impl CacheDb {
    /// Open a partition, creating it if it does not exist.
    pub async fn open_partition(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_partitions (name, created_at) VALUES (?1, ?2)",
                    params![name, super::now()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a partition has been opened.
    pub async fn has_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_partitions WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// List every partition with its entry count and stored body size.
    pub async fn list_partitions(&self) -> Result<Vec<PartitionSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, p.created_at, COUNT(e.url), COALESCE(SUM(LENGTH(e.body)), 0)
                     FROM cache_partitions p
                     LEFT JOIN cache_entries e ON e.partition_name = p.name
                     GROUP BY p.name, p.created_at
                     ORDER BY p.name",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(PartitionSummary {
                        name: row.get(0)?,
                        created_at: row.get(1)?,
                        entries: row.get::<_, i64>(2)? as u64,
                        body_bytes: row.get::<_, i64>(3)? as u64,
                    })
                })?;
                let summaries = rows.collect::<Result<Vec<_>, _>>()?;
                Ok(summaries)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and all of its entries.
    ///
    /// Returns false if the partition did not exist.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_partitions WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every partition whose name is not in `keep`.
    ///
    /// Returns the names of the deleted partitions.
    pub async fn delete_partitions_except(&self, keep: &[&str]) -> Result<Vec<String>, Error> {
        let keep: Vec<String> = keep.iter().map(|s| s.to_string()).collect();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction()?;
                let stale: Vec<String> = {
                    let mut stmt = tx.prepare("SELECT name FROM cache_partitions ORDER BY name")?;
                    let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
                    names
                        .collect::<Result<Vec<_>, _>>()?
                        .into_iter()
                        .filter(|name| !keep.contains(name))
                        .collect()
                };
                for name in &stale {
                    tx.execute("DELETE FROM cache_partitions WHERE name = ?1", params![name])?;
                }
                tx.commit()?;
                Ok(stale)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_partition_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_partition("preload").await.unwrap();
        db.open_partition("preload").await.unwrap();

        let partitions = db.list_partitions().await.unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].name, "preload");
        assert_eq!(partitions[0].entries, 0);
        assert!(db.has_partition("preload").await.unwrap());
        assert!(!db.has_partition("offline").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_partition() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_partition("offline").await.unwrap();

        assert!(db.delete_partition("offline").await.unwrap());
        assert!(!db.delete_partition("offline").await.unwrap());
        assert!(db.list_partitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_partitions_except() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for name in ["preload", "offline", "offline-v1", "code-dev"] {
            db.open_partition(name).await.unwrap();
        }

        let deleted = db.delete_partitions_except(&["preload", "offline"]).await.unwrap();
        assert_eq!(deleted, vec!["code-dev".to_string(), "offline-v1".to_string()]);

        let remaining: Vec<String> = db
            .list_partitions()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(remaining, vec!["offline".to_string(), "preload".to_string()]);
    }
}
