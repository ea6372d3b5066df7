//! Bucket and entry operations on the SQLite store.
//!
//! A bucket is a named set of request→response entries. Buckets are
//! created on first open and removed wholesale on delete; entries are
//! keyed by [`request_key`](super::hash::request_key) within a bucket.

use super::connection::CacheDb;
use super::hash::request_key;
use crate::Error;
use crate::http::{Request, Response};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Listing row for a stored entry, without the body.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, schemars::JsonSchema)]
pub struct EntrySummary {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub stored_at: String,
}

const SELECT_RESPONSE: &str = "SELECT e.url, e.status, e.status_text, e.kind, e.headers_json, e.body
     FROM entries e JOIN buckets b ON b.name = e.bucket";

/// url, status, status_text, kind, headers_json, body
type StoredRow = (String, u16, String, String, String, Vec<u8>);

fn decode_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

fn into_response((url, status, status_text, kind, headers_json, body): StoredRow) -> Result<Response, Error> {
    let headers: Vec<(String, String)> =
        serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(format!("{url}: headers: {e}")))?;
    let mut response = Response::new(url, status, body)
        .with_kind(kind.parse()?)
        .with_status_text(status_text);
    response.headers = headers;
    Ok(response)
}

/// Fixed-width timestamp so creation order sorts lexically.
fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
}

impl CacheDb {
    /// Create the bucket if it does not exist yet.
    pub async fn open_bucket(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![name, timestamp()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Bucket names in creation order.
    pub async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM buckets ORDER BY created_at ASC, rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_bucket(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM buckets WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a bucket and all of its entries.
    ///
    /// Returns false if no bucket by that name existed.
    pub async fn delete_bucket(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                conn.execute("DELETE FROM entries WHERE bucket = ?1", params![name])?;
                let deleted = conn.execute("DELETE FROM buckets WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response under the request's identity, replacing any
    /// previous entry. Opens the bucket implicitly.
    pub async fn put_entry(&self, bucket: &str, request: &Request, mut response: Response) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let key = request_key(request);
        let method = request.method.to_string();
        let url = request.url.clone();
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::InvalidInput(format!("failed to encode headers: {e}")))?;
        let body = response.bytes()?.to_vec();
        let now = timestamp();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![bucket, now],
                )?;
                conn.execute(
                    "INSERT INTO entries (
                        bucket, key, method, url, status, status_text, kind, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(bucket, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        kind = excluded.kind,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        bucket,
                        key,
                        method,
                        url,
                        response.status,
                        response.status_text,
                        response.kind.as_str(),
                        headers_json,
                        body,
                        now,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look the request up across all buckets, oldest bucket first.
    pub async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key = request_key(request);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<StoredRow>, Error> {
                let sql = format!("{SELECT_RESPONSE} WHERE e.key = ?1 ORDER BY b.created_at ASC, b.rowid ASC LIMIT 1");
                match conn.query_row(&sql, params![key], decode_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(into_response).transpose()
    }

    /// Look the request up in one bucket only.
    pub async fn match_in(&self, bucket: &str, request: &Request) -> Result<Option<Response>, Error> {
        let bucket = bucket.to_string();
        let key = request_key(request);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<StoredRow>, Error> {
                let sql = format!("{SELECT_RESPONSE} WHERE e.bucket = ?1 AND e.key = ?2");
                match conn.query_row(&sql, params![bucket, key], decode_row) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(into_response).transpose()
    }

    /// Entries of a bucket in storage order, bodies omitted.
    pub async fn list_entries(&self, bucket: &str) -> Result<Vec<EntrySummary>, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntrySummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, stored_at FROM entries WHERE bucket = ?1 ORDER BY stored_at ASC, url ASC",
                )?;
                let entries = stmt
                    .query_map(params![bucket], |row| {
                        Ok(EntrySummary {
                            method: row.get(0)?,
                            url: row.get(1)?,
                            status: row.get(2)?,
                            stored_at: row.get(3)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }

    /// Total number of entries across all buckets.
    pub async fn entry_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
