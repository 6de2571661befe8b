//! The `Store`: a pooled `SQLite` connection plus the operations that read
//! and write Injections, Callbacks, and their correlation join.

use crate::error::{Result, StoreError};
use crate::migrations::apply_all_migrations;
use ricochet_types::{Callback, Finding, Injection, Severity, Token};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;

/// Durable, referentially-consistent storage for injections and callbacks.
///
/// Cheap to clone (an `Arc`-backed pool internally); share one instance
/// across the injector, the listeners, and the CLI's reporting commands.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens (creating if absent) the `SQLite` database at `path` and applies
    /// every pending migration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be created/opened or a
    /// migration fails.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Io(sqlx::Error::Io(e)))?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
            .map_err(StoreError::Io)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StoreError::Io)?;

        apply_all_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Opens a private, single-connection, file-backed in-memory-equivalent
    /// store for tests.
    ///
    /// A bare `sqlite::memory:` URL hands out a *new* private database to
    /// every connection a pool opens, which silently breaks any test that
    /// reads back what it just wrote through a second connection — capping
    /// the pool at one connection is what makes `:memory:` usable at all.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the in-memory database or its
    /// migrations fail to initialize.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(StoreError::Io)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StoreError::Io)?;
        apply_all_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Records a new injection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateToken`] if `injection.token` already
    /// exists. The primary key is the token, so a re-mint collision or a
    /// caller bug surfaces here rather than silently overwriting history.
    pub async fn record_injection(&self, injection: Injection) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO injections (token, target_url, parameter, payload, context, injected_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(injection.token.as_str())
        .bind(&injection.target_url)
        .bind(&injection.parameter)
        .bind(&injection.payload)
        .bind(&injection.context)
        .bind(injection.injected_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                StoreError::DuplicateToken(injection.token.as_str().to_string()),
            ),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Records an inbound callback, joining it to its injection by token.
    ///
    /// Returns `Ok(false)` without persisting anything if `token` has no
    /// matching injection — an unsolicited probe against the listener, not
    /// a real finding. Returns `Ok(true)` once the row is committed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on any database failure other than the
    /// expected foreign-key miss.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_callback(
        &self,
        token: &Token,
        source_ip: &str,
        request_path: &str,
        headers: &str,
        body: Option<Vec<u8>>,
        received_at: f64,
        metadata: Option<String>,
    ) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM injections WHERE token = ?1")
            .bind(token.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Io)?;

        if exists == 0 {
            tracing::warn!(
                token = token.as_str(),
                source_ip,
                "callback for unknown token, dropping"
            );
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO callbacks
                (token, source_ip, request_path, headers, body, received_at, metadata_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(token.as_str())
        .bind(source_ip)
        .bind(request_path)
        .bind(headers)
        .bind(body)
        .bind(received_at)
        .bind(metadata)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Io)?;

        Ok(true)
    }

    /// Returns every finding, newest callback first, optionally filtered by
    /// `since` (Unix seconds) and/or `min_severity`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on a database failure.
    pub async fn get_findings(
        &self,
        since: Option<f64>,
        min_severity: Option<Severity>,
    ) -> Result<Vec<Finding>> {
        crate::findings::query_findings(&self.pool, since, min_severity).await
    }

    /// Returns every callback recorded against `token`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on a database failure.
    pub async fn get_callbacks_for_injection(&self, token: &Token) -> Result<Vec<Callback>> {
        let rows = sqlx::query(
            "SELECT id, token, source_ip, request_path, headers, body, received_at, metadata_json
             FROM callbacks WHERE token = ?1 ORDER BY received_at ASC",
        )
        .bind(token.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Io)?;

        rows.into_iter()
            .map(|row| {
                let token_str: String = row.try_get("token").map_err(StoreError::Io)?;
                Ok(Callback {
                    id: row.try_get("id").map_err(StoreError::Io)?,
                    token: Token::from_trusted(token_str),
                    source_ip: row.try_get("source_ip").map_err(StoreError::Io)?,
                    request_path: row.try_get("request_path").map_err(StoreError::Io)?,
                    headers: row.try_get("headers").map_err(StoreError::Io)?,
                    body: row.try_get("body").map_err(StoreError::Io)?,
                    received_at: row.try_get("received_at").map_err(StoreError::Io)?,
                    metadata: row.try_get("metadata_json").map_err(StoreError::Io)?,
                })
            })
            .collect()
    }

    /// Returns the single injection for `token`, if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on a database failure.
    pub async fn get_injection(&self, token: &Token) -> Result<Option<Injection>> {
        let row = sqlx::query(
            "SELECT token, target_url, parameter, payload, context, injected_at
             FROM injections WHERE token = ?1",
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Io)?;

        row.map(|row| {
            let token_str: String = row.try_get("token").map_err(StoreError::Io)?;
            Ok(Injection {
                token: Token::from_trusted(token_str),
                target_url: row.try_get("target_url").map_err(StoreError::Io)?,
                parameter: row.try_get("parameter").map_err(StoreError::Io)?,
                payload: row.try_get("payload").map_err(StoreError::Io)?,
                context: row.try_get("context").map_err(StoreError::Io)?,
                injected_at: row.try_get("injected_at").map_err(StoreError::Io)?,
            })
        })
        .transpose()
    }

    /// Returns up to `limit` injections, most recently injected first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] on a database failure.
    pub async fn list_injections(&self, limit: i64) -> Result<Vec<Injection>> {
        let rows = sqlx::query(
            "SELECT token, target_url, parameter, payload, context, injected_at
             FROM injections ORDER BY injected_at DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::Io)?;

        rows.into_iter()
            .map(|row| {
                let token_str: String = row.try_get("token").map_err(StoreError::Io)?;
                Ok(Injection {
                    token: Token::from_trusted(token_str),
                    target_url: row.try_get("target_url").map_err(StoreError::Io)?,
                    parameter: row.try_get("parameter").map_err(StoreError::Io)?,
                    payload: row.try_get("payload").map_err(StoreError::Io)?,
                    context: row.try_get("context").map_err(StoreError::Io)?,
                    injected_at: row.try_get("injected_at").map_err(StoreError::Io)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_injection(token: &str) -> Injection {
        Injection {
            token: Token::from_trusted(token.to_string()),
            target_url: "https://victim.example/search".into(),
            parameter: "q".into(),
            payload: format!("http://{token}.oast.example"),
            context: "ssrf".into(),
            injected_at: 1000.0,
        }
    }

    #[tokio::test]
    async fn record_injection_rejects_duplicate_token() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .record_injection(sample_injection("cccccccccccccccc"))
            .await
            .unwrap();

        let err = store
            .record_injection(sample_injection("cccccccccccccccc"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateToken(t) if t == "cccccccccccccccc"));
    }

    #[tokio::test]
    async fn callback_for_unknown_token_is_dropped_not_errored() {
        let store = Store::open_in_memory().await.unwrap();
        let token = Token::from_trusted("dddddddddddddddd".to_string());
        let recorded = store
            .record_callback(&token, "1.2.3.4", "/x", "{}", None, 10.0, None)
            .await
            .unwrap();
        assert!(!recorded);

        let callbacks = store.get_callbacks_for_injection(&token).await.unwrap();
        assert!(callbacks.is_empty());
    }

    #[tokio::test]
    async fn callback_for_known_token_is_persisted_and_joinable() {
        let store = Store::open_in_memory().await.unwrap();
        let token = Token::from_trusted("eeeeeeeeeeeeeeee".to_string());
        store
            .record_injection(sample_injection("eeeeeeeeeeeeeeee"))
            .await
            .unwrap();

        let recorded = store
            .record_callback(
                &token,
                "5.6.7.8",
                "/cb/eeeeeeeeeeeeeeee",
                "{\"user-agent\":\"curl\"}",
                Some(b"leak".to_vec()),
                1005.0,
                Some("{\"cookie\":\"session=abc\"}".into()),
            )
            .await
            .unwrap();
        assert!(recorded);

        let callbacks = store.get_callbacks_for_injection(&token).await.unwrap();
        assert_eq!(callbacks.len(), 1);
        assert_eq!(callbacks[0].body.as_deref(), Some(b"leak".as_slice()));
        assert_eq!(
            callbacks[0].metadata.as_deref(),
            Some("{\"cookie\":\"session=abc\"}")
        );

        let findings = store.get_findings(None, None).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert!((findings[0].delay_seconds - 5.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn list_injections_is_newest_first_and_respects_limit() {
        let store = Store::open_in_memory().await.unwrap();
        for (i, token) in ["1111111111111111", "2222222222222222", "3333333333333333"]
            .iter()
            .enumerate()
        {
            let mut inj = sample_injection(token);
            inj.injected_at = 100.0 + i as f64;
            store.record_injection(inj).await.unwrap();
        }

        let latest_two = store.list_injections(2).await.unwrap();
        assert_eq!(latest_two.len(), 2);
        assert_eq!(latest_two[0].token.as_str(), "3333333333333333");
        assert_eq!(latest_two[1].token.as_str(), "2222222222222222");
    }

    #[tokio::test]
    async fn get_injection_returns_none_for_unminted_token() {
        let store = Store::open_in_memory().await.unwrap();
        let missing = Token::from_trusted("ffffffffffffffff".to_string());
        assert!(store.get_injection(&missing).await.unwrap().is_none());
    }
}
