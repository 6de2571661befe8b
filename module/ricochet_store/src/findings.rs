//! The correlation join: every `callback` paired with the `injection` whose
//! token it matches.
//!
//! A `Finding` is never stored — it is recomputed from the two tables on
//! every read, newest-callback-first, so severity always reflects whatever
//! [`ricochet_types::Severity::from_context`] currently does.

use crate::error::{Result, StoreError};
use ricochet_types::{Callback, Finding, Injection, Severity, Token};
use sqlx::{Row, SqlitePool};

/// Loads every finding, optionally filtered by minimum `received_at` and/or
/// minimum severity, newest callback first.
///
/// The severity filter is applied in memory rather than in SQL: severity is
/// derived from `context`, not stored, and the context vocabulary is open,
/// so there is no fixed `CASE` expression to push into the query.
pub async fn query_findings(
    pool: &SqlitePool,
    since: Option<f64>,
    min_severity: Option<Severity>,
) -> Result<Vec<Finding>> {
    let rows = sqlx::query(
        r"
        SELECT
            i.token        AS i_token,
            i.target_url   AS i_target_url,
            i.parameter    AS i_parameter,
            i.payload      AS i_payload,
            i.context      AS i_context,
            i.injected_at  AS i_injected_at,
            c.id           AS c_id,
            c.token        AS c_token,
            c.source_ip    AS c_source_ip,
            c.request_path AS c_request_path,
            c.headers      AS c_headers,
            c.body         AS c_body,
            c.received_at  AS c_received_at,
            c.metadata_json AS c_metadata_json
        FROM callbacks c
        INNER JOIN injections i ON i.token = c.token
        WHERE (?1 IS NULL OR c.received_at >= ?1)
        ORDER BY c.received_at DESC
        ",
    )
    .bind(since)
    .fetch_all(pool)
    .await
    .map_err(StoreError::Io)?;

    let mut findings = Vec::with_capacity(rows.len());
    for row in rows {
        let token_str: String = row.try_get("i_token").map_err(StoreError::Io)?;
        let injection = Injection {
            token: Token::from_trusted(token_str),
            target_url: row.try_get("i_target_url").map_err(StoreError::Io)?,
            parameter: row.try_get("i_parameter").map_err(StoreError::Io)?,
            payload: row.try_get("i_payload").map_err(StoreError::Io)?,
            context: row.try_get("i_context").map_err(StoreError::Io)?,
            injected_at: row.try_get("i_injected_at").map_err(StoreError::Io)?,
        };
        let callback_token: String = row.try_get("c_token").map_err(StoreError::Io)?;
        let callback = Callback {
            id: row.try_get("c_id").map_err(StoreError::Io)?,
            token: Token::from_trusted(callback_token),
            source_ip: row.try_get("c_source_ip").map_err(StoreError::Io)?,
            request_path: row.try_get("c_request_path").map_err(StoreError::Io)?,
            headers: row.try_get("c_headers").map_err(StoreError::Io)?,
            body: row.try_get("c_body").map_err(StoreError::Io)?,
            received_at: row.try_get("c_received_at").map_err(StoreError::Io)?,
            metadata: row.try_get("c_metadata_json").map_err(StoreError::Io)?,
        };

        let finding = Finding::new(injection, callback);
        if min_severity.is_some_and(|min| finding.severity < min) {
            continue;
        }
        findings.push(finding);
    }

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{migrations::apply_all_migrations, store::Store};
    use ricochet_types::Injection as Inj;

    async fn seeded_store() -> Store {
        let store = Store::open_in_memory().await.expect("open store");
        store
    }

    #[tokio::test]
    async fn findings_are_newest_first_and_severity_derived() {
        let store = seeded_store().await;
        let sqli = Inj {
            token: Token::from_trusted("aaaaaaaaaaaaaaaa".to_string()),
            target_url: "https://victim.example/a".into(),
            parameter: "q".into(),
            payload: "'; WAITFOR DELAY '0:0:5'--".into(),
            context: "sqli:mssql".into(),
            injected_at: 100.0,
        };
        let xss = Inj {
            token: Token::from_trusted("bbbbbbbbbbbbbbbb".to_string()),
            target_url: "https://victim.example/b".into(),
            parameter: "name".into(),
            payload: "<script>".into(),
            context: "xss:html".into(),
            injected_at: 100.0,
        };
        store.record_injection(sqli).await.unwrap();
        store.record_injection(xss).await.unwrap();

        store
            .record_callback(
                &Token::from_trusted("aaaaaaaaaaaaaaaa".to_string()),
                "10.0.0.1",
                "/cb/aaaaaaaaaaaaaaaa",
                "{}",
                None,
                110.0,
                None,
            )
            .await
            .unwrap();
        store
            .record_callback(
                &Token::from_trusted("bbbbbbbbbbbbbbbb".to_string()),
                "10.0.0.2",
                "/cb/bbbbbbbbbbbbbbbb",
                "{}",
                None,
                120.0,
                None,
            )
            .await
            .unwrap();

        let all = store.get_findings(None, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].callback.received_at, 120.0);
        assert_eq!(all[0].severity, Severity::Medium);
        assert_eq!(all[1].severity, Severity::High);

        let high_only = store
            .get_findings(None, Some(Severity::High))
            .await
            .unwrap();
        assert_eq!(high_only.len(), 1);
        assert_eq!(high_only[0].injection.context, "sqli:mssql");

        let since = store.get_findings(Some(115.0), None).await.unwrap();
        assert_eq!(since.len(), 1);
        assert_eq!(since[0].callback.source_ip, "10.0.0.2");
    }
}
