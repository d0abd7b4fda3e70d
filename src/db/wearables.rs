use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::wearable::{
    ConnectionStatus, NewWearableSample, WearableConnection, WearableProvider, WearableSample,
};

const SAMPLE_COLUMNS: &str =
    "id, user_id, metric, value, unit, source, metadata, recorded_at, created_at";

const CONNECTION_COLUMNS: &str = "id, user_id, provider, status, access_token, refresh_token, \
    token_expires_at, external_user_id, pkce_verifier, connected_at, last_synced_at";

// Samples

pub async fn insert_sample(
    pool: &PgPool,
    user_id: Uuid,
    sample: &NewWearableSample,
) -> Result<Uuid, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let id = insert_sample_tx(&mut tx, user_id, sample).await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn insert_sample_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    sample: &NewWearableSample,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO wearable_samples (id, user_id, metric, value, unit, source, metadata, recorded_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&sample.metric)
    .bind(sample.value)
    .bind(&sample.unit)
    .bind(&sample.source)
    .bind(sample.metadata.clone().map(Json))
    .bind(sample.recorded_at)
    .execute(&mut **tx)
    .await?;

    Ok(id)
}

/// Insert a batch in one transaction.
pub async fn insert_samples(
    pool: &PgPool,
    user_id: Uuid,
    samples: &[NewWearableSample],
) -> Result<usize, sqlx::Error> {
    let mut tx = pool.begin().await?;
    for sample in samples {
        insert_sample_tx(&mut tx, user_id, sample).await?;
    }
    tx.commit().await?;
    Ok(samples.len())
}

/// Remove samples of one source/metric inside `[from, to)` so a re-sync
/// replaces the day's value instead of adding to it.
pub async fn delete_source_samples_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    source: &str,
    metric: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM wearable_samples
        WHERE user_id = $1 AND source = $2 AND metric = $3
          AND recorded_at >= $4 AND recorded_at < $5
        "#,
    )
    .bind(user_id)
    .bind(source)
    .bind(metric)
    .bind(from)
    .bind(to)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

/// Samples recorded in `[since, until]`, oldest first. The ordering is
/// stable so aggregation over the same rows is repeatable.
pub async fn fetch_samples_between(
    pool: &PgPool,
    user_id: Uuid,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<WearableSample>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM wearable_samples \
         WHERE user_id = $1 AND recorded_at >= $2 AND recorded_at <= $3 \
         ORDER BY recorded_at ASC, id ASC",
        SAMPLE_COLUMNS
    );
    sqlx::query_as::<_, WearableSample>(&sql)
        .bind(user_id)
        .bind(since)
        .bind(until)
        .fetch_all(pool)
        .await
}

pub async fn fetch_metric_samples_between(
    pool: &PgPool,
    user_id: Uuid,
    metric_names: &[String],
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<WearableSample>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM wearable_samples \
         WHERE user_id = $1 AND metric = ANY($2) AND recorded_at >= $3 AND recorded_at <= $4 \
         ORDER BY recorded_at ASC, id ASC",
        SAMPLE_COLUMNS
    );
    sqlx::query_as::<_, WearableSample>(&sql)
        .bind(user_id)
        .bind(metric_names)
        .bind(since)
        .bind(until)
        .fetch_all(pool)
        .await
}

pub async fn fetch_sample_stats(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<(i64, Option<DateTime<Utc>>), sqlx::Error> {
    sqlx::query_as::<_, (i64, Option<DateTime<Utc>>)>(
        "SELECT COUNT(*), MAX(recorded_at) FROM wearable_samples WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

// Connections

pub async fn fetch_connections(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<WearableConnection>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM wearable_connections WHERE user_id = $1 ORDER BY created_at ASC",
        CONNECTION_COLUMNS
    );
    sqlx::query_as::<_, WearableConnection>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn fetch_connection(
    pool: &PgPool,
    user_id: Uuid,
    provider: WearableProvider,
) -> Result<Option<WearableConnection>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM wearable_connections WHERE user_id = $1 AND provider = $2",
        CONNECTION_COLUMNS
    );
    sqlx::query_as::<_, WearableConnection>(&sql)
        .bind(user_id)
        .bind(provider.as_str())
        .fetch_optional(pool)
        .await
}

pub async fn fetch_active_connections_for_provider(
    pool: &PgPool,
    provider: WearableProvider,
) -> Result<Vec<WearableConnection>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM wearable_connections WHERE provider = $1 AND status = $2",
        CONNECTION_COLUMNS
    );
    sqlx::query_as::<_, WearableConnection>(&sql)
        .bind(provider.as_str())
        .bind(ConnectionStatus::Active.as_str())
        .fetch_all(pool)
        .await
}

/// Demo connections need no credentials and go straight to active.
pub async fn activate_demo_connection(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO wearable_connections (id, user_id, provider, status, connected_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (user_id, provider) DO UPDATE SET
            status = EXCLUDED.status,
            connected_at = EXCLUDED.connected_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(WearableProvider::Demo.as_str())
    .bind(ConnectionStatus::Active.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// Start (or restart) an OAuth flow. Existing tokens stay until the
/// callback replaces them.
pub async fn upsert_pending_connection(
    pool: &PgPool,
    user_id: Uuid,
    provider: WearableProvider,
    pkce_verifier: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO wearable_connections (id, user_id, provider, status, pkce_verifier)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, provider) DO UPDATE SET
            status = CASE
                WHEN wearable_connections.status = 'active' THEN wearable_connections.status
                ELSE EXCLUDED.status
            END,
            pkce_verifier = EXCLUDED.pkce_verifier
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(provider.as_str())
    .bind(ConnectionStatus::Pending.as_str())
    .bind(pkce_verifier)
    .execute(pool)
    .await?;

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn activate_oauth_connection(
    pool: &PgPool,
    user_id: Uuid,
    provider: WearableProvider,
    access_token: &str,
    refresh_token: &str,
    expires_at: DateTime<Utc>,
    external_user_id: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE wearable_connections
        SET status = $3, access_token = $4, refresh_token = $5, token_expires_at = $6,
            external_user_id = $7, pkce_verifier = NULL, connected_at = NOW()
        WHERE user_id = $1 AND provider = $2
        "#,
    )
    .bind(user_id)
    .bind(provider.as_str())
    .bind(ConnectionStatus::Active.as_str())
    .bind(access_token)
    .bind(refresh_token)
    .bind(expires_at)
    .bind(external_user_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_tokens(
    pool: &PgPool,
    connection_id: Uuid,
    access_token: &str,
    refresh_token: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE wearable_connections
        SET access_token = $2, refresh_token = $3, token_expires_at = $4
        WHERE id = $1
        "#,
    )
    .bind(connection_id)
    .bind(access_token)
    .bind(refresh_token)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn mark_synced_tx(
    tx: &mut Transaction<'_, Postgres>,
    connection_id: Uuid,
    synced_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE wearable_connections SET last_synced_at = $2 WHERE id = $1")
        .bind(connection_id)
        .bind(synced_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Disconnect one provider, or all of them when `provider` is None.
/// Tokens are dropped. Returns the number of connections touched.
pub async fn disconnect(
    pool: &PgPool,
    user_id: Uuid,
    provider: Option<WearableProvider>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE wearable_connections
        SET status = $2, access_token = NULL, refresh_token = NULL,
            token_expires_at = NULL, pkce_verifier = NULL
        WHERE user_id = $1
          AND ($3::TEXT IS NULL OR provider = $3)
          AND status <> $2
        "#,
    )
    .bind(user_id)
    .bind(ConnectionStatus::Disconnected.as_str())
    .bind(provider.map(|p| p.as_str()))
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
