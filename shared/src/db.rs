//! PostgreSQL connection and schema bootstrap used by both services.

use tokio::time::{sleep, Duration};
use tokio_postgres::{Client, NoTls};
use tracing::{error, info, warn};

/// Checks the URL query string for `sslmode=disable` (case-insensitive).
/// Without an explicit sslmode we try TLS first.
fn want_tls(database_url: &str) -> bool {
    let Some(qs) = database_url.splitn(2, '?').nth(1) else { return true };
    for pair in qs.split('&') {
        let mut it = pair.splitn(2, '=');
        let k = it.next().unwrap_or("");
        let v = it.next().unwrap_or("");
        if k.eq_ignore_ascii_case("sslmode") {
            return !v.eq_ignore_ascii_case("disable");
        }
    }
    true
}

/// Connect to PostgreSQL, trying TLS first unless the URL opts out, and
/// retry with a capped backoff until a connection succeeds.
pub async fn connect_with_retry(database_url: &str) -> Client {
    let mut backoff = 1u64;

    loop {
        if want_tls(database_url) {
            match native_tls::TlsConnector::builder().build() {
                Ok(tls) => {
                    let tls = postgres_native_tls::MakeTlsConnector::new(tls);
                    match tokio_postgres::connect(database_url, tls).await {
                        Ok((client, connection)) => {
                            tokio::spawn(async move {
                                if let Err(e) = connection.await {
                                    error!(%e, "postgres connection task ended with error (TLS)");
                                }
                            });
                            info!("Connected to PostgreSQL (TLS).");
                            return client;
                        }
                        Err(e) => error!(%e, "DB connect (TLS) failed; will try NoTLS"),
                    }
                }
                Err(e) => warn!(%e, "building TLS connector failed; falling back to NoTLS"),
            }
        }

        match tokio_postgres::connect(database_url, NoTls).await {
            Ok((client, connection)) => {
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        error!(%e, "postgres connection task ended with error (NoTLS)");
                    }
                });
                info!("Connected to PostgreSQL (NoTLS).");
                return client;
            }
            Err(e) => {
                error!(%e, "DB connect (NoTLS) failed");
                let wait = backoff.min(10);
                sleep(Duration::from_secs(wait)).await;
                backoff = (backoff + 1).min(10);
            }
        }
    }
}

/// Idempotent minimal schema. Every service runs this at startup so the
/// stack comes up in any order.
pub async fn ensure_schema(db: &Client) -> Result<(), tokio_postgres::Error> {
    db.execute(
        "CREATE TABLE IF NOT EXISTS users ( \
            id SERIAL PRIMARY KEY, \
            email TEXT NOT NULL UNIQUE, \
            distance BIGINT NOT NULL DEFAULT 0 \
        )",
        &[],
    )
    .await?;

    db.execute(
        "CREATE TABLE IF NOT EXISTS tickets ( \
            id SERIAL PRIMARY KEY, \
            file_name TEXT NOT NULL, \
            file_data BYTEA, \
            origin TEXT, \
            destination TEXT, \
            unique_number TEXT NOT NULL UNIQUE, \
            user_id INTEGER REFERENCES users(id), \
            created_at TIMESTAMPTZ NOT NULL DEFAULT now() \
        )",
        &[],
    )
    .await?;

    db.execute(
        "CREATE TABLE IF NOT EXISTS coupons ( \
            id SERIAL PRIMARY KEY, \
            name TEXT NOT NULL UNIQUE, \
            price BIGINT NOT NULL, \
            distance BIGINT NOT NULL, \
            expiration_date DATE NOT NULL, \
            user_id INTEGER REFERENCES users(id) \
        )",
        &[],
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::want_tls;

    #[test]
    fn sslmode_disable_skips_tls() {
        assert!(!want_tls("postgres://u:p@db:5432/coupons?sslmode=disable"));
        assert!(!want_tls("postgres://u:p@db/coupons?a=b&SSLMODE=DISABLE"));
    }

    #[test]
    fn tls_is_the_default() {
        assert!(want_tls("postgres://u:p@db:5432/coupons"));
        assert!(want_tls("postgres://u:p@db:5432/coupons?sslmode=require"));
    }
}
