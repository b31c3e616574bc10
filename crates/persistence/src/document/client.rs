//! SurrealDB connection management.
//!
//! The protocol is picked at runtime from the URL scheme: `ws://`, `http://`
//! or `mem://` for an in-process store.

use std::time::Duration;

use common::{config::redact_url, AppError, AppResult, DocumentStoreConfig};

/// Client over the `Any` engine.
pub type SurrealClient = surrealdb::Surreal<surrealdb::engine::any::Any>;

/// Connect, retrying with exponential backoff up to `config.max_retries` times.
pub async fn connect(config: &DocumentStoreConfig) -> AppResult<SurrealClient> {
    let base_delay = Duration::from_secs(config.retry_delay_secs);
    let mut attempt = 0;

    loop {
        match try_connect(config).await {
            Ok(client) => {
                if attempt > 0 {
                    tracing::info!(
                        "Document store connection established after {} attempt(s)",
                        attempt + 1
                    );
                } else {
                    tracing::info!(
                        "Document store connected: url={}, ns={}, db={}",
                        redact_url(&config.url),
                        config.namespace,
                        config.database
                    );
                }
                return Ok(client);
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries {
                    tracing::error!(
                        "Failed to connect to the document store after {} attempts: {}",
                        config.max_retries + 1,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay * 2_u32.pow(attempt.saturating_sub(1));
                tracing::warn!(
                    "Document store connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

async fn try_connect(config: &DocumentStoreConfig) -> AppResult<SurrealClient> {
    let url = redact_url(&config.url);
    tracing::debug!("Connecting to document store: {}", url);

    let unavailable = |stage: &str, e: surrealdb::Error| {
        AppError::service_unavailable(format!(
            "document store at '{}' ({}: {}): {}",
            url,
            stage,
            categorize(&e),
            e
        ))
    };

    let client = surrealdb::engine::any::connect(config.url.as_str())
        .await
        .map_err(|e| unavailable("connect", e))?;

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        client
            .signin(surrealdb::opt::auth::Root { username, password })
            .await
            .map_err(|e| unavailable("signin", e))?;
    }

    client
        .use_ns(&config.namespace)
        .use_db(&config.database)
        .await
        .map_err(|e| unavailable("select namespace", e))?;

    Ok(client)
}

/// Check that the store answers.
pub async fn ping(client: &SurrealClient) -> AppResult<()> {
    client.health().await?;
    Ok(())
}

/// Rough class of a connection failure, for log readers.
fn categorize(err: &surrealdb::Error) -> &'static str {
    let text = err.to_string().to_lowercase();

    if text.contains("auth") || text.contains("credentials") || text.contains("signin") {
        "authentication error"
    } else if text.contains("connect") || text.contains("refused") || text.contains("dns") {
        "network error"
    } else if text.contains("permission") || text.contains("not allowed") {
        "permission error"
    } else if text.contains("timeout") {
        "timeout"
    } else {
        "connection error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_config() -> DocumentStoreConfig {
        DocumentStoreConfig {
            url: "mem://".to_string(),
            namespace: "test".to_string(),
            database: "test".to_string(),
            max_retries: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn connects_to_in_memory_store() {
        let result = connect(&mem_config()).await;
        assert!(result.is_ok(), "in-memory connect failed: {:?}", result.err());
    }

    #[tokio::test]
    async fn connected_store_answers_ping() {
        let client = connect(&mem_config()).await.unwrap();
        assert!(ping(&client).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_scheme_is_unavailable() {
        let config = DocumentStoreConfig {
            url: "nope://localhost".to_string(),
            ..mem_config()
        };
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }
}
