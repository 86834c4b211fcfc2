use crate::{CoreError, CoreResult};
use std::future::Future;
use std::time::Duration;

/// Runs a collaborator call under `limit`, mapping expiry to [`CoreError::Timeout`].
pub(crate) async fn within<T, F>(limit: Duration, what: &'static str, call: F) -> CoreResult<T>
where
    F: Future<Output = CoreResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                collaborator = what,
                timeout_ms = limit.as_millis() as u64,
                "collaborator call timed out"
            );
            Err(CoreError::Timeout(what))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_within_passes_through_result() {
        let ok = within(Duration::from_secs(1), "test", async { Ok::<_, CoreError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_within_times_out() {
        let slow = within(Duration::from_millis(10), "slow collaborator", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, CoreError>(())
        })
        .await;
        assert!(matches!(slow, Err(CoreError::Timeout("slow collaborator"))));
    }
}
