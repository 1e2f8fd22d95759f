// Runs a transport's serve loop in the background and races it against shutdown

use std::future::Future;
use tokio_util::sync::CancellationToken;

/// How a supervised run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The serve loop returned on its own
    Completed,
    /// Shutdown was requested before the serve loop finished
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("error in server: {0:#}")]
    Transport(anyhow::Error),

    #[error("server task panicked")]
    Panicked,

    #[error("server task was aborted")]
    Aborted,
}

/// Spawn `serve` and wait for it or for `shutdown`, whichever comes first.
///
/// On shutdown the serve task is left running; it is expected to observe the
/// same token and wind down by itself, and is dropped at process exit.
pub async fn supervise<F, E>(serve: F, shutdown: CancellationToken) -> Result<Outcome, SupervisorError>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<anyhow::Error> + Send + 'static,
{
    let mut task = tokio::spawn(serve);

    tokio::select! {
        _ = shutdown.cancelled() => {
            tracing::info!("Received termination signal, shutting down...");
            Ok(Outcome::Cancelled)
        }
        joined = &mut task => match joined {
            Ok(Ok(())) => {
                tracing::info!("Server stopped");
                Ok(Outcome::Completed)
            }
            Ok(Err(e)) => {
                let e = e.into();
                tracing::error!(error = %format!("{:#}", e), "Server failed");
                Err(SupervisorError::Transport(e))
            }
            Err(e) if e.is_panic() => Err(SupervisorError::Panicked),
            Err(_) => Err(SupervisorError::Aborted),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancellation_before_serve_error_is_success() {
        let shutdown = CancellationToken::new();
        let serve = async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err::<(), _>(std::io::Error::other("too late"))
        };

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let outcome = supervise(serve, shutdown).await.unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
    }

    #[tokio::test]
    async fn test_serve_error_before_cancellation_is_reported() {
        let shutdown = CancellationToken::new();
        let serve = async { Err::<(), _>(std::io::Error::other("address already in use")) };

        let err = supervise(serve, shutdown).await.unwrap_err();

        assert!(matches!(err, SupervisorError::Transport(_)));
        assert_eq!(err.to_string(), "error in server: address already in use");
    }

    #[tokio::test]
    async fn test_clean_completion() {
        let outcome = supervise(async { Ok::<(), std::io::Error>(()) }, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Completed);
    }

    #[tokio::test]
    async fn test_serve_task_not_awaited_after_cancellation() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let serve = async {
            std::future::pending::<()>().await;
            Ok::<(), std::io::Error>(())
        };

        let outcome = tokio::time::timeout(Duration::from_secs(1), supervise(serve, shutdown))
            .await
            .expect("supervisor should return immediately")
            .unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
    }

    #[tokio::test]
    async fn test_panicking_serve_task() {
        let serve = async {
            if true {
                panic!("boom");
            }
            Ok::<(), std::io::Error>(())
        };

        let err = supervise(serve, CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, SupervisorError::Panicked));
    }
}
