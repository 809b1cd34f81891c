use std::{future::Future, io};
use tokio_util::sync::CancellationToken;

/// Exit status of a process killed by SIGINT.
pub const EXIT_CODE: i32 = 130;

/// Cancels `cancel` on the first interrupt and returns `true` on the second
/// one, at which point the process should exit without waiting for the run.
///
/// Returns `false` if the interrupt source fails before that.
pub async fn watch<F, Fut>(mut interrupt: F, cancel: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if interrupt().await.is_err() {
        return false;
    }
    tracing::info!("Interrupt received, stopping after the current tile (press Ctrl-C again to quit)");
    cancel.cancel();

    if interrupt().await.is_err() {
        return false;
    }
    tracing::warn!("Second interrupt received, exiting");

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::{ready, Ready};

    /// Delivers the given signals in order, then fails.
    fn signals(results: Vec<bool>) -> impl FnMut() -> Ready<io::Result<()>> {
        let mut results = results.into_iter();
        move || {
            ready(match results.next() {
                Some(true) => Ok(()),
                _ => Err(io::Error::new(io::ErrorKind::Other, "no handler")),
            })
        }
    }

    #[tokio::test]
    async fn second_interrupt_requests_exit() {
        let cancel = CancellationToken::new();

        assert!(watch(signals(vec![true, true]), cancel.clone()).await);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn single_interrupt_only_cancels() {
        let cancel = CancellationToken::new();

        assert!(!watch(signals(vec![true]), cancel.clone()).await);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn failing_handler_leaves_run_alone() {
        let cancel = CancellationToken::new();

        assert!(!watch(signals(vec![false]), cancel.clone()).await);
        assert!(!cancel.is_cancelled());
    }
}
