//! Single-worker generation queue.
//!
//! Local models generally serve one prompt at a time. [`GenerationQueue`] owns the real
//! generator in a background task and feeds it through a bounded channel, so concurrent
//! callers (both retrieval channels, or several requests) line up instead of oversubscribing
//! the model. Senders wait while the queue is full. A limit passed to
//! [`Generator::generate_within`] covers the model call only, not the wait in line.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::{Generator, LlmError};

pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

struct GenerationRequest {
    prompt: String,
    limit: Option<Duration>,
    reply: oneshot::Sender<Result<String, LlmError>>,
}

#[derive(Debug, Clone)]
pub struct GenerationQueue {
    tx: mpsc::Sender<GenerationRequest>,
}

impl GenerationQueue {
    /// Start the worker on the current runtime.
    pub fn spawn(inner: Arc<dyn Generator>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(run_worker(inner, rx));
        Self { tx }
    }

    async fn submit(&self, prompt: &str, limit: Option<Duration>) -> Result<String, LlmError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(GenerationRequest {
                prompt: prompt.to_string(),
                limit,
                reply,
            })
            .await
            .map_err(|_| LlmError::QueueClosed)?;
        rx.await.map_err(|_| LlmError::QueueClosed)?
    }
}

async fn run_worker(inner: Arc<dyn Generator>, mut rx: mpsc::Receiver<GenerationRequest>) {
    while let Some(GenerationRequest {
        prompt,
        limit,
        mut reply,
    }) = rx.recv().await
    {
        if reply.is_closed() {
            tracing::debug!("caller went away before generation started");
            continue;
        }
        tokio::select! {
            _ = reply.closed() => {
                tracing::debug!("caller went away, abandoning generation");
            }
            res = serve(inner.as_ref(), &prompt, limit) => {
                let _ = reply.send(res);
            }
        }
    }
    tracing::debug!("generation queue closed");
}

async fn serve(
    inner: &dyn Generator,
    prompt: &str,
    limit: Option<Duration>,
) -> Result<String, LlmError> {
    match limit {
        Some(limit) => inner.generate_within(prompt, limit).await,
        None => inner.generate(prompt).await,
    }
}

#[async_trait]
impl Generator for GenerationQueue {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.submit(prompt, None).await
    }

    async fn generate_within(&self, prompt: &str, limit: Duration) -> Result<String, LlmError> {
        self.submit(prompt, Some(limit)).await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;

    /// Echoes the prompt and records the highest number of overlapping calls.
    #[derive(Debug, Default)]
    struct Overlap {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Generator for Overlap {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(format!("echo: {prompt}"))
        }
    }

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl Generator for Failing {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::Invocation {
                status: Some(1),
                stderr: "model not found".into(),
            })
        }
    }

    #[tokio::test]
    async fn requests_are_served_one_at_a_time() {
        let inner = Arc::new(Overlap::default());
        let queue = GenerationQueue::spawn(inner.clone(), 2);
        let (a, b, c) = tokio::join!(
            queue.generate("a"),
            queue.generate("b"),
            queue.generate("c")
        );
        assert_eq!(a.unwrap(), "echo: a");
        assert_eq!(b.unwrap(), "echo: b");
        assert_eq!(c.unwrap(), "echo: c");
        assert_eq!(inner.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn inner_errors_pass_through() {
        let queue = GenerationQueue::spawn(Arc::new(Failing), 1);
        assert!(matches!(
            queue.generate("q").await,
            Err(LlmError::Invocation { .. })
        ));
    }

    /// Takes `work` per prompt.
    #[derive(Debug)]
    struct Steady {
        work: Duration,
    }

    #[async_trait]
    impl Generator for Steady {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            tokio::time::sleep(self.work).await;
            Ok(prompt.to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn limit_excludes_time_waiting_in_line() {
        let queue = GenerationQueue::spawn(
            Arc::new(Steady {
                work: Duration::from_secs(40),
            }),
            2,
        );
        let limit = Duration::from_secs(45);
        // The second prompt waits 40s behind the first, then needs 40s of its own.
        let (first, second) = tokio::join!(
            queue.generate_within("first", limit),
            queue.generate_within("second", limit)
        );
        assert_eq!(first.unwrap(), "first");
        assert_eq!(second.unwrap(), "second");
    }

    #[tokio::test(start_paused = true)]
    async fn limit_still_bounds_the_model_call() {
        let queue = GenerationQueue::spawn(
            Arc::new(Steady {
                work: Duration::from_secs(600),
            }),
            1,
        );
        assert!(matches!(
            queue.generate_within("q", Duration::from_secs(45)).await,
            Err(LlmError::Timeout(45))
        ));
    }

    #[tokio::test]
    async fn dropped_worker_reports_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let queue = GenerationQueue { tx };
        assert!(matches!(
            queue.generate("q").await,
            Err(LlmError::QueueClosed)
        ));
    }
}
