//! Bounded-concurrency frame compression with a latest-wins queue (§4.4).
//!
//! At most `max_concurrent` compressions run at once. A single queued slot
//! holds at most one pending raw frame; submitting while the slot is full
//! replaces the older frame rather than growing a backlog.

use crate::compress::{compress, CompressedFrame};
use crate::metrics::PipelineMetrics;
use arcade_types::RawFrame;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Semaphore};

/// Tunables for the compression pool.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of compressions in flight at once.
    pub max_concurrent: usize,
    /// JPEG quality passed to the encoder.
    pub quality: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            quality: crate::compress::DEFAULT_QUALITY,
        }
    }
}

struct Inner {
    semaphore: Arc<Semaphore>,
    queued: Mutex<Option<RawFrame>>,
    output_tx: mpsc::UnboundedSender<CompressedFrame>,
    config: PipelineConfig,
    metrics: PipelineMetrics,
}

/// A thin, cloneable handle to the compression pool.
#[derive(Clone)]
pub struct FramePipeline {
    inner: Arc<Inner>,
}

impl FramePipeline {
    /// Spawn the pipeline. Compressed frames arrive on the returned channel.
    pub fn new(
        config: PipelineConfig,
        metrics: PipelineMetrics,
    ) -> (Self, mpsc::UnboundedReceiver<CompressedFrame>) {
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            queued: Mutex::new(None),
            output_tx,
            config,
            metrics,
        });
        (Self { inner }, output_rx)
    }

    /// Submit a raw frame for compression.
    ///
    /// If a compression slot is free, the frame starts compressing
    /// immediately. Otherwise it replaces whatever is in the queued slot
    /// (dropping it, if present) and waits for a slot to free up.
    pub async fn submit_frame(&self, frame: RawFrame) {
        self.inner.metrics.frames_submitted.inc();

        match Arc::clone(&self.inner.semaphore).try_acquire_owned() {
            Ok(permit) => {
                self.inner.metrics.in_flight.inc();
                let inner = Arc::clone(&self.inner);
                tokio::spawn(run_one(inner, frame, permit));
            }
            Err(_) => {
                let mut queued = self.inner.queued.lock().await;
                if queued.replace(frame).is_some() {
                    self.inner.metrics.frames_dropped.inc();
                } else {
                    self.inner.metrics.queued.inc();
                }
            }
        }
    }
}

async fn run_one(inner: Arc<Inner>, frame: RawFrame, permit: tokio::sync::OwnedSemaphorePermit) {
    let quality = inner.config.quality;
    let start = std::time::Instant::now();
    let result = tokio::task::spawn_blocking(move || compress(&frame, quality)).await;

    inner
        .metrics
        .compression_seconds
        .observe(start.elapsed().as_secs_f64());

    match result {
        Ok(Ok(compressed)) => {
            inner.metrics.frames_compressed.inc();
            let _ = inner.output_tx.send(compressed);
        }
        Ok(Err(e)) => {
            inner.metrics.frames_dropped.inc();
            tracing::warn!(error = %e, "dropping frame: compression failed");
        }
        Err(e) => {
            inner.metrics.frames_dropped.inc();
            tracing::warn!(error = %e, "dropping frame: compression task panicked");
        }
    }

    drop(permit);
    inner.metrics.in_flight.dec();

    let next = {
        let mut queued = inner.queued.lock().await;
        queued.take()
    };

    if let Some(next_frame) = next {
        inner.metrics.queued.dec();
        if let Ok(next_permit) = Arc::clone(&inner.semaphore).try_acquire_owned() {
            inner.metrics.in_flight.inc();
            tokio::spawn(run_one(inner, next_frame, next_permit));
        } else {
            // Lost the race for a slot (shouldn't happen: we just released
            // one), put it back rather than drop it silently.
            let mut queued = inner.queued.lock().await;
            queued.replace(next_frame);
            inner.metrics.queued.inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus_client::registry::Registry;

    fn frame() -> RawFrame {
        RawFrame::new(vec![0u8; (160 * 144 * 4) as usize], 0)
    }

    fn test_pipeline(max_concurrent: usize) -> (FramePipeline, mpsc::UnboundedReceiver<CompressedFrame>) {
        let mut registry = Registry::default();
        let metrics = PipelineMetrics::new_registered(&mut registry);
        FramePipeline::new(
            PipelineConfig {
                max_concurrent,
                quality: 75,
            },
            metrics,
        )
    }

    #[tokio::test]
    async fn a_single_frame_is_compressed_and_delivered() {
        let (pipeline, mut output) = test_pipeline(8);
        pipeline.submit_frame(frame()).await;
        let compressed = tokio::time::timeout(std::time::Duration::from_secs(2), output.recv())
            .await
            .expect("did not time out")
            .expect("channel open");
        assert_eq!(compressed.width, 160);
        assert_eq!(compressed.height, 144);
    }

    #[tokio::test]
    async fn queued_slot_never_exceeds_one_frame() {
        let (pipeline, mut output) = test_pipeline(1);

        // Fill the single in-flight slot, then flood the queue with frames
        // faster than compression can drain it.
        for _ in 0..10 {
            pipeline.submit_frame(frame()).await;
        }

        // Queued slot should hold at most the last-submitted frame; no
        // unbounded backlog regardless of how many submit_frame calls raced.
        let queued_len = pipeline.inner.queued.lock().await.is_some() as usize;
        assert!(queued_len <= 1);

        // Drain whatever does come out; the pipeline should make forward
        // progress instead of deadlocking.
        let mut received = 0;
        while received < 2 {
            match tokio::time::timeout(std::time::Duration::from_secs(2), output.recv()).await {
                Ok(Some(_)) => received += 1,
                _ => break,
            }
        }
        assert!(received >= 1);
    }

    #[tokio::test]
    async fn in_flight_never_exceeds_max_concurrent() {
        let (pipeline, mut output) = test_pipeline(2);
        for _ in 0..6 {
            pipeline.submit_frame(frame()).await;
        }
        let mut received = 0;
        while received < 2 {
            if tokio::time::timeout(std::time::Duration::from_secs(2), output.recv())
                .await
                .ok()
                .flatten()
                .is_some()
            {
                received += 1;
            } else {
                break;
            }
        }
        assert!(received >= 1);
        // Semaphore enforces the bound structurally: available permits never
        // exceed max_concurrent and never go negative.
        assert!(pipeline.inner.semaphore.available_permits() <= 2);
    }
}
