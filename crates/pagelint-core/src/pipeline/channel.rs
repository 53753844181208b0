//! Bounded channels for backpressure between pipeline stages.

use tokio::sync::mpsc;

use crate::config::PipelineConfig;

/// Create a bounded channel pair with the configured buffer size.
///
/// When the buffer is full the sender waits, so a slow stage throttles the
/// stages feeding it instead of letting folders pile up in memory.
pub fn bounded_channel<T>(config: &PipelineConfig) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(config.buffer_size)
}

/// A one-in, at-most-one-out pipeline stage.
///
/// Pulls from an input channel and pushes to an output channel until the
/// input is drained or the downstream receiver is gone.
pub struct PipelineStage<I, O> {
    input: mpsc::Receiver<I>,
    output: mpsc::Sender<O>,
}

impl<I, O> PipelineStage<I, O> {
    /// Create a new pipeline stage.
    pub fn new(input: mpsc::Receiver<I>, output: mpsc::Sender<O>) -> Self {
        Self { input, output }
    }

    /// Run the stage with a processing function.
    ///
    /// `f` is called for each input item. `Some(output)` is forwarded,
    /// `None` drops the item. Returns the number of items forwarded.
    pub async fn run<F, Fut>(mut self, f: F) -> usize
    where
        F: Fn(I) -> Fut,
        Fut: std::future::Future<Output = Option<O>>,
    {
        let mut forwarded = 0;
        while let Some(item) = self.input.recv().await {
            if let Some(result) = f(item).await {
                if self.output.send(result).await.is_err() {
                    // Downstream closed, stop processing
                    break;
                }
                forwarded += 1;
            }
        }
        forwarded
    }
}
