use crate::error::{GpuError, GpuResult};

/// Monotonically increasing fence counter over queue submissions.
///
/// A signaled value is paired with the queue's most recent submission index;
/// waiting on a value blocks the calling thread until the device has drained
/// that submission. The signaled value never decreases.
///
/// This type has no internal concurrency of its own — it is a synchronization
/// point, not an actor. Every component that submits work through a queue and
/// later frees memory the GPU may still reference must wait on one of these
/// first.
pub struct FenceCounter {
    device: wgpu::Device,
    last_signaled: u64,
    completed: u64,
    /// Signaled values still awaiting a wait, oldest first.
    pending: Vec<(u64, wgpu::SubmissionIndex)>,
}

impl FenceCounter {
    /// Creates a fence counter for a queue on `device`.
    ///
    /// The wait primitive is the device itself, so construction cannot fail;
    /// a device that could not be created never reaches this point.
    pub fn new(device: wgpu::Device) -> Self {
        Self {
            device,
            last_signaled: 0,
            completed: 0,
            pending: Vec::new(),
        }
    }

    /// Signals `value` after everything submitted to `queue` so far.
    ///
    /// Returns the signaled value. A value below the last signaled one is a
    /// contract violation (the counter is monotonic).
    pub fn signal(&mut self, queue: &wgpu::Queue, value: u64) -> GpuResult<u64> {
        // An empty submission yields an index ordered after all prior work on
        // the queue.
        let index = queue.submit(std::iter::empty());
        self.record(index, value)
    }

    /// Pairs `value` with an already obtained submission index.
    pub(crate) fn signal_submission(
        &mut self,
        index: wgpu::SubmissionIndex,
        value: u64,
    ) -> GpuResult<u64> {
        self.record(index, value)
    }

    fn record(&mut self, index: wgpu::SubmissionIndex, value: u64) -> GpuResult<u64> {
        if value < self.last_signaled {
            return Err(GpuError::contract(format!(
                "fence value {value} would decrease the counter (last signaled {})",
                self.last_signaled
            )));
        }
        self.last_signaled = value;
        self.pending.push((value, index));
        Ok(value)
    }

    /// Blocks the calling thread until the GPU has reached `value`.
    ///
    /// Returns immediately when `completed_value() >= value` already holds,
    /// so a wait that would never fire is never armed. Waiting on a value
    /// that was never signaled is a contract violation for the same reason.
    pub fn wait(&mut self, value: u64) -> GpuResult<()> {
        if self.completed >= value {
            return Ok(());
        }

        let Some((reached, index)) = self
            .pending
            .iter()
            .find(|(v, _)| *v >= value)
            .cloned()
        else {
            return Err(GpuError::contract(format!(
                "waiting on fence value {value}, but only {} was signaled",
                self.last_signaled
            )));
        };

        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(index),
                timeout: None,
            })
            .map_err(|e| GpuError::frame(format!("fence wait failed: {e}")))?;

        self.completed = self.completed.max(reached);
        self.pending.retain(|(v, _)| *v > reached);
        Ok(())
    }

    /// Last value the GPU is known to have completed.
    ///
    /// Only advanced by [`wait`](Self::wait); there is no background observer.
    pub fn completed_value(&self) -> u64 {
        self.completed
    }

    /// Last value passed to a successful signal.
    pub fn last_signaled(&self) -> u64 {
        self.last_signaled
    }
}
