use {
    crate::{
        config::QueueConfig,
        dispatch::{process_cmd_buffer, ExternalWaits},
        fence::{Fence, FenceEpoch},
        semaphore::Semaphore,
        submission::Submission,
    },
    relay_chain::{BarrierTable, CompletionTable, Scopes},
    relay_core::{Contexts, Error, JobType, Syncobj},
    std::sync::Arc,
    thread_profiler::profile_scope,
};

/// Queue id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueId(pub usize);

/// Command queue.
///
/// Owns completions of everything submitted so far
/// and barriers pending for later work.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Queue<D: Contexts> {
    device: Arc<D>,
    id: QueueId,
    config: QueueConfig,
    completions: CompletionTable<D>,
    barriers: BarrierTable<D>,
    next_epoch: u64,
    submitted_sub_commands: u64,
}

impl<D> Queue<D>
where
    D: Contexts,
{
    /// Create queue with nothing submitted.
    pub fn new(device: Arc<D>, id: QueueId, config: QueueConfig) -> Self {
        log::debug!("Create queue {:?} with {:?}", id, config);
        Queue {
            device,
            id,
            config,
            completions: CompletionTable::new(),
            barriers: BarrierTable::new(),
            next_epoch: 0,
            submitted_sub_commands: 0,
        }
    }

    /// Id of the queue.
    pub fn id(&self) -> QueueId {
        self.id
    }

    /// Device of the queue.
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// Queue configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Returns next queue epoch.
    pub fn next_epoch(&self) -> u64 {
        self.next_epoch
    }

    /// Number of sub-commands processed by this queue.
    pub fn submitted_sub_commands(&self) -> u64 {
        self.submitted_sub_commands
    }

    /// Latest completion of every stage.
    pub fn completions(&self) -> &CompletionTable<D> {
        &self.completions
    }

    /// Barriers pending for later work.
    pub fn barriers(&self) -> &BarrierTable<D> {
        &self.barriers
    }

    /// Submit commands to the queue.
    ///
    /// Stops at the first failure. Completions of work already submitted
    /// are kept so later submissions and `wait_idle` still see them.
    /// Fence must be unsignaled and is signaled once everything
    /// submitted to the queue so far completes.
    pub fn submit(
        &mut self,
        submissions: &[Submission<'_, D>],
        fence: Option<&mut Fence<D>>,
    ) -> Result<(), Error> {
        profile_scope!("submit");

        if let Some(fence) = &fence {
            fence.assert_unsignaled();
        }

        log::debug!("Submit {} batches to queue {:?}", submissions.len(), self.id);

        let mut call = CompletionTable::new();
        let mut result = Ok(());
        for submission in submissions {
            result = self.submit_one(submission, &mut call);
            if result.is_err() {
                break;
            }
        }

        if result.is_ok() {
            if let Some(fence) = fence {
                result = self.signal_fence(&call, fence);
            }
        }

        self.completions.update(call);
        result
    }

    fn submit_one(&mut self, submission: &Submission<'_, D>, call: &mut CompletionTable<D>) -> Result<(), Error> {
        let waits = ExternalWaits::collect(submission.waits.iter().cloned())?;
        for signal in &submission.signals {
            signal.sync()?;
        }

        let mut per_submit = CompletionTable::new();
        let mut result = Ok(());

        if submission.submits.is_empty() {
            result = waits.merge_per_stage(&self.device, &mut per_submit);
        } else {
            for buffer in &submission.submits {
                let mut own = CompletionTable::new();
                result = {
                    let mut scopes = Scopes {
                        command_buffer: &mut own,
                        submission: &per_submit,
                        queue: call,
                        previous_queue: &self.completions,
                    };
                    process_cmd_buffer(
                        &self.device,
                        buffer,
                        &waits,
                        &mut self.barriers,
                        &mut scopes,
                        &mut self.submitted_sub_commands,
                    )
                };
                per_submit.update(own);
                if result.is_err() {
                    break;
                }
            }
        }

        if result.is_ok() && !submission.signals.is_empty() {
            result = self.signal_semaphores(&per_submit, &submission.signals);
        }

        call.update(per_submit);
        result
    }

    fn signal_semaphores(&self, completions: &CompletionTable<D>, signals: &[&Semaphore<D>]) -> Result<(), Error> {
        let merged = completions.merge(&self.device)?;

        match signals {
            [single] if self.config.move_single_signal => {
                log::trace!("Move {:?} into semaphore", merged);
                merged.move_into(single.sync()?)?;
            }
            _ => {
                let file = merged.export()?;
                for signal in signals {
                    signal.sync()?.import(&file)?;
                }
                log::trace!("Imported {:?} into {} semaphores", merged, signals.len());
            }
        }

        Ok(())
    }

    fn signal_fence(&mut self, call: &CompletionTable<D>, fence: &mut Fence<D>) -> Result<(), Error> {
        let completions = &self.completions;
        let merged = Syncobj::merge(
            &self.device,
            JobType::ALL
                .iter()
                .filter_map(|&job| call.get(job).or_else(|| completions.get(job))),
        )?;
        merged.move_into(fence.sync())?;

        let epoch = FenceEpoch {
            queue: self.id,
            epoch: self.next_epoch,
        };
        log::debug!("Fence submitted at {:?}", epoch);
        fence.mark_submitted(epoch);
        self.next_epoch += 1;
        Ok(())
    }

    /// Wait for queue to finish all pending work.
    pub fn wait_idle(&self) -> Result<(), Error> {
        profile_scope!("wait_idle");

        log::debug!("Wait for queue {:?} to become idle", self.id);
        for sync in self.completions.syncs() {
            if !sync.wait(self.config.wait_idle_timeout_ns)? {
                return Err(Error::Timeout);
            }
        }
        Ok(())
    }
}
