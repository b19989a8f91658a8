//! Per-stage tables of sync primitives.

use relay_core::{Device, Error, JobType, Syncobj};

/// One optional primitive per job type.
///
/// An entry is either absent or owns exactly one live primitive.
/// Replacing an entry installs the new primitive before the old one is destroyed.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""), Default(bound = ""))]
pub struct StageTable<D: Device> {
    slots: [Option<Syncobj<D>>; JobType::COUNT],
}

/// Last known completion of work per stage.
pub type CompletionTable<D> = StageTable<D>;

/// Standing obligations applied as an extra wait to the next job of a stage.
pub type BarrierTable<D> = StageTable<D>;

impl<D> StageTable<D>
where
    D: Device,
{
    /// Create empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get entry for the job type.
    #[inline]
    pub fn get(&self, job: JobType) -> Option<&Syncobj<D>> {
        self.slots[job.index()].as_ref()
    }

    /// Install new entry for the job type.
    /// The previous entry, if any, is destroyed afterwards.
    pub fn replace(&mut self, job: JobType, sync: Syncobj<D>) {
        let old = self.slots[job.index()].replace(sync);
        if let Some(old) = old {
            log::trace!("Replace {:?} entry {:?}", job, old);
        }
    }

    /// Iterate over present primitives in job type order.
    pub fn syncs(&self) -> impl Iterator<Item = &Syncobj<D>> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Number of present entries.
    pub fn len(&self) -> usize {
        self.syncs().count()
    }

    /// Check if no entry is present.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Move entries of a newer table in, overwriting entries present in both.
    pub fn update(&mut self, newer: StageTable<D>) {
        let StageTable { mut slots } = newer;
        for (&job, slot) in JobType::ALL.iter().zip(slots.iter_mut()) {
            if let Some(sync) = slot.take() {
                self.replace(job, sync);
            }
        }
    }

    /// Create primitive signaled once every present entry is.
    pub fn merge(&self, device: &std::sync::Arc<D>) -> Result<Syncobj<D>, Error> {
        Syncobj::merge(device, self.syncs())
    }
}

/// Completion tables visible while a command buffer is processed.
///
/// `previous_queue` holds completions persisted by earlier submit calls,
/// `queue` the ones produced by earlier batches of the current call.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Scopes<'a, D: Device> {
    /// Completions of the command buffer being processed.
    pub command_buffer: &'a mut CompletionTable<D>,

    /// Completions of earlier command buffers in the same batch.
    pub submission: &'a CompletionTable<D>,

    /// Completions of earlier batches in the same submit call.
    pub queue: &'a CompletionTable<D>,

    /// Completions left by earlier submit calls.
    pub previous_queue: &'a CompletionTable<D>,
}

impl<'a, D> Scopes<'a, D>
where
    D: Device,
{
    /// Latest known completion of `job`.
    ///
    /// The command buffer scope always wins. Inside a render pass nothing
    /// outside the command buffer is considered.
    pub fn latest(&self, job: JobType, in_render_pass: bool) -> Option<&Syncobj<D>> {
        let own = self.command_buffer.get(job);
        if own.is_some() || in_render_pass {
            return own;
        }

        self.submission
            .get(job)
            .or_else(|| self.queue.get(job))
            .or_else(|| self.previous_queue.get(job))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        relay_core::mock::MockDevice,
        std::sync::Arc,
    };

    #[test]
    fn replace_destroys_old_after_install() {
        let device = Arc::new(MockDevice::new());
        let mut table = CompletionTable::new();

        let first = Syncobj::create(&device).unwrap();
        let first_id = first.raw().id();
        table.replace(JobType::Compute, first);

        let second = Syncobj::create(&device).unwrap();
        let second_id = second.raw().id();
        table.replace(JobType::Compute, second);

        assert_eq!(device.destroy_count(first_id), 1);
        assert!(device.is_live(second_id));
        assert_eq!(table.get(JobType::Compute).map(|sync| sync.raw().id()), Some(second_id));

        drop(table);
        assert_eq!(device.destroy_count(second_id), 1);
        assert_eq!(device.live(), 0);
    }

    #[test]
    fn update_overwrites_only_present_entries() {
        let device = Arc::new(MockDevice::new());
        let mut older = CompletionTable::new();
        older.replace(JobType::Compute, Syncobj::create(&device).unwrap());
        older.replace(JobType::Transfer, Syncobj::create(&device).unwrap());
        let kept = older.get(JobType::Transfer).unwrap().raw().id();

        let mut newer = CompletionTable::new();
        newer.replace(JobType::Compute, Syncobj::create(&device).unwrap());
        let fresh = newer.get(JobType::Compute).unwrap().raw().id();

        older.update(newer);
        assert_eq!(older.len(), 2);
        assert_eq!(older.get(JobType::Compute).unwrap().raw().id(), fresh);
        assert_eq!(older.get(JobType::Transfer).unwrap().raw().id(), kept);
        assert_eq!(device.live(), 2);
    }

    #[test]
    fn render_pass_limits_lookup_to_command_buffer() {
        let device = Arc::new(MockDevice::new());
        let mut command_buffer = CompletionTable::new();
        let submission = CompletionTable::new();
        let queue = CompletionTable::new();
        let mut previous_queue = CompletionTable::new();
        previous_queue.replace(JobType::Fragment, Syncobj::create(&device).unwrap());
        let previous = previous_queue.get(JobType::Fragment).unwrap().raw().id();

        let scopes = Scopes {
            command_buffer: &mut command_buffer,
            submission: &submission,
            queue: &queue,
            previous_queue: &previous_queue,
        };

        assert!(scopes.latest(JobType::Fragment, true).is_none());
        assert_eq!(
            scopes.latest(JobType::Fragment, false).map(|sync| sync.raw().id()),
            Some(previous)
        );
    }

    #[test]
    fn inner_scope_wins() {
        let device = Arc::new(MockDevice::new());
        let mut command_buffer = CompletionTable::new();
        let mut submission = CompletionTable::new();
        let mut queue = CompletionTable::new();
        let previous_queue = CompletionTable::new();

        queue.replace(JobType::Compute, Syncobj::create(&device).unwrap());
        submission.replace(JobType::Compute, Syncobj::create(&device).unwrap());
        let expected = submission.get(JobType::Compute).unwrap().raw().id();

        let scopes = Scopes {
            command_buffer: &mut command_buffer,
            submission: &submission,
            queue: &queue,
            previous_queue: &previous_queue,
        };
        assert_eq!(
            scopes.latest(JobType::Compute, false).map(|sync| sync.raw().id()),
            Some(expected)
        );

        scopes
            .command_buffer
            .replace(JobType::Compute, Syncobj::create(&device).unwrap());
        let own = scopes.command_buffer.get(JobType::Compute).unwrap().raw().id();
        assert_eq!(
            scopes.latest(JobType::Compute, true).map(|sync| sync.raw().id()),
            Some(own)
        );
    }
}
