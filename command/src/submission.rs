use {
    crate::{buffer::CommandBuffer, semaphore::Semaphore},
    relay_core::{Contexts, PipelineStageFlags},
    smallvec::SmallVec,
};

/// Command queue submission.
///
/// Without command buffers the submission only turns its waits
/// into completions of the stages they apply to.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""), Default(bound = ""))]
pub struct Submission<'a, D: Contexts> {
    /// Semaphores with pipeline stages that wait on them.
    pub waits: SmallVec<[(&'a Semaphore<D>, PipelineStageFlags); 4]>,

    /// Command buffers to process in order.
    pub submits: SmallVec<[&'a CommandBuffer<D>; 4]>,

    /// Semaphores to signal once all work of the submission completes.
    pub signals: SmallVec<[&'a Semaphore<D>; 4]>,
}

impl<'a, D> Submission<'a, D>
where
    D: Contexts,
{
    /// Create new empty submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add waits to the submission.
    pub fn wait(mut self, waits: impl IntoIterator<Item = (&'a Semaphore<D>, PipelineStageFlags)>) -> Self {
        self.waits.extend(waits);
        self
    }

    /// Add command buffers to the submission.
    pub fn submits(mut self, submits: impl IntoIterator<Item = &'a CommandBuffer<D>>) -> Self {
        self.submits.extend(submits);
        self
    }

    /// Add signals to the submission.
    pub fn signal(mut self, signals: impl IntoIterator<Item = &'a Semaphore<D>>) -> Self {
        self.signals.extend(signals);
        self
    }
}
