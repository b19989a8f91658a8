//! Command buffer recording.

use {
    relay_chain::{Barrier, Event, EventCmd},
    relay_core::{Contexts, PipelineStageFlags, StageMask},
};

bitflags::bitflags! {
    /// Flags of a recorded render.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RenderFlags: u32 {
        /// Fragment work runs.
        const RUN_FRAGMENT = 0x1;

        /// Render must be submitted in two parts.
        /// Geometry first, then terminate and fragment.
        const REQUIRES_SPLIT = 0x2;

        /// Fragment work uses occlusion queries.
        const HAS_OCCLUSION_QUERY = 0x4;
    }
}

/// One unit of recorded work.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub enum SubCommand<D: Contexts> {
    /// Render job with geometry and fragment parts.
    Graphics {
        /// Job payload.
        job: D::RenderJob,
        /// Render flags.
        flags: RenderFlags,
    },

    /// Compute job.
    Compute(D::ComputeJob),

    /// Transfer job.
    Transfer {
        /// Job payload.
        job: D::TransferJob,
        /// Order the transfer after earlier and before later fragment work.
        serialize_with_fragment: bool,
    },

    /// Occlusion query job.
    OcclusionQuery(D::ComputeJob),

    /// Barrier or event command.
    Event(EventCmd<D>),
}

/// Recorded sequence of sub-commands.
/// Sub-commands are processed in recorded order.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""), Default(bound = ""))]
pub struct CommandBuffer<D: Contexts> {
    sub_commands: Vec<SubCommand<D>>,
}

impl<D> CommandBuffer<D>
where
    D: Contexts,
{
    /// Create empty command buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded sub-commands.
    pub fn sub_commands(&self) -> &[SubCommand<D>] {
        &self.sub_commands
    }

    /// Number of recorded sub-commands.
    pub fn len(&self) -> usize {
        self.sub_commands.len()
    }

    /// Check if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.sub_commands.is_empty()
    }

    /// Drop everything recorded.
    pub fn reset(&mut self) {
        self.sub_commands.clear();
    }

    /// Record raw sub-command.
    pub fn push(&mut self, sub_command: SubCommand<D>) -> &mut Self {
        self.sub_commands.push(sub_command);
        self
    }

    /// Record render job.
    pub fn render(&mut self, job: D::RenderJob, flags: RenderFlags) -> &mut Self {
        self.push(SubCommand::Graphics { job, flags })
    }

    /// Record compute job.
    pub fn dispatch(&mut self, job: D::ComputeJob) -> &mut Self {
        self.push(SubCommand::Compute(job))
    }

    /// Record transfer job.
    pub fn transfer(&mut self, job: D::TransferJob, serialize_with_fragment: bool) -> &mut Self {
        self.push(SubCommand::Transfer {
            job,
            serialize_with_fragment,
        })
    }

    /// Record occlusion query job.
    pub fn occlusion_query(&mut self, job: D::ComputeJob) -> &mut Self {
        self.push(SubCommand::OcclusionQuery(job))
    }

    /// Record barrier between job stages.
    pub fn barrier(&mut self, barrier: Barrier) -> &mut Self {
        self.push(SubCommand::Event(EventCmd::Barrier(barrier)))
    }

    /// Record barrier between pipeline stages.
    pub fn pipeline_barrier(
        &mut self,
        src: PipelineStageFlags,
        dst: PipelineStageFlags,
        in_render_pass: bool,
    ) -> &mut Self {
        self.barrier(Barrier {
            src: StageMask::from_src_stages(src),
            dst: StageMask::from_dst_stages(dst),
            in_render_pass,
        })
    }

    /// Record wait for events.
    /// Every event comes with the pipeline stages that wait for it.
    pub fn wait_events(
        &mut self,
        events: impl IntoIterator<Item = (Event<D>, PipelineStageFlags)>,
    ) -> &mut Self {
        let events = events
            .into_iter()
            .map(|(event, stages)| (event, StageMask::from_dst_stages(stages)))
            .collect();
        self.push(SubCommand::Event(EventCmd::Wait(events)))
    }

    /// Record setting the event after work of the pipeline stages.
    pub fn set_event(&mut self, event: Event<D>, stages: PipelineStageFlags) -> &mut Self {
        self.push(SubCommand::Event(EventCmd::Set {
            event,
            wait_for: StageMask::from_src_stages(stages),
        }))
    }

    /// Record resetting the event after work of the pipeline stages.
    pub fn reset_event(&mut self, event: Event<D>, stages: PipelineStageFlags) -> &mut Self {
        self.push(SubCommand::Event(EventCmd::Reset {
            event,
            wait_for: StageMask::from_src_stages(stages),
        }))
    }
}
