//! Command buffers, semaphores, fences and the queue that
//! turns recorded work into jobs for the execution contexts.

#![forbid(overflowing_literals)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(path_statements)]
#![deny(trivial_bounds)]
#![deny(type_alias_bounds)]
#![deny(unconditional_recursion)]
#![deny(while_true)]
#![deny(bad_style)]
#![deny(future_incompatible)]
#![warn(rust_2018_compatibility)]
#![warn(rust_2018_idioms)]

mod buffer;
mod config;
mod dispatch;
mod fence;
mod queue;
mod semaphore;
mod submission;

pub use crate::{
    buffer::{CommandBuffer, RenderFlags, SubCommand},
    config::QueueConfig,
    fence::{Fence, FenceEpoch},
    queue::{Queue, QueueId},
    semaphore::Semaphore,
    submission::Submission,
};

pub use relay_chain::{Barrier, Event, EventCmd, EventState, EventStatus};
pub use relay_core::{
    ComputeContext, Contexts, Device, DeviceLost, Error, JobType, OomOrDeviceLost, OutOfMemory,
    PipelineStageFlags, StageMask,
};
