//! Collaborator interfaces the engine drives.
//!
//! `Device` covers binary sync primitives and the null-submission service.
//! `Contexts` adds submission of real jobs to the execution contexts.

use crate::{
    error::{OomOrDeviceLost, OutOfMemory},
    job::ComputeContext,
};

/// Binary sync primitives and null submissions.
///
/// A primitive is signaled at most once per payload.
/// It may be waited on any number of times.
pub trait Device: std::fmt::Debug + Send + Sync + Sized + 'static {
    /// Raw sync primitive.
    type Sync: std::fmt::Debug + Send + Sync;

    /// Platform sync file exported from a primitive.
    /// Closed on drop.
    type SyncFile: std::fmt::Debug;

    /// Create new unsignaled primitive.
    fn create_sync(&self) -> Result<Self::Sync, OutOfMemory>;

    /// Destroy primitive.
    /// Device work already waiting on it is unaffected.
    fn destroy_sync(&self, sync: Self::Sync);

    /// Wait for the primitive to become signaled.
    /// Returns `false` if `timeout_ns` expired first.
    fn wait_sync(&self, sync: &Self::Sync, timeout_ns: u64) -> Result<bool, OomOrDeviceLost>;

    /// Signal the primitive from the host.
    fn signal_sync(&self, sync: &Self::Sync) -> Result<(), OomOrDeviceLost>;

    /// Reset the primitive to unsignaled from the host.
    fn reset_sync(&self, sync: &Self::Sync) -> Result<(), OomOrDeviceLost>;

    /// Move payload of `src` into `dst`.
    /// `src` is left without payload.
    fn move_sync(&self, dst: &Self::Sync, src: &Self::Sync) -> Result<(), OomOrDeviceLost>;

    /// Export current payload as a sync file.
    fn export_sync_file(&self, sync: &Self::Sync) -> Result<Self::SyncFile, OomOrDeviceLost>;

    /// Replace payload with the one carried by the sync file.
    fn import_sync_file(&self, sync: &Self::Sync, file: &Self::SyncFile) -> Result<(), OomOrDeviceLost>;

    /// Submit a job that does no device work.
    /// `signal` is signaled once every primitive in `waits` is.
    fn submit_null_job(&self, waits: &[&Self::Sync], signal: &Self::Sync) -> Result<(), OomOrDeviceLost>;
}

/// Waits, barrier and out-signal of one compute-style or transfer job.
#[derive(Debug)]
pub struct JobSubmit<'a, S> {
    /// External waits that apply to the job's stage.
    pub waits: &'a [&'a S],

    /// Pending barrier for the job's stage.
    pub barrier: Option<&'a S>,

    /// Signaled when the job completes.
    pub signal: &'a S,
}

/// Which part of a render a submission carries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RenderPart {
    /// Geometry and fragment work in one submission.
    Full,

    /// First half of a split render. Geometry only, not terminated.
    Geometry,

    /// Second half of a split render.
    /// Terminates geometry and kicks fragment work.
    Terminate,
}

/// Waits, barriers and out-signals of one render submission.
///
/// A signal is present only for the halves the part runs.
#[derive(Debug)]
pub struct RenderSubmit<'a, S> {
    /// Part of the render being submitted.
    pub part: RenderPart,

    /// Whether fragment work runs.
    pub run_fragment: bool,

    /// Whether the geometry stream is terminated by this submission.
    pub geometry_terminate: bool,

    /// External waits that apply to geometry.
    pub geometry_waits: &'a [&'a S],

    /// External waits that apply to fragment.
    pub fragment_waits: &'a [&'a S],

    /// Pending geometry barrier.
    pub geometry_barrier: Option<&'a S>,

    /// Pending fragment barrier.
    pub fragment_barrier: Option<&'a S>,

    /// Signaled when geometry work completes.
    pub geometry_signal: Option<&'a S>,

    /// Signaled when fragment work completes.
    pub fragment_signal: Option<&'a S>,
}

/// Execution contexts that accept jobs.
pub trait Contexts: Device {
    /// Render job payload recorded into a command buffer.
    type RenderJob: std::fmt::Debug;

    /// Compute or occlusion query job payload.
    type ComputeJob: std::fmt::Debug;

    /// Transfer job payload.
    type TransferJob: std::fmt::Debug;

    /// Submit render job to the render context.
    fn submit_render(
        &self,
        job: &Self::RenderJob,
        submit: RenderSubmit<'_, Self::Sync>,
    ) -> Result<(), OomOrDeviceLost>;

    /// Submit compute-style job to one of the compute contexts.
    fn submit_compute(
        &self,
        context: ComputeContext,
        job: &Self::ComputeJob,
        submit: JobSubmit<'_, Self::Sync>,
    ) -> Result<(), OomOrDeviceLost>;

    /// Submit transfer job to the transfer context.
    fn submit_transfer(
        &self,
        job: &Self::TransferJob,
        submit: JobSubmit<'_, Self::Sync>,
    ) -> Result<(), OomOrDeviceLost>;
}
