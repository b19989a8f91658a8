//! Job types and the execution contexts they run on.

use crate::stage::StageMask;

/// Kind of work that runs on one independent execution context.
///
/// Jobs of the same type execute in submission order.
/// Jobs of different types have no ordering guarantee
/// unless a dependency is threaded between them explicitly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JobType {
    /// Vertex processing and tiling part of a render.
    Geometry,

    /// Fragment processing part of a render.
    Fragment,

    /// Compute dispatches.
    Compute,

    /// Copies, blits and clears.
    Transfer,

    /// Occlusion query resolve, copy and reset work.
    OcclusionQuery,
}

impl JobType {
    /// Number of job types.
    pub const COUNT: usize = 5;

    /// All job types in index order.
    pub const ALL: [JobType; JobType::COUNT] = [
        JobType::Geometry,
        JobType::Fragment,
        JobType::Compute,
        JobType::Transfer,
        JobType::OcclusionQuery,
    ];

    /// Index of the job type in per-stage tables.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            JobType::Geometry => 0,
            JobType::Fragment => 1,
            JobType::Compute => 2,
            JobType::Transfer => 3,
            JobType::OcclusionQuery => 4,
        }
    }

    /// Stage mask with only this job type's bit set.
    #[inline]
    pub fn stage(self) -> StageMask {
        match self {
            JobType::Geometry => StageMask::GEOMETRY,
            JobType::Fragment => StageMask::FRAGMENT,
            JobType::Compute => StageMask::COMPUTE,
            JobType::Transfer => StageMask::TRANSFER,
            JobType::OcclusionQuery => StageMask::OCCLUSION_QUERY,
        }
    }
}

/// Execution context that runs compute-style jobs.
///
/// Occlusion query work runs on its own compute context
/// so that it never queues behind user dispatches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ComputeContext {
    /// Context for user compute dispatches.
    Compute,

    /// Context for occlusion query jobs.
    OcclusionQuery,
}

impl ComputeContext {
    /// Job type whose completion this context produces.
    pub fn job_type(self) -> JobType {
        match self {
            ComputeContext::Compute => JobType::Compute,
            ComputeContext::OcclusionQuery => JobType::OcclusionQuery,
        }
    }
}
