//! Barrier propagation between stages.

use {
    crate::table::{BarrierTable, Scopes},
    relay_core::{Device, Error, JobType, StageMask, Syncobj},
    smallvec::SmallVec,
    std::sync::Arc,
    thread_profiler::profile_scope,
};

/// Execution dependency between source and destination stages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Barrier {
    /// Stages whose earlier work must complete.
    pub src: StageMask,

    /// Stages whose later work must wait.
    pub dst: StageMask,

    /// Barrier is recorded inside a render pass.
    /// Only completions of the current command buffer are then considered.
    pub in_render_pass: bool,
}

impl Barrier {
    /// Barrier outside of a render pass.
    pub fn new(src: StageMask, dst: StageMask) -> Self {
        Barrier {
            src,
            dst,
            in_render_pass: false,
        }
    }

    /// Barrier between two single stages.
    pub fn between(src: JobType, dst: JobType) -> Self {
        Self::new(src.stage(), dst.stage())
    }
}

/// Make later work on `barrier.dst` stages wait for earlier work on `barrier.src` stages.
///
/// For every destination stage a new completion is merged from the source
/// completions and a new pending barrier is merged from that completion and
/// the previous pending barrier. Nothing is installed until all of them exist,
/// so on error the tables are left as they were.
///
/// The destination stage's own latest completion joins the sources unless
/// the stage is a source already. Inside a render pass both are looked up in
/// the command buffer only.
///
/// A barrier whose source stages have no known completion does nothing.
pub fn apply_barrier<D>(
    device: &Arc<D>,
    barrier: Barrier,
    barriers: &mut BarrierTable<D>,
    scopes: &mut Scopes<'_, D>,
) -> Result<(), Error>
where
    D: Device,
{
    profile_scope!("apply_barrier");

    let mut staged: SmallVec<[(JobType, Syncobj<D>, Syncobj<D>); 5]> = SmallVec::new();

    {
        let sources: SmallVec<[&D::Sync; 5]> = barrier
            .src
            .job_types()
            .filter_map(|job| scopes.latest(job, barrier.in_render_pass))
            .map(Syncobj::raw)
            .collect();

        if sources.is_empty() {
            log::trace!("Barrier {:?} has no sources", barrier);
            return Ok(());
        }

        for dst in barrier.dst.job_types() {
            let mut waits = sources.clone();

            // Keep earlier work of the stage itself reachable from its completion.
            if !barrier.src.has(dst) {
                waits.extend(scopes.latest(dst, barrier.in_render_pass).map(Syncobj::raw));
            }

            let completion = Syncobj::merge_raw(device, &waits)?;
            let pending = Syncobj::merge(device, Some(&completion).into_iter().chain(barriers.get(dst)))?;
            log::trace!(
                "Barrier {:?} stages {:?}: completion {:?}, pending {:?}",
                barrier,
                dst,
                completion,
                pending
            );
            staged.push((dst, completion, pending));
        }
    }

    for (dst, completion, pending) in staged {
        scopes.command_buffer.replace(dst, completion);
        barriers.replace(dst, pending);
    }

    Ok(())
}
