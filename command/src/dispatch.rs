//! Routing of recorded sub-commands to execution contexts.

use {
    crate::{
        buffer::{CommandBuffer, RenderFlags, SubCommand},
        semaphore::Semaphore,
    },
    relay_chain::{apply_barrier, process_event_cmd, Barrier, BarrierTable, CompletionTable, Scopes},
    relay_core::{
        ComputeContext, Contexts, Device, Error, JobSubmit, JobType, PipelineStageFlags, RenderPart,
        RenderSubmit, StageMask, Syncobj,
    },
    smallvec::SmallVec,
    std::sync::Arc,
};

type WaitList<'a, D> = SmallVec<[&'a <D as Device>::Sync; 8]>;

/// Semaphore waits of one submission with the stages each applies to.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub(crate) struct ExternalWaits<'a, D: Device> {
    waits: SmallVec<[(&'a D::Sync, StageMask); 8]>,
}

impl<'a, D> ExternalWaits<'a, D>
where
    D: Device,
{
    /// Collect waits of binary semaphores.
    /// Semaphores without payload are skipped. Timeline semaphores are an error.
    pub(crate) fn collect(
        semaphores: impl IntoIterator<Item = (&'a Semaphore<D>, PipelineStageFlags)>,
    ) -> Result<Self, Error> {
        let mut waits = SmallVec::new();
        for (semaphore, stages) in semaphores {
            if semaphore.is_dummy() {
                log::warn!("Skip wait on semaphore without payload");
                continue;
            }
            waits.push((semaphore.sync()?.raw(), StageMask::from_dst_stages(stages)));
        }
        Ok(ExternalWaits { waits })
    }

    /// Waits that apply to the job type.
    pub(crate) fn for_job(&self, job: JobType) -> WaitList<'a, D> {
        self.waits
            .iter()
            .filter(|(_, mask)| mask.has(job))
            .map(|&(sync, _)| sync)
            .collect()
    }

    /// Merge waits of every job type into new per-stage completions.
    /// Stages without waits get no completion.
    pub(crate) fn merge_per_stage(
        &self,
        device: &Arc<D>,
        completions: &mut CompletionTable<D>,
    ) -> Result<(), Error> {
        let mut merged = CompletionTable::new();
        for &job in &JobType::ALL {
            let waits = self.for_job(job);
            if waits.is_empty() {
                continue;
            }
            merged.replace(job, Syncobj::merge_raw(device, &waits)?);
        }
        completions.update(merged);
        Ok(())
    }
}

/// Process every sub-command of the command buffer in recorded order.
///
/// Stops at the first failure. Completions and barriers committed by
/// earlier sub-commands stay in place.
pub(crate) fn process_cmd_buffer<D>(
    device: &Arc<D>,
    buffer: &CommandBuffer<D>,
    waits: &ExternalWaits<'_, D>,
    barriers: &mut BarrierTable<D>,
    scopes: &mut Scopes<'_, D>,
    processed: &mut u64,
) -> Result<(), Error>
where
    D: Contexts,
{
    for sub_command in buffer.sub_commands() {
        match sub_command {
            SubCommand::Graphics { job, flags } => {
                if flags.contains(RenderFlags::HAS_OCCLUSION_QUERY) {
                    let barrier = Barrier::between(JobType::OcclusionQuery, JobType::Fragment);
                    apply_barrier(device, barrier, barriers, scopes)?;
                }
                submit_render(device, job, *flags, waits, barriers, scopes)?;
            }
            SubCommand::Compute(job) => {
                submit_compute(device, ComputeContext::Compute, job, waits, barriers, scopes)?;
            }
            SubCommand::OcclusionQuery(job) => {
                submit_compute(device, ComputeContext::OcclusionQuery, job, waits, barriers, scopes)?;
            }
            SubCommand::Transfer {
                job,
                serialize_with_fragment,
            } => {
                if *serialize_with_fragment {
                    let barrier = Barrier::between(JobType::Fragment, JobType::Transfer);
                    apply_barrier(device, barrier, barriers, scopes)?;
                }
                submit_transfer(device, job, waits, barriers, scopes)?;
                if *serialize_with_fragment {
                    let barrier = Barrier::between(JobType::Transfer, JobType::Fragment);
                    apply_barrier(device, barrier, barriers, scopes)?;
                }
            }
            SubCommand::Event(cmd) => process_event_cmd(device, cmd, barriers, scopes)?,
        }
        *processed += 1;
    }
    Ok(())
}

fn submit_render<D>(
    device: &Arc<D>,
    job: &D::RenderJob,
    flags: RenderFlags,
    waits: &ExternalWaits<'_, D>,
    barriers: &BarrierTable<D>,
    scopes: &mut Scopes<'_, D>,
) -> Result<(), Error>
where
    D: Contexts,
{
    let geometry_waits = waits.for_job(JobType::Geometry);
    let fragment_waits = waits.for_job(JobType::Fragment);
    let geometry_barrier = barriers.get(JobType::Geometry).map(Syncobj::raw);
    let fragment_barrier = barriers.get(JobType::Fragment).map(Syncobj::raw);
    let run_fragment = flags.contains(RenderFlags::RUN_FRAGMENT);

    if flags.contains(RenderFlags::REQUIRES_SPLIT) {
        let geometry = Syncobj::create(device)?;
        device.submit_render(
            job,
            RenderSubmit {
                part: RenderPart::Geometry,
                run_fragment: false,
                geometry_terminate: false,
                geometry_waits: &geometry_waits,
                fragment_waits: &fragment_waits,
                geometry_barrier,
                fragment_barrier: None,
                geometry_signal: Some(geometry.raw()),
                fragment_signal: None,
            },
        )?;
        scopes.command_buffer.replace(JobType::Geometry, geometry);

        // Same context, so the terminate part runs after the geometry part anyway.
        let fragment = Syncobj::create(device)?;
        device.submit_render(
            job,
            RenderSubmit {
                part: RenderPart::Terminate,
                run_fragment,
                geometry_terminate: true,
                geometry_waits: &geometry_waits,
                fragment_waits: &fragment_waits,
                geometry_barrier: None,
                fragment_barrier,
                geometry_signal: None,
                fragment_signal: Some(fragment.raw()),
            },
        )?;
        scopes.command_buffer.replace(JobType::Fragment, fragment);
    } else {
        let geometry = Syncobj::create(device)?;
        let fragment = Syncobj::create(device)?;
        device.submit_render(
            job,
            RenderSubmit {
                part: RenderPart::Full,
                run_fragment,
                geometry_terminate: true,
                geometry_waits: &geometry_waits,
                fragment_waits: &fragment_waits,
                geometry_barrier,
                fragment_barrier,
                geometry_signal: Some(geometry.raw()),
                fragment_signal: Some(fragment.raw()),
            },
        )?;
        scopes.command_buffer.replace(JobType::Geometry, geometry);
        scopes.command_buffer.replace(JobType::Fragment, fragment);
    }

    log::trace!("Submitted render {:?} with {:?}", job, flags);
    Ok(())
}

fn submit_compute<D>(
    device: &Arc<D>,
    context: ComputeContext,
    job: &D::ComputeJob,
    waits: &ExternalWaits<'_, D>,
    barriers: &BarrierTable<D>,
    scopes: &mut Scopes<'_, D>,
) -> Result<(), Error>
where
    D: Contexts,
{
    let job_type = context.job_type();
    let job_waits = waits.for_job(job_type);
    let signal = Syncobj::create(device)?;
    device.submit_compute(
        context,
        job,
        JobSubmit {
            waits: &job_waits,
            barrier: barriers.get(job_type).map(Syncobj::raw),
            signal: signal.raw(),
        },
    )?;
    log::trace!("Submitted {:?} job {:?} signaling {:?}", job_type, job, signal);
    scopes.command_buffer.replace(job_type, signal);
    Ok(())
}

fn submit_transfer<D>(
    device: &Arc<D>,
    job: &D::TransferJob,
    waits: &ExternalWaits<'_, D>,
    barriers: &BarrierTable<D>,
    scopes: &mut Scopes<'_, D>,
) -> Result<(), Error>
where
    D: Contexts,
{
    let job_waits = waits.for_job(JobType::Transfer);
    let signal = Syncobj::create(device)?;
    device.submit_transfer(
        job,
        JobSubmit {
            waits: &job_waits,
            barrier: barriers.get(JobType::Transfer).map(Syncobj::raw),
            signal: signal.raw(),
        },
    )?;
    log::trace!("Submitted transfer job {:?} signaling {:?}", job, signal);
    scopes.command_buffer.replace(JobType::Transfer, signal);
    Ok(())
}
