//! Events and the commands that wait on, set and reset them.

use {
    crate::{
        barrier::{apply_barrier, Barrier},
        table::{BarrierTable, Scopes},
    },
    parking_lot::{Mutex, MutexGuard},
    relay_core::{Device, Error, JobType, OomOrDeviceLost, OutOfMemory, StageMask, Syncobj},
    smallvec::SmallVec,
    std::sync::Arc,
};

/// Who changed the event last and how.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventState {
    /// Signaled from the host.
    SetByHost,

    /// Set command was submitted.
    SetByDevice,

    /// Reset from the host.
    ResetByHost,

    /// Reset command was submitted.
    ResetByDevice,
}

/// Status of the event as observed from the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventStatus {
    /// Event is set.
    Set,

    /// Event is reset.
    Reset,
}

#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
struct EventInner<D: Device> {
    sync: Syncobj<D>,
    state: EventState,
}

/// Event object.
///
/// Owns one sync primitive that set and reset commands replace.
/// Clones refer to the same event. Recorded commands hold clones.
#[derive(derivative::Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub struct Event<D: Device> {
    inner: Arc<Mutex<EventInner<D>>>,
}

impl<D> Event<D>
where
    D: Device,
{
    /// Create new event in reset state.
    pub fn create(device: &Arc<D>) -> Result<Self, OutOfMemory> {
        let sync = Syncobj::create(device)?;
        log::trace!("Created event with {:?}", sync);
        Ok(Event {
            inner: Arc::new(Mutex::new(EventInner {
                sync,
                state: EventState::ResetByHost,
            })),
        })
    }

    /// Destroy the event.
    ///
    /// The primitive is destroyed once every clone is dropped.
    pub fn destroy(self) {
        let refs = Arc::strong_count(&self.inner);
        if refs > 1 {
            log::warn!("Event destroyed while {} more references exist", refs - 1);
        }
    }

    /// Check if both refer to the same event.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Last state change.
    pub fn state(&self) -> EventState {
        self.inner.lock().state
    }

    /// Get event status.
    /// Polls the primitive if the last change was made by the device.
    pub fn status(&self) -> Result<EventStatus, OomOrDeviceLost> {
        let inner = self.inner.lock();
        let status = match inner.state {
            EventState::SetByHost => EventStatus::Set,
            EventState::ResetByHost => EventStatus::Reset,
            EventState::SetByDevice => {
                if inner.sync.is_signaled()? {
                    EventStatus::Set
                } else {
                    EventStatus::Reset
                }
            }
            EventState::ResetByDevice => {
                if inner.sync.is_signaled()? {
                    EventStatus::Reset
                } else {
                    EventStatus::Set
                }
            }
        };
        Ok(status)
    }

    /// Set the event from the host.
    pub fn set(&self) -> Result<(), OomOrDeviceLost> {
        let mut inner = self.inner.lock();
        inner.sync.signal()?;
        inner.state = EventState::SetByHost;
        Ok(())
    }

    /// Reset the event from the host.
    pub fn reset(&self) -> Result<(), OomOrDeviceLost> {
        let mut inner = self.inner.lock();
        inner.sync.reset()?;
        inner.state = EventState::ResetByHost;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, EventInner<D>> {
        self.inner.lock()
    }

    fn key(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

/// Synchronization sub-command.
#[derive(derivative::Derivative)]
#[derivative(Clone(bound = ""), Debug(bound = ""))]
pub enum EventCmd<D: Device> {
    /// Pipeline barrier.
    Barrier(Barrier),

    /// Make stages wait for events.
    /// Each event comes with the stages that wait for it.
    Wait(Vec<(Event<D>, StageMask)>),

    /// Set event once work of the stages completes.
    Set {
        /// Event to set.
        event: Event<D>,
        /// Stages to wait for.
        wait_for: StageMask,
    },

    /// Reset event once work of the stages completes.
    Reset {
        /// Event to reset.
        event: Event<D>,
        /// Stages to wait for.
        wait_for: StageMask,
    },
}

/// Process one synchronization sub-command.
pub fn process_event_cmd<D>(
    device: &Arc<D>,
    cmd: &EventCmd<D>,
    barriers: &mut BarrierTable<D>,
    scopes: &mut Scopes<'_, D>,
) -> Result<(), Error>
where
    D: Device,
{
    match cmd {
        EventCmd::Barrier(barrier) => apply_barrier(device, *barrier, barriers, scopes),
        EventCmd::Wait(events) => wait_events(device, events, barriers, scopes),
        EventCmd::Set { event, wait_for } => {
            set_or_reset(device, event, *wait_for, EventState::SetByDevice, scopes)
        }
        EventCmd::Reset { event, wait_for } => {
            set_or_reset(device, event, *wait_for, EventState::ResetByDevice, scopes)
        }
    }
}

/// Make later work on each event's stages wait for the event.
///
/// Per destination stage the new completion merges the pending barrier with
/// the primitives of all events that stage waits for and the stage's own
/// latest completion. The new pending barrier
/// is merged from that completion alone.
pub fn wait_events<D>(
    device: &Arc<D>,
    events: &[(Event<D>, StageMask)],
    barriers: &mut BarrierTable<D>,
    scopes: &mut Scopes<'_, D>,
) -> Result<(), Error>
where
    D: Device,
{
    let mut unique: SmallVec<[(&Event<D>, StageMask); 4]> = SmallVec::new();
    for (event, mask) in events {
        match unique.iter_mut().find(|(other, _)| other.ptr_eq(event)) {
            Some((_, other_mask)) => *other_mask |= *mask,
            None => unique.push((event, *mask)),
        }
    }

    let dst = unique
        .iter()
        .fold(StageMask::empty(), |acc, (_, mask)| acc | *mask);
    if dst.job_types().next().is_none() {
        log::trace!("Wait for {} events has no stages", events.len());
        return Ok(());
    }

    // Consistent lock order across threads.
    unique.sort_by_key(|(event, _)| event.key());

    let mut staged: SmallVec<[(JobType, Syncobj<D>, Syncobj<D>); 5]> = SmallVec::new();
    {
        let guards: SmallVec<[(MutexGuard<'_, EventInner<D>>, StageMask); 4]> =
            unique.iter().map(|(event, mask)| (event.lock(), *mask)).collect();

        for job in dst.job_types() {
            let waits: SmallVec<[&D::Sync; 8]> = barriers
                .get(job)
                .map(Syncobj::raw)
                .into_iter()
                .chain(
                    guards
                        .iter()
                        .filter(|(_, mask)| mask.has(job))
                        .map(|(inner, _)| inner.sync.raw()),
                )
                .chain(scopes.latest(job, false).map(Syncobj::raw))
                .collect();

            let completion = Syncobj::merge_raw(device, &waits)?;
            let pending = Syncobj::merge(device, Some(&completion))?;
            log::trace!("Stage {:?} waits for events through {:?}", job, pending);
            staged.push((job, completion, pending));
        }
    }

    for (job, completion, pending) in staged {
        scopes.command_buffer.replace(job, completion);
        barriers.replace(job, pending);
    }

    Ok(())
}

/// Replace the event's primitive with one signaled after work of `wait_for` stages.
pub fn set_or_reset<D>(
    device: &Arc<D>,
    event: &Event<D>,
    wait_for: StageMask,
    state: EventState,
    scopes: &Scopes<'_, D>,
) -> Result<(), Error>
where
    D: Device,
{
    debug_assert!(state == EventState::SetByDevice || state == EventState::ResetByDevice);

    let sync = Syncobj::merge(
        device,
        wait_for
            .job_types()
            .filter_map(|job| scopes.latest(job, false)),
    )?;
    log::trace!("Event {:?} after {:?} through {:?}", state, wait_for, sync);

    let mut inner = event.lock();
    let old = std::mem::replace(&mut inner.sync, sync);
    inner.state = state;
    drop(inner);
    drop(old);
    Ok(())
}
