//! Reference-counting fake device.
//!
//! Records every primitive, null job and job submission so tests can check
//! what the engine asked for. Device work never runs by itself: a job's
//! signals stay pending until the test calls `complete_job` or `complete_all`.
//! Contexts run in order, so a job counts as complete only once every
//! earlier job on its context is. Null job outputs are signaled once all of
//! their inputs are.
//!
//! Both render parts share one context. A fragment part therefore always
//! follows the geometry parts submitted before it, and `job_waits_on_job`
//! reports that edge whether or not a wait was threaded between them.
//!
//! Destroying a primitive twice or touching a destroyed one panics.

use {
    crate::{
        device::{Contexts, Device, JobSubmit, RenderPart, RenderSubmit},
        error::{DeviceLost, OomOrDeviceLost, OutOfMemory},
        job::ComputeContext,
    },
    parking_lot::Mutex,
};

/// Id of a fake primitive. Never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyncId(pub usize);

/// Raw fake primitive.
#[derive(Debug)]
#[allow(missing_copy_implementations)]
pub struct MockSync {
    id: SyncId,
}

impl MockSync {
    /// Id of the primitive.
    pub fn id(&self) -> SyncId {
        self.id
    }
}

/// Fake sync file. Carries a payload snapshot.
#[derive(Debug)]
#[allow(missing_copy_implementations)]
pub struct MockSyncFile {
    payload: Option<usize>,
}

/// Fake job payload.
#[derive(Clone, Copy, Debug)]
pub struct MockJob {
    /// Label the test uses to find the job's record.
    pub label: &'static str,
}

impl MockJob {
    /// Create labeled job.
    pub fn new(label: &'static str) -> Self {
        MockJob { label }
    }
}

/// Context a recorded job was submitted to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JobKind {
    /// Render context.
    Render(RenderPart),

    /// Compute context.
    Compute,

    /// Occlusion query context.
    OcclusionQuery,

    /// Transfer context.
    Transfer,
}

/// Recorded null job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NullJob {
    /// Waited primitives in submission order.
    pub waits: Vec<SyncId>,

    /// Signaled primitive.
    pub signal: SyncId,
}

/// Recorded job submission.
///
/// Render jobs use `waits`, `barrier` and `signal` for geometry.
#[derive(Clone, Debug)]
pub struct JobRecord {
    /// Label of the submitted job.
    pub label: &'static str,

    /// Context the job went to.
    pub kind: JobKind,

    /// Fragment flag of a render submission.
    pub run_fragment: bool,

    /// Geometry terminate flag of a render submission.
    pub geometry_terminate: bool,

    /// External waits.
    pub waits: Vec<SyncId>,

    /// External fragment waits.
    pub fragment_waits: Vec<SyncId>,

    /// Pending barrier.
    pub barrier: Option<SyncId>,

    /// Pending fragment barrier.
    pub fragment_barrier: Option<SyncId>,

    /// Completion signal.
    pub signal: Option<SyncId>,

    /// Fragment completion signal.
    pub fragment_signal: Option<SyncId>,

    dependencies: Vec<Option<usize>>,
    done: bool,
}

impl JobKind {
    fn context(self) -> u8 {
        match self {
            JobKind::Render(_) => 0,
            JobKind::Compute => 1,
            JobKind::OcclusionQuery => 2,
            JobKind::Transfer => 3,
        }
    }
}

#[derive(Debug)]
enum Payload {
    Signaled,
    Job(usize),
    Merge(Vec<Option<usize>>),
}

#[derive(Debug, Default)]
struct Object {
    payload: Option<usize>,
    destroyed: usize,
}

#[derive(Debug, Default)]
struct State {
    objects: Vec<Object>,
    payloads: Vec<Payload>,
    null_jobs: Vec<NullJob>,
    jobs: Vec<JobRecord>,
    fail_creates_after: Option<usize>,
    fail_submits_after: Option<usize>,
    exports: usize,
}

impl State {
    fn object(&mut self, sync: &MockSync) -> &mut Object {
        let object = &mut self.objects[sync.id.0];
        assert_eq!(object.destroyed, 0, "Use of destroyed sync {:?}", sync.id);
        object
    }

    fn payload_of(&mut self, sync: &MockSync) -> Option<usize> {
        self.object(sync).payload
    }

    fn new_payload(&mut self, payload: Payload) -> usize {
        self.payloads.push(payload);
        self.payloads.len() - 1
    }

    fn signaled(&self, payload: Option<usize>) -> bool {
        match payload.map(|index| &self.payloads[index]) {
            None => false,
            Some(Payload::Signaled) => true,
            Some(Payload::Job(job)) => self.jobs[..=*job]
                .iter()
                .filter(|other| other.kind.context() == self.jobs[*job].kind.context())
                .all(|other| other.done),
            Some(Payload::Merge(inputs)) => inputs.iter().all(|&input| self.signaled(input)),
        }
    }

    fn waits_on_job(&self, payload: Option<usize>, job: usize) -> bool {
        match payload.map(|index| &self.payloads[index]) {
            None | Some(Payload::Signaled) => false,
            Some(Payload::Job(other)) => self.job_follows(*other, job),
            Some(Payload::Merge(inputs)) => inputs.iter().any(|&input| self.waits_on_job(input, job)),
        }
    }

    /// Whether completion of `later` implies completion of `job`.
    fn job_follows(&self, later: usize, job: usize) -> bool {
        later == job || (job < later && self.jobs[job].kind.context() == self.jobs[later].kind.context())
    }

    fn check_submit(&mut self) -> Result<(), OomOrDeviceLost> {
        match self.fail_submits_after {
            Some(0) => {
                self.fail_submits_after = None;
                Err(DeviceLost.into())
            }
            Some(ref mut left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn record_job(&mut self, record: JobRecord, signals: &[&MockSync]) {
        let job = self.jobs.len();
        for signal in signals {
            let payload = self.new_payload(Payload::Job(job));
            self.object(signal).payload = Some(payload);
        }
        self.jobs.push(record);
    }
}

/// Fake device. See module docs.
#[derive(Debug, Default)]
pub struct MockDevice {
    state: Mutex<State>,
}

impl MockDevice {
    /// Create fake device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the primitive creation after `count` more succeed.
    /// Fails only once.
    pub fn fail_creates_after(&self, count: usize) {
        self.state.lock().fail_creates_after = Some(count);
    }

    /// Fail the submission (null or real job) after `count` more succeed.
    /// Fails only once.
    pub fn fail_submits_after(&self, count: usize) {
        self.state.lock().fail_submits_after = Some(count);
    }

    /// Number of primitives ever created.
    pub fn created(&self) -> usize {
        self.state.lock().objects.len()
    }

    /// Number of primitives not destroyed yet.
    pub fn live(&self) -> usize {
        self.state
            .lock()
            .objects
            .iter()
            .filter(|object| object.destroyed == 0)
            .count()
    }

    /// Check that primitive is not destroyed.
    pub fn is_live(&self, id: SyncId) -> bool {
        self.state.lock().objects[id.0].destroyed == 0
    }

    /// How many times primitive was destroyed.
    pub fn destroy_count(&self, id: SyncId) -> usize {
        self.state.lock().objects[id.0].destroyed
    }

    /// Recorded null jobs.
    pub fn null_jobs(&self) -> Vec<NullJob> {
        self.state.lock().null_jobs.clone()
    }

    /// Recorded job submissions.
    pub fn jobs(&self) -> Vec<JobRecord> {
        self.state.lock().jobs.clone()
    }

    /// Index of the first job submitted with `label`.
    pub fn job_index(&self, label: &str) -> Option<usize> {
        self.state
            .lock()
            .jobs
            .iter()
            .position(|job| job.label == label)
    }

    /// Mark job as complete.
    /// Its signals are signaled once earlier jobs on its context complete too.
    pub fn complete_job(&self, job: usize) {
        self.state.lock().jobs[job].done = true;
    }

    /// Mark every submitted job as complete.
    pub fn complete_all(&self) {
        for job in self.state.lock().jobs.iter_mut() {
            job.done = true;
        }
    }

    /// Number of sync files exported.
    pub fn exports(&self) -> usize {
        self.state.lock().exports
    }

    /// Check if primitive's current payload transitively waits on job's completion.
    /// Works for destroyed primitives too.
    pub fn sync_waits_on_job(&self, id: SyncId, job: usize) -> bool {
        let state = self.state.lock();
        state.waits_on_job(state.objects[id.0].payload, job)
    }

    /// Check if job `job` was submitted with a wait or barrier that
    /// transitively depends on the completion of job `other`.
    /// Waiting on a later job of the same context counts.
    pub fn job_waits_on_job(&self, job: usize, other: usize) -> bool {
        let state = self.state.lock();
        state.jobs[job]
            .dependencies
            .iter()
            .any(|&payload| state.waits_on_job(payload, other))
    }

    /// Check if primitive is signaled. Works for destroyed primitives too.
    pub fn is_signaled(&self, id: SyncId) -> bool {
        let state = self.state.lock();
        state.signaled(state.objects[id.0].payload)
    }
}

fn ids(syncs: &[&MockSync]) -> Vec<SyncId> {
    syncs.iter().map(|sync| sync.id).collect()
}

impl Device for MockDevice {
    type Sync = MockSync;
    type SyncFile = MockSyncFile;

    fn create_sync(&self) -> Result<MockSync, OutOfMemory> {
        let mut state = self.state.lock();
        match state.fail_creates_after {
            Some(0) => {
                state.fail_creates_after = None;
                return Err(OutOfMemory::OutOfHostMemory);
            }
            Some(ref mut left) => *left -= 1,
            None => {}
        }
        state.objects.push(Object::default());
        Ok(MockSync {
            id: SyncId(state.objects.len() - 1),
        })
    }

    fn destroy_sync(&self, sync: MockSync) {
        let mut state = self.state.lock();
        let object = &mut state.objects[sync.id.0];
        assert_eq!(object.destroyed, 0, "Double destroy of sync {:?}", sync.id);
        object.destroyed += 1;
    }

    fn wait_sync(&self, sync: &MockSync, _timeout_ns: u64) -> Result<bool, OomOrDeviceLost> {
        let mut state = self.state.lock();
        let payload = state.payload_of(sync);
        Ok(state.signaled(payload))
    }

    fn signal_sync(&self, sync: &MockSync) -> Result<(), OomOrDeviceLost> {
        let mut state = self.state.lock();
        let payload = state.new_payload(Payload::Signaled);
        state.object(sync).payload = Some(payload);
        Ok(())
    }

    fn reset_sync(&self, sync: &MockSync) -> Result<(), OomOrDeviceLost> {
        self.state.lock().object(sync).payload = None;
        Ok(())
    }

    fn move_sync(&self, dst: &MockSync, src: &MockSync) -> Result<(), OomOrDeviceLost> {
        let mut state = self.state.lock();
        let payload = state.object(src).payload.take();
        state.object(dst).payload = payload;
        Ok(())
    }

    fn export_sync_file(&self, sync: &MockSync) -> Result<MockSyncFile, OomOrDeviceLost> {
        let mut state = self.state.lock();
        state.exports += 1;
        Ok(MockSyncFile {
            payload: state.payload_of(sync),
        })
    }

    fn import_sync_file(&self, sync: &MockSync, file: &MockSyncFile) -> Result<(), OomOrDeviceLost> {
        self.state.lock().object(sync).payload = file.payload;
        Ok(())
    }

    fn submit_null_job(&self, waits: &[&MockSync], signal: &MockSync) -> Result<(), OomOrDeviceLost> {
        let mut state = self.state.lock();
        state.check_submit()?;
        let inputs: Vec<Option<usize>> = waits.iter().map(|wait| state.payload_of(wait)).collect();
        let payload = state.new_payload(Payload::Merge(inputs));
        state.object(signal).payload = Some(payload);
        state.null_jobs.push(NullJob {
            waits: ids(waits),
            signal: signal.id,
        });
        Ok(())
    }
}

impl Contexts for MockDevice {
    type RenderJob = MockJob;
    type ComputeJob = MockJob;
    type TransferJob = MockJob;

    fn submit_render(&self, job: &MockJob, submit: RenderSubmit<'_, MockSync>) -> Result<(), OomOrDeviceLost> {
        let mut state = self.state.lock();
        state.check_submit()?;

        let dependencies = submit
            .geometry_waits
            .iter()
            .chain(submit.fragment_waits)
            .chain(submit.geometry_barrier.as_ref())
            .chain(submit.fragment_barrier.as_ref())
            .map(|sync| state.payload_of(sync))
            .collect();

        let signals: Vec<&MockSync> = submit
            .geometry_signal
            .iter()
            .chain(submit.fragment_signal.iter())
            .copied()
            .collect();

        let record = JobRecord {
            label: job.label,
            kind: JobKind::Render(submit.part),
            run_fragment: submit.run_fragment,
            geometry_terminate: submit.geometry_terminate,
            waits: ids(submit.geometry_waits),
            fragment_waits: ids(submit.fragment_waits),
            barrier: submit.geometry_barrier.map(MockSync::id),
            fragment_barrier: submit.fragment_barrier.map(MockSync::id),
            signal: submit.geometry_signal.map(MockSync::id),
            fragment_signal: submit.fragment_signal.map(MockSync::id),
            dependencies,
            done: false,
        };
        state.record_job(record, &signals);
        Ok(())
    }

    fn submit_compute(
        &self,
        context: ComputeContext,
        job: &MockJob,
        submit: JobSubmit<'_, MockSync>,
    ) -> Result<(), OomOrDeviceLost> {
        let kind = match context {
            ComputeContext::Compute => JobKind::Compute,
            ComputeContext::OcclusionQuery => JobKind::OcclusionQuery,
        };
        self.submit_simple(kind, job, submit)
    }

    fn submit_transfer(&self, job: &MockJob, submit: JobSubmit<'_, MockSync>) -> Result<(), OomOrDeviceLost> {
        self.submit_simple(JobKind::Transfer, job, submit)
    }
}

impl MockDevice {
    fn submit_simple(
        &self,
        kind: JobKind,
        job: &MockJob,
        submit: JobSubmit<'_, MockSync>,
    ) -> Result<(), OomOrDeviceLost> {
        let mut state = self.state.lock();
        state.check_submit()?;

        let dependencies = submit
            .waits
            .iter()
            .chain(submit.barrier.as_ref())
            .map(|sync| state.payload_of(sync))
            .collect();

        let record = JobRecord {
            label: job.label,
            kind,
            run_fragment: false,
            geometry_terminate: false,
            waits: ids(submit.waits),
            fragment_waits: Vec::new(),
            barrier: submit.barrier.map(MockSync::id),
            fragment_barrier: None,
            signal: Some(submit.signal.id),
            fragment_signal: None,
            dependencies,
            done: false,
        };
        state.record_job(record, &[submit.signal]);
        Ok(())
    }
}
