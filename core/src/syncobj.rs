//! Owning handle for a device sync primitive.

use {
    crate::{
        device::Device,
        error::{Error, OomOrDeviceLost, OutOfMemory},
    },
    smallvec::SmallVec,
    std::{mem::ManuallyDrop, sync::Arc},
};

/// Sync primitive with a single owner.
///
/// Destroyed when dropped. Sharing is done by merging into a new
/// primitive through a null job, never by aliasing this one.
pub struct Syncobj<D: Device> {
    device: Arc<D>,
    raw: ManuallyDrop<D::Sync>,
}

impl<D> Syncobj<D>
where
    D: Device,
{
    /// Create new unsignaled primitive.
    pub fn create(device: &Arc<D>) -> Result<Self, OutOfMemory> {
        let raw = device.create_sync()?;
        log::trace!("Created sync {:?}", raw);
        Ok(Syncobj {
            device: Arc::clone(device),
            raw: ManuallyDrop::new(raw),
        })
    }

    /// Create primitive signaled once every primitive in `waits` is.
    ///
    /// An empty `waits` produces a primitive that signals right away.
    pub fn merge<'a>(
        device: &Arc<D>,
        waits: impl IntoIterator<Item = &'a Syncobj<D>>,
    ) -> Result<Self, Error> {
        let waits: SmallVec<[&D::Sync; 8]> = waits.into_iter().map(Syncobj::raw).collect();
        Self::merge_raw(device, &waits)
    }

    /// Same as `merge` for raw primitives.
    pub fn merge_raw(device: &Arc<D>, waits: &[&D::Sync]) -> Result<Self, Error> {
        let merged = Self::create(device)?;
        device.submit_null_job(waits, merged.raw())?;
        log::trace!("Merged {} syncs into {:?}", waits.len(), merged.raw());
        Ok(merged)
    }

    /// Raw primitive.
    pub fn raw(&self) -> &D::Sync {
        &self.raw
    }

    /// Wait for the primitive to become signaled.
    /// Returns `false` on timeout.
    pub fn wait(&self, timeout_ns: u64) -> Result<bool, OomOrDeviceLost> {
        self.device.wait_sync(&self.raw, timeout_ns)
    }

    /// Check if the primitive is signaled without blocking.
    pub fn is_signaled(&self) -> Result<bool, OomOrDeviceLost> {
        self.wait(0)
    }

    /// Signal from the host.
    pub fn signal(&self) -> Result<(), OomOrDeviceLost> {
        self.device.signal_sync(&self.raw)
    }

    /// Reset from the host.
    pub fn reset(&self) -> Result<(), OomOrDeviceLost> {
        self.device.reset_sync(&self.raw)
    }

    /// Move payload into `dst`, destroying this primitive.
    pub fn move_into(self, dst: &Syncobj<D>) -> Result<(), OomOrDeviceLost> {
        self.device.move_sync(dst.raw(), &self.raw)?;
        log::trace!("Moved sync {:?} into {:?}", *self.raw, dst.raw());
        Ok(())
    }

    /// Export payload as a sync file.
    pub fn export(&self) -> Result<D::SyncFile, OomOrDeviceLost> {
        self.device.export_sync_file(&self.raw)
    }

    /// Replace payload with the one in `file`.
    pub fn import(&self, file: &D::SyncFile) -> Result<(), OomOrDeviceLost> {
        self.device.import_sync_file(&self.raw, file)
    }
}

impl<D> Drop for Syncobj<D>
where
    D: Device,
{
    fn drop(&mut self) {
        // Never touched again after this point.
        let raw = unsafe { ManuallyDrop::take(&mut self.raw) };
        log::trace!("Destroy sync {:?}", raw);
        self.device.destroy_sync(raw);
    }
}

impl<D> std::fmt::Debug for Syncobj<D>
where
    D: Device,
{
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "Syncobj({:?})", *self.raw)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::mock::MockDevice};

    #[test]
    fn drop_destroys_once() {
        let device = Arc::new(MockDevice::new());
        let sync = Syncobj::create(&device).unwrap();
        let id = sync.raw().id();
        assert!(device.is_live(id));
        drop(sync);
        assert!(!device.is_live(id));
        assert_eq!(device.destroy_count(id), 1);
    }

    #[test]
    fn merge_records_waits() {
        let device = Arc::new(MockDevice::new());
        let a = Syncobj::create(&device).unwrap();
        let b = Syncobj::create(&device).unwrap();
        let merged = Syncobj::merge(&device, vec![&a, &b]).unwrap();

        let null_jobs = device.null_jobs();
        assert_eq!(null_jobs.len(), 1);
        assert_eq!(null_jobs[0].waits, vec![a.raw().id(), b.raw().id()]);
        assert_eq!(null_jobs[0].signal, merged.raw().id());
    }

    #[test]
    fn failed_merge_destroys_new_primitive() {
        let device = Arc::new(MockDevice::new());
        device.fail_submits_after(0);
        let before = device.created();
        assert!(Syncobj::merge(&device, std::iter::empty()).is_err());
        assert_eq!(device.created(), before + 1);
        assert_eq!(device.live(), 0);
    }

    #[test]
    fn move_transfers_payload() {
        let device = Arc::new(MockDevice::new());
        let src = Syncobj::create(&device).unwrap();
        src.signal().unwrap();
        let dst = Syncobj::create(&device).unwrap();
        assert!(!dst.is_signaled().unwrap());
        src.move_into(&dst).unwrap();
        assert!(dst.is_signaled().unwrap());
        assert_eq!(device.live(), 1);
    }
}
