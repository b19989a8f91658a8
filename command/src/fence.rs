use {
    crate::queue::QueueId,
    relay_core::{Device, Error, OomOrDeviceLost, Syncobj},
    std::sync::Arc,
};

/// Queue epoch is the point in particular queue timeline when fence is submitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FenceEpoch {
    /// Queue that signals fence.
    pub queue: QueueId,

    /// Queue epoch counter.
    pub epoch: u64,
}

#[derive(Clone, Copy, Debug)]
enum FenceState {
    Unsignaled,
    Signaled,
    Submitted(FenceEpoch),
}

/// Fence wrapper.
#[derive(Debug)]
pub struct Fence<D: Device> {
    sync: Syncobj<D>,
    state: FenceState,
}

impl<D> Fence<D>
where
    D: Device,
{
    /// Create new fence in signaled or unsignaled state.
    pub fn new(device: &Arc<D>, signaled: bool) -> Result<Self, Error> {
        let sync = Syncobj::create(device)?;
        let state = if signaled {
            sync.signal()?;
            FenceState::Signaled
        } else {
            FenceState::Unsignaled
        };
        Ok(Fence { sync, state })
    }

    /// Check if fence was submitted.
    pub fn is_submitted(&self) -> bool {
        match self.state {
            FenceState::Submitted(_) => true,
            _ => false,
        }
    }

    /// Check if fence is signaled.
    pub fn is_signaled(&self) -> bool {
        match self.state {
            FenceState::Signaled => true,
            _ => false,
        }
    }

    /// Check if fence is unsignaled.
    /// It can be submitted as well.
    pub fn is_unsignaled(&self) -> bool {
        !self.is_signaled()
    }

    /// Panics if signaled or submitted.
    pub(crate) fn assert_unsignaled(&self) {
        match self.state {
            FenceState::Unsignaled => {}
            _ => panic!("Must be Unsignaled"),
        }
    }

    /// Panics if signaled or submitted.
    /// Becomes `Submitted` after.
    pub(crate) fn mark_submitted(&mut self, epoch: FenceEpoch) {
        self.assert_unsignaled();
        self.state = FenceState::Submitted(epoch);
    }

    pub(crate) fn sync(&self) -> &Syncobj<D> {
        &self.sync
    }

    /// Reset signaled fence.
    /// Panics if not signaled.
    /// Becomes unsignaled.
    pub fn reset(&mut self) -> Result<(), OomOrDeviceLost> {
        match self.state {
            FenceState::Signaled => {
                self.sync.reset()?;
                self.state = FenceState::Unsignaled;
                Ok(())
            }
            _ => panic!("Must be signaled"),
        }
    }

    /// Wait for fence to become signaled.
    /// Panics if not submitted.
    /// Returns submission epoch on success.
    pub fn wait_signaled(&mut self, timeout_ns: u64) -> Result<Option<FenceEpoch>, OomOrDeviceLost> {
        match self.state {
            FenceState::Submitted(epoch) => {
                if self.sync.wait(timeout_ns)? {
                    self.state = FenceState::Signaled;
                    Ok(Some(epoch))
                } else {
                    Ok(None)
                }
            }
            _ => panic!("Must be submitted"),
        }
    }

    /// Check if fence has became signaled.
    /// Panics if not submitted.
    /// Returns submission epoch on success.
    pub fn check_signaled(&mut self) -> Result<Option<FenceEpoch>, OomOrDeviceLost> {
        self.wait_signaled(0)
    }

    /// Get submission epoch.
    /// Panics if not submitted.
    pub fn epoch(&self) -> FenceEpoch {
        match self.state {
            FenceState::Submitted(epoch) => epoch,
            _ => panic!("Must be submitted"),
        }
    }
}
