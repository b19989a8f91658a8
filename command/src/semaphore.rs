use relay_core::{Device, Error, OutOfMemory, Syncobj};

#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
enum Payload<D: Device> {
    Binary(Syncobj<D>),
    Timeline,
    Dummy,
}

/// Semaphore that batches wait on and signal.
///
/// Only binary semaphores take part in synchronization.
/// Dummy semaphores have no payload and are skipped when waited on.
/// Timeline semaphores are rejected.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Semaphore<D: Device> {
    payload: Payload<D>,
}

impl<D> Semaphore<D>
where
    D: Device,
{
    /// Create binary semaphore.
    pub fn binary(device: &std::sync::Arc<D>) -> Result<Self, OutOfMemory> {
        Ok(Semaphore {
            payload: Payload::Binary(Syncobj::create(device)?),
        })
    }

    /// Create semaphore without payload.
    pub fn dummy() -> Self {
        Semaphore {
            payload: Payload::Dummy,
        }
    }

    /// Create timeline semaphore.
    pub fn timeline() -> Self {
        Semaphore {
            payload: Payload::Timeline,
        }
    }

    /// Check if semaphore has no payload.
    pub fn is_dummy(&self) -> bool {
        match self.payload {
            Payload::Dummy => true,
            _ => false,
        }
    }

    /// Check if semaphore is a timeline one.
    pub fn is_timeline(&self) -> bool {
        match self.payload {
            Payload::Timeline => true,
            _ => false,
        }
    }

    /// Primitive of a binary semaphore.
    pub fn sync(&self) -> Result<&Syncobj<D>, Error> {
        match &self.payload {
            Payload::Binary(sync) => Ok(sync),
            Payload::Timeline => Err(Error::UnsupportedSyncFeature("timeline semaphore")),
            Payload::Dummy => Err(Error::UnsupportedSyncFeature("signal of semaphore without payload")),
        }
    }
}
