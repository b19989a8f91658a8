//! Error types returned by sync collaborators and by the engine.

use failure::Fail;

/// Typical allocation error - out of available memory.
#[derive(Clone, Copy, Debug, Fail, PartialEq, Eq)]
pub enum OutOfMemory {
    /// Host memory exhausted.
    #[fail(display = "Out of host memory")]
    OutOfHostMemory,

    /// Device memory exhausted.
    #[fail(display = "Out of device memory")]
    OutOfDeviceMemory,
}

/// Error that can be returned by some functions
/// indicating that logical device is lost.
/// Those methods on objects created from the device will likely result in this error again.
/// When device is lost user should free all objects created from it and destroy the device.
#[derive(Clone, Copy, Debug, Fail, PartialEq, Eq)]
#[fail(display = "Device lost. Re-initialization required")]
pub struct DeviceLost;

/// Error returned by submissions, waits and payload transfers.
#[derive(Clone, Copy, Debug, Fail, PartialEq, Eq)]
pub enum OomOrDeviceLost {
    /// Out of either host or device memory.
    #[fail(display = "{}", _0)]
    OutOfMemory(OutOfMemory),

    /// Device is unusable.
    #[fail(display = "{}", _0)]
    DeviceLost(DeviceLost),
}

impl From<OutOfMemory> for OomOrDeviceLost {
    fn from(error: OutOfMemory) -> Self {
        OomOrDeviceLost::OutOfMemory(error)
    }
}

impl From<DeviceLost> for OomOrDeviceLost {
    fn from(error: DeviceLost) -> Self {
        OomOrDeviceLost::DeviceLost(error)
    }
}

/// Engine-level error.
#[derive(Clone, Copy, Debug, Fail, PartialEq, Eq)]
pub enum Error {
    /// Primitive or table allocation failed.
    #[fail(display = "{}", _0)]
    OutOfMemory(OutOfMemory),

    /// A wait or a submission reported the device unusable.
    #[fail(display = "{}", _0)]
    DeviceLost(DeviceLost),

    /// Sync object kind the engine can't handle, e.g. a timeline semaphore.
    #[fail(display = "Unsupported sync feature: {}", _0)]
    UnsupportedSyncFeature(&'static str),

    /// Bounded wait exceeded.
    #[fail(display = "Wait timed out")]
    Timeout,
}

impl From<OutOfMemory> for Error {
    fn from(error: OutOfMemory) -> Self {
        Error::OutOfMemory(error)
    }
}

impl From<DeviceLost> for Error {
    fn from(error: DeviceLost) -> Self {
        Error::DeviceLost(error)
    }
}

impl From<OomOrDeviceLost> for Error {
    fn from(error: OomOrDeviceLost) -> Self {
        match error {
            OomOrDeviceLost::OutOfMemory(error) => Error::OutOfMemory(error),
            OomOrDeviceLost::DeviceLost(error) => Error::DeviceLost(error),
        }
    }
}
