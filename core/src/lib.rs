//! Crate that contains types shared by other relay crates:
//! job types, stage masks, errors, collaborator traits
//! and the owning sync primitive handle.

#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

pub use crate::{
    device::{Contexts, Device, JobSubmit, RenderPart, RenderSubmit},
    error::{DeviceLost, Error, OomOrDeviceLost, OutOfMemory},
    job::{ComputeContext, JobType},
    stage::{PipelineStageFlags, StageMask},
    syncobj::Syncobj,
};

mod device;
mod error;
mod job;
mod stage;
mod syncobj;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
