//! This crate tracks which work every stage has to wait for.
//! Completions are kept per stage at command buffer, submission and queue scope.
//! Barriers and events turn them into pending barriers for later work.

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

mod barrier;
mod event;
mod table;

pub use crate::{
    barrier::{apply_barrier, Barrier},
    event::{process_event_cmd, set_or_reset, wait_events, Event, EventCmd, EventState, EventStatus},
    table::{BarrierTable, CompletionTable, Scopes, StageTable},
};
