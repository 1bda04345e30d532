//! Bounded-concurrency job execution

mod executor;
mod gate;

pub use executor::{run, ProgressCallback, RunCancellation, Runner, CANCELLED_MESSAGE};
pub use gate::{Admission, AdmissionGate};
