//! Definiciones relacionadas a Stages.
//!
//! Un Stage lee artifacts con nombre y produce artifacts con nombre. Este
//! módulo define:
//! - `Stage`: interfaz usada por el executor.
//! - `StageRunResult` y señales (`StageSignal`).
//! - `StageStatus`: máquina de estados por intento.

pub mod definition;
mod run_result;
mod status;

pub use definition::{Stage, StageKind};
pub use run_result::{StageRunResult, StageSignal};
pub use status::StageStatus;
