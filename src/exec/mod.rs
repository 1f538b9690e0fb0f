// src/exec/mod.rs

//! Task execution layer.
//!
//! The runtime hands dispatched tasks to an [`ExecutorBackend`]. In
//! production that is [`PipelineExecutor`], which runs the asset transforms
//! on the blocking pool, notifies the live-reload server and reports back
//! with `RuntimeEvent::TaskCompleted`. Tests swap in a fake backend.

pub mod backend;

pub use backend::{ExecutorBackend, PipelineExecutor};
