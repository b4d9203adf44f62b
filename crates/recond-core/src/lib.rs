//! Core library for recond, a reconnaissance pipeline orchestrator.
//!
//! recond drives multi-step recon pipelines (subdomain discovery, HTTP
//! probing, vulnerability scanning) over many independent targets, each step
//! backed by an external command-line tool. The library is organized around
//! five pieces:
//!
//! - [`storage`]: crash-consistent persistence of target/job/step state
//! - [`gate`]: per-tool admission control with bounded FIFO waiting
//! - [`pipeline`]: the per-job step state machine
//! - [`scheduler`]: bounded-concurrency job admission
//! - [`controller`]: load-adaptive concurrency budget adjustment
//!
//! External tool wrappers live in [`tools`]; shared data types in [`domain`].

pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod scheduler;
pub mod storage;
pub mod tools;

pub use error::{ReconError, ReconResult};
