// SPDX-FileCopyrightText: 2026 Armature Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Armature integration tests.
//!
//! Provides mock plugins and harness infrastructure for fast, deterministic,
//! CI-runnable tests.
//!
//! # Components
//!
//! - [`RecordingPlugin`] - journals its start/stop hooks
//! - [`FailingPlugin`] - start hook that always fails
//! - [`TestRuntime`] - context + manager wired together

pub mod harness;
pub mod recording;

pub use harness::{TestRuntime, init_test_logging};
pub use recording::{FailingPlugin, Journal, RecordingPlugin, journal};
