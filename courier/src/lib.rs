// Copyright (C) 2023 QuerentAI LLC.
// This file is part of Querent.

// The Licensed Work is licensed under the Business Source License 1.1 (BSL 1.1).
// You may use this file in compliance with the BSL 1.1, subject to the following restrictions:
// 1. You may not use the Licensed Work for AI-related services, database services,
//    or any service or product offering that provides database, big data, or analytics
//    services to third parties unless explicitly authorized by QuerentAI LLC.
// 2. For more details, see the LICENSE file or visit https://mariadb.com/bsl11/.

// For inquiries about alternative licensing arrangements, please contact contact@querent.xyz.

// The Licensed Work is provided "AS IS", WITHOUT WARRANTY OF ANY KIND, express or implied,
// including but not limited to the warranties of merchantability, fitness for a particular purpose,
// and non-infringement. See the Business Source License for more details.

// This software includes code developed by QuerentAI LLC (https://querent.xyz).

#![deny(clippy::disallowed_methods)]

//! courier is a generic asynchronous dispatch engine.
//!
//! It solves the following problem:
//! - route typed messages to per-route handlers by key.
//! - bound concurrency with a global gate and a per-route gate.
//! - let urgent routes overtake the global gate.
//! - shape upstream intake with four back-pressure modes.
//! - enforce per-job deadlines and emit liveness pulses while a job runs.
//! - guarantee exactly one terminal callback per dispatched message.
//!
//! The engine is parameterized by a payload type `P`, a routing key `K` and
//! a result type `R`, so it can sit at the core of HTTP servers, queue
//! consumers or plain CLIs. The only thing it knows about the outside world
//! is the [`Adapter`] contract wrapping a source message.

mod actor;
mod adapter;
mod admission;
mod errors;
mod execute_in;
mod executor;
mod gate;
pub mod metrics;
mod pool;
mod registry;
mod tasks;
mod wait_for;


pub use adapter::{Adapter, Middleware};
pub use errors::{Cancelled, HandleError, RegistryError};
pub use execute_in::ExecuteIn;
pub use executor::{Executor, RunningExecutor};
pub use gate::Priority;
pub use metrics::ExecutorMetrics;
pub use registry::{AddRoute, Registry, DEFAULT_JOB_TIMEOUT, DEFAULT_MAX_JOBS};
pub use wait_for::WaitFor;
