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

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::runtime::{Builder, Handle, Runtime};
use tracing::debug;

/// A dedicated runtime used as a worker pool for off-loop handlers.
///
/// This runtime is only used as a nice thread pool with the interface of
/// tokio tasks: handlers spawned here are allowed to block their worker
/// thread for an arbitrary amount of time. It must not be used to run
/// tokio io.
pub(crate) struct WorkerPool {
	runtime: Runtime,
}

impl WorkerPool {
	/// Pool for IO-bound handlers ([`crate::ExecuteIn::Thread`]).
	pub(crate) fn io(num_threads: usize) -> anyhow::Result<WorkerPool> {
		let runtime = Builder::new_multi_thread()
			.worker_threads(num_threads)
			.thread_name_fn(|| {
				static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
				let id = ATOMIC_ID.fetch_add(1, Ordering::AcqRel);
				format!("io-worker-{id}")
			})
			.enable_all()
			.build()?;
		debug!(num_threads, "io-pool-started");
		Ok(WorkerPool { runtime })
	}

	/// Pool for CPU-bound handlers ([`crate::ExecuteIn::Process`]).
	pub(crate) fn cpu(num_threads: usize) -> anyhow::Result<WorkerPool> {
		let runtime = Builder::new_multi_thread()
			.worker_threads(num_threads)
			.thread_name_fn(|| {
				static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
				let id = ATOMIC_ID.fetch_add(1, Ordering::AcqRel);
				format!("cpu-worker-{id}")
			})
			.enable_all()
			.build()?;
		debug!(num_threads, "cpu-pool-started");
		Ok(WorkerPool { runtime })
	}

	pub(crate) fn handle(&self) -> Handle {
		self.runtime.handle().clone()
	}

	/// Shuts the pool down without blocking the dispatch loop. Jobs that
	/// have not started yet are dropped.
	pub(crate) fn release(self) {
		self.runtime.shutdown_background();
	}
}
