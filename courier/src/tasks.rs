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

use std::{
	collections::HashSet,
	future::Future,
	sync::{Arc, Mutex},
};

use common::TerminateSignal;
use tokio::sync::Notify;
use tracing::debug;

/// Supervises the fire-and-forget dispatch tasks of one executor run.
///
/// Every tracked task deregisters itself when it reaches a terminal state
/// (even across a panic), so the set stays small on long-lived executors.
/// Cancellation is cooperative: [`Tasks::cancel`] flips the supervisor's
/// terminate signal and each dispatch, holding a child of it, winds itself
/// down through its own `on_cancel`.
#[derive(Clone)]
pub(crate) struct Tasks {
	inner: Arc<TasksInner>,
}

struct TasksInner {
	state: Mutex<TasksState>,
	drained: Notify,
	terminate: TerminateSignal,
}

struct TasksState {
	live: HashSet<u64>,
	next_id: u64,
	done: bool,
}

impl Tasks {
	pub(crate) fn new() -> Tasks {
		Tasks {
			inner: Arc::new(TasksInner {
				state: Mutex::new(TasksState {
					live: HashSet::new(),
					next_id: 0,
					done: false,
				}),
				drained: Notify::new(),
				terminate: TerminateSignal::new(),
			}),
		}
	}

	/// The signal cancelled dispatches observe. Hand every dispatch a
	/// child of it.
	pub(crate) fn terminate_sig(&self) -> &TerminateSignal {
		&self.inner.terminate
	}

	/// Spawns a background dispatch and tracks it until it is terminal.
	///
	/// Panics if called after [`Tasks::wait`] has returned.
	pub(crate) fn start<F>(&self, fut: F)
	where
		F: Future<Output = ()> + Send + 'static,
	{
		let task_id = {
			let mut state = self.inner.state.lock().expect("tasks mutex poisoned");
			assert!(!state.done, "cannot start a dispatch on a drained supervisor");
			let task_id = state.next_id;
			state.next_id += 1;
			state.live.insert(task_id);
			task_id
		};
		let inner = Arc::clone(&self.inner);
		tokio::spawn(async move {
			let _deregister = Deregister { inner, task_id };
			fut.await;
		});
	}

	/// Requests cancellation of every tracked dispatch. Idempotent, does
	/// not wait.
	pub(crate) fn cancel(&self) {
		self.inner.terminate.kill();
	}

	/// Blocks until every tracked dispatch is terminal, then freezes the
	/// supervisor: no further [`Tasks::start`] is permitted.
	pub(crate) async fn wait(&self) {
		loop {
			let drained = self.inner.drained.notified();
			let outstanding = self.outstanding();
			if outstanding == 0 {
				break;
			}
			debug!(outstanding, "draining-dispatches");
			drained.await;
		}
		self.inner.state.lock().expect("tasks mutex poisoned").done = true;
	}

	pub(crate) fn outstanding(&self) -> usize {
		self.inner.state.lock().expect("tasks mutex poisoned").live.len()
	}
}

/// Removes the task from the tracked set on completion, unwind included.
struct Deregister {
	inner: Arc<TasksInner>,
	task_id: u64,
}

impl Drop for Deregister {
	fn drop(&mut self) {
		let emptied = {
			let mut state = self.inner.state.lock().expect("tasks mutex poisoned");
			state.live.remove(&self.task_id);
			state.live.is_empty()
		};
		if emptied {
			// notify_one stores a wake-up even when wait() has not been
			// polled yet, so the drain can never miss the last completion.
			self.inner.drained.notify_one();
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[tokio::test(start_paused = true)]
	async fn test_tasks_wait_drains_everything() {
		let tasks = Tasks::new();
		for task_idx in 0..5u64 {
			tasks.start(async move {
				tokio::time::sleep(Duration::from_millis(10 * task_idx)).await;
			});
		}
		assert_eq!(tasks.outstanding(), 5);
		tasks.wait().await;
		assert_eq!(tasks.outstanding(), 0);
	}

	#[tokio::test]
	async fn test_tasks_deregister_survives_panic() {
		let tasks = Tasks::new();
		tasks.start(async {
			panic!("dispatch blew up");
		});
		tokio::time::timeout(Duration::from_secs(1), tasks.wait())
			.await
			.expect("wait should not hang on a panicked task");
	}

	#[tokio::test(start_paused = true)]
	async fn test_tasks_cancel_is_cooperative() {
		let tasks = Tasks::new();
		let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
		let terminate = tasks.terminate_sig().child();
		tasks.start(async move {
			tokio::select! {
				_ = terminate.killed() => tx.send("cancelled").unwrap(),
				_ = tokio::time::sleep(Duration::from_secs(3600)) => tx.send("finished").unwrap(),
			}
		});
		tasks.cancel();
		tasks.cancel(); // idempotent
		tasks.wait().await;
		assert_eq!(rx.recv().await, Some("cancelled"));
	}

	#[tokio::test]
	#[should_panic(expected = "drained supervisor")]
	async fn test_tasks_start_after_wait_panics() {
		let tasks = Tasks::new();
		tasks.wait().await;
		tasks.start(async {});
	}
}
