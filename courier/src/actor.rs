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
	fmt,
	sync::{atomic::Ordering, Arc, Mutex},
	time::Duration,
};

use common::TerminateSignal;
use tokio::{
	sync::Semaphore,
	task::{AbortHandle, JoinHandle},
};
use tracing::{debug, warn};

use crate::{
	adapter::Adapter,
	admission::Admission,
	errors::{Cancelled, HandleError},
	gate::Gate,
	metrics::{inflight_guard, DispatchCounters, COURIER_METRICS},
	registry::{ActorConfig, HandlerFn},
};

/// Per-route execution wrapper: the route configuration plus its runtime
/// context, the per-route semaphore, the shared global gate and, for
/// off-loop routes, the pool the handler runs on.
///
/// Immutable once the executor has started.
pub(crate) struct Actor<P, K, R> {
	key: K,
	config: ActorConfig<P, R>,
	route_sem: Arc<Semaphore>,
	global_gate: Arc<Gate>,
	pool: Option<tokio::runtime::Handle>,
	counters: Arc<DispatchCounters>,
}

enum Outcome<R> {
	Success(R),
	Failure(HandleError),
	Cancelled,
}

impl<P, K, R> Actor<P, K, R>
where
	P: Send + 'static,
	K: fmt::Debug + Send + Sync + 'static,
	R: Send + 'static,
{
	pub(crate) fn new(
		key: K,
		config: ActorConfig<P, R>,
		global_gate: Arc<Gate>,
		pool: Option<tokio::runtime::Handle>,
		counters: Arc<DispatchCounters>,
	) -> Actor<P, K, R> {
		let route_sem = Arc::new(Semaphore::new(config.max_jobs));
		Actor { key, config, route_sem, global_gate, pool, counters }
	}

	/// Runs one message through admission, the handler and exactly one
	/// terminal callback.
	///
	/// `terminate` aborts the dispatch cooperatively: whatever stage is in
	/// flight is dropped (permits released) and the adapter sees
	/// `on_cancel`. The admission stages are released on every exit path.
	pub(crate) async fn handle<A>(
		&self,
		adapter: A,
		admission: Admission,
		terminate: TerminateSignal,
	) where
		A: Adapter<Payload = P, Key = K, Res = R>,
	{
		let adapter = Arc::new(adapter);
		let pulse = Heartbeat::start(self.config.pulse_every, Arc::clone(&adapter));
		let pool_job = PoolJob::default();
		let outcome = tokio::select! {
			_ = terminate.killed() => Outcome::Cancelled,
			outcome = self.admit_and_run(adapter.as_ref(), &admission, &pool_job) => outcome,
		};
		if matches!(outcome, Outcome::Cancelled) {
			// Dropping the admit future only detaches a spawned pool task;
			// abort it so a cancelled dispatch stops holding a worker slot.
			pool_job.abort();
		}
		// Unblock execute() callers still parked on an admission stage
		// before entering the (possibly slow) terminal callback.
		drop(admission);
		// The heartbeat must be gone before the terminal callback starts:
		// no pulse may race with or follow it.
		pulse.stop().await;
		match outcome {
			Outcome::Success(result) => {
				debug!(key = ?self.key, "dispatch-success");
				self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
				COURIER_METRICS.success_total.inc();
				adapter.on_success(result).await;
			},
			Outcome::Failure(error) => {
				warn!(key = ?self.key, error = %error, "dispatch-failure");
				self.counters.failed.fetch_add(1, Ordering::Relaxed);
				COURIER_METRICS.failure_total.inc();
				adapter.on_failure(error).await;
			},
			Outcome::Cancelled => {
				debug!(key = ?self.key, "dispatch-cancelled");
				self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
				COURIER_METRICS.cancel_total.inc();
				adapter.on_cancel(Cancelled).await;
			},
		}
	}

	async fn admit_and_run<A>(
		&self,
		adapter: &A,
		admission: &Admission,
		pool_job: &PoolJob,
	) -> Outcome<R>
	where
		A: Adapter<Payload = P, Key = K, Res = R>,
	{
		// Global gate first, per-route gate second. The NoPressure/Start
		// distinction depends on exactly this order.
		let _global = Arc::clone(&self.global_gate).acquire(self.config.priority).await;
		admission.clear_no_pressure();
		let _route = Arc::clone(&self.route_sem)
			.acquire_owned()
			.await
			.expect("the per-route semaphore is never closed");
		admission.clear_start();
		let payload = match adapter.get_payload().await {
			Ok(payload) => payload,
			Err(error) => return Outcome::Failure(HandleError::Payload(error)),
		};
		let _inflight = inflight_guard();
		match self.run_handler(payload, pool_job).await {
			Ok(result) => Outcome::Success(result),
			Err(error) => Outcome::Failure(error),
		}
	}

	async fn run_handler(&self, payload: P, pool_job: &PoolJob) -> Result<R, HandleError> {
		let job_timeout = self.config.job_timeout;
		if let Some(pool) = &self.pool {
			let handler = match &self.config.handler {
				HandlerFn::Sync(handler) => Arc::clone(handler),
				// The registry refuses async handlers on off-loop routes.
				HandlerFn::Async(_) => unreachable!("off-loop handlers are always sync"),
			};
			let join = pool.spawn(async move { handler(payload) });
			pool_job.track(join.abort_handle());
			return match tokio::time::timeout(job_timeout, join).await {
				Ok(Ok(result)) => result.map_err(HandleError::Handler),
				Ok(Err(join_error)) => Err(HandleError::Handler(anyhow::Error::from(join_error))),
				Err(_elapsed) => {
					pool_job.abort();
					Err(HandleError::Timeout(job_timeout))
				},
			};
		}
		match &self.config.handler {
			HandlerFn::Sync(handler) => handler(payload).map_err(HandleError::Handler),
			HandlerFn::Async(handler) => {
				match tokio::time::timeout(job_timeout, handler(payload)).await {
					Ok(result) => result.map_err(HandleError::Handler),
					Err(_elapsed) => Err(HandleError::Timeout(job_timeout)),
				}
			},
		}
	}
}

/// Abort handle of the dispatch's spawned pool task, held outside the
/// cancellable admit future. tokio only detaches a task whose
/// `JoinHandle` is dropped, so without this an externally cancelled
/// off-loop dispatch would leave its handler running on the pool.
#[derive(Default)]
struct PoolJob {
	abort_handle: Mutex<Option<AbortHandle>>,
}

impl PoolJob {
	fn track(&self, abort_handle: AbortHandle) {
		*self.abort_handle.lock().expect("pool job mutex poisoned") = Some(abort_handle);
	}

	fn abort(&self) {
		if let Some(abort_handle) = self.abort_handle.lock().expect("pool job mutex poisoned").take()
		{
			abort_handle.abort();
		}
	}
}

/// Periodic liveness task. The first pulse fires one full period in, and a
/// panic in `on_pulse` ends the heartbeat, never the dispatch.
struct Heartbeat {
	task: Option<JoinHandle<()>>,
}

impl Heartbeat {
	fn start<A: Adapter>(pulse_every: Duration, adapter: Arc<A>) -> Heartbeat {
		if pulse_every.is_zero() {
			return Heartbeat { task: None };
		}
		let task = tokio::spawn(async move {
			loop {
				tokio::time::sleep(pulse_every).await;
				adapter.on_pulse().await;
			}
		});
		Heartbeat { task: Some(task) }
	}

	/// Stops the heartbeat and waits until it is truly gone, so no pulse
	/// can interleave with the terminal callback.
	async fn stop(mut self) {
		if let Some(task) = self.task.take() {
			task.abort();
			if let Err(join_error) = task.await {
				if join_error.is_panic() {
					warn!("pulse callback panicked");
				}
			}
		}
	}
}

impl Drop for Heartbeat {
	fn drop(&mut self) {
		if let Some(task) = &self.task {
			task.abort();
		}
	}
}
