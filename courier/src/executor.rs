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
	collections::HashMap,
	fmt,
	hash::Hash,
	sync::{atomic::Ordering, Arc},
};

use tracing::{debug, info, warn};

use crate::{
	actor::Actor,
	adapter::Adapter,
	admission::admission,
	execute_in::ExecuteIn,
	gate::Gate,
	metrics::{DispatchCounters, ExecutorMetrics, COURIER_METRICS},
	pool::WorkerPool,
	registry::{Registry, DEFAULT_MAX_JOBS},
	tasks::Tasks,
	wait_for::WaitFor,
};

/// Builds executor runs out of a registry.
///
/// The first call to [`Executor::run`] seals the registry for good; the
/// executor itself is reusable and every run gets its own gates, pools and
/// supervisor.
pub struct Executor<P, K, R> {
	registry: Arc<Registry<P, K, R>>,
	max_jobs: usize,
	max_threads: Option<usize>,
	max_processes: Option<usize>,
}

impl<P, K, R> Executor<P, K, R>
where
	P: Send + 'static,
	K: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
	R: Send + 'static,
{
	pub fn new(registry: Arc<Registry<P, K, R>>) -> Executor<P, K, R> {
		Executor {
			registry,
			max_jobs: DEFAULT_MAX_JOBS,
			max_threads: None,
			max_processes: None,
		}
	}

	/// Caps concurrently handled messages across all routes. Must be at
	/// least 1. Defaults to [`DEFAULT_MAX_JOBS`].
	pub fn max_jobs(mut self, max_jobs: usize) -> Self {
		assert!(max_jobs >= 1, "max_jobs must be at least 1");
		self.max_jobs = max_jobs;
		self
	}

	/// Sizes the io worker pool. Defaults to the number of CPUs + 4.
	pub fn max_threads(mut self, max_threads: usize) -> Self {
		assert!(max_threads >= 1, "max_threads must be at least 1");
		self.max_threads = Some(max_threads);
		self
	}

	/// Sizes the cpu worker pool. Defaults to the number of CPUs.
	pub fn max_processes(mut self, max_processes: usize) -> Self {
		assert!(max_processes >= 1, "max_processes must be at least 1");
		self.max_processes = Some(max_processes);
		self
	}

	/// Seals the registry and starts a run.
	///
	/// Worker pools are created only for the [`ExecuteIn`] variants some
	/// route actually requests. The returned [`RunningExecutor`] must be
	/// torn down with [`RunningExecutor::shutdown`] (drain) or
	/// [`RunningExecutor::abort`] (cancel, then drain).
	pub fn run(&self) -> anyhow::Result<RunningExecutor<P, K, R>> {
		let routes = self.registry.seal();
		info!(routes = routes.len(), max_jobs = self.max_jobs, "executor-start");
		let global_gate = Arc::new(Gate::new(self.max_jobs));
		let io_pool = if routes.iter().any(|(_, config)| config.execute_in == ExecuteIn::Thread) {
			Some(WorkerPool::io(self.max_threads.unwrap_or_else(|| num_cpus::get() + 4))?)
		} else {
			None
		};
		let cpu_pool = if routes.iter().any(|(_, config)| config.execute_in == ExecuteIn::Process)
		{
			Some(WorkerPool::cpu(self.max_processes.unwrap_or_else(num_cpus::get))?)
		} else {
			None
		};
		let counters = Arc::new(DispatchCounters::default());
		let mut actors = HashMap::with_capacity(routes.len());
		for (key, config) in routes {
			let pool = match config.execute_in {
				ExecuteIn::Main => None,
				ExecuteIn::Thread => io_pool.as_ref().map(WorkerPool::handle),
				ExecuteIn::Process => cpu_pool.as_ref().map(WorkerPool::handle),
			};
			let actor =
				Actor::new(key.clone(), config, Arc::clone(&global_gate), pool, Arc::clone(&counters));
			actors.insert(key, Arc::new(actor));
		}
		Ok(RunningExecutor {
			actors: Arc::new(actors),
			tasks: Tasks::new(),
			io_pool,
			cpu_pool,
			counters,
		})
	}
}

/// One live executor run: the immutable actor table, the supervisor
/// tracking fire-and-forget dispatches and the worker pools.
///
/// The actor table is read-only after start and shared without locking;
/// dropping the run without calling [`RunningExecutor::shutdown`] or
/// [`RunningExecutor::abort`] detaches the in-flight dispatches and
/// releases the pools best effort.
pub struct RunningExecutor<P, K, R> {
	actors: Arc<HashMap<K, Arc<Actor<P, K, R>>>>,
	tasks: Tasks,
	io_pool: Option<WorkerPool>,
	cpu_pool: Option<WorkerPool>,
	counters: Arc<DispatchCounters>,
}

impl<P, K, R> RunningExecutor<P, K, R>
where
	P: Send + 'static,
	K: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
	R: Send + 'static,
{
	/// Routes one message and returns whether a route matched.
	///
	/// The adapter's candidate keys are tried in order; on the first match
	/// the actor's handle runs, inline for [`WaitFor::Finish`] and as a
	/// supervised background task otherwise. When no key matches,
	/// `on_no_handler` runs and the call completes.
	pub async fn execute<A>(&self, adapter: A, wait_for: WaitFor) -> bool
	where
		A: Adapter<Payload = P, Key = K, Res = R>,
	{
		COURIER_METRICS.dispatches_total.inc();
		self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
		let mut matched = None;
		for key in adapter.get_keys() {
			if let Some(actor) = self.actors.get(&key) {
				matched = Some(actor);
				break;
			}
		}
		let Some(actor) = matched else {
			debug!("no-matching-route");
			COURIER_METRICS.no_handler_total.inc();
			self.counters.unrouted.fetch_add(1, Ordering::Relaxed);
			adapter.on_no_handler().await;
			return false;
		};
		let (admission, admitted) = admission();
		let terminate = self.tasks.terminate_sig().child();
		if wait_for == WaitFor::Finish {
			actor.handle(adapter, admission, terminate).await;
			return true;
		}
		let actor = Arc::clone(actor);
		self.tasks.start(async move {
			actor.handle(adapter, admission, terminate).await;
		});
		match wait_for {
			WaitFor::Nothing => {},
			WaitFor::NoPressure => admitted.no_pressure_cleared().await,
			WaitFor::Start => admitted.start_cleared().await,
			WaitFor::Finish => unreachable!("handled above"),
		}
		true
	}

	/// Fire-and-forget dispatch, [`WaitFor::Nothing`] spelled short.
	pub async fn schedule<A>(&self, adapter: A) -> bool
	where
		A: Adapter<Payload = P, Key = K, Res = R>,
	{
		self.execute(adapter, WaitFor::Nothing).await
	}

	/// Counts of this run so far.
	pub fn metrics(&self) -> ExecutorMetrics {
		self.counters.snapshot()
	}

	/// Drains every in-flight dispatch, then releases the pools.
	pub async fn shutdown(mut self) {
		debug!(outstanding = self.tasks.outstanding(), "executor-drain");
		self.tasks.wait().await;
		self.release_pools();
		info!(metrics = ?self.metrics(), "executor-stop");
	}

	/// Cancels every in-flight dispatch, waits for each to surface its
	/// `on_cancel`, then releases the pools.
	///
	/// This is the error-path teardown: a plain drain would hang on a
	/// stuck handler.
	pub async fn abort(mut self) {
		self.tasks.cancel();
		self.tasks.wait().await;
		self.release_pools();
		info!(metrics = ?self.metrics(), "executor-aborted");
	}
}

impl<P, K, R> RunningExecutor<P, K, R> {
	fn release_pools(&mut self) {
		if let Some(pool) = self.io_pool.take() {
			pool.release();
		}
		if let Some(pool) = self.cpu_pool.take() {
			pool.release();
		}
	}
}

impl<P, K, R> Drop for RunningExecutor<P, K, R> {
	fn drop(&mut self) {
		if self.io_pool.is_some() || self.cpu_pool.is_some() {
			warn!("running executor dropped without shutdown, releasing pools");
			self.release_pools();
		}
	}
}

#[cfg(test)]
mod tests {
	use std::{
		sync::{
			atomic::{AtomicBool, AtomicUsize, Ordering},
			Arc, Mutex,
		},
		time::Duration,
	};

	use super::*;
	use crate::{
		errors::RegistryError,
		tests::{Call, FailKind, TestMessage},
		Priority,
	};

	fn registry() -> Arc<Registry<String, String, String>> {
		Arc::new(Registry::new())
	}

	#[tokio::test]
	async fn test_execute_match_and_success() {
		let registry = registry();
		registry
			.add("upper".to_string())
			.handler(|payload: String| Ok(payload.to_uppercase()))
			.unwrap();
		let running = Executor::new(registry).run().unwrap();
		let (message, log) = TestMessage::new("upper", "hi");
		assert!(running.execute(message, WaitFor::Finish).await);
		let metrics = running.metrics();
		assert_eq!(metrics.dispatched, 1);
		assert_eq!(metrics.succeeded, 1);
		running.shutdown().await;
		assert_eq!(log.snapshot(), vec![Call::Ok("HI".to_string())]);
	}

	#[tokio::test]
	async fn test_execute_without_matching_route() {
		let registry = registry();
		registry
			.add("upper".to_string())
			.handler(|payload: String| Ok(payload.to_uppercase()))
			.unwrap();
		let running = Executor::new(registry).run().unwrap();
		let (message, log) = TestMessage::new("unknown", "hi");
		assert!(!running.execute(message, WaitFor::Finish).await);
		assert_eq!(running.metrics().unrouted, 1);
		running.shutdown().await;
		assert_eq!(log.snapshot(), vec![Call::NoHandler]);
	}

	#[tokio::test]
	async fn test_first_matching_key_wins() {
		let registry = registry();
		registry.add("b".to_string()).handler(|_: String| Ok("from-b".to_string())).unwrap();
		registry.add("c".to_string()).handler(|_: String| Ok("from-c".to_string())).unwrap();
		let running = Executor::new(registry).run().unwrap();
		let (message, log) = TestMessage::with_keys(&["a", "b", "c"], "hi");
		assert!(running.execute(message, WaitFor::Finish).await);
		running.shutdown().await;
		assert_eq!(log.snapshot(), vec![Call::Ok("from-b".to_string())]);
	}

	#[tokio::test]
	async fn test_handler_error_goes_to_on_failure() {
		let registry = registry();
		registry
			.add("upper".to_string())
			.handler(|_: String| Err::<String, _>(anyhow::anyhow!("boom")))
			.unwrap();
		let running = Executor::new(registry).run().unwrap();
		let (message, log) = TestMessage::new("upper", "hi");
		assert!(running.execute(message, WaitFor::Finish).await);
		running.shutdown().await;
		assert_eq!(log.snapshot(), vec![Call::Fail(FailKind::Handler)]);
	}

	#[tokio::test]
	async fn test_payload_failure_goes_to_on_failure() {
		let registry = registry();
		registry
			.add("upper".to_string())
			.handler(|payload: String| Ok(payload.to_uppercase()))
			.unwrap();
		let running = Executor::new(registry).run().unwrap();
		let (message, log) = TestMessage::with_failing_payload("upper");
		assert!(running.execute(message, WaitFor::Finish).await);
		running.shutdown().await;
		assert_eq!(log.snapshot(), vec![Call::Fail(FailKind::Payload)]);
	}

	#[tokio::test(start_paused = true)]
	async fn test_pulse_during_slow_handler() {
		let registry = registry();
		registry
			.add("upper".to_string())
			.pulse_every(Duration::from_millis(100))
			.async_handler(|payload: String| async move {
				tokio::time::sleep(Duration::from_millis(450)).await;
				Ok(payload.to_uppercase())
			})
			.unwrap();
		let running = Executor::new(registry).run().unwrap();
		let (message, log) = TestMessage::new("upper", "hi");
		assert!(running.execute(message, WaitFor::Finish).await);
		running.shutdown().await;
		// One pulse per elapsed period, none after the terminal callback.
		let mut expected = vec![Call::Pulse; 4];
		expected.push(Call::Ok("HI".to_string()));
		assert_eq!(log.snapshot(), expected);
	}

	#[tokio::test(start_paused = true)]
	async fn test_abort_cancels_dispatch_mid_handler() {
		let registry = registry();
		registry
			.add("upper".to_string())
			.async_handler(|_: String| async move {
				tokio::time::sleep(Duration::from_secs(2)).await;
				Ok("late".to_string())
			})
			.unwrap();
		let running = Executor::new(registry).run().unwrap();
		let (message, log) = TestMessage::new("upper", "hi");
		assert!(running.execute(message, WaitFor::Nothing).await);
		tokio::time::sleep(Duration::from_millis(100)).await;
		let teardown_started = tokio::time::Instant::now();
		running.abort().await;
		assert!(teardown_started.elapsed() < Duration::from_millis(100));
		assert_eq!(log.snapshot(), vec![Call::Cancel]);
	}

	#[tokio::test(start_paused = true)]
	async fn test_timeout_is_failure_not_cancellation() {
		let registry = registry();
		registry
			.add("upper".to_string())
			.job_timeout(Duration::from_millis(50))
			.async_handler(|payload: String| async move {
				tokio::time::sleep(Duration::from_millis(200)).await;
				Ok(payload)
			})
			.unwrap();
		let running = Executor::new(registry).run().unwrap();
		let (message, log) = TestMessage::new("upper", "hi");
		assert!(running.execute(message, WaitFor::Finish).await);
		running.shutdown().await;
		assert_eq!(log.snapshot(), vec![Call::Fail(FailKind::Timeout)]);
	}

	#[tokio::test]
	async fn test_abort_cancels_off_loop_dispatch_mid_handler() {
		let registry = registry();
		registry
			.add("upper".to_string())
			.execute_in(ExecuteIn::Thread)
			.handler(|payload: String| {
				std::thread::sleep(Duration::from_millis(500));
				Ok(payload)
			})
			.unwrap();
		let running = Executor::new(registry).run().unwrap();
		let (message, log) = TestMessage::new("upper", "hi");
		assert!(running.execute(message, WaitFor::Start).await);
		tokio::time::sleep(Duration::from_millis(50)).await;
		let teardown_started = std::time::Instant::now();
		running.abort().await;
		// The drain must not wait out the blocked worker.
		assert!(teardown_started.elapsed() < Duration::from_millis(250));
		assert_eq!(log.snapshot(), vec![Call::Cancel]);
	}

	#[tokio::test]
	async fn test_off_loop_timeout_is_failure() {
		let registry = registry();
		registry
			.add("upper".to_string())
			.execute_in(ExecuteIn::Thread)
			.job_timeout(Duration::from_millis(50))
			.handler(|payload: String| {
				std::thread::sleep(Duration::from_millis(300));
				Ok(payload)
			})
			.unwrap();
		let running = Executor::new(registry).run().unwrap();
		let (message, log) = TestMessage::new("upper", "hi");
		assert!(running.execute(message, WaitFor::Finish).await);
		running.shutdown().await;
		assert_eq!(log.snapshot(), vec![Call::Fail(FailKind::Timeout)]);
	}

	#[tokio::test]
	async fn test_round_trip_for_each_execute_in() {
		for execute_in in [ExecuteIn::Main, ExecuteIn::Thread, ExecuteIn::Process] {
			let registry = registry();
			registry
				.add("upper".to_string())
				.execute_in(execute_in)
				.handler(|payload: String| Ok(payload.to_uppercase()))
				.unwrap();
			let running = Executor::new(registry).run().unwrap();
			let (message, log) = TestMessage::new("upper", "hi");
			assert!(running.execute(message, WaitFor::Finish).await);
			running.shutdown().await;
			assert_eq!(log.snapshot(), vec![Call::Ok("HI".to_string())], "{execute_in:?}");
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_back_pressure_shapes_latency() {
		let registry = registry();
		registry
			.add("upper".to_string())
			.max_jobs(5)
			.async_handler(|payload: String| async move {
				tokio::time::sleep(Duration::from_millis(100)).await;
				Ok(payload.to_uppercase())
			})
			.unwrap();
		let running = Executor::new(registry).max_jobs(10).run().unwrap();
		let run_started = tokio::time::Instant::now();
		let mut logs = Vec::new();
		for _ in 0..14 {
			let (message, log) = TestMessage::new("upper", "hi");
			assert!(running.execute(message, WaitFor::Start).await);
			logs.push(log);
		}
		running.shutdown().await;
		let elapsed = run_started.elapsed();
		// Three waves of five under the per-route gate.
		assert!(
			elapsed >= Duration::from_millis(290) && elapsed <= Duration::from_millis(350),
			"elapsed: {elapsed:?}"
		);
		for log in logs {
			assert_eq!(log.snapshot(), vec![Call::Ok("HI".to_string())]);
		}
	}

	async fn saturated_latency(wait_for: WaitFor) -> Duration {
		let registry = registry();
		registry
			.add("upper".to_string())
			.max_jobs(1)
			.async_handler(|payload: String| async move {
				tokio::time::sleep(Duration::from_millis(100)).await;
				Ok(payload.to_uppercase())
			})
			.unwrap();
		let running = Executor::new(registry).max_jobs(2).run().unwrap();
		let (first, _first_log) = TestMessage::new("upper", "hi");
		assert!(running.execute(first, WaitFor::Nothing).await);
		// Let the first dispatch occupy both gates.
		tokio::time::sleep(Duration::from_millis(1)).await;

		let (probe, _probe_log) = TestMessage::new("upper", "hi");
		let probe_started = tokio::time::Instant::now();
		assert!(running.execute(probe, wait_for).await);
		let latency = probe_started.elapsed();
		running.shutdown().await;
		latency
	}

	#[tokio::test(start_paused = true)]
	async fn test_wait_for_latencies_are_monotone() {
		let mut latencies = Vec::new();
		for wait_for in [WaitFor::Nothing, WaitFor::NoPressure, WaitFor::Start, WaitFor::Finish] {
			latencies.push(saturated_latency(wait_for).await);
		}
		for pair in latencies.windows(2) {
			assert!(pair[0] <= pair[1], "latencies not monotone: {latencies:?}");
		}
		assert!(latencies[1] < Duration::from_millis(50));
		assert!(latencies[2] >= Duration::from_millis(90));
		assert!(latencies[3] >= Duration::from_millis(190));
	}

	#[tokio::test(start_paused = true)]
	async fn test_route_max_jobs_one_serializes() {
		let registry = registry();
		let running_now = Arc::new(AtomicUsize::new(0));
		let overlapped = Arc::new(AtomicBool::new(false));
		{
			let running_now = Arc::clone(&running_now);
			let overlapped = Arc::clone(&overlapped);
			registry
				.add("upper".to_string())
				.max_jobs(1)
				.async_handler(move |payload: String| {
					let running_now = Arc::clone(&running_now);
					let overlapped = Arc::clone(&overlapped);
					async move {
						if running_now.fetch_add(1, Ordering::SeqCst) > 0 {
							overlapped.store(true, Ordering::SeqCst);
						}
						tokio::time::sleep(Duration::from_millis(10)).await;
						running_now.fetch_sub(1, Ordering::SeqCst);
						Ok(payload.to_uppercase())
					}
				})
				.unwrap();
		}
		let running = Executor::new(registry).run().unwrap();
		let mut logs = Vec::new();
		for _ in 0..5 {
			let (message, log) = TestMessage::new("upper", "hi");
			assert!(running.schedule(message).await);
			logs.push(log);
		}
		running.shutdown().await;
		assert!(!overlapped.load(Ordering::SeqCst));
		for log in logs {
			assert_eq!(log.snapshot(), vec![Call::Ok("HI".to_string())]);
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_global_gate_bounds_inflight_handles() {
		let registry = registry();
		let running_now = Arc::new(AtomicUsize::new(0));
		let peak = Arc::new(AtomicUsize::new(0));
		{
			let running_now = Arc::clone(&running_now);
			let peak = Arc::clone(&peak);
			registry
				.add("upper".to_string())
				.async_handler(move |payload: String| {
					let running_now = Arc::clone(&running_now);
					let peak = Arc::clone(&peak);
					async move {
						let now_running = running_now.fetch_add(1, Ordering::SeqCst) + 1;
						peak.fetch_max(now_running, Ordering::SeqCst);
						tokio::time::sleep(Duration::from_millis(10)).await;
						running_now.fetch_sub(1, Ordering::SeqCst);
						Ok(payload.to_uppercase())
					}
				})
				.unwrap();
		}
		let running = Executor::new(registry).max_jobs(2).run().unwrap();
		for _ in 0..8 {
			let (message, _log) = TestMessage::new("upper", "hi");
			assert!(running.execute(message, WaitFor::Nothing).await);
		}
		running.shutdown().await;
		assert!(peak.load(Ordering::SeqCst) <= 2);
	}

	#[tokio::test(start_paused = true)]
	async fn test_high_priority_route_overtakes_at_global_gate() {
		let registry = registry();
		let order = Arc::new(Mutex::new(Vec::new()));
		registry
			.add("slow".to_string())
			.async_handler(|payload: String| async move {
				tokio::time::sleep(Duration::from_millis(100)).await;
				Ok(payload)
			})
			.unwrap();
		{
			let order = Arc::clone(&order);
			registry
				.add("normal".to_string())
				.async_handler(move |payload: String| {
					let order = Arc::clone(&order);
					async move {
						order.lock().unwrap().push("normal");
						Ok(payload)
					}
				})
				.unwrap();
		}
		{
			let order = Arc::clone(&order);
			registry
				.add("high".to_string())
				.priority(Priority::High)
				.async_handler(move |payload: String| {
					let order = Arc::clone(&order);
					async move {
						order.lock().unwrap().push("high");
						Ok(payload)
					}
				})
				.unwrap();
		}
		let running = Executor::new(registry).max_jobs(1).run().unwrap();
		let (slow, _slow_log) = TestMessage::new("slow", "x");
		assert!(running.execute(slow, WaitFor::Nothing).await);
		tokio::time::sleep(Duration::from_millis(1)).await;
		// The normal dispatch queues at the global gate first, the high
		// one still gets the permit before it.
		let (normal, _normal_log) = TestMessage::new("normal", "x");
		assert!(running.execute(normal, WaitFor::Nothing).await);
		tokio::time::sleep(Duration::from_millis(1)).await;
		let (high, _high_log) = TestMessage::new("high", "x");
		assert!(running.execute(high, WaitFor::Nothing).await);
		running.shutdown().await;
		assert_eq!(*order.lock().unwrap(), vec!["high", "normal"]);
	}

	#[tokio::test]
	async fn test_registry_is_sealed_while_running() {
		let registry = registry();
		registry.add("upper".to_string()).handler(|payload: String| Ok(payload)).unwrap();
		let running = Executor::new(Arc::clone(&registry)).run().unwrap();
		assert!(registry.is_sealed());
		let err =
			registry.add("other".to_string()).handler(|payload: String| Ok(payload)).unwrap_err();
		assert_eq!(err, RegistryError::Sealed);
		running.shutdown().await;
	}

	#[tokio::test]
	async fn test_metrics_count_terminal_outcomes() {
		let registry = registry();
		registry.add("ok".to_string()).handler(|payload: String| Ok(payload)).unwrap();
		registry
			.add("boom".to_string())
			.handler(|_: String| Err::<String, _>(anyhow::anyhow!("boom")))
			.unwrap();
		let running = Executor::new(registry).run().unwrap();
		let (ok_message, _ok_log) = TestMessage::new("ok", "hi");
		let (boom_message, _boom_log) = TestMessage::new("boom", "hi");
		let (lost_message, _lost_log) = TestMessage::new("unknown", "hi");
		assert!(running.execute(ok_message, WaitFor::Finish).await);
		assert!(running.execute(boom_message, WaitFor::Finish).await);
		assert!(!running.execute(lost_message, WaitFor::Finish).await);
		assert_eq!(
			running.metrics(),
			ExecutorMetrics { dispatched: 3, succeeded: 1, failed: 1, cancelled: 0, unrouted: 1 }
		);
		running.shutdown().await;
	}
}
