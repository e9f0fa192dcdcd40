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
	future::Future,
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc, Mutex,
	},
	time::Duration,
};

use futures::{future::BoxFuture, FutureExt};
use tracing::debug;

use crate::{errors::RegistryError, execute_in::ExecuteIn, gate::Priority};

pub const DEFAULT_MAX_JOBS: usize = 16;
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(32);

/// The two statically distinguished handler shapes, so dispatch never has
/// to probe the return value at runtime.
pub(crate) enum HandlerFn<P, R> {
	Sync(Arc<dyn Fn(P) -> anyhow::Result<R> + Send + Sync>),
	Async(Arc<dyn Fn(P) -> BoxFuture<'static, anyhow::Result<R>> + Send + Sync>),
}

impl<P, R> Clone for HandlerFn<P, R> {
	fn clone(&self) -> Self {
		match self {
			HandlerFn::Sync(handler) => HandlerFn::Sync(Arc::clone(handler)),
			HandlerFn::Async(handler) => HandlerFn::Async(Arc::clone(handler)),
		}
	}
}

impl<P, R> fmt::Debug for HandlerFn<P, R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			HandlerFn::Sync(_) => write!(f, "HandlerFn::Sync(..)"),
			HandlerFn::Async(_) => write!(f, "HandlerFn::Async(..)"),
		}
	}
}

/// Immutable per-route parameters, stored by the registry and embedded in
/// the actor at executor start.
pub(crate) struct ActorConfig<P, R> {
	pub(crate) handler: HandlerFn<P, R>,
	pub(crate) max_jobs: usize,
	pub(crate) job_timeout: Duration,
	pub(crate) pulse_every: Duration,
	pub(crate) execute_in: ExecuteIn,
	pub(crate) priority: Priority,
}

// Not derived: a derive would demand `P: Clone` and `R: Clone`, which the
// payload and result types never need to be.
impl<P, R> Clone for ActorConfig<P, R> {
	fn clone(&self) -> Self {
		ActorConfig {
			handler: self.handler.clone(),
			max_jobs: self.max_jobs,
			job_timeout: self.job_timeout,
			pulse_every: self.pulse_every,
			execute_in: self.execute_in,
			priority: self.priority,
		}
	}
}

/// The routing table binding keys to handler configurations.
///
/// Mutable through [`Registry::add`] until the first executor run seals it;
/// sealed for the entire lifetime of any running executor built from it.
/// Routes keep their insertion order for deterministic diagnostics, lookups
/// are by exact key equality. Adding a key twice overwrites the previous
/// entry (last wins).
pub struct Registry<P, K, R> {
	routes: Mutex<Vec<(K, ActorConfig<P, R>)>>,
	sealed: AtomicBool,
}

impl<P, K, R> Registry<P, K, R>
where
	K: PartialEq + fmt::Debug,
{
	pub fn new() -> Registry<P, K, R> {
		Registry { routes: Mutex::new(Vec::new()), sealed: AtomicBool::new(false) }
	}

	/// Starts registering a handler for `key`.
	///
	/// The returned builder carries the route parameters; the route is
	/// stored once one of its registration methods ([`AddRoute::handler`]
	/// or [`AddRoute::async_handler`]) is called.
	#[must_use = "the route is only stored once a handler is attached"]
	pub fn add(&self, key: K) -> AddRoute<'_, P, K, R> {
		AddRoute {
			registry: self,
			key,
			max_jobs: DEFAULT_MAX_JOBS,
			job_timeout: DEFAULT_JOB_TIMEOUT,
			pulse_every: Duration::ZERO,
			execute_in: ExecuteIn::default(),
			priority: Priority::default(),
		}
	}

	pub fn is_sealed(&self) -> bool {
		self.sealed.load(Ordering::Acquire)
	}

	pub fn len(&self) -> usize {
		self.routes.lock().expect("registry mutex poisoned").len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Seals the registry and snapshots its routes, in insertion order.
	pub(crate) fn seal(&self) -> Vec<(K, ActorConfig<P, R>)>
	where
		K: Clone,
	{
		let routes = self.routes.lock().expect("registry mutex poisoned");
		self.sealed.store(true, Ordering::Release);
		routes.clone()
	}

	fn insert(&self, key: K, config: ActorConfig<P, R>) -> Result<(), RegistryError> {
		let mut routes = self.routes.lock().expect("registry mutex poisoned");
		if self.sealed.load(Ordering::Acquire) {
			return Err(RegistryError::Sealed);
		}
		if let Some(route) = routes.iter_mut().find(|(existing, _)| *existing == key) {
			debug!(key = ?key, "route-overwritten");
			route.1 = config;
		} else {
			routes.push((key, config));
		}
		Ok(())
	}
}

impl<P, K, R> Default for Registry<P, K, R>
where
	K: PartialEq + fmt::Debug,
{
	fn default() -> Self {
		Self::new()
	}
}

/// Builder returned by [`Registry::add`].
#[must_use = "the route is only stored once a handler is attached"]
pub struct AddRoute<'a, P, K, R> {
	registry: &'a Registry<P, K, R>,
	key: K,
	max_jobs: usize,
	job_timeout: Duration,
	pulse_every: Duration,
	execute_in: ExecuteIn,
	priority: Priority,
}

impl<P, K, R> AddRoute<'_, P, K, R>
where
	P: Send + 'static,
	K: PartialEq + fmt::Debug,
	R: Send + 'static,
{
	/// Caps the number of concurrently handled messages for this route.
	/// Must be at least 1. Defaults to [`DEFAULT_MAX_JOBS`].
	pub fn max_jobs(mut self, max_jobs: usize) -> Self {
		assert!(max_jobs >= 1, "max_jobs must be at least 1");
		self.max_jobs = max_jobs;
		self
	}

	/// Deadline for a single handler invocation. Must be positive.
	/// Defaults to [`DEFAULT_JOB_TIMEOUT`].
	pub fn job_timeout(mut self, job_timeout: Duration) -> Self {
		assert!(!job_timeout.is_zero(), "job_timeout must be positive");
		self.job_timeout = job_timeout;
		self
	}

	/// Interval between liveness pulses while a message is in flight.
	/// Zero (the default) disables the heartbeat.
	pub fn pulse_every(mut self, pulse_every: Duration) -> Self {
		self.pulse_every = pulse_every;
		self
	}

	/// Where the handler runs. Defaults to [`ExecuteIn::Main`].
	pub fn execute_in(mut self, execute_in: ExecuteIn) -> Self {
		self.execute_in = execute_in;
		self
	}

	/// Admission priority at the global gate. Defaults to
	/// [`Priority::Normal`].
	pub fn priority(mut self, priority: Priority) -> Self {
		self.priority = priority;
		self
	}

	/// Registers a sync handler. Valid for every [`ExecuteIn`] variant.
	pub fn handler<F>(self, handler: F) -> Result<(), RegistryError>
	where
		F: Fn(P) -> anyhow::Result<R> + Send + Sync + 'static,
	{
		self.finish(HandlerFn::Sync(Arc::new(handler)))
	}

	/// Registers an async handler. Only valid on [`ExecuteIn::Main`]
	/// routes: worker pools run plain functions, not futures.
	pub fn async_handler<F, Fut>(self, handler: F) -> Result<(), RegistryError>
	where
		F: Fn(P) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
	{
		assert!(
			!self.execute_in.is_off_loop(),
			"handlers executed in a worker pool must be synchronous"
		);
		self.finish(HandlerFn::Async(Arc::new(move |payload| handler(payload).boxed())))
	}

	fn finish(self, handler: HandlerFn<P, R>) -> Result<(), RegistryError> {
		let config = ActorConfig {
			handler,
			max_jobs: self.max_jobs,
			job_timeout: self.job_timeout,
			pulse_every: self.pulse_every,
			execute_in: self.execute_in,
			priority: self.priority,
		};
		self.registry.insert(self.key, config)
	}
}
