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

use std::sync::atomic::{AtomicU64, Ordering};

use common::metrics::{new_counter, new_gauge, GaugeGuard, IntCounter, IntGauge};
use once_cell::sync::Lazy;
use serde::Serialize;

/// Process-wide prometheus metrics of the dispatch engine.
pub struct CourierMetrics {
	pub dispatches_total: IntCounter,
	pub success_total: IntCounter,
	pub failure_total: IntCounter,
	pub cancel_total: IntCounter,
	pub no_handler_total: IntCounter,
	pub inflight_jobs: IntGauge,
}

impl Default for CourierMetrics {
	fn default() -> Self {
		CourierMetrics {
			dispatches_total: new_counter(
				"dispatches_total",
				"Number of messages submitted for dispatch.",
				"courier",
			),
			success_total: new_counter(
				"success_total",
				"Number of dispatches that reached on_success.",
				"courier",
			),
			failure_total: new_counter(
				"failure_total",
				"Number of dispatches that reached on_failure.",
				"courier",
			),
			cancel_total: new_counter(
				"cancel_total",
				"Number of dispatches that reached on_cancel.",
				"courier",
			),
			no_handler_total: new_counter(
				"no_handler_total",
				"Number of messages no route matched.",
				"courier",
			),
			inflight_jobs: new_gauge(
				"inflight_jobs",
				"Number of handlers currently running.",
				"courier",
			),
		}
	}
}

pub static COURIER_METRICS: Lazy<CourierMetrics> = Lazy::new(CourierMetrics::default);

pub(crate) fn inflight_guard() -> GaugeGuard {
	GaugeGuard::from_gauge(&COURIER_METRICS.inflight_jobs)
}

/// Per-run dispatch counts, incremented as dispatches reach their terminal
/// callback.
#[derive(Debug, Default)]
pub(crate) struct DispatchCounters {
	pub(crate) dispatched: AtomicU64,
	pub(crate) succeeded: AtomicU64,
	pub(crate) failed: AtomicU64,
	pub(crate) cancelled: AtomicU64,
	pub(crate) unrouted: AtomicU64,
}

impl DispatchCounters {
	pub(crate) fn snapshot(&self) -> ExecutorMetrics {
		ExecutorMetrics {
			dispatched: self.dispatched.load(Ordering::Relaxed),
			succeeded: self.succeeded.load(Ordering::Relaxed),
			failed: self.failed.load(Ordering::Relaxed),
			cancelled: self.cancelled.load(Ordering::Relaxed),
			unrouted: self.unrouted.load(Ordering::Relaxed),
		}
	}
}

/// Snapshot of the counts of one executor run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ExecutorMetrics {
	pub dispatched: u64,
	pub succeeded: u64,
	pub failed: u64,
	pub cancelled: u64,
	pub unrouted: u64,
}
