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

use std::collections::HashMap;

use prometheus::{Encoder, Opts, TextEncoder};
pub use prometheus::{IntCounter, IntCounterVec as PrometheusIntCounterVec, IntGauge};
use tracing::warn;

#[derive(Clone)]
pub struct IntCounterVec<const N: usize> {
	underlying: PrometheusIntCounterVec,
}

impl<const N: usize> IntCounterVec<N> {
	pub fn with_label_values(&self, label_values: [&str; N]) -> IntCounter {
		self.underlying.with_label_values(&label_values)
	}
}

pub fn new_counter(name: &str, help: &str, namespace: &str) -> IntCounter {
	let counter = IntCounter::with_opts(Opts::new(name, help).namespace(namespace))
		.expect("failed to create counter");
	prometheus::register(Box::new(counter.clone())).expect("failed to register counter");
	counter
}

pub fn new_counter_vec<const N: usize>(
	name: &str,
	help: &str,
	namespace: &str,
	const_labels: &[(&str, &str)],
	label_names: [&str; N],
) -> IntCounterVec<N> {
	let owned_const_labels: HashMap<String, String> = const_labels
		.iter()
		.map(|(label_name, label_value)| (label_name.to_string(), label_value.to_string()))
		.collect();
	let counter_opts = Opts::new(name, help).namespace(namespace).const_labels(owned_const_labels);
	let underlying = PrometheusIntCounterVec::new(counter_opts, &label_names)
		.expect("failed to create counter vec");

	let collector = Box::new(underlying.clone());
	prometheus::register(collector).expect("failed to register counter vec");

	IntCounterVec { underlying }
}

pub fn new_gauge(name: &str, help: &str, namespace: &str) -> IntGauge {
	let gauge = IntGauge::with_opts(Opts::new(name, help).namespace(namespace))
		.expect("failed to create gauge");
	prometheus::register(Box::new(gauge.clone())).expect("failed to register gauge");
	gauge
}

/// Increments a gauge for as long as the guard is alive.
pub struct GaugeGuard {
	gauge: &'static IntGauge,
}

impl GaugeGuard {
	pub fn from_gauge(gauge: &'static IntGauge) -> GaugeGuard {
		gauge.inc();
		GaugeGuard { gauge }
	}
}

impl Drop for GaugeGuard {
	fn drop(&mut self) {
		self.gauge.dec();
	}
}

/// Renders every registered metric in the prometheus text format.
/// Families that fail to encode are logged and left out.
pub fn metrics_text_payload() -> String {
	let mut buffer = Vec::new();
	if let Err(error) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
		warn!(error = %error, "failed to encode metrics");
	}
	String::from_utf8_lossy(&buffer).to_string()
}
