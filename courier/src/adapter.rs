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

use async_trait::async_trait;

use crate::errors::{Cancelled, HandleError};

/// The boundary between the engine and whatever transport feeds it.
///
/// An adapter wraps one source message (an HTTP request, a broker frame, a
/// plain function call) and receives the lifecycle callbacks for it. The
/// engine never retains an adapter past the completion of its handle call.
///
/// All callbacks run on the dispatch loop and take `&self`: adapters that
/// record state do so through interior mutability. Callback panics are the
/// caller's responsibility and propagate out of
/// [`crate::RunningExecutor::execute`]; they are never re-routed into
/// another callback.
#[async_trait]
pub trait Adapter: Send + Sync + 'static {
	type Payload: Send + 'static;
	type Key: Send;
	type Res: Send + 'static;

	/// Candidate routing keys, tried in order. The first key bound in the
	/// registry wins.
	fn get_keys(&self) -> Vec<Self::Key>;

	/// Produces the payload handed to the handler.
	async fn get_payload(&self) -> anyhow::Result<Self::Payload>;

	/// The handler completed. Exactly one of the three terminal callbacks
	/// runs per matched dispatch.
	async fn on_success(&self, result: Self::Res);

	/// The dispatch failed: handler error, payload error or deadline
	/// overrun (see [`HandleError`]).
	async fn on_failure(&self, error: HandleError);

	/// The dispatch was aborted from the outside.
	async fn on_cancel(&self, cancelled: Cancelled);

	/// Liveness pulse, emitted every `pulse_every` while the message is in
	/// flight and never after the terminal callback. A panic here ends the
	/// heartbeat, not the dispatch.
	async fn on_pulse(&self) {}

	/// No candidate key matched a route.
	async fn on_no_handler(&self) {}
}

/// Wraps another adapter and forwards every operation to it.
///
/// Implementers override the subset of operations they care about to add
/// cross-cutting behavior (logging, metrics, acking policies); the blanket
/// [`Adapter`] impl makes any middleware usable wherever an adapter is.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
	type Inner: Adapter;

	fn inner(&self) -> &Self::Inner;

	fn get_keys(&self) -> Vec<<Self::Inner as Adapter>::Key> {
		self.inner().get_keys()
	}

	async fn get_payload(&self) -> anyhow::Result<<Self::Inner as Adapter>::Payload> {
		self.inner().get_payload().await
	}

	async fn on_success(&self, result: <Self::Inner as Adapter>::Res) {
		self.inner().on_success(result).await
	}

	async fn on_failure(&self, error: HandleError) {
		self.inner().on_failure(error).await
	}

	async fn on_cancel(&self, cancelled: Cancelled) {
		self.inner().on_cancel(cancelled).await
	}

	async fn on_pulse(&self) {
		self.inner().on_pulse().await
	}

	async fn on_no_handler(&self) {
		self.inner().on_no_handler().await
	}
}

#[async_trait]
impl<M: Middleware> Adapter for M {
	type Payload = <M::Inner as Adapter>::Payload;
	type Key = <M::Inner as Adapter>::Key;
	type Res = <M::Inner as Adapter>::Res;

	fn get_keys(&self) -> Vec<Self::Key> {
		Middleware::get_keys(self)
	}

	async fn get_payload(&self) -> anyhow::Result<Self::Payload> {
		Middleware::get_payload(self).await
	}

	async fn on_success(&self, result: Self::Res) {
		Middleware::on_success(self, result).await
	}

	async fn on_failure(&self, error: HandleError) {
		Middleware::on_failure(self, error).await
	}

	async fn on_cancel(&self, cancelled: Cancelled) {
		Middleware::on_cancel(self, cancelled).await
	}

	async fn on_pulse(&self) {
		Middleware::on_pulse(self).await
	}

	async fn on_no_handler(&self) {
		Middleware::on_no_handler(self).await
	}
}
