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

/// When [`crate::RunningExecutor::execute`] hands control back to the caller.
///
/// Under saturation the four modes produce strictly non-decreasing
/// call-return latencies, in declaration order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WaitFor {
	/// Return as soon as the handle task is enqueued in the supervisor.
	///
	/// Enough to be sure the message is eventually handled, but with no
	/// feedback on when. A consumer using this mode can easily fetch more
	/// messages than it can process.
	Nothing,

	/// Wait until the dispatch has cleared the global gate.
	///
	/// Basic back pressure: the call returns only when the engine as a
	/// whole has capacity. The message may still wait on the per-route
	/// gate if that route has its own `max_jobs` limit.
	#[default]
	NoPressure,

	/// Wait until the per-route gate has also admitted the dispatch and
	/// the handler is about to run.
	///
	/// The message will not sit in any queue after the call returns, but
	/// the wait can be long on a busy route.
	Start,

	/// Wait until the terminal callback has returned. The handle runs
	/// inline instead of being enqueued.
	///
	/// The strongest guarantee and the longest wait. Use it to process
	/// messages sequentially or to supervise jobs yourself.
	Finish,
}
