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

/// Where a route's handler runs.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ExecuteIn {
	/// Run the handler on the dispatch loop.
	///
	/// The default. Use it for async handlers, or for sync handlers fast
	/// enough not to stall the loop.
	#[default]
	Main,

	/// Run the handler on the shared io worker pool.
	///
	/// Use it for slow IO-bound handlers. The handler must be registered
	/// through [`crate::AddRoute::handler`] (sync shape).
	Thread,

	/// Run the handler on the shared cpu worker pool.
	///
	/// Use it for slow CPU-bound handlers. The handler must be registered
	/// through [`crate::AddRoute::handler`] (sync shape).
	Process,
}

impl ExecuteIn {
	/// Whether the handler leaves the dispatch loop.
	pub fn is_off_loop(&self) -> bool {
		!matches!(self, ExecuteIn::Main)
	}
}
