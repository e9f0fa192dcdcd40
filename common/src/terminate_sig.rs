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

use tokio_util::sync::CancellationToken;

/// A hierarchical kill switch.
///
/// Killing a signal kills all of its children, while killing a child leaves
/// its parent (and siblings) untouched. Observers either poll [`is_dead`]
/// at convenient points or await [`killed`] to react as soon as the switch
/// is flipped.
///
/// Cloning is cheap and all clones observe the same switch.
///
/// [`is_dead`]: TerminateSignal::is_dead
/// [`killed`]: TerminateSignal::killed
#[derive(Clone, Debug, Default)]
pub struct TerminateSignal {
	token: CancellationToken,
}

impl TerminateSignal {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a child signal. The child dies with its parent,
	/// the parent survives its children.
	pub fn child(&self) -> TerminateSignal {
		TerminateSignal { token: self.token.child_token() }
	}

	/// Flips the switch. Idempotent.
	pub fn kill(&self) {
		self.token.cancel();
	}

	pub fn is_dead(&self) -> bool {
		self.token.is_cancelled()
	}

	pub fn is_alive(&self) -> bool {
		!self.is_dead()
	}

	/// Resolves once the signal (or one of its ancestors) has been killed.
	pub async fn killed(&self) {
		self.token.cancelled().await
	}
}
