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

use tokio::sync::watch;

/// The write side of the two admission stages of one dispatch.
///
/// The actor clears `NoPressure` right after crossing the global gate and
/// `Start` right after crossing the per-route gate. Dropping the `Admission`
/// releases every stage still pending, so a dispatch that short-circuits
/// (no matching route, early failure, cancellation) can never leave an
/// `execute` caller parked forever.
pub(crate) struct Admission {
	no_pressure: watch::Sender<bool>,
	start: watch::Sender<bool>,
}

/// The read side handed to `execute` for the blocking `WaitFor` modes.
pub(crate) struct AdmissionWatch {
	no_pressure: watch::Receiver<bool>,
	start: watch::Receiver<bool>,
}

pub(crate) fn admission() -> (Admission, AdmissionWatch) {
	let (no_pressure_tx, no_pressure_rx) = watch::channel(false);
	let (start_tx, start_rx) = watch::channel(false);
	(
		Admission { no_pressure: no_pressure_tx, start: start_tx },
		AdmissionWatch { no_pressure: no_pressure_rx, start: start_rx },
	)
}

impl Admission {
	/// The dispatch crossed the global gate.
	pub(crate) fn clear_no_pressure(&self) {
		let _ = self.no_pressure.send(true);
	}

	/// The dispatch crossed the per-route gate.
	pub(crate) fn clear_start(&self) {
		let _ = self.start.send(true);
	}
}

impl AdmissionWatch {
	/// Resolves once the stage is cleared, or immediately if the dispatch
	/// is already past the point of ever clearing it.
	pub(crate) async fn no_pressure_cleared(mut self) {
		let _ = self.no_pressure.wait_for(|cleared| *cleared).await;
	}

	pub(crate) async fn start_cleared(mut self) {
		let _ = self.start.wait_for(|cleared| *cleared).await;
	}
}
