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
	collections::VecDeque,
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc, Mutex,
	},
};

use tokio::sync::Notify;

/// Admission policy of a route at the global gate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Priority {
	/// Plain FIFO admission.
	#[default]
	Normal,

	/// Overtakes `Normal` waiters: under contention a `High` acquisition is
	/// scheduled at or before any `Normal` waiter observed at the same
	/// time. FIFO among `High` waiters.
	High,
}

/// The executor-wide gate bounding concurrent in-flight handles.
///
/// A semaphore with two FIFO waiter queues. Releases hand the permit to the
/// oldest `High` waiter, then to the oldest `Normal` one. Waiters whose
/// acquire future was dropped mid-wait never hold a slot: the queue entry is
/// marked abandoned and skipped, and a permit that was already granted to a
/// vanished waiter is offered again.
pub(crate) struct Gate {
	state: Mutex<GateState>,
}

struct GateState {
	permits: usize,
	high: VecDeque<Arc<Waiter>>,
	normal: VecDeque<Arc<Waiter>>,
}

#[derive(Default)]
struct Waiter {
	granted: AtomicBool,
	abandoned: AtomicBool,
	notify: Notify,
}

impl GateState {
	fn queue(&mut self, priority: Priority) -> &mut VecDeque<Arc<Waiter>> {
		match priority {
			Priority::High => &mut self.high,
			Priority::Normal => &mut self.normal,
		}
	}

	fn next_waiter(&mut self) -> Option<Arc<Waiter>> {
		self.high.pop_front().or_else(|| self.normal.pop_front())
	}
}

impl Gate {
	pub(crate) fn new(permits: usize) -> Gate {
		Gate {
			state: Mutex::new(GateState {
				permits,
				high: VecDeque::new(),
				normal: VecDeque::new(),
			}),
		}
	}

	/// Acquires a permit under `priority`, parking in the matching queue if
	/// none is available. The permit is released when the returned guard is
	/// dropped, on every exit path.
	pub(crate) async fn acquire(self: Arc<Self>, priority: Priority) -> GatePermit {
		let waiter = {
			let mut state = self.state.lock().expect("gate mutex poisoned");
			if state.permits > 0 {
				state.permits -= 1;
				drop(state);
				return GatePermit { gate: self };
			}
			let waiter = Arc::new(Waiter::default());
			state.queue(priority).push_back(Arc::clone(&waiter));
			waiter
		};
		let mut guard = AbandonGuard { gate: &self, waiter: &waiter, armed: true };
		loop {
			let notified = waiter.notify.notified();
			if waiter.granted.load(Ordering::Acquire) {
				break;
			}
			notified.await;
		}
		guard.armed = false;
		drop(guard);
		GatePermit { gate: self }
	}

	/// Hands the freed permit to the oldest live waiter, `High` first.
	fn release(&self) {
		let mut state = self.state.lock().expect("gate mutex poisoned");
		while let Some(waiter) = state.next_waiter() {
			if waiter.abandoned.load(Ordering::Relaxed) {
				continue;
			}
			waiter.granted.store(true, Ordering::Release);
			waiter.notify.notify_one();
			return;
		}
		state.permits += 1;
	}

	#[cfg(test)]
	fn available_permits(&self) -> usize {
		self.state.lock().expect("gate mutex poisoned").permits
	}
}

/// Marks the queue entry abandoned if the acquire future is dropped before
/// the grant was observed; a grant that raced the drop is passed on.
struct AbandonGuard<'a> {
	gate: &'a Arc<Gate>,
	waiter: &'a Arc<Waiter>,
	armed: bool,
}

impl Drop for AbandonGuard<'_> {
	fn drop(&mut self) {
		if !self.armed {
			return;
		}
		let granted = {
			let _state = self.gate.state.lock().expect("gate mutex poisoned");
			if self.waiter.granted.load(Ordering::Acquire) {
				true
			} else {
				self.waiter.abandoned.store(true, Ordering::Relaxed);
				false
			}
		};
		if granted {
			self.gate.release();
		}
	}
}

pub(crate) struct GatePermit {
	gate: Arc<Gate>,
}

impl Drop for GatePermit {
	fn drop(&mut self) {
		self.gate.release();
	}
}
