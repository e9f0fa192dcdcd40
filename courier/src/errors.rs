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

use std::{fmt, time::Duration};

use thiserror::Error;

/// Error raised by [`crate::Registry`] at configuration time.
///
/// This is the only error kind that escapes to the caller directly:
/// everything that goes wrong while handling a message is funneled through
/// the adapter callbacks instead.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RegistryError {
	#[error("registry is already sealed, cannot add more routes")]
	Sealed,
}

/// What went wrong while handling a message.
///
/// Delivered to [`crate::Adapter::on_failure`]. A deadline overrun is
/// deliberately reported here and not as a cancellation, so that operators
/// can tell a slow handler apart from an external abort.
#[derive(Debug, Error)]
pub enum HandleError {
	/// The handler returned an error (or panicked in a worker pool).
	#[error("handler failed: {0}")]
	Handler(anyhow::Error),

	/// The handler did not complete within the route's `job_timeout`.
	#[error("handler did not complete within {0:?}")]
	Timeout(Duration),

	/// The adapter could not produce the payload.
	#[error("payload could not be produced: {0}")]
	Payload(anyhow::Error),
}

/// Signal delivered to [`crate::Adapter::on_cancel`] when a dispatch is
/// aborted from the outside, either individually or because the whole
/// executor scope is being torn down.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "dispatch was cancelled")
	}
}

impl std::error::Error for Cancelled {}
