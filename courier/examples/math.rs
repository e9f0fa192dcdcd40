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

//! Routes arithmetic operations through the dispatch engine, one route per
//! operator. Shows the three handler placements and the failure callbacks.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use courier::{Adapter, Cancelled, ExecuteIn, Executor, HandleError, Registry, WaitFor};

type Operands = (i64, i64);

struct Calculation {
	left: i64,
	op: String,
	right: i64,
}

#[async_trait]
impl Adapter for Calculation {
	type Payload = Operands;
	type Key = String;
	type Res = f64;

	fn get_keys(&self) -> Vec<String> {
		vec![self.op.clone()]
	}

	async fn get_payload(&self) -> anyhow::Result<Operands> {
		Ok((self.left, self.right))
	}

	async fn on_success(&self, result: f64) {
		println!("SUCCESS: {} {} {} = {result}", self.left, self.op, self.right);
	}

	async fn on_failure(&self, error: HandleError) {
		println!("FAILURE: {} {} {} caused {error}", self.left, self.op, self.right);
	}

	async fn on_cancel(&self, _cancelled: Cancelled) {
		println!("CANCELED: {} {} {}", self.left, self.op, self.right);
	}

	async fn on_no_handler(&self) {
		println!("UNKNOWN OPERATOR: {}", self.op);
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let registry = Arc::new(Registry::new());
	registry
		.add("+".to_string())
		.handler(|(left, right): Operands| Ok((left + right) as f64))?;
	registry
		.add("/".to_string())
		.execute_in(ExecuteIn::Process)
		.handler(|(left, right): Operands| {
			if right == 0 {
				anyhow::bail!("division by zero");
			}
			Ok(left as f64 / right as f64)
		})?;
	registry
		.add("-".to_string())
		.async_handler(|(left, right): Operands| async move {
			tokio::time::sleep(Duration::from_secs(1)).await;
			Ok((left - right) as f64)
		})?;

	let running = Executor::new(registry).run()?;
	let calculations = vec![
		Calculation { left: 3, op: "-".to_string(), right: 2 },
		Calculation { left: 4, op: "+".to_string(), right: 5 },
		Calculation { left: 3, op: "/".to_string(), right: 2 },
		Calculation { left: 3, op: "/".to_string(), right: 0 },
		Calculation { left: 3, op: "%".to_string(), right: 0 },
	];
	for calculation in calculations {
		running.execute(calculation, WaitFor::Finish).await;
	}
	running.shutdown().await;
	Ok(())
}
