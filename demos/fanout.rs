//! # Example: fanout
//!
//! Demonstrates fan-out of published events to filtered subscribers.
//!
//! Shows how to:
//! - Implement the [`Handler`] trait and wrap closures with [`HandlerFn`].
//! - Filter per subscriber and bound its queue.
//! - Watch faults and lifecycle on the diagnostics channel.
//! - Unsubscribe at runtime and shut everything down gracefully.
//!
//! ## Flow
//! ```text
//! publish(order) ──► EventDistributor (snapshot)
//!     ├─► worker "ledger"  (all orders)           ──► Ledger.handle()
//!     ├─► worker "large"   (amount >= 100)        ──► closure
//!     └─► worker "flaky"   (fails on odd ids)     ──► HandlerFailed diagnostics
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=fanqueue=debug cargo run --example fanout
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use fanqueue::{
    EventDistributor, EventKind, Handler, HandlerError, HandlerFn, HandlerRef, OverflowPolicy,
    SubscribeOptions,
};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct Order {
    id: u64,
    amount: u64,
}

/// Keeps a running total of every order it sees.
#[derive(Default)]
struct Ledger {
    total: AtomicU64,
}

#[async_trait]
impl Handler<Order> for Ledger {
    async fn handle(&self, order: &Order) -> Result<(), HandlerError> {
        let total = self.total.fetch_add(order.amount, Ordering::Relaxed) + order.amount;
        println!("[ledger] order #{} amount={} total={}", order.id, order.amount, total);
        Ok(())
    }

    fn name(&self) -> &str {
        "ledger"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dist = EventDistributor::<Order>::default();

    let mut diag = dist.diagnostics();
    let watcher = tokio::spawn(async move {
        while let Ok(ev) = diag.recv().await {
            if ev.kind.is_fault() || ev.kind == EventKind::ItemDropped {
                println!(
                    "[diag] {} worker={} reason={}",
                    ev.kind.as_label(),
                    ev.worker.as_deref().unwrap_or("-"),
                    ev.reason.as_deref().unwrap_or("-")
                );
            }
        }
    });

    let ledger: HandlerRef<Order> = std::sync::Arc::new(Ledger::default());
    dist.subscribe(ledger.clone(), SubscribeOptions::new())?;

    let large: HandlerRef<Order> = HandlerFn::arc("large", |order: Order| async move {
        println!("[large] review order #{} ({})", order.id, order.amount);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok::<_, HandlerError>(())
    });
    dist.subscribe(
        large.clone(),
        SubscribeOptions::new()
            .with_filter(|order: &Order| order.amount >= 100)
            .with_capacity(2)
            .with_overflow(OverflowPolicy::DropOldest),
    )?;

    let flaky: HandlerRef<Order> = HandlerFn::arc("flaky", |order: Order| async move {
        if order.id % 2 == 1 {
            return Err(HandlerError::fail(format!("cannot export order #{}", order.id)));
        }
        Ok(())
    });
    dist.subscribe(flaky.clone(), SubscribeOptions::new())?;

    for id in 0..8u64 {
        let accepted = dist.publish(Order {
            id,
            amount: id * 40,
        });
        println!("[main] published order #{id} to {accepted} subscriber(s)");
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    if dist.unsubscribe(&flaky) {
        println!("[main] flaky unsubscribed; {} left", dist.len());
    }
    dist.publish(Order { id: 9, amount: 500 });

    dist.shutdown().await;
    drop(dist);
    watcher.await?;
    Ok(())
}
