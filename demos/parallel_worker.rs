//! # Example: parallel_worker
//!
//! Demonstrates a standalone [`QueueWorker`] with bounded parallel dispatch.
//!
//! Shows how to:
//! - Spawn a worker without a distributor.
//! - Dispatch up to N items of a batch at once.
//! - Add a second handler and swap the filter at runtime.
//! - Stop the worker and wait for its leftovers.
//!
//! ## Run
//! ```bash
//! cargo run --example parallel_worker
//! ```

use std::time::{Duration, Instant};

use fanqueue::{Bus, Filter, HandlerError, HandlerFn, HandlerRef, QueueWorker, SubscribeOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let started = Instant::now();
    let slow: HandlerRef<u32> = HandlerFn::arc("resize", move |n: u32| async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        println!("[resize] image {n} done at {:?}", started.elapsed());
        Ok::<_, HandlerError>(())
    });

    let opts = SubscribeOptions::new()
        .with_name("thumbnails")
        .with_capacity(32)
        .with_max_parallelism(4)
        .with_poll_interval(Duration::from_millis(200));
    let worker = QueueWorker::spawn(slow, opts, Bus::default())?;

    let audit: HandlerRef<u32> = HandlerFn::arc("audit", |n: u32| async move {
        println!("[audit] image {n}");
        Ok::<_, HandlerError>(())
    });
    worker.register_handler(audit);

    for n in 0..8 {
        worker.enqueue(n);
    }

    worker.set_filter(Filter::new(|n: &u32| n % 2 == 0));
    for n in 8..12 {
        if !worker.enqueue(n) {
            println!("[main] image {n} filtered out");
        }
    }

    worker.shutdown().await;
    let stats = worker.stats();
    println!(
        "[main] {} stopped: enqueued={} dispatched={} filtered={} faults={}",
        worker.name(),
        stats.enqueued,
        stats.dispatched,
        stats.filtered,
        stats.faults
    );
    Ok(())
}
