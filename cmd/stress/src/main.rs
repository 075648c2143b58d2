//! workq-stress - Producer/consumer stress driver for the workq job queue.

mod runner;

use anyhow::{Result, bail};
use clap::Parser;

use runner::{Mode, StressConfig};

/// Producer/consumer stress driver for the workq job queue.
///
/// Producers push uniquely tagged jobs, consumers drain them with the
/// blocking wait-then-pop loop. Every job must arrive exactly once and each
/// consumer must see every producer's jobs in push order.
#[derive(Parser, Debug)]
#[command(name = "workq-stress")]
#[command(about = "Stress the workq job queue with concurrent producers and consumers")]
#[command(version)]
struct Args {
    /// Number of producer threads
    #[arg(short, long, default_value_t = 4)]
    producers: usize,

    /// Number of consumer threads
    #[arg(short, long, default_value_t = 4)]
    consumers: usize,

    /// Jobs pushed by each producer
    #[arg(short = 'n', long, default_value_t = 100_000)]
    items: usize,

    /// Use the byte queue with records of this many bytes (at least 16)
    #[arg(long)]
    byte_records: Option<usize>,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    if args.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    }

    if args.producers == 0 || args.consumers == 0 {
        bail!("need at least one producer and one consumer");
    }

    let mode = match args.byte_records {
        Some(size) if size < runner::MIN_RECORD_SIZE => {
            bail!("byte records must be at least {} bytes", runner::MIN_RECORD_SIZE)
        }
        Some(size) => Mode::Bytes(size),
        None => Mode::Typed,
    };

    let config = StressConfig {
        producers: args.producers,
        consumers: args.consumers,
        items_per_producer: args.items,
        mode,
    };

    let report = runner::run(&config)?;
    println!("{report}");
    Ok(())
}
