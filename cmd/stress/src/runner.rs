//! Stress run: spawn producers and consumers, then verify delivery.

use std::collections::HashSet;
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail};
use workq_queue::{ByteQueue, Queue, QueueConfig};

/// Smallest byte record that can carry a [`Job`] tag.
pub const MIN_RECORD_SIZE: usize = 16;

/// Which queue flavour to stress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Typed,
    Bytes(usize),
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Typed => write!(f, "typed"),
            Mode::Bytes(size) => write!(f, "bytes({size})"),
        }
    }
}

/// Parameters of one stress run.
#[derive(Debug, Clone)]
pub struct StressConfig {
    pub producers: usize,
    pub consumers: usize,
    pub items_per_producer: usize,
    pub mode: Mode,
}

impl StressConfig {
    /// Total number of jobs pushed across all producers.
    fn total(&self) -> Result<usize> {
        match self.producers.checked_mul(self.items_per_producer) {
            Some(total) => Ok(total),
            None => bail!(
                "{} producers x {} items overflows the job count",
                self.producers,
                self.items_per_producer
            ),
        }
    }
}

/// A job tagged with its producer and per-producer sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Job {
    pub producer: u64,
    pub seq: u64,
}

impl Job {
    fn encode(&self, size: usize) -> Vec<u8> {
        let mut record = vec![0u8; size];
        record[..8].copy_from_slice(&self.producer.to_le_bytes());
        record[8..16].copy_from_slice(&self.seq.to_le_bytes());
        record
    }

    fn decode(record: &[u8]) -> Job {
        let mut producer = [0u8; 8];
        let mut seq = [0u8; 8];
        producer.copy_from_slice(&record[..8]);
        seq.copy_from_slice(&record[8..16]);
        Job {
            producer: u64::from_le_bytes(producer),
            seq: u64::from_le_bytes(seq),
        }
    }
}

/// Queue operations the stress run needs from either flavour.
trait JobChannel: Clone + Send + 'static {
    fn push_job(&self, job: Job);
    fn pop_job(&self) -> Job;
    fn capacity(&self) -> usize;
    fn is_empty(&self) -> bool;
}

impl JobChannel for Queue<Job> {
    fn push_job(&self, job: Job) {
        self.push(job);
    }

    fn pop_job(&self) -> Job {
        self.pop_wait()
    }

    fn capacity(&self) -> usize {
        Queue::capacity(self)
    }

    fn is_empty(&self) -> bool {
        Queue::is_empty(self)
    }
}

impl JobChannel for ByteQueue {
    fn push_job(&self, job: Job) {
        self.push(&job.encode(self.item_size()));
    }

    fn pop_job(&self) -> Job {
        Job::decode(&self.pop_wait())
    }

    fn capacity(&self) -> usize {
        ByteQueue::capacity(self)
    }

    fn is_empty(&self) -> bool {
        ByteQueue::is_empty(self)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct Report {
    pub mode: Mode,
    pub producers: usize,
    pub consumers: usize,
    pub jobs: usize,
    pub capacity: usize,
    pub elapsed: Duration,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.elapsed.as_secs_f64();
        let rate = if secs > 0.0 { self.jobs as f64 / secs } else { 0.0 };
        write!(
            f,
            "ok mode={} producers={} consumers={} jobs={} capacity={} elapsed={:.1}ms rate={:.0} jobs/s",
            self.mode,
            self.producers,
            self.consumers,
            self.jobs,
            self.capacity,
            secs * 1000.0,
            rate,
        )
    }
}

/// Runs the configured stress test and verifies every delivery.
pub fn run(config: &StressConfig) -> Result<Report> {
    config.total()?;
    let queue_config = QueueConfig::new().wait_signal(true).name("stress");
    match config.mode {
        Mode::Typed => drive(Queue::<Job>::with_config(queue_config), config),
        Mode::Bytes(size) => {
            if size < MIN_RECORD_SIZE {
                bail!("byte records must be at least {MIN_RECORD_SIZE} bytes");
            }
            drive(ByteQueue::with_config(size, queue_config), config)
        }
    }
}

fn drive<C: JobChannel>(channel: C, config: &StressConfig) -> Result<Report> {
    let total = config.total()?;
    tracing::info!(
        mode = %config.mode,
        producers = config.producers,
        consumers = config.consumers,
        total,
        "starting stress run"
    );
    let start = Instant::now();

    let producers: Vec<_> = (0..config.producers)
        .map(|producer| {
            let channel = channel.clone();
            let items = config.items_per_producer as u64;
            thread::spawn(move || {
                for seq in 0..items {
                    channel.push_job(Job {
                        producer: producer as u64,
                        seq,
                    });
                }
            })
        })
        .collect();

    // Each consumer waits exactly as many times as it pops.
    let consumers: Vec<_> = (0..config.consumers)
        .map(|i| {
            let channel = channel.clone();
            let share = total / config.consumers + usize::from(i < total % config.consumers);
            thread::spawn(move || (0..share).map(|_| channel.pop_job()).collect::<Vec<_>>())
        })
        .collect();

    for handle in producers {
        handle
            .join()
            .map_err(|_| anyhow!("producer thread panicked"))?;
    }
    let mut received = Vec::with_capacity(consumers.len());
    for handle in consumers {
        received.push(
            handle
                .join()
                .map_err(|_| anyhow!("consumer thread panicked"))?,
        );
    }
    let elapsed = start.elapsed();

    verify(&received, config)?;
    if !channel.is_empty() {
        bail!("queue not empty after all jobs were consumed");
    }

    let report = Report {
        mode: config.mode,
        producers: config.producers,
        consumers: config.consumers,
        jobs: total,
        capacity: channel.capacity(),
        elapsed,
    };
    tracing::debug!(capacity = report.capacity, ?elapsed, "stress run verified");
    Ok(report)
}

/// Checks exactly-once delivery and per-consumer FIFO order.
fn verify(received: &[Vec<Job>], config: &StressConfig) -> Result<()> {
    let total = config.total()?;
    let mut seen = HashSet::with_capacity(total);

    for (consumer, jobs) in received.iter().enumerate() {
        let mut last = vec![None; config.producers];
        for job in jobs {
            let producer = job.producer as usize;
            if producer >= config.producers || job.seq >= config.items_per_producer as u64 {
                bail!("consumer {consumer} received unknown job {job:?}");
            }
            if let Some(prev) = last[producer] {
                if job.seq <= prev {
                    bail!("consumer {consumer} received {job:?} after seq {prev}");
                }
            }
            last[producer] = Some(job.seq);
            if !seen.insert(*job) {
                bail!("job {job:?} delivered twice");
            }
        }
    }

    if seen.len() != total {
        bail!("received {} of {} jobs", seen.len(), total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: Mode) -> StressConfig {
        StressConfig {
            producers: 3,
            consumers: 2,
            items_per_producer: 500,
            mode,
        }
    }

    #[test]
    fn test_typed_run() {
        let report = run(&config(Mode::Typed)).unwrap();
        assert_eq!(report.jobs, 1500);
        assert!(report.capacity.is_power_of_two());
    }

    #[test]
    fn test_byte_run() {
        let report = run(&config(Mode::Bytes(24))).unwrap();
        assert_eq!(report.jobs, 1500);
        assert!(report.to_string().contains("mode=bytes(24)"));
    }

    #[test]
    fn test_record_too_small() {
        assert!(run(&config(Mode::Bytes(8))).is_err());
    }

    #[test]
    fn test_job_count_overflow() {
        let cfg = StressConfig {
            producers: 2,
            consumers: 1,
            items_per_producer: usize::MAX,
            mode: Mode::Typed,
        };
        let err = run(&cfg).unwrap_err();
        assert!(err.to_string().contains("overflows the job count"));
    }

    #[test]
    fn test_job_encoding() {
        let job = Job {
            producer: 7,
            seq: 123_456,
        };
        let record = job.encode(MIN_RECORD_SIZE);
        assert_eq!(record.len(), MIN_RECORD_SIZE);
        assert_eq!(Job::decode(&record), job);
    }

    #[test]
    fn test_verify_rejects_duplicates() {
        let cfg = StressConfig {
            producers: 1,
            consumers: 2,
            items_per_producer: 2,
            mode: Mode::Typed,
        };
        let job = |seq| Job { producer: 0, seq };
        let received = vec![vec![job(0), job(1)], vec![job(1)]];
        let err = verify(&received, &cfg).unwrap_err();
        assert!(err.to_string().contains("delivered twice"));
    }

    #[test]
    fn test_verify_rejects_reordering() {
        let cfg = StressConfig {
            producers: 1,
            consumers: 1,
            items_per_producer: 2,
            mode: Mode::Typed,
        };
        let job = |seq| Job { producer: 0, seq };
        let err = verify(&[vec![job(1), job(0)]], &cfg).unwrap_err();
        assert!(err.to_string().contains("after seq 1"));
    }

    #[test]
    fn test_verify_rejects_missing() {
        let cfg = StressConfig {
            producers: 1,
            consumers: 1,
            items_per_producer: 3,
            mode: Mode::Typed,
        };
        let job = |seq| Job { producer: 0, seq };
        let err = verify(&[vec![job(0), job(1)]], &cfg).unwrap_err();
        assert!(err.to_string().contains("received 2 of 3"));
    }
}
