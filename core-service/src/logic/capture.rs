//! Capture Producer - feeds the packet buffer from a background thread
//!
//! Live sniffing is platform specific and left to whoever implements
//! `PacketSource`; the bundled sources generate or replay traffic.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

use super::buffer::PacketBuffer;
use super::packet::{protocol_name, PacketRecord};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Share of synthetic packets that are oversized (jumbo / fragmented bursts)
const OVERSIZED_RATIO: f64 = 0.03;
const LENGTH_MEAN: f64 = 420.0;
const LENGTH_STD: f64 = 180.0;

const LOCAL_HOSTS: &[&str] = &["192.168.1.10", "192.168.1.23", "192.168.1.42", "192.168.1.77"];
const REMOTE_HOSTS: &[&str] = &["142.250.74.46", "151.101.1.69", "104.16.132.229", "8.8.8.8", "1.1.1.1"];

// ============================================================================
// SOURCES
// ============================================================================

/// Anything that can hand out packet observations one at a time
pub trait PacketSource: Send {
    /// Next observation, `None` once the source is exhausted
    fn next_packet(&mut self) -> Option<PacketRecord>;

    fn name(&self) -> &str;
}

/// Random but plausible home-WiFi traffic
pub struct SyntheticSource {
    rng: StdRng,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    fn pick<'a>(&mut self, hosts: &[&'a str]) -> &'a str {
        hosts[self.rng.gen_range(0..hosts.len())]
    }
}

impl PacketSource for SyntheticSource {
    fn next_packet(&mut self) -> Option<PacketRecord> {
        let local = self.pick(LOCAL_HOSTS);
        let remote = self.pick(REMOTE_HOSTS);
        let (source, dest) = if self.rng.gen_bool(0.5) { (local, remote) } else { (remote, local) };

        let protocol = match self.rng.gen_range(0..100) {
            0..=69 => 6,
            70..=94 => 17,
            _ => 1,
        };

        let length = if self.rng.gen_bool(OVERSIZED_RATIO) {
            self.rng.gen_range(1400..=9000)
        } else {
            let z: f64 = StandardNormal.sample(&mut self.rng);
            (LENGTH_MEAN + LENGTH_STD * z).clamp(40.0, 1000.0) as u64
        };

        Some(PacketRecord::now(source, dest, protocol, length))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Replays recorded packets, restamped with the current time
pub struct ReplaySource {
    records: Vec<PacketRecord>,
    position: usize,
    looped: bool,
}

impl ReplaySource {
    pub fn new(records: Vec<PacketRecord>, looped: bool) -> Self {
        Self { records, position: 0, looped }
    }
}

impl PacketSource for ReplaySource {
    fn next_packet(&mut self) -> Option<PacketRecord> {
        if self.position >= self.records.len() {
            if !self.looped || self.records.is_empty() {
                return None;
            }
            self.position = 0;
        }

        let original = &self.records[self.position];
        self.position += 1;
        Some(PacketRecord::now(
            original.source_ip.clone(),
            original.dest_ip.clone(),
            original.protocol,
            original.length,
        ))
    }

    fn name(&self) -> &str {
        "replay"
    }
}

// ============================================================================
// PRODUCER THREAD
// ============================================================================

/// Running producer. Dropping it without `stop()` leaves the thread detached.
pub struct ProducerHandle {
    stop: Arc<AtomicBool>,
    produced: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl ProducerHandle {
    /// Packets pushed so far
    pub fn produced(&self) -> u64 {
        self.produced.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Signal the thread, wait for it, return the total pushed
    pub fn stop(mut self) -> u64 {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Capture thread panicked");
            }
        }
        self.produced()
    }
}

/// Push one packet from `source` into `buffer` every `interval` until stopped
/// or the source runs dry.
pub fn spawn_producer(
    mut source: Box<dyn PacketSource>,
    buffer: Arc<PacketBuffer>,
    interval: Duration,
) -> std::io::Result<ProducerHandle> {
    let stop = Arc::new(AtomicBool::new(false));
    let produced = Arc::new(AtomicU64::new(0));

    let thread = {
        let stop = Arc::clone(&stop);
        let produced = Arc::clone(&produced);
        thread::Builder::new().name("packet-capture".into()).spawn(move || {
            log::info!("Capture started from {} source", source.name());

            while !stop.load(Ordering::SeqCst) {
                let Some(record) = source.next_packet() else {
                    log::info!("{} source exhausted", source.name());
                    break;
                };

                log::trace!(
                    "{} {} -> {} {} bytes",
                    protocol_name(record.protocol),
                    record.source_ip,
                    record.dest_ip,
                    record.length
                );
                buffer.push(record);
                produced.fetch_add(1, Ordering::Relaxed);

                if !interval.is_zero() {
                    thread::sleep(interval);
                }
            }

            log::info!("Capture stopped after {} packets", produced.load(Ordering::Relaxed));
        })?
    };

    Ok(ProducerHandle { stop, produced, thread: Some(thread) })
}
