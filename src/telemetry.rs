//! Resource observer for long batch runs
//!
//! A background thread samples resident memory at a fixed interval until it
//! is told to stop. It never touches the encoding data path.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);

/// What the observer saw between start and stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryReport {
    pub elapsed: Duration,
    pub samples: usize,
    /// Peak resident set size in KiB; `None` where it cannot be read
    pub peak_rss_kb: Option<u64>,
}

pub struct Observer {
    started: Instant,
    stop: Sender<()>,
    handle: JoinHandle<(usize, Option<u64>)>,
}

impl Observer {
    pub fn start(interval: Duration) -> Self {
        let (stop, stopped) = bounded::<()>(1);
        let handle = std::thread::spawn(move || {
            let mut samples = 0usize;
            let mut peak: Option<u64> = None;
            loop {
                if let Some(rss) = current_rss_kb() {
                    peak = Some(peak.map_or(rss, |p| p.max(rss)));
                }
                samples += 1;
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            (samples, peak)
        });
        Self {
            started: Instant::now(),
            stop,
            handle,
        }
    }

    /// Signal the thread and collect its report
    pub fn finish(self) -> TelemetryReport {
        let elapsed = self.started.elapsed();
        let _ = self.stop.send(());
        let (samples, peak_rss_kb) = match self.handle.join() {
            Ok(result) => result,
            Err(_) => {
                debug!("Telemetry thread panicked");
                (0, None)
            }
        };
        TelemetryReport {
            elapsed,
            samples,
            peak_rss_kb,
        }
    }
}

/// Current `VmRSS` from `/proc/self/status`, in KiB
pub fn current_rss_kb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss(&status)
}

fn parse_vm_rss(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}
