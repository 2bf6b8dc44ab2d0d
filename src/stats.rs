use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::SortError;

/// `elapsed;peak_rss_mb;avg_mb_per_s` persisted after each run, read back by
/// the benchmark harness.
#[derive(Debug, Clone, Copy)]
pub struct RunStats {
    elapsed: Duration,
    peak_rss_mb: u64,
    input_bytes: u64,
}

impl RunStats {
    pub(crate) fn new(elapsed: Duration, input_bytes: u64) -> RunStats {
        RunStats {
            elapsed,
            peak_rss_mb: peak_rss_mb(),
            input_bytes,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn peak_rss_mb(&self) -> u64 {
        self.peak_rss_mb
    }

    pub fn avg_mb_per_s(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        (self.input_bytes as f64 / (1 << 20) as f64) / secs
    }

    pub(crate) fn persist(&self, path: impl AsRef<Path>) -> Result<(), SortError> {
        let line = format!("{};{};{:.3}\n", self.elapsed.as_secs_f64(), self.peak_rss_mb, self.avg_mb_per_s());
        fs::write(&path, line).map_err(|e| SortError::io(format!("write {}", path.as_ref().display()), e))
    }
}

/// Reads `VmHWM` (peak resident set) from `/proc/self/status`. Returns 0 on
/// platforms without procfs rather than failing the run over a stats field.
#[cfg(target_os = "linux")]
fn peak_rss_mb() -> u64 {
    let status = match fs::read_to_string("/proc/self/status") {
        Ok(s) => s,
        Err(_) => return 0,
    };
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmHWM:") {
            let kb: u64 = rest.trim().trim_end_matches(" kB").trim().parse().unwrap_or(0);
            return kb / 1024;
        }
    }
    0
}

#[cfg(not(target_os = "linux"))]
fn peak_rss_mb() -> u64 {
    0
}
