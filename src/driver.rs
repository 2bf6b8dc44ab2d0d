use std::cmp::max;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use rlimit::{getrlimit, setrlimit, Resource};

use crate::cancel::Cancel;
use crate::config::SortConfig;
use crate::error::SortError;
use crate::merger;
use crate::splitter;
use crate::stats::RunStats;

const DEFAULT_MAX_FAN_IN: usize = 15;

/// Builder and orchestrator for one split-then-merge run.
///
/// Mirrors the split between a public builder and an internal resolved
/// config: `with_*` setters accumulate overrides here, `run()` resolves them
/// once into a [`SortConfig`] and hands it to the splitter and merger.
pub struct Driver {
    input: PathBuf,
    output: PathBuf,
    temp_dir: PathBuf,
    chunk_size_mb: u64,
    sorter_count: Option<usize>,
    channel_capacity: Option<usize>,
    hdd_mode: bool,
    max_fan_in: usize,
    cancel: Cancel,
}

impl Driver {
    pub fn new(input: PathBuf, output: PathBuf) -> Driver {
        Driver {
            input,
            output,
            temp_dir: std::env::temp_dir().join("ext-merge-sort"),
            chunk_size_mb: 200,
            sorter_count: None,
            channel_capacity: None,
            hdd_mode: true,
            max_fan_in: DEFAULT_MAX_FAN_IN,
            cancel: Cancel::new(),
        }
    }

    /// Directory for chunk and intermediate files. Wiped and recreated at
    /// the start of `run()`, deleted when it finishes.
    pub fn with_temp_dir(&mut self, temp_dir: PathBuf) -> &mut Self {
        self.temp_dir = temp_dir;
        self
    }

    pub fn with_chunk_size_mb(&mut self, chunk_size_mb: u64) -> &mut Self {
        self.chunk_size_mb = chunk_size_mb;
        self
    }

    pub fn with_sorter_count(&mut self, sorter_count: usize) -> &mut Self {
        self.sorter_count = Some(sorter_count);
        self
    }

    pub fn with_channel_capacity(&mut self, channel_capacity: usize) -> &mut Self {
        self.channel_capacity = Some(channel_capacity);
        self
    }

    pub fn with_hdd_mode(&mut self, hdd_mode: bool) -> &mut Self {
        self.hdd_mode = hdd_mode;
        self
    }

    pub fn with_max_fan_in(&mut self, max_fan_in: usize) -> &mut Self {
        self.max_fan_in = max_fan_in;
        self
    }

    /// A clone of the cancellation token this run observes; call `.cancel()`
    /// on it from another thread to abort an in-progress `run()`.
    pub fn cancel_handle(&self) -> Cancel {
        self.cancel.clone()
    }

    /// Resolves configuration, then wipes and recreates the temp directory,
    /// runs the split-then-merge pipeline, and removes the temp directory
    /// again before returning.
    ///
    /// Returns `anyhow::Error` rather than the library's own [`SortError`]:
    /// this is the orchestration boundary where breadcrumbs describing
    /// *which* phase failed are added via `.context(...)`, while the
    /// underlying `SortError` is preserved in the chain (recoverable with
    /// `anyhow::Error::chain`/`downcast_ref`).
    pub fn run(&self) -> Result<RunStats> {
        if !self.input.is_file() {
            return Err(SortError::config(format!("input {} is not a file", self.input.display())).into());
        }
        let config = SortConfig::resolve(
            self.temp_dir.clone(),
            self.chunk_size_mb,
            self.sorter_count,
            self.channel_capacity,
            self.hdd_mode,
            self.max_fan_in,
        )
        .context("resolving sort configuration")?;

        // "Wiped and recreated on start": remove_dir_all is not a no-op like
        // create_dir_all would be, so a stale directory left by a killed
        // prior run doesn't get silently reused.
        if let Err(e) = std::fs::remove_dir_all(config.temp_dir()) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(SortError::io(format!("wipe {}", config.temp_dir().display()), e)).context("clearing stale temp directory");
            }
        }
        std::fs::create_dir_all(config.temp_dir())
            .map_err(|e| SortError::io(format!("create {}", config.temp_dir().display()), e))
            .context("creating temp directory")?;

        let result = self.run_inner(&config);

        let _ = std::fs::remove_dir_all(config.temp_dir());
        result
    }

    fn run_inner(&self, config: &SortConfig) -> Result<RunStats> {
        let start = Instant::now();
        let input_bytes = std::fs::metadata(&self.input).map(|m| m.len()).unwrap_or(0);

        let (current_soft, current_hard) = Self::get_rlimits().context("reading current NOFILE rlimit")?;
        let new_soft = max((config.max_fan_in() + 256) as u64, current_soft);
        log::info!("raising rlimit NOFILE from {current_soft} to {new_soft}");
        Self::set_rlimits(new_soft, current_hard).context("raising NOFILE rlimit")?;

        let run_result = self.split_and_merge(config);

        log::info!("restoring rlimit NOFILE to {current_soft}");
        Self::set_rlimits(current_soft, current_hard).context("restoring NOFILE rlimit")?;

        run_result?;

        let stats = RunStats::new(start.elapsed(), input_bytes);
        let _ = stats.persist("last_run_stats.txt");
        Ok(stats)
    }

    fn split_and_merge(&self, config: &SortConfig) -> Result<()> {
        log::info!("starting split phase for {}", self.input.display());
        let runs = splitter::split(&self.input, config, &self.cancel).context("split phase")?;
        log::info!("split phase produced {} runs", runs.len());

        log::info!("starting merge phase, max_fan_in={}", config.max_fan_in());
        merger::merge(runs, &self.output, config.temp_dir(), config.max_fan_in(), &self.cancel).context("merge phase")?;
        log::info!("merge phase complete, output at {}", self.output.display());
        Ok(())
    }

    fn get_rlimits() -> Result<(u64, u64), SortError> {
        getrlimit(Resource::NOFILE).map_err(|e| SortError::io("getrlimit NOFILE", e))
    }

    fn set_rlimits(soft: u64, hard: u64) -> Result<(), SortError> {
        setrlimit(Resource::NOFILE, soft, hard).map_err(|e| SortError::io(format!("setrlimit NOFILE soft={soft} hard={hard}"), e))
    }
}
