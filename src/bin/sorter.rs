use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use ext_merge_sort::Driver;
use simple_logger::SimpleLogger;

#[derive(Parser)]
#[command(name = "sorter", about = "External merge sort for N. T line-oriented text files")]
struct Cli {
    /// Source file.
    #[arg(long, default_value = "data.txt")]
    input: PathBuf,

    /// Destination file.
    #[arg(long, default_value = "result.txt")]
    output: PathBuf,

    /// Scratch directory; wiped and recreated on start, deleted on end.
    #[arg(long, default_value = "temp_chunks")]
    temp: PathBuf,

    /// Per-chunk memory cap in MB; must be > 0.
    #[arg(long = "chunk-size", default_value_t = 200)]
    chunk_size: u64,

    /// If true, serialize reads and writes for spinning disks.
    #[arg(long = "hdd-mode", default_value_t = true)]
    hdd_mode: bool,

    /// Sorter thread count; clamped to [1, cpu_count - 1].
    #[arg(long, default_value_t = 2)]
    cores: usize,

    /// Queue capacity; must be > 0.
    #[arg(long, default_value_t = 2)]
    channels: usize,
}

fn main() {
    SimpleLogger::new().init().expect("initialize logger");

    let cli = Cli::parse();
    let cores = cli.cores.clamp(1, num_cpus::get().saturating_sub(1).max(1));

    let input = cli.input.clone();
    let output = cli.output.clone();

    let mut driver = Driver::new(cli.input, cli.output);
    driver
        .with_temp_dir(cli.temp)
        .with_chunk_size_mb(cli.chunk_size)
        .with_hdd_mode(cli.hdd_mode)
        .with_sorter_count(cores)
        .with_channel_capacity(cli.channels);

    let result = driver.run().with_context(|| format!("sorting {} into {}", input.display(), output.display()));

    match result {
        Ok(stats) => {
            log::info!(
                "sort complete in {:.2}s, peak RSS {} MB, {:.2} MB/s",
                stats.elapsed().as_secs_f64(),
                stats.peak_rss_mb(),
                stats.avg_mb_per_s()
            );
        }
        Err(e) => {
            // `{e:?}` prints anyhow's full context chain down to the
            // underlying SortError, the closest thing to a stack trace
            // a release build gives us.
            eprintln!("error: {e:?}");
            process::exit(1);
        }
    }
}
