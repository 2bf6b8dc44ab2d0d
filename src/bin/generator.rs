use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::thread;

use anyhow::Context;
use clap::Parser;
use rand::distributions::{Distribution, Uniform};
use simple_logger::SimpleLogger;

/// Generates synthetic `N. T` line-oriented test files for the sorter.
#[derive(Parser)]
#[command(name = "generator", about = "Generate synthetic N. T test files")]
struct Cli {
    /// Destination file.
    #[arg(long, default_value = "data.txt")]
    output: PathBuf,

    /// Target size in GB (float); actual overshoot stays under 512 KiB per shard.
    #[arg(long, default_value_t = 1.0)]
    size: f64,

    /// Number of shard-writing threads; shards are concatenated into `output`.
    #[arg(long, default_value_t = 2)]
    cores: usize,
}

const WORDS: &[&str] = &[
    "Apple", "Banana is yellow", "Cherry is the best", "Something something something", "Dragonfruit",
    "Elderberry jam recipe", "Fig and honey", "Grapefruit season", "Huckleberry pie", "Ivy covered wall",
];

const OVERSHOOT_GUARD_BYTES: u64 = 512 * 1024;

fn generate_shard(path: &PathBuf, target_bytes: u64) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating shard {}", path.display()))?;
    let mut writer = BufWriter::with_capacity(1 << 20, file);
    let mut rng = rand::thread_rng();
    let number_dist = Uniform::from(0..(1i64 << 31));
    let word_dist = Uniform::from(0..WORDS.len());

    let mut written: u64 = 0;
    while written < target_bytes {
        let number = number_dist.sample(&mut rng);
        let word = WORDS[word_dist.sample(&mut rng)];
        let line = format!("{number}. {word}\n");
        writer.write_all(line.as_bytes()).with_context(|| format!("writing shard {}", path.display()))?;
        written += line.len() as u64;
        if written + OVERSHOOT_GUARD_BYTES > target_bytes && written >= target_bytes {
            break;
        }
    }
    writer.flush().with_context(|| format!("flushing shard {}", path.display()))
}

fn main() {
    SimpleLogger::new().init().expect("initialize logger");

    let cli = Cli::parse();
    let cores = cli.cores.max(1);
    let total_bytes = (cli.size * (1u64 << 30) as f64) as u64;
    let per_shard = total_bytes / cores as u64;

    let mut shard_paths = Vec::with_capacity(cores);
    let mut handles = Vec::with_capacity(cores);
    for i in 0..cores {
        let shard_path = cli.output.with_extension(format!("shard{i}.tmp"));
        shard_paths.push(shard_path.clone());
        handles.push(thread::spawn(move || generate_shard(&shard_path, per_shard)));
    }

    for handle in handles {
        if let Err(e) = handle.join().expect("generator shard thread panicked") {
            eprintln!("error: {e:?}");
            process::exit(1);
        }
    }

    if let Err(e) = concatenate_shards(&shard_paths, &cli.output).context("concatenating shards") {
        eprintln!("error: {e:?}");
        process::exit(1);
    }

    log::info!("generated {}", cli.output.display());
}

fn concatenate_shards(shard_paths: &[PathBuf], output: &PathBuf) -> anyhow::Result<()> {
    let mut writer = BufWriter::with_capacity(1 << 20, File::create(output).with_context(|| format!("creating {}", output.display()))?);
    for shard_path in shard_paths {
        let mut reader = File::open(shard_path).with_context(|| format!("opening shard {}", shard_path.display()))?;
        std::io::copy(&mut reader, &mut writer).with_context(|| format!("appending shard {}", shard_path.display()))?;
        std::fs::remove_file(shard_path).with_context(|| format!("removing shard {}", shard_path.display()))?;
    }
    writer.flush().with_context(|| format!("flushing {}", output.display()))
}
