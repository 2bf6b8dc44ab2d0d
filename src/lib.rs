//! External merge sort for line-oriented text files that do not fit in
//! memory. Each input line has the form `N. T`; lines sort by `T` under
//! byte-wise (ordinal) order, then by `N` ascending.
//!
//! The crate splits the input into bounded, sorted run files using a
//! pipelined reader / parallel sorter / writer, then collapses the runs
//! into one output file with a bounded-fan-in K-way merge.
//!
//! # Examples
//! ```no_run
//! use std::path::PathBuf;
//! use ext_merge_sort::Driver;
//!
//! fn sort_file(input: PathBuf, output: PathBuf, temp: PathBuf) -> anyhow::Result<()> {
//!     let mut driver = Driver::new(input, output);
//!     driver.with_temp_dir(temp).with_chunk_size_mb(200).with_hdd_mode(false);
//!     driver.run()?;
//!     Ok(())
//! }
//! ```

mod chunk;
pub(crate) mod chunk_stream;
mod config;
mod io_permit;
mod merger;
mod row;
mod splitter;
mod stats;

pub mod cancel;
pub mod driver;
pub mod error;

pub use cancel::Cancel;
pub use config::SortConfig;
pub use driver::Driver;
pub use error::SortError;
pub use stats::RunStats;
