use std::path::{Path, PathBuf};

use crate::error::SortError;

/// Fully resolved configuration for one split+merge run.
///
/// Built once by [`crate::driver::Driver::run`] from user-supplied overrides
/// plus the defaulting rules of the spec, then cheaply cloned across the
/// splitter's threads.
#[derive(Clone, Debug)]
pub struct SortConfig {
    temp_dir: PathBuf,
    chunk_size_mb: u64,
    sorter_count: usize,
    channel_capacity: usize,
    hdd_mode: bool,
    max_fan_in: usize,
}

impl SortConfig {
    /// `sorter_count` and `channel_capacity` are `None` when the caller
    /// wants the spec's own defaults, which key off `chunk_size_mb`.
    pub(crate) fn resolve(
        temp_dir: PathBuf,
        chunk_size_mb: u64,
        sorter_count: Option<usize>,
        channel_capacity: Option<usize>,
        hdd_mode: bool,
        max_fan_in: usize,
    ) -> Result<SortConfig, SortError> {
        if chunk_size_mb == 0 {
            return Err(SortError::config("chunk-size must be > 0"));
        }
        if max_fan_in < 2 {
            return Err(SortError::config("max-fan-in must be >= 2"));
        }

        let large_chunk = chunk_size_mb >= 200;

        let channel_capacity = match channel_capacity {
            Some(0) => return Err(SortError::config("channels must be > 0")),
            Some(n) => n,
            None => {
                if large_chunk {
                    2
                } else {
                    4
                }
            }
        };

        let sorter_count = match sorter_count {
            Some(0) => return Err(SortError::config("sorter count must be > 0")),
            Some(n) => n,
            None => {
                if large_chunk {
                    4
                } else {
                    (num_cpus::get().saturating_sub(2)).max(1)
                }
            }
        };

        Ok(SortConfig {
            temp_dir,
            chunk_size_mb,
            sorter_count,
            channel_capacity,
            hdd_mode,
            max_fan_in,
        })
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn chunk_size_mb(&self) -> u64 {
        self.chunk_size_mb
    }

    pub(crate) fn chunk_size_bytes(&self) -> u64 {
        self.chunk_size_mb * (1 << 20)
    }

    pub fn sorter_count(&self) -> usize {
        self.sorter_count
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    pub fn hdd_mode(&self) -> bool {
        self.hdd_mode
    }

    pub fn max_fan_in(&self) -> usize {
        self.max_fan_in
    }

    /// Permit count for the split phase's shared [`crate::io_permit::IoPermit`]:
    /// 1 in HDD mode so reads and writes never overlap, a large count in SSD
    /// mode which is equivalent to no serialization.
    pub(crate) fn io_permits(&self) -> usize {
        if self.hdd_mode {
            1
        } else {
            100
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_for_large_chunk_size() {
        let config = SortConfig::resolve(PathBuf::from("tmp"), 200, None, None, true, 15).unwrap();
        assert_eq!(config.sorter_count(), 4);
        assert_eq!(config.channel_capacity(), 2);
        assert_eq!(config.io_permits(), 1);
    }

    #[test]
    fn defaults_for_small_chunk_size_use_cpu_count() {
        let config = SortConfig::resolve(PathBuf::from("tmp"), 50, None, None, false, 15).unwrap();
        assert_eq!(config.channel_capacity(), 4);
        assert!(config.sorter_count() >= 1);
        assert_eq!(config.io_permits(), 100);
    }

    #[test]
    fn rejects_zero_chunk_size() {
        assert!(SortConfig::resolve(PathBuf::from("tmp"), 0, None, None, true, 15).is_err());
    }

    #[test]
    fn rejects_max_fan_in_below_two() {
        assert!(SortConfig::resolve(PathBuf::from("tmp"), 200, None, None, true, 1).is_err());
    }

    #[test]
    fn explicit_overrides_win_over_defaults() {
        let config = SortConfig::resolve(PathBuf::from("tmp"), 200, Some(3), Some(7), true, 15).unwrap();
        assert_eq!(config.sorter_count(), 3);
        assert_eq!(config.channel_capacity(), 7);
    }
}
