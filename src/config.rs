use std::num::NonZeroUsize;

use crate::error::{Error, Result};

/// Upper bound on a single record's length in bytes, newline included.
///
/// The chunker only looks this far back from each naive split point for a
/// newline. A record longer than this makes chunking fail outright.
pub const DEFAULT_MAX_RECORD_LENGTH: usize = 4096;

/// Per-worker read buffer. Going past 1 MiB buys little.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Largest read buffer a worker may ask for.
pub const MAX_READ_BUFFER_SIZE: usize = 256 * 1024 * 1024;

/// Knobs for one aggregation run.
///
/// The worker count is always supplied by the caller; nothing in the engine
/// looks at the host's CPU count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub workers: NonZeroUsize,
    pub max_record_length: usize,
    pub read_buffer_size: usize,
}

impl Config {
    #[must_use]
    pub fn new(workers: NonZeroUsize) -> Self {
        Config {
            workers,
            max_record_length: DEFAULT_MAX_RECORD_LENGTH,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }

    #[must_use]
    pub fn with_max_record_length(mut self, max_record_length: usize) -> Self {
        self.max_record_length = max_record_length;
        self
    }

    #[must_use]
    pub fn with_read_buffer_size(mut self, read_buffer_size: usize) -> Self {
        self.read_buffer_size = read_buffer_size;
        self
    }

    /// # Errors
    ///
    /// [`Error::Config`] if a length or buffer size is zero, or the buffer is
    /// larger than [`MAX_READ_BUFFER_SIZE`].
    pub fn validate(&self) -> Result<()> {
        if self.max_record_length == 0 {
            return Err(Error::Config("max record length must be at least 1 byte".into()));
        }
        if self.read_buffer_size == 0 {
            return Err(Error::Config("read buffer size must be at least 1 byte".into()));
        }
        if self.read_buffer_size > MAX_READ_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "read buffer size {} exceeds the {MAX_READ_BUFFER_SIZE} byte limit",
                self.read_buffer_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new(NonZeroUsize::new(4).unwrap());
        assert_eq!(config.workers.get(), 4);
        assert_eq!(config.max_record_length, DEFAULT_MAX_RECORD_LENGTH);
        assert_eq!(config.read_buffer_size, DEFAULT_READ_BUFFER_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_bounds() {
        let config = Config::new(NonZeroUsize::MIN).with_max_record_length(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config::new(NonZeroUsize::MIN).with_read_buffer_size(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_huge_buffer() {
        let config = Config::new(NonZeroUsize::MIN).with_read_buffer_size(usize::MAX);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config::new(NonZeroUsize::MIN).with_read_buffer_size(MAX_READ_BUFFER_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_accepts_huge_record_length() {
        let config = Config::new(NonZeroUsize::MIN).with_max_record_length(usize::MAX);
        assert!(config.validate().is_ok());
    }
}
