use rustc_hash::FxHashMap as HashMap;
use std::fmt::Display;

/// Per-key map produced by one worker (a partial result) or by the reducer.
pub type TallyMap = HashMap<String, Tally>;

/// Running min/max/sum/count for one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tally {
    min: f64,
    max: f64,
    sum: f64,
    count: u64,
}

impl Tally {
    /// Starts a tally from the first reading seen for a key.
    #[inline(always)]
    #[must_use]
    pub const fn new(reading: f64) -> Tally {
        Tally {
            min: reading,
            max: reading,
            sum: reading,
            count: 1,
        }
    }

    #[inline(always)]
    pub fn incorporate(&mut self, reading: f64) {
        self.sum += reading;
        self.count += 1;
        if self.min > reading {
            self.min = reading;
        }
        if self.max < reading {
            self.max = reading;
        }
    }

    /// Folds another tally for the same key into this one.
    ///
    /// Associative and commutative, so partial results can be merged in
    /// whatever order workers finish.
    #[inline(always)]
    pub fn combine(&mut self, other: &Tally) {
        self.sum += other.sum;
        self.count += other.count;
        if self.min > other.min {
            self.min = other.min;
        }
        if self.max < other.max {
            self.max = other.max;
        }
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

impl Display for Tally {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:.1}/{:.1}/{:.1}", self.min, self.mean(), self.max)
    }
}

/// Folds one reading into `map`, allocating the key only on first sight.
#[inline(always)]
pub fn record(map: &mut TallyMap, key: &str, reading: f64) {
    if let Some(tally) = map.get_mut(key) {
        tally.incorporate(reading);
    } else {
        map.insert(key.to_owned(), Tally::new(reading));
    }
}
