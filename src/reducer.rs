use crossbeam_channel::Receiver;
use tracing::debug;

use crate::error::{Error, Result};
use crate::format::Aggregate;
use crate::tally::TallyMap;

/// Single writer of the final map.
///
/// Partials arrive by value and are folded in whatever order they come;
/// [`crate::Tally::combine`] makes the order irrelevant.
#[derive(Debug, Default)]
pub struct Reducer {
    totals: TallyMap,
}

impl Reducer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, partial: TallyMap) {
        if self.totals.is_empty() {
            self.totals = partial;
            return;
        }
        self.totals.reserve(partial.len());

        for (key, tally) in partial {
            match self.totals.entry(key) {
                std::collections::hash_map::Entry::Occupied(mut e) => {
                    e.get_mut().combine(&tally);
                }
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(tally);
                }
            }
        }
    }

    #[must_use]
    pub fn finish(self) -> Aggregate {
        Aggregate::from(self.totals)
    }
}

/// Merges every partial in `partials`.
pub fn reduce<I>(partials: I) -> Aggregate
where
    I: IntoIterator<Item = TallyMap>,
{
    let mut reducer = Reducer::new();
    for partial in partials {
        reducer.absorb(partial);
    }
    reducer.finish()
}

/// Receives exactly `expected` worker reports from `results` and merges them.
///
/// Takes the receiver by value so it is dropped as soon as this returns; a
/// worker still blocked on `send` then fails fast instead of hanging.
///
/// # Errors
///
/// The first worker error received, or [`Error::WorkerLost`] if every sender
/// hung up before `expected` reports arrived.
pub fn drain(results: Receiver<Result<TallyMap>>, expected: usize) -> Result<Aggregate> {
    let mut reducer = Reducer::new();
    for received in 0..expected {
        let partial = results.recv().map_err(|_| Error::WorkerLost)??;
        debug!(received = received + 1, expected, keys = partial.len(), "merged partial");
        reducer.absorb(partial);
    }
    Ok(reducer.finish())
}
