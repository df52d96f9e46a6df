use std::fmt::Display;

use crate::tally::{Tally, TallyMap};

/// The merged result of a run: every key with its final tally.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Aggregate {
    tallies: TallyMap,
}

impl Aggregate {
    #[must_use]
    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Tally> {
        self.tallies.get(key)
    }

    /// Keys in ascending byte order with their tallies.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, &Tally)> {
        let mut entries: Vec<(&str, &Tally)> = self
            .tallies
            .iter()
            .map(|(key, tally)| (key.as_str(), tally))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    #[must_use]
    pub fn into_inner(self) -> TallyMap {
        self.tallies
    }
}

impl From<TallyMap> for Aggregate {
    fn from(tallies: TallyMap) -> Self {
        Aggregate { tallies }
    }
}

/// `{key=min/mean/max, ...}`, sorted by key.
impl Display for Aggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, tally)) in self.sorted().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}={tally}")?;
        }
        write!(f, "}}")
    }
}
