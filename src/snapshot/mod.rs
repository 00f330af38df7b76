//! Snapshot index
//!
//! A run is a fixed sequence of simulation outputs. Each output is addressed
//! by a three-digit zero-padded identifier (`"000"` is the earliest) and
//! carries the elapsed cosmic time at which it was written. This module is
//! the single place where identifiers are formatted, parsed and stepped.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of snapshots in a standard run (`"000"` to `"061"`).
pub const SNAPSHOT_COUNT: usize = 62;

/// Largest ordinal expressible as a three-digit identifier.
const MAX_ORDINAL: u16 = 999;

/// Position of a snapshot in the temporal ordering.
///
/// Ordinal order, chronological order and the numeric order of the
/// identifier all coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(u16);

impl SnapshotId {
    /// Construct an identifier from its ordinal.
    pub fn new(ordinal: u16) -> Result<Self, SnapshotError> {
        if ordinal > MAX_ORDINAL {
            return Err(SnapshotError::OrdinalOutOfRange(ordinal as usize));
        }
        Ok(Self(ordinal))
    }

    /// Ordinal position (0 = earliest).
    pub fn ordinal(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

impl FromStr for SnapshotId {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SnapshotError::InvalidId(s.to_string()));
        }
        let ordinal: u16 = s
            .parse()
            .map_err(|_| SnapshotError::InvalidId(s.to_string()))?;
        Ok(Self(ordinal))
    }
}

/// Errors raised while building a snapshot index.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SnapshotError {
    /// Identifier is not a three-digit zero-padded integer.
    #[error("invalid snapshot identifier '{0}'")]
    InvalidId(String),

    /// Ordinal cannot be written as a three-digit identifier.
    #[error("snapshot ordinal {0} is out of range")]
    OrdinalOutOfRange(usize),

    /// No snapshots were supplied.
    #[error("snapshot index requires at least one snapshot")]
    Empty,

    /// A snapshot between the first and last supplied ones is absent.
    #[error("snapshot {0} is missing from the metadata")]
    Missing(SnapshotId),

    /// Elapsed time is NaN or infinite.
    #[error("snapshot {snapshot} has non-finite time {time}")]
    NonFiniteTime {
        /// Offending snapshot.
        snapshot: SnapshotId,
        /// Time that was supplied.
        time: f64,
    },

    /// Elapsed time does not increase strictly with the ordinal.
    #[error("snapshot {snapshot} time {time} does not exceed previous time {previous}")]
    NonMonotonic {
        /// Offending snapshot.
        snapshot: SnapshotId,
        /// Time of the preceding snapshot.
        previous: f64,
        /// Time that was supplied.
        time: f64,
    },
}

/// Closed index over the snapshots of a run.
///
/// Built once from the full list of elapsed times; `next`/`previous` return
/// `None` at the ends of the sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotIndex {
    times: Vec<f64>,
}

impl SnapshotIndex {
    /// Build an index from per-ordinal elapsed times.
    pub fn new(times: Vec<f64>) -> Result<Self, SnapshotError> {
        if times.is_empty() {
            return Err(SnapshotError::Empty);
        }
        if times.len() > MAX_ORDINAL as usize + 1 {
            return Err(SnapshotError::OrdinalOutOfRange(times.len() - 1));
        }

        for (ordinal, &time) in times.iter().enumerate() {
            let snapshot = SnapshotId(ordinal as u16);
            if !time.is_finite() {
                return Err(SnapshotError::NonFiniteTime { snapshot, time });
            }
            if ordinal > 0 {
                let previous = times[ordinal - 1];
                if time <= previous {
                    return Err(SnapshotError::NonMonotonic {
                        snapshot,
                        previous,
                        time,
                    });
                }
            }
        }

        Ok(Self { times })
    }

    /// Build an index from a snapshot-keyed time mapping.
    ///
    /// Keys must cover every ordinal from `"000"` up to the largest key.
    pub fn from_times(times: &BTreeMap<SnapshotId, f64>) -> Result<Self, SnapshotError> {
        let last = times.keys().next_back().copied().ok_or(SnapshotError::Empty)?;
        let mut ordered = Vec::with_capacity(last.ordinal() + 1);
        for ordinal in 0..=last.0 {
            let snapshot = SnapshotId(ordinal);
            let time = times
                .get(&snapshot)
                .copied()
                .ok_or(SnapshotError::Missing(snapshot))?;
            ordered.push(time);
        }
        Self::new(ordered)
    }

    /// Number of snapshots in the run.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always false; an index holds at least one snapshot.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Earliest snapshot (`"000"`).
    pub fn earliest(&self) -> SnapshotId {
        SnapshotId(0)
    }

    /// Latest snapshot (present day).
    pub fn latest(&self) -> SnapshotId {
        SnapshotId((self.times.len() - 1) as u16)
    }

    /// Whether the snapshot belongs to this run.
    pub fn contains(&self, snapshot: SnapshotId) -> bool {
        snapshot.ordinal() < self.times.len()
    }

    /// Elapsed cosmic time of a snapshot.
    ///
    /// # Panics
    /// If the snapshot lies outside the run; ids obtained from the index
    /// itself or from a validated tree are always inside.
    pub fn time_of(&self, snapshot: SnapshotId) -> f64 {
        self.times[snapshot.ordinal()]
    }

    /// Following snapshot, or `None` at the latest one.
    pub fn next(&self, snapshot: SnapshotId) -> Option<SnapshotId> {
        let ordinal = snapshot.ordinal() + 1;
        (ordinal < self.times.len()).then(|| SnapshotId(ordinal as u16))
    }

    /// Preceding snapshot, or `None` at the earliest one.
    pub fn previous(&self, snapshot: SnapshotId) -> Option<SnapshotId> {
        if snapshot.0 == 0 || !self.contains(snapshot) {
            return None;
        }
        Some(SnapshotId(snapshot.0 - 1))
    }

    /// All snapshots from earliest to latest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = SnapshotId> + '_ {
        (0..self.times.len()).map(|ordinal| SnapshotId(ordinal as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: usize) -> SnapshotIndex {
        SnapshotIndex::new((0..n).map(|i| 0.1 + i as f64 * 0.05).collect()).unwrap()
    }

    #[test]
    fn identifiers_are_zero_padded() {
        assert_eq!(SnapshotId::new(0).unwrap().to_string(), "000");
        assert_eq!(SnapshotId::new(9).unwrap().to_string(), "009");
        assert_eq!(SnapshotId::new(10).unwrap().to_string(), "010");
        assert_eq!(SnapshotId::new(61).unwrap().to_string(), "061");
    }

    #[test]
    fn parse_round_trips_every_standard_snapshot() {
        let index = uniform(SNAPSHOT_COUNT);
        for snapshot in index.iter() {
            let parsed: SnapshotId = snapshot.to_string().parse().unwrap();
            assert_eq!(parsed, snapshot);
        }
    }

    #[test]
    fn parse_rejects_unpadded_and_signed_identifiers() {
        for bad in ["61", "0061", "-01", "+01", "a10", ""] {
            assert!(bad.parse::<SnapshotId>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn neighbours_stop_at_bounds() {
        let index = uniform(SNAPSHOT_COUNT);
        assert_eq!(index.previous(index.earliest()), None);
        assert_eq!(index.next(index.latest()), None);
        assert_eq!(index.latest().to_string(), "061");

        let ten: SnapshotId = "010".parse().unwrap();
        assert_eq!(index.next(ten).unwrap().to_string(), "011");
        assert_eq!(index.previous(ten).unwrap().to_string(), "009");
    }

    #[test]
    fn time_strictly_increases_along_next() {
        let index = uniform(SNAPSHOT_COUNT);
        for snapshot in index.iter() {
            if let Some(next) = index.next(snapshot) {
                assert!(index.time_of(next) > index.time_of(snapshot));
            }
        }
    }

    #[test]
    fn rejects_non_monotonic_times() {
        let err = SnapshotIndex::new(vec![0.1, 0.2, 0.2]).unwrap_err();
        assert!(matches!(err, SnapshotError::NonMonotonic { .. }));

        let err = SnapshotIndex::new(vec![0.1, f64::NAN]).unwrap_err();
        assert!(matches!(err, SnapshotError::NonFiniteTime { .. }));

        assert_eq!(SnapshotIndex::new(Vec::new()).unwrap_err(), SnapshotError::Empty);
    }

    #[test]
    fn from_times_requires_contiguous_ordinals() {
        let mut times = BTreeMap::new();
        times.insert("000".parse().unwrap(), 0.1);
        times.insert("002".parse().unwrap(), 0.3);
        let err = SnapshotIndex::from_times(&times).unwrap_err();
        assert_eq!(err, SnapshotError::Missing(SnapshotId(1)));

        times.insert("001".parse().unwrap(), 0.2);
        let index = SnapshotIndex::from_times(&times).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.time_of(index.latest()), 0.3);
    }
}
