use crate::error::ReidDataError;
use crate::sample::Sample;
use anyhow::Result;
use std::collections::BTreeMap;

/// Groups sample positions by identity.
///
/// Built once per dataset load and read-only afterwards. Invariants:
/// - every position of the source sample array appears in exactly one list
/// - the list lengths sum to the number of samples
/// - no identity maps to an empty list
///
/// Identities are kept in ascending order so that any seeded walk over them is
/// reproducible across runs.
#[derive(Debug, Clone)]
pub struct SampleIndex {
    identity_to_positions: BTreeMap<i64, Vec<usize>>,
    num_samples: usize,
}

impl SampleIndex {
    /// Builds the index, preserving the original relative order within each identity.
    pub fn build(samples: &[Sample]) -> Result<Self> {
        if samples.is_empty() {
            return Err(ReidDataError::empty("sample index").into());
        }

        let mut identity_to_positions: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (position, sample) in samples.iter().enumerate() {
            identity_to_positions
                .entry(sample.identity)
                .or_default()
                .push(position);
        }

        Ok(Self {
            identity_to_positions,
            num_samples: samples.len(),
        })
    }

    /// Total number of indexed samples.
    pub fn len(&self) -> usize {
        self.num_samples
    }

    pub fn is_empty(&self) -> bool {
        self.num_samples == 0
    }

    pub fn num_identities(&self) -> usize {
        self.identity_to_positions.len()
    }

    /// Identities in ascending order.
    pub fn identities(&self) -> impl Iterator<Item = i64> + '_ {
        self.identity_to_positions.keys().copied()
    }

    pub fn positions(&self, identity: i64) -> Option<&[usize]> {
        self.identity_to_positions
            .get(&identity)
            .map(|positions| positions.as_slice())
    }

    /// Number of samples for `identity` (0 if unknown).
    pub fn count(&self, identity: i64) -> usize {
        self.positions(identity).map_or(0, |positions| positions.len())
    }

    /// `(identity, positions)` pairs in ascending identity order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &[usize])> + '_ {
        self.identity_to_positions
            .iter()
            .map(|(&identity, positions)| (identity, positions.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn samples_from_identities(identities: &[i64]) -> Vec<Sample> {
        identities
            .iter()
            .enumerate()
            .map(|(i, &identity)| Sample::new(format!("img_{}.jpg", i), identity, 0))
            .collect()
    }

    #[test]
    fn groups_positions_by_identity_in_order() -> Result<()> {
        let samples = samples_from_identities(&[3, 1, 3, 2, 1, 3]);
        let index = SampleIndex::build(&samples)?;

        assert_eq!(index.len(), 6);
        assert_eq!(index.num_identities(), 3);
        assert_eq!(index.identities().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(index.positions(3), Some(&[0, 2, 5][..]));
        assert_eq!(index.positions(1), Some(&[1, 4][..]));
        assert_eq!(index.count(2), 1);
        assert_eq!(index.count(42), 0);
        assert!(index.positions(42).is_none());
        Ok(())
    }

    #[test]
    fn every_position_appears_exactly_once() -> Result<()> {
        let identities: Vec<i64> = (0..500).map(|i| (i * 7 % 31) as i64).collect();
        let index = SampleIndex::build(&samples_from_identities(&identities))?;

        let mut seen = HashSet::new();
        let mut total = 0;
        for (identity, positions) in index.iter() {
            assert!(!positions.is_empty());
            for &position in positions {
                assert_eq!(identities[position], identity);
                assert!(seen.insert(position));
            }
            total += positions.len();
        }
        assert_eq!(total, index.len());
        Ok(())
    }

    #[test]
    fn empty_input_is_an_empty_dataset_error() {
        let err = SampleIndex::build(&[]).unwrap_err();
        assert!(matches!(
            ReidDataError::find(&err),
            Some(ReidDataError::EmptyDataset { .. })
        ));
    }
}
