use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Position → occurrence count table for one chromosome.
///
/// Every stored count is at least one; unobserved positions are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromosomeCounts {
    counts: BTreeMap<i64, u32>,
}

impl ChromosomeCounts {
    /// Build a table directly from `(position, count)` pairs.
    ///
    /// Zero counts are dropped; repeated positions are summed.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i64, u32)>) -> Self {
        let mut table = Self::default();
        for (position, count) in pairs {
            if count > 0 {
                *table.counts.entry(position).or_insert(0) += count;
            }
        }
        table
    }

    fn increment(&mut self, position: i64) {
        *self.counts.entry(position).or_insert(0) += 1;
    }

    /// Count at `position`, zero when never observed.
    pub fn count_at(&self, position: i64) -> u32 {
        self.counts.get(&position).copied().unwrap_or(0)
    }

    /// Sum of counts over the inclusive range `[start, end]`.
    pub fn sum_range(&self, start: i64, end: i64) -> u64 {
        if start > end {
            return 0;
        }
        self.counts
            .range(start..=end)
            .map(|(_, &count)| u64::from(count))
            .sum()
    }

    /// Observed positions with their counts, ascending by position.
    pub fn iter(&self) -> impl Iterator<Item = (i64, u32)> + '_ {
        self.counts.iter().map(|(&position, &count)| (position, count))
    }

    /// Number of distinct observed positions.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no position has been observed.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&count| u64::from(count)).sum()
    }
}

/// Running per-chromosome breakpoint tallies for the ingestion phase.
#[derive(Debug, Default)]
pub struct BreakpointAggregator {
    order: Vec<Arc<str>>,
    tables: HashMap<Arc<str>, ChromosomeCounts>,
}

impl BreakpointAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one breakpoint observation at `(chrom, position)`.
    pub fn record(&mut self, chrom: &Arc<str>, position: i64) {
        self.table_mut(chrom).increment(position);
    }

    fn table_mut(&mut self, chrom: &Arc<str>) -> &mut ChromosomeCounts {
        if !self.tables.contains_key(chrom) {
            self.order.push(Arc::clone(chrom));
        }
        self.tables.entry(Arc::clone(chrom)).or_default()
    }

    /// Total observations recorded so far.
    pub fn observations(&self) -> u64 {
        self.tables.values().map(ChromosomeCounts::total).sum()
    }

    /// End the ingestion phase and hand out a read-only view of the tallies.
    pub fn freeze(self) -> BreakpointCounts {
        let Self { order, mut tables } = self;
        let chromosomes = order
            .into_iter()
            .filter_map(|chrom| {
                let table = tables.remove(&chrom)?;
                Some((chrom, table))
            })
            .collect();
        BreakpointCounts { chromosomes }
    }
}

/// Frozen breakpoint tallies, chromosomes in first-observation order.
#[derive(Debug, Clone, Default)]
pub struct BreakpointCounts {
    chromosomes: Vec<(Arc<str>, ChromosomeCounts)>,
}

impl BreakpointCounts {
    /// Observed chromosomes, in the order they were first seen.
    pub fn chromosomes(&self) -> impl Iterator<Item = &Arc<str>> + '_ {
        self.chromosomes.iter().map(|(chrom, _)| chrom)
    }

    /// Table for a single chromosome.
    pub fn get(&self, chrom: &str) -> Option<&ChromosomeCounts> {
        self.chromosomes
            .iter()
            .find(|(name, _)| name.as_ref() == chrom)
            .map(|(_, table)| table)
    }

    /// `(chromosome, table)` pairs in first-observation order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &ChromosomeCounts)> + '_ {
        self.chromosomes.iter().map(|(chrom, table)| (chrom, table))
    }

    /// Number of observed chromosomes.
    pub fn num_chromosomes(&self) -> usize {
        self.chromosomes.len()
    }

    /// Number of distinct `(chromosome, position)` pairs.
    pub fn num_positions(&self) -> usize {
        self.chromosomes.iter().map(|(_, table)| table.len()).sum()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }
}
