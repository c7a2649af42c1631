use burn::data::dataset::Dataset;

use crate::domain::record::IndexedRecord;

/// One preprocessed split exposed through burn's Dataset trait,
/// so a DataLoader can draw IndexedRecords straight from it.
pub struct PairDataset {
    records: Vec<IndexedRecord>,
}

impl PairDataset {
    pub fn new(records: Vec<IndexedRecord>) -> Self { Self { records } }

    /// Records whose gold label is known
    pub fn labelled_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_hidden()).count()
    }

    pub fn longest_sentence(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.premise_length.max(r.hypothesis_length))
            .max()
            .unwrap_or(0)
    }
}

impl Dataset<IndexedRecord> for PairDataset {
    fn get(&self, index: usize) -> Option<IndexedRecord> {
        self.records.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
