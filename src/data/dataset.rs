use crate::error::Result;

/// Indexable, counted collection of reference items.
///
/// `is_resident` declares whether all items are kept in memory; a streamed
/// dataset resolves items per access (typically from disk), and the loader
/// uses a background producer with a bounded queue for it.
pub trait Dataset: Send + Sync {
    type Item: Send;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the item at `index`. A malformed or unreadable item is
    /// reported as an error; the evaluator treats it as a zero contribution
    /// rather than aborting the batch.
    fn get(&self, index: usize) -> Result<Self::Item>;

    /// True when all items are resident in memory.
    fn is_resident(&self) -> bool;
}

/// Dataset holding every item in memory; batches are cheap clones.
pub struct InMemoryDataset<T> {
    items: Vec<T>,
}

impl<T: Clone + Send + Sync> InMemoryDataset<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T: Clone + Send + Sync> Dataset for InMemoryDataset<T> {
    type Item = T;

    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Result<T> {
        Ok(self.items[index].clone())
    }

    fn is_resident(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_dataset() {
        let dataset = InMemoryDataset::new(vec![10, 20, 30]);
        assert_eq!(dataset.len(), 3);
        assert!(!dataset.is_empty());
        assert!(dataset.is_resident());
        assert_eq!(dataset.get(1).unwrap(), 20);
    }
}
