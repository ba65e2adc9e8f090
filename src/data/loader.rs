use super::dataset::Dataset;
use crate::error::{EvoVisionError, Result};
use crate::random::RandomSource;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

/// Number of full index-swap passes used to build an epoch permutation.
const SHUFFLE_PASSES: usize = 3;

/// One evaluation unit: a slice of the epoch permutation with its resolved
/// items. `indices[i]` is the dataset index of `items[i]`; an item that
/// failed to resolve keeps its slot as `Err`, so a bad item never costs its
/// batchmates their contribution and every index of the epoch is accounted
/// for exactly once.
#[derive(Debug)]
pub struct Batch<T> {
    pub indices: Vec<usize>,
    pub items: Vec<Result<T>>,
}

impl<T> Batch<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items in this batch that failed to resolve.
    pub fn failed_reads(&self) -> usize {
        self.items.iter().filter(|i| i.is_err()).count()
    }
}

/// Shuffled, batched access to a dataset.
///
/// One epoch covers every dataset index exactly once in a randomized order.
/// Resident datasets are sliced on demand; non-resident datasets are served
/// by a producer thread feeding a bounded queue, whose capacity bounds peak
/// memory (producer blocks when full, consumer blocks when empty).
pub struct DataLoader<D: Dataset> {
    dataset: Arc<D>,
    batch_size: usize,
    queue_capacity: usize,
    force_streaming: bool,
    random: Arc<dyn RandomSource>,
}

impl<D: Dataset + 'static> DataLoader<D> {
    pub fn new(dataset: Arc<D>, batch_size: usize, random: Arc<dyn RandomSource>) -> Result<Self> {
        if batch_size == 0 {
            return Err(EvoVisionError::Configuration(
                "batch size must be at least 1".to_string(),
            ));
        }
        if dataset.is_empty() {
            return Err(EvoVisionError::Dataset("dataset is empty".to_string()));
        }
        Ok(Self {
            dataset,
            batch_size,
            queue_capacity: 2,
            force_streaming: false,
            random,
        })
    }

    /// Capacity of the streaming-mode batch queue.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EvoVisionError::Configuration(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        self.queue_capacity = capacity;
        Ok(self)
    }

    /// Use the streaming producer even for resident datasets.
    pub fn with_streaming(mut self) -> Self {
        self.force_streaming = true;
        self
    }

    pub fn dataset_len(&self) -> usize {
        self.dataset.len()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Index permutation for one epoch: three passes of swap-with-random-
    /// partner over the full range.
    fn permutation(&self) -> Vec<usize> {
        let len = self.dataset.len();
        let mut indices: Vec<usize> = (0..len).collect();
        for _ in 0..SHUFFLE_PASSES {
            for i in 0..len {
                let j = self.random.next_below(len as i64) as usize;
                indices.swap(i, j);
            }
        }
        indices
    }

    /// Start one epoch. Every index appears exactly once across the yielded
    /// batches; the final batch may be short.
    pub fn epoch(&self) -> Epoch<D> {
        let permutation = self.permutation();
        if self.dataset.is_resident() && !self.force_streaming {
            Epoch::Resident {
                dataset: Arc::clone(&self.dataset),
                permutation,
                cursor: 0,
                batch_size: self.batch_size,
            }
        } else {
            Epoch::Streaming {
                receiver: spawn_producer(
                    Arc::clone(&self.dataset),
                    permutation,
                    self.batch_size,
                    self.queue_capacity,
                ),
            }
        }
    }
}

fn resolve_batch<D: Dataset>(dataset: &D, indices: &[usize]) -> Batch<D::Item> {
    let items = indices
        .iter()
        .map(|&i| {
            dataset.get(i).map_err(|e| {
                log::warn!("item {i} failed to load: {e}");
                e
            })
        })
        .collect();
    Batch {
        indices: indices.to_vec(),
        items,
    }
}

/// Producer thread for streaming mode. Exits when the epoch is exhausted or
/// the consumer hangs up (send fails once the receiver is dropped).
fn spawn_producer<D: Dataset + 'static>(
    dataset: Arc<D>,
    permutation: Vec<usize>,
    batch_size: usize,
    queue_capacity: usize,
) -> Receiver<Batch<D::Item>> {
    let (sender, receiver) = mpsc::sync_channel(queue_capacity);
    thread::spawn(move || {
        for chunk in permutation.chunks(batch_size) {
            let batch = resolve_batch(dataset.as_ref(), chunk);
            if sender.send(batch).is_err() {
                break;
            }
        }
    });
    receiver
}

/// Iterator over the batches of one epoch.
pub enum Epoch<D: Dataset> {
    Resident {
        dataset: Arc<D>,
        permutation: Vec<usize>,
        cursor: usize,
        batch_size: usize,
    },
    Streaming {
        receiver: Receiver<Batch<D::Item>>,
    },
}

impl<D: Dataset> Iterator for Epoch<D> {
    type Item = Batch<D::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Epoch::Resident {
                dataset,
                permutation,
                cursor,
                batch_size,
            } => {
                if *cursor >= permutation.len() {
                    return None;
                }
                let end = (*cursor + *batch_size).min(permutation.len());
                let chunk = &permutation[*cursor..end];
                *cursor = end;
                Some(resolve_batch(dataset.as_ref(), chunk))
            }
            Epoch::Streaming { receiver } => receiver.recv().ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryDataset;
    use crate::random::MersenneTwister;
    use std::collections::HashSet;

    fn loader(n: usize, batch_size: usize, seed: u32) -> DataLoader<InMemoryDataset<usize>> {
        let dataset = Arc::new(InMemoryDataset::new((0..n).collect()));
        DataLoader::new(dataset, batch_size, Arc::new(MersenneTwister::new(seed))).unwrap()
    }

    /// In-memory dataset with one unreadable index.
    struct FlakyDataset {
        items: Vec<usize>,
        bad_index: usize,
    }

    impl Dataset for FlakyDataset {
        type Item = usize;

        fn len(&self) -> usize {
            self.items.len()
        }

        fn get(&self, index: usize) -> Result<usize> {
            if index == self.bad_index {
                return Err(EvoVisionError::Dataset(format!("item {index} unreadable")));
            }
            Ok(self.items[index])
        }

        fn is_resident(&self) -> bool {
            true
        }
    }

    fn assert_full_coverage(batches: Vec<Batch<usize>>, n: usize, batch_size: usize) {
        let total: usize = batches.iter().map(Batch::len).sum();
        assert_eq!(total, n);
        for batch in &batches {
            assert!(batch.len() <= batch_size);
        }
        let seen: HashSet<usize> = batches
            .iter()
            .flat_map(|b| b.indices.iter().copied())
            .collect();
        assert_eq!(seen.len(), n);
    }

    #[test]
    fn test_epoch_covers_every_index_once() {
        for (n, batch_size) in [(10, 3), (10, 1), (7, 7), (100, 32), (5, 100)] {
            let loader = loader(n, batch_size, 42);
            let batches: Vec<_> = loader.epoch().collect();
            assert_full_coverage(batches, n, batch_size);
        }
    }

    #[test]
    fn test_streaming_epoch_covers_every_index_once() {
        let loader = loader(100, 8, 7).with_queue_capacity(3).unwrap().with_streaming();
        let batches: Vec<_> = loader.epoch().collect();
        assert_full_coverage(batches, 100, 8);
    }

    #[test]
    fn test_streaming_matches_resident_order_for_same_seed() {
        let resident = loader(50, 4, 99);
        let streaming = loader(50, 4, 99).with_streaming();
        let a: Vec<Vec<usize>> = resident.epoch().map(|b| b.indices).collect();
        let b: Vec<Vec<usize>> = streaming.epoch().map(|b| b.indices).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_is_seed_deterministic() {
        let a: Vec<Vec<usize>> = loader(64, 16, 5).epoch().map(|b| b.indices).collect();
        let b: Vec<Vec<usize>> = loader(64, 16, 5).epoch().map(|b| b.indices).collect();
        assert_eq!(a, b);
        let c: Vec<Vec<usize>> = loader(64, 16, 6).epoch().map(|b| b.indices).collect();
        assert_ne!(a, c);
    }

    #[test]
    fn test_batch_items_match_indices() {
        let loader = loader(20, 6, 1);
        for batch in loader.epoch() {
            // Items are the dataset values at the permuted indices.
            let items: Vec<usize> = batch.items.into_iter().map(|i| i.unwrap()).collect();
            assert_eq!(batch.indices, items);
        }
    }

    #[test]
    fn test_unreadable_item_keeps_its_batchmates() {
        let dataset = Arc::new(FlakyDataset {
            items: (0..10).collect(),
            bad_index: 4,
        });
        let loader =
            DataLoader::new(dataset, 5, Arc::new(MersenneTwister::new(2))).unwrap();
        let batches: Vec<_> = loader.epoch().collect();

        // Every index still appears exactly once, the bad one as Err in place.
        let seen: HashSet<usize> = batches
            .iter()
            .flat_map(|b| b.indices.iter().copied())
            .collect();
        assert_eq!(seen.len(), 10);
        let failed: usize = batches.iter().map(Batch::failed_reads).sum();
        assert_eq!(failed, 1);
        let good: usize = batches
            .iter()
            .flat_map(|b| b.items.iter())
            .filter(|i| i.is_ok())
            .count();
        assert_eq!(good, 9);
        for batch in &batches {
            for (index, item) in batch.indices.iter().zip(&batch.items) {
                assert_eq!(item.is_err(), *index == 4);
            }
        }
    }

    #[test]
    fn test_abandoned_streaming_epoch_does_not_hang() {
        let loader = loader(1000, 1, 3).with_streaming();
        let mut epoch = loader.epoch();
        let _ = epoch.next();
        drop(epoch); // producer must exit once the receiver is gone
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let dataset = Arc::new(InMemoryDataset::new(vec![1]));
        let result = DataLoader::new(dataset, 0, Arc::new(MersenneTwister::new(0)));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_dataset() {
        let dataset: Arc<InMemoryDataset<usize>> = Arc::new(InMemoryDataset::new(vec![]));
        let result = DataLoader::new(dataset, 4, Arc::new(MersenneTwister::new(0)));
        assert!(result.is_err());
    }
}
