//! Sample History
//!
//! Fixed-capacity FIFO ring buffer used for rolling averages.

/// Fixed-capacity ring buffer.
///
/// Storage is allocated once; pushing into a full buffer overwrites the oldest
/// sample and hands it back.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    samples: Vec<T>,
    /// Index of the oldest sample once the buffer is full
    head: usize,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    /// Push a sample, returning the evicted oldest sample when full
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.samples.len() < self.capacity {
            self.samples.push(value);
            return None;
        }

        let evicted = std::mem::replace(&mut self.samples[self.head], value);
        self.head = (self.head + 1) % self.capacity;
        Some(evicted)
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (newer, older) = self.samples.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// Most recently pushed sample
    pub fn newest(&self) -> Option<&T> {
        if self.samples.is_empty() {
            return None;
        }
        let index = (self.head + self.samples.len() - 1) % self.samples.len();
        self.samples.get(index)
    }

    /// Oldest retained sample
    pub fn oldest(&self) -> Option<&T> {
        self.samples.get(self.head)
    }

    /// Number of samples held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Maximum number of samples held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check if no samples are held
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Check if the next push evicts
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Drop all samples, keeping the allocation
    pub fn clear(&mut self) {
        self.samples.clear();
        self.head = 0;
    }
}

impl<T: Copy> RingBuffer<T> {
    /// Copy the samples out, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut buffer = RingBuffer::new(3);
        assert!(buffer.is_empty());

        assert_eq!(buffer.push(1), None);
        assert_eq!(buffer.push(2), None);
        assert_eq!(buffer.push(3), None);

        assert!(buffer.is_full());
        assert_eq!(buffer.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn test_eviction_order() {
        let mut buffer = RingBuffer::new(3);
        for value in 1..=5 {
            buffer.push(value);
        }

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.to_vec(), vec![3, 4, 5]);
        assert_eq!(buffer.oldest(), Some(&3));
        assert_eq!(buffer.newest(), Some(&5));
        assert_eq!(buffer.push(6), Some(3));
    }

    #[test]
    fn test_clear() {
        let mut buffer = RingBuffer::new(2);
        buffer.push(10);
        buffer.push(20);
        buffer.push(30);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.newest(), None);

        buffer.push(40);
        assert_eq!(buffer.to_vec(), vec![40]);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut buffer = RingBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        buffer.push('a');
        assert_eq!(buffer.push('b'), Some('a'));
        assert_eq!(buffer.to_vec(), vec!['b']);
    }
}
