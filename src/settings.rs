//! # Solver settings
//!
//! Tuning knobs. None of them influence the solution, only how rows are stored.
use crate::data::linear_algebra::storage::Storage;

/// Which row storage strategy to use.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum StorageChoice {
    /// Pick per row from the expected width of the row.
    #[default]
    Automatic,
    /// Always use the array backed storage.
    Dense,
    /// Always use the open addressing storage.
    Hashed,
}

/// Settings of a `LinearSystem`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    /// Storage strategy for new rows.
    pub storage: StorageChoice,
    /// With automatic storage, rows expected to hold at least this many terms are hashed.
    pub hashed_storage_width: usize,
    /// The dense storage scans linearly below this many entries and does a binary search above.
    pub dense_search_threshold: usize,
    /// Capacity a new row starts out with, if its expected width is smaller.
    pub initial_row_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage: StorageChoice::Automatic,
            hashed_storage_width: 32,
            dense_search_threshold: 16,
            initial_row_capacity: 8,
        }
    }
}

impl Settings {
    /// Use a fixed storage strategy.
    #[must_use]
    pub fn with_storage(mut self, storage: StorageChoice) -> Self {
        self.storage = storage;
        self
    }

    /// Change the width at which automatic selection switches to the hashed storage.
    #[must_use]
    pub fn with_hashed_storage_width(mut self, width: usize) -> Self {
        self.hashed_storage_width = width;
        self
    }

    /// Change the size at which the dense storage switches to binary search.
    #[must_use]
    pub fn with_dense_search_threshold(mut self, threshold: usize) -> Self {
        self.dense_search_threshold = threshold;
        self
    }

    /// Create the storage for a new row.
    ///
    /// # Arguments
    ///
    /// * `width_hint`: Number of terms the row is expected to hold.
    pub fn storage_for(&self, width_hint: usize) -> Storage {
        let capacity = width_hint.max(self.initial_row_capacity);

        let hashed = match self.storage {
            StorageChoice::Automatic => width_hint >= self.hashed_storage_width,
            StorageChoice::Dense => false,
            StorageChoice::Hashed => true,
        };

        if hashed {
            Storage::hashed(capacity)
        } else {
            Storage::dense(capacity, self.dense_search_threshold)
        }
    }
}
