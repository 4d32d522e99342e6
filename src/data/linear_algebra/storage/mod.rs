//! # Row storage
//!
//! A row holds a coefficient for each variable it mentions. Rows are typically very short, but a
//! few rows (those of the goal, or rows defining a variable that many constraints refer to) can
//! get wide. Two strategies are available behind the same capability trait: an array backed one
//! that is cheap for short rows and an open addressing table for the wide ones.
//!
//! Both strategies share the following invariants:
//!
//! * A stored value is never exactly `0.0`: writing a zero removes the entry.
//! * Iteration visits the entries in ascending variable order, regardless of insertion order.
use std::fmt::{self, Display};

use itertools::Itertools;

pub use dense::Dense;
pub use hashed::Hashed;

use crate::data::variable::VariableId;

mod dense;
mod hashed;

/// Sparse mapping from variables to non-zero coefficients.
pub trait RowStorage {
    /// The coefficient of a variable, `0.0` if it is not stored.
    fn get(&self, variable: VariableId) -> f64;
    /// Set the coefficient of a variable. Writing `0.0` removes the entry.
    fn put(&mut self, variable: VariableId, value: f64);
    /// Remove a variable.
    ///
    /// # Return value
    ///
    /// The value it had, if it was stored.
    fn remove(&mut self, variable: VariableId) -> Option<f64>;
    /// Visit all entries in ascending variable order.
    fn for_each<F: FnMut(VariableId, f64)>(&self, f: F);
    /// Number of stored (non-zero) entries.
    fn len(&self) -> usize;
    /// Divide every value, removing the entries that underflow to zero.
    fn divide_by(&mut self, divisor: f64);
    /// Flip the sign of every value.
    fn negate(&mut self);
    /// Remove all entries, keeping the allocation.
    fn clear(&mut self);

    /// Add `delta` to the coefficient of a variable.
    ///
    /// # Return value
    ///
    /// The new coefficient. If that is zero, the entry was removed.
    fn add(&mut self, variable: VariableId, delta: f64) -> f64 {
        let value = self.get(variable) + delta;
        self.put(variable, value);
        value
    }

    /// Whether no entry is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a variable has a (non-zero) coefficient.
    fn contains(&self, variable: VariableId) -> bool {
        self.get(variable) != 0.0
    }

    /// Copy the entries out in ascending variable order.
    fn to_vec(&self) -> Vec<(VariableId, f64)> {
        let mut result = Vec::with_capacity(self.len());
        self.for_each(|variable, value| result.push((variable, value)));
        result
    }
}

/// A row storage of either strategy.
///
/// The strategy is fixed when the row is created.
#[derive(Clone, Debug)]
pub enum Storage {
    /// Parallel arrays with a sorted permutation.
    Dense(Dense),
    /// Open addressing with an ordered chain through the occupied buckets.
    Hashed(Hashed),
}

impl Storage {
    /// Create an array backed storage.
    ///
    /// # Arguments
    ///
    /// * `capacity`: Number of entries that fit before the first reallocation.
    /// * `search_threshold`: Below this size, lookups scan instead of doing a binary search.
    pub fn dense(capacity: usize, search_threshold: usize) -> Self {
        Storage::Dense(Dense::with_capacity(capacity, search_threshold))
    }

    /// Create an open addressing storage with room for `capacity` entries.
    pub fn hashed(capacity: usize) -> Self {
        Storage::Hashed(Hashed::with_capacity(capacity))
    }

    /// Whether this is the array backed strategy.
    pub fn is_dense(&self) -> bool {
        matches!(self, Storage::Dense(_))
    }
}

impl RowStorage for Storage {
    fn get(&self, variable: VariableId) -> f64 {
        match self {
            Storage::Dense(storage) => storage.get(variable),
            Storage::Hashed(storage) => storage.get(variable),
        }
    }

    fn put(&mut self, variable: VariableId, value: f64) {
        match self {
            Storage::Dense(storage) => storage.put(variable, value),
            Storage::Hashed(storage) => storage.put(variable, value),
        }
    }

    fn remove(&mut self, variable: VariableId) -> Option<f64> {
        match self {
            Storage::Dense(storage) => storage.remove(variable),
            Storage::Hashed(storage) => storage.remove(variable),
        }
    }

    fn for_each<F: FnMut(VariableId, f64)>(&self, f: F) {
        match self {
            Storage::Dense(storage) => storage.for_each(f),
            Storage::Hashed(storage) => storage.for_each(f),
        }
    }

    fn len(&self) -> usize {
        match self {
            Storage::Dense(storage) => storage.len(),
            Storage::Hashed(storage) => storage.len(),
        }
    }

    fn divide_by(&mut self, divisor: f64) {
        match self {
            Storage::Dense(storage) => storage.divide_by(divisor),
            Storage::Hashed(storage) => storage.divide_by(divisor),
        }
    }

    fn negate(&mut self) {
        match self {
            Storage::Dense(storage) => storage.negate(),
            Storage::Hashed(storage) => storage.negate(),
        }
    }

    fn clear(&mut self) {
        match self {
            Storage::Dense(storage) => storage.clear(),
            Storage::Hashed(storage) => storage.clear(),
        }
    }
}

impl PartialEq for Storage {
    /// Equal when the same entries are stored, regardless of strategy.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.to_vec() == other.to_vec()
    }
}

impl Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let entries = self.to_vec();
        write!(f, "{{{}}}", entries.iter().map(|(variable, value)| format!("{}: {}", variable, value)).join(", "))
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use crate::data::linear_algebra::storage::{Dense, Hashed, RowStorage, Storage};
    use crate::data::variable::VariableId;

    fn v(index: u32) -> VariableId {
        VariableId::new(index)
    }

    fn put_get_remove<S: RowStorage>(mut storage: S) {
        assert!(storage.is_empty());
        storage.put(v(5), 2.0);
        storage.put(v(1), -1.0);
        storage.put(v(3), 0.5);
        assert_eq!(storage.len(), 3);
        assert_eq!(storage.get(v(5)), 2.0);
        assert_eq!(storage.get(v(2)), 0.0);
        assert!(storage.contains(v(1)));
        assert!(!storage.contains(v(4)));

        storage.put(v(5), 7.0);
        assert_eq!(storage.get(v(5)), 7.0);
        assert_eq!(storage.len(), 3);

        assert_eq!(storage.remove(v(1)), Some(-1.0));
        assert_eq!(storage.remove(v(1)), None);
        assert_eq!(storage.to_vec(), vec![(v(3), 0.5), (v(5), 7.0)]);
    }

    fn zeros_are_never_stored<S: RowStorage>(mut storage: S) {
        storage.put(v(0), 0.0);
        assert!(storage.is_empty());

        storage.put(v(2), 3.0);
        storage.put(v(2), 0.0);
        assert!(storage.is_empty());

        storage.put(v(4), 1.5);
        assert_eq!(storage.add(v(4), -1.5), 0.0);
        assert!(!storage.contains(v(4)));
        assert!(storage.is_empty());

        assert_eq!(storage.add(v(6), 2.0), 2.0);
        assert_eq!(storage.add(v(6), 2.0), 4.0);
        assert_eq!(storage.to_vec(), vec![(v(6), 4.0)]);
    }

    fn ascending_iteration<S: RowStorage>(mut storage: S) {
        let order = [17, 3, 40, 0, 25, 8, 33, 12, 1, 39, 22, 5, 30, 19, 2, 11, 28, 7, 35, 14];
        for (i, &index) in order.iter().enumerate() {
            storage.put(v(index), (i + 1) as f64);
        }
        let mut visited = Vec::new();
        storage.for_each(|variable, _| visited.push(variable));
        let mut expected = order.iter().map(|&index| v(index)).collect::<Vec<_>>();
        expected.sort();
        assert_eq!(visited, expected);

        for index in [0, 40, 19, 3] {
            storage.remove(v(index));
        }
        let remaining = storage.to_vec().into_iter().map(|(variable, _)| variable).collect::<Vec<_>>();
        assert!(remaining.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(remaining.len(), order.len() - 4);
    }

    fn scaling<S: RowStorage>(mut storage: S) {
        storage.put(v(1), 3.0);
        storage.put(v(2), -6.0);
        storage.divide_by(3.0);
        assert_eq!(storage.to_vec(), vec![(v(1), 1.0), (v(2), -2.0)]);
        storage.negate();
        assert_eq!(storage.to_vec(), vec![(v(1), -1.0), (v(2), 2.0)]);

        // Underflow to zero removes the entry
        storage.put(v(3), 5e-324);
        storage.divide_by(4.0);
        assert!(!storage.contains(v(3)));
        assert_eq!(storage.len(), 2);

        storage.clear();
        assert!(storage.is_empty());
        storage.put(v(9), 1.0);
        assert_eq!(storage.to_vec(), vec![(v(9), 1.0)]);
    }

    fn growth<S: RowStorage>(mut storage: S) {
        for index in (0..500).rev() {
            storage.put(v(index * 3), index as f64 + 1.0);
        }
        assert_eq!(storage.len(), 500);
        for index in 0..500 {
            assert_eq!(storage.get(v(index * 3)), index as f64 + 1.0);
            assert_eq!(storage.get(v(index * 3 + 1)), 0.0);
        }
        for index in (0..500).step_by(2) {
            assert_eq!(storage.remove(v(index * 3)), Some(index as f64 + 1.0));
        }
        assert_eq!(storage.len(), 250);
        let entries = storage.to_vec();
        assert_eq!(entries.first(), Some(&(v(3), 2.0)));
        assert_eq!(entries.last(), Some(&(v(499 * 3), 500.0)));
    }

    fn strategies() -> Vec<Storage> {
        vec![
            Storage::dense(1, 16),
            Storage::dense(4, 0),
            Storage::dense(0, usize::MAX),
            Storage::hashed(0),
            Storage::hashed(64),
        ]
    }

    #[test]
    fn test_put_get_remove() {
        strategies().into_iter().for_each(put_get_remove);
        put_get_remove(Dense::with_capacity(2, 16));
        put_get_remove(Hashed::with_capacity(2));
    }

    #[test]
    fn test_zeros_are_never_stored() {
        strategies().into_iter().for_each(zeros_are_never_stored);
    }

    #[test]
    fn test_ascending_iteration() {
        strategies().into_iter().for_each(ascending_iteration);
    }

    #[test]
    fn test_scaling() {
        strategies().into_iter().for_each(scaling);
    }

    #[test]
    fn test_growth() {
        strategies().into_iter().for_each(growth);
    }

    #[test]
    fn equality_ignores_strategy() {
        let mut dense = Storage::dense(2, 16);
        let mut hashed = Storage::hashed(2);
        for storage in [&mut dense, &mut hashed] {
            storage.put(v(4), 1.0);
            storage.put(v(2), -2.5);
        }
        assert_eq!(dense, hashed);
        assert_eq!(dense.to_string(), "{v2: -2.5, v4: 1}");
        hashed.put(v(7), 1.0);
        assert_ne!(dense, hashed);
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Put(u32, i8),
        Add(u32, i8),
        Remove(u32),
        Divide(i8),
        Negate,
    }

    fn operation() -> impl Strategy<Value=Operation> {
        prop_oneof![
            4 => (0u32..48, -3i8..=3).prop_map(|(index, value)| Operation::Put(index, value)),
            4 => (0u32..48, -3i8..=3).prop_map(|(index, value)| Operation::Add(index, value)),
            2 => (0u32..48).prop_map(Operation::Remove),
            1 => prop_oneof![Just(-2i8), Just(2i8), Just(4i8)].prop_map(Operation::Divide),
            1 => Just(Operation::Negate),
        ]
    }

    fn apply<S: RowStorage>(storage: &mut S, operation: &Operation) -> Option<f64> {
        match *operation {
            Operation::Put(index, value) => { storage.put(v(index), value as f64); None },
            Operation::Add(index, value) => Some(storage.add(v(index), value as f64)),
            Operation::Remove(index) => storage.remove(v(index)),
            Operation::Divide(divisor) => { storage.divide_by(divisor as f64); None },
            Operation::Negate => { storage.negate(); None },
        }
    }

    fn apply_model(model: &mut BTreeMap<VariableId, f64>, operation: &Operation) -> Option<f64> {
        match *operation {
            Operation::Put(index, value) => {
                if value == 0 {
                    model.remove(&v(index));
                } else {
                    model.insert(v(index), value as f64);
                }
                None
            },
            Operation::Add(index, value) => {
                let new = model.get(&v(index)).copied().unwrap_or(0.0) + value as f64;
                if new == 0.0 {
                    model.remove(&v(index));
                } else {
                    model.insert(v(index), new);
                }
                Some(new)
            },
            Operation::Remove(index) => model.remove(&v(index)),
            Operation::Divide(divisor) => {
                model.values_mut().for_each(|value| *value /= divisor as f64);
                None
            },
            Operation::Negate => {
                model.values_mut().for_each(|value| *value = -*value);
                None
            },
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn strategies_agree(operations in prop::collection::vec(operation(), 0..300)) {
            let mut model = BTreeMap::new();
            let mut dense = Storage::dense(1, 4);
            let mut hashed = Storage::hashed(1);

            for operation in &operations {
                let expected = apply_model(&mut model, operation);
                prop_assert_eq!(apply(&mut dense, operation), expected);
                prop_assert_eq!(apply(&mut hashed, operation), expected);

                let expected = model.iter().map(|(&variable, &value)| (variable, value)).collect::<Vec<_>>();
                prop_assert_eq!(&dense.to_vec(), &expected);
                prop_assert_eq!(&hashed.to_vec(), &expected);
            }
        }

        #[test]
        fn no_zero_is_ever_stored(operations in prop::collection::vec(operation(), 0..300)) {
            let mut dense = Storage::dense(1, 4);
            let mut hashed = Storage::hashed(1);

            for operation in &operations {
                apply(&mut dense, operation);
                apply(&mut hashed, operation);
                for storage in [&dense, &hashed] {
                    let mut count = 0;
                    storage.for_each(|_, value| {
                        count += 1;
                        assert_ne!(value, 0.0);
                    });
                    prop_assert_eq!(count, storage.len());
                }
            }
        }
    }
}
