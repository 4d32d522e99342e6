//! # Array backed row storage
//!
//! Entries live in two parallel arrays in insertion order. A third array holds the positions of
//! the entries sorted by variable, which is what lookups search and what iteration walks.
use crate::data::linear_algebra::storage::RowStorage;
use crate::data::variable::VariableId;

/// Parallel arrays plus a sorted permutation.
#[derive(Clone, Debug)]
pub struct Dense {
    variables: Vec<VariableId>,
    values: Vec<f64>,
    /// Positions into `variables` and `values`, sorted by variable.
    order: Vec<u32>,
    /// Below this many entries, searching is a linear scan over `order`.
    search_threshold: usize,
}

impl Dense {
    /// Create an empty storage.
    ///
    /// # Arguments
    ///
    /// * `capacity`: Number of entries that fit before the first reallocation.
    /// * `search_threshold`: Entry count from which lookups use a binary search.
    pub fn with_capacity(capacity: usize, search_threshold: usize) -> Self {
        Self {
            variables: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            search_threshold,
        }
    }

    /// Locate a variable in the sorted permutation.
    ///
    /// # Return value
    ///
    /// `Ok` with the index in `order` if present, `Err` with the index where it should be inserted
    /// otherwise.
    fn find(&self, variable: VariableId) -> Result<usize, usize> {
        if self.order.len() < self.search_threshold {
            for (index, &position) in self.order.iter().enumerate() {
                let candidate = self.variables[position as usize];
                if candidate == variable {
                    return Ok(index);
                } else if candidate > variable {
                    return Err(index);
                }
            }
            Err(self.order.len())
        } else {
            self.order.binary_search_by_key(&variable, |&position| self.variables[position as usize])
        }
    }

    /// Make room for one more entry, doubling the capacity when full.
    fn grow(&mut self) {
        let capacity = self.variables.capacity();
        if self.variables.len() == capacity {
            let extra = capacity.max(1);
            self.variables.reserve_exact(extra);
            self.values.reserve_exact(extra);
            self.order.reserve_exact(extra);
        }
    }

    /// Rebuild the arrays without the entries that became zero.
    fn prune_zeros(&mut self) {
        if self.values.iter().all(|&value| value != 0.0) {
            return;
        }

        let mut variables = Vec::with_capacity(self.variables.capacity());
        let mut values = Vec::with_capacity(self.values.capacity());
        for &position in &self.order {
            let value = self.values[position as usize];
            if value != 0.0 {
                variables.push(self.variables[position as usize]);
                values.push(value);
            }
        }

        self.order.clear();
        self.order.extend(0..variables.len() as u32);
        self.variables = variables;
        self.values = values;
    }
}

impl RowStorage for Dense {
    fn get(&self, variable: VariableId) -> f64 {
        match self.find(variable) {
            Ok(index) => self.values[self.order[index] as usize],
            Err(_) => 0.0,
        }
    }

    fn put(&mut self, variable: VariableId, value: f64) {
        if value == 0.0 {
            self.remove(variable);
            return;
        }

        match self.find(variable) {
            Ok(index) => self.values[self.order[index] as usize] = value,
            Err(index) => {
                self.grow();
                let position = self.variables.len() as u32;
                self.variables.push(variable);
                self.values.push(value);
                self.order.insert(index, position);
            },
        }
    }

    fn remove(&mut self, variable: VariableId) -> Option<f64> {
        let index = self.find(variable).ok()?;
        let position = self.order.remove(index) as usize;

        let value = self.values.swap_remove(position);
        self.variables.swap_remove(position);

        // The last entry moved into the freed position
        let moved = self.variables.len();
        if position != moved {
            if let Some(entry) = self.order.iter_mut().find(|entry| **entry as usize == moved) {
                *entry = position as u32;
            }
        }

        Some(value)
    }

    fn for_each<F: FnMut(VariableId, f64)>(&self, mut f: F) {
        for &position in &self.order {
            f(self.variables[position as usize], self.values[position as usize]);
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn divide_by(&mut self, divisor: f64) {
        debug_assert_ne!(divisor, 0.0);

        for value in &mut self.values {
            *value /= divisor;
        }
        self.prune_zeros();
    }

    fn negate(&mut self) {
        for value in &mut self.values {
            *value = -*value;
        }
    }

    fn clear(&mut self) {
        self.variables.clear();
        self.values.clear();
        self.order.clear();
    }
}
