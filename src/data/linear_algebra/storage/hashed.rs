//! # Open addressing row storage
//!
//! A power-of-two table with linear probing. The occupied buckets are chained in ascending
//! variable order, so that iteration doesn't need to sort.
use crate::data::linear_algebra::storage::RowStorage;
use crate::data::variable::VariableId;

const MIN_BUCKETS: usize = 8;

#[derive(Copy, Clone, Debug)]
struct Entry {
    variable: VariableId,
    value: f64,
    previous: Option<usize>,
    next: Option<usize>,
}

#[derive(Copy, Clone, Debug)]
enum Bucket {
    Empty,
    /// Tombstone, keeps lookups scanning past removed entries.
    Deleted,
    Occupied(Entry),
}

/// Hash table keyed by variable, with an ordered chain through the entries.
#[derive(Clone, Debug)]
pub struct Hashed {
    buckets: Vec<Bucket>,
    len: usize,
    nr_deleted: usize,
    /// Bucket of the entry with the lowest variable.
    head: Option<usize>,
    /// Bucket of the entry with the highest variable.
    tail: Option<usize>,
}

impl Hashed {
    /// Create a table that holds `capacity` entries without growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: vec![Bucket::Empty; Self::nr_buckets_for(capacity)],
            len: 0,
            nr_deleted: 0,
            head: None,
            tail: None,
        }
    }

    fn nr_buckets_for(capacity: usize) -> usize {
        (capacity * 4 / 3 + 1).next_power_of_two().max(MIN_BUCKETS)
    }

    fn home(&self, variable: VariableId) -> usize {
        // Fibonacci hashing, the top bits of the product are the best mixed
        let bits = self.buckets.len().trailing_zeros();
        let product = (variable.raw() as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        (product >> (64 - bits)) as usize
    }

    /// Search the buckets for a variable.
    ///
    /// # Return value
    ///
    /// `Ok` with the bucket holding the variable, or `Err` with the bucket a new entry for it
    /// should go into (the first tombstone on its search path, if any).
    fn find(&self, variable: VariableId) -> Result<usize, usize> {
        let mask = self.buckets.len() - 1;
        let mut index = self.home(variable);
        let mut first_deleted = None;

        loop {
            match self.buckets[index] {
                Bucket::Empty => return Err(first_deleted.unwrap_or(index)),
                Bucket::Deleted => {
                    first_deleted.get_or_insert(index);
                },
                Bucket::Occupied(ref entry) if entry.variable == variable => return Ok(index),
                Bucket::Occupied(_) => {},
            }
            index = (index + 1) & mask;
        }
    }

    fn entry(&self, index: usize) -> &Entry {
        match self.buckets[index] {
            Bucket::Occupied(ref entry) => entry,
            _ => unreachable!("ordered chain points at a free bucket"),
        }
    }

    fn entry_mut(&mut self, index: usize) -> &mut Entry {
        match self.buckets[index] {
            Bucket::Occupied(ref mut entry) => entry,
            _ => unreachable!("ordered chain points at a free bucket"),
        }
    }

    /// Place a new entry in a free bucket and link it into the chain.
    fn insert_at(&mut self, index: usize, variable: VariableId, value: f64) {
        // New entries tend to have high identifiers, so search from the back
        let mut previous = self.tail;
        while let Some(candidate) = previous {
            if self.entry(candidate).variable < variable {
                break;
            }
            previous = self.entry(candidate).previous;
        }
        let next = match previous {
            Some(previous) => self.entry(previous).next,
            None => self.head,
        };

        if let Bucket::Deleted = self.buckets[index] {
            self.nr_deleted -= 1;
        }
        self.buckets[index] = Bucket::Occupied(Entry { variable, value, previous, next });
        match previous {
            Some(previous) => self.entry_mut(previous).next = Some(index),
            None => self.head = Some(index),
        }
        match next {
            Some(next) => self.entry_mut(next).previous = Some(index),
            None => self.tail = Some(index),
        }
        self.len += 1;
    }

    fn remove_at(&mut self, index: usize) -> f64 {
        let Entry { value, previous, next, .. } = *self.entry(index);
        match previous {
            Some(previous) => self.entry_mut(previous).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.entry_mut(next).previous = previous,
            None => self.tail = previous,
        }

        self.len -= 1;
        if self.len == 0 {
            self.buckets.fill(Bucket::Empty);
            self.nr_deleted = 0;
        } else {
            self.buckets[index] = Bucket::Deleted;
            self.nr_deleted += 1;
        }

        value
    }

    /// Rebuild the table, doubling it unless most of the load is tombstones.
    fn rehash(&mut self) {
        let entries = self.to_vec();
        let nr_buckets = if (self.len + 1) * 2 > self.buckets.len() {
            self.buckets.len() * 2
        } else {
            self.buckets.len()
        };

        self.buckets.clear();
        self.buckets.resize(nr_buckets, Bucket::Empty);
        self.len = 0;
        self.nr_deleted = 0;
        self.head = None;
        self.tail = None;

        for (variable, value) in entries {
            if let Err(index) = self.find(variable) {
                self.insert_at(index, variable, value);
            }
        }
    }

    fn is_over_loaded(&self) -> bool {
        (self.len + self.nr_deleted + 1) * 4 > self.buckets.len() * 3
    }
}

impl RowStorage for Hashed {
    fn get(&self, variable: VariableId) -> f64 {
        match self.find(variable) {
            Ok(index) => self.entry(index).value,
            Err(_) => 0.0,
        }
    }

    fn put(&mut self, variable: VariableId, value: f64) {
        if value == 0.0 {
            self.remove(variable);
            return;
        }

        match self.find(variable) {
            Ok(index) => self.entry_mut(index).value = value,
            Err(mut index) => {
                if self.is_over_loaded() {
                    self.rehash();
                    index = match self.find(variable) {
                        Ok(index) | Err(index) => index,
                    };
                }
                self.insert_at(index, variable, value);
            },
        }
    }

    fn remove(&mut self, variable: VariableId) -> Option<f64> {
        let index = self.find(variable).ok()?;
        Some(self.remove_at(index))
    }

    fn for_each<F: FnMut(VariableId, f64)>(&self, mut f: F) {
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let entry = self.entry(index);
            f(entry.variable, entry.value);
            cursor = entry.next;
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn divide_by(&mut self, divisor: f64) {
        debug_assert_ne!(divisor, 0.0);

        let mut underflowed = Vec::new();
        for bucket in &mut self.buckets {
            if let Bucket::Occupied(entry) = bucket {
                entry.value /= divisor;
                if entry.value == 0.0 {
                    underflowed.push(entry.variable);
                }
            }
        }
        for variable in underflowed {
            self.remove(variable);
        }
    }

    fn negate(&mut self) {
        for bucket in &mut self.buckets {
            if let Bucket::Occupied(entry) = bucket {
                entry.value = -entry.value;
            }
        }
    }

    fn clear(&mut self) {
        self.buckets.fill(Bucket::Empty);
        self.len = 0;
        self.nr_deleted = 0;
        self.head = None;
        self.tail = None;
    }
}
