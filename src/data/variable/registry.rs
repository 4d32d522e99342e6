//! # Variable registry
//!
//! An arena of variable records indexed by `VariableId`. Released identifiers go on a free list and
//! are handed out again, so that the identifiers in use stay small and dense.
use std::ops::{Index, IndexMut};

use log::trace;

use crate::data::linear_algebra::row::RowId;
use crate::data::variable::{SessionId, Strength, StrengthVector, Variable, VariableId, VariableKind};
use crate::error::{Result, SolverError};

/// Everything the solver knows about one variable.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableRecord {
    name: String,
    kind: VariableKind,
    /// Value as of the last time the system was resolved.
    value: f64,
    /// Row defining this variable, if it is basic.
    definition: Option<RowId>,
    /// For error variables: the level(s) this variable penalizes.
    strength: Option<StrengthVector>,
}

impl VariableRecord {
    fn new(name: String, kind: VariableKind, strength: Option<StrengthVector>) -> Self {
        Self { name, kind, value: 0.0, definition: None, strength }
    }

    /// Name used when describing rows.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role of the variable in the tableau.
    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    /// Value written by the last call to `LinearSystem::resolve`.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Row in which this variable is basic.
    pub fn definition(&self) -> Option<RowId> {
        self.definition
    }

    /// Strength vector of an error variable.
    pub fn strength_vector(&self) -> Option<&StrengthVector> {
        self.strength.as_ref()
    }

    pub(crate) fn set_definition(&mut self, definition: Option<RowId>) {
        self.definition = definition;
    }

    pub(crate) fn set_value(&mut self, value: f64) {
        self.value = value;
    }
}

#[derive(Clone, Debug)]
struct Slot {
    /// Incremented on every release, invalidating outstanding handles.
    generation: u32,
    record: Option<VariableRecord>,
}

/// Owns all variables of a solve session.
#[derive(Debug)]
pub struct VariableRegistry {
    session: SessionId,
    slots: Vec<Slot>,
    free: Vec<VariableId>,
    nr_live: usize,
}

impl VariableRegistry {
    /// Start a new, empty session.
    pub fn new() -> Self {
        Self {
            session: SessionId::next(),
            slots: Vec::new(),
            free: Vec::new(),
            nr_live: 0,
        }
    }

    /// Session stamped on every handle handed out since the last reset.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Create a variable, reusing a released identifier when one is available.
    ///
    /// # Arguments
    ///
    /// * `name`: Only used for diagnostics, doesn't need to be unique.
    /// * `kind`: Role of the variable in the tableau.
    pub fn create(&mut self, name: impl Into<String>, kind: VariableKind) -> Variable {
        self.allocate(VariableRecord::new(name.into(), kind, None))
    }

    /// Create an error variable penalizing violations at `strength`.
    pub fn create_error(&mut self, name: impl Into<String>, strength: Strength) -> Variable {
        let vector = StrengthVector::unit(strength);
        self.allocate(VariableRecord::new(name.into(), VariableKind::Error, Some(vector)))
    }

    fn allocate(&mut self, record: VariableRecord) -> Variable {
        self.nr_live += 1;

        let id = match self.free.pop() {
            Some(id) => {
                let slot = &mut self.slots[id.index()];
                debug_assert!(slot.record.is_none());
                slot.record = Some(record);
                id
            },
            None => {
                let id = VariableId::new(self.slots.len() as u32);
                self.slots.push(Slot { generation: 0, record: Some(record) });
                id
            },
        };
        trace!("created variable {} ({})", id, self.slots[id.index()].record.as_ref().map_or("", |r| r.name()));

        Variable::new(self.session, id, self.slots[id.index()].generation)
    }

    /// Return a variable's identifier to the free pool.
    ///
    /// The handle, and any copy of it, is stale afterwards.
    ///
    /// # Errors
    ///
    /// If the handle is stale already or belongs to another session.
    pub fn release(&mut self, variable: Variable) -> Result<()> {
        let id = self.resolve(variable)?;
        self.release_id(id);
        Ok(())
    }

    /// Release by identifier, for variables the solver created for itself.
    pub(crate) fn release_id(&mut self, id: VariableId) {
        let slot = &mut self.slots[id.index()];
        debug_assert!(slot.record.is_some());
        debug_assert!(slot.record.as_ref().is_none_or(|record| record.definition.is_none()));

        if slot.record.take().is_some() {
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id);
            self.nr_live -= 1;
        }
    }

    /// Check a handle and translate it to the identifier used inside rows.
    ///
    /// # Errors
    ///
    /// `ForeignVariable` if the handle was made by another session, `StaleVariable` if it was
    /// released.
    pub fn resolve(&self, variable: Variable) -> Result<VariableId> {
        if variable.session() != self.session {
            return Err(SolverError::ForeignVariable(variable.id()));
        }

        match self.slots.get(variable.id().index()) {
            Some(slot) if slot.generation == variable.generation() && slot.record.is_some() => {
                Ok(variable.id())
            },
            _ => Err(SolverError::StaleVariable(variable.id())),
        }
    }

    /// The record behind a handle.
    ///
    /// # Errors
    ///
    /// See `resolve`.
    pub fn lookup(&self, variable: Variable) -> Result<&VariableRecord> {
        let id = self.resolve(variable)?;
        Ok(&self[id])
    }

    /// The record of a live identifier, if any.
    pub fn get(&self, id: VariableId) -> Option<&VariableRecord> {
        self.slots.get(id.index()).and_then(|slot| slot.record.as_ref())
    }

    /// A handle for an identifier that is currently live.
    pub fn handle(&self, id: VariableId) -> Option<Variable> {
        self.slots.get(id.index())
            .filter(|slot| slot.record.is_some())
            .map(|slot| Variable::new(self.session, id, slot.generation))
    }

    /// Live variables in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item=(VariableId, &VariableRecord)> {
        self.slots.iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.record.as_ref().map(|record| (VariableId::new(index as u32), record))
            })
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item=(VariableId, &mut VariableRecord)> {
        self.slots.iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.record.as_mut().map(|record| (VariableId::new(index as u32), record))
            })
    }

    /// Number of live variables.
    pub fn len(&self) -> usize {
        self.nr_live
    }

    /// Whether no variable is live.
    pub fn is_empty(&self) -> bool {
        self.nr_live == 0
    }

    /// Release all variables and start a new session.
    ///
    /// Identifiers are handed out from zero again, and all existing handles become foreign.
    pub fn reset(&mut self) {
        self.session = SessionId::next();
        self.slots.clear();
        self.free.clear();
        self.nr_live = 0;
    }
}

impl Default for VariableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Direct access for identifiers the solver keeps in its rows.
///
/// Panics on identifiers that are not live, which would be a broken tableau invariant.
impl Index<VariableId> for VariableRegistry {
    type Output = VariableRecord;

    fn index(&self, id: VariableId) -> &Self::Output {
        match self.slots[id.index()].record {
            Some(ref record) => record,
            None => panic!("variable {} is not live", id),
        }
    }
}

impl IndexMut<VariableId> for VariableRegistry {
    fn index_mut(&mut self, id: VariableId) -> &mut Self::Output {
        match self.slots[id.index()].record {
            Some(ref mut record) => record,
            None => panic!("variable {} is not live", id),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::data::variable::{Strength, VariableKind, VariableRegistry};
    use crate::error::SolverError;

    #[test]
    fn create_and_lookup() {
        let mut registry = VariableRegistry::new();
        let a = registry.create("a", VariableKind::Unrestricted);
        let b = registry.create("b", VariableKind::Slack);
        assert_ne!(a.id(), b.id());
        assert_eq!(registry.len(), 2);

        let record = registry.lookup(b).unwrap();
        assert_eq!(record.name(), "b");
        assert_eq!(record.kind(), VariableKind::Slack);
        assert_eq!(record.definition(), None);
        assert_eq!(record.value(), 0.0);
        assert!(record.strength_vector().is_none());
    }

    #[test]
    fn error_variables_carry_their_strength() {
        let mut registry = VariableRegistry::new();
        let error = registry.create_error("e", Strength::High);
        let vector = registry.lookup(error).unwrap().strength_vector().copied().unwrap();
        assert_eq!(vector.get(Strength::High), 1.0);
        assert_eq!(vector.highest_level(), Some(Strength::High));
        assert_eq!(registry[error.id()].kind(), VariableKind::Error);
    }

    #[test]
    fn identifiers_are_reused() {
        let mut registry = VariableRegistry::new();
        let a = registry.create("a", VariableKind::Unrestricted);
        let _b = registry.create("b", VariableKind::Unrestricted);
        registry.release(a).unwrap();
        assert_eq!(registry.len(), 1);

        let c = registry.create("c", VariableKind::Slack);
        assert_eq!(c.id(), a.id());
        assert_eq!(registry.lookup(c).unwrap().name(), "c");
    }

    #[test]
    fn stale_handles_are_rejected() {
        let mut registry = VariableRegistry::new();
        let a = registry.create("a", VariableKind::Unrestricted);
        registry.release(a).unwrap();
        assert_eq!(registry.lookup(a), Err(SolverError::StaleVariable(a.id())));
        assert_eq!(registry.release(a), Err(SolverError::StaleVariable(a.id())));

        // Even after the identifier is reused
        let _b = registry.create("b", VariableKind::Unrestricted);
        assert_eq!(registry.resolve(a), Err(SolverError::StaleVariable(a.id())));
    }

    #[test]
    fn foreign_and_reset_handles_are_rejected() {
        let mut first = VariableRegistry::new();
        let second = VariableRegistry::new();
        let a = first.create("a", VariableKind::Unrestricted);
        assert_eq!(second.resolve(a), Err(SolverError::ForeignVariable(a.id())));

        first.reset();
        assert!(first.is_empty());
        assert_eq!(first.resolve(a), Err(SolverError::ForeignVariable(a.id())));
        let b = first.create("b", VariableKind::Unrestricted);
        assert_eq!(b.id().index(), 0);
    }

    #[test]
    fn iteration_skips_released() {
        let mut registry = VariableRegistry::new();
        let handles = (0..4)
            .map(|i| registry.create(format!("x{}", i), VariableKind::Unrestricted))
            .collect::<Vec<_>>();
        registry.release(handles[1]).unwrap();
        let names = registry.iter().map(|(_, record)| record.name().to_string()).collect::<Vec<_>>();
        assert_eq!(names, vec!["x0", "x2", "x3"]);
        assert_eq!(registry.handle(handles[1].id()), None);
        assert_eq!(registry.handle(handles[2].id()), Some(handles[2]));
    }
}
