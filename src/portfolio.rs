//! The ordered set of slots a scheduler chooses from.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use tracing::warn;

use crate::error::{PortfolioError, Result};
use crate::slot::{AlgorithmSlot, SlotId, SlotSpec};

/// Slots in input order plus an identifier index.
///
/// The ordered list is 1:1 with the input. If two inputs share an identifier
/// the index points at the later one, so lookups by id see a single logical
/// slot while round-robin order still visits both entries.
#[derive(Debug)]
pub struct Portfolio {
    slots: Vec<AlgorithmSlot>,
    index: HashMap<SlotId, usize>,
    identifiers: Vec<SlotId>,
}

impl Portfolio {
    pub fn new(slots: Vec<AlgorithmSlot>) -> Result<Self> {
        if slots.is_empty() {
            return Err(PortfolioError::EmptyPortfolio);
        }

        let mut index = HashMap::with_capacity(slots.len());
        let mut identifiers = Vec::with_capacity(slots.len());
        for (position, slot) in slots.iter().enumerate() {
            if index.insert(slot.id().clone(), position).is_some() {
                warn!(slot = %slot.id(), position, "duplicate slot identifier; later entry wins lookups");
            } else {
                identifiers.push(slot.id().clone());
            }
        }

        Ok(Self {
            slots,
            index,
            identifiers,
        })
    }

    pub fn from_specs<'a>(specs: impl IntoIterator<Item = &'a SlotSpec>) -> Result<Self> {
        Self::new(specs.into_iter().map(AlgorithmSlot::from_spec).collect())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Distinct identifiers in first-occurrence order.
    pub fn identifiers(&self) -> &[SlotId] {
        &self.identifiers
    }

    pub fn position(&self, id: &SlotId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, position: usize) -> Option<&AlgorithmSlot> {
        self.slots.get(position)
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut AlgorithmSlot> {
        self.slots.get_mut(position)
    }

    pub fn by_id(&self, id: &SlotId) -> Option<&AlgorithmSlot> {
        self.position(id).and_then(|p| self.slots.get(p))
    }

    pub fn by_id_mut(&mut self, id: &SlotId) -> Option<&mut AlgorithmSlot> {
        let position = self.position(id)?;
        self.slots.get_mut(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AlgorithmSlot> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, AlgorithmSlot> {
        self.slots.iter_mut()
    }
}

impl Index<usize> for Portfolio {
    type Output = AlgorithmSlot;

    fn index(&self, position: usize) -> &AlgorithmSlot {
        &self.slots[position]
    }
}

impl IndexMut<usize> for Portfolio {
    fn index_mut(&mut self, position: usize) -> &mut AlgorithmSlot {
        &mut self.slots[position]
    }
}

impl<'a> IntoIterator for &'a Portfolio {
    type Item = &'a AlgorithmSlot;
    type IntoIter = std::slice::Iter<'a, AlgorithmSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
