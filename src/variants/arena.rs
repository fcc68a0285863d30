// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::BTreeMap;

use crate::errors::Error;
use crate::variants::{SvVariant, VariantEnd, VariantId};

#[derive(Debug, Clone)]
struct Slot {
    variant: SvVariant,
    start_used: bool,
    end_used: bool,
}

impl Slot {
    fn used(&self, end: VariantEnd) -> bool {
        match end {
            VariantEnd::Start => self.start_used,
            VariantEnd::End => self.end_used,
        }
    }

    fn set_used(&mut self, end: VariantEnd, used: bool) {
        match end {
            VariantEnd::Start => self.start_used = used,
            VariantEnd::End => self.end_used = used,
        }
    }
}

/// Used flags of all variants of an arena, for rolling back chain edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSnapshot {
    inner: BTreeMap<VariantId, (bool, bool)>,
}

/// The variants of one cluster, keyed by id, together with the state of their ends.
///
/// Iteration is always in ascending id order.
#[derive(Debug, Clone, Default)]
pub struct VariantArena {
    slots: BTreeMap<VariantId, Slot>,
}

impl VariantArena {
    pub fn new() -> Self {
        VariantArena::default()
    }

    pub fn insert(&mut self, variant: SvVariant) -> Result<(), Error> {
        let id = variant.id();
        if self.slots.contains_key(&id) {
            return Err(Error::DuplicateVariantId { id });
        }
        self.slots.insert(
            id,
            Slot {
                variant,
                start_used: false,
                end_used: false,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: VariantId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn get(&self, id: VariantId) -> Result<&SvVariant, Error> {
        self.slot(id).map(|slot| &slot.variant)
    }

    pub fn variants(&self) -> impl Iterator<Item = &SvVariant> {
        self.slots.values().map(|slot| &slot.variant)
    }

    /// Whether the given end exists and is not consumed by a link.
    pub fn is_free(&self, id: VariantId, end: VariantEnd) -> bool {
        self.slots.get(&id).map_or(false, |slot| {
            slot.variant.breakend(end).is_some() && !slot.used(end)
        })
    }

    pub fn is_used(&self, id: VariantId, end: VariantEnd) -> Result<bool, Error> {
        let slot = self.slot(id)?;
        Self::check_end(slot, end)?;
        Ok(slot.used(end))
    }

    /// All free ends, by ascending variant id and start before end.
    pub fn free_ends(&self) -> impl Iterator<Item = (&SvVariant, VariantEnd)> {
        self.slots.values().flat_map(|slot| {
            slot.variant
                .ends()
                .filter(move |end| !slot.used(*end))
                .map(move |end| (&slot.variant, end))
        })
    }

    pub fn used_count(&self) -> usize {
        self.slots
            .values()
            .map(|slot| slot.start_used as usize + slot.end_used as usize)
            .sum()
    }

    /// Mark the given end as consumed by a committed link.
    pub fn mark_linked(&mut self, id: VariantId, end: VariantEnd) -> Result<(), Error> {
        let slot = self.slot_mut(id)?;
        Self::check_end(slot, end)?;
        if slot.used(end) {
            return Err(Error::EndAlreadyLinked { id, end });
        }
        slot.set_used(end, true);
        Ok(())
    }

    /// Release the given end. Releasing a free or absent end is a no-op.
    pub fn free(&mut self, id: VariantId, end: VariantEnd) -> Result<(), Error> {
        let slot = self.slot_mut(id)?;
        slot.set_used(end, false);
        Ok(())
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            inner: self
                .slots
                .iter()
                .map(|(id, slot)| (*id, (slot.start_used, slot.end_used)))
                .collect(),
        }
    }

    pub fn restore(&mut self, snapshot: &UsageSnapshot) {
        for (id, slot) in self.slots.iter_mut() {
            let (start_used, end_used) = snapshot.inner.get(id).copied().unwrap_or_default();
            slot.start_used = start_used;
            slot.end_used = end_used;
        }
    }

    fn slot(&self, id: VariantId) -> Result<&Slot, Error> {
        self.slots.get(&id).ok_or(Error::UnknownVariant { id })
    }

    fn slot_mut(&mut self, id: VariantId) -> Result<&mut Slot, Error> {
        self.slots.get_mut(&id).ok_or(Error::UnknownVariant { id })
    }

    fn check_end(slot: &Slot, end: VariantEnd) -> Result<(), Error> {
        if slot.variant.breakend(end).is_none() {
            return Err(Error::MissingBreakend {
                id: slot.variant.id(),
                kind: slot.variant.kind(),
                end,
            });
        }
        Ok(())
    }
}
