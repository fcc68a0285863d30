// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;

use crate::errors::Error;
use crate::linking::LinkedPair;
use crate::variants::arena::VariantArena;
use crate::variants::{VariantEnd, VariantId};

/// Walk between two breakends along a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainPath {
    pub link_count: usize,
    pub assembled_link_count: usize,
}

/// An ordered walk of links across distinct variants.
///
/// Consecutive links share a variant, the earlier one through one end and the later one
/// through the other: `links[i].second()` and `links[i + 1].first()` are the two ends of the
/// same variant.
#[derive(Debug, Clone, PartialEq, Serialize, Getters, CopyGetters)]
pub struct Chain {
    #[getset(get_copy = "pub")]
    id: usize,
    #[getset(get = "pub")]
    links: Vec<LinkedPair>,
}

impl Chain {
    pub fn new(id: usize) -> Self {
        Chain {
            id,
            links: Vec::new(),
        }
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn assembled_link_count(&self) -> usize {
        self.links.iter().filter(|link| link.assembled()).count()
    }

    pub fn first_variant(&self) -> Option<VariantId> {
        self.links.first().map(|link| link.first().variant())
    }

    pub fn last_variant(&self) -> Option<VariantId> {
        self.links.last().map(|link| link.second().variant())
    }

    /// The end of the first variant that is not linked within this chain.
    pub fn first_open_end(&self) -> Option<(VariantId, VariantEnd)> {
        self.links
            .first()
            .map(|link| (link.first().variant(), link.first().end().opposite()))
    }

    /// The end of the last variant that is not linked within this chain.
    pub fn last_open_end(&self) -> Option<(VariantId, VariantEnd)> {
        self.links
            .last()
            .map(|link| (link.second().variant(), link.second().end().opposite()))
    }

    /// Member variants in walk order.
    pub fn variants(&self) -> Vec<VariantId> {
        let mut variants: Vec<_> = self.links.iter().map(|link| link.first().variant()).collect();
        variants.extend(self.last_variant());
        variants
    }

    pub fn contains_variant(&self, variant: VariantId) -> bool {
        self.links.iter().any(|link| link.has_variant(variant))
    }

    pub fn can_add_to_start(&self, pair: &LinkedPair) -> bool {
        self.can_attach(pair, self.first_open_end())
    }

    pub fn can_add_to_end(&self, pair: &LinkedPair) -> bool {
        self.can_attach(pair, self.last_open_end())
    }

    fn can_attach(&self, pair: &LinkedPair, open_end: Option<(VariantId, VariantEnd)>) -> bool {
        match open_end {
            Some((variant, end)) if pair.uses(variant, end) => pair
                .other_variant(variant)
                .map_or(false, |other| !self.contains_variant(other)),
            _ => false,
        }
    }

    /// Whether the pair joins the two open ends of this chain.
    pub fn link_would_close_chain(&self, pair: &LinkedPair) -> bool {
        match (self.first_open_end(), self.last_open_end()) {
            (Some((first, first_end)), Some((last, last_end))) => {
                pair.uses(first, first_end) && pair.uses(last, last_end)
            }
            _ => false,
        }
    }

    /// Commit a link to the start or the end of the chain, consuming its two ends.
    ///
    /// On error neither the chain nor the arena are modified.
    pub fn commit(
        &mut self,
        pair: LinkedPair,
        at_start: bool,
        arena: &mut VariantArena,
    ) -> Result<(), Error> {
        if self
            .links
            .iter()
            .any(|link| link.same_variants(&pair) || link.has_link_clash(&pair))
        {
            return Err(Error::ClashDetected {
                chain: self.id,
                link: pair.to_string(),
            });
        }
        if !self.is_empty() {
            let attachable = if at_start {
                self.can_add_to_start(&pair)
            } else {
                self.can_add_to_end(&pair)
            };
            if !attachable || self.link_would_close_chain(&pair) {
                return Err(Error::DetachedLink {
                    chain: self.id,
                    link: pair.to_string(),
                });
            }
        }

        let [(first, first_end), (second, second_end)] = pair.consumed_ends();
        arena.mark_linked(first, first_end)?;
        if let Err(e) = arena.mark_linked(second, second_end) {
            arena.free(first, first_end)?;
            return Err(e);
        }

        let mut pair = pair;
        match (at_start, self.first_variant(), self.last_variant()) {
            (true, Some(first_variant), _) => {
                if pair.second().variant() != first_variant {
                    pair.switch_roles();
                }
                self.links.insert(0, pair);
            }
            (false, _, Some(last_variant)) => {
                if pair.first().variant() != last_variant {
                    pair.switch_roles();
                }
                self.links.push(pair);
            }
            _ => self.links.push(pair),
        }

        if let Err(e) = self.check_invariant() {
            self.pop_link(at_start, arena)?;
            return Err(e);
        }
        debug!(
            "chain {}: committed link {} to {}",
            self.id,
            if at_start {
                &self.links[0]
            } else {
                &self.links[self.links.len() - 1]
            },
            if at_start { "start" } else { "end" }
        );

        Ok(())
    }

    /// Check that no variant end is consumed twice and that consecutive links meet at the
    /// opposite ends of a shared variant.
    pub fn check_invariant(&self) -> Result<(), Error> {
        let violation = |(id, end): (VariantId, VariantEnd)| Error::ChainInvariantViolated {
            chain: self.id,
            id,
            end,
        };

        let mut consumed = HashSet::new();
        for link in &self.links {
            for key in link.consumed_ends().iter() {
                if !consumed.insert(*key) {
                    return Err(violation(*key));
                }
            }
        }
        for (left, right) in self.links.iter().tuple_windows() {
            let (left, right) = (left.second(), right.first());
            if left.variant() != right.variant() || left.end() == right.end() {
                return Err(violation(right.key()));
            }
        }
        let mut members = HashSet::new();
        for (variant, link) in self.variants().into_iter().zip(&self.links) {
            if !members.insert(variant) {
                return Err(violation(link.first().key()));
            }
        }
        if let Some((last, last_end)) = self.last_open_end() {
            if members.contains(&last) {
                return Err(violation((last, last_end.opposite())));
            }
        }

        Ok(())
    }

    /// Remove the first or last link and release its ends.
    pub fn pop_link(
        &mut self,
        at_start: bool,
        arena: &mut VariantArena,
    ) -> Result<Option<LinkedPair>, Error> {
        let link = if at_start {
            if self.links.is_empty() {
                None
            } else {
                Some(self.links.remove(0))
            }
        } else {
            self.links.pop()
        };
        if let Some(link) = &link {
            for &(variant, end) in link.consumed_ends().iter() {
                arena.free(variant, end)?;
            }
        }
        Ok(link)
    }

    /// Remove all links and release their ends.
    pub fn dissolve(&mut self, arena: &mut VariantArena) -> Result<(), Error> {
        for link in self.links.drain(..) {
            for &(variant, end) in link.consumed_ends().iter() {
                arena.free(variant, end)?;
            }
        }
        Ok(())
    }

    /// Whether the two breakends are joined through a walk along this chain, each facing
    /// into the chain.
    pub fn breakends_are_chained(
        &self,
        a: VariantId,
        a_end: VariantEnd,
        b: VariantId,
        b_end: VariantEnd,
    ) -> Option<ChainPath> {
        let variants = self.variants();
        let a_idx = variants.iter().position(|v| *v == a)?;
        let b_idx = variants.iter().position(|v| *v == b)?;

        let (lower, lower_end, upper, upper_end) = if a_idx < b_idx {
            (a_idx, a_end, b_idx, b_end)
        } else if b_idx < a_idx {
            (b_idx, b_end, a_idx, a_end)
        } else {
            return None;
        };

        if self.links[lower].first().end() != lower_end
            || self.links[upper - 1].second().end() != upper_end
        {
            return None;
        }

        let path = &self.links[lower..upper];
        Some(ChainPath {
            link_count: path.len(),
            assembled_link_count: path.iter().filter(|link| link.assembled()).count(),
        })
    }

    /// Genomic extent of the linked breakends, summed over contigs.
    pub fn span(&self) -> u64 {
        let mut extents: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
        for link in &self.links {
            for breakend in &[link.first().breakend(), link.second().breakend()] {
                let extent = extents
                    .entry(breakend.contig())
                    .or_insert((breakend.pos(), breakend.pos()));
                extent.0 = extent.0.min(breakend.pos());
                extent.1 = extent.1.max(breakend.pos());
            }
        }
        extents.values().map(|(min, max)| max - min).sum()
    }

    /// Sum of the positive link lengths.
    pub fn total_link_length(&self) -> u64 {
        self.links
            .iter()
            .filter(|link| link.length() > 0)
            .map(|link| link.length() as u64)
            .sum()
    }
}
