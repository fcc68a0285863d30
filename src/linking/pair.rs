// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

use crate::errors::Error;
use crate::linking::classifier::{LinkClassifier, LinkType};
use crate::variants::arena::VariantArena;
use crate::variants::{shares_assembly, Breakend, SvVariant, VariantEnd, VariantId};

/// One side of a link: a variant end together with the positional data needed to classify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, CopyGetters)]
pub struct LinkEnd {
    #[getset(get_copy = "pub")]
    variant: VariantId,
    #[getset(get_copy = "pub")]
    end: VariantEnd,
    #[getset(get = "pub")]
    breakend: Breakend,
    #[serde(skip)]
    #[getset(get_copy = "pub")]
    insert_len: Option<u64>,
}

impl LinkEnd {
    pub fn of(variant: &SvVariant, end: VariantEnd) -> Result<Self, Error> {
        let breakend = variant
            .breakend(end)
            .ok_or(Error::MissingBreakend {
                id: variant.id(),
                kind: variant.kind(),
                end,
            })?
            .clone();
        Ok(LinkEnd {
            variant: variant.id(),
            end,
            breakend,
            insert_len: variant.insert_len(),
        })
    }

    pub fn key(&self) -> (VariantId, VariantEnd) {
        (self.variant, self.end)
    }
}

/// A link joining one end of a first variant to one end of a second variant.
///
/// A pair is a plain value. Chains own their pairs, and committing a pair is what consumes
/// the two ends in the [`VariantArena`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, CopyGetters)]
pub struct LinkedPair {
    #[getset(get = "pub")]
    first: LinkEnd,
    #[getset(get = "pub")]
    second: LinkEnd,
    #[getset(get_copy = "pub")]
    link_type: LinkType,
    #[getset(get_copy = "pub")]
    length: i64,
    /// Whether both ends were seen in a common assembly.
    #[getset(get_copy = "pub")]
    assembled: bool,
    #[serde(skip)]
    classifier: LinkClassifier,
}

impl LinkedPair {
    /// Create a candidate link between two free ends of the arena.
    ///
    /// Neither end is marked as used.
    pub fn create(
        arena: &VariantArena,
        (first, first_end): (VariantId, VariantEnd),
        (second, second_end): (VariantId, VariantEnd),
        classifier: &LinkClassifier,
    ) -> Result<Self, Error> {
        if first == second {
            return Err(Error::SelfLink { id: first });
        }
        let first_variant = arena.get(first)?;
        let second_variant = arena.get(second)?;
        for &(variant, end) in &[(first_variant, first_end), (second_variant, second_end)] {
            if variant.breakend(end).is_none() {
                return Err(Error::MissingBreakend {
                    id: variant.id(),
                    kind: variant.kind(),
                    end,
                });
            }
            if !arena.is_free(variant.id(), end) {
                return Err(Error::EndAlreadyUsed {
                    id: variant.id(),
                    end,
                });
            }
        }

        LinkedPair::from_variants(
            first_variant,
            first_end,
            second_variant,
            second_end,
            classifier,
        )
    }

    /// Create a link without consulting any used flags.
    pub(crate) fn from_variants(
        first: &SvVariant,
        first_end: VariantEnd,
        second: &SvVariant,
        second_end: VariantEnd,
        classifier: &LinkClassifier,
    ) -> Result<Self, Error> {
        if first.id() == second.id() {
            return Err(Error::SelfLink { id: first.id() });
        }
        let assembled = shares_assembly(first.assembly(first_end), second.assembly(second_end));
        let first = LinkEnd::of(first, first_end)?;
        let second = LinkEnd::of(second, second_end)?;
        let (link_type, length) = classifier.classify(&first, &second)?;

        Ok(LinkedPair {
            first,
            second,
            link_type,
            length,
            assembled,
            classifier: *classifier,
        })
    }

    /// Swap the roles of first and second variant. The joined ends stay the same.
    pub fn switch_roles(&mut self) {
        std::mem::swap(&mut self.first, &mut self.second);

        match self.classifier.classify(&self.first, &self.second) {
            Ok(classification) if classification == (self.link_type, self.length) => (),
            _ => panic!(
                "bug: switching roles of link {} changed its classification",
                self
            ),
        }
    }

    /// Role-swapped copy of this link.
    pub fn switched(&self) -> Self {
        let mut pair = self.clone();
        pair.switch_roles();
        pair
    }

    pub fn first_link_on_start(&self) -> bool {
        self.first.end().is_start()
    }

    pub fn second_link_on_start(&self) -> bool {
        self.second.end().is_start()
    }

    pub fn first_unlinked_on_start(&self) -> bool {
        !self.first_link_on_start()
    }

    pub fn second_unlinked_on_start(&self) -> bool {
        !self.second_link_on_start()
    }

    /// Whether both pairs join the same two variants, regardless of roles and ends.
    pub fn same_variants(&self, other: &LinkedPair) -> bool {
        (self.first.variant() == other.first.variant()
            && self.second.variant() == other.second.variant())
            || (self.first.variant() == other.second.variant()
                && self.second.variant() == other.first.variant())
    }

    /// Whether the two pairs would consume a common variant end while joining different
    /// variants.
    pub fn has_link_clash(&self, other: &LinkedPair) -> bool {
        if self.same_variants(other) {
            return false;
        }
        let other_ends = other.consumed_ends();
        self.consumed_ends()
            .iter()
            .any(|end| other_ends.contains(end))
    }

    pub fn consumed_ends(&self) -> [(VariantId, VariantEnd); 2] {
        [self.first.key(), self.second.key()]
    }

    pub fn uses(&self, variant: VariantId, end: VariantEnd) -> bool {
        self.consumed_ends().contains(&(variant, end))
    }

    pub fn has_variant(&self, variant: VariantId) -> bool {
        self.first.variant() == variant || self.second.variant() == variant
    }

    /// The end through which the given variant takes part in this link.
    pub fn end_of(&self, variant: VariantId) -> Option<VariantEnd> {
        if self.first.variant() == variant {
            Some(self.first.end())
        } else if self.second.variant() == variant {
            Some(self.second.end())
        } else {
            None
        }
    }

    pub fn other_variant(&self, variant: VariantId) -> Option<VariantId> {
        if self.first.variant() == variant {
            Some(self.second.variant())
        } else if self.second.variant() == variant {
            Some(self.first.variant())
        } else {
            None
        }
    }

    /// The lexicographically first breakend of the join.
    pub fn join_locus(&self) -> &Breakend {
        std::cmp::min(self.first.breakend(), self.second.breakend())
    }

    pub(crate) fn lower_end(&self) -> &LinkEnd {
        if self.first.variant() <= self.second.variant() {
            &self.first
        } else {
            &self.second
        }
    }

    pub(crate) fn higher_end(&self) -> &LinkEnd {
        if self.first.variant() <= self.second.variant() {
            &self.second
        } else {
            &self.first
        }
    }
}

impl fmt::Display for LinkedPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.first.variant(),
            self.first.end(),
            self.second.variant(),
            self.second.end()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::Orientation;

    fn arena() -> VariantArena {
        let mut arena = VariantArena::new();
        for variant in vec![
            SvVariant::deletion(1, "1", 100, 200).unwrap(),
            SvVariant::deletion(2, "1", 300, 400).unwrap(),
            SvVariant::deletion(3, "1", 500, 600).unwrap(),
            SvVariant::single(4, "2", 50, Orientation::Reverse).unwrap(),
        ] {
            arena.insert(variant).unwrap();
        }
        arena
    }

    fn pair(arena: &VariantArena, a: (VariantId, VariantEnd), b: (VariantId, VariantEnd)) -> LinkedPair {
        LinkedPair::create(arena, a, b, &LinkClassifier::default()).unwrap()
    }

    #[test]
    fn test_create() {
        let arena = arena();
        let lp = pair(&arena, (1, VariantEnd::End), (2, VariantEnd::Start));
        assert_eq!(lp.link_type(), LinkType::TemplatedInsertion);
        assert_eq!(lp.length(), 100);
        assert!(!lp.first_link_on_start());
        assert!(lp.first_unlinked_on_start());
        assert!(lp.second_link_on_start());
        assert!(!lp.second_unlinked_on_start());
        assert_eq!(lp.to_string(), "1:end-2:start");
        // creating a candidate consumes nothing
        assert_eq!(arena.used_count(), 0);
    }

    #[test]
    fn test_create_failures() {
        let mut arena = arena();
        let classifier = LinkClassifier::default();
        assert_eq!(
            LinkedPair::create(&arena, (1, VariantEnd::End), (1, VariantEnd::Start), &classifier),
            Err(Error::SelfLink { id: 1 })
        );
        assert_eq!(
            LinkedPair::create(&arena, (1, VariantEnd::End), (9, VariantEnd::Start), &classifier),
            Err(Error::UnknownVariant { id: 9 })
        );
        assert!(matches!(
            LinkedPair::create(&arena, (4, VariantEnd::End), (2, VariantEnd::Start), &classifier),
            Err(Error::MissingBreakend { id: 4, .. })
        ));

        arena.mark_linked(2, VariantEnd::Start).unwrap();
        assert_eq!(
            LinkedPair::create(&arena, (1, VariantEnd::End), (2, VariantEnd::Start), &classifier),
            Err(Error::EndAlreadyUsed {
                id: 2,
                end: VariantEnd::Start
            })
        );
    }

    #[test]
    fn test_switch_roles() {
        let arena = arena();
        let lp = pair(&arena, (1, VariantEnd::End), (2, VariantEnd::Start));

        let mut switched = lp.clone();
        switched.switch_roles();
        assert_eq!(switched.first().variant(), 2);
        assert!(switched.first_link_on_start());
        assert_eq!(switched.link_type(), lp.link_type());
        assert_eq!(switched.length(), lp.length());
        assert_eq!(switched.to_string(), "2:start-1:end");

        switched.switch_roles();
        assert_eq!(switched, lp);
        assert_eq!(lp.switched().switched(), lp);
    }

    #[test]
    fn test_same_variants_and_clash() {
        let arena = arena();
        let lp1 = pair(&arena, (1, VariantEnd::End), (2, VariantEnd::Start));
        let lp2 = pair(&arena, (2, VariantEnd::Start), (3, VariantEnd::End));
        let lp3 = pair(&arena, (2, VariantEnd::End), (3, VariantEnd::Start));
        let lp4 = pair(&arena, (2, VariantEnd::End), (1, VariantEnd::Start));

        assert!(lp1.same_variants(&lp1.switched()));
        assert!(lp1.same_variants(&lp4));
        assert!(!lp1.same_variants(&lp2));

        // same variants never clash
        assert!(!lp1.has_link_clash(&lp4));
        // lp1 and lp2 both consume the start of variant 2
        assert!(lp1.has_link_clash(&lp2));
        assert!(lp2.has_link_clash(&lp1));
        assert!(!lp1.has_link_clash(&lp3));
        assert!(!lp3.has_link_clash(&lp1));
    }

    #[test]
    fn test_accessors() {
        let arena = arena();
        let lp = pair(&arena, (2, VariantEnd::Start), (1, VariantEnd::End));
        assert!(lp.uses(1, VariantEnd::End));
        assert!(!lp.uses(1, VariantEnd::Start));
        assert_eq!(lp.other_variant(1), Some(2));
        assert_eq!(lp.other_variant(3), None);
        assert_eq!(lp.end_of(2), Some(VariantEnd::Start));
        assert_eq!(lp.lower_end().variant(), 1);
        assert_eq!(lp.higher_end().variant(), 2);
        assert_eq!(lp.join_locus().pos(), 200);
    }

    #[test]
    fn test_assembled() {
        let mut arena = VariantArena::new();
        arena
            .insert(
                SvVariant::deletion(1, "1", 100, 200)
                    .unwrap()
                    .with_assembly(VariantEnd::End, vec!["asm1".to_owned()]),
            )
            .unwrap();
        arena
            .insert(
                SvVariant::deletion(2, "1", 3000, 4000)
                    .unwrap()
                    .with_assembly(VariantEnd::Start, vec!["asm0".to_owned(), "asm1".to_owned()]),
            )
            .unwrap();
        let lp = pair(&arena, (1, VariantEnd::End), (2, VariantEnd::Start));
        assert!(lp.assembled());
        let lp = pair(&arena, (1, VariantEnd::Start), (2, VariantEnd::End));
        assert!(!lp.assembled());
    }
}
