// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::cmp::Ordering;

use crate::linking::pair::LinkedPair;
use crate::variants::arena::VariantArena;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClashVerdict {
    /// The candidate joins the same two variants as a committed link.
    Duplicate,
    /// The candidate would consume an end that is already consumed.
    EndConflict,
    Compatible,
}

/// Decides whether a candidate may be committed next to a set of committed links.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClashDetector;

impl ClashDetector {
    pub fn check(
        arena: &VariantArena,
        committed: &[LinkedPair],
        candidate: &LinkedPair,
    ) -> ClashVerdict {
        if committed.iter().any(|link| link.same_variants(candidate)) {
            ClashVerdict::Duplicate
        } else if committed.iter().any(|link| link.has_link_clash(candidate))
            || candidate
                .consumed_ends()
                .iter()
                .any(|&(variant, end)| !arena.is_free(variant, end))
        {
            ClashVerdict::EndConflict
        } else {
            ClashVerdict::Compatible
        }
    }
}

/// Total order in which candidates are offered to a chain.
///
/// Assembled links come first, then shorter links. Remaining ties are broken by the lower
/// and the higher variant id, the join locus and finally the joined ends.
pub fn candidate_order(a: &LinkedPair, b: &LinkedPair) -> Ordering {
    b.assembled()
        .cmp(&a.assembled())
        .then_with(|| a.length().abs().cmp(&b.length().abs()))
        .then_with(|| a.lower_end().variant().cmp(&b.lower_end().variant()))
        .then_with(|| a.higher_end().variant().cmp(&b.higher_end().variant()))
        .then_with(|| a.join_locus().cmp(b.join_locus()))
        .then_with(|| {
            (a.lower_end().end(), a.higher_end().end())
                .cmp(&(b.lower_end().end(), b.higher_end().end()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linking::classifier::LinkClassifier;
    use crate::variants::{SvVariant, VariantEnd, VariantId};

    fn arena() -> VariantArena {
        let mut arena = VariantArena::new();
        arena
            .insert(
                SvVariant::deletion(1, "1", 100, 200)
                    .unwrap()
                    .with_assembly(VariantEnd::End, vec!["asm".to_owned()]),
            )
            .unwrap();
        arena
            .insert(SvVariant::deletion(2, "1", 300, 400).unwrap())
            .unwrap();
        arena
            .insert(
                SvVariant::deletion(3, "1", 1500, 1600)
                    .unwrap()
                    .with_assembly(VariantEnd::Start, vec!["asm".to_owned()]),
            )
            .unwrap();
        arena
    }

    fn pair(arena: &VariantArena, a: (VariantId, VariantEnd), b: (VariantId, VariantEnd)) -> LinkedPair {
        LinkedPair::create(arena, a, b, &LinkClassifier::default()).unwrap()
    }

    #[test]
    fn test_check() {
        let mut arena = arena();
        let committed = vec![pair(&arena, (1, VariantEnd::End), (2, VariantEnd::Start))];
        arena.mark_linked(1, VariantEnd::End).unwrap();
        arena.mark_linked(2, VariantEnd::Start).unwrap();

        let duplicate = LinkedPair::from_variants(
            arena.get(2).unwrap(),
            VariantEnd::End,
            arena.get(1).unwrap(),
            VariantEnd::Start,
            &LinkClassifier::default(),
        )
        .unwrap();
        assert_eq!(
            ClashDetector::check(&arena, &committed, &duplicate),
            ClashVerdict::Duplicate
        );

        let conflicting = LinkedPair::from_variants(
            arena.get(1).unwrap(),
            VariantEnd::End,
            arena.get(3).unwrap(),
            VariantEnd::Start,
            &LinkClassifier::default(),
        )
        .unwrap();
        assert_eq!(
            ClashDetector::check(&arena, &committed, &conflicting),
            ClashVerdict::EndConflict
        );
        // consumed ends are detected through the arena as well
        assert_eq!(
            ClashDetector::check(&arena, &[], &conflicting),
            ClashVerdict::EndConflict
        );

        let compatible = pair(&arena, (2, VariantEnd::End), (3, VariantEnd::Start));
        assert_eq!(
            ClashDetector::check(&arena, &committed, &compatible),
            ClashVerdict::Compatible
        );
    }

    #[test]
    fn test_candidate_order() {
        let arena = arena();
        let assembled = pair(&arena, (1, VariantEnd::End), (3, VariantEnd::Start));
        let short = pair(&arena, (2, VariantEnd::End), (3, VariantEnd::Start));
        let shorter = pair(&arena, (1, VariantEnd::End), (2, VariantEnd::Start));
        assert!(assembled.assembled());

        let mut candidates = vec![short.clone(), shorter.clone(), assembled.clone()];
        candidates.sort_by(candidate_order);
        assert_eq!(candidates, vec![assembled, shorter.clone(), short]);

        assert_eq!(candidate_order(&shorter, &shorter.switched()), Ordering::Equal);
    }

    #[test]
    fn test_candidate_order_by_id() {
        let mut arena = VariantArena::new();
        for variant in vec![
            SvVariant::deletion(1, "1", 100, 200).unwrap(),
            SvVariant::deletion(2, "1", 300, 400).unwrap(),
            SvVariant::deletion(3, "1", 500, 600).unwrap(),
        ] {
            arena.insert(variant).unwrap();
        }
        // both links are templated insertions of length 100
        let a = pair(&arena, (2, VariantEnd::End), (3, VariantEnd::Start));
        let b = pair(&arena, (1, VariantEnd::End), (2, VariantEnd::Start));
        assert_eq!(candidate_order(&b, &a), Ordering::Less);
        assert_eq!(candidate_order(&a, &b), Ordering::Greater);
    }
}
