// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::errors::Error;
use crate::linking::pair::LinkEnd;
use crate::variants::{Breakend, Orientation};

/// Templated insertions shorter than this are reported as deletion bridges.
pub const DEFAULT_SHORT_LINK_THRESHOLD: u64 = 30;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum LinkType {
    #[serde(rename = "TI")]
    #[strum(serialize = "TI")]
    TemplatedInsertion,
    #[serde(rename = "DB")]
    #[strum(serialize = "DB")]
    DeletionBridge,
}

/// Relative placement of two joinable breakends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    /// Same contig, the lower breakend retains sequence to its right and the upper one to its
    /// left, enclosing a templated segment.
    Facing,
    /// Same contig, both breakends retain sequence away from each other.
    FacingAway,
    InterChromosomal,
}

/// Returns the breakend with the lower position first. On equal positions the reverse
/// oriented breakend counts as lower.
pub(crate) fn lower_upper<'a>(a: &'a Breakend, b: &'a Breakend) -> (&'a Breakend, &'a Breakend) {
    if a.pos() < b.pos() || (a.pos() == b.pos() && a.orientation() == Orientation::Reverse) {
        (a, b)
    } else {
        (b, a)
    }
}

pub fn geometry(a: &Breakend, b: &Breakend) -> Result<Geometry, Error> {
    if !a.same_contig(b) {
        return Ok(Geometry::InterChromosomal);
    }
    if a.orientation() == b.orientation() {
        return Err(Error::UnlinkableBreakends {
            first: a.to_string(),
            second: b.to_string(),
        });
    }
    let (lower, _) = lower_upper(a, b);
    Ok(match lower.orientation() {
        Orientation::Reverse => Geometry::Facing,
        Orientation::Forward => Geometry::FacingAway,
    })
}

/// Distance between two breakends on the same contig.
pub fn gap(a: &Breakend, b: &Breakend) -> u64 {
    if a.pos() > b.pos() {
        a.pos() - b.pos()
    } else {
        b.pos() - a.pos()
    }
}

/// Computes type and length of a link between two variant ends.
///
/// The result does not depend on the order of the two ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters, new)]
pub struct LinkClassifier {
    #[getset(get_copy = "pub")]
    short_link_threshold: u64,
}

impl Default for LinkClassifier {
    fn default() -> Self {
        LinkClassifier::new(DEFAULT_SHORT_LINK_THRESHOLD)
    }
}

impl LinkClassifier {
    pub fn classify(&self, a: &LinkEnd, b: &LinkEnd) -> Result<(LinkType, i64), Error> {
        let (a_breakend, b_breakend) = (a.breakend(), b.breakend());
        match geometry(a_breakend, b_breakend)? {
            Geometry::Facing => {
                let templated = gap(a_breakend, b_breakend);
                let len = templated as i64;
                if templated < self.short_link_threshold {
                    Ok((LinkType::DeletionBridge, -len - 1))
                } else {
                    Ok((LinkType::TemplatedInsertion, len))
                }
            }
            Geometry::FacingAway => Ok((
                LinkType::DeletionBridge,
                gap(a_breakend, b_breakend) as i64 - 1,
            )),
            Geometry::InterChromosomal => {
                let len = match (a.insert_len(), b.insert_len()) {
                    (None, None) => 0,
                    (a_len, b_len) => a_len.unwrap_or(0) + b_len.unwrap_or(0),
                };
                Ok((LinkType::TemplatedInsertion, len as i64))
            }
        }
    }
}
