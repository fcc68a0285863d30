// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Structural variants and their breakends, as delivered by the upstream clustering step.

use std::fmt;

use bio_types::genome::{self, AbstractLocus};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::errors::Error;

pub mod arena;

pub type VariantId = u32;

/// Side of a breakend on which the variant's sequence continues.
///
/// `Forward` (+1) means the sequence to the left of the position is retained, as for the lower
/// breakend of a deletion. `Reverse` (-1) means the sequence to the right is retained.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
pub enum Orientation {
    #[serde(rename = "+")]
    #[strum(serialize = "+")]
    Forward,
    #[serde(rename = "-")]
    #[strum(serialize = "-")]
    Reverse,
}

impl Orientation {
    pub fn sign(self) -> i8 {
        match self {
            Orientation::Forward => 1,
            Orientation::Reverse => -1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reverse,
            Orientation::Reverse => Orientation::Forward,
        }
    }
}

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
    EnumIter,
    IntoStaticStr,
)]
pub enum SvKind {
    #[serde(rename = "DEL")]
    #[strum(serialize = "DEL")]
    Del,
    #[serde(rename = "DUP")]
    #[strum(serialize = "DUP")]
    Dup,
    #[serde(rename = "INV")]
    #[strum(serialize = "INV")]
    Inv,
    #[serde(rename = "INS")]
    #[strum(serialize = "INS")]
    Ins,
    #[serde(rename = "BND")]
    #[strum(serialize = "BND")]
    Bnd,
    #[serde(rename = "SGL")]
    #[strum(serialize = "SGL")]
    Sgl,
}

impl SvKind {
    /// Whether variants of this kind carry a second (end) breakend.
    pub fn has_end_breakend(self) -> bool {
        self != SvKind::Sgl
    }
}

/// One of the two ends of a variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
pub enum VariantEnd {
    #[serde(rename = "start")]
    #[strum(serialize = "start")]
    Start,
    #[serde(rename = "end")]
    #[strum(serialize = "end")]
    End,
}

impl VariantEnd {
    pub fn from_start(on_start: bool) -> Self {
        if on_start {
            VariantEnd::Start
        } else {
            VariantEnd::End
        }
    }

    pub fn is_start(self) -> bool {
        self == VariantEnd::Start
    }

    pub fn opposite(self) -> Self {
        match self {
            VariantEnd::Start => VariantEnd::End,
            VariantEnd::End => VariantEnd::Start,
        }
    }
}

/// Immutable genomic endpoint of a structural variant.
///
/// Ordering is by contig, then position, then orientation.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Getters, CopyGetters,
)]
pub struct Breakend {
    #[getset(get = "pub")]
    locus: genome::Locus,
    #[getset(get_copy = "pub")]
    orientation: Orientation,
}

impl Breakend {
    pub fn new(contig: &str, pos: u64, orientation: Orientation) -> Self {
        Breakend {
            locus: genome::Locus::new(contig.to_owned(), pos),
            orientation,
        }
    }

    pub fn contig(&self) -> &str {
        AbstractLocus::contig(&self.locus)
    }

    pub fn pos(&self) -> u64 {
        AbstractLocus::pos(&self.locus)
    }

    pub fn same_contig(&self, other: &Breakend) -> bool {
        self.contig() == other.contig()
    }
}

impl fmt::Display for Breakend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.contig(), self.pos(), self.orientation)
    }
}

/// Whether two sets of assembly identifiers have a member in common.
pub(crate) fn shares_assembly(a: &[String], b: &[String]) -> bool {
    a.iter().any(|asmb| b.contains(asmb))
}

/// A structural variant with one or two breakends.
///
/// All positional data is fixed at construction. Whether an end is consumed by a link is not
/// stored here but in the [`arena::VariantArena`] owning the variant during chaining.
#[derive(Debug, Clone, Serialize, Getters, CopyGetters)]
pub struct SvVariant {
    #[getset(get_copy = "pub")]
    id: VariantId,
    #[getset(get_copy = "pub")]
    kind: SvKind,
    #[getset(get = "pub")]
    start: Breakend,
    #[getset(get = "pub")]
    end: Option<Breakend>,
    assembly_start: Vec<String>,
    assembly_end: Vec<String>,
    /// Length of inserted sequence at the junction, if assembled.
    #[getset(get_copy = "pub")]
    insert_len: Option<u64>,
    #[getset(get_copy = "pub")]
    ploidy: Option<f64>,
    #[getset(get_copy = "pub")]
    copy_number_change: Option<f64>,
}

impl PartialEq for SvVariant {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SvVariant {}

impl SvVariant {
    /// Create a variant, checking that its breakends are consistent with its kind.
    pub fn new(
        id: VariantId,
        kind: SvKind,
        start: Breakend,
        end: Option<Breakend>,
    ) -> Result<Self, Error> {
        validate_breakends(id, kind, &start, end.as_ref())?;

        Ok(SvVariant {
            id,
            kind,
            start,
            end,
            assembly_start: Vec::new(),
            assembly_end: Vec::new(),
            insert_len: None,
            ploidy: None,
            copy_number_change: None,
        })
    }

    pub fn deletion(id: VariantId, contig: &str, start: u64, end: u64) -> Result<Self, Error> {
        SvVariant::new(
            id,
            SvKind::Del,
            Breakend::new(contig, start, Orientation::Forward),
            Some(Breakend::new(contig, end, Orientation::Reverse)),
        )
    }

    pub fn duplication(id: VariantId, contig: &str, start: u64, end: u64) -> Result<Self, Error> {
        SvVariant::new(
            id,
            SvKind::Dup,
            Breakend::new(contig, start, Orientation::Reverse),
            Some(Breakend::new(contig, end, Orientation::Forward)),
        )
    }

    pub fn inversion(
        id: VariantId,
        contig: &str,
        start: u64,
        end: u64,
        orientation: Orientation,
    ) -> Result<Self, Error> {
        SvVariant::new(
            id,
            SvKind::Inv,
            Breakend::new(contig, start, orientation),
            Some(Breakend::new(contig, end, orientation)),
        )
    }

    pub fn translocation(id: VariantId, start: Breakend, end: Breakend) -> Result<Self, Error> {
        SvVariant::new(id, SvKind::Bnd, start, Some(end))
    }

    pub fn single(
        id: VariantId,
        contig: &str,
        pos: u64,
        orientation: Orientation,
    ) -> Result<Self, Error> {
        SvVariant::new(
            id,
            SvKind::Sgl,
            Breakend::new(contig, pos, orientation),
            None,
        )
    }

    /// Attach the assembly identifiers observed at the given end.
    pub fn with_assembly(mut self, end: VariantEnd, ids: Vec<String>) -> Self {
        match end {
            VariantEnd::Start => self.assembly_start = ids,
            VariantEnd::End => self.assembly_end = ids,
        }
        self
    }

    pub fn with_insert_len(mut self, insert_len: Option<u64>) -> Self {
        self.insert_len = insert_len;
        self
    }

    pub fn with_copy_number(mut self, ploidy: Option<f64>, copy_number_change: Option<f64>) -> Self {
        self.ploidy = ploidy;
        self.copy_number_change = copy_number_change;
        self
    }

    pub fn breakend(&self, end: VariantEnd) -> Option<&Breakend> {
        match end {
            VariantEnd::Start => Some(&self.start),
            VariantEnd::End => self.end.as_ref(),
        }
    }

    pub fn position(&self, end: VariantEnd) -> Option<u64> {
        self.breakend(end).map(|breakend| breakend.pos())
    }

    pub fn assembly(&self, end: VariantEnd) -> &[String] {
        match end {
            VariantEnd::Start => &self.assembly_start,
            VariantEnd::End => &self.assembly_end,
        }
    }

    pub fn is_single(&self) -> bool {
        self.end.is_none()
    }

    /// Ends that carry a breakend, start first.
    pub fn ends(&self) -> impl Iterator<Item = VariantEnd> {
        std::iter::once(VariantEnd::Start).chain(self.end.as_ref().map(|_| VariantEnd::End))
    }
}

impl fmt::Display for SvVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.end {
            Some(end) => write!(f, "{} {} {}-{}", self.id, self.kind, self.start, end),
            None => write!(f, "{} {} {}", self.id, self.kind, self.start),
        }
    }
}

fn validate_breakends(
    id: VariantId,
    kind: SvKind,
    start: &Breakend,
    end: Option<&Breakend>,
) -> Result<(), Error> {
    let inconsistent = |msg: &str| Error::InconsistentBreakends {
        id,
        kind,
        msg: msg.to_owned(),
    };

    let end = match (kind.has_end_breakend(), end) {
        (true, Some(end)) => end,
        (true, None) => {
            return Err(Error::MissingBreakend {
                id,
                kind,
                end: VariantEnd::End,
            })
        }
        (false, Some(_)) => return Err(Error::UnexpectedEndBreakend { id }),
        (false, None) => return Ok(()),
    };

    if kind == SvKind::Bnd {
        if start.same_contig(end) {
            return Err(inconsistent("translocation breakends lie on the same contig"));
        }
        return Ok(());
    }

    if !start.same_contig(end) {
        return Err(inconsistent("breakends lie on different contigs"));
    }
    if start.pos() > end.pos() {
        return Err(inconsistent("start lies behind end"));
    }

    let orientations_ok = match kind {
        SvKind::Del | SvKind::Ins => {
            start.orientation() == Orientation::Forward
                && end.orientation() == Orientation::Reverse
        }
        SvKind::Dup => {
            start.orientation() == Orientation::Reverse
                && end.orientation() == Orientation::Forward
        }
        SvKind::Inv => start.orientation() == end.orientation(),
        SvKind::Bnd | SvKind::Sgl => true,
    };
    if !orientations_ok {
        return Err(inconsistent("breakend orientations do not match the variant kind"));
    }

    Ok(())
}
