// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use strum_macros::Display;

use crate::chaining::chain::Chain;
use crate::chaining::ClusterId;
use crate::errors::{Error, ErrorKind};
use crate::linking::classifier::{gap, geometry, Geometry};
use crate::linking::{candidate_order, ClashDetector, ClashVerdict, LinkClassifier, LinkedPair};
use crate::variants::arena::VariantArena;
use crate::variants::{shares_assembly, SvVariant};

/// State of the chain under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BuilderState {
    Empty,
    Growing,
    Terminated,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDiagnostics {
    pub excluded_variants: usize,
    pub clash_rejections: usize,
    pub duplicate_rejections: usize,
    /// Candidates dropped because they would join the two ends of a finished chain.
    pub closing_rejections: usize,
    pub candidates: usize,
}

#[derive(Debug, Clone, Serialize, Getters)]
#[getset(get = "pub")]
pub struct ClusterResult {
    cluster_id: ClusterId,
    chains: Vec<Chain>,
    diagnostics: ClusterDiagnostics,
    /// Logic defect that stopped the cluster. Chains finished before are kept.
    #[serde(skip)]
    failure: Option<Error>,
}

impl ClusterResult {
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Links the variants of one cluster into chains.
///
/// The builder owns the cluster's [`VariantArena`], so every link commit and rollback goes
/// through it.
#[derive(Debug, Getters, CopyGetters)]
pub struct ChainBuilder {
    #[getset(get_copy = "pub")]
    cluster_id: ClusterId,
    #[getset(get = "pub")]
    arena: VariantArena,
    classifier: LinkClassifier,
    proximity_window: u64,
    #[getset(get_copy = "pub")]
    state: BuilderState,
    #[getset(get_copy = "pub")]
    diagnostics: ClusterDiagnostics,
}

impl ChainBuilder {
    pub fn new(cluster_id: ClusterId, classifier: LinkClassifier, proximity_window: u64) -> Self {
        ChainBuilder {
            cluster_id,
            arena: VariantArena::new(),
            classifier,
            proximity_window,
            state: BuilderState::Empty,
            diagnostics: ClusterDiagnostics::default(),
        }
    }

    /// Add a variant to the cluster. Variants whose id was already added are excluded.
    pub fn add_variant(&mut self, variant: SvVariant) {
        if let Err(e) = self.arena.insert(variant) {
            self.exclude(&e);
        }
    }

    /// Record a variant that could not be used for chaining.
    pub fn exclude(&mut self, error: &Error) {
        warn!(
            "cluster {}: excluding variant from chaining: {}",
            self.cluster_id, error
        );
        self.diagnostics.excluded_variants += 1;
    }

    /// All candidate links between free ends, in the order they are offered to chains.
    ///
    /// Two ends are candidates if they share an assembly, or if they face each other on the
    /// same contig within the proximity window.
    pub fn candidates(&self) -> Vec<LinkedPair> {
        let free_ends: Vec<_> = self.arena.free_ends().collect();
        let mut candidates = Vec::new();

        for (i, &(a, a_end)) in free_ends.iter().enumerate() {
            for &(b, b_end) in &free_ends[i + 1..] {
                if a.id() == b.id() {
                    continue;
                }
                let (a_breakend, b_breakend) = match (a.breakend(a_end), b.breakend(b_end)) {
                    (Some(a_breakend), Some(b_breakend)) => (a_breakend, b_breakend),
                    _ => continue,
                };
                let assembled = shares_assembly(a.assembly(a_end), b.assembly(b_end));
                let inferred = geometry(a_breakend, b_breakend) == Ok(Geometry::Facing)
                    && gap(a_breakend, b_breakend) <= self.proximity_window;
                if !(assembled || inferred) {
                    continue;
                }

                match LinkedPair::from_variants(a, a_end, b, b_end, &self.classifier) {
                    Ok(pair) => candidates.push(pair),
                    Err(e) => debug!(
                        "cluster {}: skipping assembled candidate: {}",
                        self.cluster_id, e
                    ),
                }
            }
        }

        candidates.sort_by(candidate_order);
        candidates
    }

    /// Build chains until no candidate can start a new one.
    pub fn build(&mut self) -> ClusterResult {
        let mut chains = Vec::new();
        let mut failure = None;

        if self.state == BuilderState::Terminated {
            warn!(
                "cluster {}: chains have already been built",
                self.cluster_id
            );
        } else {
            let mut pending = self.candidates();
            self.diagnostics.candidates = pending.len();

            loop {
                let mut chain = Chain::new(chains.len());
                self.state = BuilderState::Empty;

                if let Err(e) = self.grow(&mut chain, &mut pending) {
                    warn!("cluster {}: stopping chaining: {}", self.cluster_id, e);
                    if let Err(e) = chain.dissolve(&mut self.arena) {
                        warn!("cluster {}: failed to roll back chain: {}", self.cluster_id, e);
                    }
                    failure = Some(e);
                    break;
                }
                if chain.is_empty() {
                    break;
                }

                self.state = BuilderState::Terminated;
                let before = pending.len();
                pending.retain(|candidate| !chain.link_would_close_chain(candidate));
                self.diagnostics.closing_rejections += before - pending.len();
                debug!(
                    "cluster {}: finished chain {} with {} links",
                    self.cluster_id,
                    chain.id(),
                    chain.link_count()
                );
                chains.push(chain);
            }
            self.state = BuilderState::Terminated;
        }

        ClusterResult {
            cluster_id: self.cluster_id,
            chains,
            diagnostics: self.diagnostics,
            failure,
        }
    }

    /// Repeatedly scan the pending candidates, committing the first one that extends the
    /// chain, until a scan commits nothing.
    fn grow(&mut self, chain: &mut Chain, pending: &mut Vec<LinkedPair>) -> Result<(), Error> {
        'scan: loop {
            let mut i = 0;
            while i < pending.len() {
                match ClashDetector::check(&self.arena, chain.links(), &pending[i]) {
                    ClashVerdict::Duplicate => {
                        let rejected = pending.remove(i);
                        debug!("chain {}: duplicate link {}", chain.id(), rejected);
                        self.diagnostics.duplicate_rejections += 1;
                    }
                    ClashVerdict::EndConflict => {
                        let rejected = pending.remove(i);
                        debug!("chain {}: clashing link {}", chain.id(), rejected);
                        self.diagnostics.clash_rejections += 1;
                    }
                    ClashVerdict::Compatible => {
                        let candidate = &pending[i];
                        let at_start = if chain.is_empty() || chain.can_add_to_end(candidate) {
                            false
                        } else if chain.can_add_to_start(candidate) {
                            true
                        } else {
                            i += 1;
                            continue;
                        };

                        let candidate = pending.remove(i);
                        match chain.commit(candidate, at_start, &mut self.arena) {
                            Ok(()) => {
                                self.state = BuilderState::Growing;
                                continue 'scan;
                            }
                            Err(e) if e.kind() == ErrorKind::InvalidState => return Err(e),
                            Err(e) => {
                                debug!("chain {}: {}", chain.id(), e);
                                self.diagnostics.clash_rejections += 1;
                            }
                        }
                    }
                }
            }
            return Ok(());
        }
    }
}
