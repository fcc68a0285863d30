// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Runs the chain builder over many clusters and aggregates the results.
//!
//! Clusters are independent units of work, each owning its variants. They are processed in
//! parallel and only the aggregation of results is shared between workers.

pub mod input;
pub mod output;

use std::sync::Mutex;

use rayon::prelude::*;

use crate::chaining::{ChainBuilder, ClusterId, ClusterResult};
use crate::errors::{invalid_config, Error};
use crate::linking::{LinkClassifier, DEFAULT_SHORT_LINK_THRESHOLD};
use crate::pipeline::input::ClusterRecord;
use crate::variants::SvVariant;

/* =============== CONSTANTS ====================== */

/// Default maximum distance between two facing breakends for them to be linked without
/// assembly support.
pub const DEFAULT_PROXIMITY_WINDOW: u64 = 5000;

/* ================================================ */

/* ============ CONFIGURATION ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder, CopyGetters, Serialize, Deserialize)]
#[builder(pattern = "owned")]
#[getset(get_copy = "pub")]
pub struct ChainingConfig {
    #[builder(default = "DEFAULT_PROXIMITY_WINDOW")]
    proximity_window: u64,
    #[builder(default = "DEFAULT_SHORT_LINK_THRESHOLD")]
    short_link_threshold: u64,
    /// Number of worker threads (None = use rayon default).
    #[builder(default)]
    threads: Option<usize>,
}

impl Default for ChainingConfig {
    fn default() -> Self {
        ChainingConfig {
            proximity_window: DEFAULT_PROXIMITY_WINDOW,
            short_link_threshold: DEFAULT_SHORT_LINK_THRESHOLD,
            threads: None,
        }
    }
}

impl ChainingConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.proximity_window == 0 {
            return Err(invalid_config("proximity window must be positive"));
        }
        if self.threads == Some(0) {
            return Err(invalid_config("number of threads must be positive"));
        }
        Ok(())
    }

    pub fn classifier(&self) -> LinkClassifier {
        LinkClassifier::new(self.short_link_threshold)
    }
}

/* ================================================ */

/* ============ RUN STATISTICS ==================== */

/// Totals over all processed clusters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub clusters: usize,
    pub chains: usize,
    pub links: usize,
    pub excluded_variants: usize,
    pub clash_rejections: usize,
    pub duplicate_rejections: usize,
    pub closing_rejections: usize,
    pub failed_clusters: usize,
}

impl RunStats {
    pub fn of(result: &ClusterResult) -> Self {
        let diagnostics = result.diagnostics();
        RunStats {
            clusters: 1,
            chains: result.chains().len(),
            links: result.chains().iter().map(|chain| chain.link_count()).sum(),
            excluded_variants: diagnostics.excluded_variants,
            clash_rejections: diagnostics.clash_rejections,
            duplicate_rejections: diagnostics.duplicate_rejections,
            closing_rejections: diagnostics.closing_rejections,
            failed_clusters: result.is_failed() as usize,
        }
    }

    pub fn merge(&mut self, other: &RunStats) {
        self.clusters += other.clusters;
        self.chains += other.chains;
        self.links += other.links;
        self.excluded_variants += other.excluded_variants;
        self.clash_rejections += other.clash_rejections;
        self.duplicate_rejections += other.duplicate_rejections;
        self.closing_rejections += other.closing_rejections;
        self.failed_clusters += other.failed_clusters;
    }
}

#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct RunSummary {
    /// Results ordered by cluster id.
    clusters: Vec<ClusterResult>,
    stats: RunStats,
}

/* ================================================ */

/* ============ CLUSTER PROCESSING ================ */

/// Chain the variants of a single cluster.
pub fn chain_variants(
    cluster_id: ClusterId,
    variants: Vec<SvVariant>,
    config: &ChainingConfig,
) -> ClusterResult {
    let mut builder = ChainBuilder::new(cluster_id, config.classifier(), config.proximity_window);
    for variant in variants {
        builder.add_variant(variant);
    }
    builder.build()
}

/// Chain a cluster as read from input. Records that do not describe a valid variant are
/// excluded.
pub fn chain_cluster(cluster: &ClusterRecord, config: &ChainingConfig) -> ClusterResult {
    let mut builder = ChainBuilder::new(cluster.id, config.classifier(), config.proximity_window);
    for record in &cluster.variants {
        match record.to_variant() {
            Ok(variant) => builder.add_variant(variant),
            Err(e) => builder.exclude(&e),
        }
    }
    builder.build()
}

fn configure_threads(threads: Option<usize>) {
    if let Some(threads) = threads {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            Ok(_) => info!("Using {} threads.", threads),
            Err(_) => info!(
                "Using {} threads (global pool already configured, requested {} ignored).",
                rayon::current_num_threads(),
                threads
            ),
        }
    } else {
        info!("Using {} threads (rayon default).", rayon::current_num_threads());
    }
}

/// Chain all clusters in parallel.
///
/// The result does not depend on the number of threads or on scheduling.
pub fn process_clusters(
    clusters: &[ClusterRecord],
    config: &ChainingConfig,
) -> Result<RunSummary, Error> {
    config.validate()?;
    configure_threads(config.threads);
    info!("Chaining {} clusters.", clusters.len());

    let accumulator = Mutex::new((Vec::with_capacity(clusters.len()), RunStats::default()));

    clusters.par_iter().enumerate().for_each(|(idx, cluster)| {
        let result = chain_cluster(cluster, config);
        if let Some(failure) = result.failure() {
            warn!("Cluster {} failed: {}", cluster.id, failure);
        }
        let stats = RunStats::of(&result);

        let mut accumulator = accumulator.lock().unwrap_or_else(|e| e.into_inner());
        accumulator.0.push((idx, result));
        accumulator.1.merge(&stats);
    });

    let (mut results, stats) = accumulator.into_inner().unwrap_or_else(|e| e.into_inner());
    results.sort_by_key(|(idx, result)| (*result.cluster_id(), *idx));

    info!(
        "Built {} chains with {} links from {} clusters ({} variants excluded, {} clash rejections, {} failed clusters).",
        stats.chains,
        stats.links,
        stats.clusters,
        stats.excluded_variants,
        stats.clash_rejections,
        stats.failed_clusters
    );

    Ok(RunSummary {
        clusters: results.into_iter().map(|(_, result)| result).collect(),
        stats,
    })
}

/* ================================================ */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::{BreakendRecord, VariantRecord};
    use crate::variants::{Orientation, SvKind};

    fn deletion(id: u32, chrom: &str, start: u64, end: u64) -> VariantRecord {
        VariantRecord::new(
            id,
            SvKind::Del,
            BreakendRecord::new(chrom.to_owned(), start, Orientation::Forward),
            Some(BreakendRecord::new(chrom.to_owned(), end, Orientation::Reverse)),
        )
    }

    #[test]
    fn test_config_builder() {
        let config = ChainingConfigBuilder::default()
            .short_link_threshold(50)
            .build()
            .unwrap();
        assert_eq!(config.proximity_window(), DEFAULT_PROXIMITY_WINDOW);
        assert_eq!(config.short_link_threshold(), 50);
        assert_eq!(config.threads(), None);
        assert_eq!(ChainingConfig::default().short_link_threshold(), 30);
    }

    #[test]
    fn test_config_validation() {
        let config = ChainingConfigBuilder::default()
            .proximity_window(0)
            .build()
            .unwrap();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig { .. })));

        let config = ChainingConfigBuilder::default()
            .threads(Some(0))
            .build()
            .unwrap();
        assert!(config.validate().is_err());
        assert!(ChainingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_process_clusters() {
        let clusters = vec![
            ClusterRecord {
                id: 2,
                variants: vec![deletion(1, "1", 100, 200), deletion(2, "1", 300, 400)],
            },
            ClusterRecord {
                id: 1,
                variants: vec![
                    deletion(3, "2", 100, 200),
                    deletion(4, "2", 210, 400),
                    VariantRecord {
                        end: None,
                        ..deletion(5, "2", 1000, 1100)
                    },
                ],
            },
        ];
        let summary = process_clusters(&clusters, &ChainingConfig::default()).unwrap();

        let ids: Vec<_> = summary
            .clusters()
            .iter()
            .map(|result| *result.cluster_id())
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(
            *summary.stats(),
            RunStats {
                clusters: 2,
                chains: 2,
                links: 2,
                excluded_variants: 1,
                ..RunStats::default()
            }
        );
    }

    #[test]
    fn test_merge_is_order_independent() {
        let a = RunStats {
            clusters: 1,
            chains: 2,
            clash_rejections: 3,
            ..RunStats::default()
        };
        let b = RunStats {
            clusters: 1,
            links: 4,
            failed_clusters: 1,
            ..RunStats::default()
        };
        let mut ab = a;
        ab.merge(&b);
        let mut ba = b;
        ba.merge(&a);
        assert_eq!(ab, ba);
        assert_eq!(ab.clusters, 2);
    }
}
