// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::chaining::{Chain, ClusterDiagnostics, ClusterId, ClusterResult};
use crate::linking::{LinkType, LinkedPair};
use crate::pipeline::{RunStats, RunSummary};
use crate::variants::{VariantEnd, VariantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub enum OutputFormat {
    #[strum(serialize = "tsv")]
    Tsv,
    #[strum(serialize = "json")]
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Tsv
    }
}

/// One link of a chain, as written to TSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRow {
    pub cluster_id: ClusterId,
    pub chain_id: usize,
    pub link_index: usize,
    pub first_id: VariantId,
    pub first_end: VariantEnd,
    pub second_id: VariantId,
    pub second_end: VariantEnd,
    pub link_type: LinkType,
    pub length: i64,
    pub assembled: bool,
}

#[derive(Debug, Clone, Serialize)]
struct LinkReport {
    first_id: VariantId,
    first_end: VariantEnd,
    second_id: VariantId,
    second_end: VariantEnd,
    link_type: LinkType,
    length: i64,
    assembled: bool,
}

impl From<&LinkedPair> for LinkReport {
    fn from(link: &LinkedPair) -> Self {
        LinkReport {
            first_id: link.first().variant(),
            first_end: link.first().end(),
            second_id: link.second().variant(),
            second_end: link.second().end(),
            link_type: link.link_type(),
            length: link.length(),
            assembled: link.assembled(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChainReport {
    id: usize,
    variants: Vec<VariantId>,
    span: u64,
    total_link_length: u64,
    assembled_link_count: usize,
    links: Vec<LinkReport>,
}

impl From<&Chain> for ChainReport {
    fn from(chain: &Chain) -> Self {
        ChainReport {
            id: chain.id(),
            variants: chain.variants(),
            span: chain.span(),
            total_link_length: chain.total_link_length(),
            assembled_link_count: chain.assembled_link_count(),
            links: chain.links().iter().map(LinkReport::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ClusterReport {
    cluster_id: ClusterId,
    chains: Vec<ChainReport>,
    diagnostics: ClusterDiagnostics,
    failure: Option<String>,
}

impl From<&ClusterResult> for ClusterReport {
    fn from(result: &ClusterResult) -> Self {
        ClusterReport {
            cluster_id: *result.cluster_id(),
            chains: result.chains().iter().map(ChainReport::from).collect(),
            diagnostics: *result.diagnostics(),
            failure: result.failure().as_ref().map(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct RunReport {
    clusters: Vec<ClusterReport>,
    stats: RunStats,
}

/// All links of all chains, in cluster, chain and walk order.
pub fn link_rows(summary: &RunSummary) -> Vec<LinkRow> {
    let mut rows = Vec::new();
    for result in summary.clusters() {
        for chain in result.chains() {
            for (link_index, link) in chain.links().iter().enumerate() {
                rows.push(LinkRow {
                    cluster_id: *result.cluster_id(),
                    chain_id: chain.id(),
                    link_index,
                    first_id: link.first().variant(),
                    first_end: link.first().end(),
                    second_id: link.second().variant(),
                    second_end: link.second().end(),
                    link_type: link.link_type(),
                    length: link.length(),
                    assembled: link.assembled(),
                });
            }
        }
    }
    rows
}

pub fn write_tsv<W: Write>(summary: &RunSummary, writer: W) -> Result<()> {
    let mut wrt = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    for row in link_rows(summary) {
        wrt.serialize(row)?;
    }
    wrt.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(summary: &RunSummary, writer: W) -> Result<()> {
    let report = RunReport {
        clusters: summary.clusters().iter().map(ClusterReport::from).collect(),
        stats: *summary.stats(),
    };
    serde_json::to_writer_pretty(writer, &report)?;
    Ok(())
}

/// Write the summary to the given path, or to STDOUT if omitted.
pub fn write_summary(
    summary: &RunSummary,
    format: OutputFormat,
    path: Option<&Path>,
) -> Result<()> {
    let writer: Box<dyn Write> = match path {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("failed to create output file {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    match format {
        OutputFormat::Tsv => write_tsv(summary, writer),
        OutputFormat::Json => write_json(summary, writer),
    }
}
