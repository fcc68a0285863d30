// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::PathBuf;

use anyhow::Result;
use log::LevelFilter;
use structopt::StructOpt;

use crate::pipeline::input::read_clusters;
use crate::pipeline::output::{write_summary, OutputFormat};
use crate::pipeline::{process_clusters, ChainingConfigBuilder};

#[derive(Debug, StructOpt, Clone)]
#[structopt(
    name = "svchain",
    about = "Link structural variant breakends into chains of templated insertions and deletion bridges."
)]
#[structopt(setting = structopt::clap::AppSettings::ColoredHelp)]
pub enum SvChain {
    #[structopt(
        name = "chain",
        about = "Chain the structural variants of each cluster in the given file."
    )]
    #[structopt(setting = structopt::clap::AppSettings::ColoredHelp)]
    Chain {
        #[structopt(
            parse(from_os_str),
            long,
            help = "YAML (.yaml, .yml) or JSON (.json) file with clusters of structural variants."
        )]
        input: PathBuf,
        #[structopt(
            parse(from_os_str),
            long,
            help = "File that shall contain the chains (if omitted, write to STDOUT)."
        )]
        output: Option<PathBuf>,
        #[structopt(
            long,
            default_value = "tsv",
            help = "Output format (tsv: one row per link, json: chains with diagnostics)."
        )]
        format: OutputFormat,
        #[structopt(
            long,
            default_value = "5000",
            help = "Maximum distance between two facing breakends for linking them without \
                    assembly support."
        )]
        proximity_window: u64,
        #[structopt(
            long,
            default_value = "30",
            help = "Templated insertions shorter than this are reported as deletion bridges."
        )]
        short_link_threshold: u64,
        #[structopt(long, help = "Number of threads to use (default: all available cores).")]
        threads: Option<usize>,
        #[structopt(
            short,
            long,
            parse(from_occurrences),
            help = "Increase logging verbosity (-v: info, -vv: debug)."
        )]
        verbose: u64,
    },
}

impl SvChain {
    pub fn log_level(&self) -> LevelFilter {
        match self {
            SvChain::Chain { verbose, .. } => match *verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                _ => LevelFilter::Debug,
            },
        }
    }
}

pub fn run(opt: SvChain) -> Result<()> {
    match opt {
        SvChain::Chain {
            input,
            output,
            format,
            proximity_window,
            short_link_threshold,
            threads,
            ..
        } => {
            let config = ChainingConfigBuilder::default()
                .proximity_window(proximity_window)
                .short_link_threshold(short_link_threshold)
                .threads(threads)
                .build()?;
            config.validate()?;

            let clusters = read_clusters(&input)?;
            let summary = process_clusters(&clusters, &config)?;
            write_summary(&summary, format, output.as_deref())?;
        }
    }
    Ok(())
}
