// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate getset;

pub mod chaining;
pub mod cli;
pub mod errors;
pub mod linking;
pub mod pipeline;
pub mod variants;

pub use crate::chaining::{Chain, ChainBuilder, ClusterDiagnostics, ClusterResult};
pub use crate::errors::{Error, ErrorKind};
pub use crate::linking::{ClashDetector, ClashVerdict, LinkClassifier, LinkType, LinkedPair};
pub use crate::pipeline::{process_clusters, ChainingConfig, ChainingConfigBuilder, RunStats};
pub use crate::variants::arena::VariantArena;
pub use crate::variants::{Breakend, Orientation, SvKind, SvVariant, VariantEnd, VariantId};
