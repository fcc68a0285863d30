// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Candidate links between two variant ends, their classification and clash checks.

pub mod clash;
pub mod classifier;
pub mod pair;

pub use crate::linking::clash::{candidate_order, ClashDetector, ClashVerdict};
pub use crate::linking::classifier::{
    Geometry, LinkClassifier, LinkType, DEFAULT_SHORT_LINK_THRESHOLD,
};
pub use crate::linking::pair::{LinkEnd, LinkedPair};
