// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};

use crate::chaining::ClusterId;
use crate::errors::Error;
use crate::variants::{Breakend, Orientation, SvKind, SvVariant, VariantEnd, VariantId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct BreakendRecord {
    pub chrom: String,
    pub pos: u64,
    pub orientation: Orientation,
}

impl BreakendRecord {
    pub fn to_breakend(&self) -> Breakend {
        Breakend::new(&self.chrom, self.pos, self.orientation)
    }
}

/// A structural variant as delivered by the upstream clustering step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct VariantRecord {
    pub id: VariantId,
    pub kind: SvKind,
    pub start: BreakendRecord,
    #[serde(default)]
    pub end: Option<BreakendRecord>,
    #[new(default)]
    #[serde(default)]
    pub assembly_start: Vec<String>,
    #[new(default)]
    #[serde(default)]
    pub assembly_end: Vec<String>,
    #[new(default)]
    #[serde(default)]
    pub insert_len: Option<u64>,
    #[new(default)]
    #[serde(default)]
    pub ploidy: Option<f64>,
    #[new(default)]
    #[serde(default)]
    pub copy_number_change: Option<f64>,
}

impl VariantRecord {
    pub fn to_variant(&self) -> Result<SvVariant, Error> {
        let variant = SvVariant::new(
            self.id,
            self.kind,
            self.start.to_breakend(),
            self.end.as_ref().map(BreakendRecord::to_breakend),
        )?;
        Ok(variant
            .with_assembly(VariantEnd::Start, self.assembly_start.clone())
            .with_assembly(VariantEnd::End, self.assembly_end.clone())
            .with_insert_len(self.insert_len)
            .with_copy_number(self.ploidy, self.copy_number_change))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub id: ClusterId,
    #[serde(default)]
    pub variants: Vec<VariantRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterFile {
    pub clusters: Vec<ClusterRecord>,
}

/// Read clusters from a YAML (.yaml, .yml) or JSON (.json) file.
pub fn read_clusters<P: AsRef<Path>>(path: P) -> Result<Vec<ClusterRecord>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let reader = || -> Result<BufReader<File>> {
        Ok(BufReader::new(File::open(path).with_context(|| {
            format!("failed to open cluster file {}", path.display())
        })?))
    };

    let cluster_file: ClusterFile = match extension.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_reader(reader()?)
            .with_context(|| format!("invalid YAML in cluster file {}", path.display()))?,
        Some("json") => serde_json::from_reader(reader()?)
            .with_context(|| format!("invalid JSON in cluster file {}", path.display()))?,
        _ => {
            return Err(Error::UnsupportedInputFormat {
                path: path.to_owned(),
            }
            .into())
        }
    };
    info!(
        "Read {} clusters from {}.",
        cluster_file.clusters.len(),
        path.display()
    );

    Ok(cluster_file.clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CLUSTERS: &str = r#"
clusters:
  - id: 1
    variants:
      - id: 10
        kind: DEL
        start: {chrom: "1", pos: 100, orientation: "+"}
        end: {chrom: "1", pos: 200, orientation: "-"}
        assembly_end: [asm1]
      - id: 11
        kind: SGL
        start: {chrom: "3", pos: 700, orientation: "+"}
        insert_len: 5
"#;

    #[test]
    fn test_read_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(CLUSTERS.as_bytes()).unwrap();

        let clusters = read_clusters(file.path()).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].variants.len(), 2);

        let del = clusters[0].variants[0].to_variant().unwrap();
        assert_eq!(del.kind(), SvKind::Del);
        assert_eq!(del.assembly(VariantEnd::End), &["asm1".to_owned()][..]);
        let sgl = clusters[0].variants[1].to_variant().unwrap();
        assert!(sgl.is_single());
        assert_eq!(sgl.insert_len(), Some(5));
    }

    #[test]
    fn test_read_json() {
        let cluster_file: ClusterFile = serde_yaml::from_str(CLUSTERS).unwrap();
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        serde_json::to_writer(&mut file, &cluster_file).unwrap();

        let clusters = read_clusters(file.path()).unwrap();
        assert_eq!(clusters, cluster_file.clusters);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".vcf").tempfile().unwrap();
        let err = read_clusters(file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnsupportedInputFormat { .. })
        ));
    }

    #[test]
    fn test_invalid_record() {
        let record = VariantRecord::new(
            1,
            SvKind::Dup,
            BreakendRecord::new("1".to_owned(), 100, Orientation::Forward),
            Some(BreakendRecord::new("1".to_owned(), 200, Orientation::Reverse)),
        );
        assert!(matches!(
            record.to_variant(),
            Err(Error::InconsistentBreakends { id: 1, .. })
        ));
    }
}
