use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_derive::Deserialize;
use tempfile::TempDir;

use svchain::cli::{run, SvChain};
use svchain::pipeline::output::OutputFormat;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TestcaseConfig {
    proximity_window: Option<u64>,
    short_link_threshold: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExpectedDiagnostics {
    excluded_variants: Option<u64>,
    clash_rejections: Option<u64>,
    duplicate_rejections: Option<u64>,
    closing_rejections: Option<u64>,
    candidates: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExpectedCluster {
    cluster: u64,
    /// Each chain as a list of links, written as `a:end-b:start TYPE length`.
    chains: Vec<Vec<String>>,
    #[serde(default)]
    diagnostics: ExpectedDiagnostics,
}

#[derive(Debug, Deserialize)]
struct TestcaseYaml {
    #[serde(default)]
    config: TestcaseConfig,
    expected: Vec<ExpectedCluster>,
}

pub(crate) struct Testcase {
    definition: TestcaseYaml,
    path: PathBuf,
    outdir: TempDir,
}

pub(crate) fn load_testcase(path: impl AsRef<Path>) -> Result<Testcase> {
    let reader = File::open(path.as_ref().join("testcase.yaml"))?;
    let definition = serde_yaml::from_reader(reader)?;
    Ok(Testcase {
        definition,
        path: path.as_ref().to_owned(),
        outdir: tempfile::tempdir()?,
    })
}

impl Testcase {
    fn input(&self) -> PathBuf {
        self.path.join("testcase.yaml")
    }

    fn output(&self) -> PathBuf {
        self.outdir.path().join("chains.json")
    }

    pub(crate) fn run(&self) -> Result<()> {
        let config = &self.definition.config;
        run(SvChain::Chain {
            input: self.input(),
            output: Some(self.output()),
            format: OutputFormat::Json,
            proximity_window: config.proximity_window.unwrap_or(5000),
            short_link_threshold: config.short_link_threshold.unwrap_or(30),
            threads: Some(1),
            verbose: 0,
        })
    }

    pub(crate) fn check(&self) {
        let report: serde_json::Value =
            serde_json::from_reader(File::open(self.output()).unwrap()).unwrap();
        let clusters = report["clusters"].as_array().unwrap();

        for expected in &self.definition.expected {
            let cluster = clusters
                .iter()
                .find(|cluster| cluster["cluster_id"].as_u64() == Some(expected.cluster))
                .unwrap_or_else(|| panic!("cluster {} missing in output", expected.cluster));
            assert!(
                cluster["failure"].is_null(),
                "cluster {} failed: {}",
                expected.cluster,
                cluster["failure"]
            );

            let chains: Vec<Vec<String>> = cluster["chains"]
                .as_array()
                .unwrap()
                .iter()
                .map(|chain| {
                    chain["links"]
                        .as_array()
                        .unwrap()
                        .iter()
                        .map(format_link)
                        .collect()
                })
                .collect();
            assert_eq!(
                chains, expected.chains,
                "unexpected chains in cluster {}",
                expected.cluster
            );

            let diagnostics = &cluster["diagnostics"];
            let expected_diagnostics = &expected.diagnostics;
            for (name, value) in &[
                ("excluded_variants", expected_diagnostics.excluded_variants),
                ("clash_rejections", expected_diagnostics.clash_rejections),
                ("duplicate_rejections", expected_diagnostics.duplicate_rejections),
                ("closing_rejections", expected_diagnostics.closing_rejections),
                ("candidates", expected_diagnostics.candidates),
            ] {
                if let Some(value) = value {
                    assert_eq!(
                        diagnostics[*name].as_u64(),
                        Some(*value),
                        "unexpected {} in cluster {}",
                        name,
                        expected.cluster
                    );
                }
            }
        }
    }
}

fn format_link(link: &serde_json::Value) -> String {
    format!(
        "{}:{}-{}:{} {} {}",
        link["first_id"],
        link["first_end"].as_str().unwrap(),
        link["second_id"],
        link["second_end"].as_str().unwrap(),
        link["link_type"].as_str().unwrap(),
        link["length"]
    )
}
