//! The CLI surface (C9): argument parsing and the glue that turns
//! parsed flags into the `Clusterer`/`Requirement`/`ClusterIgnoreFilter`
//! values the engine needs. Short aliases [from original: `cm.py`'s
//! `typer.Option` short flags].

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::clusterer::Clusterer;
use crate::error::{RefinerError, Result};
use crate::requirement::Requirement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClustererArg {
    Modcpm,
    Modmod,
    Ikc,
}

/// Connectivity-Modifier: cluster a graph while guaranteeing every
/// emitted cluster clears a configurable connectivity bar.
#[derive(Debug, Parser)]
#[command(name = "connectivity-refiner", version, about)]
pub struct Opts {
    /// Input graph, tab-separated zero-indexed edge list.
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Which clustering engine to drive.
    #[arg(long, short = 'c', value_enum)]
    pub clusterer: ClustererArg,

    /// Pre-computed clustering to seed algorithm-G with, instead of
    /// running the clusterer once up front.
    #[arg(long, short = 'e')]
    pub existing_clustering: Option<PathBuf>,

    /// IKC's locality parameter. Required iff `--clusterer ikc`.
    #[arg(long, short = 'k')]
    pub k: Option<u32>,

    /// CPM resolution. Required iff `--clusterer modcpm`.
    #[arg(long, short = 'g')]
    pub resolution: Option<f64>,

    /// Connectivity requirement expression, e.g. `1log10+2`.
    #[arg(long, short = 't')]
    pub threshold: String,

    /// Working directory for scratch files. Defaults to `<input>_working_dir`.
    #[arg(long, short = 'd')]
    pub working_dir: Option<PathBuf>,

    /// Drop tree-like clusters (m == n - 1) from further splitting.
    #[arg(long, short = 'x', default_value_t = false)]
    pub ignore_trees: bool,

    /// Drop clusters smaller than this from further splitting. 0 disables.
    #[arg(long, short = 's', default_value_t = 0)]
    pub ignore_smaller_than: usize,

    /// Output path for the `node cluster_id` membership file.
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Delete the working directory on exit.
    #[arg(long, default_value_t = false)]
    pub transient: bool,

    /// Explicit config file, tried before the standard search path.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Opts {
    pub fn working_dir(&self) -> PathBuf {
        self.working_dir.clone().unwrap_or_else(|| {
            let mut s = self.input.as_os_str().to_os_string();
            s.push("_working_dir");
            PathBuf::from(s)
        })
    }

    /// Builds the requirement and validates it sanity-checks against
    /// the chosen clusterer.
    pub fn requirement(&self, kind: crate::clusterer::ClustererKind) -> Result<Requirement> {
        let requirement = Requirement::parse(&self.threshold)?;
        if !requirement.is_valid(kind) {
            return Err(RefinerError::InputValidation(format!(
                "threshold expression {:?} is not valid for the chosen clusterer",
                self.threshold
            )));
        }
        Ok(requirement)
    }

    /// Builds the clusterer value, checking the per-variant required
    /// parameters spec.md §6 lists.
    pub fn clusterer(&self, tool_paths: ClustererToolPaths) -> Result<Clusterer> {
        match self.clusterer {
            ClustererArg::Modcpm => {
                let resolution = self.resolution.ok_or_else(|| {
                    RefinerError::InputValidation("--resolution is required for modcpm".to_string())
                })?;
                Ok(Clusterer::ModCpm { tool_path: tool_paths.modcpm, resolution })
            }
            ClustererArg::Modmod => {
                if self.resolution.is_some() {
                    return Err(RefinerError::InputValidation(
                        "--resolution is not accepted in modularity mode".to_string(),
                    ));
                }
                Ok(Clusterer::ModMod { tool_path: tool_paths.modcpm })
            }
            ClustererArg::Ikc => {
                let k = self.k.ok_or_else(|| {
                    RefinerError::InputValidation("--k is required for ikc".to_string())
                })?;
                Ok(Clusterer::Ikc { tool_path: tool_paths.ikc, k })
            }
        }
    }
}

/// The subset of `Context` the CLI needs to build a `Clusterer`,
/// threaded through explicitly instead of handing the whole context in.
pub struct ClustererToolPaths {
    pub modcpm: PathBuf,
    pub ikc: PathBuf,
}
