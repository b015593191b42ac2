//! Closed tag sets selectable from the command line and the config template.
//!
//! Every tag implements `Display`/`FromStr` with the exact spellings the CLI
//! accepts, plus serde so the same spellings round-trip through YAML.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::TagParseError;

/// Architecture search space to run NAS in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSpace {
    /// Topology search space (cell operations on a fixed DAG).
    Tss,
    /// Size search space (per-stage channel widths).
    Sss,
}

impl SearchSpace {
    /// Maximum valid training-epoch count for this search space.
    ///
    /// A requested epoch budget must be *strictly* below this value.
    pub fn epoch_budget(&self) -> u32 {
        match self {
            Self::Tss => 200,
            Self::Sss => 90,
        }
    }
}

impl fmt::Display for SearchSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tss => write!(f, "tss"),
            Self::Sss => write!(f, "sss"),
        }
    }
}

impl FromStr for SearchSpace {
    type Err = TagParseError;

    // Case-insensitive: both `tss` and `TSS` are accepted on the CLI.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tss" => Ok(Self::Tss),
            "sss" => Ok(Self::Sss),
            _ => Err(TagParseError::new("search space", s)),
        }
    }
}

/// Training dataset a candidate architecture is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Cifar10,
    Cifar100,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cifar10 => write!(f, "cifar10"),
            Self::Cifar100 => write!(f, "cifar100"),
        }
    }
}

impl FromStr for Dataset {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cifar10" => Ok(Self::Cifar10),
            "cifar100" => Ok(Self::Cifar100),
            _ => Err(TagParseError::new("dataset", s)),
        }
    }
}

/// Dataset the Pareto-front reference file was measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvalDataset {
    #[serde(rename = "cifar10")]
    Cifar10,
    #[serde(rename = "ImageNet16-120")]
    ImageNet16_120,
}

impl fmt::Display for EvalDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cifar10 => write!(f, "cifar10"),
            Self::ImageNet16_120 => write!(f, "ImageNet16-120"),
        }
    }
}

impl FromStr for EvalDataset {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cifar10" => Ok(Self::Cifar10),
            "ImageNet16-120" => Ok(Self::ImageNet16_120),
            _ => Err(TagParseError::new("evaluation dataset", s)),
        }
    }
}

/// Efficiency objective optimized alongside the error rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EfficiencyMetric {
    Flops,
    Params,
    Latency,
}

impl EfficiencyMetric {
    /// Axis label used by progress reporting for this objective.
    pub fn axis_label(&self) -> &'static str {
        match self {
            Self::Flops => "Floating-point operations (M)",
            Self::Params => "Trainable parameters (M)",
            Self::Latency => "Latency (ms)",
        }
    }
}

impl fmt::Display for EfficiencyMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flops => write!(f, "flops"),
            Self::Params => write!(f, "params"),
            Self::Latency => write!(f, "latency"),
        }
    }
}

impl FromStr for EfficiencyMetric {
    type Err = TagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flops" => Ok(Self::Flops),
            "params" => Ok(Self::Params),
            "latency" => Ok(Self::Latency),
            _ => Err(TagParseError::new("efficiency metric", s)),
        }
    }
}

/// Resolved dataset field of the problem definition.
///
/// A single CLI dataset unwraps to the scalar variant; two or more stay a
/// collection. The distinction selects the downstream problem implementation,
/// it is not cosmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasetSelection {
    Single(Dataset),
    Multi(Vec<Dataset>),
}

impl DatasetSelection {
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    /// All selected datasets, in CLI order.
    pub fn datasets(&self) -> Vec<Dataset> {
        match self {
            Self::Single(d) => vec![*d],
            Self::Multi(ds) => ds.clone(),
        }
    }
}

impl fmt::Display for DatasetSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(d) => write!(f, "{d}"),
            Self::Multi(ds) => {
                let tags: Vec<String> = ds.iter().map(Dataset::to_string).collect();
                write!(f, "{}", tags.join("-"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_budget_table() {
        assert_eq!(SearchSpace::Tss.epoch_budget(), 200);
        assert_eq!(SearchSpace::Sss.epoch_budget(), 90);
    }

    #[test]
    fn search_space_parses_case_insensitively() {
        assert_eq!("tss".parse::<SearchSpace>().unwrap(), SearchSpace::Tss);
        assert_eq!("SSS".parse::<SearchSpace>().unwrap(), SearchSpace::Sss);
        assert!("mss".parse::<SearchSpace>().is_err());
    }

    #[test]
    fn dataset_parsing_is_case_sensitive() {
        assert_eq!("cifar10".parse::<Dataset>().unwrap(), Dataset::Cifar10);
        assert!("CIFAR10".parse::<Dataset>().is_err());
    }

    #[test]
    fn eval_dataset_keeps_imagenet_spelling() {
        let d = "ImageNet16-120".parse::<EvalDataset>().unwrap();
        assert_eq!(d.to_string(), "ImageNet16-120");
        let yaml = serde_yaml::to_string(&d).unwrap();
        assert!(yaml.contains("ImageNet16-120"));
    }

    #[test]
    fn selection_display_joins_tags() {
        let single = DatasetSelection::Single(Dataset::Cifar10);
        assert_eq!(single.to_string(), "cifar10");

        let multi = DatasetSelection::Multi(vec![Dataset::Cifar10, Dataset::Cifar100]);
        assert_eq!(multi.to_string(), "cifar10-cifar100");
        assert!(multi.is_multi());
    }

    #[test]
    fn selection_yaml_round_trip() {
        let multi = DatasetSelection::Multi(vec![Dataset::Cifar10, Dataset::Cifar100]);
        let yaml = serde_yaml::to_string(&multi).unwrap();
        let back: DatasetSelection = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(multi, back);

        let single: DatasetSelection = serde_yaml::from_str("cifar100").unwrap();
        assert_eq!(single, DatasetSelection::Single(Dataset::Cifar100));
    }
}
