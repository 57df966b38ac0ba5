use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How the final report is written
#[derive(
    Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Colored, human-readable transcript and summary
    #[default]
    #[value(name = "text")]
    Text,

    /// One JSON document with console, network, anomalies and summary
    #[value(name = "json")]
    Json,
}
