use clap::{Parser, ValueEnum};
use umm_sync_core::ResourceKind;

#[derive(Parser)]
#[command(name = "umm-sync")]
#[command(about = "Synchronize local UMM-S/UMM-T profiles with the CMR catalog")]
#[command(version)]
pub struct Cli {
    /// Path to the local UMM profile JSON document
    #[arg(short = 'f', long)]
    pub file: String,

    /// Provider id the record belongs to (e.g. POCLOUD)
    #[arg(short, long)]
    pub provider: String,

    /// CMR environment to target (uat or ops)
    #[arg(short, long)]
    pub env: String,

    /// Record family the profile describes
    #[arg(short, long, value_enum, default_value = "service")]
    pub kind: KindArg,

    /// CMR username for token acquisition
    #[arg(long, env = "CMR_USER")]
    pub cmr_user: Option<String>,

    /// CMR password for token acquisition
    #[arg(long, env = "CMR_PASS")]
    pub cmr_pass: Option<String>,

    /// Ready-made bearer token (skips the token request)
    #[arg(short, long)]
    pub token: Option<String>,

    /// Association concept id, or path to a .txt file listing one per line
    #[arg(short, long)]
    pub assoc: Option<String>,

    /// Never remove existing associations during sync
    #[arg(long)]
    pub keep_associations: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum KindArg {
    /// UMM-S service profile
    #[default]
    Service,
    /// UMM-T tool profile
    Tool,
}

impl From<KindArg> for ResourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Service => ResourceKind::Service,
            KindArg::Tool => ResourceKind::Tool,
        }
    }
}
