mod cli;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use umm_sync_core::{
    CatalogClient, CmrEnvironment, Manifest, Outcome, Profile, Reconciler, ReconcilerConfig, token,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.debug);

    let environment: CmrEnvironment = cli.env.parse()?;
    let profile = Profile::load(&cli.file)
        .with_context(|| format!("Failed to load profile: {}", cli.file))?;

    let token = match &cli.token {
        Some(token) => token.clone(),
        None => {
            let user = cli
                .cmr_user
                .as_deref()
                .context("--cmr-user is required when no --token is given")?;
            let pass = cli
                .cmr_pass
                .as_deref()
                .context("--cmr-pass is required when no --token is given")?;
            token::request_token(environment, user, pass).await?
        }
    };

    let client = CatalogClient::new(environment, cli.kind.into())?;
    let config = ReconcilerConfig::new().with_remove_associations(!cli.keep_associations);
    let reconciler = Reconciler::new(&client, &token, &cli.provider).with_config(config);
    let manifest = cli.assoc.as_deref().map(Manifest::from_source);

    let (outcome, record) = reconciler.run(&profile, manifest.as_ref()).await?;

    match outcome {
        Outcome::Created => output::print_success("Catalog record created"),
        Outcome::Updated => output::print_success("Catalog record updated"),
        Outcome::Unchanged => output::print_success("Catalog record already up to date"),
    }
    if let Some(record) = record {
        println!("{}", serde_json::to_string_pretty(&record)?);
    }
    Ok(())
}

fn init_tracing(debug: bool) {
    // Prefer RUST_LOG from env, otherwise derive the level from --debug.
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
