use std::time::Duration;

use serde_json::Value;

use crate::associations::{AssociationSynchronizer, Manifest};
use crate::client::CatalogClient;
use crate::error::Result;
use crate::profile::Profile;
use crate::retry::RetryPolicy;

/// Terminal states of a reconciliation run. All three are success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No remote record existed; one was created.
    Created,
    /// The remote record differed from the local profile and was rewritten.
    Updated,
    /// The remote record already matched the local profile.
    Unchanged,
}

/// Tuning knobs for the reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Retry schedule for lookups and fetches against the eventually
    /// consistent store.
    pub lookup_retry: RetryPolicy,

    /// Pause between an update write and the confirming re-read
    /// (default: 10 seconds).
    pub settle_delay: Duration,

    /// Whether association sync may delete stale links (default: true).
    pub remove_associations: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            lookup_retry: RetryPolicy::default(),
            settle_delay: Duration::from_secs(10),
            remove_associations: true,
        }
    }
}

impl ReconcilerConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry schedule for catalog lookups.
    #[must_use]
    pub fn with_lookup_retry(mut self, policy: RetryPolicy) -> Self {
        self.lookup_retry = policy;
        self
    }

    /// Sets the settling pause between an update and its re-read.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Allows or forbids association removal during sync.
    #[must_use]
    pub fn with_remove_associations(mut self, allowed: bool) -> Self {
        self.remove_associations = allowed;
        self
    }
}

/// State machine that converges one remote catalog record to a local
/// profile.
///
/// The flow is lookup, then create or update-or-noop, then association
/// sync. Indeterminate lookups are retried on the configured schedule to
/// absorb read-after-write lag; any fatal error aborts the whole run.
/// Generic over the record family through the client's
/// [`ResourceKind`](crate::kind::ResourceKind).
pub struct Reconciler<'a> {
    client: &'a CatalogClient,
    token: &'a str,
    provider: String,
    config: ReconcilerConfig,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a CatalogClient, token: &'a str, provider: impl Into<String>) -> Self {
        Self {
            client,
            token,
            provider: provider.into(),
            config: ReconcilerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs the full state machine for one profile. Returns the terminal
    /// outcome and the remote record as last fetched.
    pub async fn run(
        &self,
        profile: &Profile,
        manifest: Option<&Manifest>,
    ) -> Result<(Outcome, Option<Value>)> {
        let native_id = profile.native_id(&self.provider);
        tracing::info!(kind = %self.client.kind(), %native_id, "reconciling profile");

        match self.lookup(&native_id).await? {
            None => self.create(profile, &native_id, manifest).await,
            Some(concept_id) => {
                self.update_or_noop(profile, &native_id, &concept_id, manifest)
                    .await
            }
        }
    }

    async fn create(
        &self,
        profile: &Profile,
        native_id: &str,
        manifest: Option<&Manifest>,
    ) -> Result<(Outcome, Option<Value>)> {
        tracing::info!("no catalog record found, creating a new one");
        self.client
            .put_profile(&self.provider, native_id, profile.as_value(), self.token)
            .await?;

        let Some(concept_id) = self.lookup(native_id).await? else {
            // The write was accepted but the record never became visible
            // within the retry budget.
            tracing::warn!(native_id, "created record not yet visible in search");
            return Ok((Outcome::Created, None));
        };
        tracing::info!(%concept_id, "assigned concept id");

        let created = self.fetch(&concept_id).await?;
        log_record("created catalog record", created.as_ref());

        if let Some(manifest) = manifest {
            AssociationSynchronizer::new(self.client, self.token)
                .create(&concept_id, manifest)
                .await?;
        }
        Ok((Outcome::Created, created))
    }

    async fn update_or_noop(
        &self,
        profile: &Profile,
        native_id: &str,
        concept_id: &str,
        manifest: Option<&Manifest>,
    ) -> Result<(Outcome, Option<Value>)> {
        tracing::info!(concept_id, "existing record found");
        let remote = self.fetch(concept_id).await?;

        if remote.as_ref().is_some_and(|r| profile.matches(r)) {
            tracing::info!("catalog and local profiles match, no update needed");
            self.sync_associations(concept_id, manifest).await?;
            return Ok((Outcome::Unchanged, remote));
        }

        log_record("current catalog record", remote.as_ref());
        log_record("local profile", Some(profile.as_value()));
        tracing::info!("profiles differ, updating catalog record");
        self.client
            .put_profile(&self.provider, native_id, profile.as_value(), self.token)
            .await?;

        // Give the store time to become read-consistent before the
        // confirming fetch. Best effort only: the re-read is reported, not
        // verified against the write.
        tokio::time::sleep(self.config.settle_delay).await;
        let updated = self.fetch(concept_id).await?;
        log_record("updated catalog record", updated.as_ref());

        self.sync_associations(concept_id, manifest).await?;
        Ok((Outcome::Updated, updated))
    }

    async fn lookup(&self, native_id: &str) -> Result<Option<String>> {
        self.config
            .lookup_retry
            .run(|| self.client.find_by_native_id(&self.provider, native_id))
            .await
    }

    async fn fetch(&self, concept_id: &str) -> Result<Option<Value>> {
        self.config
            .lookup_retry
            .run(|| self.client.fetch_profile(concept_id))
            .await
    }

    async fn sync_associations(&self, concept_id: &str, manifest: Option<&Manifest>) -> Result<()> {
        if let Some(manifest) = manifest {
            AssociationSynchronizer::new(self.client, self.token)
                .sync(concept_id, manifest, self.config.remove_associations)
                .await?;
        }
        Ok(())
    }
}

fn log_record(label: &str, record: Option<&Value>) {
    match record.map(serde_json::to_string_pretty) {
        Some(Ok(text)) => tracing::info!("{label}:\n{text}"),
        _ => tracing::info!("{label}: <not available>"),
    }
}
