use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::client::CatalogClient;
use crate::error::Result;

/// Where the desired association set comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Manifest {
    /// A single collection concept id given directly.
    Single(String),
    /// A newline-delimited list file, one concept id per line.
    File(PathBuf),
}

impl Manifest {
    /// The updater scripts recognize list files by a `.txt` marker in the
    /// argument; anything else is treated as a literal concept id.
    pub fn from_source(source: &str) -> Self {
        if source.contains(".txt") {
            Self::File(PathBuf::from(source))
        } else {
            Self::Single(source.to_string())
        }
    }

    /// Sorted, deduplicated desired set.
    pub fn desired(&self) -> Result<Vec<String>> {
        match self {
            Self::Single(id) => Ok(vec![id.clone()]),
            Self::File(path) => {
                let content = std::fs::read_to_string(path)?;
                let ids: BTreeSet<String> = content
                    .lines()
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect();
                Ok(ids.into_iter().collect())
            }
        }
    }
}

/// Pure set difference over desired and actual association sets:
/// `to_add = desired - actual`, `to_remove = actual - desired`.
pub fn diff(desired: &[String], actual: &[String]) -> (Vec<String>, Vec<String>) {
    let desired: BTreeSet<&str> = desired.iter().map(String::as_str).collect();
    let actual: BTreeSet<&str> = actual.iter().map(String::as_str).collect();
    let to_add = desired.difference(&actual).map(|s| s.to_string()).collect();
    let to_remove = actual.difference(&desired).map(|s| s.to_string()).collect();
    (to_add, to_remove)
}

/// Reconciles the catalog's association links for one record against a
/// local manifest.
///
/// Every add and remove is issued independently: a rejected write for one
/// collection is logged with its status and does not stop the rest of the
/// batch.
pub struct AssociationSynchronizer<'a> {
    client: &'a CatalogClient,
    token: &'a str,
}

impl<'a> AssociationSynchronizer<'a> {
    pub fn new(client: &'a CatalogClient, token: &'a str) -> Self {
        Self { client, token }
    }

    /// Add-only pass for a freshly created record. Nothing can exist on
    /// the remote side yet, so every desired id is added unconditionally.
    pub async fn create(&self, concept_id: &str, manifest: &Manifest) -> Result<()> {
        let desired = manifest.desired()?;
        tracing::info!(concept_id, count = desired.len(), "creating associations");
        self.add_all(concept_id, &desired).await;
        tracing::info!(concept_id, "associations complete");
        Ok(())
    }

    /// Full reconciliation: compute both directions of the set difference
    /// and issue the writes. When `remove_allowed` is false the removals
    /// are still computed and logged, but no delete calls go out.
    pub async fn sync(
        &self,
        concept_id: &str,
        manifest: &Manifest,
        remove_allowed: bool,
    ) -> Result<()> {
        tracing::info!(concept_id, "synchronizing associations");
        let desired = manifest.desired()?;
        let Some(actual) = self.client.list_associations(concept_id, self.token).await? else {
            tracing::warn!(concept_id, "unable to get current associations, skipping sync");
            return Ok(());
        };

        if desired == actual {
            tracing::info!(concept_id, "associations already in sync");
            return Ok(());
        }

        let (to_add, to_remove) = diff(&desired, &actual);
        self.add_all(concept_id, &to_add).await;

        tracing::info!(
            allowed = remove_allowed,
            pending = to_remove.len(),
            "association removal"
        );
        if remove_allowed {
            for assoc_id in &to_remove {
                match self
                    .client
                    .remove_association(concept_id, assoc_id, self.token)
                    .await
                {
                    Ok((200, _)) => tracing::info!(%assoc_id, "removed association"),
                    Ok((status, body)) => tracing::warn!(
                        %assoc_id,
                        status,
                        %body,
                        "failed to remove association, the collection concept id may not be valid"
                    ),
                    Err(err) => tracing::warn!(%assoc_id, %err, "failed to remove association"),
                }
            }
        }
        Ok(())
    }

    async fn add_all(&self, concept_id: &str, ids: &[String]) {
        for assoc_id in ids {
            match self
                .client
                .add_association(concept_id, assoc_id, self.token)
                .await
            {
                Ok((200, _)) => tracing::info!(%assoc_id, "added association"),
                Ok((status, body)) => tracing::warn!(
                    %assoc_id,
                    status,
                    %body,
                    "failed to add association, the collection concept id may not be valid"
                ),
                Err(err) => tracing::warn!(%assoc_id, %err, "failed to add association"),
            }
        }
    }
}
