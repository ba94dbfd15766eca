//! Reconciliation engine for keeping locally authored UMM-S and UMM-T
//! profiles in sync with the CMR catalog.
//!
//! The flow is: derive the record's native id from the profile, look up
//! its concept id with bounded retry (the store is eventually consistent),
//! then create, update, or do nothing, and finally reconcile the record's
//! collection associations against a local manifest.

pub mod associations;
pub mod client;
pub mod environment;
pub mod error;
pub mod kind;
pub mod profile;
pub mod reconcile;
pub mod retry;
pub mod token;

pub use associations::{AssociationSynchronizer, Manifest};
pub use client::CatalogClient;
pub use environment::CmrEnvironment;
pub use error::{Result, SyncError};
pub use kind::ResourceKind;
pub use profile::Profile;
pub use reconcile::{Outcome, Reconciler, ReconcilerConfig};
pub use retry::RetryPolicy;
