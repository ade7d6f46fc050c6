//! # Ward Core
//!
//! Client-side synchronisation of patient and test records against the hospital record API.
//!
//! Layers, leaf to root:
//! - [`gateway`]: typed request/response wrapper around the REST API (no caching)
//! - [`repository`]: the single in-memory owner of loaded collections
//! - [`controllers`]: list/filter and detail view state built on the repository
//!
//! Views act through a controller, the controller through the repository, the repository through
//! the gateway. Nothing skips a layer.
//!
//! **No presentation concerns**: rendering belongs to the `ward` CLI or any other shell.

pub mod config;
pub mod constants;
pub mod controllers;
pub mod error;
pub mod gateway;
pub mod repository;
pub mod validation;

pub use config::{base_url_from_env_value, ClientConfig};
pub use controllers::{
    DetailController, DetailView, ListController, ListScope, ListView, LoadPhase, Slot,
};
pub use error::{ErrorKind, Notice, SyncError, SyncResult};
pub use gateway::{HttpGateway, RecordGateway};
pub use repository::{Mutation, RecordRepository, Snapshot, Stale};
pub use validation::{patient_draft, test_draft, PatientInput};

pub use ward_types::{NonEmptyText, RecordId};
pub use ward_wire::{
    Gender, MedicalHistory, Patient, PatientDraft, Test, TestDraft, TestKind, MAX_AGE,
};
