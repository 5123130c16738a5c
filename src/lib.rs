//! reliability-infra: provisioning and verification harness for the AKS +
//! ArgoCD reliability stack.
//!
//! Terraform drives provisioning, the Kubernetes API and `kubectl` back the
//! cluster assertions, and the `validate` module checks configuration maps
//! without touching any cloud resources.

pub mod assertions;
pub mod azure;
pub mod cluster;
pub mod command;
pub mod config;
pub mod crd;
pub mod error;
pub mod expectations;
pub mod helpers;
pub mod poll;
pub mod scaling;
pub mod scenarios;
pub mod terraform;
pub mod validate;

pub use error::{Error, Result};
