//! Live tests: provision real Azure resources with Terraform, verify them,
//! tear them down.
//!
//! Each submodule drives one scenario.  Shared setup lives in `common.rs`.
//!
//! Requirements: `terraform`, `kubectl` and `az` on PATH, plus Azure
//! credentials in the environment (`ARM_*` / `az login`).  Every test is
//! `#[ignore]`d so a plain `cargo test` never touches the cloud.
//! Run with: `cargo test --test integration -- --ignored`

mod common;

mod aks_module;
mod argocd_module;
mod full_stack;
