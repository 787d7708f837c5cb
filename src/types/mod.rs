// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Manifest builders for the resources the walkthroughs create.

pub mod crd;
pub mod deployment;

pub use crd::CrdSpec;
pub use deployment::DeploymentSpec;
