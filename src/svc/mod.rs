//! # Services module
//!
//! This module provide services to interact with kubernetes, the chart values
//! and the reconciliation between both.
pub mod cfg;
pub mod crd;
pub mod k8s;
pub mod reconciler;
pub mod set;
pub mod values;
