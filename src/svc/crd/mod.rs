//! # Custom resource definition module
//!
//! This module provide custom resources interacted with by the plugin and
//! their structures.

pub mod vault_static_secret;
