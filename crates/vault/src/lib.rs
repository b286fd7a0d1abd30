//! Authenticated cloud vault layer.
//!
//! Minting of short-lived bearer tokens from a service-account key
//! ([`credentials`]), primitive object operations against the remote
//! bucket ([`client`]), the merge-safe cross-project registry
//! ([`registry`]), and the project-level store built on top of them
//! ([`project`]).

pub mod client;
pub mod credentials;
pub mod project;
pub mod registry;
