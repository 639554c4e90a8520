//! # Aegis Gateway
//!
//! A request admission-control layer: every inbound request is classified
//! by caller role, held to a per-role sliding-window rate quota, checked
//! against an external abuse-detection service (bot and shield/WAF
//! signals), and answered with a single allow/deny verdict carrying a
//! machine-readable reason and retry guidance.
//!
//! ## Features
//!
//! - Role-tiered quotas (guest / student / teacher / admin)
//! - Precise sliding-window counting over a sharded concurrent store
//! - Pluggable abuse oracle with remote and in-process backends
//! - Explicit fail-open/fail-closed policy on oracle outage
//!
//! ## Architecture
//!
//! The admission layer is middleware: it either forwards a request
//! downstream unmodified or short-circuits with a structured 403/429/500
//! response. The surrounding server (routing, handlers) is an external
//! collaborator that the admission layer protects. See
//! [`modules::admission`] for the decision flow.

pub mod config;
pub mod http;
pub mod modules;
