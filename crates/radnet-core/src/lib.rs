//! Shared contract types for the radnet bridge.
//!
//! This crate defines the vocabulary shared between a host server's
//! request pipeline and the managed-runtime bridge:
//!
//! - [`Stage`]: the fixed, ordered set of pipeline stages a managed
//!   function can be bound to
//! - [`Verdict`]: the result codes a module hands back to the server
//! - [`RequestContext`] / [`Attribute`]: the request slice that crosses
//!   the bridge boundary
//! - [`wire`]: the JSON envelope marshaled to managed delegates
//! - [`BridgeConfig`]: the configuration surface selecting which managed
//!   function serves which stage and how the runtime is started

pub mod config;
pub mod request;
pub mod stage;
pub mod verdict;
pub mod wire;

pub use config::{BridgeConfig, ConfigError, DelegateTarget, StageOptions};
pub use request::{Attribute, RequestContext};
pub use stage::Stage;
pub use verdict::Verdict;
