//! Managed-runtime bridge for RADIUS-style request pipelines.
//!
//! This crate loads a runtime hosting library (the CoreCLR hosting
//! ABI), starts one execution context per module instance, binds
//! configured managed functions to pipeline stages, and dispatches
//! requests to them. Binding is best-effort per stage: a stage without
//! a configured or bindable function passes requests through with a
//! no-op verdict instead of failing the instance.
//!
//! The usual entry point is [`RuntimeBridge::instantiate`] with a
//! validated [`radnet_core::BridgeConfig`]. Tests and embedders with
//! their own runtime plumbing inject a [`RuntimeHost`] implementation
//! through [`RuntimeBridge::with_runtime`].

pub mod abi;
pub mod binder;
pub mod bridge;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod hosting;
pub mod loader;
pub mod table;

pub use abi::{ContextToken, StageDelegate, StatusCode};
pub use binder::BindSummary;
pub use bridge::RuntimeBridge;
pub use context::ExecutionContext;
pub use error::{HostError, Result};
pub use hosting::{InitParams, RuntimeHost, ShutdownReport};
pub use loader::LoadedRuntime;
pub use table::{EntryPointSlot, EntryPointTable};
