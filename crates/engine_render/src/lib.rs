//! # engine_render
//!
//! The boundary between the scene and a renderer.
//!
//! - [`ProxySink`]: what the sync step writes into. [`RenderScene`] is the
//!   in-process implementation, a concurrent map the render thread reads.
//! - [`SyncEngine`]: walks changed components once per frame and pushes mesh
//!   components into their proxies, creating them lazily.
//!
//! Proxies are removed by mark and sweep: the update side marks a proxy
//! orphaned, and the render side sweeps orphaned proxies once its draw has
//! finished, so a frame in flight never loses a proxy it is drawing.

pub mod error;
pub mod proxy;
pub mod sync;

pub use error::ProxyError;
pub use proxy::{ProxySink, ProxyUpdate, ProxyWrite, RenderProxy, RenderScene};
pub use sync::{SyncEngine, SyncReport};
