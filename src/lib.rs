//! Loadgate - resource-loading orchestration for asynchronous UI components.
//!
//! This library wraps a host component and manages the fetching of its declared
//! remote resources: which fetches to issue, which of five statuses each
//! resource occupies, when the host as a whole is ready to render, and how to
//! drop stale responses from superseded reloads.
//!
//! # High-Level API
//!
//! A host implements [`host::LoaderHost`] (a descriptor supplier plus optional
//! placeholder providers) and hands itself to a [`driver::LifecycleDriver`]:
//!
//! ```ignore
//! use loadgate::config::LoaderConfig;
//! use loadgate::driver::LifecycleDriver;
//! use loadgate::host::HostInputs;
//!
//! let mut driver = LifecycleDriver::new(my_host, LoaderConfig::default());
//! driver.mount(HostInputs::default());
//!
//! // Whenever endpoint completions may have arrived:
//! let summary = driver.pump();
//! if summary.render_needed {
//!     match driver.render_plan() {
//!         // loading/error placeholder, or delegate to the real renderer
//!     }
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod gate;
pub mod host;
pub mod logging;
pub mod request;
pub mod tracker;

/// Version of the loadgate library.
///
/// Synchronized with `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
