//! Terminal front end for element-manager.
//!
//! - [`http`]: `RemoteStore` over the object catalog's REST API
//! - [`config`]: flags and environment for the client
//! - [`shell`]: interactive command loop and console notices
//! - [`render`]: list and record output
//! - [`mock_api`]: local stand-in for the catalog

pub mod config;
pub mod http;
pub mod mock_api;
pub mod render;
pub mod shell;

pub use config::{ClientArgs, ClientConfig};
pub use http::HttpStore;
pub use mock_api::MockApiConfig;
pub use render::OutputFormat;
pub use shell::ConsoleNotifier;
