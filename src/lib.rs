//! FAQ chat widget
//!
//! A floating chat widget that collects questions, forwards them to a
//! question-answering endpoint and shows the exchanged messages. Served as
//! HTML fragments by Axum and driven from the browser with HTMX.
//!
//! # Architecture
//!
//! - **Widget core**: explicit state machine (open/closed, message log,
//!   draft, outstanding submissions) with I/O-free transitions
//! - **Query client**: trait-based client for the `POST /query/` backend
//! - **Rendering**: pure projection of widget state to HTML
//! - **Server**: Axum routes mapping UI events onto widget transitions
//!
//! # Modules
//!
//! - [`widget`]: widget state, outcomes and submission driver
//! - [`client`]: question-answering client
//! - [`render`]: HTML rendering
//! - [`store`]: registry of mounted widgets
//! - [`server`]: HTTP routes

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]

pub mod client;
pub mod config;
pub mod error;
pub mod render;
pub mod server;
pub mod store;
pub mod widget;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::render::WidgetSettings;
use crate::store::WidgetStore;

pub use error::{Error, Result};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Mounted widget instances.
    pub widgets: WidgetStore,
    /// Presentation settings shared by every widget.
    pub settings: Arc<WidgetSettings>,
    /// Global configuration.
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(widgets: WidgetStore, config: Arc<AppConfig>) -> Self {
        Self {
            widgets,
            settings: Arc::new(config.widget_settings()),
            config,
        }
    }
}
