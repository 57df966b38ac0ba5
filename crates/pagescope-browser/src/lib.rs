//! # pagescope-browser
//!
//! Drives a real Chrome session for pagescope, built on chromiumoxide.
//!
//! This crate launches the browser, subscribes to the DevTools console and
//! network notifications of a fresh tab, translates them into
//! [`pagescope_core::SessionEvent`]s and applies them to one
//! [`pagescope_core::Session`] for a fixed observation window.
//!
//! ## Architecture
//!
//! - **ProbeBrowser**: manages the browser process lifecycle
//! - **Observer**: runs the single-owner event loop for one window
//! - **CdpTranslator**: fills in what each protocol notification leaves out
//!
//! ## Example Usage
//!
//! ```ignore
//! use pagescope_browser::{Observer, ProbeBrowser, ProbeBrowserConfig};
//! use pagescope_core::SummaryPolicy;
//! use std::time::Duration;
//!
//! let browser = ProbeBrowser::launch(ProbeBrowserConfig::default()).await?;
//! let observer = Observer::new(Duration::from_secs(3));
//! let session = browser.observe("https://example.com", &observer, |_, _| {}).await?;
//! let report = session.summarize(&SummaryPolicy::default());
//! browser.close().await?;
//! ```
//!
//! ## Testing Strategy
//!
//! Unit tests cover translation and the select loop with in-memory streams.
//! Tests that need a real Chrome are marked `#[ignore]`; run them with
//! `cargo test -p pagescope-browser -- --ignored`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod browser;
pub mod cdp;
pub mod error;
pub mod observer;

// Re-export main types for convenience
pub use browser::{ProbeBrowser, ProbeBrowserConfig};
pub use cdp::CdpTranslator;
pub use error::{BrowserError, Result};
pub use observer::{run_window, Observer, DEFAULT_WINDOW};
