//! Client for the video-game sales inference endpoint.
//!
//! The model sits behind an Open Inference Protocol (v2) server at
//! `/v2/models/video-game-sales-model/infer`. It takes four inputs (platform,
//! release year, genre, publisher) and answers with predicted North American
//! sales in millions of units.
//!
//! # Modules
//!
//! - [`client`] - [`InferenceClient`] and the one-shot [`predict`] helper
//! - [`v2`] - Wire types for the infer and health routes
//! - [`smoke`] - Valid/invalid request batches for eyeballing server behavior
//! - [`config`] - Endpoint and transport settings
//! - [`error`] - [`PredictError`]
//!
//! # Example
//!
//! ```no_run
//! use vgsales_client::{InferenceClient, PredictionRequest};
//!
//! # async fn run() -> vgsales_client::Result<()> {
//! let client = InferenceClient::new("http://localhost:8080")?;
//! let sales = client
//!     .predict(&PredictionRequest::new("PS4", 2022, "Action", "Sony Computer Entertainment"))
//!     .await?;
//! println!("{sales} million units");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod smoke;
pub mod v2;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use client::{InferenceClient, predict};
pub use config::{ClientConfig, DEFAULT_ENDPOINT};
pub use error::{PredictError, Result};
pub use smoke::{SmokeReport, send_batch};
pub use v2::{PredictionRequest, round_sales};
