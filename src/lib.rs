//! dove-news: a cached client for the newsapi.org aggregation API.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────────┐ get_instance ┌───────────────┐  get_*   ┌────────────┐
//! │ ClientFactory │ ───────────► │ NewsApiClient │ ───────► │ Observable │ ◄── UI
//! │ (once)        │              │ (worker tasks)│          └────────────┘
//! └───────────────┘              └───────┬───────┘
//!                                        │ typed endpoints
//!                                ┌───────▼───────┐        ┌───────────┐
//!                                │    NewsApi    │ ─────► │ HttpClient│ ─► logger ─► DiskCache ─► rewrite ─► reqwest
//!                                └───────────────┘        └───────────┘
//! ```
//!
//! * **`client`**: [`ClientFactory`] and the shared [`NewsApiClient`].
//! * **`api`**: the three endpoints as typed async calls.
//! * **`http`**: caching HTTP client built as a `reqwest_middleware` chain:
//!   request logging, disk cache, and the `Cache-Control` rewrite.
//! * **`observable`**: write-once holders the UI polls or awaits.
//! * **`model`**: request and payload types.
//! * **`config`**: [`ClientConfig`] and its production defaults.
//!
//! ```no_run
//! use dove_news::{ClientFactory, Specification};
//!
//! # async fn run() -> dove_news::Result<()> {
//! let factory = ClientFactory::new(Default::default());
//! let client = factory.get_instance(std::path::Path::new("/tmp/dove-news"))?;
//!
//! let mut headlines = client.get_headlines(&Specification::new("technology", "us", "API_KEY"));
//! if let Some(articles) = headlines.wait().await {
//!     println!("{} headlines", articles.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod observable;

pub use api::{ApiResponse, NewsApi};
pub use client::{ClientFactory, NewsApiClient, PlatformContext};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use model::{Article, ArticleSource, Source, Specification};
pub use observable::Observable;
