//! Payload and request types.
//!
//! * [`Specification`]: what the caller asks for.
//! * [`Article`] / [`Source`]: what the UI receives.
//! * [`ArticleResponseWrapper`] / [`SourceResponseWrapper`]: the envelopes
//!   the API wraps its lists in; they never leave the crate's fetch path.

mod article;
mod source;
mod specification;
mod wrapper;

pub use article::{parse_timestamp, Article, ArticleSource, TIMESTAMP_FORMAT};
pub use source::Source;
pub use specification::Specification;
pub use wrapper::{ArticleResponseWrapper, SourceResponseWrapper};
