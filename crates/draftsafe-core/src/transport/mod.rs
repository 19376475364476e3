//! Save transport seam.
//!
//! The transport performs the network save and maps every server response
//! into one of the four [`SaveOutcome`] variants. Anything it cannot classify
//! comes back as `Err`, which the executor reports as a transient failure.

mod http;

pub use http::{classify_response, HttpSaveTransport};

use std::future::Future;

use crate::error::Result;
use crate::models::{SaveOutcome, SaveRequest};

/// Injected function that persists content to the remote store
pub trait SaveTransport: Send + Sync + 'static {
    fn save(&self, request: SaveRequest) -> impl Future<Output = Result<SaveOutcome>> + Send;
}
