//! Resource-loader seam for asset checkpoints.
//!
//! The barrier does not know or care how an asset is fetched. It only needs a
//! collaborator that, given a URI, eventually resolves with the body bytes or
//! an error. [`Barrier::add_assets`](crate::Barrier::add_assets) spawns each
//! fetch on the runtime and wires success back to `mark_complete`; failure is
//! logged and deliberately left unwired, so a failed load only ever resolves
//! via the barrier's timeout.

mod http;

pub use http::{HttpLoader, HttpLoaderConfig};

use crate::models::Result;
use futures_util::future::BoxFuture;

/// Asynchronous fetch capability injected into a barrier.
///
/// Implementations must resolve each returned future exactly once and never
/// complete it synchronously from within `fetch` itself; the barrier relies on
/// the runtime's task queue for re-entrancy. Tests supply a fake loader.
pub trait ResourceLoader: Send + Sync {
    /// Fetch `uri`, resolving with the response body on success.
    fn fetch(&self, uri: &str) -> BoxFuture<'static, Result<Vec<u8>>>;
}
