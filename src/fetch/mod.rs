// Fetching: HTTP page retrieval and request pacing.

pub mod client;
pub mod pacing;

pub use client::{FetchedPage, HttpFetcher, PageFetcher};
pub use pacing::{PaceWindow, Pacer};
