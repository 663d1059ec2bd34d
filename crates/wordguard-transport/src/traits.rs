// ============================================
// File: crates/wordguard-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! The connection handlers only need "give me the next frame body".
//! Keeping that behind a trait lets the dispatch loops run over a real
//! socket, an in-memory duplex stream, or a scripted mock in tests.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Handlers race `next_frame` inside `tokio::select!`; partial frames
//!   must be kept in the implementation between calls

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Source of length-delimited frame bodies.
#[async_trait]
pub trait FrameSource: Send {
    /// Returns the next complete frame body, or `None` on a clean close.
    ///
    /// # Errors
    /// Read failures, an invalid length prefix, or a close mid-frame.
    async fn next_frame(&mut self) -> Result<Option<Bytes>>;
}
