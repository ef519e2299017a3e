//! Typed iteration over a query cursor.

use std::ops::ControlFlow;

use tracing::warn;

use crate::document::Document;
use crate::error::{GatewayError, GatewayResult};
use crate::traits::Cursor;

/// Turns one stored document into an item.
pub type Decoder<T, E> = fn(Document) -> Result<T, E>;

/// Single-pass iterator decoding each cursor document into a `T`.
///
/// The cursor is released exactly once: on exhaustion, on an explicit
/// [`close`](Self::close), at the end of [`for_each`](Self::for_each) or
/// [`collect`](Self::collect) whatever their outcome, or by the driver when
/// the iterator is dropped early.
pub struct DocumentIter<T, E = GatewayError> {
    cursor: Option<Box<dyn Cursor>>,
    decode: Decoder<T, E>,
}

fn no_documents<T, E: From<GatewayError>>(_: Document) -> Result<T, E> {
    Err(GatewayError::Internal("empty iterator decoded a document".into()).into())
}

impl<T, E: From<GatewayError>> DocumentIter<T, E> {
    pub fn new(cursor: Box<dyn Cursor>, decode: Decoder<T, E>) -> Self {
        Self {
            cursor: Some(cursor),
            decode,
        }
    }

    /// An iterator that yields nothing and holds no cursor.
    pub fn empty() -> Self {
        Self {
            cursor: None,
            decode: no_documents::<T, E>,
        }
    }

    /// Whether the underlying cursor has been released.
    pub fn is_closed(&self) -> bool {
        self.cursor.is_none()
    }

    /// Fetch and decode the next item. `Ok(None)` marks the end of the
    /// sequence, and every later call returns it again.
    pub async fn next(&mut self) -> Result<Option<T>, E> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        match cursor.read_document().await? {
            Some(doc) => (self.decode)(doc).map(Some),
            None => {
                self.close().await?;
                Ok(None)
            }
        }
    }

    /// Feed every item to `visitor` until the sequence ends or the visitor
    /// breaks. A `Break` is a clean stop, not an error. Visitor and decode
    /// errors are returned after the cursor is closed.
    pub async fn for_each<F>(mut self, mut visitor: F) -> Result<(), E>
    where
        F: FnMut(T) -> Result<ControlFlow<()>, E>,
    {
        let walked = self.walk(&mut visitor).await;
        let closed = self.close().await;
        match (walked, closed) {
            (Err(e), Err(close_err)) => {
                warn!(error = %close_err, "failed to close cursor after iteration error");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), closed) => Ok(closed?),
        }
    }

    /// Drain the remaining items into a vector.
    pub async fn collect(self) -> Result<Vec<T>, E> {
        let mut out = Vec::new();
        self.for_each(|item| {
            out.push(item);
            Ok(ControlFlow::Continue(()))
        })
        .await?;
        Ok(out)
    }

    /// Release the cursor. Further calls do nothing.
    pub async fn close(&mut self) -> GatewayResult<()> {
        match self.cursor.take() {
            Some(mut cursor) => cursor.close().await,
            None => Ok(()),
        }
    }

    async fn walk<F>(&mut self, visitor: &mut F) -> Result<(), E>
    where
        F: FnMut(T) -> Result<ControlFlow<()>, E>,
    {
        while let Some(item) = self.next().await? {
            if visitor(item)?.is_break() {
                break;
            }
        }
        Ok(())
    }
}
