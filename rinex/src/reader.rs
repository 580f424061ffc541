//! Small shared plumbing every streaming reader in this crate uses: a byte-offset
//! cursor token and the EOF-as-value status convention described in the workspace
//! README's error-handling design.

/// A previously-observed byte offset into a reader's file, returned by
/// `position()` and accepted back by `rewind_to`. Plain data, no hidden state.
pub type CursorToken = u64;

/// The outcome of one `read_next`-style call: either a record was produced, the
/// stream is exhausted, or a stream-time recoverable error occurred and the
/// caller must decide whether to retry the next record or abort.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamStatus<T, E> {
    Ok(T),
    Eof,
    Err(E),
}

impl<T, E> StreamStatus<T, E> {
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            _ => None,
        }
    }
}
