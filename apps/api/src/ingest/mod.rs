//! Document ingestion: PDF text extraction and chunking.
//!
//! Flow: multipart upload → extract page text → chunk → embed → install index.
//! A file that yields no text is not an error; it leaves the system in the
//! "no document indexed" state (see `chat`).

pub mod chunker;
pub mod handlers;
pub mod pdf;
