//! PDF access and layout analysis.
//!
//! [`backend`] wraps `lopdf` behind the [`backend::PdfBackend`] trait and
//! [`layout`] interprets content streams into positioned text blocks.

pub mod backend;
pub mod layout;
