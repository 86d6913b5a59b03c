//! Core data models for the gallery.
//!
//! `ObjectRecord` is the wire-level listing entry shared by the server and the
//! browsing client; `BucketSnapshot` is the sorted collection the client pages
//! over.

pub mod object;
pub mod snapshot;
