//! Upstream storage access: the backend seam, its S3 implementation, and the
//! enumeration/streaming service built on top.

pub mod backend;
pub mod enumerator;
pub mod s3_backend;
pub mod storage_service;
