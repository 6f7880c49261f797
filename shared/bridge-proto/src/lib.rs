//! Bridge Protocol Buffers
//!
//! Remote read / remote write message types and the snappy + protobuf codec
//! shared with the source and sink endpoints.

pub mod codec;
pub mod remote;
pub mod types;

pub use codec::{decode, encode, CodecError};
pub use remote::*;
pub use types::*;

/// HTTP header values expected by remote read/write endpoints
pub mod headers {
    pub const CONTENT_TYPE_PROTOBUF: &str = "application/x-protobuf";
    pub const CONTENT_ENCODING_SNAPPY: &str = "snappy";
    pub const REMOTE_READ_VERSION_HEADER: &str = "X-Prometheus-Remote-Read-Version";
    pub const REMOTE_READ_VERSION: &str = "0.1.0";
    pub const REMOTE_WRITE_VERSION_HEADER: &str = "X-Prometheus-Remote-Write-Version";
    pub const REMOTE_WRITE_VERSION: &str = "0.1.0";
}
