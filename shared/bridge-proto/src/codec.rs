//! Snappy + protobuf codec
//!
//! Bodies are protobuf-encoded and then compressed with the snappy *block*
//! format (not the framed stream format), which is what remote read/write
//! endpoints expect.

use prost::Message;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("snappy compression failed: {0}")]
    Compress(#[source] snap::Error),

    #[error("snappy decompression failed: {0}")]
    Decompress(#[source] snap::Error),

    #[error("protobuf decode failed: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Serialize `msg` and compress it into a request/response body
pub fn encode<M: Message>(msg: &M) -> Result<Vec<u8>, CodecError> {
    let raw = msg.encode_to_vec();
    snap::raw::Encoder::new()
        .compress_vec(&raw)
        .map_err(CodecError::Compress)
}

/// Decompress a body and deserialize it as `M`
pub fn decode<M: Message + Default>(bytes: &[u8]) -> Result<M, CodecError> {
    let raw = snap::raw::Decoder::new()
        .decompress_vec(bytes)
        .map_err(CodecError::Decompress)?;
    Ok(M::decode(raw.as_slice())?)
}
