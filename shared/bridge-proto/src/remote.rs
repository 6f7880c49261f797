//! Remote read and remote write request/response envelopes

use prost::Message;

use crate::types::{LabelMatcher, TimeSeries};

/// One windowed query; both bounds in milliseconds since epoch
#[derive(Clone, PartialEq, Message)]
pub struct Query {
    #[prost(int64, tag = "1")]
    pub start_timestamp_ms: i64,
    #[prost(int64, tag = "2")]
    pub end_timestamp_ms: i64,
    #[prost(message, repeated, tag = "3")]
    pub matchers: Vec<LabelMatcher>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ResponseType {
    /// Single snappy-compressed ReadResponse
    Samples = 0,
    /// Streamed chunk frames
    StreamedXorChunks = 1,
}

#[derive(Clone, PartialEq, Message)]
pub struct ReadRequest {
    #[prost(message, repeated, tag = "1")]
    pub queries: Vec<Query>,
    #[prost(enumeration = "ResponseType", repeated, tag = "2")]
    pub accepted_response_types: Vec<i32>,
}

impl ReadRequest {
    /// Request answered with plain samples, the only response type the bridge decodes
    pub fn samples(queries: Vec<Query>) -> Self {
        Self {
            queries,
            accepted_response_types: vec![ResponseType::Samples as i32],
        }
    }
}

/// Series returned for one query of a ReadRequest
#[derive(Clone, PartialEq, Message)]
pub struct QueryResult {
    #[prost(message, repeated, tag = "1")]
    pub timeseries: Vec<TimeSeries>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ReadResponse {
    /// One entry per query, in request order
    #[prost(message, repeated, tag = "1")]
    pub results: Vec<QueryResult>,
}

impl ReadResponse {
    pub fn series_count(&self) -> usize {
        self.results.iter().map(|r| r.timeseries.len()).sum()
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct WriteRequest {
    #[prost(message, repeated, tag = "1")]
    pub timeseries: Vec<TimeSeries>,
}

impl WriteRequest {
    pub fn sample_count(&self) -> usize {
        self.timeseries.iter().map(|ts| ts.samples.len()).sum()
    }
}

impl From<QueryResult> for WriteRequest {
    fn from(result: QueryResult) -> Self {
        Self {
            timeseries: result.timeseries,
        }
    }
}
