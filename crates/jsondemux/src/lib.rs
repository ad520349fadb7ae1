//! Streaming JSON demultiplexer.
//!
//! `jsondemux` incrementally parses a JSON object streamed character by
//! character and routes each field's value into a per-field *sink* the
//! moment it is available, before the producer has finished transmitting
//! the document. A consumer awaiting a scalar field resumes as soon as that
//! field's value closes; a consumer iterating a streaming field receives
//! each fragment as soon as it is lexed.
//!
//! The shape of the object is declared up front as a [`Schema`]; every
//! declared field gets one sink, created eagerly at construction:
//!
//! - single-value fields resolve once ([`SingleSink`]),
//! - stream fields emit a replayable sequence of fragments ([`StreamSink`]),
//! - nested-object fields resolve, at the nested `{`, to the
//!   [`DemuxHandle`] of a sub-demultiplexer whose own fields can be awaited
//!   immediately.
//!
//! # Examples
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), jsondemux::DemuxError> {
//! use jsondemux::{JsonDemux, Schema, Value, ValueKind};
//!
//! let schema = Schema::builder()
//!     .single("title", ValueKind::String)
//!     .stream("body", ValueKind::String)
//!     .build();
//! let mut demux = JsonDemux::new(schema);
//! let handle = demux.handle();
//!
//! // The consumer can attach before a single character arrived.
//! let reader = tokio::spawn(async move {
//!     let mut body = String::new();
//!     let mut fragments = handle.stream("body").iter();
//!     while let Some(fragment) = fragments.next().await {
//!         body.push_str(fragment?.as_str().unwrap());
//!     }
//!     Ok::<_, jsondemux::DemuxError>(body)
//! });
//!
//! demux.feed(r#"{"title": "demo", "body": "hello"}"#)?;
//!
//! assert_eq!(demux.single("title").value().await?, Value::String("demo".into()));
//! assert_eq!(reader.await.unwrap()?, "hello");
//! # Ok(())
//! # }
//! ```
//!
//! Feeding is synchronous and chunk-insensitive; all suspension happens on
//! the consumer side. See [`JsonDemux`] for the feed interface and
//! [`Schema::assert_conforms_to`] for cross-checking a schema against an
//! external model description.

mod demux;
mod error;
mod escape_buffer;
mod literal_buffer;
mod number_buffer;
mod options;
mod schema;
mod sink;
mod skip_buffer;
mod value;

mod conformance;

pub use conformance::{ModelSchema, ModelSchemaBuilder, ModelType};
pub use demux::{DemuxHandle, FieldSink, JsonDemux};
pub use error::DemuxError;
pub use options::{DemuxOptions, UnknownFieldPolicy};
pub use schema::{FieldSpec, Schema, SchemaBuilder, SinkKind, ValueKind};
pub use sink::{SingleSink, StreamIter, StreamSink};
pub use value::Value;

#[cfg(test)]
mod tests;
