//! The streaming JSON demultiplexer.
//!
//! [`JsonDemux`] consumes a JSON object character by character and routes
//! each field's value into a per-field sink the moment it is lexed. A
//! consumer awaiting a single-value field resumes inside the feed call that
//! consumed the value's closing character; a consumer iterating a stream
//! field observes fragments while the surrounding object is still open.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    error::DemuxError,
    escape_buffer::{Decoded, StringDecoder},
    literal_buffer::{self, LiteralBuffer},
    number_buffer::{self, NumberBuffer},
    options::{DemuxOptions, UnknownFieldPolicy},
    schema::{FieldSpec, Schema, SinkKind, ValueKind},
    sink::{SingleSink, StreamSink},
    skip_buffer::{self, ValueSkipper},
    value::Value,
};

/// The sink attached to one declared field, tagged by its delivery variant.
///
/// Consumers obtain the concrete sink through
/// [`DemuxHandle::single`]/[`stream`](DemuxHandle::stream)/
/// [`nested`](DemuxHandle::nested); the variant is fixed by the schema, so no
/// run-time downcast is ever needed.
#[derive(Debug, Clone)]
pub enum FieldSink {
    /// Resolves once with the coerced scalar value.
    Single(SingleSink<Value>),
    /// Emits fragments while the value is being parsed.
    Stream(StreamSink<Value>),
    /// Resolves once, at the nested object's opening brace, with a handle to
    /// the nested demultiplexer.
    Nested(SingleSink<DemuxHandle>),
}

#[derive(Debug)]
struct DemuxShared {
    schema: Schema,
    sinks: Vec<FieldSink>,
}

/// A clonable consumer view of a demultiplexer's sinks.
///
/// Handles stay valid after parsing finished (or failed), so late consumers
/// can still replay streams and read resolved values. Nested fields resolve
/// to the handle of their sub-demultiplexer.
#[derive(Debug, Clone)]
pub struct DemuxHandle {
    shared: Arc<DemuxShared>,
}

impl DemuxHandle {
    /// The schema this demultiplexer was built from.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.shared.schema
    }

    /// The sink for `name`, or `None` if the field is not declared.
    #[must_use]
    pub fn sink(&self, name: &str) -> Option<&FieldSink> {
        self.shared
            .schema
            .position(name)
            .map(|index| &self.shared.sinks[index])
    }

    /// The single-value sink for `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not declared or is not a single scalar field;
    /// both are programmer errors against a schema fixed at construction.
    #[must_use]
    pub fn single(&self, name: &str) -> &SingleSink<Value> {
        match self.sink(name) {
            Some(FieldSink::Single(sink)) => sink,
            Some(_) => panic!("field {name:?} is not a single scalar field"),
            None => panic!("no field named {name:?}"),
        }
    }

    /// The stream sink for `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not declared or is not a stream field.
    #[must_use]
    pub fn stream(&self, name: &str) -> &StreamSink<Value> {
        match self.sink(name) {
            Some(FieldSink::Stream(sink)) => sink,
            Some(_) => panic!("field {name:?} is not a stream field"),
            None => panic!("no field named {name:?}"),
        }
    }

    /// The nested-object sink for `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not declared or is not a nested field.
    #[must_use]
    pub fn nested(&self, name: &str) -> &SingleSink<DemuxHandle> {
        match self.sink(name) {
            Some(FieldSink::Nested(sink)) => sink,
            Some(_) => panic!("field {name:?} is not a nested field"),
            None => panic!("no field named {name:?}"),
        }
    }
}

// ------------------------------------------------------------------------
// Lexer states
// ------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    /// Awaiting the root `{`.
    BeforeObject,
    /// After `{` or `,`; `}` is only legal directly after `{`.
    ExpectKeyOrClose { close_allowed: bool },
    /// Accumulating a key string.
    Key,
    ExpectColon,
    ExpectValue,
    /// Buffering a single string or enumerated value, or one array element.
    ValueString,
    /// Streaming a string value fragment by fragment.
    ValueStreamString,
    ValueNumber,
    ValueLiteral,
    /// Forwarding characters to the nested demultiplexer.
    ValueNested,
    /// Swallowing an unknown field's value (permissive mode).
    SkipValue,
    /// Inside an array: expecting an element, or `]` directly after `[`.
    ArrayExpectValue { close_allowed: bool },
    ArrayExpectCommaOrClose,
    ExpectCommaOrClose,
    /// The root object closed.
    Done,
}

/// Which field the characters currently being lexed belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Current {
    Idle,
    Field(usize),
    /// An unknown field being skipped.
    Skip,
}

/// Outcome of offering one character to one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Consumed,
    /// The state closed without consuming the character; run it through the
    /// follow-up state.
    Again,
}

/// The streaming JSON demultiplexer.
///
/// Feeding is synchronous and never suspends: `feed_char`/`feed` mutate the
/// lexer and release any sink awaiters before returning. Consumers hold a
/// [`DemuxHandle`] (or borrow the accessors below) and await sinks
/// concurrently, in any order relative to feeding.
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), jsondemux::DemuxError> {
/// use jsondemux::{JsonDemux, Schema, Value, ValueKind};
///
/// let schema = Schema::builder()
///     .single("name", ValueKind::String)
///     .single("age", ValueKind::Integer)
///     .build();
/// let mut demux = JsonDemux::new(schema);
///
/// demux.feed(r#"{"name": "ada", "age": 36}"#)?;
///
/// assert_eq!(demux.single("name").value().await?, Value::String("ada".into()));
/// assert_eq!(demux.single("age").value().await?, Value::Integer(36));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct JsonDemux {
    shared: Arc<DemuxShared>,
    options: DemuxOptions,

    state: LexState,
    current: Current,
    in_array: bool,

    /// Reused for keys and string values.
    decoder: StringDecoder,
    number: NumberBuffer,
    literal: Option<LiteralBuffer>,
    skipper: Option<ValueSkipper>,
    /// The nested demultiplexer currently being forwarded to.
    child: Option<Box<JsonDemux>>,

    /// Set once a fatal error occurred; all further input is rejected with it.
    failure: Option<DemuxError>,
}

impl JsonDemux {
    /// Creates a demultiplexer with default options.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self::with_options(schema, DemuxOptions::default())
    }

    /// Creates a demultiplexer with explicit options.
    #[must_use]
    pub fn with_options(schema: Schema, options: DemuxOptions) -> Self {
        let sinks = schema
            .fields()
            .map(|spec| match (spec.sink, &spec.kind) {
                (SinkKind::Single, ValueKind::Nested(_)) => FieldSink::Nested(SingleSink::new()),
                (SinkKind::Single, _) => FieldSink::Single(SingleSink::new()),
                (SinkKind::Stream, _) => FieldSink::Stream(StreamSink::new()),
            })
            .collect();
        Self {
            shared: Arc::new(DemuxShared { schema, sinks }),
            options,
            state: LexState::BeforeObject,
            current: Current::Idle,
            in_array: false,
            decoder: StringDecoder::new(),
            number: NumberBuffer::new(),
            literal: None,
            skipper: None,
            child: None,
            failure: None,
        }
    }

    /// A clonable view of the sinks, independent of the parser's lifetime.
    #[must_use]
    pub fn handle(&self) -> DemuxHandle {
        DemuxHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// The schema this demultiplexer was built from.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.shared.schema
    }

    /// See [`DemuxHandle::sink`].
    #[must_use]
    pub fn sink(&self, name: &str) -> Option<&FieldSink> {
        self.shared
            .schema
            .position(name)
            .map(|index| &self.shared.sinks[index])
    }

    /// See [`DemuxHandle::single`].
    ///
    /// # Panics
    ///
    /// Panics if `name` is not declared or is not a single scalar field.
    #[must_use]
    pub fn single(&self, name: &str) -> &SingleSink<Value> {
        match self.sink(name) {
            Some(FieldSink::Single(sink)) => sink,
            Some(_) => panic!("field {name:?} is not a single scalar field"),
            None => panic!("no field named {name:?}"),
        }
    }

    /// See [`DemuxHandle::stream`].
    ///
    /// # Panics
    ///
    /// Panics if `name` is not declared or is not a stream field.
    #[must_use]
    pub fn stream(&self, name: &str) -> &StreamSink<Value> {
        match self.sink(name) {
            Some(FieldSink::Stream(sink)) => sink,
            Some(_) => panic!("field {name:?} is not a stream field"),
            None => panic!("no field named {name:?}"),
        }
    }

    /// See [`DemuxHandle::nested`].
    ///
    /// # Panics
    ///
    /// Panics if `name` is not declared or is not a nested field.
    #[must_use]
    pub fn nested(&self, name: &str) -> &SingleSink<DemuxHandle> {
        match self.sink(name) {
            Some(FieldSink::Nested(sink)) => sink,
            Some(_) => panic!("field {name:?} is not a nested field"),
            None => panic!("no field named {name:?}"),
        }
    }

    /// Returns `true` once the root object has closed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == LexState::Done
    }

    /// Feeds one character.
    ///
    /// # Errors
    ///
    /// Any parse or coercion error caused by this character. The error also
    /// fails every sink that is not yet terminal, and the demultiplexer
    /// rejects all further input with the same error.
    pub fn feed_char(&mut self, ch: char) -> Result<(), DemuxError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        match self.step_char(ch) {
            Ok(()) => Ok(()),
            Err(error) => {
                debug!(%error, "parse failed");
                self.poison(error.clone());
                Err(error)
            }
        }
    }

    /// Feeds every character of `text` in order.
    ///
    /// Feeding is chunk-insensitive: any partition of the input into chunks
    /// produces the same per-field outcomes.
    ///
    /// # Errors
    ///
    /// See [`feed_char`](Self::feed_char); the error is returned from the
    /// chunk containing the offending character.
    pub fn feed(&mut self, text: &str) -> Result<(), DemuxError> {
        for ch in text.chars() {
            self.feed_char(ch)?;
        }
        Ok(())
    }

    /// Fails every non-terminal sink (including nested ones) with
    /// [`DemuxError::Aborted`] and rejects further input.
    ///
    /// Call this when the producer goes away mid-document so consumers do
    /// not wait forever. Aborting an already complete or failed
    /// demultiplexer does nothing.
    pub fn abort(&mut self, reason: impl Into<String>) {
        if self.is_complete() {
            return;
        }
        self.poison(DemuxError::Aborted {
            reason: reason.into(),
        });
    }

    // --------------------------------------------------------------------
    // Feeding internals
    // --------------------------------------------------------------------

    fn step_char(&mut self, ch: char) -> Result<(), DemuxError> {
        loop {
            match self.step(ch)? {
                Step::Consumed => return Ok(()),
                Step::Again => {}
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn step(&mut self, ch: char) -> Result<Step, DemuxError> {
        match self.state {
            LexState::BeforeObject => match ch {
                c if self.options.is_whitespace(c) => Ok(Step::Consumed),
                '{' => {
                    self.state = LexState::ExpectKeyOrClose {
                        close_allowed: true,
                    };
                    Ok(Step::Consumed)
                }
                c => Err(DemuxError::malformed(c, "'{' opening the root object")),
            },

            LexState::ExpectKeyOrClose { close_allowed } => match ch {
                c if self.options.is_whitespace(c) => Ok(Step::Consumed),
                '"' => {
                    self.decoder.reset();
                    self.state = LexState::Key;
                    Ok(Step::Consumed)
                }
                '}' if close_allowed => {
                    self.finalize()?;
                    Ok(Step::Consumed)
                }
                '}' => Err(DemuxError::malformed('}', "a key after ','")),
                c => Err(DemuxError::malformed(c, "'\"' starting a key")),
            },

            LexState::Key => {
                if self.decoder.is_terminating_quote(ch) {
                    let key = self.decoder.take();
                    self.current = match self.shared.schema.position(&key) {
                        Some(index) => {
                            trace!(field = %key, "key accepted");
                            Current::Field(index)
                        }
                        None if self.options.unknown_fields == UnknownFieldPolicy::Skip => {
                            trace!(field = %key, "unknown key, skipping value");
                            Current::Skip
                        }
                        None => return Err(DemuxError::UnknownField { name: key }),
                    };
                    self.state = LexState::ExpectColon;
                } else {
                    self.decoder.push(ch)?;
                }
                Ok(Step::Consumed)
            }

            LexState::ExpectColon => match ch {
                c if self.options.is_whitespace(c) => Ok(Step::Consumed),
                ':' => {
                    self.state = LexState::ExpectValue;
                    Ok(Step::Consumed)
                }
                c => Err(DemuxError::malformed(c, "':' after a key")),
            },

            LexState::ExpectValue => self.dispatch_value(ch),

            LexState::ValueString => {
                if self.decoder.is_terminating_quote(ch) {
                    let raw = self.decoder.take();
                    let index = self.current_index();
                    let shared = Arc::clone(&self.shared);
                    let value = coerce_string(shared.schema.get(index), raw)?;
                    if self.in_array {
                        self.push_fragment(index, value)?;
                        self.state = LexState::ArrayExpectCommaOrClose;
                    } else {
                        self.resolve_single(index, value)?;
                        self.current = Current::Idle;
                        self.state = LexState::ExpectCommaOrClose;
                    }
                } else {
                    self.decoder.push(ch)?;
                }
                Ok(Step::Consumed)
            }

            LexState::ValueStreamString => {
                let index = self.current_index();
                if self.decoder.is_terminating_quote(ch) {
                    self.decoder.take();
                    self.close_stream(index)?;
                    self.current = Current::Idle;
                    self.state = LexState::ExpectCommaOrClose;
                } else if let Decoded::Char(decoded) = self.decoder.push(ch)? {
                    self.push_fragment(index, Value::String(decoded.to_string()))?;
                }
                Ok(Step::Consumed)
            }

            LexState::ValueNumber => match self.number.step(ch)? {
                number_buffer::Step::Consumed => Ok(Step::Consumed),
                number_buffer::Step::Terminated => {
                    let index = self.current_index();
                    let shared = Arc::clone(&self.shared);
                    let spec = shared.schema.get(index);
                    let value = self.number.finish(&spec.name, &spec.kind)?;
                    if self.in_array {
                        self.push_fragment(index, value)?;
                        self.state = LexState::ArrayExpectCommaOrClose;
                    } else {
                        self.resolve_single(index, value)?;
                        self.current = Current::Idle;
                        self.state = LexState::ExpectCommaOrClose;
                    }
                    Ok(Step::Again)
                }
            },

            LexState::ValueLiteral => {
                let mut literal = self.literal.take().unwrap_or_else(|| {
                    unreachable!("literal state without a literal buffer")
                });
                match literal.step(ch) {
                    literal_buffer::Step::NeedMore => {
                        self.literal = Some(literal);
                        Ok(Step::Consumed)
                    }
                    literal_buffer::Step::Done(value) => {
                        let index = self.current_index();
                        if self.in_array {
                            self.push_fragment(index, value)?;
                            self.state = LexState::ArrayExpectCommaOrClose;
                        } else {
                            self.resolve_single(index, value)?;
                            self.current = Current::Idle;
                            self.state = LexState::ExpectCommaOrClose;
                        }
                        Ok(Step::Consumed)
                    }
                    literal_buffer::Step::Reject => {
                        Err(DemuxError::malformed(ch, literal.expecting()))
                    }
                }
            }

            LexState::ValueNested => {
                let child = self
                    .child
                    .as_mut()
                    .unwrap_or_else(|| unreachable!("nested state without a child"));
                child.feed_char(ch)?;
                if child.is_complete() {
                    trace!("nested object closed");
                    self.child = None;
                    self.current = Current::Idle;
                    self.state = LexState::ExpectCommaOrClose;
                }
                Ok(Step::Consumed)
            }

            LexState::SkipValue => {
                let skipper = self
                    .skipper
                    .as_mut()
                    .unwrap_or_else(|| unreachable!("skip state without a skipper"));
                match skipper.step(ch) {
                    skip_buffer::Step::Continue => Ok(Step::Consumed),
                    skip_buffer::Step::DoneConsumed => {
                        self.skipper = None;
                        self.current = Current::Idle;
                        self.state = LexState::ExpectCommaOrClose;
                        Ok(Step::Consumed)
                    }
                    skip_buffer::Step::DoneRedispatch => {
                        self.skipper = None;
                        self.current = Current::Idle;
                        self.state = LexState::ExpectCommaOrClose;
                        Ok(Step::Again)
                    }
                }
            }

            LexState::ArrayExpectValue { close_allowed } => match ch {
                c if self.options.is_whitespace(c) => Ok(Step::Consumed),
                ']' if close_allowed => {
                    let index = self.current_index();
                    self.close_stream(index)?;
                    self.in_array = false;
                    self.current = Current::Idle;
                    self.state = LexState::ExpectCommaOrClose;
                    Ok(Step::Consumed)
                }
                ']' => Err(DemuxError::malformed(']', "a value after ','")),
                c => self.dispatch_element(c),
            },

            LexState::ArrayExpectCommaOrClose => match ch {
                c if self.options.is_whitespace(c) => Ok(Step::Consumed),
                ',' => {
                    self.state = LexState::ArrayExpectValue {
                        close_allowed: false,
                    };
                    Ok(Step::Consumed)
                }
                ']' => {
                    let index = self.current_index();
                    self.close_stream(index)?;
                    self.in_array = false;
                    self.current = Current::Idle;
                    self.state = LexState::ExpectCommaOrClose;
                    Ok(Step::Consumed)
                }
                c => Err(DemuxError::malformed(c, "',' or ']'")),
            },

            LexState::ExpectCommaOrClose => match ch {
                c if self.options.is_whitespace(c) => Ok(Step::Consumed),
                ',' => {
                    self.state = LexState::ExpectKeyOrClose {
                        close_allowed: false,
                    };
                    Ok(Step::Consumed)
                }
                '}' => {
                    self.finalize()?;
                    Ok(Step::Consumed)
                }
                c => Err(DemuxError::malformed(c, "',' or '}'")),
            },

            LexState::Done => match ch {
                c if self.options.is_whitespace(c) => Ok(Step::Consumed),
                c => Err(DemuxError::ExtraneousInput { found: c }),
            },
        }
    }

    /// Routes the first non-whitespace character of a field's value.
    fn dispatch_value(&mut self, ch: char) -> Result<Step, DemuxError> {
        if self.options.is_whitespace(ch) {
            return Ok(Step::Consumed);
        }
        if matches!(ch, ',' | ':' | '}' | ']') {
            return Err(DemuxError::malformed(ch, "a value"));
        }
        if self.current == Current::Skip {
            self.skipper = Some(ValueSkipper::begin(ch));
            self.state = LexState::SkipValue;
            return Ok(Step::Consumed);
        }

        let index = self.current_index();
        let shared = Arc::clone(&self.shared);
        let spec = shared.schema.get(index);
        match spec.sink {
            SinkKind::Stream => self.dispatch_stream_value(spec, ch),
            SinkKind::Single => self.dispatch_single_value(index, spec, ch),
        }
    }

    fn dispatch_single_value(
        &mut self,
        index: usize,
        spec: &FieldSpec,
        ch: char,
    ) -> Result<Step, DemuxError> {
        match ch {
            '"' if matches!(spec.kind, ValueKind::String | ValueKind::Enumerated(_)) => {
                self.decoder.reset();
                self.state = LexState::ValueString;
                Ok(Step::Consumed)
            }
            '-' | '0'..='9' if matches!(spec.kind, ValueKind::Integer | ValueKind::Float) => {
                self.number.start(ch);
                self.state = LexState::ValueNumber;
                Ok(Step::Consumed)
            }
            't' | 'f' if spec.kind == ValueKind::Boolean => {
                self.literal = Some(LiteralBuffer::new(ch));
                self.state = LexState::ValueLiteral;
                Ok(Step::Consumed)
            }
            'n' if spec.kind == ValueKind::Null || spec.nullable => {
                self.literal = Some(LiteralBuffer::new(ch));
                self.state = LexState::ValueLiteral;
                Ok(Step::Consumed)
            }
            '{' => {
                let ValueKind::Nested(sub) = &spec.kind else {
                    return Err(DemuxError::type_mismatch(
                        &spec.name,
                        spec.kind.name(),
                        token_class(ch),
                    ));
                };
                // Resolve the outer sink first so consumers can start
                // awaiting inner fields before any nested character lands.
                let mut child = JsonDemux::with_options(Schema::clone(sub), self.options);
                self.resolve_nested(index, child.handle())?;
                child.feed_char('{')?;
                self.child = Some(Box::new(child));
                self.state = LexState::ValueNested;
                trace!(field = %spec.name, "nested object opened");
                Ok(Step::Consumed)
            }
            '"' | '-' | '0'..='9' | 't' | 'f' | 'n' | '[' => Err(DemuxError::type_mismatch(
                &spec.name,
                spec.kind.name(),
                token_class(ch),
            )),
            c => Err(DemuxError::malformed(c, "a value")),
        }
    }

    fn dispatch_stream_value(&mut self, spec: &FieldSpec, ch: char) -> Result<Step, DemuxError> {
        match ch {
            '[' => {
                self.in_array = true;
                self.state = LexState::ArrayExpectValue {
                    close_allowed: true,
                };
                Ok(Step::Consumed)
            }
            '"' if spec.kind == ValueKind::String => {
                self.decoder.reset();
                self.state = LexState::ValueStreamString;
                Ok(Step::Consumed)
            }
            '"' | '-' | '0'..='9' | 't' | 'f' | 'n' | '{' => Err(DemuxError::type_mismatch(
                &spec.name,
                "array",
                token_class(ch),
            )),
            c => Err(DemuxError::malformed(c, "a value")),
        }
    }

    /// Routes the first character of one array element against the stream's
    /// element kind.
    fn dispatch_element(&mut self, ch: char) -> Result<Step, DemuxError> {
        let index = self.current_index();
        let shared = Arc::clone(&self.shared);
        let spec = shared.schema.get(index);
        match ch {
            '"' if matches!(spec.kind, ValueKind::String | ValueKind::Enumerated(_)) => {
                self.decoder.reset();
                self.state = LexState::ValueString;
                Ok(Step::Consumed)
            }
            '-' | '0'..='9' if matches!(spec.kind, ValueKind::Integer | ValueKind::Float) => {
                self.number.start(ch);
                self.state = LexState::ValueNumber;
                Ok(Step::Consumed)
            }
            't' | 'f' if spec.kind == ValueKind::Boolean => {
                self.literal = Some(LiteralBuffer::new(ch));
                self.state = LexState::ValueLiteral;
                Ok(Step::Consumed)
            }
            'n' if spec.kind == ValueKind::Null => {
                self.literal = Some(LiteralBuffer::new(ch));
                self.state = LexState::ValueLiteral;
                Ok(Step::Consumed)
            }
            '[' => Err(DemuxError::malformed('[', "a scalar element; nested arrays are not supported")),
            '{' => Err(DemuxError::malformed('{', "a scalar element; arrays of objects are not supported")),
            '"' | '-' | '0'..='9' | 't' | 'f' | 'n' => Err(DemuxError::type_mismatch(
                &spec.name,
                spec.kind.name(),
                token_class(ch),
            )),
            c => Err(DemuxError::malformed(c, "a value")),
        }
    }

    /// Closes the root object: every sink must reach a terminal state.
    fn finalize(&mut self) -> Result<(), DemuxError> {
        let shared = Arc::clone(&self.shared);
        for (spec, sink) in shared.schema.fields().zip(&shared.sinks) {
            match sink {
                FieldSink::Single(sink) if !sink.is_terminal() => {
                    if spec.nullable {
                        sink.resolve(Value::Null)?;
                    } else {
                        return Err(DemuxError::MissingField {
                            name: spec.name.clone(),
                        });
                    }
                }
                FieldSink::Stream(sink) if !sink.is_terminal() => {
                    sink.close()?;
                }
                FieldSink::Nested(sink) if !sink.is_terminal() => {
                    return Err(DemuxError::MissingField {
                        name: spec.name.clone(),
                    });
                }
                _ => {}
            }
        }
        self.state = LexState::Done;
        trace!("root object closed");
        Ok(())
    }

    /// Fails every non-terminal sink and rejects further input.
    fn poison(&mut self, error: DemuxError) {
        if self.failure.is_some() {
            return;
        }
        for sink in &self.shared.sinks {
            match sink {
                FieldSink::Single(sink) => {
                    sink.fail(error.clone()).ok();
                }
                FieldSink::Stream(sink) => {
                    sink.fail(error.clone()).ok();
                }
                FieldSink::Nested(sink) => {
                    sink.fail(error.clone()).ok();
                }
            }
        }
        if let Some(child) = &mut self.child {
            child.poison(error.clone());
        }
        self.failure = Some(error);
    }

    fn current_index(&self) -> usize {
        match self.current {
            Current::Field(index) => index,
            Current::Idle | Current::Skip => unreachable!("no field is being populated"),
        }
    }

    fn resolve_single(&self, index: usize, value: Value) -> Result<(), DemuxError> {
        trace!(field = %self.shared.schema.get(index).name, "field resolved");
        match &self.shared.sinks[index] {
            FieldSink::Single(sink) => sink.resolve(value),
            _ => unreachable!("single sink expected"),
        }
    }

    fn resolve_nested(&self, index: usize, handle: DemuxHandle) -> Result<(), DemuxError> {
        match &self.shared.sinks[index] {
            FieldSink::Nested(sink) => sink.resolve(handle),
            _ => unreachable!("nested sink expected"),
        }
    }

    fn push_fragment(&self, index: usize, fragment: Value) -> Result<(), DemuxError> {
        match &self.shared.sinks[index] {
            FieldSink::Stream(sink) => sink.push(fragment),
            _ => unreachable!("stream sink expected"),
        }
    }

    fn close_stream(&self, index: usize) -> Result<(), DemuxError> {
        trace!(field = %self.shared.schema.get(index).name, "stream closed");
        match &self.shared.sinks[index] {
            FieldSink::Stream(sink) => sink.close(),
            _ => unreachable!("stream sink expected"),
        }
    }
}

fn coerce_string(spec: &FieldSpec, raw: String) -> Result<Value, DemuxError> {
    match &spec.kind {
        ValueKind::String => Ok(Value::String(raw)),
        ValueKind::Enumerated(members) => {
            if members.contains(&raw) {
                Ok(Value::String(raw))
            } else {
                Err(DemuxError::InvalidEnumValue {
                    field: spec.name.clone(),
                    value: raw,
                })
            }
        }
        _ => unreachable!("string coercion on a {} field", spec.kind.name()),
    }
}

/// Short description of the token a character opens, for error messages.
fn token_class(ch: char) -> &'static str {
    match ch {
        '"' => "string",
        '-' | '0'..='9' => "number",
        't' | 'f' => "boolean literal",
        'n' => "null literal",
        '{' => "object",
        '[' => "array",
        _ => "value",
    }
}
