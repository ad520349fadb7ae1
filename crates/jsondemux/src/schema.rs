//! The field schema: the declared shape of the object being demultiplexed.
//!
//! A [`Schema`] maps each expected field name to a [`SinkKind`] (how the
//! value is delivered) and a [`ValueKind`] (what the value is). It is fixed
//! before the first character is fed and never changes afterwards.

use std::{collections::BTreeSet, collections::HashMap, sync::Arc};

/// How a field's value is delivered to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// The value resolves once, as a whole, when its token closes.
    Single,
    /// The value is delivered as an ordered sequence of fragments while it is
    /// still being parsed.
    Stream,
}

/// The declared type of a field's value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
    Null,
    /// A string restricted to a fixed member set.
    Enumerated(BTreeSet<String>),
    /// A nested object, demultiplexed by its own sub-schema.
    Nested(Arc<Schema>),
}

impl ValueKind {
    /// Builds an [`Enumerated`] kind from any collection of members.
    ///
    /// [`Enumerated`]: ValueKind::Enumerated
    pub fn enumerated<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enumerated(members.into_iter().map(Into::into).collect())
    }

    /// Builds a [`Nested`] kind from a sub-schema.
    ///
    /// [`Nested`]: ValueKind::Nested
    #[must_use]
    pub fn nested(schema: Schema) -> Self {
        Self::Nested(Arc::new(schema))
    }

    /// Short human-readable name, used in error messages.
    #[must_use]
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Enumerated(_) => "enumerated string",
            Self::Nested(_) => "nested object",
        }
    }
}

/// One declared field: name, delivery mode, value kind and nullability.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub sink: SinkKind,
    pub kind: ValueKind,
    /// Single fields only: accept a `null` token, and resolve to
    /// [`Value::Null`](crate::Value::Null) if the field never appears before
    /// the object closes.
    pub nullable: bool,
}

/// An immutable map from field name to [`FieldSpec`].
///
/// Built once with [`Schema::builder`], then shared freely; lookups never
/// fail beyond returning `None`.
///
/// # Examples
///
/// ```
/// use jsondemux::{Schema, SinkKind, ValueKind};
///
/// let schema = Schema::builder()
///     .single("id", ValueKind::Integer)
///     .stream("text", ValueKind::String)
///     .build();
///
/// assert_eq!(schema.lookup("id").unwrap().sink, SinkKind::Single);
/// assert!(schema.lookup("missing").is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Starts building a schema.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder { fields: Vec::new() }
    }

    /// The declared fields, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn get(&self, index: usize) -> &FieldSpec {
        &self.fields[index]
    }
}

/// Builder for [`Schema`].
///
/// Declaring an invalid combination (a duplicate name, a stream of nested
/// objects, a nullable nested field) is a programmer error and panics
/// immediately, in the same way the schema declaration itself would be
/// rejected at compile time in a language with richer type-level syntax.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    /// Declares a single-value field.
    #[must_use]
    pub fn single(self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.push(FieldSpec {
            name: name.into(),
            sink: SinkKind::Single,
            kind,
            nullable: false,
        })
    }

    /// Declares a nullable single-value field.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is [`ValueKind::Nested`] (a null nested object has no
    /// sensible handle to resolve to) or [`ValueKind::Null`] (already null).
    #[must_use]
    pub fn nullable(self, name: impl Into<String>, kind: ValueKind) -> Self {
        let name = name.into();
        assert!(
            !matches!(kind, ValueKind::Nested(_)),
            "field {name:?}: nested fields cannot be nullable"
        );
        assert!(
            !matches!(kind, ValueKind::Null),
            "field {name:?}: a null field is nullable by definition"
        );
        self.push(FieldSpec {
            name,
            sink: SinkKind::Single,
            kind,
            nullable: true,
        })
    }

    /// Declares a stream field with the given element kind.
    ///
    /// A stream of [`ValueKind::String`] accepts both a JSON string (streamed
    /// character by character) and a JSON array of strings (one fragment per
    /// element); other element kinds accept only an array.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is [`ValueKind::Nested`]; arrays of objects are not
    /// re-streamed.
    #[must_use]
    pub fn stream(self, name: impl Into<String>, kind: ValueKind) -> Self {
        let name = name.into();
        assert!(
            !matches!(kind, ValueKind::Nested(_)),
            "field {name:?}: streams of nested objects are not supported"
        );
        self.push(FieldSpec {
            name,
            sink: SinkKind::Stream,
            kind,
            nullable: false,
        })
    }

    /// Declares a single-value nested-object field.
    #[must_use]
    pub fn nested(self, name: impl Into<String>, schema: Schema) -> Self {
        self.single(name, ValueKind::nested(schema))
    }

    /// Finishes the schema.
    #[must_use]
    pub fn build(self) -> Schema {
        let index = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Schema {
            fields: self.fields,
            index,
        }
    }

    fn push(mut self, spec: FieldSpec) -> Self {
        assert!(
            !self.fields.iter().any(|f| f.name == spec.name),
            "duplicate field {:?}",
            spec.name
        );
        self.fields.push(spec);
        self
    }
}
