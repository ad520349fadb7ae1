//! One-shot structural comparison of a [`Schema`] against an external model
//! description.
//!
//! The external description mirrors what a data-validation model exposes:
//! field names mapped to scalar kinds, optionality, lists and nested models.
//! [`Schema::assert_conforms_to`] verifies that a demultiplexer built from
//! the schema populates exactly the shape the model expects, before any
//! input is fed.

use std::collections::BTreeSet;

use crate::{
    demux::{DemuxHandle, JsonDemux},
    error::DemuxError,
    schema::{FieldSpec, Schema, SinkKind, ValueKind},
};

/// A field type in the external model's taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelType {
    Str,
    Int,
    Float,
    Bool,
    Null,
    /// A string restricted to a fixed member set.
    Enum(BTreeSet<String>),
    /// A homogeneous list.
    List(Box<ModelType>),
    /// A nested model.
    Object(ModelSchema),
    /// An optional (nullable) field.
    Optional(Box<ModelType>),
}

impl ModelType {
    /// Builds a [`List`] type.
    ///
    /// [`List`]: ModelType::List
    #[must_use]
    pub fn list(element: ModelType) -> Self {
        Self::List(Box::new(element))
    }

    /// Builds an [`Optional`] type.
    ///
    /// [`Optional`]: ModelType::Optional
    #[must_use]
    pub fn optional(inner: ModelType) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Builds an [`Enum`] type from any collection of members.
    ///
    /// [`Enum`]: ModelType::Enum
    pub fn enumeration<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(members.into_iter().map(Into::into).collect())
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Null => "null",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Object(_) => "object",
            Self::Optional(_) => "optional",
        }
    }
}

/// An external model: ordered field names with their [`ModelType`]s.
///
/// # Examples
///
/// ```
/// use jsondemux::{ModelSchema, ModelType, Schema, ValueKind};
///
/// let schema = Schema::builder()
///     .single("id", ValueKind::Integer)
///     .stream("text", ValueKind::String)
///     .build();
///
/// let model = ModelSchema::builder()
///     .field("id", ModelType::Int)
///     .field("text", ModelType::Str)
///     .build();
///
/// schema.assert_conforms_to(&model).unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelSchema {
    fields: Vec<(String, ModelType)>,
}

impl ModelSchema {
    /// Starts building a model description.
    #[must_use]
    pub fn builder() -> ModelSchemaBuilder {
        ModelSchemaBuilder { fields: Vec::new() }
    }

    /// The declared fields, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &ModelType)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModelType> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }
}

/// Builder for [`ModelSchema`].
#[derive(Debug, Default)]
pub struct ModelSchemaBuilder {
    fields: Vec<(String, ModelType)>,
}

impl ModelSchemaBuilder {
    /// Declares a model field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: ModelType) -> Self {
        self.fields.push((name.into(), ty));
        self
    }

    /// Finishes the model description.
    #[must_use]
    pub fn build(self) -> ModelSchema {
        ModelSchema {
            fields: self.fields,
        }
    }
}

impl Schema {
    /// Verifies that this schema structurally matches `model`.
    ///
    /// Field-name sets must be equal (a nullable field absent from the model
    /// is tolerated), kinds must correspond under the mapping table
    /// (stream-of-`T` ↔ `list[T]`, stream-of-string also ↔ `str`, nullable ↔
    /// `optional`), enumerated member sets must match exactly, and nested
    /// models recurse with the same rules.
    ///
    /// # Errors
    ///
    /// [`DemuxError::SchemaMismatch`] naming the offending path, e.g.
    /// `root.nested.key_str`.
    pub fn assert_conforms_to(&self, model: &ModelSchema) -> Result<(), DemuxError> {
        check_object(self, model, "root")
    }
}

impl JsonDemux {
    /// See [`Schema::assert_conforms_to`].
    ///
    /// # Errors
    ///
    /// [`DemuxError::SchemaMismatch`] naming the offending path.
    pub fn assert_conforms_to(&self, model: &ModelSchema) -> Result<(), DemuxError> {
        self.schema().assert_conforms_to(model)
    }
}

impl DemuxHandle {
    /// See [`Schema::assert_conforms_to`].
    ///
    /// # Errors
    ///
    /// [`DemuxError::SchemaMismatch`] naming the offending path.
    pub fn assert_conforms_to(&self, model: &ModelSchema) -> Result<(), DemuxError> {
        self.schema().assert_conforms_to(model)
    }
}

fn check_object(schema: &Schema, model: &ModelSchema, path: &str) -> Result<(), DemuxError> {
    for spec in schema.fields() {
        let field_path = format!("{path}.{}", spec.name);
        match model.get(&spec.name) {
            Some(ty) => check_field(spec, ty, &field_path)?,
            None if spec.nullable => {}
            None => {
                return Err(DemuxError::schema_mismatch(
                    field_path,
                    "field is missing from the model",
                ));
            }
        }
    }
    for (name, _) in model.fields() {
        if schema.lookup(name).is_none() {
            return Err(DemuxError::schema_mismatch(
                format!("{path}.{name}"),
                "model field is not declared in the schema",
            ));
        }
    }
    Ok(())
}

fn check_field(spec: &FieldSpec, ty: &ModelType, path: &str) -> Result<(), DemuxError> {
    match spec.sink {
        SinkKind::Stream => {
            // Models may declare a stream as optional; an absent list and an
            // empty stream are indistinguishable to the consumer.
            let ty = match ty {
                ModelType::Optional(inner) => inner,
                other => other,
            };
            match ty {
                ModelType::List(element) => check_scalar_kind(spec, element, path),
                ModelType::Str if spec.kind == ValueKind::String => Ok(()),
                other => Err(DemuxError::schema_mismatch(
                    path,
                    format!(
                        "stream of {} cannot populate model type {}",
                        spec.kind.name(),
                        other.name()
                    ),
                )),
            }
        }
        SinkKind::Single => {
            if spec.nullable {
                match ty {
                    ModelType::Optional(inner) => check_scalar_kind(spec, inner, path),
                    _ => Err(DemuxError::schema_mismatch(
                        path,
                        "nullable field requires an optional model field",
                    )),
                }
            } else {
                match ty {
                    ModelType::Optional(_) => Err(DemuxError::schema_mismatch(
                        path,
                        "model field is optional but the schema field is not nullable",
                    )),
                    other => check_scalar_kind(spec, other, path),
                }
            }
        }
    }
}

fn check_scalar_kind(spec: &FieldSpec, ty: &ModelType, path: &str) -> Result<(), DemuxError> {
    match (&spec.kind, ty) {
        (ValueKind::String, ModelType::Str)
        | (ValueKind::Integer, ModelType::Int)
        | (ValueKind::Float, ModelType::Float)
        | (ValueKind::Boolean, ModelType::Bool)
        | (ValueKind::Null, ModelType::Null) => Ok(()),
        (ValueKind::Enumerated(members), ModelType::Enum(model_members)) => {
            if members == model_members {
                Ok(())
            } else {
                Err(DemuxError::schema_mismatch(
                    path,
                    "enumerated member sets differ",
                ))
            }
        }
        (ValueKind::Nested(sub), ModelType::Object(model)) => check_object(sub, model, path),
        (kind, ty) => Err(DemuxError::schema_mismatch(
            path,
            format!("schema kind {} does not map to model type {}", kind.name(), ty.name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ModelSchema, ModelType};
    use crate::{
        error::DemuxError,
        schema::{Schema, ValueKind},
    };

    fn nested_schema() -> Schema {
        Schema::builder()
            .single("nested_key", ValueKind::String)
            .build()
    }

    fn nested_model() -> ModelSchema {
        ModelSchema::builder()
            .field("nested_key", ModelType::Str)
            .build()
    }

    #[test]
    fn full_kind_table_conforms() {
        let schema = Schema::builder()
            .single("key_str", ValueKind::String)
            .single("key_int", ValueKind::Integer)
            .single("key_float", ValueKind::Float)
            .single("key_bool", ValueKind::Boolean)
            .single("key_none", ValueKind::Null)
            .single("key_enum", ValueKind::enumerated(["value1", "value2"]))
            .nested("key_nested", nested_schema())
            .stream("key_stream", ValueKind::String)
            .stream("arr_str", ValueKind::String)
            .stream("arr_int", ValueKind::Integer)
            .stream("arr_float", ValueKind::Float)
            .stream("arr_bool", ValueKind::Boolean)
            .stream("arr_none", ValueKind::Null)
            .stream("arr_enum", ValueKind::enumerated(["value1", "value2"]))
            .build();

        let model = ModelSchema::builder()
            .field("key_str", ModelType::Str)
            .field("key_int", ModelType::Int)
            .field("key_float", ModelType::Float)
            .field("key_bool", ModelType::Bool)
            .field("key_none", ModelType::Null)
            .field("key_enum", ModelType::enumeration(["value1", "value2"]))
            .field("key_nested", ModelType::Object(nested_model()))
            .field("key_stream", ModelType::Str)
            .field("arr_str", ModelType::list(ModelType::Str))
            .field("arr_int", ModelType::list(ModelType::Int))
            .field("arr_float", ModelType::list(ModelType::Float))
            .field("arr_bool", ModelType::list(ModelType::Bool))
            .field("arr_none", ModelType::list(ModelType::Null))
            .field(
                "arr_enum",
                ModelType::list(ModelType::enumeration(["value1", "value2"])),
            )
            .build();

        schema.assert_conforms_to(&model).unwrap();
    }

    #[test]
    fn nullable_fields_require_optional_both_ways() {
        let schema = Schema::builder()
            .nullable("key_str", ValueKind::String)
            .nullable("key_int", ValueKind::Integer)
            .build();
        let model = ModelSchema::builder()
            .field("key_str", ModelType::optional(ModelType::Str))
            .field("key_int", ModelType::optional(ModelType::Int))
            .build();
        schema.assert_conforms_to(&model).unwrap();

        // Schema not nullable, model optional.
        let strict = Schema::builder().single("key_str", ValueKind::String).build();
        let optional_model = ModelSchema::builder()
            .field("key_str", ModelType::optional(ModelType::Str))
            .build();
        assert!(matches!(
            strict.assert_conforms_to(&optional_model),
            Err(DemuxError::SchemaMismatch { .. })
        ));

        // Schema nullable, model required.
        let nullable = Schema::builder()
            .nullable("key_str", ValueKind::String)
            .build();
        let required_model = ModelSchema::builder()
            .field("key_str", ModelType::Str)
            .build();
        assert!(matches!(
            nullable.assert_conforms_to(&required_model),
            Err(DemuxError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn optional_list_matches_stream() {
        let schema = Schema::builder().stream("arr_str", ValueKind::String).build();
        let model = ModelSchema::builder()
            .field(
                "arr_str",
                ModelType::optional(ModelType::list(ModelType::Str)),
            )
            .build();
        schema.assert_conforms_to(&model).unwrap();
    }

    #[test]
    fn missing_required_field_reports_path() {
        let schema = Schema::builder()
            .single("required_field", ValueKind::String)
            .build();
        let model = ModelSchema::builder().build();
        let err = schema.assert_conforms_to(&model).unwrap_err();
        assert_eq!(
            err,
            DemuxError::SchemaMismatch {
                path: "root.required_field".into(),
                reason: "field is missing from the model".into(),
            }
        );
    }

    #[test]
    fn missing_nullable_field_tolerated() {
        let schema = Schema::builder()
            .nullable("optional_field", ValueKind::String)
            .build();
        let model = ModelSchema::builder().build();
        schema.assert_conforms_to(&model).unwrap();
    }

    #[test]
    fn undeclared_model_field_rejected() {
        let schema = Schema::builder().single("a", ValueKind::String).build();
        let model = ModelSchema::builder()
            .field("a", ModelType::Str)
            .field("b", ModelType::Int)
            .build();
        assert!(matches!(
            schema.assert_conforms_to(&model),
            Err(DemuxError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn nested_mismatch_reports_inner_path() {
        let schema = Schema::builder()
            .nested(
                "nested",
                Schema::builder().single("field", ValueKind::Integer).build(),
            )
            .build();
        let model = ModelSchema::builder()
            .field(
                "nested",
                ModelType::Object(ModelSchema::builder().field("field", ModelType::Str).build()),
            )
            .build();
        let err = schema.assert_conforms_to(&model).unwrap_err();
        let DemuxError::SchemaMismatch { path, .. } = err else {
            panic!("expected a schema mismatch");
        };
        assert_eq!(path, "root.nested.field");
    }

    #[rstest]
    #[case(ValueKind::Integer, ModelType::list(ModelType::Str))]
    #[case(ValueKind::String, ModelType::list(ModelType::Int))]
    #[case(ValueKind::Integer, ModelType::Str)]
    #[case(ValueKind::String, ModelType::Int)]
    fn stream_kind_mismatches(#[case] kind: ValueKind, #[case] model_type: ModelType) {
        let schema = Schema::builder().stream("arr", kind).build();
        let model = ModelSchema::builder().field("arr", model_type).build();
        assert!(matches!(
            schema.assert_conforms_to(&model),
            Err(DemuxError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn enum_member_sets_must_match() {
        let schema = Schema::builder()
            .single("k", ValueKind::enumerated(["a", "b"]))
            .build();
        let model = ModelSchema::builder()
            .field("k", ModelType::enumeration(["a", "c"]))
            .build();
        assert!(matches!(
            schema.assert_conforms_to(&model),
            Err(DemuxError::SchemaMismatch { .. })
        ));
    }
}
