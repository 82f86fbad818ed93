//! Schemas and field descriptors
//!
//! A `Schema` is an ordered mapping from field name to [`FieldDescriptor`].
//! Paths are resolved against the descriptor tree with [`Schema::resolve`],
//! so mutation entry points can reject bad paths before touching any value.
//!
//! Reference fields name their target collection through a
//! [`ReferenceTarget`]. Targets are bound to a schema after construction, which
//! lets two schemas reference each other.

use crate::error::{Error, Result};
use crate::id::{DocId, ID_KEY, VERSION_KEY};
use crate::path::{FieldPath, PathSegment};
use crate::value::{type_name, JsonMap};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// Primitive field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// UTF-8 string
    String,
    /// Any JSON number
    Number,
    /// true / false
    Boolean,
    /// A document id in string form, not resolved as a reference
    Id,
    /// Any JSON value, including objects and arrays
    Any,
}

impl ScalarType {
    /// Name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
            ScalarType::Id => "id",
            ScalarType::Any => "any",
        }
    }

    /// Whether `value` may be stored in a field of this type
    ///
    /// `null` is accepted by every type.
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        match (self, value) {
            (_, serde_json::Value::Null) => true,
            (ScalarType::Any, _) => true,
            (ScalarType::String, serde_json::Value::String(_)) => true,
            (ScalarType::Number, serde_json::Value::Number(_)) => true,
            (ScalarType::Boolean, serde_json::Value::Bool(_)) => true,
            (ScalarType::Id, v) => DocId::from_json(v).is_some(),
            _ => false,
        }
    }
}

/// Target of a reference field
///
/// Cloning shares the binding: binding any clone binds them all.
///
/// A bound target holds its schema strongly. Schemas that reference each
/// other therefore form an `Arc` cycle and live until process exit, which
/// suits models registered once at startup.
#[derive(Clone)]
pub struct ReferenceTarget {
    collection: Arc<str>,
    schema: Arc<OnceCell<Arc<Schema>>>,
}

impl ReferenceTarget {
    /// Unbound target for `collection`
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: Arc::from(collection.into()),
            schema: Arc::new(OnceCell::new()),
        }
    }

    /// Target already bound to `schema`
    pub fn bound(collection: impl Into<String>, schema: Arc<Schema>) -> Self {
        let target = Self::new(collection);
        // A fresh cell cannot already be set.
        let _ = target.schema.set(schema);
        target
    }

    /// Bind the target schema. Returns false if it was already bound.
    ///
    /// The schema is kept alive by every clone of this target, including
    /// the ones inside schemas that `schema` itself references.
    pub fn bind(&self, schema: Arc<Schema>) -> bool {
        self.schema.set(schema).is_ok()
    }

    /// Collection holding referenced documents
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Whether a schema has been bound
    pub fn is_bound(&self) -> bool {
        self.schema.get().is_some()
    }

    /// The bound schema
    pub fn schema(&self) -> Result<Arc<Schema>> {
        self.schema
            .get()
            .cloned()
            .ok_or_else(|| Error::UnboundReference {
                collection: self.collection.to_string(),
            })
    }
}

impl fmt::Debug for ReferenceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceTarget")
            .field("collection", &self.collection)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Declared shape of one field
#[derive(Debug, Clone)]
pub enum FieldDescriptor {
    /// Primitive value
    Scalar(ScalarType),
    /// Id of a document in another collection
    Reference(ReferenceTarget),
    /// Single embedded document
    Embedded(Arc<Schema>),
    /// Ordered list of embedded documents
    EmbeddedList(Arc<Schema>),
}

impl FieldDescriptor {
    /// Name used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldDescriptor::Scalar(_) => "scalar",
            FieldDescriptor::Reference(_) => "reference",
            FieldDescriptor::Embedded(_) => "embedded document",
            FieldDescriptor::EmbeddedList(_) => "embedded list",
        }
    }

    /// Scalars and references hold a single value that `set_leaf` may assign.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            FieldDescriptor::Scalar(_) | FieldDescriptor::Reference(_)
        )
    }

    /// Check a value destined for a leaf field
    pub fn check_leaf_value(&self, path: &FieldPath, value: &serde_json::Value) -> Result<()> {
        let ok = match self {
            FieldDescriptor::Scalar(ty) => ty.accepts(value),
            FieldDescriptor::Reference(_) => value.is_null() || DocId::from_json(value).is_some(),
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::InvalidValue {
                path: path.to_string(),
                expected: match self {
                    FieldDescriptor::Scalar(ty) => ty.name(),
                    FieldDescriptor::Reference(_) => "document id",
                    other => other.kind_name(),
                },
                found: type_name(value),
            })
        }
    }
}

/// Post-processing hook run by `to_object()`
pub type Transform = Arc<dyn Fn(&mut JsonMap) + Send + Sync>;

/// Options applied by `to_object()` only
#[derive(Clone)]
pub struct ToObjectOptions {
    /// Hook run on the finished top-level map
    pub transform: Option<Transform>,
    /// Keep `__v` in the output
    pub version_key: bool,
}

impl Default for ToObjectOptions {
    fn default() -> Self {
        Self {
            transform: None,
            version_key: true,
        }
    }
}

impl fmt::Debug for ToObjectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToObjectOptions")
            .field("transform", &self.transform.is_some())
            .field("version_key", &self.version_key)
            .finish()
    }
}

/// Schema-level options
#[derive(Debug, Clone, Default)]
pub struct SchemaOptions {
    /// Behavior of `to_object()`
    pub to_object: ToObjectOptions,
}

/// A field resolved through the descriptor tree
#[derive(Debug, Clone)]
pub struct ResolvedField<'a> {
    /// Descriptor of the last segment
    pub descriptor: &'a FieldDescriptor,
    /// Schema that declares the field
    pub owner: &'a Schema,
    /// Name of the field within `owner`
    pub name: &'a str,
}

/// Declared fields of a document
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: IndexMap<String, FieldDescriptor>,
    options: SchemaOptions,
}

impl Schema {
    /// Start building a schema
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Descriptor for `name`
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Descriptor for `name`, or `UnknownField`
    pub fn require(&self, name: &str) -> Result<&FieldDescriptor> {
        self.fields
            .get(name)
            .ok_or_else(|| Error::unknown_field(name))
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no fields are declared
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Schema options
    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Resolve `path` against the descriptor tree
    ///
    /// Field segments must name declared fields. An undeclared field at any
    /// depth is `UnknownField` carrying the path up to that field; anything
    /// else that does not resolve is `InvalidPath`.
    /// Index segments are accepted only directly after an embedded list.
    /// Index bounds are a property of values, not of the schema, and are
    /// not checked here.
    pub fn resolve(&self, path: &FieldPath) -> Result<ResolvedField<'_>> {
        let segments = path.segments();
        let Some(PathSegment::Field(first)) = segments.first() else {
            return Err(Error::invalid_path(
                path.to_string(),
                "path must start with a field name",
            ));
        };

        let mut owner = self;
        let (mut name, mut descriptor) = owner
            .fields
            .get_key_value(first.as_str())
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| Error::unknown_field(first.as_str()))?;
        let mut i = 1;

        while i < segments.len() {
            let next_schema: &Schema = match (descriptor, &segments[i]) {
                (FieldDescriptor::Embedded(schema), PathSegment::Field(_)) => &**schema,
                (FieldDescriptor::EmbeddedList(schema), PathSegment::Index(_)) => {
                    i += 1;
                    if i == segments.len() {
                        return Err(Error::invalid_path(
                            path.to_string(),
                            format!("'{}' element is a document, not a field", name),
                        ));
                    }
                    &**schema
                }
                (FieldDescriptor::EmbeddedList(_), PathSegment::Field(_)) => {
                    return Err(Error::invalid_path(
                        path.to_string(),
                        format!("'{}' is an embedded list and needs an index", name),
                    ));
                }
                (FieldDescriptor::Reference(_), _) => {
                    return Err(Error::invalid_path(
                        path.to_string(),
                        format!(
                            "'{}' is a reference; mutate the populated document instead",
                            name
                        ),
                    ));
                }
                (other, _) => {
                    return Err(Error::invalid_path(
                        path.to_string(),
                        format!("'{}' is a {} field", name, other.kind_name()),
                    ));
                }
            };
            let PathSegment::Field(field) = &segments[i] else {
                return Err(Error::invalid_path(
                    path.to_string(),
                    "index must follow an embedded list",
                ));
            };
            owner = next_schema;
            let (key, next) = owner.fields.get_key_value(field.as_str()).ok_or_else(|| {
                Error::unknown_field(FieldPath::from_segments(segments[..=i].to_vec()).to_string())
            })?;
            name = key.as_str();
            descriptor = next;
            i += 1;
        }

        Ok(ResolvedField {
            descriptor,
            owner,
            name,
        })
    }
}

/// Builder for [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<(String, FieldDescriptor)>,
    options: SchemaOptions,
}

impl SchemaBuilder {
    /// Add a field with an explicit descriptor
    pub fn field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.fields.push((name.into(), descriptor));
        self
    }

    /// Add a scalar field
    pub fn scalar(self, name: impl Into<String>, ty: ScalarType) -> Self {
        self.field(name, FieldDescriptor::Scalar(ty))
    }

    /// Add a string field
    pub fn string(self, name: impl Into<String>) -> Self {
        self.scalar(name, ScalarType::String)
    }

    /// Add a number field
    pub fn number(self, name: impl Into<String>) -> Self {
        self.scalar(name, ScalarType::Number)
    }

    /// Add a boolean field
    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.scalar(name, ScalarType::Boolean)
    }

    /// Add a reference field
    pub fn reference(self, name: impl Into<String>, target: ReferenceTarget) -> Self {
        self.field(name, FieldDescriptor::Reference(target))
    }

    /// Add a single embedded document field
    pub fn embedded(self, name: impl Into<String>, schema: Arc<Schema>) -> Self {
        self.field(name, FieldDescriptor::Embedded(schema))
    }

    /// Add an embedded list field
    pub fn embedded_list(self, name: impl Into<String>, schema: Arc<Schema>) -> Self {
        self.field(name, FieldDescriptor::EmbeddedList(schema))
    }

    /// Set `to_object()` options
    pub fn to_object(mut self, options: ToObjectOptions) -> Self {
        self.options.to_object = options;
        self
    }

    /// Validate and build
    ///
    /// Field names must parse as a single path segment, must not repeat and
    /// must not collide with the reserved `_id` / `__v` keys.
    pub fn build(self) -> Result<Arc<Schema>> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for (name, descriptor) in self.fields {
            if name == ID_KEY || name == VERSION_KEY {
                return Err(Error::invalid_path(name, "reserved field name"));
            }
            let parsed: FieldPath = name.parse()?;
            if parsed.len() != 1 || parsed.head_field().is_none() {
                return Err(Error::invalid_path(name, "field name must be a single segment"));
            }
            if fields.contains_key(&name) {
                return Err(Error::invalid_path(name, "duplicate field"));
            }
            fields.insert(name, descriptor);
        }
        Ok(Arc::new(Schema {
            fields,
            options: self.options,
        }))
    }
}
