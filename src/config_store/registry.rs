use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::debug;

use super::{
    SchemaError,
    converters::{
        BoolConverter, CompositeConverter, Converter, EnumConverter, FromStrConverter,
        StringConverter, StringListConverter, SubField, TimestampConverter,
    },
    schema::{ConfigType, FieldSpec, Schema, TypeDescriptor, TypeKind},
};

/// Maps field types to converters, building each converter once.
///
/// Resolution order is built-in kinds first, then `FromStr`/`Display`
/// types, then synthesis of composite converters from the converters of
/// their sub-fields. A registry is usually owned by one store; share it
/// through an `Arc` to reuse synthesized converters.
#[derive(Default)]
pub struct ConverterRegistry {
    entries: RwLock<HashMap<TypeId, Arc<dyn Converter>>>,
}

impl ConverterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a converter for `T` ahead of resolution.
    ///
    /// Entries are immutable once present; returns `false` if `T` already
    /// had a converter.
    pub fn register<T: ConfigType>(&self, converter: impl Converter + 'static) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(&TypeId::of::<T>()) {
            return false;
        }
        entries.insert(TypeId::of::<T>(), Arc::new(converter));
        true
    }

    /// Number of cached converters.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no converter has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the converter for a field's type.
    ///
    /// # Errors
    /// Returns `SchemaError::UnsupportedType` if neither the type nor, for
    /// composites, one of its sub-fields can be converted.
    pub fn converter_for_field(&self, field: &FieldSpec) -> Result<Arc<dyn Converter>, SchemaError> {
        self.resolve(&field.ty, field.name)
    }

    /// Returns the converter for a type.
    ///
    /// # Errors
    /// Returns `SchemaError::UnsupportedType` if no converter can be built.
    pub fn converter_for(&self, ty: &TypeDescriptor) -> Result<Arc<dyn Converter>, SchemaError> {
        self.resolve(ty, ty.name)
    }

    /// Resolves every field of a schema, surfacing unsupported types.
    ///
    /// # Errors
    /// Returns the first `SchemaError` encountered in declaration order.
    pub fn validate(&self, schema: &Schema) -> Result<(), SchemaError> {
        schema
            .fields()
            .iter()
            .try_for_each(|field| self.converter_for_field(field).map(|_| ()))
    }

    fn cached(&self, id: TypeId) -> Option<Arc<dyn Converter>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    fn resolve(&self, ty: &TypeDescriptor, path: &str) -> Result<Arc<dyn Converter>, SchemaError> {
        if let Some(converter) = self.cached(ty.id) {
            return Ok(converter);
        }

        let built: Arc<dyn Converter> = match ty.kind {
            TypeKind::String => Arc::new(StringConverter),
            TypeKind::Bool => Arc::new(BoolConverter),
            TypeKind::Enum(ops) => Arc::new(EnumConverter {
                type_name: ty.name,
                ops,
            }),
            TypeKind::Timestamp => Arc::new(TimestampConverter),
            TypeKind::StringList => Arc::new(StringListConverter),
            TypeKind::Number(ops) => Arc::new(FromStrConverter {
                type_name: ty.name,
                ops: ops.text,
            }),
            TypeKind::Parsed(ops) => Arc::new(FromStrConverter {
                type_name: ty.name,
                ops,
            }),
            TypeKind::Composite(ops) => {
                let fields = (ops.schema)()
                    .fields()
                    .iter()
                    .enumerate()
                    .map(|(index, field)| {
                        let converter = self.resolve(&field.ty, &format!("{path}.{}", field.name))?;
                        Ok(SubField {
                            name: field.name,
                            index,
                            assign: field.ty.assign,
                            converter,
                        })
                    })
                    .collect::<Result<Vec<_>, SchemaError>>()?;

                debug!(type_name = ty.name, fields = fields.len(), "Synthesized composite converter");
                Arc::new(CompositeConverter {
                    type_name: ty.name,
                    ops,
                    fields,
                })
            }
            TypeKind::Opaque => {
                return Err(SchemaError::UnsupportedType {
                    type_name: ty.name,
                    field: path.to_string(),
                });
            }
        };

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.entry(ty.id).or_insert(built).clone())
    }
}
