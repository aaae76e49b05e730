use std::{
    any::{Any, TypeId},
    fmt::{self, Display},
    str::FromStr,
    time::Instant,
};

use chrono::{DateTime, Utc};
use serde_json::Number;

/// Type-erased field value handed between converters and settings objects.
pub type BoxedValue = Box<dyn Any + Send>;

/// Capability interface implemented by every persistable settings type.
///
/// Fields are addressed by their position in [`Settings::schema`]. Most types
/// implement this through [`impl_settings!`](crate::impl_settings) rather than
/// by hand.
pub trait Settings: Send + Sync + 'static {
    /// Declared fields in on-disk order, with their metadata.
    fn schema() -> Schema
    where
        Self: Sized;

    /// Borrows the field at `index`.
    fn field(&self, index: usize) -> Option<&dyn Any>;

    /// Mutably borrows the field at `index`.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Any>;
}

/// A type that can appear as a settings field.
pub trait ConfigType: Send + Sync + 'static {
    /// Describes how the registry should convert this type.
    fn descriptor() -> TypeDescriptor;
}

/// Enumerations persisted by variant name.
///
/// Implemented through [`config_enum!`](crate::config_enum).
pub trait ConfigEnum: Copy + PartialEq + Send + Sync + 'static {
    /// Declared variant names in order.
    const VARIANTS: &'static [(&'static str, Self)];

    /// Name of this variant as written to disk.
    fn name(self) -> &'static str {
        Self::VARIANTS
            .iter()
            .find(|(_, variant)| *variant == self)
            .map_or("", |(name, _)| name)
    }

    /// Looks a variant up by its exact name.
    fn from_name(name: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, variant)| *variant)
    }
}

/// Ordered field list plus file-level metadata of a settings type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    header: Vec<&'static str>,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the comment lines written at the top of the file.
    ///
    /// Blank entries are written as blank lines.
    #[must_use]
    pub fn header<I>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        self.header = lines.into_iter().collect();
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Header comment lines.
    pub fn header_lines(&self) -> &[&'static str] {
        &self.header
    }

    /// Declared fields in order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Index of the field with the given schema name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }
}

/// One declared field: name, type and display metadata.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub(crate) name: &'static str,
    pub(crate) ty: TypeDescriptor,
    pub(crate) section: Option<&'static str>,
    pub(crate) comment: Option<&'static str>,
    pub(crate) hidden: bool,
}

impl FieldSpec {
    /// Declares a field of type `T`.
    ///
    /// Underscores in `name` become dots in the on-disk key.
    pub fn new<T: ConfigType>(name: &'static str) -> Self {
        Self {
            name,
            ty: T::descriptor(),
            section: None,
            comment: None,
            hidden: false,
        }
    }

    /// Overrides the schema name.
    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Groups the field under a `[section]` header.
    #[must_use]
    pub fn section(mut self, section: &'static str) -> Self {
        self.section = Some(section);
        self
    }

    /// Comment written when the user has not supplied one.
    #[must_use]
    pub fn comment(mut self, comment: &'static str) -> Self {
        self.comment = Some(comment);
        self
    }

    /// Excludes the field from the structured projection.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Schema name of the field.
    pub fn field_name(&self) -> &'static str {
        self.name
    }

    /// Display section, if any.
    pub fn display_section(&self) -> Option<&'static str> {
        self.section
    }

    /// Default comment, if any.
    pub fn default_comment(&self) -> Option<&'static str> {
        self.comment
    }

    /// Whether the field is excluded from the structured projection.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Type descriptor of the field.
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.ty
    }
}

/// Runtime identity and conversion capabilities of a field type.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) kind: TypeKind,
    pub(crate) assign: fn(&mut dyn Any, BoxedValue) -> bool,
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind.label())
            .finish()
    }
}

/// How values of a type are converted.
#[derive(Clone, Copy)]
pub enum TypeKind {
    /// `String`
    String,
    /// `bool`
    Bool,
    /// Enumeration persisted by variant name
    Enum(EnumOps),
    /// `DateTime<Utc>`
    Timestamp,
    /// `Vec<String>`
    StringList,
    /// Integer or float primitive
    Number(NumberOps),
    /// Any other `FromStr` + `Display` type
    Parsed(ParseOps),
    /// Nested settings aggregate
    Composite(CompositeOps),
    /// A type with no textual form
    Opaque,
}

impl TypeKind {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            TypeKind::String => "string",
            TypeKind::Bool => "boolean",
            TypeKind::Enum(_) => "enum",
            TypeKind::Timestamp => "timestamp",
            TypeKind::StringList => "string list",
            TypeKind::Number(_) => "number",
            TypeKind::Parsed(_) => "parsed",
            TypeKind::Composite(_) => "composite",
            TypeKind::Opaque => "opaque",
        }
    }
}

/// Name table access for an enumeration.
#[derive(Clone, Copy)]
pub struct EnumOps {
    pub(crate) names: fn() -> Vec<&'static str>,
    pub(crate) name_of: fn(&dyn Any) -> Option<&'static str>,
    pub(crate) from_name: fn(&str) -> Option<BoxedValue>,
}

/// Text conversion through `FromStr` and `Display`.
#[derive(Clone, Copy)]
pub struct ParseOps {
    pub(crate) parse: fn(&str) -> Result<BoxedValue, String>,
    pub(crate) format: fn(&dyn Any) -> Option<String>,
}

/// Numeric conversions for primitives, text plus JSON numbers.
#[derive(Clone, Copy)]
pub struct NumberOps {
    pub(crate) text: ParseOps,
    pub(crate) to_json: fn(&dyn Any) -> Option<Number>,
    pub(crate) from_json: fn(&Number) -> Option<BoxedValue>,
}

/// Field access for a nested settings aggregate.
#[derive(Clone, Copy)]
pub struct CompositeOps {
    pub(crate) schema: fn() -> Schema,
    pub(crate) new: fn() -> BoxedValue,
    pub(crate) field: fn(&dyn Any, usize) -> Option<&dyn Any>,
    pub(crate) field_mut: fn(&mut dyn Any, usize) -> Option<&mut dyn Any>,
}

impl TypeDescriptor {
    fn of<T: Send + 'static>(kind: TypeKind) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind,
            assign: assign::<T>,
        }
    }

    /// Type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Conversion kind.
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Descriptor for an enumeration persisted by name.
    pub fn enumeration<T: ConfigEnum>() -> Self {
        Self::of::<T>(TypeKind::Enum(EnumOps {
            names: || T::VARIANTS.iter().map(|(name, _)| *name).collect(),
            name_of: |value| value.downcast_ref::<T>().map(|v| v.name()),
            from_name: |name| T::from_name(name).map(|v| Box::new(v) as BoxedValue),
        }))
    }

    /// Descriptor for a type converted through its `FromStr` and `Display`
    /// implementations.
    pub fn from_str<T>() -> Self
    where
        T: FromStr + Display + Send + Sync + 'static,
        T::Err: Display,
    {
        Self::of::<T>(TypeKind::Parsed(parse_ops::<T>()))
    }

    /// Descriptor for a nested settings aggregate.
    pub fn composite<T: Settings + Default>() -> Self {
        Self::of::<T>(TypeKind::Composite(CompositeOps {
            schema: T::schema,
            new: || Box::new(T::default()),
            field: |value, index| value.downcast_ref::<T>()?.field(index),
            field_mut: |value, index| value.downcast_mut::<T>()?.field_mut(index),
        }))
    }

    /// Descriptor for a type that cannot be written as text.
    pub fn opaque<T: Send + 'static>() -> Self {
        Self::of::<T>(TypeKind::Opaque)
    }
}

fn assign<T: Send + 'static>(slot: &mut dyn Any, value: BoxedValue) -> bool {
    match (slot.downcast_mut::<T>(), value.downcast::<T>()) {
        (Some(slot), Ok(value)) => {
            *slot = *value;
            true
        }
        _ => false,
    }
}

fn parse_ops<T>() -> ParseOps
where
    T: FromStr + Display + Send + 'static,
    T::Err: Display,
{
    ParseOps {
        parse: |text| {
            text.parse::<T>()
                .map(|value| Box::new(value) as BoxedValue)
                .map_err(|e| e.to_string())
        },
        format: |value| value.downcast_ref::<T>().map(ToString::to_string),
    }
}

impl ConfigType for String {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::String)
    }
}

impl ConfigType for bool {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Bool)
    }
}

impl ConfigType for DateTime<Utc> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Timestamp)
    }
}

impl ConfigType for Vec<String> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::StringList)
    }
}

impl ConfigType for char {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::from_str::<Self>()
    }
}

impl ConfigType for Instant {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::opaque::<Self>()
    }
}

macro_rules! integer_config_type {
    ($($int:ty),* $(,)?) => {
        $(
            impl ConfigType for $int {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::of::<Self>(TypeKind::Number(NumberOps {
                        text: parse_ops::<Self>(),
                        to_json: |value| value.downcast_ref::<$int>().map(|n| Number::from(*n)),
                        from_json: |number| {
                            number
                                .as_i64()
                                .and_then(|n| <$int>::try_from(n).ok())
                                .or_else(|| number.as_u64().and_then(|n| <$int>::try_from(n).ok()))
                                .map(|n| Box::new(n) as BoxedValue)
                        },
                    }))
                }
            }
        )*
    };
}

integer_config_type!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl ConfigType for f64 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Number(NumberOps {
            text: parse_ops::<Self>(),
            to_json: |value| value.downcast_ref::<f64>().and_then(|n| Number::from_f64(*n)),
            from_json: |number| number.as_f64().map(|n| Box::new(n) as BoxedValue),
        }))
    }
}

impl ConfigType for f32 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Number(NumberOps {
            text: parse_ops::<Self>(),
            to_json: |value| {
                value
                    .downcast_ref::<f32>()
                    .and_then(|n| Number::from_f64(f64::from(*n)))
            },
            from_json: |number| number.as_f64().map(|n| Box::new(n as f32) as BoxedValue),
        }))
    }
}
