/// Implements [`Settings`](crate::config_store::Settings) and
/// [`ConfigType`](crate::config_store::ConfigType) for a struct by listing
/// its persisted fields in on-disk order.
///
/// Each field may carry a brace block of [`FieldSpec`](crate::config_store::FieldSpec)
/// builder calls: `section: "Twitch"`, `comment: "..."`, `name: "WebApp_Port"`
/// or a bare `hidden`. The optional `#[header(...)]` lines are written at the
/// top of the file.
///
/// ```ignore
/// impl_settings! {
///     #[header("Proxy used by outgoing connections")]
///     ProxySettings {
///         host: String { name: "Host", comment: "host name or address" },
///         port: u16 { name: "Port" },
///     }
/// }
/// ```
///
/// Types implementing `Default` may then be used as fields of other
/// settings structs; they are persisted as a JSON object.
#[macro_export]
macro_rules! impl_settings {
    (
        $(#[header($($header:expr),* $(,)?)])?
        $settings:ty {
            $(
                $field:ident : $ty:ty $({ $($meta:ident $(: $value:expr)?),* $(,)? })?
            ),* $(,)?
        }
    ) => {
        impl $crate::config_store::Settings for $settings {
            fn schema() -> $crate::config_store::Schema {
                $crate::config_store::Schema::new()
                    $(.header([$($header),*]))?
                    $(
                        .field(
                            $crate::config_store::FieldSpec::new::<$ty>(stringify!($field))
                                $($(.$meta($($value)?))*)?
                        )
                    )*
            }

            #[allow(unused_assignments, unused_mut)]
            fn field(&self, index: usize) -> ::std::option::Option<&dyn ::std::any::Any> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return ::std::option::Option::Some(&self.$field);
                    }
                    position += 1;
                )*
                ::std::option::Option::None
            }

            #[allow(unused_assignments, unused_mut)]
            fn field_mut(&mut self, index: usize) -> ::std::option::Option<&mut dyn ::std::any::Any> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return ::std::option::Option::Some(&mut self.$field);
                    }
                    position += 1;
                )*
                ::std::option::Option::None
            }
        }

        impl $crate::config_store::ConfigType for $settings {
            fn descriptor() -> $crate::config_store::TypeDescriptor {
                $crate::config_store::TypeDescriptor::composite::<Self>()
            }
        }
    };
}

/// Declares an enumeration persisted by variant name.
///
/// The first variant is the `Default`.
///
/// ```ignore
/// config_enum! {
///     /// Overlay animation
///     pub enum DanmakuStyle { Scroll, Static, Fade }
/// }
/// ```
#[macro_export]
macro_rules! config_enum {
    (
        $(#[$attr:meta])*
        $vis:vis enum $name:ident {
            $(#[$first_attr:meta])*
            $first:ident
            $(, $(#[$variant_attr:meta])* $variant:ident)* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis enum $name {
            $(#[$first_attr])*
            #[default]
            $first,
            $($(#[$variant_attr])* $variant,)*
        }

        impl $crate::config_store::ConfigEnum for $name {
            const VARIANTS: &'static [(&'static str, Self)] = &[
                (stringify!($first), Self::$first),
                $((stringify!($variant), Self::$variant),)*
            ];
        }

        impl $crate::config_store::ConfigType for $name {
            fn descriptor() -> $crate::config_store::TypeDescriptor {
                $crate::config_store::TypeDescriptor::enumeration::<Self>()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::config_store::ConfigEnum::name(*self))
            }
        }
    };
}
