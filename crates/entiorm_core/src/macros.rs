//! The `entity!` declaration macro.

/// Declares a struct as an entity and implements [`Reflect`](crate::Reflect)
/// and [`Entity`](crate::Entity) for it.
///
/// The struct gets a zero-argument constructor backed by `Default`, so it
/// must derive or implement `Default`. Every field type must implement
/// [`AttributeValue`](crate::AttributeValue).
///
/// - `as "name"` sets the storage name (default: lower-cased type name)
/// - `: Serializable` applies the blob-capable marker
/// - field tags: `#[key]`, `#[ignore]`, `#[transient]`, `#[optional]`
///
/// ```
/// use entiorm_core::{entity, EntityReflector};
///
/// entity! {
///     #[derive(Debug, Default, Clone, PartialEq)]
///     pub struct User as "users": Serializable {
///         #[key]
///         pub id: i64,
///         pub name: String,
///         #[ignore]
///         pub session: Option<String>,
///     }
/// }
///
/// let metadata = EntityReflector::default().derive::<User>().unwrap();
/// assert_eq!(metadata.entity_name(), "users");
/// assert_eq!(metadata.primary_key().unwrap().name(), "id");
/// assert!(metadata.is_serializable());
/// ```
#[macro_export]
macro_rules! entity {
    (@name) => { ::core::option::Option::None };
    (@name $name:literal) => { ::core::option::Option::Some($name) };

    (@tag key) => { $crate::FieldTag::PrimaryKey };
    (@tag ignore) => { $crate::FieldTag::Ignored };
    (@tag transient) => { $crate::FieldTag::Transient };
    (@tag optional) => { $crate::FieldTag::Optional };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(as $entity_name:literal)? $(: $($marker:ident),+)? {
            $(
                $(#[$tag:ident])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $field_vis $field: $ty, )*
        }

        impl $crate::Reflect for $name {
            fn type_descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::entity(
                    ::core::stringify!($name),
                    $crate::entity!(@name $($entity_name)?),
                )
                $(
                    .field(
                        $crate::FieldDescriptor::of::<$ty>(::core::stringify!($field))
                            .tagged(&[$($crate::entity!(@tag $tag)),*]),
                    )
                )*
                .constructor($crate::ConstructorDescriptor::zero_arg())
                .markers(&[$($(::core::stringify!($marker)),+)?])
            }
        }

        impl $crate::Entity for $name {
            fn invoke(
                index: usize,
                args: ::std::vec::Vec<$crate::Value>,
            ) -> $crate::CoreResult<Self> {
                if index == 0 && args.is_empty() {
                    ::core::result::Result::Ok(<Self as ::core::default::Default>::default())
                } else {
                    ::core::result::Result::Err($crate::CoreError::entity_construction(
                        ::core::stringify!($name),
                        ::std::format!("no constructor #{} taking {} arguments", index, args.len()),
                    ))
                }
            }

            #[allow(unused_variables)]
            fn assign(&mut self, field: &str, value: $crate::Value) -> $crate::CoreResult<()> {
                match field {
                    $(
                        ::core::stringify!($field) => {
                            self.$field = <$ty as $crate::AttributeValue>::from_value(value)?;
                            ::core::result::Result::Ok(())
                        }
                    )*
                    other => ::core::result::Result::Err($crate::CoreError::invalid_operation(
                        ::std::format!("{} has no attribute {}", ::core::stringify!($name), other),
                    )),
                }
            }

            fn read(&self, field: &str) -> ::core::option::Option<$crate::Value> {
                match field {
                    $(
                        ::core::stringify!($field) => ::core::option::Option::Some(
                            $crate::AttributeValue::to_value(&self.$field),
                        ),
                    )*
                    _ => ::core::option::Option::None,
                }
            }
        }

        $($(
            impl $crate::$marker for $name {}
        )+)?
    };
}
