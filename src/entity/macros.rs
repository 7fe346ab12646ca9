/// Define an entity type and its field registry.
///
/// ```ignore
/// architect_orm::entity! {
///     /// A todo item.
///     pub struct Item {
///         "title",
///         "done": Boolean,
///         "listId": Integer,
///     }
/// }
/// ```
///
/// Property names are camelCase; columns are derived with
/// [`property_to_column`](crate::case::property_to_column). The optional kind
/// after `:` is a [`FieldType`](crate::FieldType) variant used to coerce row
/// values. `id` is always declared as `Integer`.
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($field:literal $(: $kind:ident)?),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            state: $crate::EntityState,
        }

        impl $crate::Entity for $name {
            fn descriptor() -> &'static $crate::EntityDescriptor {
                static DESCRIPTOR: ::std::sync::OnceLock<$crate::EntityDescriptor> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| {
                    $crate::EntityDescriptor::builder(stringify!($name))
                        $(.declare($field, $crate::__entity_field_type!($($kind)?)))*
                        .build()
                })
            }

            fn state(&self) -> &$crate::EntityState {
                &self.state
            }

            fn state_mut(&mut self) -> &mut $crate::EntityState {
                &mut self.state
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __entity_field_type {
    () => {
        ::core::option::Option::None
    };
    ($kind:ident) => {
        ::core::option::Option::Some($crate::FieldType::$kind)
    };
}
