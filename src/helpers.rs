/// Register a [Default] type and its setters in a [crate::TypeRegistry].
///
/// Each entry maps a property to a struct field. `value` fields receive literals,
/// coerced to the field type. `reference` fields must be an ```Option<Shared<$Type>>```
/// and receive the referenced bean. The property name is the field name, unless
/// another one is given with `as`.
///
/// ```
/// # use sprout::*;
/// #[derive(Default)]
/// struct Address {
///     city: String,
/// }
///
/// #[derive(Default)]
/// struct Person {
///     first_name: String,
///     age: u32,
///     address: Option<Shared<Address>>,
/// }
///
/// let mut types = TypeRegistry::new();
/// bean_type!(types, "Address" => Address { value city: String });
/// bean_type!(types, "Person" => Person {
///     value first_name as "firstName": String,
///     value age: u32,
///     reference address: Address,
/// });
/// assert_eq!(types.len(), 2);
/// ```
#[macro_export]
macro_rules! bean_type {
    (@setter $descriptor:ident, $Type:ty, value $field:ident : $Field:ty) => {
        $crate::bean_type!(@setter $descriptor, $Type, value $field as (stringify!($field)) : $Field)
    };
    (@setter $descriptor:ident, $Type:ty, value $field:ident as $property:tt : $Field:ty) => {
        $descriptor.value($property, |bean: &mut $Type, value: $Field| bean.$field = value)
    };
    (@setter $descriptor:ident, $Type:ty, reference $field:ident : $Field:ty) => {
        $crate::bean_type!(@setter $descriptor, $Type, reference $field as (stringify!($field)) : $Field)
    };
    (@setter $descriptor:ident, $Type:ty, reference $field:ident as $property:tt : $Field:ty) => {
        $descriptor.reference($property, |bean: &mut $Type, target: $crate::Shared<$Field>| {
            bean.$field = Some(target)
        })
    };

    ($types:expr, $name:expr => $Type:ty { $( $kind:ident $field:ident $(as $property:literal)? : $Field:ty ),* $(,)? }) => {{
        let descriptor = $crate::TypeDescriptor::<$Type>::with_default($name);
        $(
        let descriptor = $crate::bean_type!(@setter descriptor, $Type, $kind $field $(as $property)? : $Field);
        )*
        $types.add(descriptor);
    }};
}
