//! Minimal bean container: declared objects are instantiated by name, wired through
//! their setters, then looked up by identifier.
//!
//! # Simple use case
//!
//! ```
//! # use sprout::*;
//! #[derive(Default)]
//! struct Engine {
//!     power: u32,
//! }
//!
//! #[derive(Default)]
//! struct Car {
//!     model: String,
//!     engine: Option<Shared<Engine>>,
//! }
//!
//! # fn main() -> Result<(), ContextError> {
//! // Register the constructible types and their setters
//! let mut types = TypeRegistry::new();
//! bean_type!(types, "Engine" => Engine { value power: u32 });
//! bean_type!(types, "Car" => Car { value model: String, reference engine: Engine });
//!
//! // Declare the beans
//! let reader = StaticDefinitionReader::new(vec![
//!     BeanDefinition::new("car", "Car")
//!         .with_property("model", "roadster")
//!         .with_reference("engine", "v8"),
//!     BeanDefinition::new("v8", "Engine").with_property("power", "450"),
//! ]);
//!
//! let context = ApplicationContext::started(types, reader)?;
//! let car = context.get_bean_as::<Car>("car")?;
//! let engine = context.get_bean_as::<Engine>("v8")?;
//! assert_eq!(car.read().model, "roadster");
//! assert_eq!(engine.read().power, 450);
//! assert!(std::sync::Arc::ptr_eq(car.read().engine.as_ref().unwrap(), &engine));
//! # Ok(())
//! # }
//! ```
//!
//! # Mechanism
//!
//! Nothing is discovered at runtime: the [TypeRegistry] maps every declared type name to a
//! [TypeDescriptor], holding a zero-argument factory and a table of setters keyed by property.
//! The setter parameter type decides how a literal is converted (see [coerce()]).
//!
//! * A [BeanDefinitionReader] supplies the declarations: id, type name, literal properties and
//!   references to other beans.
//! * The [GraphBuilder] instantiates all beans, then injects all literal properties, then all
//!   references. References can thus point to any bean of the same batch, in any order.
//! * The [ApplicationContext] runs the build on [ApplicationContext::start] and exposes the
//!   resulting [BeanRegistry] for lookups.
//!
//! Beans are stored as [Shared] handles: a reference property receives the very instance
//! stored in the registry, not a copy.

mod builder;
mod coerce;
mod config;
mod context;
mod definition;
mod helpers;
mod registry;
mod types;

pub use builder::{BuildError, GraphBuilder};
pub use coerce::{coerce, Coercible, CoercionError, TypeTag, Value};
pub use config::{ContainerConfig, DuplicateIdPolicy, MissingSetterPolicy};
pub use context::{ApplicationContext, ContextError};
pub use definition::{
    BeanDefinition, BeanDefinitionReader, JsonDefinitionReader, ReadError, StaticDefinitionReader,
};
pub use registry::{Bean, BeanInstance, BeanRegistry, Shared};
pub use types::{setter_name, BeanType, FactoryError, InvocationError, SetterKind, TypeDescriptor, TypeRegistry};

#[cfg(test)]
mod tests;
