//! Table of the bean types known to a container.
//!
//! Each declared type name maps to a [BeanType]: a zero-argument factory plus a
//! table of property setters. Setters are registered up front, either by hand
//! with [TypeDescriptor::value] and [TypeDescriptor::reference] or through the
//! [crate::bean_type] macro, so wiring never depends on method names at runtime.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::coerce::{Coercible, TypeTag, Value};
use crate::registry::{BeanInstance, Shared};

/// Error raised by a failing factory
pub type FactoryError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to call a setter once its argument is resolved
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("no setter `{0}`")]
    NoSetter(String),
    #[error("setter expects {expected}, got {found}")]
    ArgumentMismatch { expected: String, found: String },
    #[error("bean is a `{actual}`, not a `{expected}`")]
    WrongBeanType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// What a setter accepts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetterKind {
    /// A literal, coerced to the tag first when it is primitive
    Value(TypeTag),
    /// Another bean, of the named Rust type
    Reference(&'static str),
}

/// Name of the setter matching a property, as reported in diagnostics
pub fn setter_name(property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_string(),
    }
}

/// Type-erased view on a [TypeDescriptor] used by the graph builder
pub trait BeanType: Send + Sync {
    /// Name under which declarations refer to this type
    fn type_name(&self) -> &str;

    /// Create a new instance with no property set
    fn instantiate(&self) -> Result<BeanInstance, FactoryError>;

    fn setter(&self, property: &str) -> Option<SetterKind>;

    /// Call a value setter on an instance created by [BeanType::instantiate]
    fn inject_value(
        &self,
        bean: &BeanInstance,
        property: &str,
        value: Value,
    ) -> Result<(), InvocationError>;

    /// Call a reference setter, handing over a shared handle on the target bean
    fn inject_reference(
        &self,
        bean: &BeanInstance,
        property: &str,
        target: &BeanInstance,
    ) -> Result<(), InvocationError>;

    fn as_any(&self) -> &dyn Any;
}

type Factory<T> = Box<dyn Fn() -> Result<T, FactoryError> + Send + Sync>;
type ValueSetter<T> = Box<dyn Fn(&mut T, Value) -> Result<(), Value> + Send + Sync>;
type ReferenceSetter<T> = Box<dyn Fn(&mut T, &BeanInstance) -> Result<(), &'static str> + Send + Sync>;

enum Setter<T> {
    Value { tag: TypeTag, apply: ValueSetter<T> },
    Reference { target: &'static str, apply: ReferenceSetter<T> },
}

impl<T> Setter<T> {
    fn kind(&self) -> SetterKind {
        match self {
            Setter::Value { tag, .. } => SetterKind::Value(*tag),
            Setter::Reference { target, .. } => SetterKind::Reference(*target),
        }
    }
}

/// Factory and setter table for one concrete type
pub struct TypeDescriptor<T> {
    name: String,
    factory: Factory<T>,
    setters: HashMap<String, Setter<T>>,
}

impl<T: Default + Send + Sync + 'static> TypeDescriptor<T> {
    /// Describe a type built with [Default::default]
    pub fn with_default(name: impl Into<String>) -> Self {
        Self::with_factory(name, || Ok(T::default()))
    }
}

impl<T: Send + Sync + 'static> TypeDescriptor<T> {
    /// Describe a type built by a fallible zero-argument factory
    pub fn with_factory<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<T, FactoryError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(factory),
            setters: HashMap::new(),
        }
    }

    /// Add a setter for a literal property.
    ///
    /// The parameter type selects the coercion applied to the literal.
    pub fn value<V, F>(mut self, property: impl Into<String>, setter: F) -> Self
    where
        V: Coercible,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let apply = move |bean: &mut T, value: Value| V::from_value(value).map(|v| setter(bean, v));
        self.setters.insert(
            property.into(),
            Setter::Value {
                tag: V::TAG,
                apply: Box::new(apply),
            },
        );
        self
    }

    /// Add a setter for a property referencing another bean
    pub fn reference<U, F>(mut self, property: impl Into<String>, setter: F) -> Self
    where
        U: Send + Sync + 'static,
        F: Fn(&mut T, Shared<U>) + Send + Sync + 'static,
    {
        let target = std::any::type_name::<U>();
        let apply = move |bean: &mut T, other: &BeanInstance| match other.downcast::<U>() {
            Some(shared) => {
                setter(bean, shared);
                Ok(())
            }
            None => Err(other.type_name()),
        };
        self.setters.insert(
            property.into(),
            Setter::Reference {
                target,
                apply: Box::new(apply),
            },
        );
        self
    }

    /// Create a fresh, unwired instance
    pub fn create(&self) -> Result<T, FactoryError> {
        (self.factory)()
    }

    fn typed(&self, bean: &BeanInstance) -> Result<Shared<T>, InvocationError> {
        bean.downcast::<T>().ok_or_else(|| InvocationError::WrongBeanType {
            expected: std::any::type_name::<T>(),
            actual: bean.type_name(),
        })
    }
}

impl<T: Send + Sync + 'static> BeanType for TypeDescriptor<T> {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn instantiate(&self) -> Result<BeanInstance, FactoryError> {
        self.create().map(BeanInstance::new)
    }

    fn setter(&self, property: &str) -> Option<SetterKind> {
        self.setters.get(property).map(Setter::kind)
    }

    fn inject_value(
        &self,
        bean: &BeanInstance,
        property: &str,
        value: Value,
    ) -> Result<(), InvocationError> {
        let shared = self.typed(bean)?;
        match self.setters.get(property) {
            None => Err(InvocationError::NoSetter(setter_name(property))),
            Some(Setter::Value { tag, apply }) => {
                let mut guard = shared.write();
                apply(&mut *guard, value).map_err(|v| InvocationError::ArgumentMismatch {
                    expected: tag.to_string(),
                    found: v.tag().to_string(),
                })
            }
            Some(Setter::Reference { target, .. }) => Err(InvocationError::ArgumentMismatch {
                expected: target.to_string(),
                found: value.tag().to_string(),
            }),
        }
    }

    fn inject_reference(
        &self,
        bean: &BeanInstance,
        property: &str,
        target: &BeanInstance,
    ) -> Result<(), InvocationError> {
        let shared = self.typed(bean)?;
        match self.setters.get(property) {
            None => Err(InvocationError::NoSetter(setter_name(property))),
            Some(Setter::Reference { target: expected, apply }) => {
                let mut guard = shared.write();
                apply(&mut *guard, target).map_err(|found| {
                    InvocationError::ArgumentMismatch {
                        expected: expected.to_string(),
                        found: found.to_string(),
                    }
                })
            }
            Some(Setter::Value { tag, .. }) => Err(InvocationError::ArgumentMismatch {
                expected: tag.to_string(),
                found: target.type_name().to_string(),
            }),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Indirection table from declared type names to their descriptors.
///
/// Populated once before any build; read-only afterwards.
#[derive(Default)]
pub struct TypeRegistry {
    by_name: HashMap<String, Arc<dyn BeanType>>,
    by_type: HashMap<TypeId, Arc<dyn BeanType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type under the name carried by its descriptor.
    ///
    /// A later registration for the same name replaces the earlier one.
    pub fn add<T: Send + Sync + 'static>(&mut self, descriptor: TypeDescriptor<T>) -> &mut Self {
        let name = descriptor.name.clone();
        debug!(type_name = %name, rust_type = std::any::type_name::<T>(), "registering bean type");
        let descriptor: Arc<dyn BeanType> = Arc::new(descriptor);
        if self.by_name.insert(name.clone(), descriptor.clone()).is_some() {
            warn!(type_name = %name, "bean type registered twice, keeping the last one");
        }
        self.by_type.insert(TypeId::of::<T>(), descriptor);
        self
    }

    /// Shortcut for [TypeDescriptor::with_default] with no setters
    pub fn register<T: Default + Send + Sync + 'static>(&mut self, name: impl Into<String>) -> &mut Self {
        self.add(TypeDescriptor::<T>::with_default(name))
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<dyn BeanType>> {
        self.by_name.get(type_name)
    }

    /// Typed descriptor of a registered Rust type
    pub fn descriptor<T: 'static>(&self) -> Option<&TypeDescriptor<T>> {
        self.by_type
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<TypeDescriptor<T>>()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.by_name.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
