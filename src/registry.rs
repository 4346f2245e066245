//! Storage for the constructed beans.

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared, mutable handle on a bean of a known type.
///
/// Every holder of a reference to a bean sees the same instance:
/// compare handles with [Arc::ptr_eq].
pub type Shared<T> = Arc<RwLock<T>>;

/// Type-erased handle on a bean instance
#[derive(Clone)]
pub struct BeanInstance {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl BeanInstance {
    pub fn new<T: Send + Sync + 'static>(instance: T) -> Self {
        Self::from_shared(Arc::new(RwLock::new(instance)))
    }

    pub fn from_shared<T: Send + Sync + 'static>(shared: Shared<T>) -> Self {
        Self {
            inner: shared,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Name of the concrete Rust type behind this handle
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Send + Sync + 'static>(&self) -> bool {
        (*self.inner).is::<RwLock<T>>()
    }

    /// Recover the typed handle, if the instance has exactly this runtime type
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Shared<T>> {
        Arc::clone(&self.inner).downcast::<RwLock<T>>().ok()
    }

    pub fn ptr_eq(&self, other: &BeanInstance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for BeanInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanInstance")
            .field("type_name", &self.type_name)
            .field("instance", &"<bean>")
            .finish()
    }
}

/// A constructed instance and the identifier it was declared with
#[derive(Clone, Debug)]
pub struct Bean {
    pub id: String,
    pub instance: BeanInstance,
}

/// Identifier => bean map filled by the graph builder.
///
/// No uniqueness check happens here: inserting an existing identifier replaces it
/// and hands back the displaced bean.
#[derive(Debug, Default)]
pub struct BeanRegistry {
    beans: HashMap<String, Bean>,
}

impl BeanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bean: Bean) -> Option<Bean> {
        self.beans.insert(bean.id.clone(), bean)
    }

    pub fn get(&self, id: &str) -> Option<&Bean> {
        self.beans.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.beans.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.beans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.beans.keys().map(String::as_str)
    }
}
