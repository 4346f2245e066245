//! Lookup surface over a built bean graph.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::builder::{BuildError, GraphBuilder};
use crate::config::ContainerConfig;
use crate::definition::{BeanDefinitionReader, ReadError};
use crate::registry::{BeanInstance, BeanRegistry, Shared};
use crate::types::{FactoryError, TypeRegistry};

/// Errors returned by the [ApplicationContext]
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("The context has not been started")]
    NotInitialized,
    #[error("No bean named `{id}`")]
    NotFound { id: String },
    #[error("Bean `{id}` is a `{actual}`, not a `{expected}`")]
    TypeMismatch {
        id: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Type `{type_name}` is not registered")]
    TypeNotRegistered { type_name: &'static str },
    #[error("Cannot instantiate `{type_name}`: {source}")]
    Instantiation {
        type_name: &'static str,
        source: FactoryError,
    },
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Bean container: reads declarations, builds the graph and serves lookups.
///
/// Lookups by identifier fail with [ContextError::NotInitialized] until [ApplicationContext::start]
/// has succeeded. Once started, the graph is never modified and the context can be shared
/// between threads for reading.
pub struct ApplicationContext {
    types: Arc<TypeRegistry>,
    reader: Box<dyn BeanDefinitionReader>,
    config: ContainerConfig,
    beans: Option<BeanRegistry>,
}

impl ApplicationContext {
    /// Create a context without building it
    pub fn new(
        types: impl Into<Arc<TypeRegistry>>,
        reader: impl BeanDefinitionReader + 'static,
    ) -> Self {
        Self {
            types: types.into(),
            reader: Box::new(reader),
            config: ContainerConfig::default(),
            beans: None,
        }
    }

    /// Create a context and start it right away
    pub fn started(
        types: impl Into<Arc<TypeRegistry>>,
        reader: impl BeanDefinitionReader + 'static,
    ) -> Result<Self, ContextError> {
        let mut context = Self::new(types, reader);
        context.start()?;
        Ok(context)
    }

    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the declaration source used by the next [ApplicationContext::start]
    pub fn set_bean_definition_reader(&mut self, reader: impl BeanDefinitionReader + 'static) {
        self.reader = Box::new(reader);
    }

    /// Read the declarations and build the bean graph from scratch.
    ///
    /// Beans from a previous start are discarded first: if this build fails, the context
    /// is left unstarted.
    pub fn start(&mut self) -> Result<(), ContextError> {
        self.beans = None;
        let definitions = self.reader.bean_definitions()?;
        let beans = GraphBuilder::new(&self.types, self.config).build(&definitions)?;
        info!(beans = beans.len(), "context started");
        self.beans = Some(beans);
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.beans.is_some()
    }

    fn beans(&self) -> Result<&BeanRegistry, ContextError> {
        self.beans.as_ref().ok_or(ContextError::NotInitialized)
    }

    /// Retrieve a bean by identifier
    pub fn get_bean(&self, id: &str) -> Result<BeanInstance, ContextError> {
        self.beans()?
            .get(id)
            .map(|bean| bean.instance.clone())
            .ok_or_else(|| ContextError::NotFound { id: id.to_string() })
    }

    /// Retrieve a bean by identifier, checking that it has exactly the requested type
    pub fn get_bean_as<T: Send + Sync + 'static>(&self, id: &str) -> Result<Shared<T>, ContextError> {
        let instance = self.get_bean(id)?;
        instance
            .downcast::<T>()
            .ok_or_else(|| ContextError::TypeMismatch {
                id: id.to_string(),
                expected: std::any::type_name::<T>(),
                actual: instance.type_name(),
            })
    }

    /// Create a new instance of a registered type.
    ///
    /// This is not a lookup: the instance is fresh on every call, no property is injected,
    /// and the bean graph is neither read nor modified. It works before [ApplicationContext::start].
    pub fn new_instance<T: Send + Sync + 'static>(&self) -> Result<T, ContextError> {
        let type_name = std::any::type_name::<T>();
        self.types
            .descriptor::<T>()
            .ok_or(ContextError::TypeNotRegistered { type_name })?
            .create()
            .map_err(|source| ContextError::Instantiation { type_name, source })
    }

    pub fn contains_bean(&self, id: &str) -> Result<bool, ContextError> {
        Ok(self.beans()?.contains(id))
    }

    /// Identifiers of all beans, in no particular order
    pub fn bean_ids(&self) -> Result<Vec<&str>, ContextError> {
        Ok(self.beans()?.ids().collect())
    }
}
