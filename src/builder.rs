//! Construction of the bean graph.
//!
//! A build runs three phases, each over the full list of declarations:
//!
//! 1. every bean is instantiated and stored in the [BeanRegistry];
//! 2. literal properties are injected, coerced to the setter type when it is primitive;
//! 3. reference properties are injected with the target bean from the registry.
//!
//! Since all beans exist before the first reference is resolved, declarations can refer
//! to each other in any order, including cycles. Any error aborts the build and the
//! partially filled registry is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use crate::coerce::{coerce, CoercionError, Value};
use crate::config::{ContainerConfig, DuplicateIdPolicy, MissingSetterPolicy};
use crate::definition::BeanDefinition;
use crate::registry::{Bean, BeanRegistry};
use crate::types::{setter_name, BeanType, FactoryError, InvocationError, SetterKind, TypeRegistry};

/// Fatal errors raised while building the bean graph
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Bean `{id}`: unknown type `{type_name}`")]
    TypeResolution { id: String, type_name: String },
    #[error("Bean `{id}`: cannot instantiate `{type_name}`: {source}")]
    Instantiation {
        id: String,
        type_name: String,
        source: FactoryError,
    },
    #[error("Bean `{id}`, property `{property}`: {source}")]
    PropertyCoercion {
        id: String,
        property: String,
        source: CoercionError,
    },
    #[error("Bean `{id}`, property `{property}`: {source}")]
    Invocation {
        id: String,
        property: String,
        source: InvocationError,
    },
    #[error("Bean `{id}`, property `{property}`: no bean named `{reference}`")]
    UnresolvedReference {
        id: String,
        property: String,
        reference: String,
    },
    #[error("Bean `{id}`: no setter `{setter}` for property `{property}`")]
    MissingSetter {
        id: String,
        property: String,
        setter: String,
    },
    #[error("Bean `{id}` is declared more than once")]
    DuplicateBean { id: String },
}

/// Turn a list of declarations into a wired [BeanRegistry]
pub struct GraphBuilder<'a> {
    types: &'a TypeRegistry,
    config: ContainerConfig,
}

/// Type of each instantiated bean, keyed like the registry
type BeanTypes = HashMap<String, Arc<dyn BeanType>>;

impl<'a> GraphBuilder<'a> {
    pub fn new(types: &'a TypeRegistry, config: ContainerConfig) -> Self {
        Self { types, config }
    }

    /// Run the three phases. The registry is only returned if all of them succeed.
    pub fn build(&self, definitions: &[BeanDefinition]) -> Result<BeanRegistry, BuildError> {
        let span = info_span!("build", declarations = definitions.len());
        let _guard = span.enter();

        let mut registry = BeanRegistry::new();
        let bean_types = self.instantiate(definitions, &mut registry)?;
        self.inject_values(definitions, &registry, &bean_types)?;
        self.inject_references(definitions, &registry, &bean_types)?;

        info!(beans = registry.len(), "bean graph ready");
        Ok(registry)
    }

    fn instantiate(
        &self,
        definitions: &[BeanDefinition],
        registry: &mut BeanRegistry,
    ) -> Result<BeanTypes, BuildError> {
        debug!("instantiating beans");
        let mut bean_types = BeanTypes::new();
        for def in definitions {
            let bean_type = self
                .types
                .get(&def.type_name)
                .ok_or_else(|| BuildError::TypeResolution {
                    id: def.id.clone(),
                    type_name: def.type_name.clone(),
                })?;

            if registry.contains(&def.id) {
                match self.config.duplicate_ids {
                    DuplicateIdPolicy::Reject => {
                        return Err(BuildError::DuplicateBean { id: def.id.clone() })
                    }
                    DuplicateIdPolicy::Overwrite => {
                        warn!(bean = %def.id, "bean declared more than once, the last declaration wins")
                    }
                }
            }

            let instance = bean_type
                .instantiate()
                .map_err(|source| BuildError::Instantiation {
                    id: def.id.clone(),
                    type_name: def.type_name.clone(),
                    source,
                })?;
            debug!(bean = %def.id, type_name = %def.type_name, "instantiated");

            registry.insert(Bean {
                id: def.id.clone(),
                instance,
            });
            bean_types.insert(def.id.clone(), bean_type.clone());
        }
        Ok(bean_types)
    }

    fn inject_values(
        &self,
        definitions: &[BeanDefinition],
        registry: &BeanRegistry,
        bean_types: &BeanTypes,
    ) -> Result<(), BuildError> {
        debug!("injecting literal properties");
        for def in definitions {
            let (bean, bean_type) = instantiated(def, registry, bean_types);
            for (property, literal) in &def.properties {
                let Some(kind) = bean_type.setter(property) else {
                    self.skip_property(def, property)?;
                    continue;
                };
                let value = match kind {
                    SetterKind::Value(tag) if tag.is_primitive() => {
                        coerce(literal, tag).map_err(|source| BuildError::PropertyCoercion {
                            id: def.id.clone(),
                            property: property.clone(),
                            source,
                        })?
                    }
                    _ => Value::Text(literal.clone()),
                };
                debug!(bean = %def.id, property = %property, value = ?value, "injecting value");
                bean_type
                    .inject_value(&bean.instance, property, value)
                    .map_err(|source| BuildError::Invocation {
                        id: def.id.clone(),
                        property: property.clone(),
                        source,
                    })?;
            }
        }
        Ok(())
    }

    fn inject_references(
        &self,
        definitions: &[BeanDefinition],
        registry: &BeanRegistry,
        bean_types: &BeanTypes,
    ) -> Result<(), BuildError> {
        debug!("injecting references");
        for def in definitions {
            let (bean, bean_type) = instantiated(def, registry, bean_types);
            for (property, reference) in &def.references {
                let target = registry
                    .get(reference)
                    .ok_or_else(|| BuildError::UnresolvedReference {
                        id: def.id.clone(),
                        property: property.clone(),
                        reference: reference.clone(),
                    })?;
                if bean_type.setter(property).is_none() {
                    self.skip_property(def, property)?;
                    continue;
                }
                debug!(bean = %def.id, property = %property, target = %reference, "injecting reference");
                bean_type
                    .inject_reference(&bean.instance, property, &target.instance)
                    .map_err(|source| BuildError::Invocation {
                        id: def.id.clone(),
                        property: property.clone(),
                        source,
                    })?;
            }
        }
        Ok(())
    }

    fn skip_property(&self, def: &BeanDefinition, property: &str) -> Result<(), BuildError> {
        let setter = setter_name(property);
        match self.config.missing_setter {
            MissingSetterPolicy::Error => Err(BuildError::MissingSetter {
                id: def.id.clone(),
                property: property.to_string(),
                setter,
            }),
            MissingSetterPolicy::Warn => {
                warn!(bean = %def.id, property, setter = %setter, "no setter for property, skipped");
                Ok(())
            }
        }
    }
}

/// Bean created for a declaration during the first phase, with the type wiring it.
///
/// With duplicate identifiers, this is the bean of the last declaration using the same id.
fn instantiated<'r>(
    def: &BeanDefinition,
    registry: &'r BeanRegistry,
    bean_types: &'r BeanTypes,
) -> (&'r Bean, &'r Arc<dyn BeanType>) {
    let (Some(bean), Some(bean_type)) = (registry.get(&def.id), bean_types.get(&def.id)) else {
        unreachable!("bean `{}` was not instantiated before injection", def.id);
    };
    (bean, bean_type)
}
