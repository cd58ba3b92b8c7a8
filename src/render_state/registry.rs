use std::sync::Arc;

use super::sub_render_state::{SubRenderState, SubRenderStateFactory};
use crate::errors::{Result, ShaderGenError};
use crate::script::{PropertyNode, ScriptContext};

/// Sub-render-state factories, one per type name.
///
/// Factories are kept in registration order. Declarative properties are
/// offered to the factories in exactly that order and the first factory
/// that produces an instance wins, so the order in which factories are
/// added is part of the configuration contract.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: Vec<Arc<dyn SubRenderStateFactory>>,
}

impl FactoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, factory: Arc<dyn SubRenderStateFactory>) -> Result<()> {
        let type_name = factory.type_name();
        if self.get(type_name).is_some() {
            return Err(ShaderGenError::DuplicateFactory(type_name.to_string()));
        }
        log::debug!("Registered sub-render-state factory '{type_name}'");
        self.factories.push(factory);
        Ok(())
    }

    /// Removes the factory registered for `type_name`; absent types are ignored.
    pub fn remove(&mut self, type_name: &str) -> Option<Arc<dyn SubRenderStateFactory>> {
        let index = self
            .factories
            .iter()
            .position(|f| f.type_name() == type_name)?;
        Some(self.factories.remove(index))
    }

    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&Arc<dyn SubRenderStateFactory>> {
        self.factories.iter().find(|f| f.type_name() == type_name)
    }

    pub fn get_at(&self, index: usize) -> Result<&Arc<dyn SubRenderStateFactory>> {
        self.factories
            .get(index)
            .ok_or(ShaderGenError::FactoryIndexOutOfRange {
                index,
                count: self.factories.len(),
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SubRenderStateFactory>> {
        self.factories.iter()
    }

    pub fn clear(&mut self) {
        self.factories.clear();
    }

    pub fn create(&self, type_name: &str) -> Result<Box<dyn SubRenderState>> {
        self.get(type_name)
            .map(|f| f.create_instance())
            .ok_or_else(|| ShaderGenError::FactoryNotFound(type_name.to_string()))
    }

    /// Offers `property` to every factory in registration order.
    pub fn create_from_property(
        &self,
        property: &PropertyNode,
        ctx: &ScriptContext<'_>,
    ) -> Result<Option<Box<dyn SubRenderState>>> {
        for factory in &self.factories {
            if let Some(instance) = factory.create_from_property(property, ctx)? {
                return Ok(Some(instance));
            }
        }
        Ok(None)
    }

    /// Returns an instance to its factory. Instances of unknown types are
    /// simply dropped.
    pub fn destroy(&self, instance: Box<dyn SubRenderState>) {
        match self.get(instance.type_name()) {
            Some(factory) => factory.destroy_instance(instance),
            None => drop(instance),
        }
    }

    /// Deep-copies `src` through the factory of its type.
    pub fn duplicate(&self, src: &dyn SubRenderState) -> Result<Box<dyn SubRenderState>> {
        self.get(src.type_name())
            .map(|f| f.duplicate_instance(src))
            .ok_or_else(|| ShaderGenError::FactoryNotFound(src.type_name().to_string()))
    }
}
