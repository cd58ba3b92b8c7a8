//! Sub-render-state contract.
//!
//! A sub-render-state is one composable shader feature (transform, lighting,
//! fog, ...). Templates live in a [`RenderState`](super::RenderState); the
//! resolved per-pass instances live in a
//! [`TargetRenderState`](super::TargetRenderState). Instances are always
//! created through a [`SubRenderStateFactory`] so that polymorphic copies go
//! through the owning factory rather than a bitwise copy.

use std::any::Any;
use std::fmt::Debug;

use glam::IVec3;

use crate::errors::Result;
use crate::material::Pass;
use crate::program::{ProgramParameters, ProgramSet};
use crate::scene::{FogMode, Light, Renderable};
use crate::script::{PropertyNode, ScriptContext};

/// Execution order slots of the fixed-function pipeline stages.
///
/// Sub-render-states are sorted by these values inside a target render state
/// and emit their invocations with them, so custom features slot between or
/// replace the fixed-function stages.
pub mod execution_order {
    pub const TRANSFORM: i32 = 100;
    pub const COLOUR: i32 = 200;
    pub const LIGHTING: i32 = 300;
    pub const TEXTURING: i32 = 400;
    pub const FOG: i32 = 500;
    pub const ALPHA_TEST: i32 = 1000;
    pub const POST_PROCESS: i32 = 2000;

    pub const FIXED_FUNCTION: [i32; 6] = [TRANSFORM, COLOUR, LIGHTING, TEXTURING, FOG, ALPHA_TEST];

    /// `true` when `order` is one of the fixed-function stage slots.
    #[must_use]
    pub fn is_fixed_function(order: i32) -> bool {
        FIXED_FUNCTION.contains(&order)
    }
}

/// Pass data handed to an instance when it is linked into a target.
#[derive(Debug, Clone, Copy)]
pub struct LinkContext<'a> {
    pub src_pass: &'a Pass,
    pub dst_pass: &'a Pass,
    pub light_count: IVec3,
    /// Scene fog the pass is rendered with, before pass overrides.
    pub fog_mode: FogMode,
}

/// Per-draw inputs for parameter updates.
pub struct ParameterUpdate<'a> {
    pub renderable: &'a dyn Renderable,
    pub pass: &'a Pass,
    pub lights: &'a [Light],
    pub params: &'a mut ProgramParameters,
}

pub trait SubRenderState: Send + Sync + Debug + Any {
    /// Type name shared with the factory that creates this state.
    fn type_name(&self) -> &'static str;

    fn execution_order(&self) -> i32;

    fn clone_box(&self) -> Box<dyn SubRenderState>;

    /// Copy-assigns the parameters of `other`. Returns `false` when `other`
    /// has a different concrete type.
    fn copy_from(&mut self, other: &dyn SubRenderState) -> bool;

    /// Adapts the instance to the concrete pass it is linked into.
    ///
    /// Returning `false` drops the instance from the target.
    fn pre_add_to_render_state(&mut self, _ctx: &LinkContext<'_>) -> bool {
        true
    }

    /// Appends this feature's uniforms, libraries and invocations.
    fn create_cpu_sub_programs(&self, programs: &mut ProgramSet) -> bool;

    /// Writes this feature's per-draw parameter values.
    fn update_gpu_params(&self, _update: &mut ParameterUpdate<'_>) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Creates, copies and destroys the instances of one sub-render-state type.
pub trait SubRenderStateFactory: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn create_instance(&self) -> Box<dyn SubRenderState>;

    /// Builds an instance from a declarative property.
    ///
    /// `Ok(None)` means the property is not handled by this factory; an error
    /// means it is but its arguments are malformed.
    fn create_from_property(
        &self,
        _property: &PropertyNode,
        _ctx: &ScriptContext<'_>,
    ) -> Result<Option<Box<dyn SubRenderState>>> {
        Ok(None)
    }

    /// Creates a fresh instance and copy-assigns `src` into it.
    fn duplicate_instance(&self, src: &dyn SubRenderState) -> Box<dyn SubRenderState> {
        let mut instance = self.create_instance();
        if instance.copy_from(src) {
            instance
        } else {
            log::warn!(
                "Factory '{}' cannot copy a '{}' instance; cloning it directly",
                self.type_name(),
                src.type_name()
            );
            src.clone_box()
        }
    }

    fn destroy_instance(&self, instance: Box<dyn SubRenderState>) {
        drop(instance);
    }
}

/// Implements the `Clone`-based parts of [`SubRenderState`]:
/// `clone_box`, `copy_from`, `as_any` and `as_any_mut`.
#[macro_export]
macro_rules! impl_sub_render_state_boilerplate {
    () => {
        fn clone_box(&self) -> Box<dyn $crate::render_state::SubRenderState> {
            Box::new(self.clone())
        }

        fn copy_from(&mut self, other: &dyn $crate::render_state::SubRenderState) -> bool {
            match other.as_any().downcast_ref::<Self>() {
                Some(other) => {
                    self.clone_from(other);
                    true
                }
                None => false,
            }
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }
    };
}

impl dyn SubRenderState {
    /// Downcasts to a concrete sub-render-state type.
    #[must_use]
    pub fn downcast_ref<T: SubRenderState>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: SubRenderState>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}
