//! Declarative Configuration
//!
//! Material scripts can carry an `rtshader_system` block inside a pass (or a
//! texture unit) that configures the generated technique:
//!
//! ```text
//! pass
//! {
//!     rtshader_system ForwardPlus
//!     {
//!         light_count 0 2 0
//!         lighting_stage per_pixel
//!         fog_stage ffp per_pixel
//!     }
//! }
//! ```
//!
//! The host parses its script format into [`ObjectNode`]s and hands each one
//! to the [`ScriptTranslator`] returned by
//! [`ShaderGenerator::get_translator`]. The translator creates the
//! shader-based technique for the block's scheme, then offers every property
//! to the registered factories in registration order.
//!
//! [`ShaderGenerator::get_translator`]: crate::generator::ShaderGenerator::get_translator

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Weak;

use glam::IVec3;

use crate::errors::{Result, ShaderGenError};
use crate::generator::{DEFAULT_SCHEME_NAME, ShaderGenerator};
use crate::material::Pass;
use crate::render_state::RenderState;

/// Keyword of the object blocks handled by the shader generator.
pub const RTSHADER_SYSTEM_KEYWORD: &str = "rtshader_system";

/// A single `name value value ...` line of a script block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNode {
    pub name: String,
    pub values: Vec<String>,
}

impl PropertyNode {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Splits a whitespace-separated line into a property.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next()?;
        Some(Self::new(name, tokens))
    }

    #[must_use]
    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Parses the value at `index`, failing if it is missing or malformed.
    pub fn parse_value<T>(&self, index: usize) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self
            .value(index)
            .ok_or_else(|| self.invalid(format!("missing argument {}", index + 1)))?;
        raw.parse::<T>()
            .map_err(|e| self.invalid(format!("argument {} '{raw}': {e}", index + 1)))
    }

    /// Builds an [`ShaderGenError::InvalidProperty`] for this property.
    pub fn invalid(&self, reason: impl Into<String>) -> ShaderGenError {
        ShaderGenError::InvalidProperty {
            property: self.name.clone(),
            reason: reason.into(),
        }
    }
}

/// A `keyword [name] { properties }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNode {
    pub keyword: String,
    pub name: Option<String>,
    pub properties: Vec<PropertyNode>,
}

impl ObjectNode {
    pub fn new(keyword: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            keyword: keyword.into(),
            name: name.map(str::to_string),
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, property: PropertyNode) -> Self {
        self.properties.push(property);
        self
    }
}

/// Where in the material the block was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptScope {
    Pass { pass_index: usize },
    TextureUnit { pass_index: usize, texture_unit: usize },
}

impl ScriptScope {
    #[must_use]
    pub fn pass_index(self) -> usize {
        match self {
            ScriptScope::Pass { pass_index } | ScriptScope::TextureUnit { pass_index, .. } => {
                pass_index
            }
        }
    }
}

/// What a factory sees while interpreting a property.
pub struct ScriptContext<'a> {
    pub scope: ScriptScope,
    /// The source pass the block belongs to, if it still exists.
    pub pass: Option<&'a Pass>,
    /// The pass's custom render state as configured so far.
    pub render_state: &'a RenderState,
}

/// The material pass a script block applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationTarget {
    pub material: String,
    pub group: String,
    /// Scheme of the source technique.
    pub src_scheme: String,
    pub scope: ScriptScope,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationOutcome {
    /// Scheme the generated technique was registered under.
    pub dst_scheme: String,
    /// Properties turned into sub-render-states or settings.
    pub applied: Vec<String>,
    /// Properties no factory recognised.
    pub unhandled: Vec<String>,
}

/// Applies `rtshader_system` blocks to a shader generator.
#[derive(Debug, Clone)]
pub struct ScriptTranslator {
    generator: Weak<ShaderGenerator>,
}

impl ScriptTranslator {
    pub(crate) fn new(generator: Weak<ShaderGenerator>) -> Self {
        Self { generator }
    }

    pub fn translate(&self, node: &ObjectNode, target: &TranslationTarget) -> Result<TranslationOutcome> {
        let generator = self
            .generator
            .upgrade()
            .ok_or(ShaderGenError::GeneratorDestroyed)?;

        let dst_scheme = node.name.as_deref().unwrap_or(DEFAULT_SCHEME_NAME);
        let created = generator.create_shader_based_technique(
            &target.material,
            &target.group,
            &target.src_scheme,
            dst_scheme,
            generator.create_shader_over_programmable_pass(),
        );
        if !created {
            return Err(ShaderGenError::InvalidProperty {
                property: node.keyword.clone(),
                reason: format!(
                    "can not create shader based technique for material '{}' in scheme '{dst_scheme}'",
                    target.material
                ),
            });
        }

        let mut outcome = TranslationOutcome {
            dst_scheme: dst_scheme.to_string(),
            ..Default::default()
        };
        let applied = generator.configure_pass_render_state(
            dst_scheme,
            &target.material,
            &target.group,
            target.scope.pass_index(),
            |render_state, registry, pass| -> Result<()> {
                for property in &node.properties {
                    if property.name == "light_count" {
                        let count = IVec3::new(
                            property.parse_value(0)?,
                            property.parse_value(1)?,
                            property.parse_value(2)?,
                        );
                        render_state.set_light_count(count);
                        outcome.applied.push(property.name.clone());
                        continue;
                    }

                    let ctx = ScriptContext {
                        scope: target.scope,
                        pass,
                        render_state: &*render_state,
                    };
                    match registry.create_from_property(property, &ctx)? {
                        Some(state) => {
                            if let Some(replaced) = render_state.add_template(state) {
                                registry.destroy(replaced);
                            }
                            outcome.applied.push(property.name.clone());
                        }
                        None => {
                            log::warn!(
                                "Unhandled {} property '{}' in material '{}'",
                                RTSHADER_SYSTEM_KEYWORD,
                                property.name,
                                target.material
                            );
                            outcome.unhandled.push(property.name.clone());
                        }
                    }
                }
                Ok(())
            },
        )?;
        if let Some(result) = applied {
            result?;
        }

        generator.invalidate_material(dst_scheme, &target.material, &target.group);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn parses_property_lines() {
        let property = PropertyNode::parse("  hardware_skinning 24 2 linear ").unwrap();
        assert_eq!(property.name, "hardware_skinning");
        assert_eq!(property.value(0), Some("24"));
        assert_eq!(property.parse_value::<u16>(1).unwrap(), 2);
        assert_eq!(property.value(3), None);
        assert!(PropertyNode::parse("   ").is_none());
    }

    #[test]
    fn malformed_values_are_script_errors() {
        let property = PropertyNode::new("light_count", ["1", "x"]);
        let err = property.parse_value::<i32>(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Script);
        assert!(err.to_string().contains("light_count"));

        let err = property.parse_value::<i32>(2).unwrap_err();
        assert!(err.to_string().contains("missing argument 3"));
    }

    #[test]
    fn scope_exposes_pass_index() {
        assert_eq!(ScriptScope::Pass { pass_index: 2 }.pass_index(), 2);
        assert_eq!(
            ScriptScope::TextureUnit {
                pass_index: 1,
                texture_unit: 3
            }
            .pass_index(),
            1
        );
    }

    #[test]
    fn dropped_generator_is_reported() {
        let translator = ScriptTranslator::new(Weak::new());
        let node = ObjectNode::new(RTSHADER_SYSTEM_KEYWORD, None);
        let target = TranslationTarget {
            material: "m".into(),
            group: "General".into(),
            src_scheme: String::new(),
            scope: ScriptScope::Pass { pass_index: 0 },
        };
        let err = translator.translate(&node, &target).unwrap_err();
        assert!(matches!(err, ShaderGenError::GeneratorDestroyed));
    }
}
