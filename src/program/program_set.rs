use glam::{Mat4, Vec3, Vec4};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::defines::ShaderDefines;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 2] = [ShaderStage::Vertex, ShaderStage::Fragment];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }

    /// Prefix of generated program names.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VS",
            ShaderStage::Fragment => "FS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Int,
    Vec3,
    Vec4,
    Mat4,
    Sampler2D,
}

impl UniformType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UniformType::Float => "float",
            UniformType::Int => "int",
            UniformType::Vec3 => "vec3",
            UniformType::Vec4 => "vec4",
            UniformType::Mat4 => "mat4",
            UniformType::Sampler2D => "sampler2D",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformParameter {
    pub name: String,
    pub ty: UniformType,
}

/// One call inside the generated entry point, ordered by `order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInvocation {
    pub order: i32,
    pub function: String,
    pub args: SmallVec<[String; 4]>,
}

/// Stage program under construction. Sub-render-states append uniforms,
/// library dependencies and entry-point invocations to it.
#[derive(Debug, Clone)]
pub struct Program {
    stage: ShaderStage,
    pub defines: ShaderDefines,
    uniforms: Vec<UniformParameter>,
    dependencies: Vec<String>,
    invocations: Vec<FunctionInvocation>,
}

impl Program {
    #[must_use]
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            defines: ShaderDefines::new(),
            uniforms: Vec::new(),
            dependencies: Vec::new(),
            invocations: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Declares a uniform; redeclaring an existing name is a no-op.
    pub fn add_uniform(&mut self, name: &str, ty: UniformType) {
        if self.uniforms.iter().any(|u| u.name == name) {
            return;
        }
        self.uniforms.push(UniformParameter {
            name: name.to_string(),
            ty,
        });
    }

    pub fn add_dependency(&mut self, library: &str) {
        if !self.dependencies.iter().any(|d| d == library) {
            self.dependencies.push(library.to_string());
        }
    }

    pub fn add_invocation(&mut self, order: i32, function: &str, args: &[&str]) {
        self.invocations.push(FunctionInvocation {
            order,
            function: function.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        });
    }

    #[must_use]
    pub fn uniforms(&self) -> &[UniformParameter] {
        &self.uniforms
    }

    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Invocations sorted by order; equal orders keep insertion order.
    #[must_use]
    pub fn sorted_invocations(&self) -> Vec<&FunctionInvocation> {
        let mut calls: Vec<_> = self.invocations.iter().collect();
        calls.sort_by_key(|c| c.order);
        calls
    }

    #[must_use]
    pub fn invocation_count(&self) -> usize {
        self.invocations.len()
    }
}

/// The vertex/fragment pair generated for one pass.
#[derive(Debug, Clone)]
pub struct ProgramSet {
    pub vertex: Program,
    pub fragment: Program,
}

impl Default for ProgramSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramSet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertex: Program::new(ShaderStage::Vertex),
            fragment: Program::new(ShaderStage::Fragment),
        }
    }

    #[must_use]
    pub fn program(&self, stage: ShaderStage) -> &Program {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    pub fn program_mut(&mut self, stage: ShaderStage) -> &mut Program {
        match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Fragment => &mut self.fragment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Int(i32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

/// Named parameter values written per draw and pushed to the backend.
#[derive(Debug, Clone, Default)]
pub struct ProgramParameters {
    values: FxHashMap<String, ParamValue>,
}

impl ProgramParameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: ParamValue) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        } else {
            self.values.insert(name.to_string(), value);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocations_sort_stably() {
        let mut program = Program::new(ShaderStage::Vertex);
        program.add_invocation(300, "light", &[]);
        program.add_invocation(100, "transform", &["iPos", "oPos"]);
        program.add_invocation(300, "light_specular", &[]);

        let names: Vec<_> = program
            .sorted_invocations()
            .iter()
            .map(|c| c.function.as_str())
            .collect();
        assert_eq!(names, ["transform", "light", "light_specular"]);
    }

    #[test]
    fn uniforms_and_dependencies_deduplicate() {
        let mut program = Program::new(ShaderStage::Fragment);
        program.add_uniform("fogParams", UniformType::Vec4);
        program.add_uniform("fogParams", UniformType::Vec4);
        program.add_dependency("FFPLib_Fog");
        program.add_dependency("FFPLib_Fog");
        assert_eq!(program.uniforms().len(), 1);
        assert_eq!(program.dependencies().len(), 1);
    }
}
