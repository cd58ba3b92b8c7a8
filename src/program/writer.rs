//! Program Source Writer
//!
//! Renders a [`Program`] into source text with a minijinja template. The
//! output is what the [`ProgramManager`](super::ProgramManager) hashes, so
//! rendering must be deterministic for equal programs.

use std::sync::OnceLock;

use minijinja::{Environment, context, syntax::SyntaxConfig};
use serde::Serialize;

use super::program_set::Program;
use crate::errors::Result;

const PROGRAM_TEMPLATE: &str = "program";

static PROGRAM_ENV: OnceLock<Environment<'static>> = OnceLock::new();

fn get_env() -> &'static Environment<'static> {
    PROGRAM_ENV.get_or_init(|| {
        let mut env = Environment::new();

        let syntax = SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .build()
            .expect("Failed to configure Jinja2 syntax");

        env.set_syntax(syntax);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);

        env.add_template(PROGRAM_TEMPLATE, include_str!("templates/program.jinja"))
            .expect("Failed to parse program template");

        env
    })
}

#[derive(Serialize)]
struct DefineView<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct UniformView<'a> {
    name: &'a str,
    ty: &'static str,
}

#[derive(Serialize)]
struct InvocationView<'a> {
    order: i32,
    function: &'a str,
    args: &'a [String],
}

/// Renders `program` for `language` and the given target profiles.
pub fn render_program(program: &Program, language: &str, profiles: &[String]) -> Result<String> {
    let defines: Vec<_> = program
        .defines
        .iter()
        .map(|(name, value)| DefineView { name, value })
        .collect();
    let uniforms: Vec<_> = program
        .uniforms()
        .iter()
        .map(|u| UniformView {
            name: &u.name,
            ty: u.ty.as_str(),
        })
        .collect();
    let invocations: Vec<_> = program
        .sorted_invocations()
        .into_iter()
        .map(|c| InvocationView {
            order: c.order,
            function: &c.function,
            args: &c.args,
        })
        .collect();

    let template = get_env().get_template(PROGRAM_TEMPLATE)?;
    let source = template.render(context! {
        stage => program.stage().as_str(),
        language => language,
        profiles => profiles,
        defines => defines,
        dependencies => program.dependencies(),
        uniforms => uniforms,
        invocations => invocations,
    })?;
    Ok(source)
}
