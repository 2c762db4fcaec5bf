//! Deterministic prompt construction from an assembled bundle.
//!
//! The section order is fixed: instructions, spec excerpts, acceptance
//! criteria, file list, recent history, completion-signal instructions.
//! The same bundle always renders to the same prompt.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::types::ContextBundle;

const IMPLEMENTER_TEMPLATE: &str = include_str!("prompts/implementer.md");

/// Template engine wrapper around minijinja.
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("implementer", IMPLEMENTER_TEMPLATE)
            .expect("implementer template should be valid");
        Self { env }
    }

    /// Render the implementer prompt for one iteration.
    pub fn build(
        &self,
        bundle: &ContextBundle,
        iteration: u32,
        complete_marker: &str,
    ) -> Result<String> {
        let template = self
            .env
            .get_template("implementer")
            .context("load implementer template")?;
        let rendered = template
            .render(context! {
                task_id => &bundle.task_id,
                iteration => iteration,
                spec_sections => &bundle.spec_sections,
                acceptance_criteria => &bundle.acceptance_criteria,
                files_to_modify => &bundle.files_to_modify,
                recent_history => &bundle.recent_history,
                complete_marker => complete_marker,
            })
            .context("render implementer prompt")?;
        Ok(rendered)
    }
}
