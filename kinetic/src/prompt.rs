//! Layered prompt rendering for the execution step.
//!
//! The base layer carries stable policy instructions, the task layer carries
//! per-request instructions, and an optional context block lists key/value
//! pairs sorted by key so output never depends on insertion order.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const LAYERED_TEMPLATE: &str = include_str!("prompts/layered.txt");

/// Inputs for one rendered prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptEnvelope {
    pub base_prompt: String,
    pub task_prompt: String,
    #[serde(default)]
    pub context: BTreeMap<String, Value>,
}

impl PromptEnvelope {
    pub fn new(base_prompt: impl Into<String>, task_prompt: impl Into<String>) -> Self {
        Self {
            base_prompt: base_prompt.into(),
            task_prompt: task_prompt.into(),
            context: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Render the envelope. Pure: the same envelope always yields the same text.
///
/// String context values are printed bare; any other JSON value is printed in
/// its compact JSON form.
pub fn build_prompt(envelope: &PromptEnvelope) -> Result<String> {
    let context_lines: BTreeMap<&str, String> = envelope
        .context
        .iter()
        .map(|(key, value)| (key.as_str(), render_value(value)))
        .collect();

    let env = Environment::new();
    let template = env
        .template_from_str(LAYERED_TEMPLATE)
        .context("compile layered prompt template")?;
    template
        .render(context! {
            base_prompt => envelope.base_prompt.as_str(),
            task_prompt => envelope.task_prompt.as_str(),
            context => context_lines,
        })
        .context("render layered prompt")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
