//! Template rendering with evaluated TDD data as the variables.
use crate::error::{Error, Result};
use crate::value::Hash;
use minijinja::Environment;

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given variables.
    ///
    /// # Arguments
    /// * `template` - Template string to render
    /// * `data` - Evaluated TDD hash, its keys become the template variables
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, template: &str, data: &Hash) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a new MiniJinjaRenderer instance with default environment.
    pub fn new() -> Self {
        let env = Environment::new();
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders a template string using MiniJinja.
    ///
    /// # Errors
    /// * `Error::MinijinjaError` if the template doesn't parse or fails to render
    fn render(&self, template: &str, data: &Hash) -> Result<String> {
        let mut env = self.env.clone();
        env.add_template("data", template).map_err(Error::MinijinjaError)?;

        let tmpl = env.get_template("data").map_err(Error::MinijinjaError)?;

        tmpl.render(data).map_err(Error::MinijinjaError)
    }
}
