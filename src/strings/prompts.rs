//! # Prompts
//!
//! Model-facing text: the grounding system message and the file context block.

/// A builder for rendering prompt templates with `{{KEY}}` placeholders.
pub struct PromptRenderer<'a> {
    template: &'a str,
    replacements: Vec<(&'a str, String)>,
}

impl<'a> PromptRenderer<'a> {
    pub fn new(template: &'a str) -> Self {
        Self {
            template,
            replacements: Vec::new(),
        }
    }

    pub fn set(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.replacements.push((key, value.into()));
        self
    }

    pub fn render(self) -> String {
        // Checked against the template, not the output: substituted file bodies may contain braces.
        let mut rest = self.template;
        while let Some(start) = rest.find("{{") {
            let Some(end) = rest[start..].find("}}") else { break };
            let placeholder = &rest[start..start + end + 2];
            if !self.replacements.iter().any(|(key, _)| *key == placeholder) {
                tracing::error!("Unreplaced placeholder in prompt template: {}", placeholder);
            }
            rest = &rest[start + end + 2..];
        }

        let mut result = self.template.to_string();
        for (key, value) in self.replacements {
            result = result.replace(key, &value);
        }
        result
    }
}

pub const FILE_CONTEXT_TEMPLATE: &str = include_str!("../../prompts/file_context.md");

pub const NO_FILES_IN_CONTEXT: &str = "No files available in context.";

pub fn file_section(path: &str, content: &str) -> String {
    format!("File: {path}\n```\n{content}\n```")
}

pub fn missing_file_section(path: &str) -> String {
    format!("File: {path} (does not exist)")
}

pub fn available_files(sections: &str) -> String {
    format!("Available Files:\n\n{sections}")
}

/// System message prepended to a turn that looks file-related.
pub fn file_context_system(formatted_files: &str) -> String {
    PromptRenderer::new(FILE_CONTEXT_TEMPLATE)
        .set("{{FILES}}", formatted_files)
        .render()
        .trim_end()
        .to_string()
}
