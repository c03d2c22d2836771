// src/core/report/text.rs
use std::path::Path;

use tera::{Context, Tera};

use crate::error::Result;
use super::{ChainReport, ListReport};

/// Built-in layout for caller chain reports
pub const DEFAULT_CHAIN_TEMPLATE: &str = r#"Caller chains for {{ target }} ({{ chains | length }} found)
{% for chain in chains %}
=== Complete Caller Chain ===
{% for method in chain.methods -%}
--- {{ method.signature }} ---
{% if method.probable_implementations -%}
// PROBABLE IMPLEMENTATION CALLS:
{% for related in method.probable_implementations -%}
//   {{ related }}
{% endfor -%}
{% endif -%}
// {{ method.location }}
{% if method.comments -%}
{{ method.comments }}
{% endif -%}
{% if method.source -%}
{{ method.source }}
{% endif %}
{% endfor -%}
{% endfor -%}
{% if truncated %}
// WARNING: visit budget exhausted, the chains above are incomplete
{% endif -%}
"#;

/// Renders plain-text reports
pub struct TextRenderer {
    template: String,
}

impl TextRenderer {
    /// Use the template at `template_path`, or the built-in one
    pub fn new(template_path: Option<&Path>) -> Result<Self> {
        let template = match template_path {
            Some(path) => std::fs::read_to_string(path)?,
            None => DEFAULT_CHAIN_TEMPLATE.to_string(),
        };
        Ok(Self { template })
    }

    pub fn render_chains(&self, report: &ChainReport) -> Result<String> {
        let context = Context::from_serialize(report)?;
        Ok(Tera::one_off(&self.template, &context, false)?)
    }

    /// One signature per line, with its declaration site when known
    pub fn render_list(&self, report: &ListReport) -> String {
        let mut out = String::new();
        for entry in &report.methods {
            out.push_str(&entry.signature);
            if let (Some(file), Some(line)) = (&entry.file, entry.line) {
                out.push_str(&format!(" ({}:{})", file, line));
            }
            out.push('\n');
        }
        out
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            template: DEFAULT_CHAIN_TEMPLATE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::assembler::{ChainBlock, ListEntry, MethodEntry};

    fn entry(signature: &str, related: &[&str]) -> MethodEntry {
        MethodEntry {
            signature: signature.to_string(),
            name: signature.to_string(),
            location: "src/App.java:3-5".to_string(),
            file: Some("src/App.java".to_string()),
            line_range: Some((3, 5)),
            source: Some(format!("void {}() {{ }}", signature)),
            comments: None,
            probable_implementations: related.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_template_layout() {
        let report = ChainReport {
            target: "p.Impl.run()".to_string(),
            truncated: false,
            chains: vec![ChainBlock {
                methods: vec![entry("p.App.main()", &[]), entry("p.Impl.run()", &["p.Api.run()"])],
            }],
        };

        let text = TextRenderer::default().render_chains(&report).unwrap();
        assert!(text.starts_with("Caller chains for p.Impl.run() (1 found)"));
        assert!(text.contains("=== Complete Caller Chain ==="));
        assert!(text.contains("--- p.App.main() ---"));
        assert!(text.contains("// PROBABLE IMPLEMENTATION CALLS:\n//   p.Api.run()"));
        assert!(text.contains("// src/App.java:3-5"));
        assert!(!text.contains("WARNING"));

        let main_at = text.find("--- p.App.main() ---").unwrap();
        let target_at = text.find("--- p.Impl.run() ---").unwrap();
        assert!(main_at < target_at);
    }

    #[test]
    fn test_truncation_warning() {
        let report = ChainReport {
            target: "p.T.t()".to_string(),
            truncated: true,
            chains: Vec::new(),
        };
        let text = TextRenderer::default().render_chains(&report).unwrap();
        assert!(text.contains("(0 found)"));
        assert!(text.contains("WARNING: visit budget exhausted"));
    }

    #[test]
    fn test_custom_template_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chains.tera");
        std::fs::write(&path, "{{ target }}: {{ chains | length }}").unwrap();

        let renderer = TextRenderer::new(Some(&path)).unwrap();
        let report = ChainReport { target: "p.T.t()".to_string(), truncated: false, chains: vec![] };
        assert_eq!(renderer.render_chains(&report).unwrap(), "p.T.t(): 0");
    }

    #[test]
    fn test_broken_template_is_template_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.tera");
        std::fs::write(&path, "{% for x in %}").unwrap();

        let renderer = TextRenderer::new(Some(&path)).unwrap();
        let report = ChainReport { target: "p.T.t()".to_string(), truncated: false, chains: vec![] };
        let err = renderer.render_chains(&report).unwrap_err();
        assert_eq!(err.exit_code(), 100);
    }

    #[test]
    fn test_render_list() {
        let report = ListReport {
            target: "p.T.t()".to_string(),
            methods: vec![
                ListEntry { signature: "p.A.a()".into(), file: Some("A.java".into()), line: Some(4) },
                ListEntry { signature: "p.B.b()".into(), file: None, line: None },
            ],
        };
        assert_eq!(
            TextRenderer::default().render_list(&report),
            "p.A.a() (A.java:4)\np.B.b()\n"
        );
    }
}
