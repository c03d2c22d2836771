// src/core/report/tree.rs
use crate::error::Result;
use super::{ListReport, TreeReport};

/// Serialize a descendant tree report as pretty-printed JSON
pub fn render_tree(report: &TreeReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Serialize a flat signature list as a JSON array
pub fn render_list(report: &ListReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(&report.methods)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::assembler::{ListEntry, MethodSummary, TreeNodeReport};

    #[test]
    fn test_tree_json_shape() {
        let report = TreeReport {
            target: "p.T.t()".to_string(),
            generated_at: "2024-01-01T00:00:00+00:00".to_string(),
            truncated: false,
            dag_tree: TreeNodeReport {
                method: "p.App.main()".to_string(),
                file: "App.java".to_string(),
                line: 3,
                children: vec![TreeNodeReport {
                    method: "p.T.t()".to_string(),
                    file: "unavailable".to_string(),
                    line: 0,
                    children: vec![],
                }],
            },
            methods: vec![MethodSummary {
                name: "App.main".to_string(),
                signature: "p.App.main()".to_string(),
                body: Some("void main() { }".to_string()),
                comments: None,
            }],
        };

        let json: serde_json::Value = serde_json::from_str(&render_tree(&report).unwrap()).unwrap();
        assert_eq!(json["target"], "p.T.t()");
        assert_eq!(json["truncated"], false);
        assert_eq!(json["dag_tree"]["method"], "p.App.main()");
        assert_eq!(json["dag_tree"]["children"][0]["file"], "unavailable");
        assert_eq!(json["dag_tree"]["children"][0]["line"], 0);
        assert_eq!(json["methods"][0]["name"], "App.main");
        assert!(json["methods"][0]["comments"].is_null());
    }

    #[test]
    fn test_list_json_is_array() {
        let report = ListReport {
            target: "p.T.t()".to_string(),
            methods: vec![ListEntry { signature: "p.A.a()".into(), file: None, line: None }],
        };
        let json: serde_json::Value = serde_json::from_str(&render_list(&report).unwrap()).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["signature"], "p.A.a()");
    }
}
