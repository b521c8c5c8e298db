use colored::Colorize;
use serde::Serialize;
use xml_bind_core::binding::FieldState;
use xml_bind_core::XmlNode;

use crate::profile::WlanProfile;
use crate::schema::keys;

/// Render an XML tree with a configurable max depth.
pub fn render_tree(node: &XmlNode, max_depth: usize) -> String {
    let mut out = String::new();
    render_node(node, 0, max_depth, &mut out);
    out
}

fn render_node(node: &XmlNode, depth: usize, max_depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match &node.text {
        Some(text) if node.children.is_empty() => {
            out.push_str(&format!("{}{} = {}\n", indent, node.tag, text.trim()))
        }
        _ => out.push_str(&format!("{}{}\n", indent, node.tag)),
    }

    if depth >= max_depth {
        return;
    }

    for child in &node.children {
        render_node(child, depth + 1, max_depth, out);
    }
}

/// Machine-readable summary of one profile.
#[derive(Debug, Serialize)]
pub struct ProfileReport {
    pub display_name: Option<String>,
    pub valid: bool,
    pub fields: Vec<FieldState>,
}

impl ProfileReport {
    pub fn new(profile: &WlanProfile, show_secrets: bool) -> Self {
        let mut fields = profile.fields();
        if !show_secrets {
            for field in &mut fields {
                if field.entry_key == keys::KEY_MATERIAL && field.value.is_some() {
                    field.value = Some("********".to_string());
                }
            }
        }
        Self {
            display_name: profile.display_name().map(str::to_string),
            valid: profile.is_valid(),
            fields,
        }
    }
}

/// One line per bound field: path, value, and markers for invalid or
/// pruned fields.
pub fn render_fields(report: &ProfileReport) -> String {
    let mut out = String::new();
    let status = if report.valid {
        "valid".green()
    } else {
        "incomplete".red()
    };
    out.push_str(&format!(
        "profile {} ({})\n",
        report.display_name.as_deref().unwrap_or("<unnamed>").bold(),
        status
    ));

    for field in &report.fields {
        let line = match &field.value {
            Some(value) if field.written => format!("  {} = {}", field.path, value),
            Some(_) => format!("  {} = {}", field.path, "(empty, not written)".dimmed()),
            None if field.mandatory => format!("  {} {}", field.path, "missing".red()),
            None => continue,
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}
