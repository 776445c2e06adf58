//! Markdown-like rendering of a cleaned tree for LLM consumption.
//!
//! Rendering is intentionally lossy. Categories the renderer does not know are
//! emitted as `UNDEFINED(category name)`; structural surprises inside tables,
//! lists and form controls are errors.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::error::TreeError;
use crate::tree::{Node, NodeId, Tree};

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid newline regex"));

const LIST_MARKERS: [&str; 3] = ["*", "-", "+"];

/// Render the whole tree starting at its root.
pub fn markdown(tree: &Tree) -> Result<String, TreeError> {
    render(tree, tree.root(), 0)
}

/// Render the subtree at `id`. `depth` is the list nesting level.
pub fn render(tree: &Tree, id: NodeId, depth: usize) -> Result<String, TreeError> {
    let node = tree.get(id);
    let name = node.name.as_str();
    let rendered = match node.category.as_str() {
        "main" => format!("\n\n# main {name}\n\n{}\n\n", children_joined(tree, id, depth)?),
        "complementary" => {
            let title = if name.is_empty() { "complementary" } else { name };
            format!("\n\n# {title}\n\n{}\n\n", children_joined(tree, id, depth)?)
        }
        "navigation" => format!(
            "\n\n## navigation {name}\n\n{}\n\n",
            children_joined(tree, id, depth)?
        ),
        "heading" => {
            if node.has_children() {
                let mut parts = vec![format!("[heading: {name}]")];
                parts.extend(rendered_children(tree, id, depth)?);
                join(&parts)
            } else {
                format!("## {name}")
            }
        }
        "table" => {
            let mut lines = vec![format!("[table: {name}]")];
            lines.extend(rendered_children(tree, id, depth)?);
            lines.join("\n")
        }
        "row" => render_row(tree, node, depth)?,
        "columnheader" | "gridcell" => match node.children() {
            [] => name.to_string(),
            [only] => render(tree, *only, depth)?,
            _ => return Err(TreeError::shape(&node.category, name, "more than one child")),
        },
        "link" => match node.property("hover_text") {
            Some(hover) => format!("[link: {name} {hover}]"),
            None => format!("[link: {name}]"),
        },
        "button" | "time" | "searchbox" | "textbox" => render_control(tree, node)?,
        "switch" => {
            let checked = node
                .property("checked")
                .is_some_and(|value| value.is_truthy());
            format!("[switch, checked={}: {name}]", u8::from(checked))
        }
        "RootWebArea" => {
            let lines = rendered_children(tree, id, depth)?;
            collapse_newlines(&lines.join("\n"))
        }
        "list" => render_list(tree, node, depth)?,
        "listitem" => children_joined(tree, id, depth)?,
        _ if node.is_category("statictext") => name.to_string(),
        _ if node.is_category("image") => format!("[image: {name}]"),
        _ if node.is_category("generic") => {
            let mut parts = vec![name.to_string()];
            parts.extend(rendered_children(tree, id, depth)?);
            join(&parts)
        }
        _ if node.is_category("group") => {
            if name.is_empty() {
                children_joined(tree, id, depth)?
            } else {
                let mut parts = vec![format!("[group: {name}]")];
                parts.extend(rendered_children(tree, id, depth)?);
                join(&parts)
            }
        }
        other => format!("UNDEFINED({other} {name})"),
    };
    Ok(rendered)
}

/// Concatenate non-empty parts with a single space where neither side already
/// has whitespace, then collapse runs of three or more newlines to two.
pub fn join<S: AsRef<str>>(parts: &[S]) -> String {
    let mut out = String::new();
    for part in parts {
        let part = part.as_ref();
        if part.is_empty() {
            continue;
        }
        let needs_space = out.chars().last().is_some_and(|c| !c.is_whitespace())
            && part.chars().next().is_some_and(|c| !c.is_whitespace());
        if needs_space {
            out.push(' ');
        }
        out.push_str(part);
    }
    collapse_newlines(&out)
}

fn collapse_newlines(text: &str) -> String {
    EXCESS_NEWLINES.replace_all(text, "\n\n").into_owned()
}

fn rendered_children(tree: &Tree, id: NodeId, depth: usize) -> Result<Vec<String>, TreeError> {
    tree.children(id)
        .iter()
        .map(|child| render(tree, *child, depth))
        .collect()
}

fn children_joined(tree: &Tree, id: NodeId, depth: usize) -> Result<String, TreeError> {
    Ok(join(&rendered_children(tree, id, depth)?))
}

fn render_row(tree: &Tree, node: &Node, depth: usize) -> Result<String, TreeError> {
    let children = node.children();
    let has = |category: &str| {
        children
            .iter()
            .any(|child| tree.get(*child).category == category)
    };
    let all = |category: &str| {
        children
            .iter()
            .all(|child| tree.get(*child).category == category)
    };
    let cells = || -> Result<Vec<String>, TreeError> {
        children
            .iter()
            .map(|child| render(tree, *child, depth))
            .collect()
    };

    if has("columnheader") {
        if !all("columnheader") {
            return Err(TreeError::shape(
                &node.category,
                &node.name,
                "header row mixes columnheader with other cells",
            ));
        }
        let cells = cells()?;
        let header = format!("| {} |", cells.join(" | "));
        let rule = format!("| {} |", vec![":---:"; cells.len()].join(" | "));
        return Ok(format!("{header}\n{rule}"));
    }
    if has("gridcell") {
        if !all("gridcell") {
            return Err(TreeError::shape(
                &node.category,
                &node.name,
                "data row mixes gridcell with other cells",
            ));
        }
        return Ok(format!("| {} |", cells()?.join(" | ")));
    }
    Err(TreeError::shape(
        &node.category,
        &node.name,
        "row without columnheader or gridcell children",
    ))
}

/// `[category: name]`, optionally followed by the text of a single plain-text child.
fn render_control(tree: &Tree, node: &Node) -> Result<String, TreeError> {
    let category = node.category.as_str();
    let name = node.name.as_str();
    match node.children() {
        [] => Ok(format!("[{category}: {name}]")),
        [only] => {
            let child = tree.get(*only);
            if child.is_category("statictext") && !child.has_children() {
                Ok(format!("[{category}: {name}, {}]", child.name))
            } else {
                Err(TreeError::shape(
                    category,
                    name,
                    format!("unexpected child {}", child.category),
                ))
            }
        }
        _ => Err(TreeError::shape(category, name, "more than one child")),
    }
}

fn render_list(tree: &Tree, node: &Node, depth: usize) -> Result<String, TreeError> {
    let marker = LIST_MARKERS[depth % LIST_MARKERS.len()];
    let mut items = Vec::with_capacity(node.children().len());
    for child in node.children() {
        let item = tree.get(*child);
        if item.category != "listitem" {
            return Err(TreeError::shape(
                &node.category,
                &node.name,
                format!("list child is {}", item.category),
            ));
        }
        let body = render(tree, *child, depth + 1)?;
        // Split on every newline so a trailing blank line keeps its indent.
        let lines: Vec<String> = body
            .split('\n')
            .enumerate()
            .map(|(index, line)| {
                if index == 0 {
                    format!("{marker}\t{line}")
                } else {
                    format!("\t{line}")
                }
            })
            .collect();
        items.push(lines.join("\n"));
    }
    Ok(items.join("\n"))
}
