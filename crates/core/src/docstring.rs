//! Documentation splitter.
//!
//! Separates the human-readable part of a docstring from the directive lines that carry type
//! information:
//!
//! ```text
//! :type name: list(int or str)
//! :rtype: iter(Foo)
//! :return: the decoded value
//! ```

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Result, StubError};

static TYPE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*:type[ \t]+(?P<name>[a-zA-Z_][a-zA-Z_0-9]*):[ \t]*(?P<expr>[^\n]*?)[ \t\r]*$")
        .unwrap()
});
static RTYPE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*:rtype:[ \t]*(?P<expr>[^\n]*?)[ \t\r]*$").unwrap()
});
static RETURN_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*:return:[ \t]*(?P<text>[^\n]*?)[ \t\r]*$").unwrap()
});

/// A `:type <name>: <expr>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDirective {
    pub name: String,
    pub expr: String,
}

/// A docstring with its directives pulled out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitDoc {
    /// Text without `:type` / `:rtype` lines. `:return:` lines are kept.
    pub description: String,
    pub param_types: Vec<TypeDirective>,
    pub rtype: Option<String>,
    /// The single `:return:` line, if any.
    pub return_doc: Option<String>,
}

/// Split a docstring into description and directives.
///
/// Fails with [`StubError::AmbiguousReturnDoc`] when `:return:` or `:rtype:` appears more than
/// once.
pub fn split_doc(doc: &str) -> Result<SplitDoc> {
    Ok(SplitDoc {
        description: description(doc),
        param_types: param_types(doc),
        rtype: single(&RTYPE_DIRECTIVE, doc, "expr", ":rtype:")?,
        return_doc: single(&RETURN_DIRECTIVE, doc, "text", ":return:")?,
    })
}

/// Every `:type` directive, in document order.
pub fn param_types(doc: &str) -> Vec<TypeDirective> {
    TYPE_DIRECTIVE
        .captures_iter(doc)
        .map(|c| TypeDirective { name: c["name"].to_string(), expr: c["expr"].to_string() })
        .collect()
}

/// The `:rtype:` directive, if present exactly once.
pub fn rtype(doc: &str) -> Result<Option<String>> {
    single(&RTYPE_DIRECTIVE, doc, "expr", ":rtype:")
}

/// The `:return:` description, if present exactly once.
pub fn return_doc(doc: &str) -> Result<Option<String>> {
    single(&RETURN_DIRECTIVE, doc, "text", ":return:")
}

fn single(re: &Regex, doc: &str, group: &str, directive: &'static str) -> Result<Option<String>> {
    let found: Vec<String> = re.captures_iter(doc).map(|c| c[group].to_string()).collect();
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.into_iter().next()),
        count => Err(StubError::AmbiguousReturnDoc { directive, count }),
    }
}

/// Docstring text with `:type` and `:rtype` lines removed, every line trimmed.
pub fn description(doc: &str) -> String {
    doc.lines()
        .map(str::trim)
        .filter(|l| !l.starts_with(":type") && !l.starts_with(":rtype"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Normalize a raw docstring: expand tabs, drop the first line's leading whitespace, remove the
/// common indentation of the following lines, and strip leading and trailing blank lines.
pub fn clean_doc(raw: &str) -> String {
    let expanded = raw.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();
    let Some((first, rest)) = lines.split_first() else {
        return String::new();
    };

    // Margin counts whitespace chars, not bytes.
    let margin = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    cleaned.push(first.trim_start());
    for line in rest {
        cleaned.push(strip_indent(line, margin).trim_end_matches('\r'));
    }

    while cleaned.first().is_some_and(|l| l.trim().is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.trim().is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

/// Drop up to `margin` leading whitespace chars.
fn strip_indent(line: &str, margin: usize) -> &str {
    let offset = line
        .char_indices()
        .take_while(|(_, c)| c.is_whitespace())
        .take(margin)
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    &line[offset..]
}
