//! Tool documentation parsing
//!
//! Splits a tool's documentation text into a summary and per-parameter descriptions.
//! Google-style `Args:` sections and reST `:param name:` lines are understood.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

static ARG_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(args|arguments|parameters|params)\s*:\s*$").expect("valid regex")
});

static OTHER_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?i)(returns?|raises|yields|examples?|notes?|see also|attributes|todo|warnings?)\s*:\s*$",
    )
    .expect("valid regex")
});

static ARG_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*{0,2}([A-Za-z_][A-Za-z0-9_]*)\s*(?:\([^)]*\))?\s*:\s*(.*)$")
        .expect("valid regex")
});

static REST_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:param\s+(?:[^:\s]+\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(.*)$")
        .expect("valid regex")
});

static REST_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:[A-Za-z]+(\s+[^:]*)?:").expect("valid regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDoc {
    pub summary: String,
    pub params: IndexMap<String, String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Args,
    Other,
}

pub fn parse_doc(text: &str) -> ParsedDoc {
    let mut summary_lines: Vec<&str> = Vec::new();
    let mut params: IndexMap<String, String> = IndexMap::new();
    let mut section = Section::Summary;
    let mut entry_indent: Option<usize> = None;
    let mut current: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        let indent = line.len() - line.trim_start().len();

        if ARG_SECTION.is_match(trimmed) {
            section = Section::Args;
            entry_indent = None;
            current = None;
            continue;
        }
        if OTHER_SECTION.is_match(trimmed) {
            section = Section::Other;
            current = None;
            continue;
        }

        if let Some(captures) = REST_PARAM.captures(trimmed) {
            let name = captures[1].to_string();
            params.insert(name.clone(), captures[2].trim().to_string());
            current = Some(name);
            continue;
        }
        if REST_FIELD.is_match(trimmed) {
            current = None;
            continue;
        }

        match section {
            Section::Summary => {
                if let Some(name) = current.as_ref().filter(|_| !trimmed.is_empty()) {
                    append(&mut params, name, trimmed);
                } else {
                    current = None;
                    summary_lines.push(trimmed);
                }
            }
            Section::Args => {
                if trimmed.is_empty() {
                    continue;
                }
                let at_entry_level = entry_indent.is_none_or(|level| indent <= level);
                match ARG_ENTRY.captures(trimmed).filter(|_| at_entry_level) {
                    Some(captures) => {
                        entry_indent = Some(indent);
                        let name = captures[1].to_string();
                        params.insert(name.clone(), captures[2].trim().to_string());
                        current = Some(name);
                    }
                    None => {
                        if let Some(name) = current.as_ref() {
                            append(&mut params, name, trimmed);
                        }
                    }
                }
            }
            Section::Other => {}
        }
    }

    ParsedDoc {
        summary: summary_lines.join("\n").trim().to_string(),
        params,
    }
}

fn append(params: &mut IndexMap<String, String>, name: &str, text: &str) {
    if let Some(description) = params.get_mut(name) {
        if !description.is_empty() {
            description.push(' ');
        }
        description.push_str(text);
    }
}
