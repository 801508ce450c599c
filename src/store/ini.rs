//! INI-style config store as used by `~/.aws/config`.
//!
//! Sections are kept in file order. Comment lines are kept with the section
//! they belong to: a comment directly above a header travels with that
//! header, a comment inside a section stays inside it, and comments before
//! the first section that are followed by a blank line form a preamble.
//! Blank lines are normalized on output.

use indexmap::IndexMap;

use crate::error::{Result, SsoError};

/// One line inside a section body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionLine {
    Setting { key: String, value: String },
    Comment(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    leading_comments: Vec<String>,
    lines: Vec<SectionLine>,
}

impl Section {
    pub fn from_settings<K, V>(settings: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            leading_comments: Vec::new(),
            lines: settings
                .into_iter()
                .map(|(key, value)| SectionLine::Setting {
                    key: key.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            SectionLine::Setting { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        for line in &mut self.lines {
            if let SectionLine::Setting { key: k, value: v } = line {
                if *k == key {
                    *v = value;
                    return;
                }
            }
        }
        self.lines.push(SectionLine::Setting { key, value });
    }

    pub fn settings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            SectionLine::Setting { key, value } => Some((key.as_str(), value.as_str())),
            SectionLine::Comment(_) => None,
        })
    }

    pub fn lines(&self) -> &[SectionLine] {
        &self.lines
    }

    /// Replace the body, keeping any comments written above the header.
    fn replace_body(&mut self, other: Section) {
        self.lines = other.lines;
    }
}

/// Ordered mapping of section name to section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigStore {
    preamble: Vec<String>,
    sections: IndexMap<String, Section>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut store = Self::new();
        let mut current: Option<String> = None;
        let mut pending_comments: Vec<String> = Vec::new();
        let mut last_was_setting = false;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim_end_matches('\r');
            let trimmed = line.trim();

            if trimmed.is_empty() {
                last_was_setting = false;
                if !pending_comments.is_empty() {
                    let comments = std::mem::take(&mut pending_comments);
                    match current.as_ref().and_then(|name| store.sections.get_mut(name)) {
                        Some(section) => section
                            .lines
                            .extend(comments.into_iter().map(SectionLine::Comment)),
                        None => store.preamble.extend(comments),
                    }
                }
                continue;
            }

            // Comments do not end a multi-line value; they are held until
            // the next setting or blank line.
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                pending_comments.push(trimmed.to_string());
                continue;
            }

            let indented = line.starts_with(|c: char| c.is_whitespace());
            if indented && last_was_setting {
                let section = current
                    .as_ref()
                    .and_then(|name| store.sections.get_mut(name))
                    .ok_or_else(|| parse_error(line_no, "continuation outside a section"))?;
                if let Some(SectionLine::Setting { value, .. }) = section.lines.last_mut() {
                    value.push('\n');
                    value.push_str(trimmed);
                }
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or_else(|| parse_error(line_no, "unterminated section header"))?
                    .trim();
                if name.is_empty() {
                    return Err(parse_error(line_no, "empty section name"));
                }
                if store.sections.contains_key(name) {
                    return Err(parse_error(line_no, format!("duplicate section [{name}]")));
                }
                let section = Section {
                    leading_comments: std::mem::take(&mut pending_comments),
                    lines: Vec::new(),
                };
                store.sections.insert(name.to_string(), section);
                current = Some(name.to_string());
                last_was_setting = false;
                continue;
            }

            let section = current
                .as_ref()
                .and_then(|name| store.sections.get_mut(name))
                .ok_or_else(|| parse_error(line_no, "setting before the first section header"))?;
            let split = trimmed.find(|c: char| c == '=' || c == ':').ok_or_else(|| {
                parse_error(line_no, format!("expected `key = value`, got `{trimmed}`"))
            })?;
            let key = trimmed[..split].trim();
            if key.is_empty() {
                return Err(parse_error(line_no, "empty setting name"));
            }
            let value = trimmed[split + 1..].trim();
            section
                .lines
                .extend(pending_comments.drain(..).map(SectionLine::Comment));
            section.lines.push(SectionLine::Setting {
                key: key.to_string(),
                value: value.to_string(),
            });
            last_was_setting = true;
        }

        if !pending_comments.is_empty() {
            match current.as_ref().and_then(|name| store.sections.get_mut(name)) {
                Some(section) => section
                    .lines
                    .extend(pending_comments.into_iter().map(SectionLine::Comment)),
                None => store.preamble.extend(pending_comments),
            }
        }
        Ok(store)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for comment in &self.preamble {
            out.push_str(comment);
            out.push('\n');
        }
        if !self.preamble.is_empty() {
            out.push('\n');
        }
        for (name, section) in &self.sections {
            for comment in &section.leading_comments {
                out.push_str(comment);
                out.push('\n');
            }
            out.push('[');
            out.push_str(name);
            out.push_str("]\n");
            for line in &section.lines {
                match line {
                    SectionLine::Comment(text) => {
                        out.push_str(text);
                        out.push('\n');
                    }
                    SectionLine::Setting { key, value } => render_setting(&mut out, key, value),
                }
            }
            out.push('\n');
        }
        out
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Insert a section or replace the body of an existing one.
    ///
    /// Returns `true` if a section with that name already existed.
    pub fn upsert(&mut self, name: impl Into<String>, section: Section) -> bool {
        let name = name.into();
        match self.sections.get_mut(&name) {
            Some(existing) => {
                existing.replace_body(section);
                true
            }
            None => {
                self.sections.insert(name, section);
                false
            }
        }
    }

    /// Remove a section, keeping the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<Section> {
        self.sections.shift_remove(name)
    }
}

fn render_setting(out: &mut String, key: &str, value: &str) {
    let mut parts = value.split('\n');
    let first = parts.next().unwrap_or_default();
    out.push_str(key);
    if first.is_empty() {
        out.push_str(" =\n");
    } else {
        out.push_str(" = ");
        out.push_str(first);
        out.push('\n');
    }
    for continuation in parts {
        out.push_str("    ");
        out.push_str(continuation);
        out.push('\n');
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> SsoError {
    SsoError::ConfigParse {
        line,
        message: message.into(),
    }
}
