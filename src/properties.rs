use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use si_invoke::PropertySink;

/// A `name=value` properties file. Entries already in the file are kept unless a property of
/// the same name is set.
#[derive(Debug)]
pub struct PropertiesFile {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl PropertiesFile {
    /// A missing file starts out empty.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = match fs::read_to_string(path) {
            Ok(content) => parse(&content),
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("unable to read properties from {}", path.display()))
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("unable to create {}", parent.display()))?;
        }
        let content: String = self
            .entries
            .iter()
            .map(|(name, value)| format!("{}={}\n", escape(name, true), escape(value, false)))
            .collect();
        fs::write(&self.path, content)
            .with_context(|| format!("unable to write properties to {}", self.path.display()))
    }
}

impl PropertySink for PropertiesFile {
    fn set_property(&mut self, name: &str, value: String) -> Option<String> {
        self.entries.insert(name.to_string(), value)
    }
}

fn parse(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim_start)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .map(|line| {
            let (name, value) = split_entry(line);
            (unescape(name), unescape(value.trim_start()))
        })
        .collect()
}

// splits at the first unescaped `=` or `:`
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '=' | ':' if !escaped => return (line[..i].trim_end(), &line[i + 1..]),
            _ => escaped = false,
        }
    }
    (line.trim_end(), "")
}

fn escape(s: &str, key: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '=' | ':' | ' ' if key => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
