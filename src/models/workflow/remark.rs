//! Structured blocks carried inside the transition `remark`.
//!
//! The transition endpoint has a single remark column, so report data
//! (checklist answers, measured areas, fee figures) travels as a text block
//! ahead of the officer's free-text remark:
//!
//! ```text
//! [[SURVEY-1]]
//! land_acquisition: yes
//! [[END]]
//! ok
//! ```

use std::fmt::Write as _;

const BLOCK_END: &str = "[[END]]";

/// Tags written by report submissions. Any other bracketed first line is
/// officer text.
pub const REPORT_TAGS: [&str; 7] = ["SURVEY-1", "SURVEY-2", "SURVEY-3", "SURVEY-4", "MARSAC", "FEE", "LLMC"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemarkBlock {
    pub tag: String,
    pub fields: Vec<(String, String)>,
}

impl RemarkBlock {
    pub fn new(tag: impl Into<String>) -> Self {
        RemarkBlock {
            tag: tag.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field. Line breaks in the value are flattened to spaces.
    pub fn field(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string().replace(['\r', '\n'], " ");
        self.fields.push((key.trim().to_string(), value.trim().to_string()));
        self
    }

    pub fn flag(self, key: &str, value: bool) -> Self {
        self.field(key, if value { "yes" } else { "no" })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_flag(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            "yes" => Some(true),
            "no" => Some(false),
            _ => None,
        }
    }

    fn render(&self) -> String {
        let mut out = format!("[[{}]]\n", self.tag);
        for (key, value) in &self.fields {
            let _ = writeln!(out, "{key}: {value}");
        }
        out.push_str(BLOCK_END);
        out
    }
}

/// Puts `block` in front of the free-text remark.
pub fn compose_remark(block: &RemarkBlock, text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        block.render()
    } else {
        format!("{}\n{}", block.render(), text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRemark {
    pub block: Option<RemarkBlock>,
    pub text: String,
}

fn block_tag(line: &str) -> Option<&str> {
    let inner = line.trim().strip_prefix("[[")?.strip_suffix("]]")?;
    REPORT_TAGS.contains(&inner).then_some(inner)
}

/// Splits a stored remark back into its block and free text. A remark with
/// no block, an unknown tag, or an unterminated block is returned as plain
/// text.
pub fn parse_remark(remark: &str) -> ParsedRemark {
    let plain = || ParsedRemark {
        block: None,
        text: remark.trim().to_string(),
    };

    let mut lines = remark.lines();
    let Some(tag) = lines.next().and_then(block_tag) else {
        return plain();
    };

    let mut block = RemarkBlock::new(tag);
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim() == BLOCK_END {
            closed = true;
            break;
        }
        match line.split_once(':') {
            Some((key, value)) => block
                .fields
                .push((key.trim().to_string(), value.trim().to_string())),
            None => return plain(),
        }
    }
    if !closed {
        return plain();
    }

    let text = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    ParsedRemark {
        block: Some(block),
        text,
    }
}
