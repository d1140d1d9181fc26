//! Instance materialization: template + index (+ default values) → markup

use std::collections::BTreeMap;

use tracing::trace;

use crate::template::Template;

/// Default values keyed by dotted path suffix, e.g. `Kind` or `Address.City`
pub type Overrides = BTreeMap<String, String>;

/// Output of [`materialize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Template text with the index and default values written in
    pub markup: String,
    /// Overrides that were requested, whether or not a field matched
    pub values: Overrides,
    /// Number of fields whose value attribute was set
    pub applied: usize,
}

/// Produce instance markup for `index`, applying `overrides`
pub fn materialize(template: &Template, index: u64, overrides: &Overrides) -> Materialized {
    let mut markup = template.render(index);
    let applied = apply_overrides(&mut markup, overrides);
    Materialized {
        markup,
        values: overrides.clone(),
        applied,
    }
}

/// Apply every override to `markup`, returning the number of fields touched
pub fn apply_overrides(markup: &mut String, overrides: &Overrides) -> usize {
    overrides
        .iter()
        .map(|(key, value)| apply_override(markup, key, value))
        .sum()
}

/// Set the `value` attribute on every tag whose `name` ends with `key`
pub fn apply_override(markup: &mut String, key: &str, value: &str) -> usize {
    let mut tags = Vec::new();
    let mut search = 0;

    while let Some(pos) = markup[search..].find("name=\"") {
        let at = search + pos;
        let value_start = at + "name=\"".len();
        let Some(len) = markup[value_start..].find('"') else {
            break;
        };
        let value_end = value_start + len;
        search = value_end + 1;

        // `data-name="..."` and friends are not the field name
        let is_attribute = markup[..at]
            .chars()
            .next_back()
            .map_or(false, char::is_whitespace);
        if !is_attribute || !path_matches(&markup[value_start..value_end], key) {
            continue;
        }

        let Some(tag_start) = markup[..at].rfind('<') else {
            continue;
        };
        let Some(close) = markup[value_end..].find('>') else {
            continue;
        };
        tags.push(tag_start..value_end + close + 1);
    }

    // Back to front so earlier ranges stay valid
    for range in tags.iter().rev() {
        let updated = set_value_attribute(&markup[range.clone()], value);
        markup.replace_range(range.clone(), &updated);
    }

    trace!(key, fields = tags.len(), "applied override");
    tags.len()
}

/// Whether `path` ends with the dotted suffix `key`
pub fn path_matches(path: &str, key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    match path.strip_suffix(key) {
        Some("") => true,
        Some(head) => head.ends_with('.'),
        None => false,
    }
}

/// Replace or insert `value="..."` in a single start tag
fn set_value_attribute(tag: &str, value: &str) -> String {
    let escaped = escape_attribute(value);

    let mut search = 0;
    while let Some(pos) = tag[search..].find("value=\"") {
        let at = search + pos;
        let start = at + "value=\"".len();
        let Some(len) = tag[start..].find('"') else {
            break;
        };
        if tag[..at].chars().next_back().map_or(false, char::is_whitespace) {
            return format!("{}{}{}", &tag[..start], escaped, &tag[start + len..]);
        }
        search = start + len + 1;
    }

    let insert_at = if tag.ends_with("/>") {
        tag.len() - 2
    } else {
        tag.len() - 1
    };
    let head = tag[..insert_at].trim_end();
    let tail = &tag[insert_at..];
    if tail == "/>" {
        format!("{} value=\"{}\" {}", head, escaped, tail)
    } else {
        format!("{} value=\"{}\"{}", head, escaped, tail)
    }
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
