//! Flat tag tokenizer for protocol responses.
//!
//! Responses are treated as a stream of `<...>` delimited tags rather than a
//! document tree. Each tag becomes one [`TagEvent`] carrying the text that
//! follows it up to the next `<`. Well-formedness is not checked: malformed
//! input produces best-effort events.

use std::collections::HashMap;

/// One parsed tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagEvent {
    /// Tag name; closing tags keep their leading `/`.
    pub name: String,
    /// Unescaped attribute values.
    pub attributes: HashMap<String, String>,
    /// Unescaped, trimmed text up to the next tag.
    pub content: String,
}

impl TagEvent {
    pub fn is_close(&self) -> bool {
        self.name.starts_with('/')
    }

    /// True for `<tag ...>`.
    pub fn opens(&self, tag: &str) -> bool {
        self.name == tag
    }

    /// True for `</tag>`.
    pub fn closes(&self, tag: &str) -> bool {
        self.name.strip_prefix('/') == Some(tag)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// The `id` attribute, treating an empty value as absent.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id").filter(|id| !id.is_empty())
    }
}

/// Lazy, non-restartable sequence of [`TagEvent`]s over response text.
pub struct TagStream<'a> {
    rest: &'a str,
    pending_close: Option<(String, String)>,
}

impl<'a> TagStream<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            rest: text,
            pending_close: None,
        }
    }
}

impl Iterator for TagStream<'_> {
    type Item = TagEvent;

    fn next(&mut self) -> Option<TagEvent> {
        if let Some((name, content)) = self.pending_close.take() {
            return Some(TagEvent {
                name: format!("/{name}"),
                attributes: HashMap::new(),
                content,
            });
        }

        loop {
            let start = self.rest.find('<')?;
            let after = &self.rest[start + 1..];
            let Some(end) = after.find('>') else {
                self.rest = "";
                return None;
            };
            let inner = after[..end].trim();
            let tail = &after[end + 1..];
            let content_end = tail.find('<').unwrap_or(tail.len());
            let content = unescape(tail[..content_end].trim());
            self.rest = &tail[content_end..];

            // Declarations, comments and processing instructions.
            if inner.starts_with('?') || inner.starts_with('!') || inner.is_empty() {
                continue;
            }

            let (inner, self_closing) = match inner.strip_suffix('/') {
                Some(stripped) => (stripped.trim_end(), true),
                None => (inner, false),
            };
            let (name, rest) = match inner.find(char::is_whitespace) {
                Some(split) => (&inner[..split], &inner[split..]),
                None => (inner, ""),
            };
            let attributes = parse_attributes(rest);

            if self_closing {
                // Trailing text belongs to the synthetic closing tag.
                self.pending_close = Some((name.to_string(), content));
                return Some(TagEvent {
                    name: name.to_string(),
                    attributes,
                    content: String::new(),
                });
            }

            return Some(TagEvent {
                name: name.to_string(),
                attributes,
                content,
            });
        }
    }
}

/// Parse `key=value` pairs; values may be single or double quoted.
fn parse_attributes(text: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        let Some(eq) = rest.find('=') else { break };
        let key = rest[..eq].trim();
        let after = rest[eq + 1..].trim_start();

        let (value, remainder) = match after.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &after[1..];
                match body.find(quote) {
                    Some(close) => (&body[..close], &body[close + 1..]),
                    None => (body, ""),
                }
            }
            _ => match after.find(char::is_whitespace) {
                Some(split) => (&after[..split], &after[split..]),
                None => (after, ""),
            },
        };

        // A key token may have swallowed a valueless word before it.
        let key = key.rsplit(char::is_whitespace).next().unwrap_or(key);
        if !key.is_empty() {
            attributes.insert(key.to_string(), unescape(value.trim()));
        }
        rest = remainder.trim_start();
    }

    attributes
}

/// Replace XML entity and character references.
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&candidate[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &candidate[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
