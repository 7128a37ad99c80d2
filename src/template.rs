// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Message templates such as `User {UserId} logged in`.

use std::fmt;
use std::fmt::Write;

use indexmap::IndexMap;

use crate::value::PropertyValue;
use crate::value::Scalar;

/// Formats scalar values when a message template is rendered.
///
/// Implementations return `None` to fall back to the default rendering.
///
/// # Examples
///
/// ```
/// use logforth_layout_filtered_json::FormatProvider;
/// use logforth_layout_filtered_json::Scalar;
///
/// #[derive(Debug)]
/// struct TwoDecimals;
///
/// impl FormatProvider for TwoDecimals {
///     fn format(&self, value: &Scalar, _format: Option<&str>) -> Option<String> {
///         match value {
///             Scalar::F64(v) => Some(format!("{v:.2}")),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait FormatProvider: fmt::Debug + Send + Sync + 'static {
    /// Format `value`, where `format` is the format string of the placeholder, if any.
    fn format(&self, value: &Scalar, format: Option<&str>) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Property(PropertyToken),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PropertyToken {
    name: String,
    format: Option<String>,
    alignment: Option<i32>,
    // the token as written, used when the property is missing
    raw: String,
}

/// A parsed message template.
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use logforth_layout_filtered_json::MessageTemplate;
/// use logforth_layout_filtered_json::PropertyValue;
///
/// let template = MessageTemplate::new("User {UserId} logged in");
/// let mut properties = IndexMap::new();
/// properties.insert("UserId".to_string(), PropertyValue::from(42));
/// assert_eq!(template.render(&properties), "User 42 logged in");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    text: String,
    tokens: Vec<Token>,
}

impl MessageTemplate {
    /// Parse a template.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens = parse(&text);
        MessageTemplate { text, tokens }
    }

    /// The raw, unrendered template text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Names of the properties referenced by the template, in order of appearance.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            Token::Property(p) => Some(p.name.as_str()),
            Token::Text(_) => None,
        })
    }

    /// Substitute placeholders with the values in `properties`.
    pub fn render(&self, properties: &IndexMap<String, PropertyValue>) -> String {
        self.render_with(properties, None)
    }

    /// Substitute placeholders, formatting scalars through `provider` first.
    pub fn render_with(
        &self,
        properties: &IndexMap<String, PropertyValue>,
        provider: Option<&dyn FormatProvider>,
    ) -> String {
        let mut out = String::with_capacity(self.text.len());
        for token in self.tokens.iter() {
            match token {
                Token::Text(text) => out.push_str(text),
                Token::Property(p) => match properties.get(&p.name) {
                    Some(value) => render_property(&mut out, p, value, provider),
                    None => out.push_str(&p.raw),
                },
            }
        }
        out
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for MessageTemplate {
    fn from(text: &str) -> Self {
        MessageTemplate::new(text)
    }
}

impl From<String> for MessageTemplate {
    fn from(text: String) -> Self {
        MessageTemplate::new(text)
    }
}

fn render_property(
    out: &mut String,
    token: &PropertyToken,
    value: &PropertyValue,
    provider: Option<&dyn FormatProvider>,
) {
    let format = token.format.as_deref();
    let scalar = |s: &Scalar| {
        if let Some(text) = provider.and_then(|p| p.format(s, format)) {
            return Some(text);
        }
        match (s, format) {
            (Scalar::String(s), Some("l")) => Some(s.clone()),
            (Scalar::Char(c), Some("l")) => Some(c.to_string()),
            _ => None,
        }
    };

    let mut text = String::new();
    // SAFETY: write to a string always succeeds
    value.render(&mut text, &scalar).unwrap();

    let width = token.alignment.map(|a| a.unsigned_abs() as usize).unwrap_or(0);
    let pad = width.saturating_sub(text.chars().count());
    match token.alignment {
        Some(a) if a < 0 => {
            out.push_str(&text);
            out.extend(std::iter::repeat_n(' ', pad));
        }
        _ => {
            out.extend(std::iter::repeat_n(' ', pad));
            out.push_str(&text);
        }
    }
}

fn parse(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if rest.starts_with("{{") || rest.starts_with("}}") {
            literal.push(c);
            rest = &rest[2..];
            continue;
        }
        if c != '{' {
            literal.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        }

        let Some(end) = rest.find('}') else {
            // unterminated
            literal.push_str(rest);
            break;
        };
        if let Some(next) = rest[1..end].find('{') {
            // a later `{` starts the candidate token
            literal.push_str(&rest[..=next]);
            rest = &rest[next + 1..];
            continue;
        }
        let raw = &rest[..=end];
        match parse_property(raw) {
            Some(token) => {
                if !literal.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Property(token));
            }
            None => literal.push_str(raw),
        }
        rest = &rest[end + 1..];
    }

    if !literal.is_empty() {
        tokens.push(Token::Text(literal));
    }
    tokens
}

// `raw` includes the surrounding braces.
fn parse_property(raw: &str) -> Option<PropertyToken> {
    let inner = &raw[1..raw.len() - 1];
    let inner = inner.strip_prefix(['@', '$']).unwrap_or(inner);

    let (head, format) = match inner.split_once(':') {
        Some((head, format)) => (head, Some(format.to_string())),
        None => (inner, None),
    };
    let (name, alignment) = match head.split_once(',') {
        Some((name, alignment)) => (name, Some(parse_alignment(alignment)?)),
        None => (head, None),
    };

    let valid_name =
        !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !valid_name {
        return None;
    }

    Some(PropertyToken {
        name: name.to_string(),
        format,
        alignment,
        raw: raw.to_string(),
    })
}

fn parse_alignment(text: &str) -> Option<i32> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Structure;

    fn props(pairs: &[(&str, PropertyValue)]) -> IndexMap<String, PropertyValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn renders_strings_quoted() {
        let template = MessageTemplate::new("Hello {Name}");
        let rendered = template.render(&props(&[("Name", "World".into())]));
        assert_eq!(rendered, r#"Hello "World""#);
    }

    #[test]
    fn literal_format_renders_strings_raw() {
        let template = MessageTemplate::new("Hello {Name:l}");
        let rendered = template.render(&props(&[("Name", "World".into())]));
        assert_eq!(rendered, "Hello World");
    }

    #[test]
    fn missing_properties_keep_their_token() {
        let template = MessageTemplate::new("{Count,5:000} items for {User}");
        let rendered = template.render(&props(&[("User", 3.into())]));
        assert_eq!(rendered, "{Count,5:000} items for 3");
    }

    #[test]
    fn escaped_braces_are_literal() {
        let template = MessageTemplate::new("{{not a {Prop}}}");
        assert_eq!(template.property_names().collect::<Vec<_>>(), vec!["Prop"]);
        let rendered = template.render(&props(&[("Prop", true.into())]));
        assert_eq!(rendered, "{not a true}");
    }

    #[test]
    fn malformed_tokens_are_text() {
        let template = MessageTemplate::new("a {bad name} b {unterminated");
        assert_eq!(template.property_names().count(), 0);
        assert_eq!(template.render(&IndexMap::new()), "a {bad name} b {unterminated");

        let template = MessageTemplate::new("{a{b}");
        assert_eq!(template.property_names().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(template.render(&props(&[("b", 'x'.into())])), r#"{a"x""#);
    }

    #[test]
    fn destructuring_hints_and_positional_names() {
        let template = MessageTemplate::new("{@Order} #{0}");
        let order = Structure::new().type_tag("Order").property("Id", 5);
        let rendered = template.render(&props(&[("Order", order.into()), ("0", 1.into())]));
        assert_eq!(rendered, "Order { Id: 5 } #1");
    }

    #[test]
    fn alignment_pads_with_spaces() {
        let template = MessageTemplate::new("[{Id,4}] [{Id,-4}]");
        let rendered = template.render(&props(&[("Id", 7.into())]));
        assert_eq!(rendered, "[   7] [7   ]");
    }

    #[test]
    fn provider_formats_scalars_first() {
        #[derive(Debug)]
        struct Upper;

        impl FormatProvider for Upper {
            fn format(&self, value: &Scalar, format: Option<&str>) -> Option<String> {
                match (value, format) {
                    (Scalar::String(s), Some("u")) => Some(s.to_uppercase()),
                    _ => None,
                }
            }
        }

        let template = MessageTemplate::new("{Name:u} and {Name}");
        let rendered = template.render_with(&props(&[("Name", "ok".into())]), Some(&Upper));
        assert_eq!(rendered, r#"OK and "ok""#);
    }
}
