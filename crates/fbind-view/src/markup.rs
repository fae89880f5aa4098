#![forbid(unsafe_code)]

//! A small markup reader for templates.
//!
//! Covers the subset templates are written in: elements, text, quoted,
//! unquoted and boolean attributes, void and self-closing elements. Whitespace-only text is dropped. No entity decoding
//! beyond `&lt; &gt; &amp; &quot;`, no raw-text elements, no error recovery.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unbalanced tags | `</b>` closes `<i>` | `MismatchedClose` |
//! | Truncated input | EOF inside a tag or before a close | `UnexpectedEof` / `Unclosed` |
//! | No element | Only text/whitespace at top level | `NoRoot` |
//! | Several elements | `parse` needs exactly one root | `MultipleRoots` |

use thiserror::Error;

use crate::node::{Node, NodeKind, ViewNode, VOID_ELEMENTS};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("expected a tag name at byte {offset}")]
    EmptyTagName { offset: usize },

    #[error("closing tag </{found}> at byte {offset} does not match <{expected}>")]
    MismatchedClose {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("element <{tag}> is never closed")]
    Unclosed { tag: String },

    #[error("template has no root element")]
    NoRoot,

    #[error("template has {count} root elements; expected one")]
    MultipleRoots { count: usize },
}

/// Parse a template with exactly one root element.
///
/// ```
/// use fbind_view::markup;
///
/// let root = markup::parse(r#"<div id="app"><p>{{msg}}</p></div>"#).unwrap();
/// assert_eq!(root.to_markup(), r#"<div id="app"><p>{{msg}}</p></div>"#);
/// ```
pub fn parse(source: &str) -> Result<Node, MarkupError> {
    let mut nodes = parse_fragment(source)?;
    match nodes.len() {
        0 => Err(MarkupError::NoRoot),
        1 if nodes[0].kind() == NodeKind::Element => Ok(nodes.remove(0)),
        1 => Err(MarkupError::NoRoot),
        count => Err(MarkupError::MultipleRoots { count }),
    }
}

/// Parse a sequence of top-level nodes.
pub fn parse_fragment(source: &str) -> Result<Vec<Node>, MarkupError> {
    let mut reader = Reader { src: source, pos: 0 };
    // Index 0 is the top-level holder and has no element.
    let mut stack = vec![Open {
        element: None,
        children: Vec::new(),
    }];

    while !reader.at_end() {
        if reader.starts_with("</") {
            let offset = reader.pos;
            reader.pos += 2;
            let found = reader.read_name();
            reader.skip_ws();
            reader.expect('>', "closing tag")?;
            let expected = stack
                .last()
                .and_then(|open| open.element.as_ref())
                .map(Node::tag);
            if expected.as_deref() != Some(found.as_str()) {
                return Err(MarkupError::MismatchedClose {
                    expected: expected.unwrap_or_default(),
                    found,
                    offset,
                });
            }
            if let Some(Open {
                element: Some(element),
                children,
            }) = stack.pop()
            {
                element.append_children(children);
                push_child(&mut stack, element);
            }
        } else if reader.starts_with("<") {
            let (element, self_closing) = reader.read_open_tag()?;
            if self_closing || VOID_ELEMENTS.contains(&element.tag().as_str()) {
                push_child(&mut stack, element);
            } else {
                stack.push(Open {
                    element: Some(element),
                    children: Vec::new(),
                });
            }
        } else {
            let text = reader.read_text();
            if !text.trim().is_empty() {
                push_child(&mut stack, Node::text_node(decode(text)));
            }
        }
    }

    match stack.pop() {
        Some(Open {
            element: Some(el), ..
        }) => Err(MarkupError::Unclosed { tag: el.tag() }),
        Some(Open { children, .. }) => Ok(children),
        None => Ok(Vec::new()),
    }
}

struct Open {
    element: Option<Node>,
    children: Vec<Node>,
}

fn push_child(stack: &mut [Open], node: Node) {
    if let Some(open) = stack.last_mut() {
        open.children.push(node);
    }
}

fn decode(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, c: char, context: &'static str) -> Result<(), MarkupError> {
        match self.bump() {
            Some(found) if found == c => Ok(()),
            _ => Err(MarkupError::UnexpectedEof { context }),
        }
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn read_name(&mut self) -> String {
        self.read_while(|c| !c.is_whitespace() && !matches!(c, '>' | '/' | '=' | '"' | '\''))
            .to_ascii_lowercase()
    }

    fn read_text(&mut self) -> &'a str {
        self.read_while(|c| c != '<')
    }

    /// Reads `<tag attrs...>` or `<tag attrs.../>`.
    fn read_open_tag(&mut self) -> Result<(Node, bool), MarkupError> {
        let offset = self.pos;
        self.pos += 1;
        let tag = self.read_name();
        if tag.is_empty() {
            return Err(MarkupError::EmptyTagName { offset });
        }
        let element = Node::element(tag);
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(MarkupError::UnexpectedEof { context: "tag" }),
                Some('>') => {
                    self.bump();
                    return Ok((element, false));
                }
                Some('/') => {
                    self.bump();
                    self.expect('>', "self-closing tag")?;
                    return Ok((element, true));
                }
                Some(_) => {
                    if let Some((name, value)) = self.read_attribute()? {
                        element.set_attr(name, value);
                    }
                }
            }
        }
    }

    fn read_attribute(&mut self) -> Result<Option<(String, String)>, MarkupError> {
        // Attribute names keep their case (directive names are matched verbatim).
        let name = self
            .read_while(|c| !c.is_whitespace() && !matches!(c, '>' | '/' | '='))
            .to_owned();
        if name.is_empty() {
            // Stray quote or similar: consume it so the loop makes progress.
            self.bump();
            return Ok(None);
        }
        self.skip_ws();
        if self.peek() != Some('=') {
            return Ok(Some((name, String::new())));
        }
        self.bump();
        self.skip_ws();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                let value = self.read_while(|c| c != q);
                self.expect(q, "attribute value")?;
                value
            }
            Some(_) => self.read_while(|c| !c.is_whitespace() && c != '>'),
            None => return Err(MarkupError::UnexpectedEof { context: "attribute" }),
        };
        Ok(Some((name, decode(value))))
    }
}
