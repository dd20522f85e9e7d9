//! CSS selector subset used by the markup contract
//!
//! Supported: type and universal selectors, `#id`, `.class`, `[attr]`,
//! `[attr=value]` (quoted or bare), descendant and child combinators, and
//! comma-separated selector lists.

use std::fmt;

use super::{Document, NodeId};

/// Errors from parsing a selector string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// Nothing to match (empty string or dangling combinator)
    Empty(String),
    /// A character that cannot start or continue a selector
    Unexpected {
        selector: String,
        found: char,
        position: usize,
    },
    /// Attribute selector or quoted value without its closing delimiter
    Unterminated(String),
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty(selector) => write!(f, "empty selector: {:?}", selector),
            Self::Unexpected {
                selector,
                found,
                position,
            } => write!(
                f,
                "unexpected {:?} at position {} in selector {:?}",
                found, position, selector
            ),
            Self::Unterminated(selector) => write!(f, "unterminated selector: {:?}", selector),
        }
    }
}

impl std::error::Error for SelectorError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(element) = doc.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if element.tag != *tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| doc.has_class(node, c)) {
            return false;
        }
        self.attrs.iter().all(|a| match (element.attr(&a.name), &a.value) {
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
            (None, _) => false,
        })
    }
}

/// A compound chain: `compounds[i]` is joined to `compounds[i + 1]` by `combinators[i]`
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

impl Complex {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.matches_at(doc, self.compounds.len() - 1, node)
    }

    fn matches_at(&self, doc: &Document, index: usize, node: NodeId) -> bool {
        if !self.compounds[index].matches(doc, node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => doc
                .parent_element(node)
                .map(|parent| self.matches_at(doc, index - 1, parent))
                .unwrap_or(false),
            Combinator::Descendant => {
                let mut ancestor = doc.parent_element(node);
                while let Some(candidate) = ancestor {
                    if self.matches_at(doc, index - 1, candidate) {
                        return true;
                    }
                    ancestor = doc.parent_element(candidate);
                }
                false
            }
        }
    }
}

/// A parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut cursor = Cursor {
            source,
            chars: source.chars().collect(),
            pos: 0,
        };
        let mut alternatives = Vec::new();
        loop {
            cursor.skip_whitespace();
            alternatives.push(cursor.complex()?);
            cursor.skip_whitespace();
            match cursor.peek() {
                None => break,
                Some(',') => cursor.pos += 1,
                Some(found) => return Err(cursor.unexpected(found)),
            }
        }
        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    /// Whether the element `node` matches any alternative of the list
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives.iter().any(|c| c.matches(doc, node))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

struct Cursor<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn unexpected(&self, found: char) -> SelectorError {
        SelectorError::Unexpected {
            selector: self.source.to_string(),
            found,
            position: self.pos,
        }
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_space => combinators.push(Combinator::Descendant),
                Some(found) => return Err(self.unexpected(found)),
            }
            compounds.push(self.compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut matched_any = false;

        match self.peek() {
            Some('*') => {
                self.pos += 1;
                matched_any = true;
            }
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
                matched_any = true;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.attribute()?);
                }
                _ => break,
            }
            matched_any = true;
        }

        if matched_any {
            Ok(compound)
        } else {
            match self.peek() {
                Some(found) => Err(self.unexpected(found)),
                None => Err(SelectorError::Empty(self.source.to_string())),
            }
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return match self.peek() {
                Some(found) => Err(self.unexpected(found)),
                None => Err(SelectorError::Empty(self.source.to_string())),
            };
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn attribute(&mut self) -> Result<AttrMatch, SelectorError> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        let value = match self.peek() {
            Some(']') => None,
            Some('=') => {
                self.pos += 1;
                self.skip_whitespace();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.pos += 1;
                        let start = self.pos;
                        while self.peek().is_some_and(|c| c != quote) {
                            self.pos += 1;
                        }
                        if self.peek().is_none() {
                            return Err(SelectorError::Unterminated(self.source.to_string()));
                        }
                        let value: String = self.chars[start..self.pos].iter().collect();
                        self.pos += 1;
                        value
                    }
                    _ => self.ident()?,
                };
                self.skip_whitespace();
                Some(value)
            }
            Some(found) => return Err(self.unexpected(found)),
            None => return Err(SelectorError::Unterminated(self.source.to_string())),
        };
        match self.peek() {
            Some(']') => {
                self.pos += 1;
                Ok(AttrMatch { name, value })
            }
            Some(found) => Err(self.unexpected(found)),
            None => Err(SelectorError::Unterminated(self.source.to_string())),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse(
            r##"<main id="feed">
                <article class="card" data-post="1">
                    <form class="comment-form js-ajax" data-target="#comments-1"><input name="comment"></form>
                    <ul id="comments-1"><li data-comment="9"><a class="js-delete" data-url="/api/comments/9">x</a></li></ul>
                </article>
                <div id="search_results"></div>
            </main>"##,
        )
    }

    fn count(doc: &Document, selector: &str) -> usize {
        doc.query_selector_all(selector).unwrap().len()
    }

    #[test]
    fn test_simple_selectors() {
        let doc = doc();
        assert_eq!(count(&doc, "form"), 1);
        assert_eq!(count(&doc, "#search_results"), 1);
        assert_eq!(count(&doc, ".js-ajax"), 1);
        assert_eq!(count(&doc, "form.comment-form.js-ajax"), 1);
        assert_eq!(count(&doc, "form.js-search"), 0);
        assert_eq!(count(&doc, "*"), 8);
    }

    #[test]
    fn test_attribute_selectors() {
        let doc = doc();
        assert_eq!(count(&doc, "[data-post]"), 1);
        assert_eq!(count(&doc, "[data-post=\"1\"]"), 1);
        assert_eq!(count(&doc, "[data-post='2']"), 0);
        assert_eq!(count(&doc, "[data-comment=9]"), 1);
        assert_eq!(count(&doc, "[data-post], [data-comment]"), 2);
    }

    #[test]
    fn test_combinators() {
        let doc = doc();
        assert_eq!(count(&doc, "#feed .js-delete"), 1);
        assert_eq!(count(&doc, "article > ul > li"), 1);
        assert_eq!(count(&doc, "main > li"), 0);
        assert_eq!(count(&doc, "article input"), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Selector::parse(""), Err(SelectorError::Empty(_))));
        assert!(matches!(Selector::parse("a >"), Err(SelectorError::Empty(_))));
        assert!(matches!(
            Selector::parse("[data-post"),
            Err(SelectorError::Unterminated(_))
        ));
        assert!(matches!(
            Selector::parse("div!"),
            Err(SelectorError::Unexpected { found: '!', .. })
        ));
    }

    #[test]
    fn test_display_keeps_source() {
        let selector: Selector = " .js-like ".parse().unwrap();
        assert_eq!(selector.to_string(), ".js-like");
    }
}
