//! Minimal XML reader for topology documents.
//!
//! Hand-rolled character-level reader covering the subset the topology
//! format uses: the XML prolog, comments, elements with attributes, text
//! content, self-closing tags and the five predefined entities. Every
//! element remembers its source line for error reporting.

use super::ParseError;

/// One parsed element: tag name, attributes in document order, child
/// elements and accumulated text content.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub line: u64,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == tag)
    }

    pub fn first_child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == tag)
    }

    /// Trimmed text content of the element.
    pub fn text(&self) -> &str {
        self.text.trim()
    }
}

/// Parse a complete document and return its root element.
pub fn parse_document(input: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::new(input);
    reader.skip_misc()?;
    if reader.at_end() {
        return Err(reader.malformed("empty document"));
    }
    let root = reader.parse_element()?;
    reader.skip_misc()?;
    if !reader.at_end() {
        return Err(reader.malformed("trailing content after root element"));
    }
    Ok(root)
}

struct Reader {
    input: Vec<char>,
    position: usize,
    line: u64,
}

impl Reader {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        let mut index = self.position;
        for ch in prefix.chars() {
            if self.input.get(index) != Some(&ch) {
                return false;
            }
            index += 1;
        }
        true
    }

    fn skip(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip whitespace, the `<?...?>` prolog and `<!--...-->` comments.
    fn skip_misc(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<?") {
                self.skip_until("?>")?;
            } else if self.starts_with("<!--") {
                self.skip_until("-->")?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_until(&mut self, terminator: &str) -> Result<(), ParseError> {
        while !self.at_end() {
            if self.starts_with(terminator) {
                self.skip(terminator.chars().count());
                return Ok(());
            }
            self.advance();
        }
        Err(self.malformed(&format!("missing \"{terminator}\"")))
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        match self.advance() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(self.malformed(&format!("expected '{expected}', found '{ch}'"))),
            None => Err(self.malformed(&format!("expected '{expected}', found end of input"))),
        }
    }

    fn read_name(&mut self) -> Result<String, ParseError> {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.' | ':') {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.malformed("expected a name"));
        }
        Ok(name)
    }

    fn read_quoted(&mut self) -> Result<String, ParseError> {
        let quote = match self.advance() {
            Some(ch @ ('"' | '\'')) => ch,
            _ => return Err(self.malformed("expected a quoted value")),
        };
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.malformed("unterminated attribute value")),
                Some(ch) if ch == quote => {
                    self.advance();
                    return Ok(value);
                }
                Some('&') => value.push(self.read_entity()?),
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn read_entity(&mut self) -> Result<char, ParseError> {
        self.expect('&')?;
        let mut entity = String::new();
        loop {
            match self.advance() {
                None => return Err(self.malformed("unterminated entity")),
                Some(';') => break,
                Some(ch) => entity.push(ch),
            }
        }
        match entity.as_str() {
            "lt" => Ok('<'),
            "gt" => Ok('>'),
            "amp" => Ok('&'),
            "quot" => Ok('"'),
            "apos" => Ok('\''),
            other => Err(self.malformed(&format!("unknown entity \"&{other};\""))),
        }
    }

    fn parse_element(&mut self) -> Result<Element, ParseError> {
        let line = self.line;
        self.expect('<')?;
        let name = self.read_name()?;

        let mut element = Element {
            name,
            line,
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        };

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.malformed("unterminated element start tag")),
                Some('/') => {
                    self.advance();
                    self.expect('>')?;
                    return Ok(element);
                }
                Some('>') => {
                    self.advance();
                    self.parse_content(&mut element)?;
                    return Ok(element);
                }
                Some(_) => {
                    let key = self.read_name()?;
                    self.skip_whitespace();
                    self.expect('=')?;
                    self.skip_whitespace();
                    let value = self.read_quoted()?;
                    element.attributes.push((key, value));
                }
            }
        }
    }

    fn parse_content(&mut self, element: &mut Element) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                None => {
                    return Err(self.malformed(&format!("missing closing tag </{}>", element.name)))
                }
                Some('<') if self.starts_with("<!--") => self.skip_until("-->")?,
                Some('<') if self.starts_with("</") => {
                    self.skip(2);
                    let name = self.read_name()?;
                    if name != element.name {
                        return Err(self.malformed(&format!(
                            "mismatched closing tag </{}> for <{}>",
                            name, element.name
                        )));
                    }
                    self.skip_whitespace();
                    self.expect('>')?;
                    return Ok(());
                }
                Some('<') => element.children.push(self.parse_element()?),
                Some('&') => {
                    let ch = self.read_entity()?;
                    element.text.push(ch);
                }
                Some(ch) => {
                    element.text.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn malformed(&self, message: &str) -> ParseError {
        ParseError::Malformed {
            line: self.line,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let xml = r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <model name="test">
                <node name="a"/>
                <node name="b">text</node>
            </model>
        "#;

        let root = parse_document(xml).unwrap();
        assert_eq!(root.name, "model");
        assert_eq!(root.attribute("name"), Some("test"));

        let nodes: Vec<_> = root.children("node").collect();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].attribute("name"), Some("a"));
        assert_eq!(nodes[1].text(), "text");
    }

    #[test]
    fn test_lines_are_tracked() {
        let xml = "<model name=\"m\">\n  <node name=\"a\"/>\n</model>";
        let root = parse_document(xml).unwrap();
        assert_eq!(root.line, 1);
        assert_eq!(root.first_child("node").unwrap().line, 2);
    }

    #[test]
    fn test_comments_are_skipped() {
        let xml = r#"
            <!-- leading comment -->
            <model name="m">
                <!-- inner comment -->
                <node name="a"/>
            </model>
        "#;
        let root = parse_document(xml).unwrap();
        assert_eq!(root.children("node").count(), 1);
    }

    #[test]
    fn test_entities_decode() {
        let xml = r#"<model name="a &amp; b"><v>1 &lt; 2</v></model>"#;
        let root = parse_document(xml).unwrap();
        assert_eq!(root.attribute("name"), Some("a & b"));
        assert_eq!(root.first_child("v").unwrap().text(), "1 < 2");
    }

    #[test]
    fn test_error_on_unterminated_element() {
        let result = parse_document("<model name=\"m\">");
        assert!(matches!(result, Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn test_error_on_mismatched_closing_tag() {
        let result = parse_document("<model><node></model></model>");
        assert!(matches!(result, Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn test_error_on_broken_start_tag() {
        let result = parse_document("<model\n</model>");
        assert!(matches!(result, Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn test_error_on_trailing_content() {
        let result = parse_document("<model/><extra/>");
        assert!(matches!(result, Err(ParseError::Malformed { .. })));
    }
}
