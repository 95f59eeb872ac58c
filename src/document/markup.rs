//! Markup front-end: elements with quoted attributes, read into [`Node`]s.
//!
//! Text content is ignored. Comments, processing instructions, `<!DOCTYPE>`
//! and CDATA sections are skipped. Mismatched or missing closing tags are
//! logged and repaired, so a damaged document still yields the elements that
//! could be read.

use crate::error::MarkupError;

use super::Node;

/// Reads the root element of `src`. Several top-level elements are wrapped in
/// an unnamed root.
pub fn parse(src: &str) -> Result<Node, MarkupError> {
    let mut reader = Reader::new(src);
    reader.run()?;
    let Reader { mut roots, .. } = reader;
    match roots.len() {
        0 => Err(MarkupError {
            message: "no root element".to_string(),
            line: 1,
            col: 1,
        }),
        1 => Ok(roots.remove(0)),
        _ => {
            log::debug!("Markup has {} top-level elements", roots.len());
            Ok(Node {
                children: roots,
                ..Node::default()
            })
        }
    }
}

struct Reader<'s> {
    src: &'s str,
    pos: usize,
    open: Vec<Node>,
    roots: Vec<Node>,
}

impl<'s> Reader<'s> {
    fn new(src: &'s str) -> Self {
        Self {
            src,
            pos: 0,
            open: Vec::new(),
            roots: Vec::new(),
        }
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn error(&self, message: impl Into<String>) -> MarkupError {
        let before = &self.src[..self.pos];
        let line = before.matches('\n').count() + 1;
        let col = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        MarkupError {
            message: message.into(),
            line,
            col,
        }
    }

    /// Moves past `terminator`. Returns false, at end of input, if it never appears.
    fn skip_past(&mut self, terminator: &str) -> bool {
        match self.rest().find(terminator) {
            Some(i) => {
                self.pos += i + terminator.len();
                true
            }
            None => {
                self.pos = self.src.len();
                false
            }
        }
    }

    fn run(&mut self) -> Result<(), MarkupError> {
        while let Some(start) = self.rest().find('<') {
            self.pos += start;
            let rest = self.rest();
            let skipped = if rest.starts_with("<!--") {
                Some(("-->", "comment"))
            } else if rest.starts_with("<![CDATA[") {
                Some(("]]>", "CDATA section"))
            } else if rest.starts_with("<?") {
                Some(("?>", "processing instruction"))
            } else if rest.starts_with("<!") {
                Some((">", "declaration"))
            } else {
                None
            };

            match skipped {
                Some((terminator, what)) => {
                    if !self.skip_past(terminator) {
                        log::warn!("{}", self.error(format!("unterminated {what}")));
                    }
                }
                None if rest.starts_with("</") => self.close_tag()?,
                None => self.open_tag()?,
            }
        }

        while let Some(node) = self.open.pop() {
            log::warn!("{}", self.error(format!("<{}> is never closed", node.name)));
            self.attach(node);
        }
        Ok(())
    }

    fn attach(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn name(&mut self) -> &'s str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')) {
            self.advance();
        }
        &self.src[start..self.pos]
    }

    fn open_tag(&mut self) -> Result<(), MarkupError> {
        self.advance(); // `<`
        let name = self.name();
        if name.is_empty() {
            return Err(self.error("expected an element name after `<`"));
        }
        let mut node = Node::new(name);

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                self.attach(node);
                return Ok(());
            }
            if rest.starts_with('>') {
                self.pos += 1;
                self.open.push(node);
                return Ok(());
            }
            if rest.is_empty() {
                return Err(self.error(format!("<{name}> is cut off")));
            }

            let key = self.name();
            if key.is_empty() {
                let bad = self.advance();
                log::warn!("{}", self.error(format!("unexpected {bad:?} in <{name}>")));
                continue;
            }
            let value = self.attribute_value(name, key)?;
            if node.props.contains_key(key) {
                log::warn!("{}", self.error(format!("duplicate attribute {key} on <{name}>, keeping the first")));
            } else {
                node.props.insert(key.to_string(), value);
            }
        }
    }

    fn attribute_value(&mut self, tag: &str, key: &str) -> Result<String, MarkupError> {
        self.skip_whitespace();
        if self.peek() != Some('=') {
            log::warn!("{}", self.error(format!("attribute {key} on <{tag}> has no value")));
            return Ok(String::new());
        }
        self.advance();
        self.skip_whitespace();

        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let rest = self.rest();
                let Some(end) = rest.find(quote) else {
                    return Err(self.error(format!("unterminated value for {key} on <{tag}>")));
                };
                self.pos += end + 1;
                Ok(decode_entities(&rest[..end]))
            }
            _ => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if !c.is_whitespace() && c != '>' && c != '/') {
                    self.advance();
                }
                log::warn!("{}", self.error(format!("unquoted value for {key} on <{tag}>")));
                Ok(decode_entities(&self.src[start..self.pos]))
            }
        }
    }

    fn close_tag(&mut self) -> Result<(), MarkupError> {
        self.pos += 2; // `</`
        let name = self.name();
        self.skip_whitespace();
        if self.advance() != Some('>') {
            return Err(self.error(format!("malformed closing tag </{name}>")));
        }

        let Some(depth) = self.open.iter().rposition(|n| n.name.eq_ignore_ascii_case(name)) else {
            log::warn!("{}", self.error(format!("</{name}> closes nothing")));
            return Ok(());
        };
        while self.open.len() > depth + 1 {
            if let Some(node) = self.open.pop() {
                log::warn!("{}", self.error(format!("<{}> closed by </{name}>", node.name)));
                self.attach(node);
            }
        }
        if let Some(node) = self.open.pop() {
            self.attach(node);
        }
        Ok(())
    }
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|end| {
            let entity = &rest[1..end];
            let ch = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(Result::ok)
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let root = parse(
            r#"<?xml version="1.0"?>
            <!-- a scene -->
            <scene>
                <box w="2" h='3'>
                    <color r="1" g="0" b="0"/>
                    some ignored text
                </box>
                <plane/>
            </scene>"#,
        )
        .unwrap();

        assert_eq!(root.name, "scene");
        assert_eq!(root.children.len(), 2);
        let cube = &root.children[0];
        assert_eq!(cube.get("w"), Some("2"));
        assert_eq!(cube.get("h"), Some("3"));
        assert_eq!(cube.children[0].name, "color");
        assert_eq!(root.children[1].name, "plane");
    }

    #[test]
    fn test_entities_are_decoded() {
        let root = parse(r#"<shader vertex="a&amp;b&lt;&#65;&#x42;&bogus;.vs"/>"#).unwrap();
        assert_eq!(root.get("vertex"), Some("a&b<AB&bogus;.vs"));
    }

    #[test]
    fn test_close_tags_match_case_insensitively() {
        let root = parse("<Scene><Box></BOX></scene>").unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "Box");
    }

    #[test_log::test]
    fn test_unclosed_elements_are_repaired() {
        let root = parse("<scene><box><color r=\"0.5\"></scene>").unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].children[0].get("r"), Some("0.5"));

        let root = parse("<scene><box w=\"4\">").unwrap();
        assert_eq!(root.children[0].get("w"), Some("4"));
    }

    #[test_log::test]
    fn test_lenient_attributes() {
        let root = parse("<box w=2 h d=\"1\" d=\"9\"/>").unwrap();
        assert_eq!(root.get("w"), Some("2"));
        assert_eq!(root.get("h"), Some(""));
        assert_eq!(root.get("d"), Some("1"));
    }

    #[test]
    fn test_multiple_roots_are_wrapped() {
        let root = parse("<box/><cone/>").unwrap();
        assert_eq!(root.name, "");
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn test_errors_carry_position() {
        let err = parse("<scene>\n  <box w=\"1").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unterminated"));

        assert!(parse("just text").is_err());
        assert!(parse("<!-- only a comment -->").is_err());
    }
}
