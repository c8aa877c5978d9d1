use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unexpected token at position {0}: {1}")]
    UnexpectedToken(usize, String),
    #[error("Unterminated string starting at position {0}")]
    UnterminatedString(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SExp {
    Atom(String),
    List(Vec<SExp>),
}

impl SExp {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExp::Atom(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExp]> {
        match self {
            SExp::List(items) => Some(items),
            _ => None,
        }
    }

    /// Leading atom of a list, e.g. `layer` for `(layer "F.Cu" ...)`.
    pub fn tag(&self) -> Option<&str> {
        self.as_list()
            .and_then(|items| items.first())
            .and_then(SExp::as_atom)
    }

    /// Child lists of this list, skipping its tag and any bare atoms.
    pub fn children(&self) -> impl Iterator<Item = &SExp> {
        self.as_list()
            .unwrap_or(&[])
            .iter()
            .filter(|item| item.as_list().is_some())
    }

    /// First child list tagged `key`.
    pub fn find(&self, key: &str) -> Option<&SExp> {
        self.children().find(|child| child.tag() == Some(key))
    }

    /// All child lists tagged `key`, in source order.
    pub fn find_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a SExp> + 'a {
        self.children().filter(move |child| child.tag() == Some(key))
    }

    /// First atom after the tag of the child list tagged `key`.
    ///
    /// `(thickness 0.035)` and `(thickness 0.035 locked)` both yield `0.035`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.find(key)
            .and_then(SExp::as_list)
            .and_then(|items| items.get(1))
            .and_then(SExp::as_atom)
    }

    /// Positional atom of this list (`0` is the tag).
    pub fn atom_at(&self, index: usize) -> Option<&str> {
        self.as_list()
            .and_then(|items| items.get(index))
            .and_then(SExp::as_atom)
    }
}

pub struct SExpParser {
    input: Vec<char>,
    pos: usize,
}

impl SExpParser {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    pub fn parse(&mut self) -> Result<SExp, ParseError> {
        self.skip_whitespace();
        if self.is_eof() {
            return Err(ParseError::UnexpectedEof);
        }
        self.parse_sexp()
    }

    fn parse_sexp(&mut self) -> Result<SExp, ParseError> {
        self.skip_whitespace();

        match self.peek() {
            None => Err(ParseError::UnexpectedEof),
            Some('(') => self.parse_list(),
            Some(')') => Err(ParseError::UnexpectedToken(
                self.pos,
                "unbalanced ')'".to_string(),
            )),
            Some('"') => self.parse_string(),
            Some(_) => self.parse_symbol(),
        }
    }

    fn parse_list(&mut self) -> Result<SExp, ParseError> {
        self.advance();
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(ParseError::UnexpectedEof),
                Some(')') => {
                    self.advance();
                    break;
                }
                Some(_) => items.push(self.parse_sexp()?),
            }
        }

        Ok(SExp::List(items))
    }

    fn parse_string(&mut self) -> Result<SExp, ParseError> {
        let start = self.pos;
        self.advance();
        let mut s = String::new();

        loop {
            let Some(ch) = self.peek() else {
                return Err(ParseError::UnterminatedString(start));
            };
            self.advance();
            match ch {
                '"' => break,
                '\\' => {
                    let Some(escaped) = self.peek() else {
                        return Err(ParseError::UnterminatedString(start));
                    };
                    self.advance();
                    s.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                }
                other => s.push(other),
            }
        }

        Ok(SExp::Atom(s))
    }

    fn parse_symbol(&mut self) -> Result<SExp, ParseError> {
        let mut s = String::new();

        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                break;
            }
            s.push(ch);
            self.advance();
        }

        Ok(SExp::Atom(s))
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}
