use crate::error::EvalError;

// ── Token ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Ident(String),
    Number(f64),
    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    // Punctuation
    LParen,
    RParen,
    // Sentinel
    Eof,
}

/// A token paired with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithPos {
    pub token: Token,
    pub offset: usize,
}

// ── Lexer ─────────────────────────────────────────────────────────────────

pub struct Lexer<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn tokenize(mut self) -> Result<Vec<TokenWithPos>, EvalError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let offset = self.pos;
            let token = self.next_token()?;
            let eof = token == Token::Eof;
            tokens.push(TokenWithPos { token, offset });
            if eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.src[self.pos..].chars().next()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn next_token(&mut self) -> Result<Token, EvalError> {
        let ch = match self.peek() {
            None => return Ok(Token::Eof),
            Some(c) => c,
        };

        match ch {
            '+' => { self.advance(); Ok(Token::Plus) }
            '-' => { self.advance(); Ok(Token::Minus) }
            '*' => { self.advance(); Ok(Token::Star) }
            '/' => { self.advance(); Ok(Token::Slash) }
            '(' => { self.advance(); Ok(Token::LParen) }
            ')' => { self.advance(); Ok(Token::RParen) }
            c if c.is_ascii_digit() || c == '.' => self.lex_number(),
            c if c.is_alphabetic() || c == '_' => Ok(self.lex_ident()),
            other => Err(EvalError::at(format!("unexpected character {:?}", other), self.pos)),
        }
    }

    /// Decimal literal: `digits [. digits] [(e|E) [+|-] digits]`.
    ///
    /// Parsing goes through `str::parse::<f64>`, which never consults the
    /// process locale, so `0.5` means one half everywhere.
    fn lex_number(&mut self) -> Result<Token, EvalError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            let digits_start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
            if self.pos == digits_start {
                return Err(EvalError::at("exponent has no digits", start));
            }
        }
        let s = &self.src[start..self.pos];
        match s.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Token::Number(n)),
            Ok(_) => Err(EvalError::at(format!("number {:?} is out of range", s), start)),
            Err(_) => Err(EvalError::at(format!("invalid number {:?}", s), start)),
        }
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '.') {
            self.advance();
        }
        Token::Ident(self.src[start..self.pos].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn operators_and_parens() {
        assert_eq!(
            kinds("(a+b)*-c/2"),
            vec![
                Token::LParen,
                Token::Ident("a".into()),
                Token::Plus,
                Token::Ident("b".into()),
                Token::RParen,
                Token::Star,
                Token::Minus,
                Token::Ident("c".into()),
                Token::Slash,
                Token::Number(2.0),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn number_forms() {
        assert_eq!(kinds("0.25"), vec![Token::Number(0.25), Token::Eof]);
        assert_eq!(kinds(".5"), vec![Token::Number(0.5), Token::Eof]);
        assert_eq!(kinds("1e3"), vec![Token::Number(1000.0), Token::Eof]);
        assert_eq!(kinds("2.5E-1"), vec![Token::Number(0.25), Token::Eof]);
    }

    #[test]
    fn dotted_identifier() {
        assert_eq!(kinds("filter.cutoff"), vec![Token::Ident("filter.cutoff".into()), Token::Eof]);
    }

    #[test]
    fn offsets_skip_whitespace() {
        let toks = Lexer::new("  a +  1").tokenize().unwrap();
        let offsets: Vec<usize> = toks.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![2, 4, 7, 8]);
    }

    #[test]
    fn rejects_stray_character() {
        let err = Lexer::new("a % b").tokenize().unwrap_err();
        assert_eq!(err.offset, Some(2));
    }

    #[test]
    fn rejects_empty_exponent() {
        assert!(Lexer::new("1e").tokenize().is_err());
    }
}
