use crate::ast::{BinaryOp, Expr};
use crate::error::EvalError;
use crate::lexer::{Lexer, Token, TokenWithPos};

// ── Parser ────────────────────────────────────────────────────────────────

/// Recursive-descent parser for
///
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := factor (('*' | '/') factor)*
/// factor := ('+' | '-') factor | '(' expr ')' | number | identifier
/// ```
pub struct Parser {
    tokens: Vec<TokenWithPos>,
    pos: usize,
    /// Open unary signs and parentheses around the current token.
    nesting: usize,
}

/// Deepest expression tree the parser will build. Both parse recursion and
/// every later walk over the tree stay within this bound.
pub const MAX_DEPTH: usize = 256;

/// A subtree together with its height.
struct Parsed {
    expr: Expr,
    depth: usize,
}

impl Parsed {
    fn leaf(expr: Expr) -> Self {
        Self { expr, depth: 1 }
    }
}

fn too_deep(offset: usize) -> EvalError {
    EvalError::at("expression nested too deeply", offset)
}

impl Parser {
    pub fn new(tokens: Vec<TokenWithPos>) -> Self {
        Self { tokens, pos: 0, nesting: 0 }
    }

    fn current_offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.offset)
            .unwrap_or(0)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos)
            .map(|t| t.token.clone())
            .unwrap_or(Token::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, msg: impl Into<String>) -> EvalError {
        EvalError::at(msg, self.current_offset())
    }

    /// Parses a complete expression; trailing tokens are an error.
    pub fn parse_complete(&mut self) -> Result<Expr, EvalError> {
        if self.peek() == &Token::Eof {
            return Err(self.err("empty expression"));
        }
        let parsed = self.parse_expr()?;
        match self.peek() {
            Token::Eof => Ok(parsed.expr),
            tok => Err(self.err(format!("unexpected trailing input {:?}", tok))),
        }
    }

    fn binary(op: BinaryOp, lhs: Parsed, rhs: Parsed, offset: usize) -> Result<Parsed, EvalError> {
        let depth = lhs.depth.max(rhs.depth) + 1;
        if depth > MAX_DEPTH {
            return Err(too_deep(offset));
        }
        let expr = Expr::Binary { op, lhs: Box::new(lhs.expr), rhs: Box::new(rhs.expr) };
        Ok(Parsed { expr, depth })
    }

    // ── Grammar ───────────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Parsed, EvalError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Token::Plus  => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            let offset = self.current_offset();
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Self::binary(op, lhs, rhs, offset)?;
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Parsed, EvalError> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                Token::Star  => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => break,
            };
            let offset = self.current_offset();
            self.advance();
            let rhs = self.parse_factor()?;
            lhs = Self::binary(op, lhs, rhs, offset)?;
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Parsed, EvalError> {
        let offset = self.current_offset();
        match self.advance() {
            Token::Plus => self.nested(offset, Self::parse_factor),
            Token::Minus => {
                let inner = self.nested(offset, Self::parse_factor)?;
                if inner.depth >= MAX_DEPTH {
                    return Err(too_deep(offset));
                }
                Ok(Parsed { expr: Expr::Neg(Box::new(inner.expr)), depth: inner.depth + 1 })
            }
            Token::LParen => {
                let inner = self.nested(offset, Self::parse_expr)?;
                match self.advance() {
                    Token::RParen => Ok(inner),
                    tok => Err(self.err(format!("expected ')', got {:?}", tok))),
                }
            }
            Token::Number(n) => Ok(Parsed::leaf(Expr::Number(n))),
            Token::Ident(name) => Ok(Parsed::leaf(Expr::Ident { name, offset })),
            Token::Eof => Err(EvalError::at("unexpected end of expression", offset)),
            tok => Err(EvalError::at(format!("expected a number, identifier or '(', got {:?}", tok), offset)),
        }
    }

    /// Runs `inner` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested(
        &mut self,
        offset: usize,
        inner: fn(&mut Self) -> Result<Parsed, EvalError>,
    ) -> Result<Parsed, EvalError> {
        if self.nesting >= MAX_DEPTH {
            return Err(too_deep(offset));
        }
        self.nesting += 1;
        let result = inner(self);
        self.nesting -= 1;
        result
    }
}

// ── Public entry points ───────────────────────────────────────────────────

/// Parse an expression source string into an [`Expr`].
///
/// Leading and trailing whitespace is ignored; everything in between must be
/// consumed by the grammar.
pub fn parse(src: &str) -> Result<Expr, EvalError> {
    let tokens = Lexer::new(src.trim()).tokenize()?;
    Parser::new(tokens).parse_complete()
}
