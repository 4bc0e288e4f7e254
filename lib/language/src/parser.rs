use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::token::{tokenize, OpToken, SpannedToken, Token, TokenStream};
use formula_resolver_model::{ParseError, Scalar};

/// Unary minus binds tighter than any binary operator.
const UNARY_BINDING: u8 = 50;

fn binding_power(op: OpToken) -> u8 {
    match op {
        OpToken::Amp => 40,
        OpToken::Star | OpToken::Slash | OpToken::Percent => 30,
        OpToken::Plus | OpToken::Minus => 20,
        OpToken::Eq | OpToken::Ne | OpToken::Lt | OpToken::Gt | OpToken::Le | OpToken::Ge => 10,
    }
}

fn binary_operator(op: OpToken) -> BinaryOperator {
    match op {
        OpToken::Plus => BinaryOperator::Add,
        OpToken::Minus => BinaryOperator::Subtract,
        OpToken::Star => BinaryOperator::Multiply,
        OpToken::Slash => BinaryOperator::Divide,
        OpToken::Percent => BinaryOperator::Modulo,
        OpToken::Amp => BinaryOperator::Concat,
        OpToken::Eq => BinaryOperator::Eq,
        OpToken::Ne => BinaryOperator::Ne,
        OpToken::Lt => BinaryOperator::Lt,
        OpToken::Gt => BinaryOperator::Gt,
        OpToken::Le => BinaryOperator::Le,
        OpToken::Ge => BinaryOperator::Ge,
    }
}

/// Parses a formula string into an expression tree.
///
/// Empty input (after tokenization) parses to an empty string literal, the
/// value an empty formula resolves to.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    parse_stream(&tokenize(input))
}

/// Parses an already tokenized stream. Callers that want the tokenizer's
/// recovery warnings tokenize first and hand the stream over.
pub fn parse_stream(stream: &TokenStream) -> Result<Expr, ParseError> {
    if stream.tokens.is_empty() {
        return Ok(Expr::Literal(Scalar::text("")));
    }
    let mut parser = Parser {
        tokens: &stream.tokens,
        cursor: 0,
    };
    let expr = parser.expression(0)?;
    parser.expect_end()?;
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [SpannedToken],
    cursor: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.cursor).map(|s| &s.token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .or_else(|| self.tokens.last())
            .map_or(0, |s| s.position)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.cursor).map(|s| &s.token);
        self.cursor += 1;
        token
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.position(), message)
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(Token::RParen) => Err(self.error("unbalanced closing parenthesis")),
            Some(token) => Err(self.error(format!("unexpected token {token:?}"))),
        }
    }

    fn expression(&mut self, min_binding: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.prefix()?;
        while let Some(&Token::Op(op)) = self.peek() {
            let binding = binding_power(op);
            if binding <= min_binding {
                break;
            }
            self.cursor += 1;
            let rhs = self.expression(binding)?;
            lhs = Expr::binary(binary_operator(op), lhs, rhs);
        }
        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.advance() else {
            return Err(self.error("unexpected end of formula"));
        };
        match token.clone() {
            Token::Number(n) => Ok(Expr::Literal(Scalar::Number(n))),
            Token::Str(s) => Ok(Expr::Literal(Scalar::Text(s))),
            Token::Bool(b) => {
                // TRUE/FALSE are also accepted in call form: TRUE().
                self.swallow_empty_parens()?;
                Ok(Expr::Literal(Scalar::Bool(b)))
            }
            Token::ColumnRef { column, subfield } => Ok(Expr::ColumnRef { column, subfield }),
            Token::Ident(name) => self.call_or_niladic(name),
            Token::Op(OpToken::Minus) => {
                let operand = self.expression(UNARY_BINDING)?;
                Ok(Expr::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                })
            }
            Token::LParen => {
                let inner = self.expression(0)?;
                self.expect_rparen()?;
                Ok(inner)
            }
            other => Err(self.error(format!("unexpected token {other:?}"))),
        }
    }

    /// `NAME(args)` for any identifier. A bare `NAME` parses as an
    /// argument-less call, which covers the niladic builtins (`PI`, `TODAY`,
    /// `NOW`) and tolerates unknown identifiers, which the evaluator degrades
    /// to empty.
    fn call_or_niladic(&mut self, name: String) -> Result<Expr, ParseError> {
        let upper = name.to_ascii_uppercase();
        if self.peek() != Some(&Token::LParen) {
            return Ok(Expr::FunctionCall {
                name: upper,
                args: Vec::new(),
            });
        }
        self.cursor += 1;
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.cursor += 1;
            return Ok(Expr::FunctionCall { name: upper, args });
        }
        loop {
            args.push(self.expression(0)?);
            match self.advance() {
                Some(Token::Comma) => {}
                Some(Token::RParen) => break,
                Some(token) => {
                    let token = token.clone();
                    return Err(self.error(format!(
                        "expected ',' or ')' in argument list, found {token:?}"
                    )));
                }
                None => return Err(self.error("unclosed argument list")),
            }
        }
        Ok(Expr::FunctionCall { name: upper, args })
    }

    fn swallow_empty_parens(&mut self) -> Result<(), ParseError> {
        if self.peek() == Some(&Token::LParen) {
            self.cursor += 1;
            self.expect_rparen()?;
        }
        Ok(())
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            Some(token) => {
                let token = token.clone();
                Err(self.error(format!("expected ')', found {token:?}")))
            }
            None => Err(self.error("missing closing parenthesis")),
        }
    }
}
