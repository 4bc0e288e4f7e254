use formula_resolver_model::ColumnId;
use std::fmt;

/// A single- or two-character operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpToken {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl fmt::Display for OpToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpToken::Plus => "+",
            OpToken::Minus => "-",
            OpToken::Star => "*",
            OpToken::Slash => "/",
            OpToken::Percent => "%",
            OpToken::Amp => "&",
            OpToken::Eq => "=",
            OpToken::Ne => "<>",
            OpToken::Lt => "<",
            OpToken::Gt => ">",
            OpToken::Le => "<=",
            OpToken::Ge => ">=",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Bool(bool),
    /// `{column}` or `{column#subfield}`. Contents are opaque and trimmed.
    ColumnRef {
        column: ColumnId,
        subfield: Option<String>,
    },
    /// A function name, matched case-insensitively by the parser.
    Ident(String),
    Op(OpToken),
    LParen,
    RParen,
    Comma,
}

impl Token {
    /// Whether this token can end an operand. Decides if a following `-`
    /// starts a negative number literal or is an operator.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Number(_)
                | Token::Str(_)
                | Token::Bool(_)
                | Token::ColumnRef { .. }
                | Token::Ident(_)
                | Token::RParen
        )
    }
}

/// A token together with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub position: usize,
}

/// A recovery note emitted by the tokenizer for malformed input it repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWarning {
    pub position: usize,
    pub message: String,
}

/// The tokenizer's output: the scanned tokens and any recovery warnings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    pub tokens: Vec<SpannedToken>,
    pub warnings: Vec<TokenWarning>,
}

/// Scans a formula string. Never fails: unterminated strings and column
/// references yield best-effort tokens plus a warning, and characters outside
/// the language are skipped with a warning.
pub fn tokenize(input: &str) -> TokenStream {
    let mut stream = TokenStream::default();
    let bytes = input.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let start = pos;
        let c = bytes[pos];
        match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
            }
            b'(' => {
                stream.push(Token::LParen, start);
                pos += 1;
            }
            b')' => {
                stream.push(Token::RParen, start);
                pos += 1;
            }
            b',' => {
                stream.push(Token::Comma, start);
                pos += 1;
            }
            b'"' | b'\'' => {
                pos = scan_string(input, pos, &mut stream);
            }
            b'{' => {
                pos = scan_column_ref(input, pos, &mut stream);
            }
            b'0'..=b'9' => {
                pos = scan_number(input, pos, false, &mut stream);
            }
            b'-' => {
                let negative_literal = !stream.last_ends_operand()
                    && matches!(bytes.get(pos + 1), Some(b'0'..=b'9'));
                if negative_literal {
                    pos = scan_number(input, pos + 1, true, &mut stream);
                } else {
                    stream.push(Token::Op(OpToken::Minus), start);
                    pos += 1;
                }
            }
            b'+' => {
                stream.push(Token::Op(OpToken::Plus), start);
                pos += 1;
            }
            b'*' => {
                stream.push(Token::Op(OpToken::Star), start);
                pos += 1;
            }
            b'/' => {
                stream.push(Token::Op(OpToken::Slash), start);
                pos += 1;
            }
            b'%' => {
                stream.push(Token::Op(OpToken::Percent), start);
                pos += 1;
            }
            b'&' => {
                stream.push(Token::Op(OpToken::Amp), start);
                pos += 1;
            }
            b'=' => {
                stream.push(Token::Op(OpToken::Eq), start);
                pos += 1;
            }
            b'<' => match bytes.get(pos + 1) {
                Some(b'=') => {
                    stream.push(Token::Op(OpToken::Le), start);
                    pos += 2;
                }
                Some(b'>') => {
                    stream.push(Token::Op(OpToken::Ne), start);
                    pos += 2;
                }
                _ => {
                    stream.push(Token::Op(OpToken::Lt), start);
                    pos += 1;
                }
            },
            b'>' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    stream.push(Token::Op(OpToken::Ge), start);
                    pos += 2;
                } else {
                    stream.push(Token::Op(OpToken::Gt), start);
                    pos += 1;
                }
            }
            _ if c.is_ascii_alphabetic() || c == b'_' => {
                pos = scan_identifier(input, pos, &mut stream);
            }
            _ => {
                // Outside the language. Skip the whole character, which may
                // be multi-byte.
                let ch_len = input[pos..].chars().next().map_or(1, char::len_utf8);
                stream.warnings.push(TokenWarning {
                    position: start,
                    message: format!("unexpected character {:?}", &input[pos..pos + ch_len]),
                });
                pos += ch_len;
            }
        }
    }

    stream
}

impl TokenStream {
    fn push(&mut self, token: Token, position: usize) {
        self.tokens.push(SpannedToken { token, position });
    }

    fn last_ends_operand(&self) -> bool {
        self.tokens
            .last()
            .is_some_and(|spanned| spanned.token.ends_operand())
    }
}

fn scan_number(input: &str, digits_start: usize, negative: bool, stream: &mut TokenStream) -> usize {
    let bytes = input.as_bytes();
    let mut pos = digits_start;
    let mut saw_dot = false;
    while pos < bytes.len() {
        match bytes[pos] {
            b'0'..=b'9' => pos += 1,
            b'.' if !saw_dot && matches!(bytes.get(pos + 1), Some(b'0'..=b'9')) => {
                saw_dot = true;
                pos += 1;
            }
            _ => break,
        }
    }
    let token_start = if negative { digits_start - 1 } else { digits_start };
    let text = &input[digits_start..pos];
    let mut value: f64 = text.parse().unwrap_or(0.0);
    if negative {
        value = -value;
    }
    stream.push(Token::Number(value), token_start);
    pos
}

fn scan_string(input: &str, start: usize, stream: &mut TokenStream) -> usize {
    let bytes = input.as_bytes();
    let quote = bytes[start];
    let mut value = String::new();
    let mut pos = start + 1;
    loop {
        match bytes.get(pos) {
            None => {
                stream.warnings.push(TokenWarning {
                    position: start,
                    message: "unterminated string literal".to_owned(),
                });
                break;
            }
            Some(&c) if c == quote => {
                pos += 1;
                break;
            }
            Some(b'\\') => match bytes.get(pos + 1) {
                Some(&next) if next == quote || next == b'\\' => {
                    value.push(next as char);
                    pos += 2;
                }
                _ => {
                    value.push('\\');
                    pos += 1;
                }
            },
            Some(_) => {
                let ch = input[pos..].chars().next().unwrap_or('\u{fffd}');
                value.push(ch);
                pos += ch.len_utf8();
            }
        }
    }
    stream.push(Token::Str(value), start);
    pos
}

fn scan_column_ref(input: &str, start: usize, stream: &mut TokenStream) -> usize {
    let rest = &input[start + 1..];
    let (contents, consumed) = match rest.find('}') {
        Some(close) => (&rest[..close], start + 1 + close + 1),
        None => {
            stream.warnings.push(TokenWarning {
                position: start,
                message: "unterminated column reference".to_owned(),
            });
            (rest, input.len())
        }
    };
    let (column, subfield) = match contents.split_once('#') {
        Some((col, sub)) => (col.trim(), Some(sub.trim().to_owned())),
        None => (contents.trim(), None),
    };
    stream.push(
        Token::ColumnRef {
            column: ColumnId::new(column),
            subfield,
        },
        start,
    );
    consumed
}

fn scan_identifier(input: &str, start: usize, stream: &mut TokenStream) -> usize {
    let bytes = input.as_bytes();
    let mut pos = start;
    while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
        pos += 1;
    }
    let name = &input[start..pos];
    let token = if name.eq_ignore_ascii_case("true") {
        Token::Bool(true)
    } else if name.eq_ignore_ascii_case("false") {
        Token::Bool(false)
    } else {
        Token::Ident(name.to_owned())
    };
    stream.push(token, start);
    pos
}
