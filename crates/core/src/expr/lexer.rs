use crate::error::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers and keywords -- distinguished in the parser
    Word(String),
    /// Quoted string literal (content without quotes, escapes resolved)
    Str(String),
    /// Integer literal
    Int(i64),
    /// Decimal literal -- kept as string to preserve exact representation
    Float(String),
    LParen,
    RParen,
    // Comparison operators
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    // Logical operators
    And,
    Or,
    Not,
    // End of input
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub fn lex(src: &str) -> Result<Vec<Spanned>, ExprError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;

        // String literal, either quote style
        if c == '"' || c == '\'' {
            let quote = c;
            pos += 1;
            let mut s = String::new();
            loop {
                if pos >= chars.len() {
                    return Err(ExprError::lex(start, "unterminated string literal"));
                }
                let sc = chars[pos];
                if sc == quote {
                    pos += 1;
                    break;
                }
                if sc == '\\' {
                    pos += 1;
                    if pos >= chars.len() {
                        return Err(ExprError::lex(start, "unterminated escape in string"));
                    }
                    match chars[pos] {
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        other => s.push(other),
                    }
                    pos += 1;
                    continue;
                }
                s.push(sc);
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Str(s),
                offset: start,
            });
            continue;
        }

        // Number literal
        if c.is_ascii_digit() || (c == '.' && pos + 1 < chars.len() && chars[pos + 1].is_ascii_digit()) {
            let mut text = String::new();
            let mut seen_dot = false;
            while pos < chars.len() && (chars[pos].is_ascii_digit() || (chars[pos] == '.' && !seen_dot)) {
                if chars[pos] == '.' {
                    seen_dot = true;
                }
                text.push(chars[pos]);
                pos += 1;
            }
            if pos < chars.len() && (chars[pos].is_alphabetic() || chars[pos] == '_') {
                return Err(ExprError::lex(start, format!("malformed number '{}{}'", text, chars[pos])));
            }
            let token = if seen_dot {
                Token::Float(text)
            } else {
                match text.parse::<i64>() {
                    Ok(i) => Token::Int(i),
                    Err(_) => Token::Float(text),
                }
            };
            tokens.push(Spanned { token, offset: start });
            continue;
        }

        // Identifier / keyword. Dots allowed after the first character so
        // flattened keys such as `driver.age` read naturally.
        if c.is_alphabetic() || c == '_' || c == '$' {
            let mut word = String::new();
            while pos < chars.len()
                && (chars[pos].is_alphanumeric() || matches!(chars[pos], '_' | '$' | '.'))
            {
                word.push(chars[pos]);
                pos += 1;
            }
            tokens.push(Spanned {
                token: Token::Word(word),
                offset: start,
            });
            continue;
        }

        let next = chars.get(pos + 1).copied();
        let next2 = chars.get(pos + 2).copied();
        let (token, width) = match (c, next, next2) {
            ('=', Some('='), Some('=')) => (Token::Eq, 3),
            ('=', Some('='), _) => (Token::Eq, 2),
            ('!', Some('='), Some('=')) => (Token::Neq, 3),
            ('!', Some('='), _) => (Token::Neq, 2),
            ('!', _, _) => (Token::Not, 1),
            ('<', Some('='), _) => (Token::Lte, 2),
            ('<', _, _) => (Token::Lt, 1),
            ('>', Some('='), _) => (Token::Gte, 2),
            ('>', _, _) => (Token::Gt, 1),
            ('&', Some('&'), _) => (Token::And, 2),
            ('|', Some('|'), _) => (Token::Or, 2),
            ('+', _, _) => (Token::Plus, 1),
            ('-', _, _) => (Token::Minus, 1),
            ('*', _, _) => (Token::Star, 1),
            ('/', _, _) => (Token::Slash, 1),
            ('(', _, _) => (Token::LParen, 1),
            (')', _, _) => (Token::RParen, 1),
            ('=', _, _) => {
                return Err(ExprError::lex(start, "assignment '=' is not allowed; use '=='"));
            }
            (other, _, _) => {
                return Err(ExprError::lex(start, format!("unexpected character '{}'", other)));
            }
        };
        pos += width;
        tokens.push(Spanned { token, offset: start });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        offset: chars.len(),
    });
    Ok(tokens)
}
