use crate::error::CompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Let,
    Print,
    If,
    Then,
    Else,
    Goto,
    Gosub,
    Return,
    End,
    Stop,
    Error,
    Clear,
    Rem,
    And,
    Or,
    Xor,
    Not,
    Mod,
    Run,
    Chain,
    List,
    New,
    Load,
    Merge,
    Save,
    Edit,
    Renum,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        let keyword = match word {
            "let" => Keyword::Let,
            "print" => Keyword::Print,
            "if" => Keyword::If,
            "then" => Keyword::Then,
            "else" => Keyword::Else,
            "goto" => Keyword::Goto,
            "gosub" => Keyword::Gosub,
            "return" => Keyword::Return,
            "end" => Keyword::End,
            "stop" => Keyword::Stop,
            "error" => Keyword::Error,
            "clear" => Keyword::Clear,
            "rem" => Keyword::Rem,
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "xor" => Keyword::Xor,
            "not" => Keyword::Not,
            "mod" => Keyword::Mod,
            "run" => Keyword::Run,
            "chain" => Keyword::Chain,
            "list" => Keyword::List,
            "new" => Keyword::New,
            "load" => Keyword::Load,
            "merge" => Keyword::Merge,
            "save" => Keyword::Save,
            "edit" => Keyword::Edit,
            "renum" => Keyword::Renum,
            _ => return None,
        };
        Some(keyword)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    /// Identifier as written, sigil included.
    Ident(String),
    Keyword(Keyword),
    Plus,
    Minus,
    Star,
    Slash,
    Backslash,
    Caret,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    LParen,
    RParen,
    Comma,
    Semicolon,
    Colon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Character offset in the source line.
    pub pos: usize,
}

/// Splits one source line into tokens. Everything after `REM` or `'` is
/// dropped; an unterminated string runs to the end of the line.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < chars.len() {
        let ch = chars[i];
        let start = i;

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        if ch.is_ascii_digit() || (ch == '.' && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())) {
            let (value, next) = lex_decimal(&chars, i)?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                pos: start,
            });
            i = next;
            continue;
        }

        if ch == '&' {
            let (value, next) = lex_radix(&chars, i)?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                pos: start,
            });
            i = next;
            continue;
        }

        if ch == '"' {
            i += 1;
            let mut text = String::new();
            while i < chars.len() && chars[i] != '"' {
                text.push(chars[i]);
                i += 1;
            }
            // skip the closing quote if there is one
            i += 1;
            tokens.push(Token {
                kind: TokenKind::Str(text),
                pos: start,
            });
            continue;
        }

        if ch.is_ascii_alphabetic() {
            let mut word = String::new();
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                word.push(chars[i]);
                i += 1;
            }
            let sigil = chars.get(i).copied().filter(|c| matches!(c, '%' | '!' | '$'));
            if let Some(sigil) = sigil {
                word.push(sigil);
                i += 1;
            }
            let keyword = match sigil {
                None => Keyword::from_word(&word.to_ascii_lowercase()),
                Some(_) => None,
            };
            match keyword {
                Some(Keyword::Rem) => {
                    tokens.push(Token {
                        kind: TokenKind::Keyword(Keyword::Rem),
                        pos: start,
                    });
                    break;
                }
                Some(keyword) => tokens.push(Token {
                    kind: TokenKind::Keyword(keyword),
                    pos: start,
                }),
                None => tokens.push(Token {
                    kind: TokenKind::Ident(word),
                    pos: start,
                }),
            }
            continue;
        }

        if ch == '\'' {
            tokens.push(Token {
                kind: TokenKind::Keyword(Keyword::Rem),
                pos: start,
            });
            break;
        }

        let next = chars.get(i + 1).copied();
        let (kind, width) = match (ch, next) {
            ('<', Some('>')) => (TokenKind::Ne, 2),
            ('<', Some('=')) | ('=', Some('<')) => (TokenKind::Le, 2),
            ('>', Some('=')) | ('=', Some('>')) => (TokenKind::Ge, 2),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('=', _) => (TokenKind::Eq, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('\\', _) => (TokenKind::Backslash, 1),
            ('^', _) => (TokenKind::Caret, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            (',', _) => (TokenKind::Comma, 1),
            (';', _) => (TokenKind::Semicolon, 1),
            (':', _) => (TokenKind::Colon, 1),
            ('?', _) => (TokenKind::Keyword(Keyword::Print), 1),
            _ => {
                return Err(CompileError::syntax(
                    format!("unexpected character '{ch}'"),
                    start,
                ))
            }
        };
        tokens.push(Token { kind, pos: start });
        i += width;
    }

    Ok(tokens)
}

fn lex_decimal(chars: &[char], mut i: usize) -> Result<(f64, usize), CompileError> {
    let start = i;
    let mut text = String::new();
    while i < chars.len() && chars[i].is_ascii_digit() {
        text.push(chars[i]);
        i += 1;
    }
    if chars.get(i) == Some(&'.') {
        text.push('.');
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            text.push(chars[i]);
            i += 1;
        }
    }
    if matches!(chars.get(i), Some('e' | 'E')) {
        let sign = matches!(chars.get(i + 1), Some('+' | '-'));
        let digit_at = if sign { i + 2 } else { i + 1 };
        if chars.get(digit_at).is_some_and(|c| c.is_ascii_digit()) {
            text.push('e');
            if sign {
                text.push(chars[i + 1]);
            }
            i = digit_at;
            while i < chars.len() && chars[i].is_ascii_digit() {
                text.push(chars[i]);
                i += 1;
            }
        }
    }
    text.parse::<f64>()
        .map(|value| (value, i))
        .map_err(|_| CompileError::syntax(format!("invalid number '{text}'"), start))
}

fn lex_radix(chars: &[char], mut i: usize) -> Result<(f64, usize), CompileError> {
    let start = i;
    i += 1;
    let radix = match chars.get(i) {
        Some('h' | 'H') => {
            i += 1;
            16
        }
        Some('x' | 'X') => {
            i += 1;
            2
        }
        _ => 16,
    };
    let mut digits = String::new();
    while i < chars.len() && chars[i].is_digit(radix) {
        digits.push(chars[i]);
        i += 1;
    }
    if digits.is_empty() {
        return Err(CompileError::syntax("expected digits after '&'", start));
    }
    u32::from_str_radix(&digits, radix)
        .ok()
        .filter(|value| *value <= 0xffff)
        .map(|value| (f64::from(value), i))
        .ok_or_else(|| CompileError::syntax(format!("number '&{digits}' out of range"), start))
}
