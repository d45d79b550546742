//! Expression tokenizer
//!
//! Splits an expression on operator boundaries: `&&`, `||`, and the
//! escaped forms `\!`, `\(`, `\)`. Everything between operators is a
//! literal effect name, so names may freely contain unescaped `!`, `(`,
//! `)`, and single `&`/`|` characters.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open,
    Close,
    And,
    Or,
    Not,
    Name(String),
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut buffer = String::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    let flush = |buffer: &mut String, tokens: &mut Vec<Token>| {
        let name = buffer.trim();
        if !name.is_empty() {
            tokens.push(Token::Name(name.to_string()));
        }
        buffer.clear();
    };

    while i < chars.len() {
        let rest_next = chars.get(i + 1).copied();
        match (chars[i], rest_next) {
            ('\\', Some('(')) => {
                flush(&mut buffer, &mut tokens);
                tokens.push(Token::Open);
                i += 2;
            }
            ('\\', Some(')')) => {
                flush(&mut buffer, &mut tokens);
                tokens.push(Token::Close);
                i += 2;
            }
            ('\\', Some('!')) => {
                flush(&mut buffer, &mut tokens);
                tokens.push(Token::Not);
                i += 2;
            }
            ('&', Some('&')) => {
                flush(&mut buffer, &mut tokens);
                tokens.push(Token::And);
                i += 2;
            }
            ('|', Some('|')) => {
                flush(&mut buffer, &mut tokens);
                tokens.push(Token::Or);
                i += 2;
            }
            (c, _) => {
                buffer.push(c);
                i += 1;
            }
        }
    }
    flush(&mut buffer, &mut tokens);

    tokens
}
