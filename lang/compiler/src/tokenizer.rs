//! Lexing: turns a character stream into a flat token sequence. Grounded on
//! `original_source/Source/Library/Tokenizer.cpp`'s `fetchWord`/
//! `fetchOperator`/`fetchString`/`skipLineComment`/`skipBlockComment`.

use sl_data::{Keyword, Operator, ParsingError, PushbackStream, Span, Token, TokenValue};

enum CharacterClass {
    Eof,
    Space,
    AlphaNum,
    Punct,
}

fn classify(c: Option<char>) -> CharacterClass {
    return match c {
        None => CharacterClass::Eof,
        Some(c) if c.is_whitespace() => CharacterClass::Space,
        Some(c) if c.is_alphanumeric() || c == '_' => CharacterClass::AlphaNum,
        Some(_) => CharacterClass::Punct,
    };
}

/// Lexes an entire source string into a token sequence, ending with a
/// single `Eof` token. Unlike the original's pull-based `TokensIterator`,
/// the parser here works off a pre-tokenized `Vec` with a cursor, which is
/// simpler in safe Rust and just as adequate for a single-pass compiler.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParsingError> {
    let mut stream = PushbackStream::new(source.chars());
    let mut tokens = Vec::new();
    loop {
        let token = next_token(&mut stream)?;
        let is_eof = token.is_eof();
        tokens.push(token);
        if is_eof {
            return Ok(tokens);
        }
    }
}

fn start_span(stream: &PushbackStream<std::str::Chars>) -> (u32, u32, usize) {
    return (stream.line(), stream.char_index(), stream.byte_offset());
}

fn next_token(stream: &mut PushbackStream<std::str::Chars>) -> Result<Token, ParsingError> {
    loop {
        let (line, col, offset) = start_span(stream);
        let c = stream.read();
        match classify(c) {
            CharacterClass::Eof => return Ok(Token::new(TokenValue::Eof, Span::point(line, col, offset))),
            CharacterClass::Space => continue,
            CharacterClass::AlphaNum => {
                stream.push_back(c.unwrap());
                return fetch_word(stream);
            }
            CharacterClass::Punct => match c.unwrap() {
                '"' => return fetch_string(stream),
                '/' => {
                    let c1 = stream.read();
                    match c1 {
                        Some('/') => {
                            skip_line_comment(stream);
                            continue;
                        }
                        Some('*') => {
                            skip_block_comment(stream)?;
                            continue;
                        }
                        _ => {
                            if let Some(c1) = c1 {
                                stream.push_back(c1);
                            }
                            stream.push_back('/');
                            return fetch_operator(stream);
                        }
                    }
                }
                other => {
                    stream.push_back(other);
                    return fetch_operator(stream);
                }
            },
        }
    }
}

fn fetch_word(stream: &mut PushbackStream<std::str::Chars>) -> Result<Token, ParsingError> {
    let (line, col, offset) = start_span(stream);
    let mut word = String::new();
    let mut c = stream.read();
    let is_number = c.map(|c| c.is_ascii_digit()).unwrap_or(false);

    loop {
        word.push(c.unwrap());
        c = stream.read();
        if c == Some('.') && word.ends_with('.') {
            stream.push_back('.');
            word.pop();
            break;
        }
        let keep = matches!(classify(c), CharacterClass::AlphaNum) || (is_number && c == Some('.'));
        if !keep {
            break;
        }
    }
    if let Some(c) = c {
        stream.push_back(c);
    }

    let span_end = Span { start_line: line, start_char: col, start_offset: offset, end_line: stream.line(), end_char: stream.char_index(), end_offset: stream.byte_offset() };

    if let Some(keyword) = Keyword::lookup(&word) {
        return Ok(Token::new(TokenValue::Keyword(keyword), span_end));
    }

    if word.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        return parse_number(&word, span_end);
    }
    return Ok(Token::new(TokenValue::Identifier(word), span_end));
}

/// Mirrors `strtol(word, &endptr, 0)` then `strtod` fallback: an integer
/// literal (including `0x`/`0` prefixed forms) parses first, and only a
/// literal with a decimal point or exponent falls through to float parsing.
fn parse_number(word: &str, span: Span) -> Result<Token, ParsingError> {
    if let Ok(n) = parse_c_style_integer(word) {
        return Ok(Token::new(TokenValue::Number(n as f64), span));
    }
    match word.parse::<f64>() {
        Ok(n) => Ok(Token::new(TokenValue::Number(n), span)),
        Err(_) => Err(ParsingError::parsing(format!("'{}' is not a valid number", word), span)),
    }
}

fn parse_c_style_integer(word: &str) -> Result<i64, ()> {
    if let Some(hex) = word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).map_err(|_| ());
    }
    if word.len() > 1 && word.starts_with('0') && word.bytes().all(|b| b.is_ascii_digit()) {
        return i64::from_str_radix(&word[1..], 8).map_err(|_| ());
    }
    if word.bytes().all(|b| b.is_ascii_digit()) {
        return word.parse::<i64>().map_err(|_| ());
    }
    return Err(());
}

fn fetch_operator(stream: &mut PushbackStream<std::str::Chars>) -> Result<Token, ParsingError> {
    let (line, col, offset) = start_span(stream);
    for (spelling, operator) in Operator::ALL {
        if try_match(stream, spelling) {
            let span = Span { start_line: line, start_char: col, start_offset: offset, end_line: stream.line(), end_char: stream.char_index(), end_offset: stream.byte_offset() };
            return Ok(Token::new(TokenValue::Operator(*operator), span));
        }
    }
    let mut unexpected = String::new();
    loop {
        let c = stream.read();
        if !matches!(classify(c), CharacterClass::Punct) {
            if let Some(c) = c {
                stream.push_back(c);
            }
            break;
        }
        unexpected.push(c.unwrap());
    }
    let span = Span { start_line: line, start_char: col, start_offset: offset, end_line: stream.line(), end_char: stream.char_index(), end_offset: stream.byte_offset() };
    return Err(ParsingError::unexpected(unexpected, span));
}

/// Tries to consume exactly `spelling` from the stream, restoring whatever
/// was read on a mismatch. `Operator::ALL` is ordered longest-first per
/// leading character, so the first match found here is the maximal munch.
fn try_match(stream: &mut PushbackStream<std::str::Chars>, spelling: &str) -> bool {
    let mut consumed = Vec::new();
    for expected in spelling.chars() {
        match stream.read() {
            Some(c) if c == expected => consumed.push(c),
            other => {
                if let Some(c) = other {
                    stream.push_back(c);
                }
                for c in consumed.into_iter().rev() {
                    stream.push_back(c);
                }
                return false;
            }
        }
    }
    return true;
}

fn fetch_string(stream: &mut PushbackStream<std::str::Chars>) -> Result<Token, ParsingError> {
    let (line, col, offset) = start_span(stream);
    let mut value = String::new();
    let mut escaped = false;

    loop {
        let c = stream.read();
        let Some(c) = c else {
            let span = Span::point(stream.line(), stream.char_index(), stream.byte_offset());
            return Err(ParsingError::parsing("Expected closing '\"'", span));
        };
        if escaped {
            value.push(match c {
                't' => '\t',
                'n' => '\n',
                'r' => '\r',
                '0' => '\0',
                other => other,
            });
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '\t' | '\n' | '\r' => {
                stream.push_back(c);
                let span = Span::point(stream.line(), stream.char_index(), stream.byte_offset());
                return Err(ParsingError::parsing("Expected closing '\"'", span));
            }
            '"' => {
                let span =
                    Span { start_line: line, start_char: col, start_offset: offset, end_line: stream.line(), end_char: stream.char_index(), end_offset: stream.byte_offset() };
                return Ok(Token::new(TokenValue::Str(value), span));
            }
            other => value.push(other),
        }
    }
}

fn skip_line_comment(stream: &mut PushbackStream<std::str::Chars>) {
    loop {
        match stream.read() {
            None => return,
            Some('\n') => return,
            Some(_) => continue,
        }
    }
}

fn skip_block_comment(stream: &mut PushbackStream<std::str::Chars>) -> Result<(), ParsingError> {
    let mut closing = false;
    loop {
        match stream.read() {
            None => {
                let span = Span::point(stream.line(), stream.char_index(), stream.byte_offset());
                return Err(ParsingError::parsing("Expected closing '*/'", span));
            }
            Some('/') if closing => return Ok(()),
            Some(c) => closing = c == '*',
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn values(source: &str) -> Vec<TokenValue> {
        return tokenize(source).unwrap().into_iter().map(|t| t.value).collect();
    }

    #[test]
    fn tokenizes_a_function_declaration() {
        let tokens = values("function number add(number a, number b) { return a + b; }");
        assert_eq!(
            tokens,
            vec![
                TokenValue::Keyword(Keyword::Function),
                TokenValue::Keyword(Keyword::Number),
                TokenValue::Identifier("add".to_string()),
                TokenValue::Operator(Operator::OpenRound),
                TokenValue::Keyword(Keyword::Number),
                TokenValue::Identifier("a".to_string()),
                TokenValue::Operator(Operator::Comma),
                TokenValue::Keyword(Keyword::Number),
                TokenValue::Identifier("b".to_string()),
                TokenValue::Operator(Operator::CloseRound),
                TokenValue::Operator(Operator::OpenCurly),
                TokenValue::Keyword(Keyword::Return),
                TokenValue::Identifier("a".to_string()),
                TokenValue::Operator(Operator::Add),
                TokenValue::Identifier("b".to_string()),
                TokenValue::Operator(Operator::Semicolon),
                TokenValue::Operator(Operator::CloseCurly),
                TokenValue::Eof,
            ]
        );
    }

    #[test]
    fn maximal_munch_prefers_longer_operator_spellings() {
        assert_eq!(values("a..=b"), vec![
            TokenValue::Identifier("a".to_string()),
            TokenValue::Operator(Operator::ConcatAssign),
            TokenValue::Identifier("b".to_string()),
            TokenValue::Eof,
        ]);
    }

    #[test]
    fn skips_line_and_block_comments() {
        assert_eq!(values("1 // trailing\n/* block */2"), vec![TokenValue::Number(1.0), TokenValue::Number(2.0), TokenValue::Eof]);
    }

    #[test]
    fn parses_escape_sequences_in_strings() {
        assert_eq!(values(r#""a\tb""#), vec![TokenValue::Str("a\tb".to_string()), TokenValue::Eof]);
    }

    #[test]
    fn unterminated_string_is_a_parsing_error() {
        assert!(tokenize("\"abc").is_err());
    }

    #[test]
    fn octal_and_hex_integer_literals() {
        assert_eq!(values("010 0x1F"), vec![TokenValue::Number(8.0), TokenValue::Number(31.0), TokenValue::Eof]);
    }
}
