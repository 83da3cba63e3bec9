//! Scanner integration tests.
//!
//! Verifies that the lexer correctly tokenizes Lua constructs and reports
//! scanning errors with the right spans.

use luaparse_ast::syntax_kind::TokenType;
use luaparse_core::text::{Position, TextRange};
use luaparse_diagnostics::SyntaxErrorKind;
use luaparse_scanner::{tokenize, Lexer, Token, TokenValue};

/// Helper: scan all tokens except EOF and return them as (type, raw) pairs.
fn scan_all(source: &str) -> Vec<(TokenType, String)> {
    let (tokens, _) = tokenize(source);
    tokens
        .into_iter()
        .filter(|t| t.kind != TokenType::EOF)
        .map(|t| (t.kind, t.raw))
        .collect()
}

/// Helper: scan all token types.
fn scan_kinds(source: &str) -> Vec<TokenType> {
    scan_all(source).into_iter().map(|(k, _)| k).collect()
}

/// Helper: the first token of `source`.
fn first(source: &str) -> Token {
    Lexer::new(source).next_token()
}

#[test]
fn test_empty_source() {
    let (tokens, errors) = tokenize("");
    assert_eq!(tokens.len(), 1);
    assert!(tokens[0].is_eof());
    assert_eq!(tokens[0].text(), "<eof>");
    assert_eq!(tokens[0].raw, "");
    assert!(errors.is_empty());
}

#[test]
fn test_whitespace_only() {
    assert!(scan_all("   \n\t  \r\n").is_empty());
}

#[test]
fn test_keywords_and_literals() {
    assert_eq!(
        scan_kinds("local x = true and nil or false"),
        vec![
            TokenType::Keyword,
            TokenType::Identifier,
            TokenType::Punctuator,
            TokenType::BooleanLiteral,
            TokenType::Keyword,
            TokenType::NilLiteral,
            TokenType::Keyword,
            TokenType::BooleanLiteral,
        ]
    );
    assert_eq!(first("true").value, TokenValue::Boolean(true));
    assert_eq!(first("nil").value, TokenValue::Nil);
}

#[test]
fn test_numeric_literals() {
    assert_eq!(first("42").value, TokenValue::Number(42.0));
    assert_eq!(first("3.25").value, TokenValue::Number(3.25));
    assert_eq!(first(".5").value, TokenValue::Number(0.5));
    assert_eq!(first("1e2").value, TokenValue::Number(100.0));
    assert_eq!(first("5e+1").value, TokenValue::Number(50.0));
    assert_eq!(first("0x10").value, TokenValue::Number(16.0));
    assert_eq!(first("1_000").value, TokenValue::Number(1000.0));
    assert_eq!(first("1_000").raw, "1_000");
}

#[test]
fn test_malformed_number() {
    let (tokens, errors) = tokenize("x = 123fg12");
    let bad = &tokens[2];
    assert_eq!(bad.kind, TokenType::Unexpected);
    assert_eq!(bad.raw, "123fg12");
    assert_eq!(errors.len(), 1);
    let err = &errors.diagnostics()[0];
    assert_eq!(err.kind, SyntaxErrorKind::MalformedNumber);
    assert_eq!(err.message, "malformed number near '123fg12'");
    assert_eq!(err.range, TextRange::new(4, 11));
    assert_eq!((err.line, err.column, err.end_column), (1, 5, 12));
}

#[test]
fn test_misplaced_underscore_is_malformed() {
    let (_, errors) = tokenize("1__0");
    assert_eq!(errors.diagnostics()[0].message, "malformed number near '1__0'");
}

#[test]
fn test_strings_and_escapes() {
    assert_eq!(first(r#""a\tb\n""#).value, TokenValue::Text("a\tb\n".to_string()));
    assert_eq!(first(r"'it\'s'").value, TokenValue::Text("it's".to_string()));
    assert_eq!(first(r#""\x41\65""#).value, TokenValue::Text(r"\x41\65".to_string()));
    assert_eq!(first("\"a\\z  \n  b\"").value, TokenValue::Text("ab".to_string()));
    assert_eq!(first("\"a\\\nb\"").value, TokenValue::Text("a\nb".to_string()));
    assert_eq!(first(r#""\q""#).value, TokenValue::Text("q".to_string()));
}

#[test]
fn test_unfinished_string() {
    let (tokens, errors) = tokenize("\"Bad string\nx = 1");
    assert_eq!(tokens[0].kind, TokenType::StringLiteral);
    assert_eq!(tokens[0].value, TokenValue::Text("Bad string".to_string()));
    assert_eq!(errors.len(), 1);
    let err = &errors.diagnostics()[0];
    assert_eq!(err.kind, SyntaxErrorKind::UnfinishedString);
    assert_eq!(err.message, "unfinished string near 'Bad string'");
    // Scanning continues on the next line.
    assert_eq!(tokens[1].raw, "x");
    assert_eq!(tokens[1].start, Position::new(2, 1));
}

#[test]
fn test_long_strings() {
    let token = first("[[\nline one\nline two]]");
    assert_eq!(token.kind, TokenType::StringLiteral);
    assert_eq!(token.value, TokenValue::Text("line one\nline two".to_string()));
    assert_eq!(token.start, Position::new(1, 1));
    assert_eq!(token.end, Position::new(3, 11));

    let token = first("[==[ a ]] b ]==]");
    assert_eq!(token.value, TokenValue::Text(" a ]] b ".to_string()));
}

#[test]
fn test_invalid_long_bracket_is_punctuator() {
    assert_eq!(
        scan_kinds("[=x"),
        vec![TokenType::Punctuator, TokenType::Punctuator, TokenType::Identifier]
    );
}

#[test]
fn test_unfinished_long_string() {
    let (_, errors) = tokenize("x = [[\nabc");
    assert_eq!(errors.len(), 1);
    let err = &errors.diagnostics()[0];
    assert_eq!(err.kind, SyntaxErrorKind::UnfinishedLongString);
    assert_eq!(err.message, "unfinished long string (starting at line 1) near '<eof>'");
}

#[test]
fn test_comments() {
    let (tokens, _) = tokenize("-- hello\n--[==[ long\ncomment ]==] x");
    assert_eq!(tokens[0].kind, TokenType::Comment);
    assert_eq!(tokens[0].value, TokenValue::Text(" hello".to_string()));
    assert_eq!(tokens[1].kind, TokenType::Comment);
    assert_eq!(tokens[1].value, TokenValue::Text(" long\ncomment ".to_string()));
    assert_eq!(tokens[2].raw, "x");
    assert_eq!(tokens[2].start, Position::new(3, 14));
}

#[test]
fn test_unfinished_long_comment() {
    let (_, errors) = tokenize("--[[ never closed");
    assert_eq!(
        errors.diagnostics()[0].message,
        "unfinished long comment (starting at line 1) near '<eof>'"
    );
}

#[test]
fn test_punctuators() {
    let raws: Vec<String> = scan_all("== ~= <= >= .. ... :: . : < > = #")
        .into_iter()
        .map(|(_, raw)| raw)
        .collect();
    assert_eq!(raws, vec!["==", "~=", "<=", ">=", "..", "...", "::", ".", ":", "<", ">", "=", "#"]);
    assert_eq!(first("...").kind, TokenType::VarargLiteral);
}

#[test]
fn test_unknown_characters_are_unexpected() {
    let (tokens, errors) = tokenize("a ~ b & é");
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenType::Identifier,
            TokenType::Unexpected,
            TokenType::Identifier,
            TokenType::Unexpected,
            TokenType::Unexpected,
            TokenType::EOF,
        ]
    );
    assert_eq!(tokens[4].raw, "é");
    assert!(errors.is_empty());
}

#[test]
fn test_tab_columns() {
    let (tokens, _) = tokenize("\tx\t= 1");
    assert_eq!(tokens[0].start, Position::new(1, 3));
    assert_eq!(tokens[1].start, Position::new(1, 6));
    assert_eq!(tokens[2].start, Position::new(1, 8));
}

#[test]
fn test_crlf_counts_as_one_line() {
    let (tokens, _) = tokenize("a\r\nb\n\rc\r\rd");
    let lines: Vec<u32> = tokens.iter().map(|t| t.start.line).collect();
    assert_eq!(lines, vec![1, 2, 3, 5, 5]);
}

#[test]
fn test_token_ranges_are_ordered_and_cover_source() {
    let source = "local s = [[x]] -- note\nprint(s .. \"y\", 0x1F, ~)\n";
    let (tokens, _) = tokenize(source);
    let mut cursor = 0usize;
    for token in &tokens {
        let range = token.range.to_range();
        assert!(range.start >= cursor, "token {:?} overlaps its predecessor", token.raw);
        assert!(source[cursor..range.start].trim().is_empty(), "gap before {:?} is not whitespace", token.raw);
        assert_eq!(&source[range.clone()], token.raw);
        cursor = range.end;
    }
    assert_eq!(cursor, source.len());
    assert!(tokens.last().is_some_and(Token::is_eof));
}

#[test]
fn test_tokenize_is_deterministic() {
    let source = "for i = 1, 10 do print(i) end";
    assert_eq!(tokenize(source).0, tokenize(source).0);
}

#[test]
fn test_token_json_shape() {
    let (tokens, _) = tokenize("x = 'hi'");
    let json = serde_json::to_value(&tokens[2]).unwrap();
    assert_eq!(json["type"], "StringLiteral");
    assert_eq!(json["value"], "hi");
    assert_eq!(json["rawValue"], "'hi'");
    assert_eq!(json["rangeStart"], 4);
    assert_eq!(json["rangeEnd"], 8);
    assert_eq!(json["start"]["line"], 1);

    let eof = serde_json::to_value(tokens.last().unwrap()).unwrap();
    assert_eq!(eof["type"], "EOF");
    assert_eq!(eof["rawValue"], "");
}
