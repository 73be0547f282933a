use json_query::{ErrorKind, JsonPath, JsonPathError};
use serde_json::Value;

fn compile_error(path: &str) -> JsonPathError {
    match JsonPath::<Value>::compile(path) {
        Ok(_) => panic!("expected '{path}' to be rejected"),
        Err(e) => e,
    }
}

#[test]
fn malformed_query_kind_matrix() {
    let cases = [
        ("", ErrorKind::UnexpectedEof),
        ("$.", ErrorKind::UnexpectedEof),
        ("$[", ErrorKind::UnexpectedEof),
        ("$['a'", ErrorKind::UnexpectedEof),
        ("$['a", ErrorKind::UnexpectedEof),
        ("$[?(@.a", ErrorKind::UnexpectedEof),
        ("a.b", ErrorKind::ExpectedRootOrFunction),
        ("1", ErrorKind::ExpectedRootOrFunction),
        ("$.[0]", ErrorKind::ExpectedKey),
        ("$[]", ErrorKind::ExpectedKey),
        ("$.a b", ErrorKind::ExpectedSeparator),
        ("$[0 1]", ErrorKind::ExpectedRightBracket),
        ("$[1:3:0]", ErrorKind::StepCannotBeZero),
        ("$[?(@.a = 1)]", ErrorKind::ExpectedComparator),
        ("$[?(@.a ! 1)]", ErrorKind::ExpectedComparator),
        ("$[?(@.a | @.b)]", ErrorKind::ExpectedOr),
        ("$[?(@.a & @.b)]", ErrorKind::ExpectedAnd),
        ("$[?(@.a =~ x)]", ErrorKind::ExpectedForwardSlash),
        ("$[?(@.a =~ /[/)]", ErrorKind::InvalidRegex),
        ("$[?(@.a))]", ErrorKind::UnbalancedParenthesis),
        ("$['\\x']", ErrorKind::IllegalEscapedCharacter),
        ("$['\\uZZZZ']", ErrorKind::InvalidCodepoint),
        ("$['\\udc00']", ErrorKind::InvalidCodepoint),
        ("$[?(missing(@))]", ErrorKind::UnknownFunction),
        ("$[?(length(@, @))]", ErrorKind::InvalidArity),
        ("$[?(length())]", ErrorKind::InvalidArity),
        ("$[?(@.a == {\"k\": })]", ErrorKind::InvalidLiteral),
        ("$[?(@.a == 1.2.3)]", ErrorKind::InvalidNumber),
        ("$[?(bare)]", ErrorKind::ExpectedRootOrCurrentNode),
        ("$[99999999999999999999]", ErrorKind::InvalidNumber),
    ];
    for (path, kind) in cases {
        assert_eq!(compile_error(path).kind, kind, "for '{path}'");
    }
}

#[test]
fn error_position_matrix() {
    let e = compile_error("$.a b");
    assert_eq!((e.line, e.column), (1, 5));

    let e = compile_error("$[1:3:0]");
    assert_eq!((e.line, e.column), (1, 8));

    let e = compile_error("$.a\n.b\n c");
    assert_eq!(e.kind, ErrorKind::ExpectedSeparator);
    assert_eq!((e.line, e.column), (3, 2));

    let e = compile_error("$['a");
    assert_eq!((e.line, e.column), (1, 5));
}

#[test]
fn error_message_matrix() {
    let e = compile_error("$[1:3:0]");
    assert_eq!(e.to_string(), format!("{} at line 1 and column 8", e.kind));
    assert_eq!(e.kind.code(), ErrorKind::StepCannotBeZero.code());
}

#[test]
fn whitespace_is_accepted_between_tokens() {
    for path in [
        " $.a",
        "$ .a",
        "$. a",
        "$[ 0 ]",
        "$[ 'a' , 'b' ]",
        "$[ 1 : 2 ]",
        "$[?( @.a == 1 )]",
        "$[?(@.a==1&&@.b!=2)]",
        "length ( $ )",
    ] {
        assert!(JsonPath::<Value>::compile(path).is_ok(), "'{path}' should compile");
    }
}
