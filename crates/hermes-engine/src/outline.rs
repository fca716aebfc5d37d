//! Top-level definition outline of a document.
//!
//! `async-graphql-parser` refuses documents that are well formed but break a
//! document rule: an anonymous operation next to others, a repeated operation
//! or fragment name, a type-system definition. The outline splits such a
//! document into its top-level definitions so each one can be parsed on its
//! own and the rule reported by validation instead.
//!
//! The scanner only understands as much of the grammar as it needs to find
//! definition boundaries. Anything it cannot place yields `None`.

use std::ops::Range;

use hermes_core::SourceLocation;

const OPERATION_KEYWORDS: [&str; 3] = ["query", "mutation", "subscription"];

const TYPE_SYSTEM_KEYWORDS: [&str; 9] = [
    "schema",
    "scalar",
    "type",
    "interface",
    "union",
    "enum",
    "input",
    "directive",
    "extend",
];

/// What a top-level definition is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OutlineKind {
    Operation,
    Fragment,
    /// A type-system definition; `None` names the schema definition.
    TypeSystem(Option<String>),
}

/// One top-level definition and the bytes it spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutlineEntry {
    pub(crate) kind: OutlineKind,
    pub(crate) span: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Punct(u8),
    Name(&'a str),
    Str,
}

#[derive(Debug, Clone, Copy)]
struct Spanned<'a> {
    token: Token<'a>,
    start: usize,
    end: usize,
}

/// Splits `text` into its top-level definitions, in source order.
pub(crate) fn outline(text: &str) -> Option<Vec<OutlineEntry>> {
    let tokens = tokenize(text)?;
    let mut entries = Vec::new();
    let mut index = 0;

    while index < tokens.len() {
        let first = index;
        let mut head = index;
        if tokens[head].token == Token::Str {
            head += 1;
        }

        let (kind, end) = match tokens.get(head)?.token {
            Token::Punct(b'{') if head == first => (OutlineKind::Operation, close_body(&tokens, head)?),
            Token::Name(keyword) if head == first && OPERATION_KEYWORDS.contains(&keyword) => {
                (OutlineKind::Operation, close_body(&tokens, head)?)
            }
            Token::Name("fragment") if head == first => {
                (OutlineKind::Fragment, close_body(&tokens, head)?)
            }
            Token::Name(keyword) if TYPE_SYSTEM_KEYWORDS.contains(&keyword) => {
                type_system(&tokens, head)?
            }
            _ => return None,
        };

        entries.push(OutlineEntry {
            kind,
            span: tokens[first].start..tokens[end - 1].end,
        });
        index = end;
    }

    Some(entries)
}

/// Returns a copy of `text` where everything outside `spans` is blank.
///
/// Line breaks are kept and every other character becomes one space, so
/// positions reported by the parser stay those of the original text.
pub(crate) fn isolate(text: &str, spans: &[Range<usize>]) -> String {
    text.char_indices()
        .map(|(at, c)| {
            if c == '\n' || c == '\r' || spans.iter().any(|span| span.contains(&at)) {
                c
            } else {
                ' '
            }
        })
        .collect()
}

/// Returns the line and column of the byte offset `at`.
pub(crate) fn location_of(text: &str, at: usize) -> SourceLocation {
    let before = &text[..at];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |tail| tail.chars().count()) + 1;
    SourceLocation::new(line, column)
}

/// Returns the index just past the `}` closing the first body opened at
/// depth zero.
fn close_body(tokens: &[Spanned<'_>], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut opened = false;

    for (index, spanned) in tokens.iter().enumerate().skip(from) {
        match spanned.token {
            Token::Punct(c @ (b'{' | b'(' | b'[')) => {
                opened |= depth == 0 && c == b'{';
                depth += 1;
            }
            Token::Punct(b'}' | b')' | b']') => {
                depth = depth.checked_sub(1)?;
                if depth == 0 && opened {
                    return Some(index + 1);
                }
            }
            _ => {}
        }
    }

    None
}

fn type_system(tokens: &[Spanned<'_>], head: usize) -> Option<(OutlineKind, usize)> {
    let mut at = head;
    if tokens[at].token == Token::Name("extend") {
        at += 1;
    }
    let Token::Name(keyword) = tokens.get(at)?.token else {
        return None;
    };
    at += 1;

    let name = match keyword {
        "schema" => None,
        "directive" => {
            if tokens.get(at)?.token != Token::Punct(b'@') {
                return None;
            }
            at += 1;
            Some(name_at(tokens, at)?)
        }
        _ => Some(name_at(tokens, at)?),
    };
    if name.is_some() {
        at += 1;
    }

    let braced = matches!(keyword, "schema" | "type" | "interface" | "enum" | "input");
    let mut depth = 0usize;
    while let Some(spanned) = tokens.get(at) {
        match spanned.token {
            Token::Punct(c @ (b'{' | b'(' | b'[')) => {
                if depth == 0 && c == b'{' && !braced {
                    break;
                }
                depth += 1;
            }
            Token::Punct(c @ (b'}' | b')' | b']')) => {
                depth = depth.checked_sub(1)?;
                if depth == 0 && braced && c == b'}' {
                    at += 1;
                    break;
                }
            }
            Token::Name(word)
                if depth == 0
                    && (word == "fragment"
                        || OPERATION_KEYWORDS.contains(&word)
                        || TYPE_SYSTEM_KEYWORDS.contains(&word)) =>
            {
                break;
            }
            Token::Str if depth == 0 => break,
            _ => {}
        }
        at += 1;
    }

    (depth == 0).then_some((OutlineKind::TypeSystem(name), at))
}

fn name_at(tokens: &[Spanned<'_>], at: usize) -> Option<String> {
    match tokens.get(at)?.token {
        Token::Name(name) => Some(name.to_string()),
        _ => None,
    }
}

fn tokenize(text: &str) -> Option<Vec<Spanned<'_>>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut at = 0;

    while let Some(&byte) = bytes.get(at) {
        let start = at;
        let token = match byte {
            b' ' | b'\t' | b'\n' | b'\r' | b',' => {
                at += 1;
                continue;
            }
            b'#' => {
                while bytes.get(at).is_some_and(|b| *b != b'\n' && *b != b'\r') {
                    at += 1;
                }
                continue;
            }
            b'"' if bytes[at..].starts_with(b"\"\"\"") => {
                at += 3;
                loop {
                    let rest = bytes.get(at..).filter(|rest| !rest.is_empty())?;
                    if rest.starts_with(b"\\\"\"\"") {
                        at += 4;
                    } else if rest.starts_with(b"\"\"\"") {
                        at += 3;
                        break;
                    } else {
                        at += 1;
                    }
                }
                Token::Str
            }
            b'"' => {
                at += 1;
                loop {
                    match bytes.get(at)? {
                        b'\n' | b'\r' => return None,
                        b'\\' => at += 2,
                        b'"' => {
                            at += 1;
                            break;
                        }
                        _ => at += 1,
                    }
                }
                Token::Str
            }
            b'_' | b'a'..=b'z' | b'A'..=b'Z' => {
                while bytes
                    .get(at)
                    .is_some_and(|b| *b == b'_' || b.is_ascii_alphanumeric())
                {
                    at += 1;
                }
                Token::Name(&text[start..at])
            }
            other => {
                at += 1;
                Token::Punct(other)
            }
        };
        tokens.push(Spanned {
            token,
            start,
            end: at,
        });
    }

    Some(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<OutlineKind> {
        outline(text)
            .unwrap()
            .into_iter()
            .map(|entry| entry.kind)
            .collect()
    }

    #[test]
    fn test_executable_definitions() {
        assert_eq!(
            kinds("{ foo } query Q($a: Int = 1) @skip(if: true) { foo { bar } } fragment F on T { x }"),
            [
                OutlineKind::Operation,
                OutlineKind::Operation,
                OutlineKind::Fragment
            ]
        );
    }

    #[test]
    fn test_spans_cover_definitions() {
        let text = "query A { foo }\n  query A { bar }";
        let entries = outline(text).unwrap();
        assert_eq!(&text[entries[0].span.clone()], "query A { foo }");
        assert_eq!(&text[entries[1].span.clone()], "query A { bar }");
    }

    #[test]
    fn test_type_system_definitions() {
        let text = "\"\"\"doc\"\"\" type T { a: Int }\n\
                    scalar Date\n\
                    union U = A | B\n\
                    { foo }\n\
                    extend type T @key\n\
                    directive @d(arg: String) on FIELD\n\
                    schema { query: T }";
        assert_eq!(
            kinds(text),
            [
                OutlineKind::TypeSystem(Some("T".to_string())),
                OutlineKind::TypeSystem(Some("Date".to_string())),
                OutlineKind::TypeSystem(Some("U".to_string())),
                OutlineKind::Operation,
                OutlineKind::TypeSystem(Some("T".to_string())),
                OutlineKind::TypeSystem(Some("d".to_string())),
                OutlineKind::TypeSystem(None),
            ]
        );
    }

    #[test]
    fn test_strings_and_comments_do_not_split() {
        let text = "# { not a body }\nquery Q { foo(arg: \"}\") bar(arg: \"\"\"{\"\"\") }";
        let entries = outline(text).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(text[entries[0].span.clone()].starts_with("query Q"));
    }

    #[test]
    fn test_unplaceable_text() {
        assert!(outline("query {").is_none());
        assert!(outline("{ foo } }").is_none());
        assert!(outline("\"doc\" query { foo }").is_none());
        assert!(outline("foo { bar }").is_none());
        assert!(outline("{ foo(arg: \"open) }").is_none());
    }

    #[test]
    fn test_isolate_keeps_positions() {
        let text = "query A { foo }\nquery B { bär }";
        let isolated = isolate(text, &[16..text.len()]);
        assert_eq!(isolated, "               \nquery B { bär }");
        assert_eq!(location_of(text, 16), SourceLocation::new(2, 1));
        assert_eq!(location_of(text, 6), SourceLocation::new(1, 7));
    }
}
