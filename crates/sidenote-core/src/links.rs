//! Inline link token scanning.
//!
//! Recognizes a single token shape, `[label](target)`:
//! - the label is one or more characters, none of them `]`
//! - the target is one or more characters, none of them `)` or whitespace
//!
//! Whitespace means the ECMAScript `\s` class (see [`is_js_whitespace`]),
//! which differs from [`char::is_whitespace`] on U+0085 and U+FEFF.
//!
//! Matches are found left to right and never overlap. Text that does not
//! form a complete token is left alone, so a stray `[` or `](` is harmless.

use std::ops::Range;

use smol_str::SmolStr;

use crate::types::Segment;

/// A `[label](target)` token found in a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkToken<'a> {
    pub label: &'a str,
    pub target: &'a str,
    /// Byte span of the whole token, brackets included.
    pub span: Range<usize>,
}

impl<'a> LinkToken<'a> {
    /// The token exactly as written in the source text.
    pub fn source(&self, text: &'a str) -> &'a str {
        &text[self.span.clone()]
    }
}

/// ECMAScript `WhiteSpace` or `LineTerminator`.
pub fn is_js_whitespace(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{FEFF}'
}

/// Cheap pre-check: a run without `[`, `](` and `)` cannot hold a token.
pub fn could_contain_link(text: &str) -> bool {
    text.contains('[') && text.contains("](") && text.contains(')')
}

/// Iterate over the link tokens in `text`.
pub fn link_tokens(text: &str) -> LinkTokens<'_> {
    LinkTokens { text, pos: 0 }
}

/// Iterator over non-overlapping link tokens, in order.
#[derive(Debug, Clone)]
pub struct LinkTokens<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for LinkTokens<'a> {
    type Item = LinkToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.text.len() {
            let open = self.pos + self.text[self.pos..].find('[')?;
            match match_at(self.text, open) {
                Some(token) => {
                    self.pos = token.span.end;
                    return Some(token);
                }
                // `[` is one byte, so open + 1 is a char boundary.
                None => self.pos = open + 1,
            }
        }
        None
    }
}

/// Try to match a token starting at the `[` at byte `open`.
fn match_at(text: &str, open: usize) -> Option<LinkToken<'_>> {
    let label_start = open + 1;
    let label_end = label_start + text[label_start..].find(']')?;
    if label_end == label_start {
        return None;
    }

    let target_start = label_end + 2;
    if text.get(label_end + 1..target_start) != Some("(") {
        return None;
    }

    let (rel, stop) = text[target_start..]
        .char_indices()
        .find(|&(_, c)| c == ')' || is_js_whitespace(c))?;
    if stop != ')' || rel == 0 {
        return None;
    }

    let target_end = target_start + rel;
    Some(LinkToken {
        label: &text[label_start..label_end],
        target: &text[target_start..target_end],
        span: open..target_end + 1,
    })
}

/// Whether `target` may become a link under the given protocol allowlist.
pub fn is_allowed_target(target: &str, allowed: &[SmolStr]) -> bool {
    let target = target.trim_matches(is_js_whitespace);
    allowed.iter().any(|prefix| target.starts_with(prefix.as_str()))
}

/// Split `text` into literal and link segments.
///
/// Tokens with a disallowed target stay inside the surrounding literal text.
/// Returns `None` when no link would be produced, meaning the run should be
/// left untouched.
pub fn segments<'a>(text: &'a str, allowed: &[SmolStr]) -> Option<Vec<Segment<'a>>> {
    if !could_contain_link(text) {
        return None;
    }

    let mut out = Vec::new();
    let mut last = 0;
    for token in link_tokens(text) {
        if !is_allowed_target(token.target, allowed) {
            continue;
        }
        if token.span.start > last {
            out.push(Segment::Text(&text[last..token.span.start]));
        }
        out.push(Segment::Link {
            label: token.label,
            target: token.target.trim_matches(is_js_whitespace),
        });
        last = token.span.end;
    }

    if out.is_empty() {
        return None;
    }
    if last < text.len() {
        out.push(Segment::Text(&text[last..]));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SidenoteConfig;

    fn allowed() -> Vec<SmolStr> {
        SidenoteConfig::default().allowed_protocols
    }

    fn tokens(text: &str) -> Vec<(&str, &str)> {
        link_tokens(text).map(|t| (t.label, t.target)).collect()
    }

    #[test]
    fn test_single_token() {
        let text = "[docs](https://x.y)";
        let found: Vec<_> = link_tokens(text).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "docs");
        assert_eq!(found[0].target, "https://x.y");
        assert_eq!(found[0].span, 0..text.len());
        assert_eq!(found[0].source(text), text);
    }

    #[test]
    fn test_multiple_tokens_in_order() {
        assert_eq!(
            tokens("see [a](http://a) and [b](mailto:b@c), done"),
            vec![("a", "http://a"), ("b", "mailto:b@c")]
        );
    }

    #[test]
    fn test_label_may_contain_open_bracket() {
        assert_eq!(tokens("[a [b](http://x)"), vec![("a [b", "http://x")]);
    }

    #[test]
    fn test_rejects_incomplete_tokens() {
        assert!(tokens("[](http://x)").is_empty());
        assert!(tokens("[a]()").is_empty());
        assert!(tokens("[a](http://x").is_empty());
        assert!(tokens("[a] (http://x)").is_empty());
        assert!(tokens("[a](http://x y)").is_empty());
        assert!(tokens("plain text").is_empty());
    }

    #[test]
    fn test_target_whitespace_follows_js_class() {
        // U+FEFF ends a target, U+0085 does not.
        assert!(tokens("[a](https://x\u{FEFF})").is_empty());
        assert_eq!(
            tokens("[a](https://x\u{85}y)"),
            vec![("a", "https://x\u{85}y")]
        );
        assert!(tokens("[a](https://x\u{A0}y)").is_empty());
        assert!(tokens("[a](https://x\u{2028}y)").is_empty());

        assert_eq!(segments("[a](https://x\u{FEFF})", &allowed()), None);
        assert_eq!(
            segments("[a](https://x\u{85})", &allowed()),
            Some(vec![Segment::Link {
                label: "a",
                target: "https://x\u{85}"
            }])
        );
    }

    #[test]
    fn test_js_whitespace_class() {
        let js = [
            '\t', '\n', '\u{B}', '\u{C}', '\r', ' ', '\u{A0}', '\u{2028}', '\u{3000}', '\u{FEFF}',
        ];
        for c in js {
            assert!(is_js_whitespace(c), "{c:?}");
        }
        for c in ['\u{85}', '\u{200B}', 'a', ')'] {
            assert!(!is_js_whitespace(c), "{c:?}");
        }
    }

    #[test]
    fn test_failed_match_resumes_after_bracket() {
        assert_eq!(tokens("[x](bad link) [y](http://y)"), vec![("y", "http://y")]);
    }

    #[test]
    fn test_unicode_around_tokens() {
        let text = "café [ünï](https://é.x) ☕";
        let found: Vec<_> = link_tokens(text).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "ünï");
        assert_eq!(found[0].source(text), "[ünï](https://é.x)");
    }

    #[test]
    fn test_fast_reject() {
        assert!(!could_contain_link("no brackets at all"));
        assert!(!could_contain_link("[only open"));
        assert!(!could_contain_link("[a](b"));
        assert!(could_contain_link("[a](b)"));
    }

    #[test]
    fn test_protocol_filter() {
        let allowed = allowed();
        assert!(is_allowed_target("http://x", &allowed));
        assert!(is_allowed_target("https://x", &allowed));
        assert!(is_allowed_target("mailto:a@b", &allowed));
        assert!(!is_allowed_target("javascript:x", &allowed));
        assert!(!is_allowed_target("ftp://x", &allowed));
        assert!(!is_allowed_target("note.md", &allowed));
        assert!(!is_allowed_target("../relative/path", &allowed));
    }

    #[test]
    fn test_segments_link_only() {
        assert_eq!(
            segments("[docs](https://x.y)", &allowed()),
            Some(vec![Segment::Link {
                label: "docs",
                target: "https://x.y"
            }])
        );
    }

    #[test]
    fn test_segments_keep_surrounding_text() {
        assert_eq!(
            segments("see [docs](https://x.y) now", &allowed()),
            Some(vec![
                Segment::Text("see "),
                Segment::Link {
                    label: "docs",
                    target: "https://x.y"
                },
                Segment::Text(" now"),
            ])
        );
    }

    #[test]
    fn test_segments_unsupported_protocol_is_untouched() {
        assert_eq!(segments("[notes](note.md)", &allowed()), None);
        assert_eq!(segments("[x](javascript:alert)", &allowed()), None);
    }

    #[test]
    fn test_segments_mixed_keeps_literal_token() {
        assert_eq!(
            segments("[a](note.md) [b](https://b)", &allowed()),
            Some(vec![
                Segment::Text("[a](note.md) "),
                Segment::Link {
                    label: "b",
                    target: "https://b"
                },
            ])
        );
    }
}
