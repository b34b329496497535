//! List and variable-name splitting.
//!
//! The full parser lives in another crate; this module carries the two
//! decompositions the core needs before it can act on script-level input:
//!
//! - `split_list` / `join_list`: whitespace-separated words with `{}` and
//!   `""` grouping and backslash escapes
//! - `split_variable_name`: `name(element)` array-element references
//!
//! Namespace qualifiers (`a::b::c`) are stripped with [`tail_only`].

use crate::errors::KernelError;

/// A variable name split into its bare name and optional element index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarName<'a> {
    /// The bare variable name. May be empty — empty names are legal.
    pub name: &'a str,
    /// The array element index, when the reference was `name(index)`.
    pub index: Option<&'a str>,
}

/// Split a raw variable reference into name and optional element index.
///
/// `a(b)` yields name `a` with index `b`; a reference with no trailing
/// `(...)` is all name. The name part may be empty: `(x)` is the element
/// `x` of the array whose name is the empty string.
pub fn split_variable_name(raw: &str) -> VarName<'_> {
    if raw.ends_with(')') {
        if let Some(open) = raw.find('(') {
            return VarName {
                name: &raw[..open],
                index: Some(&raw[open + 1..raw.len() - 1]),
            };
        }
    }
    VarName {
        name: raw,
        index: None,
    }
}

/// Strip namespace qualifiers, keeping only the tail: `a::b::c` → `c`.
pub fn tail_only(name: &str) -> &str {
    match name.rfind("::") {
        Some(pos) => &name[pos + 2..],
        None => name,
    }
}

/// Split a script-level list into its elements.
///
/// Elements are separated by unquoted whitespace; braces group (and nest),
/// double quotes group, and a backslash escapes the next character outside
/// braces. Brace and quote groups must be properly closed.
pub fn split_list(text: &str) -> Result<Vec<String>, KernelError> {
    let mut items = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        match c {
            '{' => {
                chars.next();
                let mut depth = 1usize;
                let mut item = String::new();
                for c in chars.by_ref() {
                    match c {
                        '{' => {
                            depth += 1;
                            item.push(c);
                        }
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            item.push(c);
                        }
                        _ => item.push(c),
                    }
                }
                if depth != 0 {
                    return Err(KernelError::InvalidArgument {
                        what: "list (unmatched open brace)".into(),
                    });
                }
                items.push(item);
            }
            '"' => {
                chars.next();
                let mut item = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some(escaped) => item.push(escaped),
                            None => break,
                        },
                        _ => item.push(c),
                    }
                }
                if !closed {
                    return Err(KernelError::InvalidArgument {
                        what: "list (unmatched open quote)".into(),
                    });
                }
                items.push(item);
            }
            _ => {
                let mut item = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    chars.next();
                    if c == '\\' {
                        match chars.next() {
                            Some(escaped) => item.push(escaped),
                            None => item.push('\\'),
                        }
                    } else {
                        item.push(c);
                    }
                }
                items.push(item);
            }
        }
    }
    Ok(items)
}

/// Join elements back into a list, quoting where needed.
///
/// Words needing quoting are brace-quoted when their braces balance, and
/// backslash-escaped otherwise, so the result always splits back into the
/// original elements.
pub fn join_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for item in items {
        let item = item.as_ref();
        if !out.is_empty() {
            out.push(' ');
        }
        let needs_quote = item.is_empty()
            || item
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '"' | '\\'));
        if !needs_quote {
            out.push_str(item);
        } else if braces_balanced(item) && !item.contains('\\') {
            out.push('{');
            out.push_str(item);
            out.push('}');
        } else {
            for c in item.chars() {
                if c.is_whitespace() || matches!(c, '{' | '}' | '"' | '\\') {
                    out.push('\\');
                }
                out.push(c);
            }
        }
    }
    out
}

fn braces_balanced(s: &str) -> bool {
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_name_has_no_index() {
        assert_eq!(
            split_variable_name("spam"),
            VarName {
                name: "spam",
                index: None
            }
        );
    }

    #[test]
    fn element_reference_splits() {
        assert_eq!(
            split_variable_name("a(b c)"),
            VarName {
                name: "a",
                index: Some("b c")
            }
        );
    }

    #[test]
    fn empty_name_with_element_is_legal() {
        assert_eq!(
            split_variable_name("(x)"),
            VarName {
                name: "",
                index: Some("x")
            }
        );
    }

    #[test]
    fn trailing_paren_without_open_is_plain_name() {
        assert_eq!(
            split_variable_name("weird)"),
            VarName {
                name: "weird)",
                index: None
            }
        );
    }

    #[test]
    fn tail_only_strips_qualifiers() {
        assert_eq!(tail_only("a::b::c"), "c");
        assert_eq!(tail_only("plain"), "plain");
        assert_eq!(tail_only("::x"), "x");
    }

    #[test]
    fn split_simple_words() {
        assert_eq!(split_list("a b  c").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn split_empty_list() {
        assert_eq!(split_list("   ").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn braces_group_and_nest() {
        assert_eq!(
            split_list("a {b c} {d {e f}}").unwrap(),
            vec!["a", "b c", "d {e f}"]
        );
    }

    #[test]
    fn quotes_group() {
        assert_eq!(split_list(r#"a "b c" d"#).unwrap(), vec!["a", "b c", "d"]);
    }

    #[test]
    fn backslash_escapes_whitespace() {
        assert_eq!(split_list(r"a\ b c").unwrap(), vec!["a b", "c"]);
    }

    #[test]
    fn empty_braces_are_an_empty_element() {
        assert_eq!(split_list("a {} b").unwrap(), vec!["a", "", "b"]);
    }

    #[test]
    fn unmatched_brace_is_an_error() {
        assert!(split_list("a {b").is_err());
    }

    #[test]
    fn unmatched_quote_is_an_error() {
        assert!(split_list("a \"b").is_err());
    }

    #[test]
    fn join_quotes_words_with_spaces() {
        assert_eq!(join_list(["a", "b c", ""]), "a {b c} {}");
    }

    #[test]
    fn join_then_split_round_trips() {
        let items = vec!["plain", "two words", "", "with{brace"];
        let joined = join_list(&items);
        assert_eq!(split_list(&joined).unwrap(), items);
    }
}
