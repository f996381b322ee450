//! Recursive-descent parser for description text.
//!
//! Grammar, informally:
//!
//! ```text
//! batch    := jobdesc | '+' group+
//! group    := '(' jobdesc+ ')'
//! jobdesc  := '&' attrval+
//! attrval  := '(' name '=' values ')'
//! name     := quoted | [A-Za-z0-9_-]+
//! values   := (quoted | bare)+ | valist+
//! valist   := '(' quoted+ ')'
//! ```
//!
//! Quoted strings use `"` or `'` with no escape processing; bare tokens are
//! runs of letters, digits and `/ \ - _ . : ; =`. Comments are delimited by
//! `(* ... *)`, may span lines, and are discarded along with whitespace.
//! Attribute names are case-folded; values are taken verbatim.

use thiserror::Error;

use crate::{AttrValue, Description};

/// Syntax failure with the byte offset it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected character {found:?} at offset {offset}, expected {expected}")]
    Unexpected {
        found: char,
        offset: usize,
        expected: &'static str,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("unterminated quoted string starting at offset {offset}")]
    UnterminatedQuote { offset: usize },

    #[error("unterminated comment starting at offset {offset}")]
    UnterminatedComment { offset: usize },

    #[error("attribute {name:?} mixes plain values and value groups")]
    MixedValueForms { name: String },
}

/// Parse description text into one or more attribute maps.
///
/// A single `&`-description yields one map; the `+` form yields one map per
/// contained description. Both multi-job spellings are accepted: each
/// description in its own parentheses, or several descriptions sharing one
/// parenthesized group.
pub fn parse(text: &str) -> Result<Vec<Description>, ParseError> {
    let mut cursor = Cursor::new(text);
    cursor.skip_trivia()?;

    let descriptions = match cursor.peek() {
        Some('&') => vec![cursor.job_description()?],
        Some('+') => {
            cursor.bump();
            cursor.batch_groups()?
        }
        Some(found) => {
            return Err(ParseError::Unexpected {
                found,
                offset: cursor.pos,
                expected: "`&` or `+`",
            })
        }
        None => return Err(ParseError::UnexpectedEof { expected: "`&` or `+`" }),
    };

    cursor.skip_trivia()?;
    if let Some(found) = cursor.peek() {
        return Err(ParseError::Unexpected {
            found,
            offset: cursor.pos,
            expected: "end of input",
        });
    }

    Ok(descriptions)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_')
}

fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | '\\' | '-' | '_' | '.' | ':' | ';' | '=')
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.text[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, want: char, expected: &'static str) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(found) => Err(ParseError::Unexpected {
                found,
                offset: self.pos,
                expected,
            }),
            None => Err(ParseError::UnexpectedEof { expected }),
        }
    }

    /// Skip whitespace and `(* ... *)` comments.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('(') if self.peek_second() == Some('*') => self.comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn comment(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.bump();
        self.bump();
        loop {
            match self.peek() {
                Some('*') if self.peek_second() == Some(')') => {
                    self.bump();
                    self.bump();
                    return Ok(());
                }
                Some(_) => {
                    self.bump();
                }
                None => return Err(ParseError::UnterminatedComment { offset: start }),
            }
        }
    }

    /// One or more parenthesized groups after a leading `+`, each holding one
    /// or more job descriptions.
    fn batch_groups(&mut self) -> Result<Vec<Description>, ParseError> {
        let mut descriptions = Vec::new();
        loop {
            self.skip_trivia()?;
            self.expect('(', "`(`")?;
            let before = descriptions.len();
            loop {
                self.skip_trivia()?;
                match self.peek() {
                    Some('&') => descriptions.push(self.job_description()?),
                    Some(')') if descriptions.len() > before => {
                        self.bump();
                        break;
                    }
                    Some(found) => {
                        return Err(ParseError::Unexpected {
                            found,
                            offset: self.pos,
                            expected: "`&`",
                        })
                    }
                    None => {
                        return Err(ParseError::UnexpectedEof {
                            expected: "`&` or `)`",
                        })
                    }
                }
            }
            self.skip_trivia()?;
            if self.peek() != Some('(') {
                return Ok(descriptions);
            }
        }
    }

    fn job_description(&mut self) -> Result<Description, ParseError> {
        self.expect('&', "`&`")?;
        let mut description = Description::new();
        let mut any = false;
        loop {
            self.skip_trivia()?;
            if self.peek() != Some('(') {
                break;
            }
            let (name, value) = self.attribute()?;
            description.insert(&name, value);
            any = true;
        }
        if !any {
            return match self.peek() {
                Some(found) => Err(ParseError::Unexpected {
                    found,
                    offset: self.pos,
                    expected: "`(`",
                }),
                None => Err(ParseError::UnexpectedEof { expected: "`(`" }),
            };
        }
        Ok(description)
    }

    fn attribute(&mut self) -> Result<(String, AttrValue), ParseError> {
        self.expect('(', "`(`")?;
        self.skip_trivia()?;
        let name = match self.peek() {
            Some('"') | Some('\'') => self.quoted()?,
            Some(c) if is_name_char(c) => self.attr_name(),
            Some(found) => {
                return Err(ParseError::Unexpected {
                    found,
                    offset: self.pos,
                    expected: "an attribute name",
                })
            }
            None => {
                return Err(ParseError::UnexpectedEof {
                    expected: "an attribute name",
                })
            }
        };
        let name = name.to_ascii_lowercase();
        self.skip_trivia()?;
        self.expect('=', "`=`")?;
        let value = self.values(&name)?;
        self.expect(')', "`)`")?;
        Ok((name, value))
    }

    /// A run of values: quoted and bare tokens, or value groups, never both.
    fn values(&mut self, name: &str) -> Result<AttrValue, ParseError> {
        let mut plain: Vec<String> = Vec::new();
        let mut groups: Vec<Vec<String>> = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('"') | Some('\'') => {
                    if !groups.is_empty() {
                        return Err(ParseError::MixedValueForms { name: name.to_string() });
                    }
                    plain.push(self.quoted()?);
                }
                Some('(') => {
                    if !plain.is_empty() {
                        return Err(ParseError::MixedValueForms { name: name.to_string() });
                    }
                    groups.push(self.value_group()?);
                }
                Some(c) if is_bare_char(c) => {
                    if !groups.is_empty() {
                        return Err(ParseError::MixedValueForms { name: name.to_string() });
                    }
                    plain.push(self.bare_token());
                }
                Some(')') => break,
                Some(found) => {
                    return Err(ParseError::Unexpected {
                        found,
                        offset: self.pos,
                        expected: "a value",
                    })
                }
                None => {
                    return Err(ParseError::UnexpectedEof {
                        expected: "a value or `)`",
                    })
                }
            }
        }
        if plain.is_empty() && groups.is_empty() {
            return Err(ParseError::Unexpected {
                found: ')',
                offset: self.pos,
                expected: "a value",
            });
        }
        Ok(if groups.is_empty() {
            AttrValue::Plain(plain)
        } else {
            AttrValue::Groups(groups)
        })
    }

    /// A parenthesized tuple of quoted strings.
    fn value_group(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect('(', "`(`")?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('"') | Some('\'') => items.push(self.quoted()?),
                Some(')') if !items.is_empty() => {
                    self.bump();
                    return Ok(items);
                }
                Some(found) => {
                    return Err(ParseError::Unexpected {
                        found,
                        offset: self.pos,
                        expected: "a quoted string",
                    })
                }
                None => {
                    return Err(ParseError::UnexpectedEof {
                        expected: "a quoted string or `)`",
                    })
                }
            }
        }
    }

    fn quoted(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let Some(delim) = self.bump() else {
            return Err(ParseError::UnexpectedEof {
                expected: "a quoted string",
            });
        };
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == delim => return Ok(value),
                Some(c) => value.push(c),
                None => return Err(ParseError::UnterminatedQuote { offset: start }),
            }
        }
    }

    fn bare_token(&mut self) -> String {
        let mut token = String::new();
        while let Some(c) = self.peek() {
            if !is_bare_char(c) {
                break;
            }
            token.push(c);
            self.bump();
        }
        token
    }

    fn attr_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !is_name_char(c) {
                break;
            }
            name.push(c);
            self.bump();
        }
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(values: &[&str]) -> AttrValue {
        AttrValue::Plain(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_parse_single_description() {
        let descs = parse(r#"&(executable="run.sh")(arguments="1" "2")"#).unwrap();

        assert_eq!(descs.len(), 1);
        assert_eq!(descs[0].get("executable").unwrap(), &plain(&["run.sh"]));
        assert_eq!(descs[0].get("arguments").unwrap(), &plain(&["1", "2"]));
    }

    #[test]
    fn test_parse_bare_tokens() {
        let descs = parse("&(executable=/usr/bin/env)(count=4)").unwrap();

        assert_eq!(
            descs[0].get("executable").unwrap(),
            &plain(&["/usr/bin/env"])
        );
        assert_eq!(descs[0].get("count").unwrap(), &plain(&["4"]));
    }

    #[test]
    fn test_bare_token_may_contain_equals() {
        let descs = parse("&(environment=PATH=/bin)").unwrap();
        assert_eq!(
            descs[0].get("environment").unwrap(),
            &plain(&["PATH=/bin"])
        );
    }

    #[test]
    fn test_attribute_names_fold_case() {
        let upper = parse(r#"&(Executable="x")"#).unwrap();
        let lower = parse(r#"&(executable="x")"#).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_last_occurrence_wins() {
        let descs = parse(r#"&(cputime="60")(cputime="120")"#).unwrap();
        assert_eq!(descs[0].len(), 1);
        assert_eq!(descs[0].get("cputime").unwrap(), &plain(&["120"]));
    }

    #[test]
    fn test_quoted_attribute_name() {
        let descs = parse(r#"&("Executable"="x")"#).unwrap();
        assert!(descs[0].get("executable").is_some());
    }

    #[test]
    fn test_single_quoted_values() {
        let descs = parse(r#"&(note='say "hi"')"#).unwrap();
        assert_eq!(descs[0].get("note").unwrap(), &plain(&[r#"say "hi""#]));
    }

    #[test]
    fn test_value_groups() {
        let descs =
            parse(r#"&(inputfiles=("job.sh" "/tmp/job.sh")("data" "/tmp/data"))"#).unwrap();

        let groups = descs[0].get("inputfiles").unwrap().as_groups().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec!["job.sh", "/tmp/job.sh"]);
        assert_eq!(groups[1], vec!["data", "/tmp/data"]);
    }

    #[test]
    fn test_comments_and_whitespace_discarded() {
        let text = "\n& (* job one *) (executable = \"run.sh\")\n  (* multi\nline *) (count=2)";
        let descs = parse(text).unwrap();

        assert_eq!(descs[0].get("executable").unwrap(), &plain(&["run.sh"]));
        assert_eq!(descs[0].get("count").unwrap(), &plain(&["2"]));
    }

    #[test]
    fn test_multi_job_separate_parens() {
        let descs = parse(r#"+(&(executable="a"))(&(executable="b"))"#).unwrap();

        assert_eq!(descs.len(), 2);
        assert_eq!(descs[0].get("executable").unwrap(), &plain(&["a"]));
        assert_eq!(descs[1].get("executable").unwrap(), &plain(&["b"]));
    }

    #[test]
    fn test_multi_job_shared_group() {
        let descs = parse(r#"+(&(executable="a")&(executable="b"))"#).unwrap();

        assert_eq!(descs.len(), 2);
        assert_eq!(descs[1].get("executable").unwrap(), &plain(&["b"]));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = parse(r#"&(executable="run.sh)"#).unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedQuote { .. }));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = parse("&(count=1) (* dangling").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedComment { .. }));
    }

    #[test]
    fn test_mixed_value_forms_rejected() {
        let err = parse(r#"&(inputfiles="flat" ("a" "b"))"#).unwrap_err();
        assert!(matches!(err, ParseError::MixedValueForms { ref name } if name == "inputfiles"));
    }

    #[test]
    fn test_trailing_input_rejected() {
        let err = parse(r#"&(count="1") garbage"#).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Unexpected {
                expected: "end of input",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            parse("").unwrap_err(),
            ParseError::UnexpectedEof { .. }
        ));
        assert!(matches!(
            parse("  (* only a comment *) ").unwrap_err(),
            ParseError::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn test_missing_value_rejected() {
        let err = parse("&(count=)").unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { expected: "a value", .. }));
    }

    #[test]
    fn test_empty_value_group_rejected() {
        let err = parse("&(inputfiles=())").unwrap_err();
        assert!(matches!(err, ParseError::Unexpected { .. }));
    }

    #[test]
    fn test_empty_quoted_value_allowed() {
        let descs = parse(r#"&(stdin="")"#).unwrap();
        assert_eq!(descs[0].get("stdin").unwrap(), &plain(&[""]));
    }
}
