//! Serializer for attribute maps.
//!
//! The output is deterministic and compact: no whitespace beyond the single
//! spaces separating values. Every value is quoted on the way out, whatever
//! its original spelling, so `parse` of the output recovers the same value
//! sequences.

use crate::{AttrValue, Description};

/// Quote one value: `"` normally, `'` when the value itself contains `"`.
///
/// No escaping of the other quote kind is attempted; a value containing both
/// quote characters cannot be represented losslessly. Known limitation of
/// the format, kept as-is.
fn quote(value: &str) -> String {
    if value.contains('"') {
        format!("'{value}'")
    } else {
        format!("\"{value}\"")
    }
}

fn quoted_list(values: &[String]) -> String {
    values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(" ")
}

/// Serialize a single description. An empty description yields an empty
/// string.
pub fn unparse(description: &Description) -> String {
    if description.is_empty() {
        return String::new();
    }
    let mut text = String::from("&");
    for (name, value) in description.iter() {
        text.push('(');
        text.push_str(name);
        text.push('=');
        match value {
            AttrValue::Plain(values) => text.push_str(&quoted_list(values)),
            AttrValue::Groups(groups) => {
                for group in groups {
                    text.push('(');
                    text.push_str(&quoted_list(group));
                    text.push(')');
                }
            }
        }
        text.push(')');
    }
    text
}

/// Serialize a batch of descriptions.
///
/// Returns `None` for an empty batch, never an empty string (that would be
/// indistinguishable from a batch of one empty description). A batch of
/// exactly one description omits the `+(...)` wrapper.
pub fn unparse_batch(descriptions: &[Description]) -> Option<String> {
    match descriptions {
        [] => None,
        [single] => Some(unparse(single)),
        _ => {
            let mut text = String::from("+");
            for description in descriptions {
                text.push('(');
                text.push_str(&unparse(description));
                text.push(')');
            }
            Some(text)
        }
    }
}
