//! Query templates.
//!
//! A template is plain text with `{column}` placeholders naming entity
//! attributes. `{{` and `}}` produce literal braces. Positional fields, format
//! specs, conversions and indexing are rejected as malformed.

use std::collections::BTreeMap;

use crate::errors::TemplateError;

/// Substitute every placeholder in `template` from `attributes`.
///
/// # Errors
///
/// Returns [`TemplateError::MissingPlaceholder`] for the first placeholder with
/// no matching attribute, or [`TemplateError::Malformed`] if the braces do not
/// balance.
pub fn render(
    template: &str,
    attributes: &BTreeMap<String, String>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, next)| next == '{').is_some() {
                    out.push('{');
                    continue;
                }

                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    match inner {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => {
                            return Err(TemplateError::Malformed {
                                offset,
                                reason: "unexpected '{' in field name",
                            });
                        }
                        other => name.push(other),
                    }
                }

                if !closed {
                    return Err(TemplateError::Malformed {
                        offset,
                        reason: "expected '}' before end of string",
                    });
                }
                if name.is_empty() {
                    return Err(TemplateError::Malformed {
                        offset,
                        reason: "positional fields are not supported",
                    });
                }
                if name.contains([':', '!', '.', '[']) {
                    return Err(TemplateError::Malformed {
                        offset,
                        reason: "format specs, conversions and indexing are not supported",
                    });
                }

                let value = attributes
                    .get(&name)
                    .ok_or(TemplateError::MissingPlaceholder(name))?;
                out.push_str(value);
            }
            '}' => {
                if chars.next_if(|&(_, next)| next == '}').is_some() {
                    out.push('}');
                } else {
                    return Err(TemplateError::Malformed {
                        offset,
                        reason: "single '}' encountered",
                    });
                }
            }
            other => out.push(other),
        }
    }

    Ok(out)
}
