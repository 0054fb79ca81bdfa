use crate::errors::TemplateError;

/// Substitutes `{name}` fields in `template`.
///
/// Follows keyword-only `str.format` rules: `{{` and `}}` are literal braces,
/// every field must be present in `values`, and a stray brace is an error.
pub fn render(template: &str, values: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    if inner == '{' {
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    return Err(TemplateError::UnbalancedBrace {
                        brace: '{',
                        position: pos,
                    });
                }
                // Conversion and format-spec suffixes do not change the lookup key.
                let key = name.split([':', '!']).next().unwrap_or_default();
                let value = values
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| *v)
                    .ok_or_else(|| TemplateError::MissingPlaceholder {
                        name: key.to_string(),
                    })?;
                out.push_str(value);
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(TemplateError::UnbalancedBrace {
                        brace: '}',
                        position: pos,
                    });
                }
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUES: &[(&str, &str)] = &[("question", "Q?"), ("context", "C.")];

    #[test]
    fn substitutes_fields() {
        let s = render("Question: {question}\nContext: {context}\n", VALUES).unwrap();
        assert_eq!(s, "Question: Q?\nContext: C.\n");
    }

    #[test]
    fn values_are_not_reinterpreted() {
        let s = render("{context}", &[("context", "{question}")]).unwrap();
        assert_eq!(s, "{question}");
    }

    #[test]
    fn doubled_braces_are_literal() {
        let s = render("{{\"q\": \"{question}\"}}", VALUES).unwrap();
        assert_eq!(s, "{\"q\": \"Q?\"}");
    }

    #[test]
    fn unknown_field_fails() {
        let err = render("Use {documents}", VALUES).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingPlaceholder {
                name: "documents".into()
            }
        );
    }

    #[test]
    fn positional_field_fails() {
        let err = render("{}", VALUES).unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder { name } if name.is_empty()));
    }

    #[test]
    fn stray_braces_fail() {
        assert!(matches!(
            render("open { never closed", VALUES),
            Err(TemplateError::UnbalancedBrace { brace: '{', .. })
        ));
        assert!(matches!(
            render("close } alone", VALUES),
            Err(TemplateError::UnbalancedBrace { brace: '}', .. })
        ));
    }
}
