use validator::{ValidationErrors, ValidationErrorsKind};

/// Flattens `validator` errors, including those of nested structs and lists,
/// into a single `"; "`-joined message.
///
/// Errors without a custom message fall back to `"<field> is invalid"`.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect(errors, &mut messages);
    messages.sort();
    messages.join("; ")
}

fn collect(errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|e| match &e.message {
                    Some(m) => m.to_string(),
                    None => format!("{field} is invalid"),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, out),
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    collect(inner, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Marker {
        #[validate(range(min = -90.0, max = 90.0, message = "lat must be between -90 and 90"))]
        lat: f64,
        #[validate(length(min = 1))]
        name: String,
    }

    #[test]
    fn joins_custom_and_default_messages() {
        let marker = Marker {
            lat: 120.0,
            name: String::new(),
        };
        let errs = marker.validate().unwrap_err();
        let msg = format_validation_errors(&errs);
        assert!(msg.contains("lat must be between -90 and 90"));
        assert!(msg.contains("name is invalid"));
    }

    #[derive(Validate)]
    struct Outer {
        #[validate(nested)]
        inner: Marker,
    }

    #[test]
    fn nested_struct_messages_are_included() {
        let outer = Outer {
            inner: Marker {
                lat: 0.0,
                name: String::new(),
            },
        };
        let errs = outer.validate().unwrap_err();
        assert_eq!(format_validation_errors(&errs), "name is invalid");
    }
}
