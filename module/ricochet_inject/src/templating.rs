//! Substitutes the correlation callback into a payload template.
//!
//! Four equivalent placeholder spellings are recognized so payload
//! libraries written for other OAST tools (Interactsh, Burp Collaborator)
//! drop in unmodified.

const PLACEHOLDERS: &[&str] = &["{{CALLBACK}}", "{{callback}}", "{CALLBACK}", "${CALLBACK}"];

/// Replaces every placeholder occurrence in `template` with `callback_url`.
///
/// A template with no placeholder at all is returned unchanged — some
/// payloads (a plain `sleep(5)` timing probe) have nothing to substitute.
#[must_use]
pub fn render(template: &str, callback_url: &str) -> String {
    let mut out = template.to_string();
    for placeholder in PLACEHOLDERS {
        out = out.replace(placeholder, callback_url);
    }
    out
}

/// `true` if `template` contains at least one recognized placeholder.
#[must_use]
pub fn has_placeholder(template: &str) -> bool {
    PLACEHOLDERS.iter().any(|p| template.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_all_four_spellings() {
        for placeholder in PLACEHOLDERS {
            let template = format!("hit {placeholder} now");
            assert_eq!(render(&template, "http://abc.oast.example"), "hit http://abc.oast.example now");
        }
    }

    #[test]
    fn leaves_templates_without_a_placeholder_untouched() {
        assert_eq!(render("sleep(5)", "http://abc.oast.example"), "sleep(5)");
    }

    #[test]
    fn detects_presence_of_a_placeholder() {
        assert!(has_placeholder("<img src=${CALLBACK}>"));
        assert!(!has_placeholder("no placeholder here"));
    }
}
