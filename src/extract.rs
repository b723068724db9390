use regex::Regex;
use std::sync::OnceLock;

const QUOTE_CHARS: &[char] = &['"', '\u{201C}', '\u{201D}'];

fn bold_span() -> &'static Regex {
    static BOLD: OnceLock<Regex> = OnceLock::new();
    BOLD.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold span pattern"))
}

/// Pulls the translation out of a model reply.
///
/// Models tend to offer alternatives with the preferred phrasing in bold, so
/// the first `**...**` span wins. Without one, the reply is cut at the first
/// line break or `*`. Surrounding quotes are stripped. Returns `None` when
/// nothing is left.
pub fn extract_translation(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let picked = match bold_span().captures(raw).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw
            .split(|ch| matches!(ch, '\r' | '\n' | '*'))
            .next()
            .unwrap_or_default(),
    };
    let cleaned = picked.trim().trim_matches(QUOTE_CHARS).trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::extract_translation;

    #[test]
    fn first_bold_span_wins() {
        assert_eq!(
            extract_translation("Some text **Hola Mundo** more text").as_deref(),
            Some("Hola Mundo")
        );
        assert_eq!(
            extract_translation("Options:\n1. **Zapatos Rojos**\n2. **Calzado Rojo**").as_deref(),
            Some("Zapatos Rojos")
        );
    }

    #[test]
    fn plain_reply_keeps_first_line() {
        assert_eq!(
            extract_translation("Bonjour\nautre ligne").as_deref(),
            Some("Bonjour")
        );
        assert_eq!(
            extract_translation("  Hej världen\r\n(Swedish)").as_deref(),
            Some("Hej världen")
        );
    }

    #[test]
    fn trailing_asterisk_is_cut() {
        assert_eq!(
            extract_translation("Rote Schuhe *(literal)").as_deref(),
            Some("Rote Schuhe")
        );
    }

    #[test]
    fn straight_and_curly_quotes_are_stripped() {
        assert_eq!(
            extract_translation("\"Chapeau bleu\"").as_deref(),
            Some("Chapeau bleu")
        );
        assert_eq!(
            extract_translation("**\u{201C}Sombrero azul\u{201D}**").as_deref(),
            Some("Sombrero azul")
        );
    }

    #[test]
    fn nothing_usable_yields_none() {
        assert_eq!(extract_translation(""), None);
        assert_eq!(extract_translation("   \n  "), None);
        assert_eq!(extract_translation("****"), None);
        assert_eq!(extract_translation("\"\""), None);
    }
}
