use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Escapes square brackets so a title cannot open or close an option block.
pub fn escape_title(title: &str) -> String {
    title.replace('[', r"\[").replace(']', r"\]")
}

/// Title escaping for relationship entries, which are also comma separated.
pub fn escape_relationship_title(title: &str) -> String {
    escape_title(title).replace(',', r"\,")
}

/// Converts a title into a DocBook-safe anchor fragment.
///
/// `"Installing the Product!"` becomes `"Installing_the_Product"`.
pub fn docbook_escape_title(title: &str) -> String {
    let normalized: String = title.nfkd().filter(|ch| !is_combining_mark(*ch)).collect();

    let mut out = String::new();
    let mut pending_space = false;
    for ch in normalized.chars().skip_while(|ch| !ch.is_alphabetic()) {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if !(ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-')) {
            continue;
        }
        if pending_space {
            out.push('_');
            pending_space = false;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_titles_escape_commas_too() {
        assert_eq!(escape_title("A [b], c"), r"A \[b\], c");
        assert_eq!(escape_relationship_title("A [b], c"), r"A \[b\]\, c");
    }

    #[test]
    fn docbook_titles_drop_punctuation_and_accents() {
        assert_eq!(
            docbook_escape_title("Installing the Product!"),
            "Installing_the_Product"
        );
        assert_eq!(docbook_escape_title("1. Café  Setup"), "Cafe_Setup");
        assert_eq!(docbook_escape_title("  "), "");
    }
}
