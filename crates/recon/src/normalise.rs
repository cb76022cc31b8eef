/// Canonical comparison form: non-alphanumeric runs become one space, lowercased, trimmed.
///
/// Applied identically to query text and to every comparable record field.
pub fn normalise(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }

    out
}

/// `normalise` for optional fields; `None` maps to the empty string.
pub fn normalise_opt(text: Option<&str>) -> String {
    text.map(normalise).unwrap_or_default()
}

/// Whitespace-delimited tokens of an already normalised string.
pub fn tokens(normalised: &str) -> impl Iterator<Item = &str> {
    normalised.split_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_case_collapse() {
        assert_eq!(normalise("Wind Farm"), "wind farm");
        assert_eq!(normalise("WIND, farm!!"), "wind farm");
        assert_eq!(normalise("  West--Moray   Wind_Farm (Phase 2) "), "west moray wind farm phase 2");
    }

    #[test]
    fn idempotent() {
        for s in ["Aberarder Wind Farm", "  ..Solar///PARK.. ", "Ynni Cymunedol Sir Gâr", ""] {
            let once = normalise(s);
            assert_eq!(normalise(&once), once);
        }
    }

    #[test]
    fn empty_and_symbol_only() {
        assert_eq!(normalise(""), "");
        assert_eq!(normalise("   "), "");
        assert_eq!(normalise("!!! --- ???"), "");
        assert_eq!(normalise_opt(None), "");
    }

    #[test]
    fn non_latin_scripts_kept() {
        assert_eq!(normalise("Gâr—Ynni"), "gâr ynni");
        assert_eq!(normalise("ВЕТЕР, парк"), "ветер парк");
    }

    #[test]
    fn tokens_split_on_spaces() {
        let n = normalise("East Coast: Solar Park");
        assert_eq!(tokens(&n).collect::<Vec<_>>(), vec!["east", "coast", "solar", "park"]);
    }
}
