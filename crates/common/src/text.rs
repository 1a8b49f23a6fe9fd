//! Text normalization shared by heading matching, chunking and title search

/// Collapse whitespace runs into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip diacritics from common Latin letters
pub fn fold_accents(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        other => other,
    }
}

/// Case-insensitive, whitespace-normalized form used for title search
pub fn search_key(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

/// Case- and accent-insensitive form used for keyword matching
pub fn match_key(text: &str) -> String {
    fold_accents(&collapse_whitespace(text)).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Tasa \t  apertura\n"), "Tasa apertura");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_match_key_folds_case_and_accents() {
        assert_eq!(match_key("Métricas  generales"), "METRICAS GENERALES");
        assert_eq!(match_key("CAMPAÑAS"), match_key("campanas"));
    }

    #[test]
    fn test_search_key_keeps_accents() {
        assert_eq!(search_key("  MÉTRICAS   Generales"), "métricas generales");
    }
}
