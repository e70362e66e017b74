//! Company-name normalization for stable cache fingerprints.
//!
//! "PayPal, Inc." and "paypal" must map to the same key, so we strip legal
//! suffixes, fold accented characters to ASCII, and drop everything that is
//! not a lowercase letter or digit.

/// Legal suffixes ordered by descending length so the longest match strips
/// first ("limited liability company" before "company").
const LEGAL_SUFFIXES: &[&str] = &[
    " limited liability company",
    " incorporated",
    " corporation",
    " l.l.c.",
    " limited",
    " p.l.c.",
    " company",
    " corp.",
    " corp",
    " gmbh",
    " inc.",
    " s.a.",
    " ltd.",
    " sarl",
    " inc",
    " llc",
    " ltd",
    " llp",
    " co.",
    " plc",
    " ag",
    " bv",
    " co",
    " lp",
    " nv",
];

/// Normalize a company name to a stable lowercase token.
///
/// Returns an empty string for empty input (callers treat that as
/// unfingerprintable).
pub fn normalize_company_name(name: &str) -> String {
    let mut normalized = name.trim().to_lowercase();

    // Strip legal suffixes repeatedly ("Acme Corp Ltd" → "acme").
    loop {
        let mut removed = false;
        for suffix in LEGAL_SUFFIXES {
            if let Some(stripped) = normalized.strip_suffix(suffix) {
                // A comma before the suffix belongs to it ("PayPal, Inc.").
                normalized = stripped.trim_end().trim_end_matches(',').to_string();
                removed = true;
                break;
            }
        }
        if !removed {
            break;
        }
    }

    let mut out = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        match c {
            'a'..='z' | '0'..='9' => out.push(c),
            'à' | 'â' | 'ä' | 'á' | 'ã' | 'å' => out.push('a'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'î' | 'ï' | 'í' | 'ì' => out.push('i'),
            'ô' | 'ö' | 'ó' | 'ò' | 'õ' => out.push('o'),
            'ù' | 'û' | 'ü' | 'ú' => out.push('u'),
            'ç' => out.push('c'),
            'ñ' => out.push('n'),
            'ÿ' | 'ý' => out.push('y'),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            // Punctuation, whitespace, and unknown non-ASCII: dropped.
            _ => {}
        }
    }
    out
}
