// ============================================================
// Layer 3 — Language Pairs and Code Normalisation
// ============================================================
// Experiment tables identify languages by whatever code the
// original dataset used: 2-letter ISO 639-1 for dep and pos,
// ISO 639-3 for el and mt. The distance engine wants glottocodes.
//
// Normalisation is two dictionary lookups in a row:
//
//   "fr" ──ISO_639_3_MAPPING──▶ "fra" ──glottocode map──▶ "stan1290"
//
// Every lookup falls back to the identity, so a code that is
// already a glottocode (or simply unknown) passes through as-is.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 2-letter codes found in the dep and pos tables and their ISO 639-3 form.
pub const ISO_639_3_MAPPING: &[(&str, &str)] = &[
    ("cs", "ces"), // Czech
    ("ru", "rus"), // Russian
    ("no", "nor"), // Norwegian
    ("es", "spa"), // Spanish
    ("ko", "kor"), // Korean
    ("et", "ekk"), // Estonian
    ("pl", "pol"), // Polish
    ("nl", "nld"), // Dutch
    ("pt", "por"), // Portuguese
    ("la", "lat"), // Latin
    ("fr", "fra"), // French
    ("de", "deu"), // German
    ("hi", "hin"), // Hindi
    ("ca", "cat"), // Catalan
    ("it", "ita"), // Italian
    ("en", "eng"), // English
    ("fi", "fin"), // Finnish
    ("bg", "bul"), // Bulgarian
    ("sl", "slv"), // Slovenian
    ("sk", "slk"), // Slovak
    ("ro", "ron"), // Romanian
    ("hr", "hrv"), // Croatian
    ("ar", "ara"), // Arabic
    ("lv", "lav"), // Latvian
    ("he", "heb"), // Hebrew
    ("uk", "ukr"), // Ukrainian
    ("id", "ind"), // Indonesian
    ("da", "dan"), // Danish
    ("sv", "swe"), // Swedish
    ("zh", "zho"), // Chinese (Mandarin)
    ("kk", "kaz"), // Kazakh
    ("hy", "hye"), // Armenian
    ("lt", "lit"), // Lithuanian
    ("be", "bel"), // Belarusian
    ("mr", "mar"), // Marathi
    ("ta", "tam"), // Tamil
    ("ga", "gle"), // Irish
    ("hu", "hun"), // Hungarian
    ("te", "tel"), // Telugu
    ("af", "afr"), // Afrikaans
    ("vi", "vie"), // Vietnamese
    ("ug", "uig"), // Uighur
    ("el", "ell"), // Greek
    ("gl", "glg"), // Galician
    ("sr", "srp"), // Serbian
    ("tr", "tur"), // Turkish
    ("ur", "urd"), // Urdu
    ("cu", "chu"), // Church Slavic
    ("fa", "pes"), // Persian
    ("eu", "eus"), // Basque
    ("ja", "jpn"), // Japanese
    ("am", "amh"), // Amharic
    ("th", "tha"), // Thai
    ("yo", "yor"), // Yoruba
    ("tl", "tgl"), // Tagalog
    ("br", "bre"), // Breton
    ("sa", "san"), // Sanskrit
    ("fo", "fao"), // Faroese
];

/// ISO 639-3 macro-language codes with no glottocode of their own in the
/// glottocode map, and the glottocode used in their place.
pub const MANUAL_CODE_FIXES: &[(&str, &str)] = &[
    ("alb", "alba1267"), // Albanian
    ("ara", "stan1318"), // Arabic
    ("aze", "nort2697"), // Azerbaijani
    ("zho", "mand1415"), // Chinese (Mandarin)
    ("est", "esto1258"), // Estonian
    ("msa", "stan1306"), // Malay
    ("orm", "east2652"), // Oromo
    ("fas", "west2369"), // Persian
    ("swa", "swah1253"), // Swahili
];

// ─── LanguagePair ─────────────────────────────────────────────────────────────
/// An ordered pair: (target/source/task language, transfer/aux language).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguagePair {
    pub first:  String,
    pub second: String,
}

impl LanguagePair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first:  first.into(),
            second: second.into(),
        }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

// ─── CodeMap ──────────────────────────────────────────────────────────────────
/// A single lookup table with identity fallback.
#[derive(Debug, Clone, Default)]
pub struct CodeMap {
    entries: HashMap<String, String>,
}

impl CodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from static `(from, to)` pairs.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut map = Self::new();
        map.extend(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        map
    }

    /// Insert or override entries. Later entries win.
    pub fn extend<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.entries.extend(pairs);
    }

    /// Look a code up; unknown codes come back unchanged.
    pub fn map<'a>(&'a self, code: &'a str) -> &'a str {
        self.entries.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─── CodeNormalizer ───────────────────────────────────────────────────────────
/// The two-stage normaliser: optional 2-letter → ISO 639-3, then
/// ISO 639-3 → glottocode.
#[derive(Debug, Clone)]
pub struct CodeNormalizer {
    iso3:       CodeMap,
    glottocode: CodeMap,
}

impl CodeNormalizer {
    /// `glottocode` should already contain the manual fixes
    /// (see `data::loader::load_glottocode_map`).
    pub fn new(glottocode: CodeMap) -> Self {
        Self {
            iso3: CodeMap::from_pairs(ISO_639_3_MAPPING),
            glottocode,
        }
    }

    /// Normalise a single code. The ISO 639-3 stage only runs when the
    /// task's tables use 2-letter codes.
    pub fn normalize(&self, code: &str, two_letter: bool) -> String {
        let iso = if two_letter { self.iso3.map(code) } else { code };
        self.glottocode.map(iso).to_string()
    }

    /// Normalise both sides of a pair.
    pub fn normalize_pair(&self, pair: &LanguagePair, two_letter: bool) -> LanguagePair {
        LanguagePair::new(
            self.normalize(&pair.first, two_letter),
            self.normalize(&pair.second, two_letter),
        )
    }
}
