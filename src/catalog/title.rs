// Title matching helpers: noise stripping, sequence numbers, fuzzy similarity

use regex::Regex;
use std::sync::LazyLock;

const ARABIC_ORDINALS: [&str; 10] = [
    "الأول",
    "الثاني",
    "الثالث",
    "الرابع",
    "الخامس",
    "السادس",
    "السابع",
    "الثامن",
    "التاسع",
    "العاشر",
];

static RE_SEASON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bseason\s*\d+").unwrap());
static RE_SEASON_AR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"الموسم\s*(?:{}|\d+)", ARABIC_ORDINALS.join("|"))).unwrap()
});
static RE_SHORT_SEASON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bs\d+\b").unwrap());
static RE_PART: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bpart\s*\d+").unwrap());
static RE_PART_AR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"الجزء\s*(?:{}|\d+)", ARABIC_ORDINALS.join("|"))).unwrap()
});
static RE_RELEASE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:movie|ova|special)(?:\s*\d+)?\b").unwrap());
static RE_RELEASE_TAG_AR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"فيلم(?:\s*\d+)?").unwrap());
static RE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());
static RE_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[:\-–—()\[\]]").unwrap());
static RE_SPACE_COLLAPSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static RE_TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*$").unwrap());
static RE_SEASON_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)season\s*([0-9]+)").unwrap());
static RE_SEASON_NUMBER_AR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"الموسم\s*({}|[0-9]+)", ARABIC_ORDINALS.join("|"))).unwrap()
});
static RE_PART_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)part\s*([0-9]+)").unwrap());
static RE_PART_NUMBER_AR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"الجزء\s*({}|[0-9]+)", ARABIC_ORDINALS.join("|"))).unwrap()
});

/// Canonical comparison key for a title.
/// "Attack on Titan Season 2 (2017)" and "attack on titan" both become
/// "attack on titan". The result is a fixed point: normalizing it again
/// returns it unchanged.
pub fn normalize_title(title: &str) -> String {
    // After the first pass every change is a removal, so the loop terminates
    let mut current = clean_pass(title);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_pass(title: &str) -> String {
    let s = title.trim().to_lowercase();
    let s = RE_SEASON.replace_all(&s, "");
    let s = RE_SEASON_AR.replace_all(&s, "");
    let s = RE_SHORT_SEASON.replace_all(&s, "");
    let s = RE_PART.replace_all(&s, "");
    let s = RE_PART_AR.replace_all(&s, "");
    let s = RE_RELEASE_TAG.replace_all(&s, "");
    let s = RE_RELEASE_TAG_AR.replace_all(&s, "");
    let s = RE_YEAR.replace_all(&s, "");
    let s = RE_PUNCTUATION.replace_all(&s, " ");
    RE_SPACE_COLLAPSE.replace_all(&s, " ").trim().to_string()
}

/// Sequence number used to order related titles ("Naruto 3", "Season 2",
/// "الموسم الثاني"). Zero counts as no number.
pub fn extract_title_number(title: &str) -> Option<u32> {
    let captured = RE_TRAILING_NUMBER
        .captures(title)
        .or_else(|| RE_SEASON_NUMBER_AR.captures(title))
        .or_else(|| RE_SEASON_NUMBER.captures(title))
        .or_else(|| RE_PART_NUMBER.captures(title))
        .or_else(|| RE_PART_NUMBER_AR.captures(title))?;

    let token = captured.get(1)?.as_str();
    let number = match ARABIC_ORDINALS.iter().position(|o| *o == token) {
        Some(index) => index as u32 + 1,
        None => token.parse().ok()?,
    };

    (number > 0).then_some(number)
}

/// Two titles name the same franchise when their normalized forms are equal,
/// or when at least `threshold` of the significant words (longer than two
/// characters) of the shorter title appear in the other one, exactly or as a
/// substring either way.
pub fn titles_similar(a: &str, b: &str, threshold: f64) -> bool {
    let a = normalize_title(a);
    let b = normalize_title(b);

    if a == b {
        return true;
    }
    if a.chars().count().min(b.chars().count()) < 3 {
        return false;
    }

    let words_a = significant_words(&a);
    let words_b = significant_words(&b);
    if words_a.is_empty() || words_b.is_empty() {
        return false;
    }

    let (fewer, more) = if words_a.len() <= words_b.len() {
        (&words_a, &words_b)
    } else {
        (&words_b, &words_a)
    };

    let matching = fewer
        .iter()
        .filter(|w| {
            more.iter()
                .any(|other| w == &other || w.contains(*other) || other.contains(**w))
        })
        .count();

    matching as f64 / fewer.len() as f64 >= threshold
}

fn significant_words(normalized: &str) -> Vec<&str> {
    normalized
        .split(' ')
        .filter(|w| w.chars().count() > 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title_strips_sequence_noise() {
        assert_eq!(normalize_title("Attack on Titan Season 2"), "attack on titan");
        assert_eq!(normalize_title("Attack on Titan S3"), "attack on titan");
        assert_eq!(normalize_title("Naruto: Part 2"), "naruto");
        assert_eq!(normalize_title("One Piece Movie 14"), "one piece");
        assert_eq!(normalize_title("Bleach OVA"), "bleach");
        assert_eq!(normalize_title("Dune (2021)"), "dune");
        assert_eq!(normalize_title("  Spider-Man   [Special]  "), "spider man");
    }

    #[test]
    fn test_normalize_title_arabic() {
        assert_eq!(normalize_title("المؤسس عثمان الموسم الثاني"), "المؤسس عثمان");
        assert_eq!(normalize_title("قيامة أرطغرل الجزء 3"), "قيامة أرطغرل");
        assert_eq!(normalize_title("فيلم المحقق كونان"), "المحقق كونان");
    }

    #[test]
    fn test_normalize_title_keeps_words_that_only_contain_tags() {
        assert_eq!(normalize_title("Movies of Summer"), "movies of summer");
        assert_eq!(normalize_title("Specialist"), "specialist");
        assert_eq!(normalize_title("Parthenon"), "parthenon");
        assert_eq!(normalize_title("Suits"), "suits");
    }

    #[test]
    fn test_normalize_title_is_idempotent() {
        let titles = [
            "Attack on Titan Season 2 (2017)",
            "Movie: The Movie 2",
            "S1 - s2 - Part 3 - 1999",
            "Fate/Zero [OVA] — Special",
            "الموسم الأول",
            "",
            "   ",
            "Season Season 1 1",
        ];
        for title in titles {
            let once = normalize_title(title);
            assert_eq!(normalize_title(&once), once, "not idempotent for {:?}", title);
        }
    }

    #[test]
    fn test_normalize_title_unwraps_deeply_nested_tags() {
        // Removing the inner "فيلم" glues its neighbours into a new one each pass
        let title = format!("x {}فيلم{}", "في".repeat(10), "لم".repeat(10));
        let once = normalize_title(&title);
        assert_eq!(once, "x");
        assert_eq!(normalize_title(&once), once);

        let deeper = format!("Show {}الجزء 1{}", "ال".repeat(12), "جزء".repeat(12));
        let once = normalize_title(&deeper);
        assert_eq!(normalize_title(&once), once);
    }

    #[test]
    fn test_extract_title_number() {
        assert_eq!(extract_title_number("Naruto 3"), Some(3));
        assert_eq!(extract_title_number("Attack on Titan Season 2 Final"), Some(2));
        assert_eq!(extract_title_number("Kingdom Part 4 (Extended)"), Some(4));
        assert_eq!(extract_title_number("المؤسس عثمان الموسم الثاني"), Some(2));
        assert_eq!(extract_title_number("قيامة أرطغرل الجزء الخامس"), Some(5));
        assert_eq!(extract_title_number("Frozen"), None);
        assert_eq!(extract_title_number("Episode 0"), None);
    }

    #[test]
    fn test_titles_similar() {
        assert!(titles_similar("Foo", "Foo 2", 0.6));
        assert!(titles_similar("Attack on Titan", "Attack on Titan Season 3", 0.6));
        assert!(titles_similar("The Dark Knight", "The Dark Knight Rises", 0.6));
        assert!(!titles_similar("The Dark Knight", "Knight and Day", 0.6));
        assert!(!titles_similar("Up", "Us", 0.6));
        assert!(titles_similar("Up", "Up 2009", 0.6));
    }

    #[test]
    fn test_titles_similar_threshold() {
        // one of two significant words matches
        assert!(titles_similar("Blue Planet", "Blue Lagoon", 0.5));
        assert!(!titles_similar("Blue Planet", "Blue Lagoon", 0.6));
    }
}
