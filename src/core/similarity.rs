use std::collections::BTreeSet;

/// Given-name groups that refer to the same name across languages and nicknames
const GIVEN_NAME_GROUPS: &[&[&str]] = &[
    &["william", "wilhelm", "guillaume", "guillermo", "bill", "billy", "will", "willy"],
    &["john", "johann", "juan", "jean", "giovanni", "jack", "johnny", "ivan", "sean"],
    &["mary", "maria", "marie", "maja", "molly", "polly", "miriam"],
    &["james", "jacques", "diego", "giacomo", "jim", "jimmy", "jamie", "jacob"],
    &["michael", "mikhail", "miguel", "michele", "mike", "micky", "mick"],
    &["joseph", "josef", "jose", "giuseppe", "joe", "yusuf", "youssef"],
    &["peter", "pierre", "pedro", "pietro", "piotr", "pete"],
    &["elizabeth", "elisabeth", "isabel", "isabella", "elisa", "liz", "beth"],
    &["mohammed", "muhammad", "mohammad", "mohamed", "mehmet"],
];

/// Surname spellings recorded as variants of one another
const SURNAME_GROUPS: &[&[&str]] = &[
    &["schmidt", "smith", "schmitt", "smidt"],
    &["mueller", "muller", "miller"],
    &["cohen", "kohen", "kohn", "cohn"],
    &["levy", "levi", "levey", "levie"],
    &["schneider", "snyder", "snider"],
    &["meyer", "meier", "mayer", "maier"],
];

/// Given names shared across Arabic naming traditions
const ARABIC_GIVEN_NAMES: [&str; 10] = [
    "ahmed", "mohammad", "muhammad", "hassan", "omar", "ali", "fatima", "aisha", "zahra", "hussein",
];

/// Surname prefixes that are spelling variants of each other
const GAELIC_PREFIXES: [&str; 2] = ["mac", "mc"];

/// Normalized edit-distance similarity in [0, 1]
#[inline]
pub fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Alphanumeric tokens of a string
pub fn tokens(text: &str) -> BTreeSet<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// True if the two strings share at least one token
pub fn shares_token(a: &str, b: &str) -> bool {
    let left = tokens(a);
    tokens(b).iter().any(|t| left.contains(t))
}

/// True if `phrase` occurs in `text` on token boundaries
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    let text: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    let phrase: Vec<&str> = phrase.split_whitespace().collect();
    if phrase.is_empty() || phrase.len() > text.len() {
        return false;
    }
    text.windows(phrase.len()).any(|w| w == phrase.as_slice())
}

fn in_same_group(groups: &[&[&str]], a: &str, b: &str) -> bool {
    groups
        .iter()
        .any(|group| group.contains(&a) && group.contains(&b))
}

/// Distinct given names known to be equivalent (e.g. "john" / "johann")
pub fn given_names_equivalent(a: &str, b: &str) -> bool {
    a != b && in_same_group(GIVEN_NAME_GROUPS, a, b)
}

/// Distinct surnames known to be spelling variants (e.g. "schmidt" / "smith",
/// "macdonald" / "mcdonald")
pub fn surnames_equivalent(a: &str, b: &str) -> bool {
    if a == b {
        return false;
    }
    if in_same_group(SURNAME_GROUPS, a, b) {
        return true;
    }
    let a_stem = strip_gaelic_prefix(a);
    let b_stem = strip_gaelic_prefix(b);
    a_stem.len() >= 3 && (a_stem != a || b_stem != b) && a_stem == b_stem
}

fn strip_gaelic_prefix(name: &str) -> &str {
    GAELIC_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name)
}

/// True if the name contains one of the shared Arabic given names as a token
pub fn has_arabic_given_name(name: &str) -> bool {
    tokens(name).iter().any(|t| ARABIC_GIVEN_NAMES.contains(t))
}

/// Industry keyword classes for professions
const INDUSTRIES: &[(&str, &[&str])] = &[
    ("technology", &["engineer", "developer", "programmer", "software", "tech", "it", "data", "ai"]),
    ("healthcare", &["doctor", "nurse", "physician", "medical", "healthcare", "hospital", "pharmacist"]),
    ("education", &["teacher", "professor", "educator", "academic", "school", "lecturer"]),
    ("finance", &["banker", "finance", "accounting", "accountant", "economist", "investment"]),
    ("business", &["manager", "executive", "entrepreneur", "business", "sales", "marketing"]),
    ("creative", &["artist", "designer", "writer", "musician", "creative", "media"]),
    ("service", &["consultant", "advisor", "service", "support", "customer"]),
    ("legal", &["lawyer", "attorney", "legal", "judge", "law"]),
    ("transportation", &["pilot", "driver", "transportation", "logistics", "aviation"]),
];

/// Classify a normalized profession into an industry
///
/// Short keywords must match a whole token; keywords of four or more letters
/// also match as a token prefix ("engineering" is technology).
pub fn classify_industry(profession: &str) -> Option<&'static str> {
    let words = tokens(profession);
    INDUSTRIES.iter().find_map(|(industry, keywords)| {
        let hit = keywords.iter().any(|kw| {
            words
                .iter()
                .any(|w| w == kw || (kw.len() >= 4 && w.starts_with(kw)))
        });
        hit.then_some(*industry)
    })
}

/// Cultural regions inferred from place names
const CULTURAL_REGIONS: &[(&str, &[&str])] = &[
    ("Middle East", &["uae", "dubai", "abu dhabi", "saudi", "qatar", "oman", "kuwait", "jordan", "lebanon"]),
    ("South Asia", &["india", "pakistan", "bangladesh", "sri lanka", "nepal"]),
    ("East Asia", &["china", "japan", "korea", "singapore", "taiwan", "hong kong"]),
    ("Europe", &["france", "germany", "italy", "spain", "uk", "ireland", "england", "poland", "netherlands"]),
    ("Africa", &["nigeria", "kenya", "ghana", "ethiopia", "egypt", "south africa"]),
    ("North America", &["usa", "united states", "canada", "mexico"]),
];

/// Infer a cultural region from a normalized location
pub fn infer_cultural_region(location: &str) -> Option<&'static str> {
    CULTURAL_REGIONS.iter().find_map(|(region, places)| {
        places
            .iter()
            .any(|place| contains_phrase(location, place))
            .then_some(*region)
    })
}
