// src/classify.rs
//! Keyword classifiers over file titles / captions.
//!
//! Both checks are plain lower-cased substring membership tests:
//! - `looks_paleoart`: no blocked term present AND at least one artwork term present.
//! - `looks_fossil_or_mount`: any fossil/specimen term present.
//!
//! Vocabularies are fixed data loaded once. A config file may replace them
//! (see `ResolverConfig::vocabulary`); the matching rules stay the same.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// Merchandise, film/game and fan-made material.
///
/// No `"jp"`: as a substring it would match every `.jpg` title.
pub const BLOCKED_TERMS: &[&str] = &[
    "toy",
    "lego",
    "figure",
    "statue",
    "sculpture",
    "mascot",
    "costume",
    "cosplay",
    "plush",
    "movie",
    "film",
    "jurassic park",
    "minecraft",
    "game",
    "animatronic",
    "theme park",
    "ride",
    "doll",
    "fan art",
    "parody",
    "action figure",
];

pub const ARTWORK_TERMS: &[&str] = &[
    "life restoration",
    "restoration",
    "paleoart",
    "reconstruction",
    "illustration",
    "painting",
    "drawn",
    "digital art",
    "artwork",
];

pub const FOSSIL_TERMS: &[&str] = &[
    "fossil",
    "holotype",
    "paratype",
    "specimen",
    "skull",
    "skeleton",
    "mounted",
    "mount",
    "cast",
    "bone",
    "bones",
    "femur",
    "vertebra",
    "museum",
    "exhibit",
    "excavation",
    "track",
    "footprint",
    "ichnofossil",
    "fossilised",
    "fossilized",
    "fossils",
];

/// Term lists driving the classifiers. Terms are matched lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub blocked: Vec<String>,
    pub artwork: Vec<String>,
    pub fossil: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        fn own(terms: &[&str]) -> Vec<String> {
            terms.iter().map(|t| t.to_string()).collect()
        }
        Self {
            blocked: own(BLOCKED_TERMS),
            artwork: own(ARTWORK_TERMS),
            fossil: own(FOSSIL_TERMS),
        }
    }
}

static DEFAULT_VOCABULARY: Lazy<Vocabulary> = Lazy::new(Vocabulary::default);

impl Vocabulary {
    /// Shared built-in vocabulary.
    pub fn builtin() -> &'static Vocabulary {
        &DEFAULT_VOCABULARY
    }

    /// Trim + lower-case every term and drop empties.
    pub fn normalized(self) -> Self {
        fn clean(v: Vec<String>) -> Vec<String> {
            v.into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        }
        Self {
            blocked: clean(self.blocked),
            artwork: clean(self.artwork),
            fossil: clean(self.fossil),
        }
    }

    pub fn looks_paleoart(&self, text: &str) -> bool {
        let s = text.to_lowercase();
        if contains_any(&s, &self.blocked) {
            return false;
        }
        contains_any(&s, &self.artwork)
    }

    pub fn looks_fossil_or_mount(&self, text: &str) -> bool {
        contains_any(&text.to_lowercase(), &self.fossil)
    }
}

fn contains_any(haystack: &str, terms: &[String]) -> bool {
    terms.iter().any(|t| haystack.contains(t.as_str()))
}

/// `Vocabulary::looks_paleoart` with the built-in terms.
pub fn looks_paleoart(text: &str) -> bool {
    Vocabulary::builtin().looks_paleoart(text)
}

/// `Vocabulary::looks_fossil_or_mount` with the built-in terms.
pub fn looks_fossil_or_mount(text: &str) -> bool {
    Vocabulary::builtin().looks_fossil_or_mount(text)
}
