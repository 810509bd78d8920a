//! Operator-editable content.
use crate::hydrate::{lenient_seq, lenient_strings, or_default};
use crate::step::Step;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Names shown throughout the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoupleNames {
    pub from: String,
    pub to: String,
}

impl Default for CoupleNames {
    fn default() -> Self {
        Self {
            from: "Alex".to_string(),
            to: "Sam".to_string(),
        }
    }
}

/// Headline and subtitle for one step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepCopy {
    pub headline: String,
    pub subtitle: String,
}

impl StepCopy {
    fn new(headline: &str, subtitle: &str) -> Self {
        Self {
            headline: headline.to_string(),
            subtitle: subtitle.to_string(),
        }
    }
}

/// Per-step copy, one slot per [`Step`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepCopyTable {
    pub landing: StepCopy,
    pub puzzle: StepCopy,
    pub message: StepCopy,
    pub places: StepCopy,
    pub outfits: StepCopy,
    pub summary: StepCopy,
}

impl Default for StepCopyTable {
    fn default() -> Self {
        Self {
            landing: StepCopy::new("A little something for you", "Tap to begin"),
            puzzle: StepCopy::new("First, a riddle", "Only you would know the answer"),
            message: StepCopy::new("A note before we go", "Read this one slowly"),
            places: StepCopy::new("Where shall we eat?", "Pick a dinner, a snack and a dessert"),
            outfits: StepCopy::new("What should I wear?", "Your call, entirely"),
            summary: StepCopy::new("It's a date", "Here's the plan"),
        }
    }
}

impl StepCopyTable {
    #[must_use]
    pub const fn get(&self, step: Step) -> &StepCopy {
        match step {
            Step::Landing => &self.landing,
            Step::Puzzle => &self.puzzle,
            Step::Message => &self.message,
            Step::Places => &self.places,
            Step::Outfits => &self.outfits,
            Step::Summary => &self.summary,
        }
    }
}

/// A venue the visitor can pick.
///
/// Tags double as itinerary categories (`dinner`, `snack`, `dessert`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub link_url: String,
    #[serde(deserialize_with = "lenient_strings")]
    pub tags: Vec<String>,
    pub budget: String,
    pub hours: String,
    #[serde(deserialize_with = "or_default")]
    pub pros: Option<String>,
    #[serde(deserialize_with = "or_default")]
    pub cons: Option<String>,
}

impl Place {
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// An outfit suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Outfit {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: String,
    pub style: String,
    #[serde(deserialize_with = "lenient_strings")]
    pub palette: Vec<String>,
}

/// Background music reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicTrack {
    pub url: String,
    pub title: String,
}

/// Content shown to every visitor, editable by the operator.
///
/// Always consumed hydrated (see [`crate::hydrate`]), so every section is present
/// even when the stored document is partial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentConfig {
    pub couple: CoupleNames,
    pub steps: StepCopyTable,
    #[serde(deserialize_with = "lenient_seq")]
    pub places: Vec<Place>,
    #[serde(deserialize_with = "lenient_seq")]
    pub outfits: Vec<Outfit>,
    pub music: MusicTrack,
    pub admin_passcode: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            couple: CoupleNames::default(),
            steps: StepCopyTable::default(),
            places: default_places(),
            outfits: default_outfits(),
            music: MusicTrack {
                url: "/static/audio/theme.mp3".to_string(),
                title: "Our song".to_string(),
            },
            admin_passcode: "1234".to_string(),
        }
    }
}

impl ContentConfig {
    #[must_use]
    pub fn place(&self, id: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn outfit(&self, id: &str) -> Option<&Outfit> {
        self.outfits.iter().find(|o| o.id == id)
    }

    pub fn places_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Place> + 'a {
        self.places.iter().filter(move |p| p.has_tag(tag))
    }

    #[must_use]
    pub const fn copy_for(&self, step: Step) -> &StepCopy {
        self.steps.get(step)
    }

    /// Compare an admin passcode attempt. Surrounding whitespace is ignored and an
    /// empty configured passcode never matches.
    #[must_use]
    pub fn verify_passcode(&self, attempt: &str) -> bool {
        let expected = self.admin_passcode.trim();
        if expected.is_empty() {
            return false;
        }
        Sha256::digest(attempt.trim().as_bytes()) == Sha256::digest(expected.as_bytes())
    }
}

fn place(id: &str, name: &str, description: &str, tags: &[&str], budget: &str, hours: &str) -> Place {
    Place {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        image: format!("/static/img/places/{id}.jpg"),
        link_url: String::new(),
        tags: tags.iter().map(|t| (*t).to_string()).collect(),
        budget: budget.to_string(),
        hours: hours.to_string(),
        pros: None,
        cons: None,
    }
}

fn default_places() -> Vec<Place> {
    vec![
        place("trattoria", "Little Trattoria", "Handmade pasta by candlelight", &["dinner", "cozy"], "$$", "17:00-22:00"),
        place("ramen-bar", "Ramen Bar", "Steaming bowls, no reservations", &["dinner", "casual"], "$", "11:30-23:00"),
        place("night-market", "Night Market", "Skewers and dumplings under the lights", &["snack"], "$", "18:00-00:00"),
        place("gelateria", "Gelateria", "Pistachio is non-negotiable", &["dessert"], "$", "12:00-23:00"),
        place("patisserie", "Patisserie", "Tarts, eclairs and strong coffee", &["dessert", "cozy"], "$$", "08:00-19:00"),
    ]
}

fn outfit(id: &str, name: &str, style: &str, palette: &[&str]) -> Outfit {
    Outfit {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        image: format!("/static/img/outfits/{id}.jpg"),
        style: style.to_string(),
        palette: palette.iter().map(|c| (*c).to_string()).collect(),
    }
}

fn default_outfits() -> Vec<Outfit> {
    vec![
        outfit("classic", "Classic evening", "formal", &["#1d1d1f", "#f5f5f7"]),
        outfit("weekend", "Weekend easy", "casual", &["#3a6ea5", "#f2e8cf"]),
        outfit("bold", "Something bold", "statement", &["#c1121f", "#fdf0d5"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrate::hydrate;
    use serde_json::json;

    #[test]
    fn defaults_have_every_section_populated() {
        let cfg = ContentConfig::default();
        assert!(!cfg.places.is_empty());
        assert!(!cfg.outfits.is_empty());
        for step in Step::ALL {
            assert!(!cfg.copy_for(step).headline.is_empty());
        }
    }

    #[test]
    fn wire_names_are_camel_case() {
        let value = serde_json::to_value(ContentConfig::default()).unwrap();
        assert!(value.get("adminPasscode").is_some());
        assert!(value["places"][0].get("linkUrl").is_some());
    }

    #[test]
    fn partial_document_hydrates_missing_sections() {
        let cfg: ContentConfig = hydrate(&json!({
            "couple": { "to": "Jordan" },
            "places": [ { "id": "pier", "name": "The Pier", "tags": ["snack"] } ]
        }));
        assert_eq!(cfg.couple.from, "Alex");
        assert_eq!(cfg.couple.to, "Jordan");
        assert_eq!(cfg.places.len(), 1);
        assert_eq!(cfg.places[0].budget, "");
        assert_eq!(cfg.steps, StepCopyTable::default());
        assert_eq!(cfg.outfits, ContentConfig::default().outfits);
    }

    #[test]
    fn a_bad_leaf_keeps_the_rest_of_the_entity() {
        let cfg: ContentConfig = hydrate(&json!({
            "places": [
                { "id": "a", "pros": 5 },
                { "id": "b", "tags": ["dinner", 7] },
                { "id": "c" }
            ],
            "outfits": [ { "id": "bold", "palette": ["#c1121f", false] } ]
        }));
        let ids: Vec<&str> = cfg.places.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(cfg.places[0].pros, None);
        assert_eq!(cfg.places[1].tags, vec!["dinner"]);
        assert_eq!(cfg.outfit("bold").map(|o| o.palette.clone()), Some(vec!["#c1121f".to_string()]));
    }

    #[test]
    fn lookups_find_by_id_and_tag() {
        let cfg = ContentConfig::default();
        assert_eq!(cfg.place("gelateria").map(|p| p.name.as_str()), Some("Gelateria"));
        assert!(cfg.place("missing").is_none());
        assert_eq!(cfg.outfit("bold").map(|o| o.style.as_str()), Some("statement"));
        let desserts: Vec<&str> = cfg.places_tagged("DESSERT").map(|p| p.id.as_str()).collect();
        assert_eq!(desserts, vec!["gelateria", "patisserie"]);
    }

    #[test]
    fn passcode_check_trims_and_rejects_empty() {
        let mut cfg = ContentConfig::default();
        assert!(cfg.verify_passcode(" 1234 "));
        assert!(!cfg.verify_passcode("4321"));
        cfg.admin_passcode = "   ".to_string();
        assert!(!cfg.verify_passcode(""));
    }
}
