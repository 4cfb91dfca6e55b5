//! Core data model types for examforge.
//!
//! Content packs hold immutable [`Entry`] definitions. Selection turns those
//! into attempt-scoped [`Question`] records whose answer payload is a
//! [`QuestionBody`] variant, one per question type.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Knowledge domain, numbered 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
    Fundamentals = 1,
    Calculations = 2,
    Compliance = 3,
    SystemsControls = 4,
    ReportingEthics = 5,
}

impl Domain {
    /// Every domain in id order.
    pub const ALL: [Domain; 5] = [
        Domain::Fundamentals,
        Domain::Calculations,
        Domain::Compliance,
        Domain::SystemsControls,
        Domain::ReportingEthics,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.id() == id)
    }

    /// Display name used in breakdowns and reports.
    pub fn name(self) -> &'static str {
        match self {
            Domain::Fundamentals => "Payroll Fundamentals",
            Domain::Calculations => "Calculations",
            Domain::Compliance => "Compliance",
            Domain::SystemsControls => "Systems & Controls",
            Domain::ReportingEthics => "Reporting & Ethics",
        }
    }

    /// Reverse lookup against the fixed domain-name table.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.name() == name)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Domain::from_id)
            .ok_or_else(|| format!("unknown domain: {s}"))
    }
}

// Domains travel as integers but must also work as JSON/TOML map keys,
// which always arrive as strings.
impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.id())
    }
}

impl<'de> Deserialize<'de> for Domain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DomainVisitor;

        impl Visitor<'_> for DomainVisitor {
            type Value = Domain;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a domain id between 1 and 5")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Domain, E> {
                u8::try_from(v)
                    .ok()
                    .and_then(Domain::from_id)
                    .ok_or_else(|| E::custom(format!("unknown domain: {v}")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Domain, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("unknown domain: {v}")))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Domain, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(DomainVisitor)
    }
}

/// Question difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

impl TryFrom<String> for Difficulty {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Difficulty> for &'static str {
    fn from(d: Difficulty) -> Self {
        d.as_str()
    }
}

/// The seven supported question shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum QuestionType {
    /// Single choice.
    Mcq,
    /// Multiple choice, any number of correct options.
    Msq,
    Numeric,
    /// Free-text fill-in.
    Fill,
    Order,
    Match,
    MultiNumeric,
}

impl QuestionType {
    /// Stable key order used by the selection engine.
    pub const ALL: [QuestionType; 7] = [
        QuestionType::Mcq,
        QuestionType::Msq,
        QuestionType::Numeric,
        QuestionType::Fill,
        QuestionType::Order,
        QuestionType::Match,
        QuestionType::MultiNumeric,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Mcq => "mcq",
            QuestionType::Msq => "msq",
            QuestionType::Numeric => "numeric",
            QuestionType::Fill => "fill",
            QuestionType::Order => "order",
            QuestionType::Match => "match",
            QuestionType::MultiNumeric => "multi_numeric",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcq" | "single-choice" => Ok(QuestionType::Mcq),
            "msq" | "multi-choice" => Ok(QuestionType::Msq),
            "numeric" => Ok(QuestionType::Numeric),
            "fill" | "free-text" => Ok(QuestionType::Fill),
            "order" | "ordering" => Ok(QuestionType::Order),
            "match" | "matching" => Ok(QuestionType::Match),
            "multi_numeric" | "multi-part-numeric" => Ok(QuestionType::MultiNumeric),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

impl TryFrom<String> for QuestionType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<QuestionType> for &'static str {
    fn from(t: QuestionType) -> Self {
        t.as_str()
    }
}

/// Practice mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Mode {
    Timed,
    Study,
    Drills,
    Domain,
    Weakness,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Timed,
        Mode::Study,
        Mode::Drills,
        Mode::Domain,
        Mode::Weakness,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Timed => "timed",
            Mode::Study => "study",
            Mode::Drills => "drills",
            Mode::Domain => "domain",
            Mode::Weakness => "weakness",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Timed => "Timed Exam",
            Mode::Study => "Untimed Study",
            Mode::Drills => "Math Drills",
            Mode::Domain => "Domain Focus",
            Mode::Weakness => "Weakness Mode",
        }
    }

    /// Whether per-question feedback and worked steps are shown while answering.
    pub fn feedback(self) -> bool {
        !matches!(self, Mode::Timed)
    }

    /// Whether the attempt ends automatically when its time limit runs out.
    pub fn time_limited(self) -> bool {
        matches!(self, Mode::Timed | Mode::Domain | Mode::Weakness)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "timed" => Ok(Mode::Timed),
            "study" => Ok(Mode::Study),
            "drills" | "drill" => Ok(Mode::Drills),
            "domain" => Ok(Mode::Domain),
            "weakness" => Ok(Mode::Weakness),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Mode> for &'static str {
    fn from(m: Mode) -> Self {
        m.as_str()
    }
}

/// The declared type of a content entry.
///
/// Unknown type strings are kept rather than rejected so a single odd entry
/// does not invalidate a whole pack; such entries hydrate to unscorable
/// questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryType {
    Known(QuestionType),
    Other(String),
}

impl EntryType {
    pub fn known(&self) -> Option<QuestionType> {
        match self {
            EntryType::Known(t) => Some(*t),
            EntryType::Other(_) => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::Known(t) => write!(f, "{t}"),
            EntryType::Other(s) => f.write_str(s),
        }
    }
}

/// A canonical answer as written in content or returned by a generator.
///
/// The shape is coerced to what the question type needs at hydration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Index(usize),
    Number(f64),
    Indices(Vec<usize>),
    Numbers(Vec<f64>),
    Text(String),
}

impl Answer {
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Answer::Index(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_indices(&self) -> Option<Vec<usize>> {
        match self {
            Answer::Indices(v) => Some(v.clone()),
            Answer::Numbers(v) => v
                .iter()
                .map(|n| (n.fract() == 0.0 && *n >= 0.0).then_some(*n as usize))
                .collect(),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Answer::Index(i) => Some(*i as f64),
            Answer::Number(n) => Some(*n),
            Answer::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_numbers(&self) -> Option<Vec<f64>> {
        match self {
            Answer::Numbers(v) => Some(v.clone()),
            Answer::Indices(v) => Some(v.iter().map(|i| *i as f64).collect()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Answer::Text(s) => Some(s.clone()),
            Answer::Index(i) => Some(i.to_string()),
            Answer::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A generator parameter: a scalar or a list of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    List(Vec<f64>),
}

/// Reference to a registered generator plus its parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSpec {
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

/// A static question or parametric template, as shipped in a content pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Identifier of a static question. Templates derive ids at hydration.
    #[serde(default)]
    pub id: Option<String>,
    /// Knowledge domain the entry belongs to.
    pub domain: Domain,
    pub difficulty: Difficulty,
    /// Declared question type (`type` in TOML).
    #[serde(rename = "type")]
    pub kind: EntryType,
    /// Registry key of the generator that fills in this entry.
    #[serde(default)]
    pub template_id: Option<String>,
    /// Parameter ranges handed to the generator.
    #[serde(default)]
    pub generator: Option<GeneratorSpec>,
    /// Question text. Generated entries may leave it to the generator.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Options for single and multiple choice questions.
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    /// Canonical answer; its shape depends on the question type.
    #[serde(default)]
    pub answer: Option<Answer>,
    /// Absolute tolerance for numeric answers.
    #[serde(default)]
    pub tolerance: Option<f64>,
    /// Relative tolerance, preferred over `tolerance` when set.
    #[serde(default)]
    pub relative_tolerance: Option<f64>,
    /// Prefix shown before numeric answers, e.g. `$`.
    #[serde(default)]
    pub unit_hint: Option<String>,
    /// Groups of accepted synonyms for free-text answers.
    #[serde(default)]
    pub acceptable: Option<Vec<Vec<String>>>,
    /// Items to put in order.
    #[serde(default)]
    pub items: Option<Vec<String>>,
    /// Left column of a matching question.
    #[serde(default)]
    pub left: Option<Vec<String>>,
    /// Right column of a matching question.
    #[serde(default)]
    pub right: Option<Vec<String>>,
    /// Indices into `items` in their correct order.
    #[serde(default)]
    pub correct_order: Option<Vec<usize>>,
    #[serde(default)]
    pub explanation: Option<String>,
    /// Worked solution steps, revealed as hints.
    #[serde(default)]
    pub steps: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Only offered when fun mode is switched on.
    #[serde(default)]
    pub fun_only: bool,
}

impl Entry {
    /// A bare entry of the given shape, used as a starting point by tests
    /// and by pack authors building entries in code.
    pub fn new(domain: Domain, difficulty: Difficulty, kind: QuestionType) -> Self {
        Self {
            id: None,
            domain,
            difficulty,
            kind: EntryType::Known(kind),
            template_id: None,
            generator: None,
            prompt: None,
            choices: None,
            answer: None,
            tolerance: None,
            relative_tolerance: None,
            unit_hint: None,
            acceptable: None,
            items: None,
            left: None,
            right: None,
            correct_order: None,
            explanation: None,
            steps: None,
            tags: Vec::new(),
            fun_only: false,
        }
    }

    pub fn is_template(&self) -> bool {
        self.template_id.is_some()
    }
}

/// A content pack: metadata plus its entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Whether the pack is switched on in a fresh installation.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub questions: Vec<Entry>,
}

fn default_true() -> bool {
    true
}

/// One candidate in an attempt's selection universe.
#[derive(Debug, Clone, Copy)]
pub struct PoolEntry<'a> {
    pub pack_id: &'a str,
    pub entry: &'a Entry,
}

/// Answer payload of a hydrated question, one variant per question type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionBody {
    #[serde(rename = "mcq")]
    SingleChoice { choices: Vec<String>, answer: usize },
    #[serde(rename = "msq")]
    MultiChoice { choices: Vec<String>, answer: Vec<usize> },
    Numeric {
        answer: f64,
        tolerance: f64,
        #[serde(default)]
        relative_tolerance: Option<f64>,
    },
    #[serde(rename = "fill")]
    FreeText {
        answer: String,
        #[serde(default)]
        acceptable: Vec<Vec<String>>,
    },
    #[serde(rename = "order")]
    Ordering {
        items: Vec<String>,
        correct_order: Vec<usize>,
    },
    #[serde(rename = "match")]
    Matching {
        left: Vec<String>,
        right: Vec<String>,
        answer: Vec<usize>,
    },
    MultiNumeric { answer: Vec<f64>, tolerance: f64 },
    /// Placeholder for unknown types, missing generators and incomplete
    /// static content. Always scores zero.
    Unscorable { declared_type: String },
}

impl QuestionBody {
    pub fn kind(&self) -> Option<QuestionType> {
        match self {
            QuestionBody::SingleChoice { .. } => Some(QuestionType::Mcq),
            QuestionBody::MultiChoice { .. } => Some(QuestionType::Msq),
            QuestionBody::Numeric { .. } => Some(QuestionType::Numeric),
            QuestionBody::FreeText { .. } => Some(QuestionType::Fill),
            QuestionBody::Ordering { .. } => Some(QuestionType::Order),
            QuestionBody::Matching { .. } => Some(QuestionType::Match),
            QuestionBody::MultiNumeric { .. } => Some(QuestionType::MultiNumeric),
            QuestionBody::Unscorable { .. } => None,
        }
    }

    /// Type label used in breakdowns.
    pub fn type_label(&self) -> String {
        match self {
            QuestionBody::Unscorable { declared_type } => declared_type.clone(),
            other => other
                .kind()
                .map(|k| k.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    /// The canonical answer in the same JSON shape a response would take.
    pub fn answer_value(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            QuestionBody::SingleChoice { answer, .. } => json!(answer),
            QuestionBody::MultiChoice { answer, .. } => json!(answer),
            QuestionBody::Numeric { answer, .. } => json!(answer),
            QuestionBody::FreeText { answer, .. } => json!(answer),
            QuestionBody::Ordering { correct_order, .. } => json!(correct_order),
            QuestionBody::Matching { answer, .. } => json!(answer),
            QuestionBody::MultiNumeric { answer, .. } => json!(answer),
            QuestionBody::Unscorable { .. } => serde_json::Value::Null,
        }
    }
}

/// A hydrated, attempt-scoped question.
///
/// Self-contained: it carries no reference back to its template or the
/// generator registry, so it can be persisted and reused for retakes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique within one attempt.
    pub id: String,
    /// Pack the source entry came from.
    pub pack_id: String,
    /// Generator that produced this question, for templated entries.
    #[serde(default)]
    pub template_id: Option<String>,
    pub domain: Domain,
    /// Display name of `domain`, resolved at hydration.
    pub domain_name: String,
    pub difficulty: Difficulty,
    /// Final prompt text with generated values filled in.
    pub prompt: String,
    /// Type-specific options and canonical answer.
    #[serde(flatten)]
    pub body: QuestionBody,
    #[serde(default)]
    pub unit_hint: Option<String>,
    #[serde(default)]
    pub explanation: String,
    /// Worked solution steps.
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub fun_only: bool,
    /// Raw generator inputs, kept for traceability.
    #[serde(default)]
    pub variant: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_names_round_trip() {
        for domain in Domain::ALL {
            assert_eq!(Domain::from_name(domain.name()), Some(domain));
        }
        assert_eq!(Domain::from_name("Astrology"), None);
        assert_eq!(Domain::from_id(6), None);
    }

    #[test]
    fn domain_accepts_integers_and_strings() {
        let d: Domain = serde_json::from_str("3").unwrap();
        assert_eq!(d, Domain::Compliance);
        let d: Domain = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(d, Domain::SystemsControls);
        assert!(serde_json::from_str::<Domain>("9").is_err());
        assert_eq!(serde_json::to_string(&Domain::Calculations).unwrap(), "2");
    }

    #[test]
    fn domain_works_as_map_key() {
        let mut weights = BTreeMap::new();
        weights.insert(Domain::Fundamentals, 0.2);
        weights.insert(Domain::ReportingEthics, 0.1);
        let json = serde_json::to_string(&weights).unwrap();
        assert_eq!(json, r#"{"1":0.2,"5":0.1}"#);
        let back: BTreeMap<Domain, f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, weights);

        let from_toml: BTreeMap<Domain, f64> = toml::from_str("1 = 0.5\n2 = 0.5\n").unwrap();
        assert_eq!(from_toml.len(), 2);
    }

    #[test]
    fn question_type_parse_and_aliases() {
        assert_eq!("mcq".parse::<QuestionType>().unwrap(), QuestionType::Mcq);
        assert_eq!(
            "multi-part-numeric".parse::<QuestionType>().unwrap(),
            QuestionType::MultiNumeric
        );
        assert_eq!(QuestionType::MultiNumeric.to_string(), "multi_numeric");
        assert!("essay".parse::<QuestionType>().is_err());
    }

    #[test]
    fn mode_and_difficulty_parse_leniently() {
        assert_eq!(" Drill ".parse::<Mode>().unwrap(), Mode::Drills);
        assert_eq!("weakness".parse::<Mode>().unwrap(), Mode::Weakness);
        assert_eq!("exam".parse::<Mode>().unwrap_err(), "unknown mode: exam");
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(Difficulty::Medium.to_string(), "medium");

        let mode: Mode = serde_json::from_str("\"study\"").unwrap();
        assert_eq!(mode, Mode::Study);
        assert_eq!(serde_json::to_string(&Mode::Drills).unwrap(), "\"drills\"");
    }

    #[test]
    fn mode_flags() {
        assert!(!Mode::Timed.feedback());
        assert!(Mode::Timed.time_limited());
        assert!(Mode::Study.feedback());
        assert!(!Mode::Study.time_limited());
        assert!(!Mode::Drills.time_limited());
        assert_eq!(Mode::Weakness.label(), "Weakness Mode");
    }

    #[test]
    fn entry_type_keeps_unknown_strings() {
        let known: EntryType = serde_json::from_str("\"numeric\"").unwrap();
        assert_eq!(known, EntryType::Known(QuestionType::Numeric));
        let other: EntryType = serde_json::from_str("\"essay\"").unwrap();
        assert_eq!(other, EntryType::Other("essay".into()));
        assert_eq!(other.known(), None);
    }

    #[test]
    fn answer_coercions() {
        assert_eq!(Answer::Index(950).as_number(), Some(950.0));
        assert_eq!(Answer::Numbers(vec![0.0, 2.0]).as_indices(), Some(vec![0, 2]));
        assert_eq!(Answer::Numbers(vec![0.5]).as_indices(), None);
        assert_eq!(Answer::Indices(vec![1, 2]).as_numbers(), Some(vec![1.0, 2.0]));
        assert_eq!(Answer::Text("12.5".into()).as_number(), Some(12.5));
        assert_eq!(Answer::Index(3).as_text(), Some("3".into()));
    }

    #[test]
    fn question_serde_roundtrip_flattens_body() {
        let question = Question {
            id: "q1".into(),
            pack_id: "core".into(),
            template_id: None,
            domain: Domain::Calculations,
            domain_name: Domain::Calculations.name().into(),
            difficulty: Difficulty::Medium,
            prompt: "Gross pay?".into(),
            body: QuestionBody::Numeric {
                answer: 950.0,
                tolerance: 0.02,
                relative_tolerance: None,
            },
            unit_hint: Some("$".into()),
            explanation: String::new(),
            steps: vec![],
            tags: vec![],
            fun_only: false,
            variant: None,
        };
        let json = serde_json::to_value(&question).unwrap();
        assert_eq!(json["type"], "numeric");
        assert_eq!(json["answer"], 950.0);
        let back: Question = serde_json::from_value(json).unwrap();
        assert_eq!(back, question);
    }
}
