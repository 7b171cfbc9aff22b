//! Ingredient parsing against the configured unit table.
//!
//! Parses raw ingredient strings (e.g., "1 1/2 cups flour, sifted") into a
//! quantity, a unit id and the remaining description.

use serde::{Deserialize, Serialize};

use crate::model::MeasurementSystem;

/// One unit of measure and the spellings that refer to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDefinition {
    pub id: String,
    /// `None` for system-neutral units (pinch, clove, ...)
    #[serde(default)]
    pub system: Option<MeasurementSystem>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl UnitDefinition {
    fn new(id: &str, system: Option<MeasurementSystem>, aliases: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            system,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitTable {
    pub units: Vec<UnitDefinition>,
}

impl UnitTable {
    pub fn new(units: Vec<UnitDefinition>) -> Self {
        Self { units }
    }

    pub fn find(&self, id: &str) -> Option<&UnitDefinition> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn system_of(&self, id: &str) -> Option<MeasurementSystem> {
        self.find(id).and_then(|u| u.system)
    }

    /// Every spelling with its unit id, longest first so that "tablespoons"
    /// wins over "tb"
    fn spellings(&self) -> Vec<Spelling<'_>> {
        let mut spellings: Vec<Spelling<'_>> = self
            .units
            .iter()
            .flat_map(|u| {
                std::iter::once(u.id.as_str())
                    .chain(u.aliases.iter().map(String::as_str))
                    .map(move |text| Spelling {
                        text,
                        unit_id: u.id.as_str(),
                    })
            })
            .collect();
        spellings.sort_by(|a, b| b.text.len().cmp(&a.text.len()));
        spellings
    }
}

struct Spelling<'a> {
    text: &'a str,
    unit_id: &'a str,
}

impl Spelling<'_> {
    /// Single-letter spellings ("T" vs "t") are case-sensitive
    fn is_prefix_of(&self, s: &str) -> bool {
        match s.get(..self.text.len()) {
            Some(prefix) if self.text.len() == 1 => prefix == self.text,
            Some(prefix) => prefix.eq_ignore_ascii_case(self.text),
            None => false,
        }
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        use MeasurementSystem::{Metric, Us};

        Self::new(vec![
            // Metric
            UnitDefinition::new("g", Some(Metric), &["gram", "grams", "gr"]),
            UnitDefinition::new("kg", Some(Metric), &["kilogram", "kilograms", "kgs"]),
            UnitDefinition::new("mg", Some(Metric), &["milligram", "milligrams"]),
            UnitDefinition::new("ml", Some(Metric), &["milliliter", "milliliters", "millilitre", "millilitres", "mL"]),
            UnitDefinition::new("l", Some(Metric), &["liter", "liters", "litre", "litres", "L"]),
            UnitDefinition::new("cl", Some(Metric), &["centiliter", "centiliters"]),
            UnitDefinition::new("dl", Some(Metric), &["deciliter", "deciliters"]),
            // US
            UnitDefinition::new("cup", Some(Us), &["cups", "c"]),
            UnitDefinition::new("tbsp", Some(Us), &["tablespoon", "tablespoons", "tbs", "tb", "T"]),
            UnitDefinition::new("tsp", Some(Us), &["teaspoon", "teaspoons", "ts", "t"]),
            UnitDefinition::new("oz", Some(Us), &["ounce", "ounces"]),
            UnitDefinition::new("fl-oz", Some(Us), &["fl oz", "fl. oz", "fluid ounce", "fluid ounces"]),
            UnitDefinition::new("lb", Some(Us), &["lbs", "pound", "pounds"]),
            UnitDefinition::new("pint", Some(Us), &["pints", "pt"]),
            UnitDefinition::new("quart", Some(Us), &["quarts", "qt"]),
            UnitDefinition::new("gallon", Some(Us), &["gallons", "gal"]),
            // Count
            UnitDefinition::new("pinch", None, &["pinches"]),
            UnitDefinition::new("clove", None, &["cloves"]),
            UnitDefinition::new("slice", None, &["slices"]),
            UnitDefinition::new("can", None, &["cans"]),
            UnitDefinition::new("piece", None, &["pieces", "pcs", "pc"]),
            UnitDefinition::new("bunch", None, &["bunches"]),
            UnitDefinition::new("sprig", None, &["sprigs"]),
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedIngredient {
    pub description: String,
    pub quantity: Option<f64>,
    pub unit_of_measure_id: Option<String>,
}

pub trait IngredientParser: Send + Sync {
    fn parse_ingredients(&self, lines: &[String], units: &UnitTable) -> Vec<ParsedIngredient>;
}

/// Quantity + unit + description splitter
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultIngredientParser;

impl IngredientParser for DefaultIngredientParser {
    fn parse_ingredients(&self, lines: &[String], units: &UnitTable) -> Vec<ParsedIngredient> {
        let spellings = units.spellings();
        lines
            .iter()
            .map(|line| parse_ingredient(line, &spellings))
            .collect()
    }
}

fn parse_ingredient(raw: &str, spellings: &[Spelling<'_>]) -> ParsedIngredient {
    let raw = raw.trim();
    let (quantity, rest) = extract_quantity(raw);
    let (unit, rest) = extract_unit(&rest, spellings);

    let rest = rest.trim();
    let description = rest.strip_prefix("of ").unwrap_or(rest).trim().to_string();

    ParsedIngredient {
        description: if description.is_empty() {
            raw.to_string()
        } else {
            description
        },
        quantity,
        unit_of_measure_id: unit,
    }
}

/// Extract a quantity from the beginning of a string.
/// Returns (quantity, remaining_string).
fn extract_quantity(s: &str) -> (Option<f64>, String) {
    let words: Vec<&str> = s.split_whitespace().collect();
    let Some(first) = words.first() else {
        return (None, String::new());
    };

    // Mixed number: "1 1/2" or "1 ½"
    if let (Some(whole), Some(second)) = (parse_integer(first), words.get(1)) {
        if let Some(frac) = parse_fraction(second) {
            return (Some(whole + frac), words[2..].join(" "));
        }
    }

    // Whole-word quantity: "1/2", "½", "2-3", "1.5"
    if let Some(value) = parse_number_word(first) {
        return (Some(value), words[1..].join(" "));
    }

    // Quantity glued to its unit: "200g", "1½cups"
    let numeric_len = first
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.' || *c == ',' || vulgar_fraction(*c).is_some())
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    if numeric_len > 0 {
        if let Some(value) = parse_number_word(&first[..numeric_len]) {
            let mut rest = vec![&first[numeric_len..]];
            rest.extend_from_slice(&words[1..]);
            return (Some(value), rest.join(" ").trim().to_string());
        }
    }

    (None, s.to_string())
}

fn parse_number_word(word: &str) -> Option<f64> {
    // Ranges use the lower bound
    if let Some((low, high)) = word.split_once(['-', '–']) {
        if !low.is_empty() && !high.is_empty() {
            if let (Some(low), Some(_)) = (parse_simple_number(low), parse_simple_number(high)) {
                return Some(low);
            }
        }
    }
    parse_simple_number(word)
}

fn parse_simple_number(word: &str) -> Option<f64> {
    if let Some(frac) = parse_fraction(word) {
        return Some(frac);
    }

    // "1½"
    let mut chars = word.chars();
    if let Some(last) = chars.next_back() {
        if let Some(frac) = vulgar_fraction(last) {
            let whole = chars.as_str();
            if whole.is_empty() {
                return Some(frac);
            }
            return parse_integer(whole).map(|w| w + frac);
        }
    }

    if word.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
        && word.chars().any(|c| c.is_ascii_digit())
    {
        return word.replace(',', ".").parse::<f64>().ok();
    }

    None
}

fn parse_integer(word: &str) -> Option<f64> {
    if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) {
        word.parse::<f64>().ok()
    } else {
        None
    }
}

/// "1/2" or a single unicode vulgar fraction
fn parse_fraction(word: &str) -> Option<f64> {
    if let Some((num, den)) = word.split_once(['/', '⁄']) {
        let num = parse_integer(num)?;
        let den = parse_integer(den)?;
        if den == 0.0 {
            return None;
        }
        return Some(num / den);
    }

    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => vulgar_fraction(c),
        _ => None,
    }
}

fn vulgar_fraction(c: char) -> Option<f64> {
    match c {
        '½' => Some(0.5),
        '⅓' => Some(1.0 / 3.0),
        '⅔' => Some(2.0 / 3.0),
        '¼' => Some(0.25),
        '¾' => Some(0.75),
        '⅕' => Some(0.2),
        '⅛' => Some(0.125),
        '⅜' => Some(0.375),
        '⅝' => Some(0.625),
        '⅞' => Some(0.875),
        _ => None,
    }
}

/// Extract a unit from the beginning of a string.
/// Returns (unit id, remaining_string).
fn extract_unit(s: &str, spellings: &[Spelling<'_>]) -> (Option<String>, String) {
    let s = s.trim();

    for spelling in spellings {
        if !spelling.is_prefix_of(s) {
            continue;
        }
        // Make sure it's a word boundary
        let after = &s[spelling.text.len()..];
        if after.is_empty()
            || after.starts_with(|c: char| c.is_whitespace() || c == '.' || c == ',')
        {
            let remaining = after.trim_start_matches(['.', ',']).trim();
            return (Some(spelling.unit_id.to_string()), remaining.to_string());
        }
    }

    (None, s.to_string())
}
