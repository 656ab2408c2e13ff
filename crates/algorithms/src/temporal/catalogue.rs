//! Rule catalogue: the ordered list of window rules a filter pass applies
//!
//! Order matters. Rules do not commute, and every rule sees the sequence as
//! left by all rules before it, so the catalogue is data: it can be
//! inspected, serialized, edited and validated independently of the filter.

use serde::{Deserialize, Serialize};

use landseq_core::raster::{Label, LabelDomain, YearRange};
use landseq_core::{Error, Result};

use super::rule::Rule;

/// Ordered sequence of window rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalogue {
    rules: Vec<Rule>,
}

impl Catalogue {
    /// Create a catalogue from rules in execution order
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(Error::InvalidCatalogue("catalogue has no rules".into()));
        }
        Ok(Self { rules })
    }

    /// Start building a catalogue
    pub fn builder() -> CatalogueBuilder {
        CatalogueBuilder::default()
    }

    /// Rules in execution order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check the catalogue can run over `years` with labels from `domain`.
    ///
    /// Every rule needs at least one anchor year, and every label a rule
    /// matches or writes must be admissible.
    pub fn validate(&self, years: YearRange, domain: &LabelDomain) -> Result<()> {
        if self.rules.is_empty() {
            return Err(Error::InvalidCatalogue("catalogue has no rules".into()));
        }
        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.anchors(years).is_none() {
                return Err(Error::InvalidCatalogue(format!(
                    "rule #{} {} needs {} years, range {} has {}",
                    idx,
                    rule,
                    rule.window_len(),
                    years,
                    years.len()
                )));
            }
            if let Some(label) = rule.labels().into_iter().find(|l| !domain.contains(*l)) {
                return Err(Error::InvalidCatalogue(format!(
                    "rule #{} {} uses label {} outside of domain {}..={}",
                    idx, rule, label, domain.min, domain.max
                )));
            }
        }
        Ok(())
    }

    /// Parse a catalogue from JSON
    pub fn from_json(text: &str) -> Result<Self> {
        let catalogue: Catalogue = serde_json::from_str(text)?;
        Self::new(catalogue.rules)
    }

    /// Serialize the catalogue as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Catalogue for the wetland classification series.
    ///
    /// 1. Edge repairs: first year for 11, 12, 4, 3, 15; second-to-last
    ///    year for 19, 15.
    /// 2. Wetland (11) / grassland (12) context rules, then
    ///    deforestation-to-agriculture rules (forest 3, savanna 4 followed
    ///    by 12 and then 15 or 19 collapse to 15 / 19), then one-year
    ///    wetland excursions.
    /// 3. Blip removal for 4, 11, 12, 3, 15, 19, 33: five-, four- then
    ///    three-year windows per class.
    pub fn wetlands() -> Self {
        Self::builder()
            .first_edge(&[11, 12, 4, 3, 15])
            .last_edge(&[19, 15])
            // wet grassland vs wetland
            .pattern4([11, 12, 12, 12], 12)
            .pattern4([12, 11, 11, 11], 11)
            // deforestation goes to agriculture, not grassland
            .pattern4([3, 12, 12, 12], 15)
            .pattern4([3, 12, 12, 15], 15)
            .pattern4([3, 12, 12, 12], 19)
            .pattern4([3, 12, 12, 19], 19)
            .pattern4([4, 12, 12, 12], 15)
            .pattern4([4, 12, 12, 15], 15)
            .pattern4([4, 12, 12, 12], 19)
            .pattern4([4, 12, 12, 19], 19)
            .pattern4([19, 19, 12, 12], 12)
            .pattern4([19, 19, 19, 12], 12)
            .pattern3([19, 19, 12], 12)
            .pattern3([12, 19, 19], 12)
            .pattern3([3, 12, 15], 15)
            .pattern3([3, 12, 12], 15)
            .pattern3([4, 12, 15], 15)
            .pattern3([4, 12, 12], 15)
            // one-year excursions into wetland
            .pattern3([11, 12, 11], 11)
            .pattern3([11, 4, 11], 11)
            .pattern3([11, 3, 11], 11)
            // one-year excursions out of wetland
            .pattern3([3, 11, 3], 3)
            .pattern3([4, 11, 4], 4)
            .pattern3([12, 11, 12], 12)
            .class_sweeps(&[4, 11, 12, 3, 15, 19, 33])
            .into_catalogue()
    }
}

impl Default for Catalogue {
    fn default() -> Self {
        Self::wetlands()
    }
}

/// Incremental builder keeping rules in insertion order
#[derive(Debug, Clone, Default)]
pub struct CatalogueBuilder {
    rules: Vec<Rule>,
}

impl CatalogueBuilder {
    /// Append any rule
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// First-year repair for each class, in order
    pub fn first_edge(mut self, classes: &[u8]) -> Self {
        self.rules
            .extend(classes.iter().map(|&c| Rule::FirstEdge { class: Label(c) }));
        self
    }

    /// Second-to-last-year rule for each class, in order
    pub fn last_edge(mut self, classes: &[u8]) -> Self {
        self.rules
            .extend(classes.iter().map(|&c| Rule::LastEdge { class: Label(c) }));
        self
    }

    /// Three-year context rule
    pub fn pattern3(self, pattern: [u8; 3], replacement: u8) -> Self {
        self.rule(Rule::FixedPattern3 {
            pattern: pattern.map(Label),
            replacement: Label(replacement),
        })
    }

    /// Four-year context rule
    pub fn pattern4(self, pattern: [u8; 4], replacement: u8) -> Self {
        self.rule(Rule::FixedPattern4 {
            pattern: pattern.map(Label),
            replacement: Label(replacement),
        })
    }

    /// For each class in order: five-, four-, then three-year blip removal
    pub fn class_sweeps(mut self, classes: &[u8]) -> Self {
        for &code in classes {
            let class = Label(code);
            self.rules.push(Rule::SlidingClass5 { class });
            self.rules.push(Rule::SlidingClass4 { class });
            self.rules.push(Rule::SlidingClass3 { class });
        }
        self
    }

    /// Finish; fails on an empty rule list
    pub fn build(self) -> Result<Catalogue> {
        Catalogue::new(self.rules)
    }

    /// Finish without the emptiness check, for built-in catalogues
    fn into_catalogue(self) -> Catalogue {
        Catalogue { rules: self.rules }
    }
}
