//! JSON summary types for downstream code generators
//!
//! Plain mirror structs over the translation output, so emitters can
//! consume strata, static flags and the DNF table without touching the
//! session's internal tables.

use crate::dependency::Stratum;
use crate::literal::predicate_of;
use crate::ruleset::Entry;
use crate::translate::{Translation, TranslationProfile};
use serde::{Deserialize, Serialize};

/// One rule-table head with its stratum and definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadJson {
    pub head: String,
    /// Absent when the stratifier never assigned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stratum: Option<u32>,
    #[serde(rename = "static")]
    pub is_static: bool,
    /// Absent for tautologies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disjuncts: Option<Vec<Vec<String>>>,
}

/// Whole-translation summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationJson {
    /// Heads in ascending stratum order.
    pub heads: Vec<HeadJson>,
    /// State-true literals of the first game state.
    pub initial: Vec<String>,
    pub warnings: Vec<String>,
    pub profile: TranslationProfile,
}

impl TranslationJson {
    pub fn from_translation(translation: &Translation) -> Self {
        let heads = translation
            .ordered_heads()
            .into_iter()
            .map(|head| {
                let stratum = match translation.deps.stratum_of_literal(&head) {
                    Stratum::Known(s) => Some(s),
                    _ => None,
                };
                let disjuncts = match translation.rules.entry(&head) {
                    Some(Entry::Rules(disjuncts)) => Some(
                        disjuncts
                            .iter()
                            .map(|d| d.iter().cloned().collect())
                            .collect(),
                    ),
                    _ => None,
                };
                HeadJson {
                    is_static: translation.deps.is_static(predicate_of(&head)),
                    stratum,
                    disjuncts,
                    head,
                }
            })
            .collect();

        TranslationJson {
            heads,
            initial: translation.rules.initial_trues().iter().cloned().collect(),
            warnings: translation.warnings.iter().map(|w| w.to_string()).collect(),
            profile: translation.profile.clone(),
        }
    }

    pub fn to_string_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
