//! Canonical net naming.
//!
//! Highest tier with any label wins; within the winning tier every label
//! must agree on one text, otherwise the net is ambiguous and falls back to
//! its anonymous name while the conflict is reported.

use itertools::Itertools;
use sch_model::LabelKind;

use crate::trace::NetLabel;

/// Naming tiers, highest priority first.
const TIER_ORDER: [LabelKind; 4] = [
    LabelKind::Power,
    LabelKind::Global,
    LabelKind::Hierarchical,
    LabelKind::Local,
];

pub(crate) fn tier_name(kind: LabelKind) -> &'static str {
    match kind {
        LabelKind::Power => "power",
        LabelKind::Global => "global",
        LabelKind::Hierarchical => "hierarchical",
        LabelKind::Local => "local",
    }
}

/// Outcome of applying the naming policy to one merged group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChosenName {
    Named(String),
    /// No label of any tier – synthesize an anonymous name.
    Anonymous,
    /// The winning tier carried more than one distinct text.
    Conflict {
        tier: &'static str,
        candidates: Vec<String>,
    },
}

pub(crate) fn choose_name(labels: &[NetLabel]) -> ChosenName {
    for kind in TIER_ORDER {
        let texts: Vec<&String> = labels
            .iter()
            .filter(|label| label.kind == kind)
            .map(|label| &label.text)
            .unique()
            .sorted()
            .collect();
        match texts.as_slice() {
            [] => continue,
            [text] => return ChosenName::Named((*text).clone()),
            _ => {
                return ChosenName::Conflict {
                    tier: tier_name(kind),
                    candidates: texts.into_iter().cloned().collect(),
                };
            }
        }
    }
    ChosenName::Anonymous
}
