//! Return validation against an item's checklist and photo guidelines.

use std::collections::{HashMap, HashSet};

use db::models::guideline::{GuidelineKind, ItemGuideline};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ReturnPhoto {
    pub guideline_id: Uuid,
    /// Name returned by the photo upload endpoint.
    pub photo: String,
}

/// What the borrower hands in when returning an item
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct ReturnSubmission {
    /// Ids of checklist guidelines the borrower ticked.
    #[serde(default)]
    pub checked: Vec<Uuid>,
    #[serde(default)]
    pub photos: Vec<ReturnPhoto>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GuidelineViolation {
    #[error("required checklist item '{label}' was not checked")]
    MissingChecklistItem { guideline_id: Uuid, label: String },
    #[error("required photo '{label}' is missing")]
    MissingPhoto { guideline_id: Uuid, label: String },
    #[error("guideline {guideline_id} does not belong to this item")]
    UnknownGuideline { guideline_id: Uuid },
    #[error("guideline {guideline_id} is a {expected} guideline")]
    KindMismatch {
        guideline_id: Uuid,
        expected: GuidelineKind,
    },
    #[error("guideline {guideline_id} was submitted more than once")]
    Duplicate { guideline_id: Uuid },
    #[error("photo for guideline {guideline_id} is empty")]
    EmptyPhoto { guideline_id: Uuid },
    #[error("photo '{photo}' has not been uploaded")]
    UnknownPhoto { guideline_id: Uuid, photo: String },
}

/// Per-guideline result of an accepted return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub guideline_id: Uuid,
    pub kind: GuidelineKind,
    pub label: String,
    pub satisfied: bool,
    pub photo: Option<String>,
}

/// Checks `submission` against `guidelines`.
///
/// Every problem is reported, not just the first. On success one outcome per
/// guideline is returned, optional ones marked unsatisfied when skipped.
pub fn validate_return(
    guidelines: &[ItemGuideline],
    submission: &ReturnSubmission,
) -> Result<Vec<CheckOutcome>, Vec<GuidelineViolation>> {
    let by_id: HashMap<Uuid, &ItemGuideline> = guidelines.iter().map(|g| (g.id, g)).collect();
    let mut violations = Vec::new();

    let mut checked = HashSet::new();
    for id in &submission.checked {
        match by_id.get(id) {
            None => violations.push(GuidelineViolation::UnknownGuideline { guideline_id: *id }),
            Some(g) if g.kind != GuidelineKind::Checklist => {
                violations.push(GuidelineViolation::KindMismatch {
                    guideline_id: *id,
                    expected: g.kind,
                })
            }
            Some(_) => {
                if !checked.insert(*id) {
                    violations.push(GuidelineViolation::Duplicate { guideline_id: *id });
                }
            }
        }
    }

    let mut photos: HashMap<Uuid, &str> = HashMap::new();
    for entry in &submission.photos {
        let id = entry.guideline_id;
        match by_id.get(&id) {
            None => violations.push(GuidelineViolation::UnknownGuideline { guideline_id: id }),
            Some(g) if g.kind != GuidelineKind::Photo => {
                violations.push(GuidelineViolation::KindMismatch {
                    guideline_id: id,
                    expected: g.kind,
                })
            }
            Some(_) if entry.photo.trim().is_empty() => {
                violations.push(GuidelineViolation::EmptyPhoto { guideline_id: id })
            }
            Some(_) => {
                if photos.insert(id, entry.photo.trim()).is_some() {
                    violations.push(GuidelineViolation::Duplicate { guideline_id: id });
                }
            }
        }
    }

    let mut outcomes = Vec::with_capacity(guidelines.len());
    for guideline in guidelines {
        let (satisfied, photo) = match guideline.kind {
            GuidelineKind::Checklist => (checked.contains(&guideline.id), None),
            GuidelineKind::Photo => {
                let photo = photos.get(&guideline.id).map(|p| p.to_string());
                (photo.is_some(), photo)
            }
        };

        if guideline.required && !satisfied {
            let guideline_id = guideline.id;
            let label = guideline.label.clone();
            violations.push(match guideline.kind {
                GuidelineKind::Checklist => {
                    GuidelineViolation::MissingChecklistItem { guideline_id, label }
                }
                GuidelineKind::Photo => GuidelineViolation::MissingPhoto { guideline_id, label },
            });
        }

        outcomes.push(CheckOutcome {
            guideline_id: guideline.id,
            kind: guideline.kind,
            label: guideline.label.clone(),
            satisfied,
            photo,
        });
    }

    if violations.is_empty() {
        Ok(outcomes)
    } else {
        Err(violations)
    }
}
