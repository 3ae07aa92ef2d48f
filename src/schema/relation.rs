use serde::{Deserialize, Serialize};
use std::fmt;

/// Every relation kind a content-type attribute can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    OneWay,
    ManyWay,
    MorphOne,
    MorphMany,
    MorphToOne,
    MorphToMany,
    OneToOneMorph,
    OneToManyMorph,
    ManyToOneMorph,
    ManyToManyMorph,
}

/// Structural family a relation kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationGroup {
    /// `xToY` with an inverse side on the target
    Bidirectional,
    /// `morphOne` / `morphMany`: points at a target that owns the morph column
    MorphReference,
    /// `morphToOne` / `morphToMany`: no fixed target
    MorphOwner,
    /// `oneWay` / `manyWay`
    XWay,
    /// `xToYMorph`
    LegacyMorph,
}

/// Whether a relation value holds one record or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

impl RelationKind {
    pub const ALL: [RelationKind; 14] = [
        RelationKind::OneToOne,
        RelationKind::OneToMany,
        RelationKind::ManyToOne,
        RelationKind::ManyToMany,
        RelationKind::OneWay,
        RelationKind::ManyWay,
        RelationKind::MorphOne,
        RelationKind::MorphMany,
        RelationKind::MorphToOne,
        RelationKind::MorphToMany,
        RelationKind::OneToOneMorph,
        RelationKind::OneToManyMorph,
        RelationKind::ManyToOneMorph,
        RelationKind::ManyToManyMorph,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::OneToOne => "oneToOne",
            RelationKind::OneToMany => "oneToMany",
            RelationKind::ManyToOne => "manyToOne",
            RelationKind::ManyToMany => "manyToMany",
            RelationKind::OneWay => "oneWay",
            RelationKind::ManyWay => "manyWay",
            RelationKind::MorphOne => "morphOne",
            RelationKind::MorphMany => "morphMany",
            RelationKind::MorphToOne => "morphToOne",
            RelationKind::MorphToMany => "morphToMany",
            RelationKind::OneToOneMorph => "oneToOneMorph",
            RelationKind::OneToManyMorph => "oneToManyMorph",
            RelationKind::ManyToOneMorph => "manyToOneMorph",
            RelationKind::ManyToManyMorph => "manyToManyMorph",
        }
    }

    pub fn group(&self) -> RelationGroup {
        match self {
            RelationKind::OneToOne
            | RelationKind::OneToMany
            | RelationKind::ManyToOne
            | RelationKind::ManyToMany => RelationGroup::Bidirectional,
            RelationKind::MorphOne | RelationKind::MorphMany => RelationGroup::MorphReference,
            RelationKind::MorphToOne | RelationKind::MorphToMany => RelationGroup::MorphOwner,
            RelationKind::OneWay | RelationKind::ManyWay => RelationGroup::XWay,
            RelationKind::OneToOneMorph
            | RelationKind::OneToManyMorph
            | RelationKind::ManyToOneMorph
            | RelationKind::ManyToManyMorph => RelationGroup::LegacyMorph,
        }
    }

    /// Shape of the value read from this side of the relation.
    pub fn cardinality(&self) -> Cardinality {
        match self {
            RelationKind::OneToOne
            | RelationKind::ManyToOne
            | RelationKind::OneWay
            | RelationKind::MorphOne
            | RelationKind::MorphToOne
            | RelationKind::OneToOneMorph
            | RelationKind::ManyToOneMorph => Cardinality::One,
            RelationKind::OneToMany
            | RelationKind::ManyToMany
            | RelationKind::ManyWay
            | RelationKind::MorphMany
            | RelationKind::MorphToMany
            | RelationKind::OneToManyMorph
            | RelationKind::ManyToManyMorph => Cardinality::Many,
        }
    }

    pub fn is_many(&self) -> bool {
        self.cardinality() == Cardinality::Many
    }

    /// Kinds whose relation list only ever holds one item in the edit view.
    ///
    /// This set is fixed; `oneToManyMorph` belongs here even though its
    /// value cardinality is many.
    pub fn is_single_valued(&self) -> bool {
        matches!(
            self,
            RelationKind::OneWay
                | RelationKind::OneToOne
                | RelationKind::ManyToOne
                | RelationKind::OneToManyMorph
                | RelationKind::OneToOneMorph
        )
    }

    pub fn can_reorder(&self) -> bool {
        !self.is_single_valued()
    }

    /// Morph owners resolve their target per row, everything else declares one.
    pub fn has_target(&self) -> bool {
        self.group() != RelationGroup::MorphOwner
    }

    pub fn is_morph(&self) -> bool {
        self.as_str().to_lowercase().contains("morph")
    }

    /// The kind seen from the inverse side of a bidirectional relation.
    pub fn reverse(&self) -> RelationKind {
        match self {
            RelationKind::OneToMany => RelationKind::ManyToOne,
            RelationKind::ManyToOne => RelationKind::OneToMany,
            other => *other,
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationKind {
    type Err = crate::error::RelkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| crate::error::RelkitError::InvalidInput(format!("unknown relation kind: {}", s)))
    }
}

/// Admin URL of a related record's edit view.
pub fn relation_link(target_model: &str, id: Option<&str>) -> String {
    format!("/content-manager/collection-types/{}/{}", target_model, id.unwrap_or(""))
}
