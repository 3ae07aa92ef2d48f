use super::relation::{Cardinality, RelationKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A content-type attribute definition, tagged by its `type` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Attribute {
    String,
    Text,
    RichText,
    Email,
    Password,
    Uid,
    Enumeration {
        #[serde(rename = "enum")]
        values: Vec<String>,
    },
    Integer,
    BigInteger,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Time,
    Timestamp,
    Json,
    Blocks,
    Media {
        #[serde(default)]
        multiple: bool,
    },
    Component {
        component: String,
        #[serde(default)]
        repeatable: bool,
    },
    DynamicZone {
        components: Vec<String>,
    },
    Relation {
        relation: RelationKind,
        #[serde(default)]
        target: Option<String>,
    },
}

/// Runtime description of the value an attribute holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValueShape {
    String,
    Integer,
    /// Serialized as a string to avoid precision loss
    BigInteger,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Time,
    Timestamp,
    Json,
    Blocks,
    Enumeration { values: Vec<String> },
    Media { cardinality: Cardinality },
    Component { uid: String, cardinality: Cardinality },
    DynamicZone { components: Vec<String> },
    Relation { target: Option<String>, cardinality: Cardinality },
}

impl Attribute {
    pub fn type_name(&self) -> &'static str {
        match self {
            Attribute::String => "string",
            Attribute::Text => "text",
            Attribute::RichText => "richtext",
            Attribute::Email => "email",
            Attribute::Password => "password",
            Attribute::Uid => "uid",
            Attribute::Enumeration { .. } => "enumeration",
            Attribute::Integer => "integer",
            Attribute::BigInteger => "biginteger",
            Attribute::Float => "float",
            Attribute::Decimal => "decimal",
            Attribute::Boolean => "boolean",
            Attribute::Date => "date",
            Attribute::DateTime => "datetime",
            Attribute::Time => "time",
            Attribute::Timestamp => "timestamp",
            Attribute::Json => "json",
            Attribute::Blocks => "blocks",
            Attribute::Media { .. } => "media",
            Attribute::Component { .. } => "component",
            Attribute::DynamicZone { .. } => "dynamiczone",
            Attribute::Relation { .. } => "relation",
        }
    }

    pub fn value_shape(&self) -> ValueShape {
        match self {
            Attribute::String
            | Attribute::Text
            | Attribute::RichText
            | Attribute::Email
            | Attribute::Password
            | Attribute::Uid => ValueShape::String,
            Attribute::Enumeration { values } => ValueShape::Enumeration {
                values: values.clone(),
            },
            Attribute::Integer => ValueShape::Integer,
            Attribute::BigInteger => ValueShape::BigInteger,
            Attribute::Float => ValueShape::Float,
            Attribute::Decimal => ValueShape::Decimal,
            Attribute::Boolean => ValueShape::Boolean,
            Attribute::Date => ValueShape::Date,
            Attribute::DateTime => ValueShape::DateTime,
            Attribute::Time => ValueShape::Time,
            Attribute::Timestamp => ValueShape::Timestamp,
            Attribute::Json => ValueShape::Json,
            Attribute::Blocks => ValueShape::Blocks,
            Attribute::Media { multiple } => ValueShape::Media {
                cardinality: many_if(*multiple),
            },
            Attribute::Component { component, repeatable } => ValueShape::Component {
                uid: component.clone(),
                cardinality: many_if(*repeatable),
            },
            Attribute::DynamicZone { components } => ValueShape::DynamicZone {
                components: components.clone(),
            },
            Attribute::Relation { relation, target } => ValueShape::Relation {
                // morph owners point at whatever the row says
                target: if relation.has_target() { target.clone() } else { None },
                cardinality: relation.cardinality(),
            },
        }
    }

    /// Whether the edit view can show this attribute as a list column.
    pub fn is_displayable(&self) -> bool {
        match self {
            Attribute::Relation { relation, .. } => !relation.is_morph(),
            Attribute::Json
            | Attribute::DynamicZone { .. }
            | Attribute::RichText
            | Attribute::Password
            | Attribute::Blocks => false,
            _ => true,
        }
    }

    pub fn relation_kind(&self) -> Option<RelationKind> {
        match self {
            Attribute::Relation { relation, .. } => Some(*relation),
            _ => None,
        }
    }
}

fn many_if(flag: bool) -> Cardinality {
    if flag {
        Cardinality::Many
    } else {
        Cardinality::One
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = |c: &Cardinality| if *c == Cardinality::Many { "[]" } else { "" };
        match self {
            ValueShape::String => f.write_str("string"),
            ValueShape::Integer | ValueShape::Float | ValueShape::Decimal => f.write_str("number"),
            ValueShape::BigInteger => f.write_str("bigint-string"),
            ValueShape::Boolean => f.write_str("boolean"),
            ValueShape::Date => f.write_str("date"),
            ValueShape::DateTime => f.write_str("datetime"),
            ValueShape::Time => f.write_str("time"),
            ValueShape::Timestamp => f.write_str("timestamp"),
            ValueShape::Json => f.write_str("json"),
            ValueShape::Blocks => f.write_str("blocks"),
            ValueShape::Enumeration { values } => write!(f, "enum({})", values.join(" | ")),
            ValueShape::Media { cardinality } => write!(f, "media{}", suffix(cardinality)),
            ValueShape::Component { uid, cardinality } => {
                write!(f, "component<{}>{}", uid, suffix(cardinality))
            }
            ValueShape::DynamicZone { components } => write!(f, "dynamiczone<{}>", components.join(" | ")),
            ValueShape::Relation { target, cardinality } => write!(
                f,
                "relation<{}>{}",
                target.as_deref().unwrap_or("*"),
                suffix(cardinality)
            ),
        }
    }
}

/// A content type's attribute map as served by the content-type builder.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentType {
    pub uid: String,
    pub attributes: BTreeMap<String, Attribute>,
}

impl ContentType {
    pub fn from_json(raw: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Relation attributes with their kinds, in name order.
    pub fn relation_fields(&self) -> Vec<(&str, RelationKind)> {
        self.attributes
            .iter()
            .filter_map(|(name, attr)| attr.relation_kind().map(|kind| (name.as_str(), kind)))
            .collect()
    }

    pub fn value_shapes(&self) -> Vec<(&str, ValueShape)> {
        self.attributes
            .iter()
            .map(|(name, attr)| (name.as_str(), attr.value_shape()))
            .collect()
    }
}
