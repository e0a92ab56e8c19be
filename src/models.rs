use serde::{Serialize, Deserialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GenerateRequest {
    #[serde(default, alias = "figureName")]
    pub subject: Option<String>,
}

// Kept verbatim, not trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    subject: String,
}

impl GenerationRequest {
    pub fn new(subject: impl Into<String>) -> Option<Self> {
        let subject = subject.into();
        if subject.trim().is_empty() { None } else { Some(Self { subject }) }
    }

    pub fn subject(&self) -> &str { &self.subject }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecord {
    pub title: String,
    pub description: String,
    pub tags: String,
    pub base_name: String,
    pub image_names: ImageNames,
    pub sales_tip: String,
}

impl GeneratedRecord {
    /// Tags as displayed: split on commas, trimmed, empty tokens dropped.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags.split(',').map(str::trim).filter(|t| !t.is_empty()).collect()
    }

    pub fn field_text(&self, field: FieldId) -> &str {
        match field {
            FieldId::Title => &self.title,
            FieldId::Description => &self.description,
            FieldId::Tags => &self.tags,
            FieldId::BaseName => &self.base_name,
            FieldId::SalesTip => &self.sales_tip,
            FieldId::Image(key) => self.image_names.get(key),
        }
    }
}

// Field order is the serialization order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ImageNames {
    pub main: String,
    pub front: String,
    pub side: String,
    pub back: String,
    pub animated: String,
    pub detail: String,
    pub render: String,
}

impl ImageNames {
    pub fn get(&self, key: ImageKey) -> &str {
        match key {
            ImageKey::Main => &self.main,
            ImageKey::Front => &self.front,
            ImageKey::Side => &self.side,
            ImageKey::Back => &self.back,
            ImageKey::Animated => &self.animated,
            ImageKey::Detail => &self.detail,
            ImageKey::Render => &self.render,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageKey, &str)> + '_ {
        ImageKey::ALL.into_iter().map(move |k| (k, self.get(k)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKey { Main, Front, Side, Back, Animated, Detail, Render }

impl ImageKey {
    pub const ALL: [ImageKey; 7] = [
        ImageKey::Main,
        ImageKey::Front,
        ImageKey::Side,
        ImageKey::Back,
        ImageKey::Animated,
        ImageKey::Detail,
        ImageKey::Render,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageKey::Main => "main",
            ImageKey::Front => "front",
            ImageKey::Side => "side",
            ImageKey::Back => "back",
            ImageKey::Animated => "animated",
            ImageKey::Detail => "detail",
            ImageKey::Render => "render",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ImageKey::Main => "Main",
            ImageKey::Front => "Front",
            ImageKey::Side => "Side",
            ImageKey::Back => "Back",
            ImageKey::Animated => "Animated",
            ImageKey::Detail => "Detail",
            ImageKey::Render => "Render",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    Title,
    Description,
    Tags,
    BaseName,
    SalesTip,
    Image(ImageKey),
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldId::Title => f.write_str("title"),
            FieldId::Description => f.write_str("description"),
            FieldId::Tags => f.write_str("tags"),
            FieldId::BaseName => f.write_str("baseName"),
            FieldId::SalesTip => f.write_str("salesTip"),
            FieldId::Image(key) => write!(f, "image-{}", key.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for FieldId {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(FieldId::Title),
            "description" => Ok(FieldId::Description),
            "tags" => Ok(FieldId::Tags),
            "baseName" => Ok(FieldId::BaseName),
            "salesTip" => Ok(FieldId::SalesTip),
            other => other
                .strip_prefix("image-")
                .and_then(|k| ImageKey::ALL.into_iter().find(|key| key.as_str() == k))
                .map(FieldId::Image)
                .ok_or_else(|| UnknownField(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
pub(crate) fn sample_record() -> GeneratedRecord {
    GeneratedRecord {
        title: "Dragon Miniature - Pre-Supported 32mm Tabletop Figure".into(),
        description: "## Dragon\n\n- Pre-supported solid\n- Hollow with drain holes".into(),
        tags: "dragon, miniature, tabletop, dnd, fantasy, 32mm, stl, resin, presupported, monster".into(),
        base_name: "dragon-mini".into(),
        image_names: ImageNames {
            main: "dragon-mini-main".into(),
            front: "dragon-mini-front-view".into(),
            side: "dragon-mini-side-view".into(),
            back: "dragon-mini-back-view".into(),
            animated: "dragon-mini-animated-gif".into(),
            detail: "dragon-mini-detail".into(),
            render: "dragon-mini-raw-render".into(),
        },
        sales_tip: "Bundle it with a matching base to raise the average order.".into(),
    }
}
