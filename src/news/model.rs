use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Vendor,
    Industry,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Vendor => "vendor",
            Category::Industry => "industry",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized story. Field order matches the JSON artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub source: String,
    pub category: Category,
    #[serde(default, with = "published_format")]
    pub published: Option<OffsetDateTime>,
    #[serde(with = "iso_date")]
    pub fetched: Date,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub drawbacks: Option<String>,
    /// Plain-text entry body, only carried for enrichment.
    #[serde(skip)]
    pub body: Option<String>,
}

/// Format-neutral view of a feed entry, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<OffsetDateTime>,
    pub body: Option<String>,
}

/// Writes RFC 3339. Reads RFC 3339 or RFC 2822 (as older artifacts carry
/// the feed's own date string); anything else reads as absent.
mod published_format {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;
    use time::format_description::well_known::{Rfc2822, Rfc3339};

    pub fn serialize<S: Serializer>(
        value: &Option<OffsetDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => {
                let s = dt.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&s)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<OffsetDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_lenient))
    }

    fn parse_lenient(s: &str) -> Option<OffsetDateTime> {
        let s = s.trim();
        OffsetDateTime::parse(s, &Rfc3339)
            .or_else(|_| OffsetDateTime::parse(s, &Rfc2822))
            .ok()
    }
}

mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;
    use time::format_description::BorrowedFormatItem;
    use time::macros::format_description;

    const FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S: Serializer>(value: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let s = value.format(FORMAT).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        // Older artifacts may carry a full timestamp here; keep its date part.
        let day = raw.get(..10).unwrap_or(raw.as_str());
        Date::parse(day, FORMAT).map_err(serde::de::Error::custom)
    }
}
