//! The small, strongly typed vocabulary the schema is written in: the type of an
//! attribute, how many values it may hold, which entry classes it belongs to and
//! the behavioural flags it carries. [`AttrValue`] is the candidate value handed
//! to validation before it is applied to a [`DirectoryEntry`](crate::entry::DirectoryEntry).

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;

use num_enum::TryFromPrimitive;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Same shape as the address part accepted for mail attributes elsewhere.
    pub static ref VALIDATE_EMAIL_RE: Regex = {
        #[allow(clippy::expect_used)]
        Regex::new(r"^[a-zA-Z0-9.!#$%&'*+=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").expect("Invalid singleline regex found")
    };

    /// Canonical textual uuid, 8-4-4-4-12 hex digits.
    pub static ref UUID_RE: Regex = {
        #[allow(clippy::expect_used)]
        Regex::new("^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$").expect("Invalid uuid regex found")
    };

    pub static ref GENTIME_RE: Regex = {
        #[allow(clippy::expect_used)]
        Regex::new("^[0-9]{14}[zZ]$").expect("Invalid gentime regex found")
    };

    pub static ref DURATION_RE: Regex = {
        #[allow(clippy::expect_used)]
        Regex::new("^(?P<amount>[0-9]+)(?P<unit>ms|[dhms])?$").expect("Invalid duration regex found")
    };
}

#[derive(
    Hash,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Deserialize,
    Serialize,
    TryFromPrimitive,
    Default,
)]
#[repr(u16)]
pub enum AttributeType {
    Boolean = 0,
    Integer = 1,
    Long = 2,
    Duration = 3,
    GenTime = 4,
    Email = 5,
    EmailP = 6,
    CsEmailP = 7,
    Enum = 8,
    Regex = 9,
    Id = 10,
    Port = 11,
    #[default]
    String = 12,
    AString = 13,
    CString = 14,
    OString = 15,
    Phone = 16,
}

impl TryFrom<&str> for AttributeType {
    type Error = ();

    fn try_from(value: &str) -> Result<AttributeType, Self::Error> {
        let n_value = value.to_lowercase();
        match n_value.as_str() {
            "boolean" => Ok(AttributeType::Boolean),
            "integer" => Ok(AttributeType::Integer),
            "long" => Ok(AttributeType::Long),
            "duration" => Ok(AttributeType::Duration),
            "gentime" => Ok(AttributeType::GenTime),
            "email" => Ok(AttributeType::Email),
            "emailp" => Ok(AttributeType::EmailP),
            "cs_emailp" => Ok(AttributeType::CsEmailP),
            "enum" => Ok(AttributeType::Enum),
            "regex" => Ok(AttributeType::Regex),
            "id" => Ok(AttributeType::Id),
            "port" => Ok(AttributeType::Port),
            "string" => Ok(AttributeType::String),
            "astring" => Ok(AttributeType::AString),
            "cstring" => Ok(AttributeType::CString),
            "ostring" => Ok(AttributeType::OString),
            "phone" => Ok(AttributeType::Phone),
            _ => Err(()),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            AttributeType::Boolean => "boolean",
            AttributeType::Integer => "integer",
            AttributeType::Long => "long",
            AttributeType::Duration => "duration",
            AttributeType::GenTime => "gentime",
            AttributeType::Email => "email",
            AttributeType::EmailP => "emailp",
            AttributeType::CsEmailP => "cs_emailp",
            AttributeType::Enum => "enum",
            AttributeType::Regex => "regex",
            AttributeType::Id => "id",
            AttributeType::Port => "port",
            AttributeType::String => "string",
            AttributeType::AString => "astring",
            AttributeType::CString => "cstring",
            AttributeType::OString => "ostring",
            AttributeType::Phone => "phone",
        })
    }
}

impl AttributeType {
    /// Types whose `max` bound is a length rather than a numeric limit.
    pub fn is_length_bounded(self) -> bool {
        matches!(
            self,
            AttributeType::Email
                | AttributeType::EmailP
                | AttributeType::CsEmailP
                | AttributeType::String
                | AttributeType::AString
                | AttributeType::CString
                | AttributeType::OString
                | AttributeType::Phone
        )
    }
}

#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeCardinality {
    #[default]
    Single,
    Multi,
}

impl TryFrom<&str> for AttributeCardinality {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "single" => Ok(AttributeCardinality::Single),
            "multi" => Ok(AttributeCardinality::Multi),
            _ => Err(()),
        }
    }
}

impl fmt::Display for AttributeCardinality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            AttributeCardinality::Single => "single",
            AttributeCardinality::Multi => "multi",
        })
    }
}

/// The kinds of directory entry an attribute can be required or optional in.
#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryClass {
    Account,
    Alias,
    AlwaysOnCluster,
    CalendarResource,
    Cos,
    DistributionList,
    Domain,
    GlobalConfig,
    MailRecipient,
    Server,
}

impl EntryClass {
    pub const ALL: [EntryClass; 10] = [
        EntryClass::Account,
        EntryClass::Alias,
        EntryClass::AlwaysOnCluster,
        EntryClass::CalendarResource,
        EntryClass::Cos,
        EntryClass::DistributionList,
        EntryClass::Domain,
        EntryClass::GlobalConfig,
        EntryClass::MailRecipient,
        EntryClass::Server,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntryClass::Account => "account",
            EntryClass::Alias => "alias",
            EntryClass::AlwaysOnCluster => "alwaysOnCluster",
            EntryClass::CalendarResource => "calendarResource",
            EntryClass::Cos => "cos",
            EntryClass::DistributionList => "distributionList",
            EntryClass::Domain => "domain",
            EntryClass::GlobalConfig => "globalConfig",
            EntryClass::MailRecipient => "mailRecipient",
            EntryClass::Server => "server",
        }
    }
}

impl TryFrom<&str> for EntryClass {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(value))
            .ok_or(())
    }
}

impl fmt::Display for EntryClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behavioural markers on an attribute. The inheritance flags say which entry
/// classes a value is inherited through when it is not set directly.
#[derive(Hash, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeFlag {
    AccountInherited,
    AccountCosDomainInherited,
    DomainInherited,
    ServerInherited,
    ServerPreferAlwaysOn,
    DomainAdminModifiable,
    Idn,
}

impl AttributeFlag {
    pub const ALL: [AttributeFlag; 7] = [
        AttributeFlag::AccountInherited,
        AttributeFlag::AccountCosDomainInherited,
        AttributeFlag::DomainInherited,
        AttributeFlag::ServerInherited,
        AttributeFlag::ServerPreferAlwaysOn,
        AttributeFlag::DomainAdminModifiable,
        AttributeFlag::Idn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeFlag::AccountInherited => "accountInherited",
            AttributeFlag::AccountCosDomainInherited => "accountCosDomainInherited",
            AttributeFlag::DomainInherited => "domainInherited",
            AttributeFlag::ServerInherited => "serverInherited",
            AttributeFlag::ServerPreferAlwaysOn => "serverPreferAlwaysOn",
            AttributeFlag::DomainAdminModifiable => "domainAdminModifiable",
            AttributeFlag::Idn => "idn",
        }
    }

    /// The entry classes an attribute must appear in (required or optional)
    /// for this flag to make sense on it.
    pub fn required_classes(self) -> &'static [EntryClass] {
        match self {
            AttributeFlag::AccountInherited => &[EntryClass::Account, EntryClass::Cos],
            AttributeFlag::AccountCosDomainInherited => {
                &[EntryClass::Account, EntryClass::Cos, EntryClass::Domain]
            }
            AttributeFlag::DomainInherited => &[EntryClass::Domain, EntryClass::GlobalConfig],
            AttributeFlag::ServerInherited => &[EntryClass::Server, EntryClass::GlobalConfig],
            AttributeFlag::ServerPreferAlwaysOn => {
                &[EntryClass::Server, EntryClass::AlwaysOnCluster]
            }
            AttributeFlag::DomainAdminModifiable | AttributeFlag::Idn => &[],
        }
    }
}

impl TryFrom<&str> for AttributeFlag {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(value))
            .ok_or(())
    }
}

impl fmt::Display for AttributeFlag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate value for one attribute. An empty string or an empty list is a
/// request to unset the attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Single(String),
    Multi(Vec<String>),
}

impl AttrValue {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            AttrValue::Single(v) => std::slice::from_ref(v),
            AttrValue::Multi(vs) => vs.as_slice(),
        };
        values.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        match self {
            AttrValue::Single(_) => 1,
            AttrValue::Multi(vs) => vs.len(),
        }
    }

    /// True when applying this value would unset the attribute.
    pub fn is_empty(&self) -> bool {
        match self {
            AttrValue::Single(v) => v.is_empty(),
            AttrValue::Multi(vs) => vs.is_empty(),
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter()
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Single(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Single(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::Multi(value)
    }
}

impl From<Vec<&str>> for AttrValue {
    fn from(value: Vec<&str>) -> Self {
        AttrValue::Multi(value.into_iter().map(str::to_string).collect())
    }
}

/// A batch of attribute changes. Names may carry a `+` (add values) or `-`
/// (remove values) prefix; `None` unsets the attribute.
pub type AttrMods = BTreeMap<String, Option<AttrValue>>;

/// Parse a duration such as `10s`, `5m`, `2h`, `1d` or `100ms` into
/// milliseconds. A bare number is taken as seconds.
pub fn parse_duration_ms(value: &str) -> Option<i64> {
    let caps = DURATION_RE.captures(value)?;
    let amount: i64 = caps.name("amount")?.as_str().parse().ok()?;
    let scale = match caps.name("unit").map(|m| m.as_str()) {
        Some("ms") => 1,
        Some("m") => 60_000,
        Some("h") => 3_600_000,
        Some("d") => 86_400_000,
        Some("s") | None => 1_000,
        Some(_) => return None,
    };
    amount.checked_mul(scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_type_names() {
        for raw in 0u16..=16 {
            let at = AttributeType::try_from(raw).expect("missing attribute type");
            let name = at.to_string();
            assert_eq!(AttributeType::try_from(name.as_str()), Ok(at));
        }
        assert_eq!(
            AttributeType::try_from("CS_EMAILP"),
            Ok(AttributeType::CsEmailP)
        );
        assert!(AttributeType::try_from("binary").is_err());
        assert!(AttributeType::try_from(17u16).is_err());
    }

    #[test]
    fn test_entry_class_and_flag_names() {
        assert_eq!(
            EntryClass::try_from("globalconfig"),
            Ok(EntryClass::GlobalConfig)
        );
        assert_eq!(EntryClass::GlobalConfig.to_string(), "globalConfig");
        assert!(EntryClass::try_from("group").is_err());

        assert_eq!(
            AttributeFlag::try_from("accountCosDomainInherited"),
            Ok(AttributeFlag::AccountCosDomainInherited)
        );
        assert_eq!(
            AttributeFlag::AccountCosDomainInherited.required_classes(),
            &[EntryClass::Account, EntryClass::Cos, EntryClass::Domain]
        );
        assert!(AttributeFlag::Idn.required_classes().is_empty());
    }

    #[test]
    fn test_attr_value_shapes() {
        let single = AttrValue::from("a");
        assert_eq!(single.len(), 1);
        assert!(!single.is_empty());
        assert!(AttrValue::from("").is_empty());
        assert!(AttrValue::Multi(Vec::new()).is_empty());

        let multi = AttrValue::from(vec!["a", "", "b"]);
        assert_eq!(multi.len(), 3);
        assert_eq!(multi.to_vec(), vec!["a".to_string(), "b".to_string()]);

        let json: AttrValue = serde_json::from_str(r#"["x","y"]"#).expect("invalid json");
        assert_eq!(json, AttrValue::from(vec!["x", "y"]));
        let json: AttrValue = serde_json::from_str(r#""x""#).expect("invalid json");
        assert_eq!(json, AttrValue::from("x"));
    }

    #[test]
    fn test_parse_duration_ms() {
        assert_eq!(parse_duration_ms("10s"), Some(10_000));
        assert_eq!(parse_duration_ms("5"), Some(5_000));
        assert_eq!(parse_duration_ms("100ms"), Some(100));
        assert_eq!(parse_duration_ms("2m"), Some(120_000));
        assert_eq!(parse_duration_ms("1h"), Some(3_600_000));
        assert_eq!(parse_duration_ms("1d"), Some(86_400_000));
        assert_eq!(parse_duration_ms("abc"), None);
        assert_eq!(parse_duration_ms("10x"), None);
        assert_eq!(parse_duration_ms(""), None);
        assert_eq!(parse_duration_ms("-5s"), None);
        assert_eq!(parse_duration_ms("99999999999999999999d"), None);
    }
}
