//! [`AttributeSchema`] is the in-memory attribute table. It is the authority on
//! what a valid value for an attribute looks like, which entry classes the
//! attribute appears in, which behavioural flags it carries and in which
//! releases it exists.
//!
//! The table is built once by a [`SchemaLoader`](loader::SchemaLoader) and is
//! then read-only, so it can be shared freely behind an `Arc`.

use std::collections::{BTreeSet, HashMap};
use std::convert::TryFrom;

use regex::Regex;

use crate::prelude::*;
use crate::value::{
    parse_duration_ms, AttrValue, AttributeCardinality, AttributeFlag, AttributeType, EntryClass,
    GENTIME_RE, UUID_RE, VALIDATE_EMAIL_RE,
};

pub mod loader;
pub mod version;

pub use self::loader::{AttributeDefinition, SchemaLoader};
pub use self::version::Version;

/// Switches that change how strictly values are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// When set, `id` typed values must be canonical uuids.
    pub require_uuid_ids: bool,
}

/// The limits a value is checked against. Which variant applies depends on the
/// attribute type; numeric limits for durations are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueBounds {
    Unbounded,
    Numeric { min: i64, max: i64 },
    Length { max: usize },
}

/// The definition of a single attribute.
#[derive(Debug, Clone)]
pub struct AttributeInfo {
    pub name: AttrString,
    pub description: Option<String>,
    /// `None` when the definition named a type we don't know. Values for such
    /// an attribute are accepted unchecked.
    pub attr_type: Option<AttributeType>,
    pub cardinality: AttributeCardinality,
    pub immutable: bool,
    pub bounds: ValueBounds,
    pub enum_values: Vec<String>,
    pub regex: Option<Regex>,
    pub required_in: BTreeSet<EntryClass>,
    pub optional_in: BTreeSet<EntryClass>,
    pub flags: BTreeSet<AttributeFlag>,
    /// Registry id of the callback that runs around modifications.
    pub callback: Option<AttrString>,
    pub since: Vec<Version>,
    pub deprecated_since: Option<Version>,
    pub deprecate_desc: Option<String>,
}

impl AttributeInfo {
    pub fn new(name: &str, attr_type: Option<AttributeType>) -> Self {
        AttributeInfo {
            name: AttrString::from(name),
            description: None,
            attr_type,
            cardinality: AttributeCardinality::Single,
            immutable: false,
            bounds: attr_type
                .map(Self::default_bounds)
                .unwrap_or(ValueBounds::Unbounded),
            enum_values: Vec::new(),
            regex: None,
            required_in: BTreeSet::new(),
            optional_in: BTreeSet::new(),
            flags: BTreeSet::new(),
            callback: None,
            since: Vec::new(),
            deprecated_since: None,
            deprecate_desc: None,
        }
    }

    pub fn default_bounds(attr_type: AttributeType) -> ValueBounds {
        match attr_type {
            AttributeType::Integer => ValueBounds::Numeric {
                min: i32::MIN as i64,
                max: i32::MAX as i64,
            },
            AttributeType::Long => ValueBounds::Numeric {
                min: i64::MIN,
                max: i64::MAX,
            },
            AttributeType::Duration => ValueBounds::Numeric {
                min: 0,
                max: i64::MAX,
            },
            AttributeType::Port => ValueBounds::Numeric { min: 0, max: 65535 },
            _ => ValueBounds::Unbounded,
        }
    }

    pub fn is_multivalued(&self) -> bool {
        self.cardinality == AttributeCardinality::Multi
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated_since.is_some()
    }

    /// Every class this attribute is either required or optional in.
    pub fn classes(&self) -> impl Iterator<Item = &EntryClass> {
        self.required_in.union(&self.optional_in)
    }

    /// Check a candidate value against this definition. `None`, an empty
    /// string and an empty list mean "unset" and are always accepted, except
    /// for immutable attributes when `check_immutable` is set.
    pub fn check_value(
        &self,
        value: Option<&AttrValue>,
        check_immutable: bool,
        policy: &ValidationPolicy,
    ) -> Result<(), SchemaError> {
        if check_immutable && self.immutable {
            return Err(self.invalid("attribute is immutable"));
        }

        let Some(value) = value else {
            return Ok(());
        };

        if let AttrValue::Multi(values) = value {
            if values.len() > 1 && !self.is_multivalued() {
                return Err(self.invalid(format!(
                    "single valued attribute given {} values",
                    values.len()
                )));
            }
        }

        value
            .iter()
            .filter(|v| !v.is_empty())
            .try_for_each(|v| self.check_single(v, policy))
    }

    fn check_single(&self, value: &str, policy: &ValidationPolicy) -> Result<(), SchemaError> {
        let Some(attr_type) = self.attr_type else {
            return Ok(());
        };

        match attr_type {
            AttributeType::Boolean => {
                if value == "TRUE" || value == "FALSE" {
                    Ok(())
                } else {
                    Err(self.invalid("must be TRUE or FALSE"))
                }
            }
            AttributeType::Integer => {
                let v = value
                    .parse::<i32>()
                    .map_err(|_| self.invalid("value not a number"))?;
                self.check_numeric(v as i64, value)
            }
            AttributeType::Long => {
                let v = value
                    .parse::<i64>()
                    .map_err(|_| self.invalid("value not a number"))?;
                self.check_numeric(v, value)
            }
            AttributeType::Port => {
                let v = value
                    .parse::<i64>()
                    .map_err(|_| self.invalid("value not a number"))?;
                if !(0..=65535).contains(&v) {
                    return Err(self.invalid("port must be in the range 0-65535"));
                }
                self.check_numeric(v, value)
            }
            AttributeType::Duration => {
                let ms = parse_duration_ms(value).ok_or_else(|| {
                    self.invalid("must be a valid duration such as 10s, 5m, 2h, 1d or 100ms")
                })?;
                self.check_numeric(ms, value)
            }
            AttributeType::GenTime => check_gentime(value).map_err(|reason| self.invalid(reason)),
            AttributeType::Email => {
                self.check_length(value)?;
                self.check_mailbox(value, false)
            }
            AttributeType::EmailP => {
                self.check_length(value)?;
                self.check_mailbox(value, true)
            }
            AttributeType::CsEmailP => {
                self.check_length(value)?;
                value
                    .split(',')
                    .map(str::trim)
                    .try_for_each(|mailbox| self.check_mailbox(mailbox, true))
            }
            AttributeType::Enum => {
                if self.enum_values.iter().any(|allowed| allowed == value) {
                    Ok(())
                } else {
                    Err(self.invalid(format!(
                        "value must be one of: {}",
                        self.enum_values.join(", ")
                    )))
                }
            }
            AttributeType::Regex => match &self.regex {
                Some(re) if re.is_match(value) => Ok(()),
                Some(re) => Err(self.invalid(format!("value does not match {}", re.as_str()))),
                None => Ok(()),
            },
            AttributeType::Id => {
                if !policy.require_uuid_ids || UUID_RE.is_match(value) {
                    Ok(())
                } else {
                    Err(self.invalid("must be a valid uuid"))
                }
            }
            AttributeType::String
            | AttributeType::AString
            | AttributeType::CString
            | AttributeType::OString
            | AttributeType::Phone => self.check_length(value),
        }
    }

    fn check_numeric(&self, v: i64, raw: &str) -> Result<(), SchemaError> {
        match self.bounds {
            ValueBounds::Numeric { min, .. } if v < min => Err(self.invalid(format!(
                "value {} is smaller than minimum allowed: {}",
                raw, min
            ))),
            ValueBounds::Numeric { max, .. } if v > max => Err(self.invalid(format!(
                "value {} is larger than maximum allowed: {}",
                raw, max
            ))),
            _ => Ok(()),
        }
    }

    fn check_length(&self, value: &str) -> Result<(), SchemaError> {
        match self.bounds {
            ValueBounds::Length { max } if value.chars().count() > max => Err(self.invalid(
                format!("value too long, maximum length is {}", max),
            )),
            _ => Ok(()),
        }
    }

    fn check_mailbox(&self, value: &str, allow_personal: bool) -> Result<(), SchemaError> {
        if !value.contains('@') {
            return Err(self.invalid("must contain an @"));
        }

        let (personal, address) = match (value.rfind('<'), value.ends_with('>')) {
            (Some(start), true) => (value[..start].trim(), &value[start + 1..value.len() - 1]),
            (None, false) => ("", value),
            _ => return Err(self.invalid("unbalanced angle brackets in address")),
        };

        if !personal.is_empty() && !allow_personal {
            return Err(self.invalid("personal part is not allowed in address"));
        }

        if VALIDATE_EMAIL_RE.is_match(address.trim()) {
            Ok(())
        } else {
            Err(self.invalid("not a valid RFC822 address"))
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::invalid_value(&self.name, reason)
    }
}

/// `yyyyMMddHHmmssZ`, and the date and time must actually exist.
fn check_gentime(value: &str) -> Result<(), &'static str> {
    const REASON: &str = "must be a valid generalized time in the form yyyyMMddHHmmssZ";
    if !GENTIME_RE.is_match(value) {
        return Err(REASON);
    }
    let field = |range: std::ops::Range<usize>| -> Result<u16, &'static str> {
        value
            .get(range)
            .and_then(|s| s.parse().ok())
            .ok_or(REASON)
    };
    let year = field(0..4)?;
    let month = time::Month::try_from(field(4..6)? as u8).map_err(|_| REASON)?;
    let date = time::Date::from_calendar_date(year as i32, month, field(6..8)? as u8);
    let time = time::Time::from_hms(
        field(8..10)? as u8,
        field(10..12)? as u8,
        field(12..14)? as u8,
    );
    match (date, time) {
        (Ok(_), Ok(_)) => Ok(()),
        _ => Err(REASON),
    }
}

/// The attribute table.
#[derive(Debug, Clone, Default)]
pub struct AttributeSchema {
    // Keyed by the lower cased name.
    attrs: HashMap<AttrString, AttributeInfo>,
    class_to_attrs: HashMap<EntryClass, BTreeSet<AttrString>>,
    class_to_immutable: HashMap<EntryClass, BTreeSet<AttrString>>,
    immutable: BTreeSet<AttrString>,
    flag_to_attrs: HashMap<AttributeFlag, BTreeSet<AttrString>>,
}

impl AttributeSchema {
    /// Build a schema from a single JSON document.
    pub fn from_json(src: &str) -> Result<Self, OperationError> {
        let mut loader = SchemaLoader::new();
        loader.load_str(src, "inline");
        loader.finish()
    }

    fn fold(name: &str) -> AttrString {
        AttrString::from(name.to_lowercase())
    }

    /// Add a fully validated definition to the table.
    pub(crate) fn insert(&mut self, info: AttributeInfo) -> Result<(), SchemaError> {
        let key = Self::fold(&info.name);
        if self.attrs.contains_key(&key) {
            return Err(SchemaError::DuplicateDefinition(info.name.to_string()));
        }

        for class in info.classes() {
            self.class_to_attrs
                .entry(*class)
                .or_default()
                .insert(info.name.clone());
            if info.immutable {
                self.class_to_immutable
                    .entry(*class)
                    .or_default()
                    .insert(info.name.clone());
            }
        }
        if info.immutable {
            self.immutable.insert(info.name.clone());
        }
        for flag in info.flags.iter() {
            self.flag_to_attrs
                .entry(*flag)
                .or_default()
                .insert(info.name.clone());
        }

        self.attrs.insert(key, info);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeInfo> {
        self.attrs.values()
    }

    pub fn get_attribute_info(&self, name: &str) -> Option<&AttributeInfo> {
        self.attrs.get(&Self::fold(name))
    }

    pub fn get_attribute_type(&self, name: &str) -> Option<AttributeType> {
        self.get_attribute_info(name).and_then(|ai| ai.attr_type)
    }

    pub fn is_multivalued(&self, name: &str) -> bool {
        self.get_attribute_info(name)
            .map(|ai| ai.is_multivalued())
            .unwrap_or(false)
    }

    pub fn attrs_in_class(&self, class: EntryClass) -> Vec<&str> {
        self.class_to_attrs
            .get(&class)
            .map(|s| s.iter().map(|a| a.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn required_attrs_in_class(&self, class: EntryClass) -> Vec<&str> {
        let mut attrs: Vec<&str> = self
            .attrs
            .values()
            .filter(|ai| ai.required_in.contains(&class))
            .map(|ai| ai.name.as_str())
            .collect();
        attrs.sort_unstable();
        attrs
    }

    pub fn immutable_attrs(&self) -> Vec<&str> {
        self.immutable.iter().map(|a| a.as_str()).collect()
    }

    pub fn immutable_attrs_in_class(&self, class: EntryClass) -> Vec<&str> {
        self.class_to_immutable
            .get(&class)
            .map(|s| s.iter().map(|a| a.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn attrs_with_flag(&self, flag: AttributeFlag) -> Vec<&str> {
        self.flag_to_attrs
            .get(&flag)
            .map(|s| s.iter().map(|a| a.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn has_flag(&self, flag: AttributeFlag, name: &str) -> bool {
        self.get_attribute_info(name)
            .map(|ai| ai.flags.contains(&flag))
            .unwrap_or(false)
    }

    pub fn is_account_inherited(&self, name: &str) -> bool {
        self.has_flag(AttributeFlag::AccountInherited, name)
    }

    pub fn is_account_cos_domain_inherited(&self, name: &str) -> bool {
        self.has_flag(AttributeFlag::AccountCosDomainInherited, name)
    }

    pub fn is_domain_inherited(&self, name: &str) -> bool {
        self.has_flag(AttributeFlag::DomainInherited, name)
    }

    pub fn is_server_inherited(&self, name: &str) -> bool {
        self.has_flag(AttributeFlag::ServerInherited, name)
    }

    pub fn is_domain_admin_modifiable(&self, name: &str) -> bool {
        self.has_flag(AttributeFlag::DomainAdminModifiable, name)
    }

    /// The attribute exists in `version`.
    pub fn in_version(&self, name: &str, version: &str) -> Result<bool, OperationError> {
        self.version_check(name, version, true, true)
    }

    /// The attribute was introduced strictly before `version`.
    pub fn before_version(&self, name: &str, version: &str) -> Result<bool, OperationError> {
        self.version_check(name, version, false, true)
    }

    /// The attribute was introduced in exactly `version`.
    pub fn added_in(&self, name: &str, version: &str) -> Result<bool, OperationError> {
        self.version_check(name, version, true, false)
    }

    /// The attribute is reserved for a release that has not shipped yet.
    pub fn is_future(&self, name: &str) -> bool {
        self.get_attribute_info(name)
            .map(|ai| ai.since.len() == 1 && ai.since[0].is_future())
            .unwrap_or(false)
    }

    // An attribute can be back-ported, so `since` may list one version per
    // release line. The list is sorted; we walk it until we reach the line
    // `version` belongs to, or a line later than it.
    fn version_check(
        &self,
        name: &str,
        version: &str,
        check_in: bool,
        check_before: bool,
    ) -> Result<bool, OperationError> {
        let ai = self
            .get_attribute_info(name)
            .ok_or_else(|| SchemaError::InvalidAttributeName(name.to_string()))?;

        if ai.since.is_empty() {
            return Ok(true);
        }

        let current: Version = version.parse().map_err(|e| {
            admin_error!(?e, "invalid version in version check");
            OperationError::InvalidRequest(e)
        })?;

        let matches = |since: &Version| {
            (check_before && *since < current) || (check_in && *since == current)
        };

        let mut good = false;
        for since in ai.since.iter() {
            if current.is_same_minor_release(since) {
                return Ok(matches(since));
            } else if !current.is_later_major_minor(since) {
                return Ok(good);
            } else {
                good = matches(since);
            }
        }
        Ok(good)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> AttributeSchema {
        AttributeSchema::from_json(
            r#"{ "attrs": [
            { "name": "maxLoginFailures", "type": "integer", "min": "0", "max": "100",
              "optionalIn": ["account", "cos"], "flags": ["accountInherited"] },
            { "name": "quotaLimit", "type": "long" },
            { "name": "loginEnabled", "type": "boolean", "optionalIn": ["account"] },
            { "name": "lockoutDuration", "type": "duration", "max": "1d" },
            { "name": "createTimestamp", "type": "gentime" },
            { "name": "mailForward", "type": "email", "cardinality": "multi", "max": 64 },
            { "name": "mailFrom", "type": "emailp" },
            { "name": "mailRecipients", "type": "cs_emailp" },
            { "name": "status", "type": "enum", "value": "active,locked,closed",
              "immutable": true, "requiredIn": ["account"] },
            { "name": "locale", "type": "regex", "value": "[a-z]{2}_[A-Z]{2}" },
            { "name": "uid", "type": "id", "immutable": true, "requiredIn": ["account", "domain"] },
            { "name": "listenPort", "type": "port", "optionalIn": ["server", "globalConfig"],
              "flags": ["serverInherited"] },
            { "name": "description", "type": "string", "max": 10 },
            { "name": "telephone", "type": "phone", "max": 5 },
            { "name": "legacy", "type": "binary" },
            { "name": "mailHost", "type": "string", "since": "8.0.2,8.5.0,9.0.1" },
            { "name": "nextThing", "type": "string", "since": "future" }
        ] }"#,
        )
        .expect("failed to load schema")
    }

    fn check(s: &AttributeSchema, name: &str, v: &str) -> Result<(), SchemaError> {
        s.get_attribute_info(name)
            .expect("missing attr")
            .check_value(Some(&AttrValue::from(v)), false, &ValidationPolicy::default())
    }

    #[test]
    fn test_schema_lookup_is_case_insensitive() {
        let s = schema();
        assert!(s.get_attribute_info("MAXLOGINFAILURES").is_some());
        assert_eq!(
            s.get_attribute_type("maxloginfailures"),
            Some(AttributeType::Integer)
        );
        assert_eq!(s.get_attribute_type("legacy"), None);
        assert!(s.get_attribute_info("legacy").is_some());
        assert!(s.is_multivalued("mailforward"));
        assert!(!s.is_multivalued("description"));
        assert!(!s.is_multivalued("nope"));
    }

    #[test]
    fn test_integer_bounds() {
        let s = schema();
        assert!(check(&s, "maxLoginFailures", "0").is_ok());
        assert!(check(&s, "maxLoginFailures", "100").is_ok());
        assert!(check(&s, "maxLoginFailures", "-1").is_err());
        assert!(check(&s, "maxLoginFailures", "101").is_err());
        assert!(check(&s, "maxLoginFailures", "150").is_err());
        assert!(check(&s, "maxLoginFailures", "ten").is_err());
        assert!(check(&s, "maxLoginFailures", "").is_ok());
        assert!(check(&s, "maxLoginFailures", "2147483648").is_err());

        assert!(check(&s, "quotaLimit", "9223372036854775807").is_ok());
        assert!(check(&s, "quotaLimit", "9223372036854775808").is_err());
    }

    #[test]
    fn test_boolean_values() {
        let s = schema();
        assert!(check(&s, "loginEnabled", "TRUE").is_ok());
        assert!(check(&s, "loginEnabled", "FALSE").is_ok());
        assert!(check(&s, "loginEnabled", "true").is_err());
        assert!(check(&s, "loginEnabled", "yes").is_err());
    }

    #[test]
    fn test_duration_values() {
        let s = schema();
        assert!(check(&s, "lockoutDuration", "10s").is_ok());
        assert!(check(&s, "lockoutDuration", "5").is_ok());
        assert!(check(&s, "lockoutDuration", "100ms").is_ok());
        assert!(check(&s, "lockoutDuration", "1d").is_ok());
        assert!(check(&s, "lockoutDuration", "25h").is_err());
        assert!(check(&s, "lockoutDuration", "abc").is_err());
    }

    #[test]
    fn test_gentime_values() {
        let s = schema();
        assert!(check(&s, "createTimestamp", "20240229120000Z").is_ok());
        assert!(check(&s, "createTimestamp", "20230229120000Z").is_err());
        assert!(check(&s, "createTimestamp", "20240101250000Z").is_err());
        assert!(check(&s, "createTimestamp", "2024010112000Z").is_err());
        assert!(check(&s, "createTimestamp", "20240101120000").is_err());
    }

    #[test]
    fn test_email_values() {
        let s = schema();
        assert!(check(&s, "mailForward", "user@example.com").is_ok());
        assert!(check(&s, "mailForward", "userexample.com").is_err());
        assert!(check(&s, "mailForward", "User <user@example.com>").is_err());
        assert!(check(&s, "mailForward", "user@@example.com").is_err());

        assert!(check(&s, "mailFrom", "User Name <user@example.com>").is_ok());
        assert!(check(&s, "mailFrom", "User Name <user@example.com").is_err());

        assert!(check(&s, "mailRecipients", "a@example.com, B <b@example.com>").is_ok());
        assert!(check(&s, "mailRecipients", "a@example.com, b.example.com").is_err());

        let long = format!("{}@example.com", "a".repeat(60));
        assert!(check(&s, "mailForward", &long).is_err());
    }

    #[test]
    fn test_enum_and_regex_values() {
        let s = schema();
        let ai = s.get_attribute_info("status").expect("missing attr");
        let policy = ValidationPolicy::default();
        assert!(ai
            .check_value(Some(&AttrValue::from("locked")), false, &policy)
            .is_ok());
        match ai.check_value(Some(&AttrValue::from("Locked")), false, &policy) {
            Err(SchemaError::InvalidAttributeValue { reason, .. }) => {
                assert!(reason.contains("active, locked, closed"))
            }
            r => panic!("unexpected {:?}", r),
        }

        assert!(check(&s, "locale", "en_US").is_ok());
        assert!(check(&s, "locale", "en_US.UTF-8").is_err());
        assert!(check(&s, "locale", "xen_US").is_err());
    }

    #[test]
    fn test_port_and_length_values() {
        let s = schema();
        assert!(check(&s, "listenPort", "0").is_ok());
        assert!(check(&s, "listenPort", "65535").is_ok());
        assert!(check(&s, "listenPort", "65536").is_err());
        assert!(check(&s, "listenPort", "-1").is_err());

        assert!(check(&s, "description", "0123456789").is_ok());
        assert!(check(&s, "description", "01234567890").is_err());
        assert!(check(&s, "telephone", "12345").is_ok());
        assert!(check(&s, "telephone", "123456").is_err());

        // Unknown types accept anything.
        assert!(check(&s, "legacy", "\u{0}anything").is_ok());
    }

    #[test]
    fn test_id_values_follow_policy() {
        let s = schema();
        let ai = s.get_attribute_info("uid").expect("missing attr");
        let lax = ValidationPolicy::default();
        let strict = ValidationPolicy {
            require_uuid_ids: true,
        };
        let v = AttrValue::from("not-a-uuid");
        assert!(ai.check_value(Some(&v), false, &lax).is_ok());
        assert!(ai.check_value(Some(&v), false, &strict).is_err());
        let v = AttrValue::from("0d7c2d0e-3c4f-4a8e-9d7d-2b9d1f9e4a10");
        assert!(ai.check_value(Some(&v), false, &strict).is_ok());
    }

    #[test]
    fn test_immutable_and_cardinality() {
        let s = schema();
        let policy = ValidationPolicy::default();
        let status = s.get_attribute_info("status").expect("missing attr");
        assert!(status
            .check_value(Some(&AttrValue::from("active")), true, &policy)
            .is_err());
        assert!(status.check_value(None, true, &policy).is_err());
        assert!(status.check_value(None, false, &policy).is_ok());

        let desc = s.get_attribute_info("description").expect("missing attr");
        assert!(desc
            .check_value(Some(&AttrValue::from(vec!["a", "b"])), false, &policy)
            .is_err());
        assert!(desc
            .check_value(Some(&AttrValue::from(vec!["a"])), false, &policy)
            .is_ok());
        assert!(desc
            .check_value(Some(&AttrValue::Multi(Vec::new())), false, &policy)
            .is_ok());

        let fwd = s.get_attribute_info("mailForward").expect("missing attr");
        assert!(fwd
            .check_value(
                Some(&AttrValue::from(vec!["a@example.com", "bad"])),
                false,
                &policy
            )
            .is_err());
    }

    #[test]
    fn test_class_and_flag_queries() {
        let s = schema();
        assert_eq!(
            s.attrs_in_class(EntryClass::Account),
            vec!["loginEnabled", "maxLoginFailures", "status", "uid"]
        );
        assert_eq!(
            s.required_attrs_in_class(EntryClass::Account),
            vec!["status", "uid"]
        );
        assert_eq!(s.immutable_attrs(), vec!["status", "uid"]);
        assert_eq!(s.immutable_attrs_in_class(EntryClass::Domain), vec!["uid"]);
        assert!(s.immutable_attrs_in_class(EntryClass::Server).is_empty());

        assert_eq!(
            s.attrs_with_flag(AttributeFlag::AccountInherited),
            vec!["maxLoginFailures"]
        );
        assert!(s.is_account_inherited("MAXLOGINFAILURES"));
        assert!(s.is_server_inherited("listenPort"));
        assert!(!s.is_domain_inherited("listenPort"));
        assert!(!s.is_account_cos_domain_inherited("nope"));
    }

    #[test]
    fn test_version_queries() {
        let s = schema();
        // No since: present everywhere.
        assert_eq!(s.in_version("description", "1.0.0"), Ok(true));

        assert_eq!(s.in_version("mailHost", "8.0.1"), Ok(false));
        assert_eq!(s.in_version("mailHost", "8.0.2"), Ok(true));
        assert_eq!(s.in_version("mailHost", "8.0.7"), Ok(true));
        assert_eq!(s.in_version("mailHost", "8.5.0"), Ok(true));
        assert_eq!(s.in_version("mailHost", "9.0.0"), Ok(false));
        assert_eq!(s.in_version("mailHost", "9.0.1"), Ok(true));
        assert_eq!(s.in_version("mailHost", "10.0.0"), Ok(true));
        // 8.2 is later than 8.0 but earlier than the 8.5 line.
        assert_eq!(s.in_version("mailHost", "8.2.0"), Ok(true));
        assert_eq!(s.in_version("mailHost", "7.9.9"), Ok(false));

        assert_eq!(s.before_version("mailHost", "8.0.2"), Ok(false));
        assert_eq!(s.before_version("mailHost", "8.0.3"), Ok(true));
        assert_eq!(s.added_in("mailHost", "8.5.0"), Ok(true));
        assert_eq!(s.added_in("mailHost", "8.5.1"), Ok(false));

        assert!(s.is_future("nextThing"));
        assert!(!s.is_future("mailHost"));
        assert_eq!(s.in_version("nextThing", "99.0.0"), Ok(false));

        assert_eq!(
            s.in_version("nope", "8.0.0"),
            Err(OperationError::SchemaViolation(
                SchemaError::InvalidAttributeName("nope".to_string())
            ))
        );
        assert_eq!(
            s.in_version("mailHost", "eight"),
            Err(OperationError::InvalidRequest(String::new()))
        );
    }
}
