use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::*;

pub use smartstring::alias::String as AttrString;

/// The attributes the provisioning engine itself needs to reason about. Every
/// other attribute is carried as [`Attribute::Custom`] and is only meaningful
/// to the schema.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
#[serde(from = "&str", into = "AttrString")]
pub enum Attribute {
    Id,
    Name,
    ForeignPrincipal,
    VirtualHostname,
    ForeignName,
    Krb5Realm,
    Custom(AttrString),
}

impl AsRef<str> for Attribute {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Self::from_str(value)
    }
}

impl From<Attribute> for AttrString {
    fn from(val: Attribute) -> Self {
        AttrString::from(val.as_str())
    }
}

impl Attribute {
    const KNOWN: [Attribute; 6] = [
        Attribute::Id,
        Attribute::Name,
        Attribute::ForeignPrincipal,
        Attribute::VirtualHostname,
        Attribute::ForeignName,
        Attribute::Krb5Realm,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Attribute::Id => ATTR_ID,
            Attribute::Name => ATTR_NAME,
            Attribute::ForeignPrincipal => ATTR_FOREIGN_PRINCIPAL,
            Attribute::VirtualHostname => ATTR_VIRTUAL_HOSTNAME,
            Attribute::ForeignName => ATTR_FOREIGN_NAME,
            Attribute::Krb5Realm => ATTR_KRB5_REALM,
            Attribute::Custom(value) => value.as_str(),
        }
    }

    // Infallible, unlike the std FromStr. Attribute names are case-insensitive.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(value))
            .cloned()
            .unwrap_or_else(|| Attribute::Custom(AttrString::from(value)))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::Attribute;

    #[test]
    fn test_attribute_from_str() {
        assert_eq!(Attribute::Id, Attribute::from_str("ID"));
        assert_eq!(
            Attribute::VirtualHostname,
            Attribute::from_str("virtualhostname")
        );
        assert_eq!(
            Attribute::Custom("maxLoginFailures".into()),
            Attribute::from_str("maxLoginFailures")
        );
    }

    #[test]
    fn test_attribute_round_trip() {
        for attr in Attribute::KNOWN.iter() {
            assert_eq!(attr, &Attribute::from(attr.as_str()));
        }
        let json = serde_json::to_string(&Attribute::Krb5Realm).expect("serialise");
        assert_eq!(json, "\"authKerberos5Realm\"");
    }
}
