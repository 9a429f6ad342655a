//! Resource pool types

use super::codec::{keys_of, Literal, PropertyCodec, PropertyDescriptor};
use super::properties::Properties;
use crate::api::RequestValues;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

const COMMENT: PropertyDescriptor =
    PropertyDescriptor::string("comment").with_default(Literal::Str(""));

const POOL_DESCRIPTORS: &[PropertyDescriptor] = &[COMMENT];

const MEMBERS: &str = "members";

/// Editable pool properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolProperties {
    pub description: String,
}

impl PropertyCodec for PoolProperties {
    fn known_keys() -> Vec<&'static str> {
        keys_of(POOL_DESCRIPTORS)
    }

    fn decode(bag: &Properties) -> Result<Self> {
        Ok(Self {
            description: COMMENT.decode_string(bag)?,
        })
    }

    /// The comment is always sent, so an empty description clears it
    fn encode(&self) -> Result<RequestValues> {
        let mut values = RequestValues::new();
        values.add_string(COMMENT.name, self.description.as_str());
        Ok(values)
    }
}

/// A guest or storage assigned to a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMember {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub vmid: Option<u32>,
    #[serde(default)]
    pub storage: Option<String>,
}

/// Pool detail record: properties plus membership
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolConfig {
    pub properties: PoolProperties,
    pub members: Vec<PoolMember>,
}

impl PropertyCodec for PoolConfig {
    fn known_keys() -> Vec<&'static str> {
        let mut keys = PoolProperties::known_keys();
        keys.push(MEMBERS);
        keys
    }

    fn decode(bag: &Properties) -> Result<Self> {
        let members = match bag.get(MEMBERS) {
            None => Vec::new(),
            Some(value) => Vec::<PoolMember>::deserialize(value)
                .map_err(|_| Error::invalid(MEMBERS, value.clone()))?,
        };

        Ok(Self {
            properties: PoolProperties::decode(bag)?,
            members,
        })
    }

    /// Membership is managed through dedicated calls and never encoded
    fn encode(&self) -> Result<RequestValues> {
        self.properties.encode()
    }
}

/// Pool name from a `pools` listing row
pub fn pool_id_from_listing(bag: &Properties) -> Result<String> {
    const POOL_ID: PropertyDescriptor = PropertyDescriptor::string("poolid");
    POOL_ID.decode_string(bag)
}

impl PoolConfig {
    pub fn members_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a PoolMember> {
        self.members.iter().filter(move |m| m.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::codec::Detail;
    use serde_json::json;

    #[test]
    fn test_pool_detail() {
        let bag = Properties::from_value(json!({
            "comment": "lab machines",
            "members": [
                {"id": "qemu/100", "type": "qemu", "node": "pve1", "vmid": 100, "status": "running"},
                {"id": "storage/pve1/local", "type": "storage", "node": "pve1", "storage": "local"}
            ],
            "digest": "ab12"
        }))
        .unwrap();

        let detail = Detail::<PoolConfig>::decode(bag).unwrap();
        assert_eq!(detail.properties.properties.description, "lab machines");
        assert_eq!(detail.properties.members.len(), 2);
        assert_eq!(detail.properties.members[0].vmid, Some(100));
        assert_eq!(detail.properties.members_of_kind("storage").count(), 1);
        assert_eq!(detail.extras.keys().collect::<Vec<_>>(), vec!["digest"]);
    }

    #[test]
    fn test_malformed_members() {
        let bag = Properties::from_value(json!({"members": "none"})).unwrap();
        assert!(matches!(
            PoolConfig::decode(&bag),
            Err(Error::InvalidProperty { ref name, .. }) if name == "members"
        ));
    }

    #[test]
    fn test_empty_description_is_sent() {
        let values = PoolProperties::default().encode().unwrap();
        assert_eq!(values.get("comment"), Some(""));
    }

    #[test]
    fn test_pool_id_from_listing() {
        let row = Properties::from_value(json!({"poolid": "lab"})).unwrap();
        assert_eq!(pool_id_from_listing(&row).unwrap(), "lab");
        assert!(pool_id_from_listing(&Properties::new()).is_err());
    }
}
