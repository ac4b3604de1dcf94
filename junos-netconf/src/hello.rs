use crate::{NETCONF_BASE_10_CAP, NETCONF_BASE_11_CAP, NETCONF_URN};
use core::fmt;
use core::fmt::Display;
use quick_xml::se::Serializer;
use serde_derive::{Deserialize, Serialize};

/// `<hello>` exchanged when a session is opened.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename(serialize = "hello"))]
pub struct Hello {
    #[serde(rename = "@xmlns", default)]
    xmlns: String,
    #[serde(default)]
    capabilities: Capabilities,
    #[serde(rename = "session-id", skip_serializing_if = "Option::is_none")]
    session_id: Option<u64>,
}

impl Hello {
    /// Hello advertised by this client: base:1.0 and base:1.1 framing.
    pub fn client() -> Hello {
        Hello {
            xmlns: NETCONF_URN.to_string(),
            session_id: None,
            capabilities: Capabilities {
                capability: vec![
                    NETCONF_BASE_10_CAP.to_string(),
                    NETCONF_BASE_11_CAP.to_string(),
                ],
            },
        }
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities.capability
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities
            .capability
            .iter()
            .any(|cap| cap.trim() == capability)
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session_id
    }
}

impl Display for Hello {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use serde::Serialize;
        let mut buffer = String::with_capacity(206);
        let ser = Serializer::new(&mut buffer);
        self.serialize(ser).map_err(|_| fmt::Error)?;
        f.write_str(&buffer)
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct Capabilities {
    #[serde(default)]
    capability: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quick_xml::de::from_str;

    #[test]
    fn test_serialize_client_hello() {
        let expected = r#"<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><capabilities><capability>urn:ietf:params:netconf:base:1.0</capability><capability>urn:ietf:params:netconf:base:1.1</capability></capabilities></hello>"#;
        assert_eq!(Hello::client().to_string(), expected);
    }

    #[test]
    fn test_deserialize_junos_hello() {
        let hello = r#"
<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <capabilities>
    <capability>urn:ietf:params:netconf:base:1.0</capability>
    <capability>urn:ietf:params:netconf:capability:candidate:1.0</capability>
    <capability>urn:ietf:params:netconf:base:1.1</capability>
    <capability>http://xml.juniper.net/netconf/junos/1.0</capability>
  </capabilities>
  <session-id>27700</session-id>
</hello>
"#;
        let hello: Hello = from_str(hello).unwrap();
        assert_eq!(hello.session_id(), Some(27700));
        assert_eq!(hello.capabilities().len(), 4);
        assert!(hello.has_capability(NETCONF_BASE_11_CAP));
        assert!(!hello.has_capability("urn:ietf:params:netconf:capability:startup:1.0"));
    }

    #[test]
    fn test_deserialize_base_10_hello() {
        let hello = r#"<hello><capabilities><capability>urn:ietf:params:netconf:base:1.0</capability></capabilities></hello>"#;
        let hello: Hello = from_str(hello).unwrap();
        assert_eq!(hello.session_id(), None);
        assert!(hello.has_capability(NETCONF_BASE_10_CAP));
        assert!(!hello.has_capability(NETCONF_BASE_11_CAP));
    }
}
