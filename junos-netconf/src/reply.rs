use crate::error::{Error, Result};
use core::fmt;
use core::fmt::Display;
use log::debug;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use quick_xml::DeError;
use serde_derive::Deserialize;

const RPC_REPLY: &str = "rpc-reply";
const RPC_ERROR: &str = "rpc-error";
const CONFIGURATION_INFORMATION: &str = "configuration-information";
const CONFIGURATION_OUTPUT: &str = "configuration-output";

type DecodeResult<T> = core::result::Result<T, DeError>;

/// One `<rpc-error>` reported by the device.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RpcError {
    error_type: Option<String>,
    error_tag: Option<String>,
    error_severity: Option<String>,
    error_path: Option<String>,
    error_message: Option<String>,
}

impl RpcError {
    pub fn error_type(&self) -> Option<&str> {
        self.error_type.as_deref().map(str::trim)
    }

    pub fn tag(&self) -> Option<&str> {
        self.error_tag.as_deref().map(str::trim)
    }

    pub fn severity(&self) -> Option<&str> {
        self.error_severity.as_deref().map(str::trim)
    }

    pub fn path(&self) -> Option<&str> {
        self.error_path.as_deref().map(str::trim)
    }

    pub fn message(&self) -> Option<&str> {
        self.error_message.as_deref().map(str::trim)
    }

    /// Anything but an explicit `warning` fails the reply.
    pub fn is_error(&self) -> bool {
        self.severity() != Some("warning")
    }
}

impl Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.message(), self.tag()) {
            (Some(message), _) => f.write_str(message),
            (None, Some(tag)) => write!(f, "rpc-error: {}", tag),
            (None, None) => f.write_str("rpc-error without message"),
        }
    }
}

impl std::error::Error for RpcError {}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RpcReplyErrors {
    #[serde(default)]
    rpc_error: Vec<RpcError>,
}

/// Envelope of a single `<rpc-reply>`: its errors and its raw payload.
#[derive(Debug)]
pub struct Reply {
    errors: Vec<RpcError>,
    data: String,
}

impl Reply {
    pub fn parse(xml: &str) -> DecodeResult<Reply> {
        let reply = find_element(xml, RPC_REPLY)?.ok_or_else(|| missing(RPC_REPLY))?;
        let errors: RpcReplyErrors = from_str(reply.outer)?;
        Ok(Reply {
            errors: errors.rpc_error,
            data: reply.inner.to_string(),
        })
    }

    pub fn is_ok(&self) -> bool {
        !self.errors.iter().any(RpcError::is_error)
    }

    pub fn errors(&self) -> &[RpcError] {
        &self.errors
    }

    /// Raw inner XML of `<rpc-reply>`.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Fails with the first `<rpc-error>` of an unsuccessful reply. The
    /// remaining ones are dropped.
    pub fn into_result(self) -> Result<Reply> {
        if self.is_ok() {
            return Ok(self);
        }
        if self.errors.len() > 1 {
            debug!(
                "Discarding {} rpc-error(s) after the first one",
                self.errors.len() - 1
            );
        }
        let first = self.errors.into_iter().next().unwrap_or_default();
        Err(Error::Device(first))
    }
}

/// Replies carrying `configuration-information/configuration-output` text.
pub(crate) trait ConfigurationReply {
    const ELEMENT: &'static str;
}

pub(crate) struct RollbackInformation;

impl ConfigurationReply for RollbackInformation {
    const ELEMENT: &'static str = "rollback-information";
}

pub(crate) struct RescueInformation;

impl ConfigurationReply for RescueInformation {
    const ELEMENT: &'static str = "rescue-information";
}

/// Text of `configuration-output` inside the `T::ELEMENT` element of a reply
/// payload, whitespace included. Absent nested elements decode as "".
pub(crate) fn decode<T: ConfigurationReply>(data: &str) -> DecodeResult<String> {
    let element = find_element(data, T::ELEMENT)?.ok_or_else(|| missing(T::ELEMENT))?;
    let output = match find_element(element.inner, CONFIGURATION_INFORMATION)? {
        Some(information) => find_element(information.inner, CONFIGURATION_OUTPUT)?,
        None => None,
    };
    match output {
        Some(output) => text_content(output.inner),
        None => Ok(String::new()),
    }
}

/// Raw inner XML of the first payload element that is not an `<rpc-error>`.
pub(crate) fn command_output(data: &str) -> DecodeResult<&str> {
    Ok(top_level_elements(data)?
        .into_iter()
        .find(|element| element.name != RPC_ERROR)
        .map(|element| element.inner)
        .unwrap_or_default())
}

fn missing(name: &str) -> DeError {
    DeError::Custom(format!("expected element <{}>", name))
}

#[derive(Debug, PartialEq)]
struct Element<'a> {
    name: String,
    outer: &'a str,
    inner: &'a str,
}

fn find_element<'a>(xml: &'a str, name: &str) -> DecodeResult<Option<Element<'a>>> {
    Ok(top_level_elements(xml)?
        .into_iter()
        .find(|element| element.name == name))
}

/// Splits a fragment into its top-level elements, keeping raw slices of each.
fn top_level_elements(xml: &str) -> DecodeResult<Vec<Element<'_>>> {
    let mut reader = Reader::from_str(xml);
    let mut elements = Vec::new();
    let mut depth = 0usize;
    let mut open: Option<(String, usize, usize)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if depth == 0 {
                    let inner = reader.buffer_position();
                    let outer = tag_start(xml, inner);
                    open = Some((local_name(start.local_name().into_inner()), outer, inner));
                }
                depth += 1;
            }
            Event::Empty(empty) if depth == 0 => {
                let end = reader.buffer_position();
                elements.push(Element {
                    name: local_name(empty.local_name().into_inner()),
                    outer: &xml[tag_start(xml, end)..end],
                    inner: "",
                });
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    if let Some((name, outer, inner)) = open.take() {
                        let end = reader.buffer_position();
                        let close = xml[..end].rfind("</").unwrap_or(end);
                        elements.push(Element {
                            name,
                            outer: &xml[outer..end],
                            inner: &xml[inner..close],
                        });
                    }
                }
            }
            Event::Eof if depth == 0 => return Ok(elements),
            Event::Eof => return Err(DeError::UnexpectedEof),
            _ => {}
        }
    }
}

/// Unescaped character data of a fragment, without trimming.
fn text_content(xml: &str) -> DecodeResult<String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(content) => text.push_str(&content.unescape()?),
            Event::CData(content) => text.push_str(&String::from_utf8_lossy(&content)),
            Event::Eof => return Ok(text),
            _ => {}
        }
    }
}

fn local_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

fn tag_start(xml: &str, end: usize) -> usize {
    xml[..end].rfind('<').unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_rpc_errors() {
        let reply = r#"
<rpc-reply message-id="67d83d6b-1f0b-47fb-8fdf-2cfc3fb2a371" xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <rpc-error>
    <error-type>protocol</error-type>
    <error-tag>lock-denied</error-tag>
    <error-severity>error</error-severity>
    <error-message>
      configuration database locked by another user
    </error-message>
    <error-info>
      <session-id>4242</session-id>
    </error-info>
  </rpc-error>
  <rpc-error>
    <error-type>application</error-type>
    <error-tag>operation-failed</error-tag>
    <error-severity>error</error-severity>
    <error-message>second failure</error-message>
  </rpc-error>
</rpc-reply>
"#;
        let reply = Reply::parse(reply).unwrap();
        assert!(!reply.is_ok());
        assert_eq!(reply.errors().len(), 2);
        let first = &reply.errors()[0];
        assert_eq!(first.tag(), Some("lock-denied"));
        assert_eq!(first.error_type(), Some("protocol"));
        assert_eq!(
            first.message(),
            Some("configuration database locked by another user")
        );

        match reply.into_result() {
            Err(Error::Device(err)) => {
                assert_eq!(err.to_string(), "configuration database locked by another user")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ok_reply() {
        let reply = r#"
<?xml version="1.0" encoding="UTF-8"?>
<rpc-reply message-id="938f1c28-e6e3-4641-a4d0-383d9ef1a280" xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <ok/>
</rpc-reply>
"#;
        let reply = Reply::parse(reply).unwrap();
        assert!(reply.is_ok());
        assert!(reply.errors().is_empty());
        assert_eq!(reply.data().trim(), "<ok/>");
    }

    #[test]
    fn test_warning_does_not_fail_reply() {
        let reply = r#"<rpc-reply xmlns:junos="http://xml.juniper.net/junos/21.4R0/junos"><rpc-error><error-severity>warning</error-severity><error-message>statement not applied</error-message></rpc-error><ok/></rpc-reply>"#;
        let reply = Reply::parse(reply).unwrap();
        assert!(reply.is_ok());
        assert_eq!(reply.errors().len(), 1);
        assert!(reply.into_result().is_ok());
    }

    #[test]
    fn test_parse_prefixed_and_empty_reply() {
        let reply = Reply::parse(r#"<nc:rpc-reply xmlns:nc="urn:ietf:params:xml:ns:netconf:base:1.0"/>"#).unwrap();
        assert!(reply.is_ok());
        assert_eq!(reply.data(), "");

        let reply = Reply::parse("<nc:rpc-reply><data>x</data></nc:rpc-reply>").unwrap();
        assert_eq!(reply.data(), "<data>x</data>");
    }

    #[test]
    fn test_parse_rejects_other_documents() {
        assert!(Reply::parse("<hello/>").is_err());
        assert!(Reply::parse("").is_err());
        assert!(Reply::parse("<rpc-reply><ok/>").is_err());
    }

    #[test]
    fn test_decode_rollback() {
        let data = r#"
<rollback-information xmlns="http://xml.juniper.net/junos/21.4R0/junos">
  <configuration-information>
    <configuration-output>## Last changed: 2024-01-01
system {
    host-name r1;
}</configuration-output>
  </configuration-information>
</rollback-information>
"#;
        let config = decode::<RollbackInformation>(data).unwrap();
        assert!(config.starts_with("## Last changed: 2024-01-01"));
        assert!(config.contains("host-name r1;"));
    }

    #[test]
    fn test_decode_unescapes_text() {
        let data = "<rollback-information><configuration-information><configuration-output>[edit]\n- description &quot;a &amp; b&quot;;</configuration-output></configuration-information></rollback-information>";
        assert_eq!(
            decode::<RollbackInformation>(data).unwrap(),
            "[edit]\n- description \"a & b\";"
        );
    }

    #[test]
    fn test_decode_keeps_whitespace() {
        let data = "<rollback-information><configuration-information><configuration-output>\n## Last changed\n    system {}\n</configuration-output></configuration-information></rollback-information>";
        assert_eq!(
            decode::<RollbackInformation>(data).unwrap(),
            "\n## Last changed\n    system {}\n"
        );

        let data = "<rescue-information><configuration-information><configuration-output><![CDATA[a < b]]>\n</configuration-output></configuration-information></rescue-information>";
        assert_eq!(decode::<RescueInformation>(data).unwrap(), "a < b\n");
    }

    #[test]
    fn test_decode_missing_output_is_empty() {
        let data = "<rescue-information><configuration-information/></rescue-information>";
        assert_eq!(decode::<RescueInformation>(data).unwrap(), "");
        let data = "<rescue-information/>";
        assert_eq!(decode::<RescueInformation>(data).unwrap(), "");
    }

    #[test]
    fn test_decode_wrong_element() {
        let data = "<rollback-information><configuration-information><configuration-output>x</configuration-output></configuration-information></rollback-information>";
        assert!(decode::<RescueInformation>(data).is_err());
        assert!(decode::<RollbackInformation>("").is_err());
    }

    #[test]
    fn test_command_output() {
        let data = "\n<output>\nHostname: r1\nModel: vmx\n</output>\n";
        assert_eq!(command_output(data).unwrap(), "\nHostname: r1\nModel: vmx\n");

        let data = r#"<rpc-error><error-severity>warning</error-severity></rpc-error><software-information><host-name>r1</host-name></software-information>"#;
        assert_eq!(command_output(data).unwrap(), "<host-name>r1</host-name>");

        assert_eq!(command_output("").unwrap(), "");
        assert_eq!(command_output("<output/>").unwrap(), "");
    }

    #[test]
    fn test_top_level_elements() {
        let xml = r#"<a x="1"><b/><a>nested</a></a><c/>"#;
        let elements = top_level_elements(xml).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].name, "a");
        assert_eq!(elements[0].outer, r#"<a x="1"><b/><a>nested</a></a>"#);
        assert_eq!(elements[0].inner, "<b/><a>nested</a>");
        assert_eq!(elements[1].name, "c");
        assert_eq!(elements[1].outer, "<c/>");
    }
}
