use crate::NETCONF_URN;
use core::convert::Infallible;
use core::fmt;
use core::fmt::Display;
use core::str::FromStr;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use uuid::Uuid;

/// Placeholder replaced by the single argument of a template.
pub const SLOT: &str = "{}";

static JUNOS_TEMPLATES: LazyLock<Arc<RpcTemplates>> =
    LazyLock::new(|| Arc::new(RpcTemplates::default()));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcCommand {
    Lock,
    Unlock,
    GetRollbackInformation,
    GetRollbackInformationCompare,
    GetRescueInformation,
    Command,
    CommandXml,
    CloseSession,
}

impl RpcCommand {
    pub const ALL: [RpcCommand; 8] = [
        RpcCommand::Lock,
        RpcCommand::Unlock,
        RpcCommand::GetRollbackInformation,
        RpcCommand::GetRollbackInformationCompare,
        RpcCommand::GetRescueInformation,
        RpcCommand::Command,
        RpcCommand::CommandXml,
        RpcCommand::CloseSession,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RpcCommand::Lock => "lock",
            RpcCommand::Unlock => "unlock",
            RpcCommand::GetRollbackInformation => "get-rollback-information",
            RpcCommand::GetRollbackInformationCompare => "get-rollback-information-compare",
            RpcCommand::GetRescueInformation => "get-rescue-information",
            RpcCommand::Command => "command",
            RpcCommand::CommandXml => "command-xml",
            RpcCommand::CloseSession => "close-session",
        }
    }

    fn junos_template(&self) -> &'static str {
        match self {
            RpcCommand::Lock => "<lock><target><candidate/></target></lock>",
            RpcCommand::Unlock => "<unlock><target><candidate/></target></unlock>",
            RpcCommand::GetRollbackInformation => {
                "<get-rollback-information><rollback>{}</rollback><format>text</format></get-rollback-information>"
            }
            RpcCommand::GetRollbackInformationCompare => {
                "<get-rollback-information><rollback>0</rollback><compare>{}</compare><format>text</format></get-rollback-information>"
            }
            RpcCommand::GetRescueInformation => {
                "<get-rescue-information><format>text</format></get-rescue-information>"
            }
            RpcCommand::Command => r#"<command format="text">{}</command>"#,
            RpcCommand::CommandXml => r#"<command format="xml">{}</command>"#,
            RpcCommand::CloseSession => "<close-session/>",
        }
    }
}

impl Display for RpcCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only table of RPC bodies keyed by operation.
///
/// The Junos table is built once per process and shared through
/// [`RpcTemplates::junos`]. A customised table starts from the defaults and
/// overrides single entries, so every [`RpcCommand`] always has a template.
#[derive(Debug, Clone)]
pub struct RpcTemplates {
    templates: HashMap<RpcCommand, String>,
}

impl Default for RpcTemplates {
    fn default() -> Self {
        RpcTemplates {
            templates: RpcCommand::ALL
                .iter()
                .map(|command| (*command, command.junos_template().to_string()))
                .collect(),
        }
    }
}

impl RpcTemplates {
    pub fn junos() -> Arc<RpcTemplates> {
        Arc::clone(&JUNOS_TEMPLATES)
    }

    pub fn with_template(mut self, command: RpcCommand, template: impl Into<String>) -> Self {
        self.templates.insert(command, template.into());
        self
    }

    pub fn get(&self, command: RpcCommand) -> &str {
        self.templates
            .get(&command)
            .map(String::as_str)
            .unwrap_or_else(|| command.junos_template())
    }

    /// Renders the body for `command`, filling its slot with `argument`.
    pub fn render(&self, command: RpcCommand, argument: Option<&str>) -> String {
        let template = self.get(command);
        match argument {
            Some(argument) => template.replacen(SLOT, argument, 1),
            None => template.to_string(),
        }
    }
}

/// Encloses an operation body in an `<rpc>` element with a fresh message-id.
pub fn wrap(body: &str) -> String {
    format!(
        r#"<rpc message-id="{}" xmlns="{}">{}</rpc>"#,
        Uuid::new_v4(),
        NETCONF_URN,
        body
    )
}

/// Rendering requested from `<command>`. Only `"xml"` selects [`OutputFormat::Xml`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    Xml,
    #[default]
    Text,
}

impl OutputFormat {
    pub(crate) fn rpc_command(&self) -> RpcCommand {
        match self {
            OutputFormat::Xml => RpcCommand::CommandXml,
            OutputFormat::Text => RpcCommand::Command,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xml" => Ok(OutputFormat::Xml),
            _ => Ok(OutputFormat::Text),
        }
    }
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(format) => format,
            Err(never) => match never {},
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Xml => f.write_str("xml"),
            OutputFormat::Text => f.write_str("text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_rollback_number() {
        let templates = RpcTemplates::default();
        for number in [0u32, 7, 49, 4_294_967_295] {
            let rendered = number.to_string();
            let rpc = templates.render(RpcCommand::GetRollbackInformation, Some(rendered.as_str()));
            assert_eq!(rpc.matches(&rendered).count(), 1);
            assert!(rpc.contains(&format!("<rollback>{}</rollback>", number)));
            assert!(!rpc.contains(SLOT));
        }
    }

    #[test]
    fn test_render_rollback_compare() {
        let templates = RpcTemplates::default();
        let rpc = templates.render(RpcCommand::GetRollbackInformationCompare, Some("3"));
        assert_eq!(
            rpc,
            "<get-rollback-information><rollback>0</rollback><compare>3</compare><format>text</format></get-rollback-information>"
        );
        assert_eq!(rpc.matches("<compare>3</compare>").count(), 1);
    }

    #[test]
    fn test_render_without_slot() {
        let templates = RpcTemplates::default();
        assert_eq!(
            templates.render(RpcCommand::Lock, Some("ignored")),
            "<lock><target><candidate/></target></lock>"
        );
        assert_eq!(
            templates.render(RpcCommand::GetRescueInformation, None),
            "<get-rescue-information><format>text</format></get-rescue-information>"
        );
    }

    #[test]
    fn test_template_override() {
        let templates =
            RpcTemplates::default().with_template(RpcCommand::Lock, "<lock-configuration/>");
        assert_eq!(templates.get(RpcCommand::Lock), "<lock-configuration/>");
        assert_eq!(
            templates.get(RpcCommand::Unlock),
            "<unlock><target><candidate/></target></unlock>"
        );
    }

    #[test]
    fn test_junos_table_is_shared() {
        assert!(Arc::ptr_eq(&RpcTemplates::junos(), &RpcTemplates::junos()));
    }

    #[test]
    fn test_output_format() {
        assert_eq!(OutputFormat::from("xml"), OutputFormat::Xml);
        assert_eq!(OutputFormat::from("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::from("anything-else"), OutputFormat::Text);
        assert_eq!(OutputFormat::from("XML"), OutputFormat::Text);
        assert_eq!(OutputFormat::Xml.rpc_command(), RpcCommand::CommandXml);
        assert_eq!(OutputFormat::Text.rpc_command(), RpcCommand::Command);
    }

    #[test]
    fn test_wrap() {
        let rpc = wrap("<close-session/>");
        assert!(rpc.starts_with("<rpc message-id=\""));
        assert!(rpc.ends_with(
            r#" xmlns="urn:ietf:params:xml:ns:netconf:base:1.0"><close-session/></rpc>"#
        ));
        assert_ne!(wrap("<lock/>"), wrap("<lock/>"));
    }
}
