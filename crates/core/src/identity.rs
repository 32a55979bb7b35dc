//! Tool and agent identities shared by configuration, the CLI and the
//! dispatcher. Every alias the agent runtime is known to emit lives here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    CatalogQuery,
    AskUserQuestion,
    CreateAssistanceTicket,
    SalesSubagent,
    PostSaleSubagent,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        Self::CatalogQuery,
        Self::AskUserQuestion,
        Self::CreateAssistanceTicket,
        Self::SalesSubagent,
        Self::PostSaleSubagent,
    ];

    /// Names under which the runtime reports this tool. The first alias is the
    /// key the tool is registered with on the agent.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::CatalogQuery => &["catalogQuery", "catalog-query"],
            Self::AskUserQuestion => &["askUserQuestion", "ask-user-question"],
            Self::CreateAssistanceTicket => &["createAssistanceTicket", "create-assistance-ticket"],
            Self::SalesSubagent => &["personalShopperSales", "agent-personalShopperSales"],
            Self::PostSaleSubagent => &["personalShopperPostSale", "agent-personalShopperPostSale"],
        }
    }

    pub fn resolve(tool_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.matches(tool_name))
    }

    pub fn matches(&self, tool_name: &str) -> bool {
        self.aliases().iter().any(|alias| *alias == tool_name)
    }

    pub fn canonical_name(&self) -> &'static str {
        self.aliases()[0]
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentId {
    SimpleAgent,
    AgentWithPrompt,
    AgentWithTools,
    AgentWithMemory,
    PersonalShopper,
}

impl AgentId {
    pub const ALL: [AgentId; 5] = [
        Self::SimpleAgent,
        Self::AgentWithPrompt,
        Self::AgentWithTools,
        Self::AgentWithMemory,
        Self::PersonalShopper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SimpleAgent => "simple-agent",
            Self::AgentWithPrompt => "agent-with-prompt",
            Self::AgentWithTools => "agent-with-tools",
            Self::AgentWithMemory => "agent-with-memory",
            Self::PersonalShopper => "personal-shopper",
        }
    }

    /// Tools whose output this agent can put into a conversation.
    pub fn tools(&self) -> &'static [ToolKind] {
        match self {
            Self::SimpleAgent | Self::AgentWithPrompt => &[],
            Self::AgentWithTools | Self::AgentWithMemory => {
                &[ToolKind::CatalogQuery, ToolKind::AskUserQuestion]
            }
            Self::PersonalShopper => &[ToolKind::SalesSubagent, ToolKind::PostSaleSubagent],
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentId {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|agent| agent.as_str() == normalized).ok_or_else(|| {
            let expected = Self::ALL.map(|agent| agent.as_str()).join("|");
            ConfigError::Validation(format!("unsupported agent `{value}` (expected {expected})"))
        })
    }
}
