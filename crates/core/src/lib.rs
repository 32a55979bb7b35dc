pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod identity;

pub use catalog::{Catalog, CatalogError, CatalogProduct, Category};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::message::{MessagePart, ToolInvocation, ToolState};
pub use domain::product::{ProductId, ProductRecord};
pub use domain::question::PendingQuestion;
pub use domain::ticket::{TicketCategory, TicketId, TicketPriority, TicketRecord, TicketStatus};
pub use errors::{ApplicationError, DomainError};
pub use identity::{AgentId, ToolKind};
