//! Data layer for the Newsdesk content-management system.
//!
//! The centerpiece is the [`DataGateway`]: one uniform, type-parametric
//! surface for persisting, retrieving, updating, deleting, and querying
//! any [`newsdesk_types::Record`] type. The gateway owns no storage -- it
//! delegates every round trip to an injected persistence [`Session`],
//! which holds the transactions, identity, and flush semantics.
//!
//! ```text
//! Business logic
//!     |
//!     +-- typed records ------> DataGateway (generic, stateless)
//!                                   |
//!                                   +-- JSON documents --> Session
//!                                                          (MemorySession)
//! ```
//!
//! # Modules
//!
//! - [`gateway`] -- The generic record access gateway
//! - [`session`] -- The persistence-session trait the gateway consumes
//! - [`memory`] -- In-process session engine with registered collections
//! - [`query`] -- Structured queries: params, filters, paging, statements
//! - [`convert`] -- UI-facing language identifier conversion
//! - [`error`] -- Shared error types

pub mod convert;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod query;
pub mod session;

// Re-export primary types for convenience.
pub use convert::{ConvertError, LanguageConverter};
pub use error::DataError;
pub use gateway::DataGateway;
pub use memory::{CollectionSpec, MemorySession, MemorySessionBuilder};
pub use query::{
    Assignment, Filter, NamedQuery, Operand, Ordering, Page, Predicate, QueryParams,
    SortDirection, Statement, Test,
};
pub use session::Session;
