//! Graph access layer: the execution port and raw statement helpers.
//!
//! - [`CypherExecutor`] - the injected execution port
//! - [`Query`] / [`QueryExt`] - bind parameters to a raw statement and run it
//! - [`Row`] / [`Node`] - JSON rows returned by the port
//! - [`backends`] - concrete executors
//!
//! # Usage
//!
//! ```ignore
//! use neoquent::graph::QueryExt;
//!
//! let rows = client.query("MATCH (n:Person) WHERE n.age >= $age RETURN n")
//!     .param("age", 18)
//!     .fetch_all()
//!     .await?;
//! ```

mod ident;
mod macros;
mod query;
mod row;
mod traits;

pub mod backends;

pub use ident::{identifier, is_identifier};
pub use query::{Query, QueryExt};
pub use row::{Node, Params, Row, RowStream};
pub use traits::CypherExecutor;

// Re-export macro (defined at crate root via #[macro_export])
#[doc(inline)]
pub use crate::cypher;
