//! Line Protocol Implementation
//!
//! ShelfKV speaks a plain-text, one-message-per-line protocol.
//!
//! ## Modules
//!
//! - `types`: `Request`, `Command` and `Reply`
//! - `parser`: message framing and validation
//!
//! ## Example
//!
//! ```
//! use shelfkv::protocol::{parse_request, Command, Reply, Request};
//!
//! let request = parse_request(b"x db1 \"HGET table1 foo\"").unwrap();
//! assert_eq!(
//!     request,
//!     Request::Query {
//!         database: "db1".to_string(),
//!         command: Command::HGet { table: "table1".to_string(), key: "foo".to_string() },
//!     }
//! );
//!
//! assert_eq!(&Reply::value("bar").serialize()[..], b"bar\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{is_blank, next_frame, Frame, parse_command, parse_request, ParseError, ParseResult};
pub use types::{Command, Reply, Request, REMOVED};
