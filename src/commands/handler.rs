//! Command Handler Module
//!
//! Executes decoded requests against the shared [`Registry`].
//!
//! ## Supported Commands
//!
//! ### Stack / Queue
//! - `SPUSH name value` - Push onto a stack (no reply)
//! - `SPOP name` - Pop the most recent value
//! - `QPUSH name value` - Append to a queue (no reply)
//! - `QPOP name` - Pop the oldest value
//!
//! ### Hash Table
//! - `HSET name key value` - Insert or overwrite (no reply)
//! - `HGET name key` - Read a value
//! - `HDEL name key` - Remove a key
//!
//! ### Set
//! - `SADD name value` - Add a member (no reply)
//! - `SREM name value` - Remove a member
//! - `SISMEMBER name value` - `true` or `false`
//!
//! ### Administrative
//! - `dump database` - Log a database's contents server-side (no reply)
//!
//! ## Locking
//!
//! ```text
//! raw line ──> parse_request() ──> lock ──> run() ──> unlock ──> Option<Reply>
//!              (no lock held)       └── one command, nothing else ──┘
//! ```
//!
//! There is exactly one lock for the whole process. Every command runs to
//! completion while holding it, so commands from all connections execute in
//! a single total order. The lock is never held across socket I/O.

use crate::protocol::{parse_request, Command, Reply, Request};
use crate::storage::{CollectionKind, Database, Registry, StoreError, StoreResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dispatches requests to the registry. Cheap to clone; clones share the
/// same registry and lock.
#[derive(Clone)]
pub struct CommandHandler {
    registry: Arc<Mutex<Registry>>,
}

impl CommandHandler {
    /// Creates a handler over an existing shared registry.
    pub fn new(registry: Arc<Mutex<Registry>>) -> Self {
        Self { registry }
    }

    /// Creates a handler over a fresh, empty registry.
    pub fn with_table_capacity(table_capacity: usize) -> Self {
        Self::new(Arc::new(Mutex::new(Registry::new(table_capacity))))
    }

    /// Returns the shared registry.
    pub fn registry(&self) -> &Arc<Mutex<Registry>> {
        &self.registry
    }

    /// Parses and executes one raw message.
    ///
    /// Returns the reply line to send, or `None` when the command succeeds
    /// silently (push/insert verbs) or is a `dump`.
    pub fn execute(&self, message: &[u8]) -> Option<Reply> {
        match parse_request(message) {
            Ok(request) => self.dispatch(request),
            Err(e) => {
                warn!(error = %e, "Rejected malformed command");
                Some(Reply::error(format!("ERR {}", e)))
            }
        }
    }

    /// Executes an already decoded request under the registry lock.
    pub fn dispatch(&self, request: Request) -> Option<Reply> {
        let mut registry = self.registry.lock();

        match request {
            Request::Dump { database } => {
                match registry.database(&database) {
                    Some(db) => info!(database = %database, "Dump:\n{}", db),
                    None => {
                        let known: Vec<&str> = registry.names().collect();
                        warn!(database = %database, ?known, "Dump requested for unknown database");
                    }
                }
                None
            }
            Request::Query { database, command } => {
                let verb = command.verb();
                debug!(database = %database, verb, write = command.is_write(), "Executing command");

                let db = registry.database_or_create(&database);
                let reply = run(db, command);
                if let Some(reply) = reply.as_ref().filter(|reply| reply.is_error()) {
                    debug!(database = %database, verb, reply = %reply, "Command failed");
                }
                reply
            }
        }
    }
}

/// Runs one command against a database.
fn run(db: &mut Database, command: Command) -> Option<Reply> {
    match command {
        Command::SPush { stack, value } => {
            db.stack_or_create(&stack).push(value);
            None
        }
        Command::SPop { stack } => {
            let result = db
                .stack_mut(&stack)
                .ok_or(StoreError::MissingCollection(CollectionKind::Stack))
                .and_then(|stack| stack.pop());
            Some(value_reply(result))
        }
        Command::QPush { queue, value } => {
            db.queue_or_create(&queue).push(value);
            None
        }
        Command::QPop { queue } => {
            let result = db
                .queue_mut(&queue)
                .ok_or(StoreError::MissingCollection(CollectionKind::Queue))
                .and_then(|queue| queue.pop());
            Some(value_reply(result))
        }
        Command::HSet { table, key, value } => {
            write_reply(db.hash_table_or_create(&table).add(key, value))
        }
        Command::HGet { table, key } => {
            let result = db
                .hash_table_mut(&table)
                .ok_or(StoreError::MissingCollection(CollectionKind::HashTable))
                .and_then(|table| table.get(&key).map(str::to_string));
            Some(value_reply(result))
        }
        Command::HDel { table, key } => {
            let result = db
                .hash_table_mut(&table)
                .ok_or(StoreError::MissingCollection(CollectionKind::HashTable))
                .and_then(|table| table.delete(&key).map(|_| ()));
            Some(removed_reply(result))
        }
        Command::SAdd { set, value } => write_reply(db.set_or_create(&set).add(value)),
        Command::SRem { set, value } => {
            let result = db
                .set_mut(&set)
                .ok_or(StoreError::MissingCollection(CollectionKind::Set))
                .and_then(|set| set.remove(&value));
            Some(removed_reply(result))
        }
        Command::SIsMember { set, value } => {
            let reply = match db.set_mut(&set) {
                Some(set) => Reply::Bool(set.is_member(&value)),
                None => StoreError::MissingCollection(CollectionKind::Set).into(),
            };
            Some(reply)
        }
    }
}

fn value_reply(result: StoreResult<String>) -> Reply {
    result.map_or_else(Reply::from, Reply::Value)
}

fn removed_reply(result: StoreResult<()>) -> Reply {
    result.map_or_else(Reply::from, |()| Reply::Removed)
}

/// Writes are silent unless they were refused.
fn write_reply(result: StoreResult<()>) -> Option<Reply> {
    result.err().map(Reply::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn create_handler() -> CommandHandler {
        CommandHandler::with_table_capacity(512)
    }

    fn exec(handler: &CommandHandler, line: &str) -> Option<Reply> {
        handler.execute(line.as_bytes())
    }

    #[test]
    fn test_hset_hget() {
        let handler = create_handler();

        assert_eq!(exec(&handler, "x db1 \"HSET table1 foo bar\""), None);
        assert_eq!(
            exec(&handler, "x db1 \"HGET table1 foo\""),
            Some(Reply::value("bar"))
        );
        assert_eq!(
            exec(&handler, "x db1 \"HGET table1 missing\""),
            Some(Reply::error("Key not found"))
        );
    }

    #[test]
    fn test_hdel() {
        let handler = create_handler();

        exec(&handler, "x db \"HSET t k v\"");
        assert_eq!(exec(&handler, "x db \"HDEL t k\""), Some(Reply::Removed));
        assert_eq!(
            exec(&handler, "x db \"HDEL t k\""),
            Some(Reply::error("Key not found"))
        );
        assert_eq!(
            exec(&handler, "x db \"HGET t k\""),
            Some(Reply::error("Key not found"))
        );
    }

    #[test]
    fn test_stack() {
        let handler = create_handler();

        assert_eq!(exec(&handler, "x db1 \"SPUSH s1 a\""), None);
        assert_eq!(exec(&handler, "x db1 \"SPUSH s1 b\""), None);
        assert_eq!(exec(&handler, "x db1 \"SPOP s1\""), Some(Reply::value("b")));
        assert_eq!(exec(&handler, "x db1 \"SPOP s1\""), Some(Reply::value("a")));
        assert_eq!(
            exec(&handler, "x db1 \"SPOP s1\""),
            Some(Reply::error("Stack is empty"))
        );
    }

    #[test]
    fn test_queue() {
        let handler = create_handler();

        exec(&handler, "x db \"QPUSH q a\"");
        exec(&handler, "x db \"QPUSH q b\"");
        assert_eq!(exec(&handler, "x db \"QPOP q\""), Some(Reply::value("a")));
        assert_eq!(exec(&handler, "x db \"QPOP q\""), Some(Reply::value("b")));
        assert_eq!(
            exec(&handler, "x db \"QPOP q\""),
            Some(Reply::error("Queue is empty"))
        );
    }

    #[test]
    fn test_set() {
        let handler = create_handler();

        assert_eq!(exec(&handler, "x db \"SADD tags red\""), None);
        assert_eq!(
            exec(&handler, "x db \"SISMEMBER tags red\""),
            Some(Reply::Bool(true))
        );
        assert_eq!(
            exec(&handler, "x db \"SISMEMBER tags blue\""),
            Some(Reply::Bool(false))
        );
        assert_eq!(exec(&handler, "x db \"SREM tags red\""), Some(Reply::Removed));
        assert_eq!(
            exec(&handler, "x db \"SISMEMBER tags red\""),
            Some(Reply::Bool(false))
        );
        assert_eq!(
            exec(&handler, "x db \"SREM tags red\""),
            Some(Reply::error("Key not found"))
        );
    }

    #[test]
    fn test_missing_collections_not_created() {
        let handler = create_handler();

        assert_eq!(
            exec(&handler, "x db \"SPOP nope\""),
            Some(Reply::error("Stack doesn't exist"))
        );
        assert_eq!(
            exec(&handler, "x db \"QPOP nope\""),
            Some(Reply::error("Queue doesn't exist"))
        );
        assert_eq!(
            exec(&handler, "x db \"HGET nope k\""),
            Some(Reply::error("Hashtable doesn't exist"))
        );
        assert_eq!(
            exec(&handler, "x db \"HDEL nope k\""),
            Some(Reply::error("Hashtable doesn't exist"))
        );
        assert_eq!(
            exec(&handler, "x db \"SREM nope v\""),
            Some(Reply::error("Set doesn't exist"))
        );
        assert_eq!(
            exec(&handler, "x db \"SISMEMBER nope v\""),
            Some(Reply::error("Set doesn't exist"))
        );

        // The database exists, but reads created nothing inside it.
        let registry = handler.registry().lock();
        assert_eq!(registry.database("db").map(|db| db.collection_count()), Some(0));
    }

    #[test]
    fn test_protocol_errors() {
        let handler = create_handler();

        assert_eq!(
            exec(&handler, "x db \"HSET t k\""),
            Some(Reply::error("ERR wrong number of arguments for 'HSET' command"))
        );
        assert_eq!(
            exec(&handler, "x db \"BOGUS a\""),
            Some(Reply::error("ERR unknown command 'BOGUS'"))
        );
        assert_eq!(
            exec(&handler, "x"),
            Some(Reply::error("ERR missing database name"))
        );

        // A rejected command never touches the registry.
        assert!(handler.registry().lock().is_empty());
    }

    #[test]
    fn test_dump_is_silent() {
        let handler = create_handler();

        exec(&handler, "x db1 \"HSET t k v\"");
        assert_eq!(exec(&handler, "dump db1"), None);
        assert_eq!(exec(&handler, "dump unknown"), None);

        // Dumping an unknown database does not create it.
        assert!(handler.registry().lock().database("unknown").is_none());
    }

    #[test]
    fn test_table_full_replies_on_write() {
        let handler = CommandHandler::with_table_capacity(2);

        assert_eq!(exec(&handler, "x db \"HSET t a 1\""), None);
        assert_eq!(exec(&handler, "x db \"HSET t b 2\""), None);
        assert_eq!(
            exec(&handler, "x db \"HSET t c 3\""),
            Some(Reply::error("Table is full"))
        );
        assert_eq!(exec(&handler, "x db \"HSET t a 10\""), None);
        assert_eq!(exec(&handler, "x db \"HGET t a\""), Some(Reply::value("10")));
    }

    #[test]
    fn test_kinds_share_names() {
        let handler = create_handler();

        exec(&handler, "x db \"HSET shared k v\"");
        exec(&handler, "x db \"SPUSH shared item\"");
        assert_eq!(exec(&handler, "x db \"HGET shared k\""), Some(Reply::value("v")));
        assert_eq!(exec(&handler, "x db \"SPOP shared\""), Some(Reply::value("item")));
    }

    #[test]
    fn test_concurrent_overwrites_serialize() {
        let handler = create_handler();
        let mut handles = vec![];

        for i in 0..8 {
            let handler = handler.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..200 {
                    handler.execute(format!("x db \"HSET t k v{}\"", i).as_bytes());
                    handler.execute(format!("x db \"SPUSH s v{}\"", i).as_bytes());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let final_value = match exec(&handler, "x db \"HGET t k\"") {
            Some(Reply::Value(v)) => v,
            other => panic!("unexpected reply {:?}", other),
        };
        assert!((0..8).any(|i| final_value == format!("v{}", i)));

        // No push was lost.
        let mut registry = handler.registry().lock();
        let db = registry.database_or_create("db");
        assert_eq!(db.stack_mut("s").map(|s| s.len()), Some(8 * 200));
        assert_eq!(db.hash_table_mut("t").map(|t| t.len()), Some(1));
    }
}
