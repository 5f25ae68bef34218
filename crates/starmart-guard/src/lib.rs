//! Gatekeeping for user-supplied SQL.
//!
//! The guard classifies an arbitrary input string as a safe, bounded,
//! read-only analytical query or rejects it with a specific reason,
//! before the text ever reaches the execution engine. It is a
//! single-pass *lexical* filter, not a parser: it checks the leading
//! keyword, statement separators and comment introducers, a banned
//! keyword list, and the tables referenced after `FROM`/`JOIN` against
//! the schema registry, then enforces a row-limiting clause.
//!
//! Because no expression tree is built, queries that are well-formed SQL
//! but smuggle forbidden behaviour through obscure syntax (for example a
//! common table expression aliasing an unlisted table) can slip past the
//! table check. That is a known, accepted limitation of the lexical
//! approach; the database role the executor connects with is the real
//! backstop.

pub mod reason;
pub mod validator;
pub mod verdict;

pub use reason::RejectReason;
pub use validator::QueryGuard;
pub use verdict::Verdict;
