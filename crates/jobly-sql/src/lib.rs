//! # jobly-sql
//!
//! Parameterized SQL fragment compilers for the jobly PostgreSQL schema.
//!
//! ## Features
//!
//! - **Partial updates**: a sparse JSON object becomes `"col"=$1, "col2"=$2`,
//!   with logical field names renamed to physical columns
//! - **Filters**: a client filter object becomes `WHERE ... AND ...`, driven by
//!   a static per-entity [`FilterSpec`]
//! - **Placeholders numbered at render time**: `$1..$n` always matches the
//!   parameter list, whatever was skipped
//! - **Values are never inlined**: identifiers are validated or quoted, values
//!   are always bound
//! - **Transaction-friendly**: pass a transaction anywhere a [`GenericClient`]
//!   is expected
//!
//! ```ignore
//! use jobly_sql::{Query, compile_filter, compile_partial_update};
//! use jobly_sql::entities::{COMPANY_FILTERS, COMPANY_RENAMES, COMPANY_COLUMNS};
//!
//! // UPDATE
//! let set = compile_partial_update(&fields, &COMPANY_RENAMES)?;
//!
//! // SELECT with optional filters
//! let rows = Query::new(format!("SELECT {COMPANY_COLUMNS} FROM companies"))
//!     .with_fragment(compile_filter(&raw, &COMPANY_FILTERS)?)?
//!     .push(" ORDER BY name")
//!     .fetch_all(&client)
//!     .await?;
//! ```
//!
//! Compilation emits `tracing` debug events under the `jobly_sql::sql` target.

pub mod client;
pub mod config;
pub mod entities;
pub mod error;
pub mod filter;
pub mod fragment;
pub mod ident;
pub mod query;
pub mod update;
pub mod value;

pub use client::GenericClient;
pub use config::CompileConfig;
pub use entities::{CompanyFilter, EntityFilter, JobFilter};
pub use error::{SqlError, SqlResult};
pub use filter::{
    CrossFieldRule, FilterInput, FilterKey, FilterOp, FilterSpec, RuleCheck, compile_filter,
    compile_filter_with, contains, escape_like,
};
pub use fragment::{Fragment, FragmentBuilder, placeholder_indices};
pub use ident::Ident;
pub use query::Query;
pub use update::{
    RenameTable, UpdateStatement, compile_assignments, compile_partial_update,
    compile_partial_update_with,
};
pub use value::SqlValue;
