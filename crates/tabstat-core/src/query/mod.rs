//! Expression dispatcher
//!
//! `execute(table, expression)` parses the expression into a [`Command`],
//! checks that every referenced column exists, evaluates the command and
//! shapes the outcome into a [`ResultSet`]. Calls share no state, so any
//! number of them may run in parallel against the same table.

pub mod command;
mod ops;
mod parser;
mod result;

pub use command::Command;
pub use result::ResultSet;

use crate::errors::{QueryError, QueryResult};
use crate::table::Table;
use crate::types::{EngineOptions, UnmatchedPolicy};
use log::debug;
use std::time::Instant;

/// Evaluate `expression` against `table` with default options
pub fn execute(table: &Table, expression: &str) -> QueryResult<ResultSet> {
    execute_with_options(table, expression, &EngineOptions::default())
}

/// Evaluate `expression` against `table`
pub fn execute_with_options(
    table: &Table,
    expression: &str,
    options: &EngineOptions,
) -> QueryResult<ResultSet> {
    let start = Instant::now();
    debug!("executing '{}' against {} rows", expression, table.row_count());

    // a missing column outranks an out-of-range operand
    let parsed = parser::parse(expression, options).or_else(|rejected| {
        table.require_columns(&rejected.columns)?;
        Err(rejected.error)
    })?;

    let frame = match parsed {
        Some(command) => {
            log::trace!("parsed '{}' as {:?}", expression, command);
            table.require_columns(&command.referenced_columns())?;
            ops::evaluate(table, &command, options)
        }
        None => match options.unmatched {
            UnmatchedPolicy::ReturnTable => {
                debug!("'{}' matched no shape, returning the table", expression);
                ops::whole_table(table)
            }
            UnmatchedPolicy::Reject => {
                return Err(QueryError::UnsupportedOperation(format!(
                    "'{}' matches no supported expression",
                    expression.trim()
                )))
            }
        },
    };

    let result = frame.finish(start.elapsed().as_secs_f64() * 1000.0);
    debug!(
        "'{}' produced {} rows in {:.3} ms",
        expression, result.row_count, result.execution_time_ms
    );
    Ok(result)
}

/// Parse an expression without evaluating it.
///
/// `Ok(None)` means the expression matches no supported shape.
pub fn parse(expression: &str, options: &EngineOptions) -> QueryResult<Option<Command>> {
    parser::parse(expression, options).map_err(|rejected| rejected.error)
}
