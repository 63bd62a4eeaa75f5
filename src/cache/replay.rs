//! Read back an operation's counter and call history
//!
//! ```text
//! Cache.store was called 2 times:
//! Cache.store(*('foo',)) -> b'0b3a8c9e-...'
//! Cache.store(*(42,)) -> b'6f1d2e04-...'
//! ```

use std::fmt;
use std::io::Write;

use serde::Serialize;

use super::facade::Cache;
use super::instrument::Operation;
use crate::error::Result;
use crate::store::quote_bytes;

/// An operation tied to the cache whose history it reads
#[derive(Clone, Copy)]
pub struct BoundOperation<'a> {
    cache: &'a Cache,
    op: Operation,
}

impl<'a> BoundOperation<'a> {
    pub(crate) fn new(cache: &'a Cache, op: Operation) -> Self {
        Self { cache, op }
    }

    pub fn operation(&self) -> Operation {
        self.op
    }
}

/// One recorded call: the argument tuple and the returned value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedCall {
    pub input: String,
    pub output: String,
}

/// Counter and paired history of an operation
///
/// `Display` shows each output as the raw reply bytes (`b'...'`); the
/// serialized form keeps the decoded text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallLog {
    pub name: String,
    pub count: i64,
    pub calls: Vec<RecordedCall>,
}

impl fmt::Display for CallLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} was called {} times:", self.name, self.count)?;
        for call in &self.calls {
            writeln!(
                f,
                "{}(*{}) -> {}",
                self.name,
                call.input,
                quote_bytes(call.output.as_bytes())
            )?;
        }
        Ok(())
    }
}

/// Collects the counter and history of `op`
///
/// Returns `None` when the cache does not record history. Inputs and
/// outputs are paired in call order; an unpaired trailing input is dropped.
pub async fn call_log(op: &BoundOperation<'_>) -> Result<Option<CallLog>> {
    let Some(log) = op.cache.history_log() else {
        return Ok(None);
    };

    let inputs_key = op.op.inputs_key();
    let outputs_key = op.op.outputs_key();
    let (count, inputs, outputs) = futures::try_join!(
        op.cache.call_count(op.op),
        log.lrange_all(&inputs_key),
        log.lrange_all(&outputs_key),
    )?;

    let calls = inputs
        .into_iter()
        .zip(outputs)
        .map(|(input, output)| RecordedCall {
            input: String::from_utf8_lossy(&input).into_owned(),
            output: String::from_utf8_lossy(&output).into_owned(),
        })
        .collect();

    Ok(Some(CallLog {
        name: op.op.qualified_name().to_string(),
        count,
        calls,
    }))
}

/// Writes the call count and every recorded call of `op` to `out`
///
/// Writes nothing when the cache does not record history.
pub async fn replay<W: Write>(op: &BoundOperation<'_>, out: &mut W) -> Result<()> {
    if let Some(log) = call_log(op).await? {
        write!(out, "{}", log)?;
        out.flush()?;
    }
    Ok(())
}
