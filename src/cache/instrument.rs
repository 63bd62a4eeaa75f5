//! Call counting and call history middleware
//!
//! Both steps are plain async functions that a caller composes around the
//! operation it wants to instrument. Keys follow the layout other clients
//! expect: `<name>` for the counter, `<name>:inputs` and `<name>:outputs`
//! for the history lists.

use std::fmt::Display;
use std::future::Future;

use tracing::debug;

use crate::error::Result;
use crate::store::{Store, SupportsHistory};

/// Operations whose calls are counted and recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `Cache::store`
    Store,
}

impl Operation {
    /// Stable name used as the counter key and history key prefix
    pub fn qualified_name(self) -> &'static str {
        match self {
            Operation::Store => "Cache.store",
        }
    }

    pub fn inputs_key(self) -> String {
        inputs_key(self.qualified_name())
    }

    pub fn outputs_key(self) -> String {
        outputs_key(self.qualified_name())
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.qualified_name())
    }
}

pub fn inputs_key(name: &str) -> String {
    format!("{}:inputs", name)
}

pub fn outputs_key(name: &str) -> String {
    format!("{}:outputs", name)
}

/// Bumps the call counter for `name` and returns the new count
///
/// Uses the store's atomic increment, so an absent counter starts at zero
/// and concurrent callers never lose an update.
pub async fn count_calls(store: &dyn Store, name: &str) -> Result<i64> {
    let count = store.incr(name, 1).await?;
    debug!(operation = name, count, "Counted call");
    Ok(count)
}

/// Runs `call` while recording its input and output under `name`
///
/// The argument text is appended before `call` runs and the result after it
/// returns. When `log` is `None` the call runs unrecorded. A failing call
/// leaves its input recorded without a matching output.
pub async fn with_history<T, F, Fut>(
    log: Option<&dyn SupportsHistory>,
    name: &str,
    args: String,
    call: F,
) -> Result<T>
where
    T: Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let Some(log) = log else {
        return call().await;
    };

    log.rpush(&inputs_key(name), args.as_bytes()).await?;
    let output = call().await?;
    log.rpush(&outputs_key(name), output.to_string().as_bytes()).await?;
    Ok(output)
}
