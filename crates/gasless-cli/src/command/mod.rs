use serde::Serialize;

use crate::core::Error;

pub mod address;
pub mod balance;
pub mod quote;
pub mod receipt;
pub mod transfer;

/// Prints `value` as JSON on the standard output
pub fn print<T: Serialize>(value: &T) -> Result<(), Error> {
    let output = serde_json::to_string_pretty(value).map_err(|e| Error::Execution(e.to_string()))?;
    println!("{}", output);

    Ok(())
}
