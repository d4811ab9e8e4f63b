use crate::model::ScanResult;
use anyhow::Result;

pub fn print_json(result: &ScanResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{}", json);
    Ok(())
}

/// Prints `{"error": "<code>"}` for failures in JSON mode.
pub fn print_error_json(code: &str) -> Result<()> {
    println!("{}", serde_json::json!({ "error": code }));
    Ok(())
}
