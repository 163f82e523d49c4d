use std::path::Path;

use codelib_core::api::{CliError, UploadFile};

/// Parses one `NAME=VALUE` pair. The value is kept verbatim, `=` included.
pub fn parse_param(raw: &str) -> Result<(String, String), CliError> {
    let (k, v) = raw
        .split_once('=')
        .ok_or_else(|| CliError::Command(format!("invalid --param {raw:?} (expected NAME=VALUE)")))?;
    let key = k.trim();
    if key.is_empty() {
        return Err(CliError::Command(format!(
            "invalid --param {raw:?} (empty name)"
        )));
    }
    Ok((key.to_string(), v.to_string()))
}

pub fn parse_params(raw: &[String]) -> Result<Vec<(String, String)>, CliError> {
    raw.iter().map(|p| parse_param(p)).collect()
}

pub fn load_upload(path: &str) -> Result<UploadFile, CliError> {
    let contents = std::fs::read(path)?;
    let file_name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    Ok(UploadFile {
        file_name,
        contents,
    })
}
