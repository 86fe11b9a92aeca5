use ballot::{ChoiceId, VoterId};

use crate::cli_types::OutputFormat;

fn parse_id(kind: &str, s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(format!("{} id must not be empty", kind));
    }
    if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(format!("invalid {} id: {:?}", kind, s));
    }
    Ok(s.to_string())
}

pub fn parse_voter_id(s: &str) -> Result<VoterId, String> {
    parse_id("voter", s).map(VoterId::from)
}

pub fn parse_choice_id(s: &str) -> Result<ChoiceId, String> {
    parse_id("choice", s).map(ChoiceId::from)
}

/// Accepts `http://` and `https://` URLs; a trailing slash is dropped.
pub fn parse_base_url(s: &str) -> Result<String, String> {
    let url = reqwest::Url::parse(s).map_err(|e| format!("invalid url: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(s.trim_end_matches('/').to_string()),
        other => Err(format!("unsupported scheme: {}", other)),
    }
}

pub fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_lowercase().as_str() {
        "json" => Ok(OutputFormat::Json),
        "text" => Ok(OutputFormat::Text),
        _ => Err(format!("invalid output format: {}", s)),
    }
}
