use std::str::FromStr;

use reqwest::header::{HeaderName, HeaderValue};

/// Parses a `Key: Value` header line.
pub fn parse_header(value: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (key, val) = value
        .split_once(':')
        .ok_or_else(|| "expected format 'Key: Value'".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("header name is empty".to_string());
    }
    let name = HeaderName::from_str(key).map_err(|_| format!("invalid header name '{key}'"))?;
    let value = HeaderValue::from_str(val.trim())
        .map_err(|_| format!("invalid header value for '{key}'"))?;
    Ok((name, value))
}

/// Parses a base URL, requiring an http(s) scheme.
pub fn parse_base_url(value: &str) -> Result<reqwest::Url, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("base URL is empty".to_string());
    }
    let url = reqwest::Url::parse(trimmed).map_err(|e| format!("{e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

pub fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_header_splits_on_first_colon() {
        let (name, value) = parse_header("Cookie: session=a:b").unwrap();
        assert_eq!(name.as_str(), "cookie");
        assert_eq!(value.to_str().unwrap(), "session=a:b");
    }

    #[test]
    fn parse_header_rejects_missing_name() {
        assert!(parse_header(": value").is_err());
        assert!(parse_header("value").is_err());
    }

    #[test]
    fn parse_base_url_requires_http() {
        assert!(parse_base_url("https://gallery.example.com/").is_ok());
        assert!(parse_base_url("ftp://gallery.example.com/").is_err());
        assert!(parse_base_url("  ").is_err());
        assert!(parse_base_url("not a url").is_err());
    }
}
