use anyhow::{anyhow, Result};

pub fn validate_base_url(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{} is empty", name));
    }
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(anyhow!("{} must start with http:// or https://", name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_base_url("url", "https://api.scryfall.com").is_ok());
        assert!(validate_base_url("url", "http://127.0.0.1:9000").is_ok());
        assert!(validate_base_url("url", "").is_err());
        assert!(validate_base_url("url", "api.scryfall.com").is_err());
    }
}
