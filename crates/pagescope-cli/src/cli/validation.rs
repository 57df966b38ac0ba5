//! Value parsers for command-line arguments.

use url::Url;

/// URL schemes a page can be observed at.
pub const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "file", "data", "about"];

/// Parse and validate a page URL.
///
/// # Examples
///
/// Valid: `https://example.com`, `file:///tmp/index.html`, `about:blank`
/// Invalid: `example.com` (no scheme), `ftp://host/` (unsupported scheme)
///
/// # Errors
///
/// Returns an error message if the URL does not parse or uses an
/// unsupported scheme.
pub fn parse_url(s: &str) -> Result<String, String> {
    let url = Url::parse(s).map_err(|e| format!("'{s}' is not a valid URL: {e}"))?;

    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(format!(
            "unsupported URL scheme '{}' (expected one of: {})",
            url.scheme(),
            SUPPORTED_SCHEMES.join(", ")
        ));
    }

    Ok(s.to_string())
}

/// Parse a strictly positive millisecond count.
///
/// # Errors
///
/// Returns an error message for zero, negative or non-numeric input.
pub fn parse_positive_ms(s: &str) -> Result<u64, String> {
    match s.trim().parse::<u64>() {
        Ok(0) => Err("must be at least 1 ms".to_string()),
        Ok(ms) => Ok(ms),
        Err(_) => Err(format!("'{s}' is not a number of milliseconds")),
    }
}

/// Parse a `WIDTHxHEIGHT` window size.
///
/// # Errors
///
/// Returns an error message if either dimension is missing, zero or not a
/// number.
pub fn parse_window_size(s: &str) -> Result<(u32, u32), String> {
    let (width, height) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("'{s}' is not WIDTHxHEIGHT"))?;

    let parse = |part: &str| match part.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(format!("'{s}' is not WIDTHxHEIGHT with positive numbers")),
        Ok(n) => Ok(n),
    };

    Ok((parse(width)?, parse(height)?))
}
