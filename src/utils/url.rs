// src/utils/url.rs

//! URL normalization utilities.

use url::Url;

use crate::error::{AppError, Result};

/// Normalize a URL into its `scheme://host` form.
///
/// The scheme defaults to `https` when the input carries none. Fails when
/// no host can be extracted.
///
/// # Examples
/// ```
/// use feedring::utils::url::normalize_domain;
///
/// assert_eq!(
///     normalize_domain("http://example.com/feed.xml").unwrap(),
///     "http://example.com"
/// );
/// assert_eq!(
///     normalize_domain("example.com").unwrap(),
///     "https://example.com"
/// );
/// ```
pub fn normalize_domain(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::Url(url::ParseError::EmptyHost));
    }

    let parsed = match Url::parse(trimmed) {
        Ok(u) => u,
        // Scheme-less input parses as a relative URL; default to https.
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{trimmed}"))?
        }
        Err(e) => return Err(AppError::Url(e)),
    };

    let host = parsed
        .host_str()
        .ok_or(AppError::Url(url::ParseError::EmptyHost))?;

    Ok(format!("{}://{}", parsed.scheme(), host))
}
