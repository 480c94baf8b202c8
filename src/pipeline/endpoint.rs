//! Request URL assembly

use crate::error::{Error, Result};
use crate::query::{Parameter, encode_query};
use url::Url;

/// Join `base_url` and the encoded parameters into a request URL
///
/// The encoded query is appended verbatim. When `base_url` already carries a
/// query, the new pairs are joined to it with `&`.
///
/// # Errors
/// - [`Error::InvalidUrl`] if `base_url` is blank or the result does not parse
/// - [`Error::Encoding`] if a parameter cannot be encoded
///
/// # Examples
///
/// ```
/// use query_fetch::pipeline::build_url;
/// use query_fetch::Parameter;
///
/// let url = build_url(
///     "https://api.flickr.com/services/rest/",
///     &[Parameter::new("format", "json"), Parameter::new("q", "hello world")],
/// ).unwrap();
/// assert_eq!(url.as_str(), "https://api.flickr.com/services/rest/?format=json&q=hello%20world");
/// ```
pub fn build_url(base_url: &str, parameters: &[Parameter]) -> Result<Url> {
    let base = base_url.trim();
    if base.is_empty() {
        return Err(Error::InvalidUrl {
            url: base_url.to_string(),
            reason: "base URL is empty".to_string(),
        });
    }

    let query = encode_query(parameters)?;
    let full = match query.strip_prefix('?') {
        None => base.to_string(),
        Some(pairs) if base.contains('?') => {
            let separator = if base.ends_with('?') || base.ends_with('&') {
                ""
            } else {
                "&"
            };
            format!("{base}{separator}{pairs}")
        }
        Some(_) => format!("{base}{query}"),
    };

    Url::parse(&full).map_err(|e| Error::InvalidUrl {
        url: full,
        reason: e.to_string(),
    })
}
