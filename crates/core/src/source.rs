//! Upstream stylesheet download.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::{
    Error, Result,
    config::{FETCH_TIMEOUT, GOOGLE_FONTS_CSS_URL, USER_AGENT},
    options::{FontDisplay, FontWeight, Locale, PipelineOptions},
};

/// What to fetch: one Noto Sans locale at one weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StylesheetRequest {
    pub locale: Locale,
    pub weight: FontWeight,
    pub display: FontDisplay,
}

impl StylesheetRequest {
    /// `{base}?family=Noto+Sans+SC:wght@400&display=swap`
    pub fn url(&self, base: &str) -> String {
        format!(
            "{base}?family={}:wght@{}&display={}",
            self.locale.noto_family().replace(' ', "+"),
            self.weight.value(),
            self.display
        )
    }

    /// Stable identifier, also used as the on-disk cache file stem.
    pub fn cache_key(&self) -> String {
        format!("{}-{}-{}", self.locale, self.weight.value(), self.display)
    }
}

impl From<&PipelineOptions> for StylesheetRequest {
    fn from(options: &PipelineOptions) -> Self {
        Self { locale: options.locale(), weight: options.font_weight(), display: options.font_display() }
    }
}

/// Provides the upstream `@font-face` stylesheet.
pub trait StylesheetSource: Send + Sync {
    fn fetch(&self, request: &StylesheetRequest) -> Result<String>;
}

impl<T: StylesheetSource + ?Sized> StylesheetSource for &T {
    fn fetch(&self, request: &StylesheetRequest) -> Result<String> {
        (**self).fetch(request)
    }
}

impl<T: StylesheetSource + ?Sized> StylesheetSource for Box<T> {
    fn fetch(&self, request: &StylesheetRequest) -> Result<String> {
        (**self).fetch(request)
    }
}

/// The Google Fonts CSS API, queried with a desktop browser user agent.
#[derive(Debug, Clone)]
pub struct GoogleFonts {
    client: Client,
    base_url: String,
}

impl GoogleFonts {
    pub fn new() -> Result<Self> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| Error::Fetch { url: GOOGLE_FONTS_CSS_URL.to_string(), message: err.to_string() })?;
        Ok(Self { client, base_url: GOOGLE_FONTS_CSS_URL.to_string() })
    }

    /// Query a different endpoint with the same parameters.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl StylesheetSource for GoogleFonts {
    fn fetch(&self, request: &StylesheetRequest) -> Result<String> {
        let url = request.url(&self.base_url);
        log::info!("Fetching {url}");

        let fetch_error = |message: String| Error::Fetch { url: url.clone(), message };
        let response = self.client.get(&url).send().map_err(|err| fetch_error(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {status}")));
        }

        let css = response.text().map_err(|err| fetch_error(err.to_string()))?;
        log::debug!("Fetched {} bytes of CSS", css.len());
        Ok(css)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url() {
        let request = StylesheetRequest::default();
        assert_eq!(
            request.url(GOOGLE_FONTS_CSS_URL),
            "https://fonts.googleapis.com/css2?family=Noto+Sans+SC:wght@400&display=swap"
        );

        let request = StylesheetRequest { locale: Locale::Jp, weight: FontWeight::Bold, display: FontDisplay::Optional };
        assert_eq!(request.url("http://localhost/css2"), "http://localhost/css2?family=Noto+Sans+JP:wght@700&display=optional");
    }

    #[test]
    fn test_cache_key() {
        let request = StylesheetRequest { locale: Locale::Kr, weight: FontWeight::Thin, display: FontDisplay::Block };
        assert_eq!(request.cache_key(), "kr-100-block");
    }

    #[test]
    fn test_unreachable_host_is_fetch_error() {
        let source = GoogleFonts::with_timeout(Duration::from_secs(2))
            .unwrap()
            .with_base_url("http://127.0.0.1:9/css2");
        let err = source.fetch(&StylesheetRequest::default()).unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }), "{err:?}");
    }
}
