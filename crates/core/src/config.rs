//! Configuration constants for subset generation.

use std::time::Duration;

/// Google Fonts CSS API v2 endpoint.
pub const GOOGLE_FONTS_CSS_URL: &str = "https://fonts.googleapis.com/css2";

/// Desktop Firefox user agent. Google Fonts serves woff2 sources split by
/// `unicode-range` only to browsers it recognises.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:95.0) Gecko/20100101 Firefox/95.0";

/// Timeout for the stylesheet request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Family prefix of the upstream Noto fonts; the locale suffix is appended.
pub const NOTO_SANS_FAMILY: &str = "Noto Sans";

/// Stylesheet output subdirectory.
pub const CSS_DIR: &str = "css";

/// Font output subdirectory.
pub const WEBFONTS_DIR: &str = "webfonts";

/// URL prefix of rewritten `src` entries, relative to the CSS file.
pub const DEFAULT_SRC_PREFIX: &str = "../webfonts";

/// How long a fetched stylesheet is reused.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Maximum stylesheets kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;
