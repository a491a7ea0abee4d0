//! Boilerplate stripping for scraped faculty pages.
//!
//! Every page carries the same header image and login footer; both markers
//! are removed before the text enters the pipeline. Each strip is a no-op
//! when its marker is absent, so applying them twice changes nothing.

const HEADNOTE_MARKER: &str = "![](https://ww2.mini.pw.edu.pl/wp-content/uploads/WMiNI-01.png)";
const FOOTNOTE_MARKER: &str = "#### Zaloguj się";

/// Drops everything up to and including the header-image marker.
pub fn clean_headnote(text: &str) -> &str {
    match text.find(HEADNOTE_MARKER) {
        Some(idx) => &text[idx + HEADNOTE_MARKER.len()..],
        None => text,
    }
}

/// Drops everything from the login-footer marker onward.
pub fn clean_footnote(text: &str) -> &str {
    match text.find(FOOTNOTE_MARKER) {
        Some(idx) => &text[..idx],
        None => text,
    }
}
