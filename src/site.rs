// 🌐 Landing page catalog + "download for local use" site bundler
//
// The bundler fetches each site file relative to the page's own folder and
// zips whatever arrived. One missing file is fine; all missing is an error.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteLink {
    pub name: &'static str,
    pub file: &'static str,
}

/// Tools listed on the landing page
pub const SITES: [SiteLink; 2] = [
    SiteLink {
        name: "Add Contacts（聯絡人）",
        file: "number.html",
    },
    SiteLink {
        name: "院友零用金 結欠/結餘 WhatsApp 追數",
        file: "ws_money.html",
    },
];

/// Files that make up the static site, in archive order
pub const SITE_FILES: [&str; 9] = [
    "index.html",
    "styles.css",
    "app.js",
    "number.html",
    "number-styles.css",
    "number-app.js",
    "ws_money.html",
    "money-styles.css",
    "money-app.js",
];

pub const BUNDLE_FILE_NAME: &str = "TomTech-網站.zip";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("request failed: {0}")]
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("無法在直接開啟的檔案頁面下載。請用本機或網路伺服器（例如 http://localhost）開啟本網站後，再按「下載為本地使用」。")]
    FileOrigin,
    #[error("無法取得網站檔案，壓縮檔為空。請確認是透過 http 或 https 網址開啟本頁面（例如用本機伺服器），再試一次。")]
    AllFetchesFailed,
    #[error("not a page URL (expected http:// or https://): {0}")]
    InvalidUrl(String),
    #[error("could not build zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("could not write archive: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// FETCHERS
// ============================================================================

/// Source of site files by relative name
pub trait SiteFetcher {
    fn fetch(&self, file: &str) -> Result<String, FetchError>;
}

/// Reads files from a local folder (a checked-out copy of the site)
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SiteFetcher for DirFetcher {
    fn fetch(&self, file: &str) -> Result<String, FetchError> {
        Ok(std::fs::read_to_string(self.root.join(file))?)
    }
}

/// Fetches files over HTTP(S) relative to a base URL
#[cfg(feature = "fetch")]
pub struct HttpFetcher {
    base: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "fetch")]
impl HttpFetcher {
    /// `page_url` is the address the site is served from; `file:` is refused
    pub fn new(page_url: &str) -> Result<Self, BundleError> {
        Ok(Self {
            base: base_url(page_url)?,
            client: reqwest::blocking::Client::new(),
        })
    }
}

#[cfg(feature = "fetch")]
impl SiteFetcher for HttpFetcher {
    fn fetch(&self, file: &str) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base, file);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        response
            .text()
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

/// Folder URL of a page: everything up to and including the last `/` of
/// the path, ignoring query and fragment. `file:` pages cannot be bundled
/// and a URL without `scheme://host` is refused.
pub fn base_url(page_url: &str) -> Result<String, BundleError> {
    let page_url = page_url.trim();
    if page_url.to_ascii_lowercase().starts_with("file:") {
        return Err(BundleError::FileOrigin);
    }
    let without_suffix = page_url
        .split(['?', '#'])
        .next()
        .unwrap_or(page_url);

    let Some(host_start) = without_suffix.find("://").map(|i| i + 3) else {
        return Err(BundleError::InvalidUrl(page_url.to_string()));
    };
    if host_start == 3 || host_start == without_suffix.len() {
        return Err(BundleError::InvalidUrl(page_url.to_string()));
    }

    // Keep "scheme://host" intact even when there is no path
    let path_start = without_suffix[host_start..]
        .find('/')
        .map(|p| host_start + p);

    match path_start {
        Some(start) => {
            let last_slash = without_suffix[start..]
                .rfind('/')
                .map_or(start, |p| start + p);
            Ok(format!("{}/", &without_suffix[..last_slash]))
        }
        None => Ok(format!("{}/", without_suffix.trim_end_matches('/'))),
    }
}

// ============================================================================
// BUNDLER
// ============================================================================

#[derive(Debug)]
pub struct SiteBundle {
    pub bytes: Vec<u8>,
    pub added: Vec<String>,
    pub failed: Vec<String>,
}

impl SiteBundle {
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, BundleError> {
        let path = dir.join(BUNDLE_FILE_NAME);
        std::fs::write(&path, &self.bytes)?;
        tracing::info!(path = %path.display(), files = self.added.len(), "site bundle written");
        Ok(path)
    }
}

/// Fetch every file in `files` and zip the ones that arrived
pub fn bundle_site(fetcher: &dyn SiteFetcher, files: &[&str]) -> Result<SiteBundle, BundleError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let mut added = Vec::new();
    let mut failed = Vec::new();

    for file in files {
        match fetcher.fetch(file) {
            Ok(text) => {
                writer.start_file(*file, options)?;
                writer.write_all(text.as_bytes())?;
                added.push(file.to_string());
            }
            Err(e) => {
                tracing::warn!(file, error = %e, "site file skipped");
                failed.push(file.to_string());
            }
        }
    }

    if added.is_empty() {
        return Err(BundleError::AllFetchesFailed);
    }

    let bytes = writer.finish()?.into_inner();
    tracing::info!(added = added.len(), failed = failed.len(), "site bundle built");
    Ok(SiteBundle { bytes, added, failed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Read;

    struct MapFetcher(HashMap<&'static str, &'static str>);

    impl SiteFetcher for MapFetcher {
        fn fetch(&self, file: &str) -> Result<String, FetchError> {
            self.0
                .get(file)
                .map(|s| s.to_string())
                .ok_or(FetchError::Status(404))
        }
    }

    #[test]
    fn test_base_url() {
        assert_eq!(
            base_url("https://example.org/tools/index.html").unwrap(),
            "https://example.org/tools/"
        );
        assert_eq!(
            base_url("http://localhost:8080/index.html?x=1#top").unwrap(),
            "http://localhost:8080/"
        );
        assert_eq!(base_url("http://localhost:8080").unwrap(), "http://localhost:8080/");
        assert_eq!(base_url("http://localhost/a/b/").unwrap(), "http://localhost/a/b/");
    }

    #[test]
    fn test_url_without_scheme_refused() {
        assert!(matches!(
            base_url("localhost/index.html"),
            Err(BundleError::InvalidUrl(_))
        ));
        assert!(matches!(base_url("http://"), Err(BundleError::InvalidUrl(_))));
        assert!(matches!(base_url("://host/a"), Err(BundleError::InvalidUrl(_))));
    }

    #[test]
    fn test_file_origin_refused() {
        assert!(matches!(
            base_url("file:///Users/me/site/index.html"),
            Err(BundleError::FileOrigin)
        ));
    }

    #[test]
    fn test_partial_fetch_builds_archive() {
        let fetcher = MapFetcher(HashMap::from([
            ("index.html", "<html>首頁</html>"),
            ("app.js", "console.log(1)"),
        ]));

        let bundle = bundle_site(&fetcher, &SITE_FILES).unwrap();
        assert_eq!(bundle.added, vec!["index.html", "app.js"]);
        assert_eq!(bundle.failed.len(), 7);

        let mut archive = zip::ZipArchive::new(Cursor::new(bundle.bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut text = String::new();
        archive
            .by_name("index.html")
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "<html>首頁</html>");
    }

    #[test]
    fn test_all_fetches_failed() {
        let fetcher = MapFetcher(HashMap::new());
        assert!(matches!(
            bundle_site(&fetcher, &SITE_FILES),
            Err(BundleError::AllFetchesFailed)
        ));
    }

    #[test]
    fn test_dir_fetcher_and_write() {
        let site = tempfile::tempdir().unwrap();
        std::fs::write(site.path().join("index.html"), "hi").unwrap();
        let fetcher = DirFetcher::new(site.path());

        let bundle = bundle_site(&fetcher, &SITE_FILES).unwrap();
        assert_eq!(bundle.added, vec!["index.html"]);

        let out = tempfile::tempdir().unwrap();
        let path = bundle.write_to(out.path()).unwrap();
        assert!(path.ends_with(BUNDLE_FILE_NAME));
        assert!(std::fs::metadata(path).unwrap().len() > 0);
    }

    #[test]
    fn test_catalog_points_at_bundled_pages() {
        for site in SITES {
            assert!(SITE_FILES.contains(&site.file));
        }
    }
}
