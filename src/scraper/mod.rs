//! Collector stage: fetches faculty pages and writes cleaned page files.
//!
//! Versions 1-2 fetch a curated URL list one page at a time; versions 3+
//! crawl the whole site. A failed fetch skips that URL and never aborts
//! the batch.

pub mod clean;
pub mod firecrawl;

use std::path::PathBuf;
use std::time::Duration;

use crate::core::config::PipelineConfig;
use crate::core::paths::AppPaths;

pub use clean::{clean_footnote, clean_headnote};
pub use firecrawl::{CrawledPage, FirecrawlClient, ScrapeData};

const INTER_REQUEST_DELAY: Duration = Duration::from_secs(1);
const CRAWL_PAGE_LIMIT: usize = 1000;

/// Curated starting set covering the pages students actually ask about.
pub const CURATED_URLS: &[&str] = &[
    "https://ww2.mini.pw.edu.pl/studia/dziekanat/informacje-dziekanatu/",
    "https://ww2.mini.pw.edu.pl/wydzial/dziekani/",
    "https://ww2.mini.pw.edu.pl/wydzial/o-nas/",
    "https://ww2.mini.pw.edu.pl/laboratorium/laboratoria/",
    "https://ww2.mini.pw.edu.pl/studia/inzynierskie-i-licencjackie/matematyka-i-analiza-danych/",
    "https://ww2.mini.pw.edu.pl/studia/inzynierskie-i-licencjackie/matematyka-2/",
    "https://ww2.mini.pw.edu.pl/studia/inzynierskie-i-licencjackie/informatyka-2/",
    "https://ww2.mini.pw.edu.pl/studia/inzynierskie-i-licencjackie/computer-science-2/",
    "https://ww2.mini.pw.edu.pl/studia/inzynierskie-i-licencjackie/inzynieria-i-analiza-danych/",
    "https://ww2.mini.pw.edu.pl/studia/magisterskie/matematyka-i-analiza-danych/",
    "https://ww2.mini.pw.edu.pl/studia/magisterskie/matematyka/",
    "https://ww2.mini.pw.edu.pl/studia/magisterskie/informatyka/",
    "https://ww2.mini.pw.edu.pl/studia/magisterskie/inzynieria-i-analiza-danych/",
    "https://ww2.mini.pw.edu.pl/wp-content/uploads/uchwala_rady_21_02_2019.pdf",
    "https://ww2.mini.pw.edu.pl/wydzial/uchwaly-rw/",
];

const CRAWL_ROOT: &str = "https://ww2.mini.pw.edu.pl/";
const REPO_CRAWL_ROOT: &str = "https://repo.pw.edu.pl/index.seam?lang=pl";

/// A scraped webpage after boilerplate cleaning.
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    pub url: String,
    pub text: String,
    pub links: Vec<String>,
}

/// Collect pages according to the pipeline version.
pub async fn collect_pages(client: &FirecrawlClient, config: &PipelineConfig) -> Vec<ScrapedPage> {
    let mut output = Vec::new();

    if config.version <= 2 {
        tracing::info!(
            "V{}: scraping curated list of {} URLs",
            config.version,
            CURATED_URLS.len()
        );

        for url in CURATED_URLS {
            match client.scrape(url).await {
                Ok(data) => {
                    let text = clean_footnote(clean_headnote(&data.markdown)).to_string();
                    output.push(ScrapedPage {
                        url: url.to_string(),
                        text,
                        links: data.links,
                    });
                }
                Err(e) => {
                    tracing::warn!("Couldn't get content from {}. Error: {}", url, e);
                }
            }
            tokio::time::sleep(INTER_REQUEST_DELAY).await;
        }
    } else {
        let mut roots = vec![CRAWL_ROOT];
        if config.version == 4 {
            roots.push(REPO_CRAWL_ROOT);
        }
        tracing::info!("V{}: starting crawl for roots: {:?}", config.version, roots);

        for root in roots {
            match client.crawl(root, CRAWL_PAGE_LIMIT).await {
                Ok(pages) => {
                    for page in pages {
                        let text = clean_footnote(clean_headnote(&page.markdown)).to_string();
                        output.push(ScrapedPage {
                            url: page.url,
                            text,
                            links: Vec::new(),
                        });
                    }
                }
                Err(e) => {
                    tracing::error!("Crawl failed for {}: {}", root, e);
                }
            }
        }
    }

    output
}

/// Filename for a page file: scheme stripped, slashes flattened.
pub fn page_filename(url: &str) -> String {
    let safe_name = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .replace('/', "_");
    format!("{}.txt", safe_name.trim_matches('_'))
}

/// Write one text file per page: `URL: <url>`, a blank line, then the body.
pub fn save_pages(paths: &AppPaths, pages: &[ScrapedPage]) -> std::io::Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(pages.len());

    for page in pages {
        let file_path = paths.scraped_raw_dir.join(page_filename(&page.url));
        std::fs::write(&file_path, format!("URL: {}\n\n{}", page.url, page.text))?;
        written.push(file_path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_filename_flattens_url() {
        assert_eq!(
            page_filename("https://ww2.mini.pw.edu.pl/wydzial/dziekani/"),
            "ww2.mini.pw.edu.pl_wydzial_dziekani.txt"
        );
    }

    #[test]
    fn saved_page_carries_url_header() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_data_dir(tmp.path().to_path_buf());

        let pages = vec![ScrapedPage {
            url: "https://ww2.mini.pw.edu.pl/wydzial/o-nas/".to_string(),
            text: "Wydział MiNI istnieje od 1999 roku.".to_string(),
            links: Vec::new(),
        }];

        let written = save_pages(&paths, &pages).unwrap();
        assert_eq!(written.len(), 1);

        let content = std::fs::read_to_string(&written[0]).unwrap();
        assert!(content.starts_with("URL: https://ww2.mini.pw.edu.pl/wydzial/o-nas/\n\n"));
        assert!(content.ends_with("1999 roku."));
    }
}
