use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::errors::ApiError;

const SCRAPE_TIMEOUT: Duration = Duration::from_secs(120);
const CRAWL_POLL_INTERVAL: Duration = Duration::from_secs(5);
// A 1000-page crawl can take a while; give up after ~30 minutes of polling.
const CRAWL_MAX_POLLS: usize = 360;

/// Content of a single scraped page as returned by the scraping service.
#[derive(Debug, Clone)]
pub struct ScrapeData {
    pub markdown: String,
    pub links: Vec<String>,
}

/// One page out of a recursive crawl.
#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub url: String,
    pub markdown: String,
}

/// Thin client for the Firecrawl scraping API.
#[derive(Clone)]
pub struct FirecrawlClient {
    base_url: String,
    client: Client,
}

impl FirecrawlClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(ApiError::internal)?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(SCRAPE_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Fetch one URL as markdown plus the links found on the page.
    pub async fn scrape(&self, url: &str) -> Result<ScrapeData, ApiError> {
        let endpoint = format!("{}/v1/scrape", self.base_url);

        let body = json!({
            "url": url,
            "formats": ["markdown", "links"],
            "onlyMainContent": false,
            "timeout": 120000,
        });

        let res = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("Firecrawl scrape error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;
        let data = &payload["data"];

        let markdown = data["markdown"].as_str().unwrap_or_default().to_string();
        let links = data["links"]
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();

        Ok(ScrapeData { markdown, links })
    }

    /// Crawl recursively from `root_url`, up to `limit` pages.
    ///
    /// Submits a crawl job and polls until it completes or fails.
    pub async fn crawl(&self, root_url: &str, limit: usize) -> Result<Vec<CrawledPage>, ApiError> {
        let endpoint = format!("{}/v1/crawl", self.base_url);

        let body = json!({
            "url": root_url,
            "limit": limit,
            "scrapeOptions": { "formats": ["markdown"] },
        });

        let res = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!("Firecrawl crawl error: {}", text)));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;
        let job_id = payload["id"]
            .as_str()
            .ok_or_else(|| ApiError::Internal("Firecrawl crawl response missing job id".to_string()))?
            .to_string();

        self.wait_for_crawl(&job_id).await
    }

    async fn wait_for_crawl(&self, job_id: &str) -> Result<Vec<CrawledPage>, ApiError> {
        let endpoint = format!("{}/v1/crawl/{}", self.base_url, job_id);

        for _ in 0..CRAWL_MAX_POLLS {
            let res = self
                .client
                .get(&endpoint)
                .send()
                .await
                .map_err(ApiError::internal)?;

            if !res.status().is_success() {
                let text = res.text().await.unwrap_or_default();
                return Err(ApiError::Internal(format!("Firecrawl status error: {}", text)));
            }

            let payload: Value = res.json().await.map_err(ApiError::internal)?;
            match payload["status"].as_str().unwrap_or_default() {
                "completed" => return Ok(parse_crawl_pages(&payload)),
                "failed" | "cancelled" => {
                    return Err(ApiError::Internal(format!(
                        "Firecrawl crawl {} ended with status {}",
                        job_id, payload["status"]
                    )));
                }
                status => {
                    tracing::debug!("Crawl {} still {}, waiting...", job_id, status);
                    tokio::time::sleep(CRAWL_POLL_INTERVAL).await;
                }
            }
        }

        Err(ApiError::Internal(format!(
            "Firecrawl crawl {} did not complete in time",
            job_id
        )))
    }
}

fn parse_crawl_pages(payload: &Value) -> Vec<CrawledPage> {
    let Some(data) = payload["data"].as_array() else {
        return Vec::new();
    };

    data.iter()
        .filter_map(|page| {
            let markdown = page["markdown"].as_str()?.to_string();
            let url = page["metadata"]["sourceURL"]
                .as_str()
                .or_else(|| page["metadata"]["url"].as_str())
                .unwrap_or_default()
                .to_string();
            Some(CrawledPage { url, markdown })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crawl_pages_are_parsed_from_payload() {
        let payload = json!({
            "status": "completed",
            "data": [
                {
                    "markdown": "# Page one",
                    "metadata": { "sourceURL": "https://ww2.mini.pw.edu.pl/" }
                },
                {
                    "markdown": "# Page two",
                    "metadata": { "url": "https://ww2.mini.pw.edu.pl/wydzial/" }
                },
                { "metadata": {} }
            ]
        });

        let pages = parse_crawl_pages(&payload);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].url, "https://ww2.mini.pw.edu.pl/");
        assert_eq!(pages[1].markdown, "# Page two");
    }

    #[test]
    fn missing_data_yields_no_pages() {
        let payload = json!({ "status": "completed" });
        assert!(parse_crawl_pages(&payload).is_empty());
    }
}
