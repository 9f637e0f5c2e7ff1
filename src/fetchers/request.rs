use crate::config::FetchConfig;
use crate::error::FetchError;
use log::debug;
use reqwest::Client;
use std::time::Duration;

/// A downloaded page after redirects have been followed
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
    /// Where the redirect chain ended
    pub final_url: String,
}

impl FetchedPage {
    pub fn ensure_success(self) -> Result<Self, FetchError> {
        if (200..300).contains(&self.status) {
            Ok(self)
        } else {
            Err(FetchError::Status(self.status))
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        Self::new(config.timeout(), &config.user_agent)
    }

    /// GET a page, following redirects. Any HTTP status is returned as a page;
    /// see [`FetchedPage::ensure_success`].
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let final_url = response.url().to_string();
        debug!("GET {} -> {} ({})", url, status, final_url);

        let body = response.text().await?;
        Ok(FetchedPage {
            status: status.as_u16(),
            body,
            final_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let mut server = mockito::Server::new_async().await;
        let _redirect = server
            .mock("GET", "/short")
            .with_status(301)
            .with_header("location", "/long")
            .create_async()
            .await;
        let _page = server
            .mock("GET", "/long")
            .with_status(200)
            .with_body("<html>hello</html>")
            .create_async()
            .await;

        let fetcher = RequestFetcher::from_config(&FetchConfig::default()).unwrap();
        let page = fetcher
            .fetch(&format!("{}/short", server.url()))
            .await
            .unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<html>hello</html>");
        assert_eq!(page.final_url, format!("{}/long", server.url()));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        use std::io::Write;

        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/slow")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(500));
                w.write_all(b"late")
            })
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(Duration::from_millis(50), "test-agent").unwrap();
        let err = fetcher
            .fetch(&format!("{}/slow", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Timeout));
    }

    #[tokio::test]
    async fn test_fetch_reports_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = RequestFetcher::from_config(&FetchConfig::default()).unwrap();
        let page = fetcher
            .fetch(&format!("{}/missing", server.url()))
            .await
            .unwrap();

        assert_eq!(page.status, 404);
        assert!(matches!(page.ensure_success(), Err(FetchError::Status(404))));
    }
}
