//! NewsData adapter - headlines by query.

use async_trait::async_trait;
use tracing::instrument;

use super::client::HttpClient;
use super::types::{NewsArticle, NewsResponse};
use crate::domain::market::NewsItem;
use crate::ports::sources::{NewsSource, SourceError, SourceResult};

/// `NewsSource` backed by newsdata.io.
pub struct NewsDataClient {
    client: HttpClient,
    api_key: Option<String>,
}

impl NewsDataClient {
    pub fn new(client: HttpClient, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl NewsSource for NewsDataClient {
    #[instrument(skip(self))]
    async fn headlines(&self, query: &str, language: &str) -> SourceResult<Vec<NewsItem>> {
        let key = self
            .api_key
            .clone()
            .ok_or(SourceError::MissingApiKey("News"))?;
        let params = [
            ("apikey", key),
            ("q", query.to_string()),
            ("language", language.to_string()),
        ];
        let response: NewsResponse = self.client.get_json("news", "/news", &params).await?;
        normalize_news(response)
    }
}

/// Map a news response into headlines.
pub fn normalize_news(response: NewsResponse) -> SourceResult<Vec<NewsItem>> {
    if response.status.as_deref() == Some("error") {
        return Err(SourceError::InvalidPayload("news"));
    }
    let articles = response
        .results
        .ok_or(SourceError::InvalidPayload("news"))?;
    Ok(articles.into_iter().map(normalize_article).collect())
}

fn normalize_article(article: NewsArticle) -> NewsItem {
    NewsItem {
        id: article.article_id,
        title: article.title.unwrap_or_default(),
        description: article.description.unwrap_or_default(),
        url: article.link.unwrap_or_default(),
        source: article.source_id.unwrap_or_default(),
        published_at: article.pub_date.unwrap_or_default(),
    }
}
