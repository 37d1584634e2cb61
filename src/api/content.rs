//! Articles, taxonomy, comments and the rest of the public site content.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{BlogApi, Page};
use crate::gateway::{GatewayError, RequestEnvelope};

/// Filters for the article listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    pub page_no: u32,
    pub page_size: u32,
    pub category_id: Option<i64>,
    pub tag_id: Option<i64>,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            page_no: 1,
            page_size: 10,
            category_id: None,
            tag_id: None,
        }
    }
}

impl ArticleQuery {
    pub fn page(page_no: u32, page_size: u32) -> Self {
        Self {
            page_no,
            page_size,
            ..Default::default()
        }
    }

    fn params(&self) -> Value {
        json!({
            "pageNo": self.page_no,
            "pageSize": self.page_size,
            "categoryId": self.category_id,
            "tagId": self.tag_id,
        })
    }
}

/// Article as it appears in listings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
}

impl BlogApi {
    pub async fn fetch_article_list(
        &self,
        query: &ArticleQuery,
    ) -> Result<Page<ArticleSummary>, GatewayError> {
        self.gateway
            .send_as(RequestEnvelope::get("/v1/article/list").params(query.params()))
            .await
    }

    /// Articles written by the logged-in user, published or not.
    pub async fn user_articles(&self, query: &ArticleQuery) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/user/article/list").params(query.params()))
            .await
    }

    pub async fn search_articles(
        &self,
        keywords: &str,
        page_no: u32,
        page_size: u32,
    ) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/article/search").params(json!({
            "keywords": keywords,
            "pageNo": page_no,
            "pageSize": page_size,
        })))
        .await
    }

    pub async fn article_info(&self, id: i64) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/article/info").params(json!({"id": id})))
            .await
    }

    pub async fn like_article(&self, id: i64) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/article/like").params(json!({"articleId": id})))
            .await
    }

    pub async fn archive(&self) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/article/archive")).await
    }

    pub async fn newest_articles(&self) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/upToDateArticle")).await
    }

    pub async fn add_or_update_article(&self, article: Value) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::post("/system/article/add").data(article))
            .await
    }

    /// Publish (`true`) or take down (`false`) an article.
    pub async fn publish_article(&self, id: i64, publish: bool) -> Result<Value, GatewayError> {
        self.send(
            RequestEnvelope::post("/system/article/pubOrShelf")
                .data(json!({"id": id, "isPublish": u8::from(publish)})),
        )
        .await
    }

    pub async fn delete_article(&self, id: i64) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::delete("/system/article/delete").params(json!({"id": id})))
            .await
    }

    pub async fn fetch_tags(&self) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/tag/")).await
    }

    pub async fn fetch_categories(&self) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/category/list")).await
    }

    pub async fn fetch_comments(
        &self,
        article_id: i64,
        page_no: u32,
        page_size: u32,
    ) -> Result<Value, GatewayError> {
        self.send(
            RequestEnvelope::get("/v1/comment/selectCommentByArticleId").params(json!({
                "articleId": article_id,
                "pageNo": page_no,
                "pageSize": page_size,
            })),
        )
        .await
    }

    pub async fn post_comment(&self, comment: Value) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::post("/v1/comment/").data(comment))
            .await
    }

    pub async fn fetch_links(&self) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/link/selectLinkList"))
            .await
    }

    pub async fn add_link(&self, link: Value) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::post("/v1/link/").data(link)).await
    }

    pub async fn list_messages(&self) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/message/list")).await
    }

    pub async fn add_message(&self, message: Value) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::post("/v1/message/").data(message))
            .await
    }

    pub async fn home_data(&self) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/")).await
    }

    pub async fn website_info(&self) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/webSiteInfo")).await
    }

    pub async fn fetch_photo_albums(&self) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/photoAlbum/")).await
    }

    pub async fn fetch_photos(&self, params: Value) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/photo/").params(params))
            .await
    }

    pub async fn sponsor_order(&self, params: Value) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::get("/v1/sponsor/createOrder").params(params))
            .await
    }

    pub async fn ai_chat(&self, request: Value) -> Result<Value, GatewayError> {
        self.send(RequestEnvelope::post("/v1/ai/chat").data(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::api_for;
    use axum::extract::{Json, Query};
    use axum::routing::{delete, get, post};
    use axum::Router;
    use std::collections::HashMap;

    fn backend() -> Router {
        Router::new()
            .route(
                "/v1/article/list",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let page_no: i64 = params.get("pageNo").and_then(|p| p.parse().ok()).unwrap_or(0);
                    Json(json!({
                        "code": 200,
                        "data": {
                            "records": [
                                {"id": page_no * 10 + 1, "title": "Ownership", "categoryName": "Rust", "views": 3},
                                {"id": page_no * 10 + 2, "title": "Lifetimes"}
                            ],
                            "total": 12,
                            "categoryFilter": params.contains_key("categoryId")
                        }
                    }))
                }),
            )
            .route(
                "/v1/article/info",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    match params.get("id").map(String::as_str) {
                        Some("7") => Json(json!({"code": 200, "data": {"id": 7, "title": "Ownership"}})),
                        _ => Json(json!({"code": 404, "message": "article not found"})),
                    }
                }),
            )
            .route(
                "/system/article/pubOrShelf",
                post(|Json(body): Json<Value>| async move { Json(json!({"code": 200, "data": body})) }),
            )
            .route(
                "/system/article/delete",
                delete(|Query(params): Query<HashMap<String, String>>| async move {
                    Json(json!({"code": 200, "data": params}))
                }),
            )
    }

    #[tokio::test]
    async fn test_fetch_article_list() {
        let (api, _) = api_for(backend()).await;

        let page = api
            .fetch_article_list(&ArticleQuery::page(2, 10))
            .await
            .unwrap();

        assert_eq!(page.total, 12);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].id, 21);
        assert_eq!(page.records[0].category_name.as_deref(), Some("Rust"));
        assert!(page.records[1].summary.is_none());
    }

    #[tokio::test]
    async fn test_article_info_not_found_is_rejected() {
        let (api, notifier) = api_for(backend()).await;

        assert_eq!(api.article_info(7).await.unwrap()["title"], "Ownership");

        let err = api.article_info(8).await.unwrap_err();
        assert_eq!(err.code(), Some(404));
        assert_eq!(notifier.messages(), vec!["article not found"]);
    }

    #[tokio::test]
    async fn test_publish_and_delete() {
        let (api, _) = api_for(backend()).await;

        let published = api.publish_article(5, false).await.unwrap();
        assert_eq!(published, json!({"id": 5, "isPublish": 0}));

        let deleted = api.delete_article(5).await.unwrap();
        assert_eq!(deleted, json!({"id": "5"}));
    }

    #[test]
    fn test_article_query_params_skip_unset_filters() {
        let query = ArticleQuery {
            category_id: Some(3),
            ..Default::default()
        };
        let request = RequestEnvelope::get("/v1/article/list").params(query.params());

        let mut pairs = request.query_pairs();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("categoryId".to_string(), "3".to_string()),
                ("pageNo".to_string(), "1".to_string()),
                ("pageSize".to_string(), "10".to_string()),
            ]
        );
    }
}
