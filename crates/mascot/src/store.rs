use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::GatewayError;
use crate::models::persona::{Persona, Skill};

/// Read-only view of the external mascot store. The gateway fetches
/// persona, personality, and skill rows per request and never writes.
#[async_trait]
pub trait MascotStore: Send + Sync {
    async fn fetch_persona(&self, mascot_id: &str) -> Result<Option<Persona>, GatewayError>;

    async fn fetch_personality(&self, mascot_id: &str) -> Result<Option<String>, GatewayError>;

    async fn fetch_skill(
        &self,
        mascot_id: &str,
        skill_id: &str,
    ) -> Result<Option<Skill>, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// PostgREST base URL, e.g. `https://xyz.supabase.co/rest/v1`.
    pub rest_url: String,
    /// Service-role key. Process-level secret, never sent to clients.
    pub service_key: String,
}

/// PostgREST-backed implementation of [`MascotStore`].
pub struct RestStore {
    client: Client,
    config: StoreConfig,
}

#[derive(Debug, Deserialize)]
struct PersonalityRow {
    personality: String,
}

impl RestStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self { client, config })
    }

    async fn select<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, GatewayError> {
        let url = format!("{}/{}", self.config.rest_url.trim_end_matches('/'), table);

        let response = self
            .client
            .get(&url)
            .query(filters)
            .query(&[("select", "*")])
            .header("apikey", &self.config.service_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.service_key),
            )
            .send()
            .await
            .map_err(|e| GatewayError::Store(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Store(format!(
                "{} query failed with status {}: {}",
                table, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Store(e.to_string()))
    }
}

#[async_trait]
impl MascotStore for RestStore {
    async fn fetch_persona(&self, mascot_id: &str) -> Result<Option<Persona>, GatewayError> {
        let rows: Vec<Persona> = self
            .select("mascots", &[("id", format!("eq.{}", mascot_id))])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_personality(&self, mascot_id: &str) -> Result<Option<String>, GatewayError> {
        let rows: Vec<PersonalityRow> = self
            .select(
                "mascot_personalities",
                &[("mascot_id", format!("eq.{}", mascot_id))],
            )
            .await?;
        Ok(rows.into_iter().next().map(|row| row.personality))
    }

    async fn fetch_skill(
        &self,
        mascot_id: &str,
        skill_id: &str,
    ) -> Result<Option<Skill>, GatewayError> {
        let rows: Vec<Skill> = self
            .select(
                "mascot_skills",
                &[
                    ("id", format!("eq.{}", skill_id)),
                    ("mascot_id", format!("eq.{}", mascot_id)),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store_for(server: &MockServer) -> RestStore {
        RestStore::new(StoreConfig {
            rest_url: server.uri(),
            service_key: "service-key".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_persona() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mascots"))
            .and(query_param("id", "eq.1"))
            .and(header("apikey", "service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "1",
                "name": "Analyst Bear",
                "subtitle": "your data analysis expert",
                "color": "#8b5a2b",
                "task_category": "analysis"
            }])))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let persona = store.fetch_persona("1").await.unwrap().unwrap();
        assert_eq!(persona.name, "Analyst Bear");
        assert_eq!(persona.task_category.as_deref(), Some("analysis"));
    }

    #[tokio::test]
    async fn test_fetch_persona_missing_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mascots"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        assert!(store.fetch_persona("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_personality_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mascot_personalities"))
            .and(query_param("mascot_id", "eq.1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"mascot_id": "1", "personality": "Be upbeat."}])),
            )
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let text = store.fetch_personality("1").await.unwrap();
        assert_eq!(text.as_deref(), Some("Be upbeat."));
    }

    #[tokio::test]
    async fn test_fetch_skill_scoped_to_mascot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mascot_skills"))
            .and(query_param("id", "eq.s1"))
            .and(query_param("mascot_id", "eq.1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "s1",
                "mascot_id": "1",
                "label": "Summarize",
                "prompt": "Summarize the text.",
                "is_active": true,
                "sort_order": 1
            }])))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let skill = store.fetch_skill("1", "s1").await.unwrap().unwrap();
        assert_eq!(skill.label, "Summarize");
    }

    #[tokio::test]
    async fn test_non_2xx_surfaces_store_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mascots"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let err = store.fetch_persona("1").await.unwrap_err();
        assert!(matches!(err, GatewayError::Store(_)));
    }
}
