//! HTTP client for the upstream game-data API.
//!
//! Every record is served inside an envelope `{ "keys": [...], "value": T }`.
//! A 404 means the record does not exist and maps to `Ok(None)`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use hellabot_domain::{Definition, Enemy, Item, Operator, Skill, Stage, StageDifficulty};

use crate::infrastructure::ports::{
    CatalogEntry, CatalogKind, GameDataError, GameDataPort, TAG_UPGRADABLE,
};

/// Default request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Lookup keys accompany the value but are not needed here.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    value: T,
}

/// Client for the game-data API.
#[derive(Clone)]
pub struct GameDataClient {
    client: Client,
    base_url: String,
}

impl GameDataClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("hellabot/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn record_url(&self, resource: &str, query: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            resource,
            urlencoding::encode(&query.trim().to_lowercase())
        )
    }

    /// Fetch one record.
    async fn get_one<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        query: &str,
        include: &[&str],
    ) -> Result<Option<T>, GameDataError> {
        if query.trim().is_empty() {
            return Ok(None);
        }
        let url = self.record_url(resource, query);
        let params: Vec<(&str, &str)> = include.iter().map(|i| ("include", *i)).collect();

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| GameDataError::request(resource, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(resource, query, "Game data record not found");
                Ok(None)
            }
            status if status.is_success() => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| GameDataError::request(resource, e))?;
                parse_envelope(resource, &body).map(Some)
            }
            status => Err(GameDataError::Status {
                resource,
                status: status.as_u16(),
            }),
        }
    }

    /// List every record of a resource.
    async fn get_all<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        include: &[&str],
    ) -> Result<Vec<T>, GameDataError> {
        let url = format!("{}/{}", self.base_url, resource);
        let params: Vec<(&str, &str)> = include.iter().map(|i| ("include", *i)).collect();

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| GameDataError::request(resource, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GameDataError::Status {
                resource,
                status: status.as_u16(),
            });
        }
        let body = response
            .text()
            .await
            .map_err(|e| GameDataError::request(resource, e))?;
        parse_envelope_list(resource, &body)
    }
}

fn parse_envelope<T: DeserializeOwned>(
    resource: &'static str,
    body: &str,
) -> Result<T, GameDataError> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(|e| e.value)
        .map_err(|e| GameDataError::invalid(resource, e))
}

fn parse_envelope_list<T: DeserializeOwned>(
    resource: &'static str,
    body: &str,
) -> Result<Vec<T>, GameDataError> {
    serde_json::from_str::<Vec<Envelope<T>>>(body)
        .map(|list| list.into_iter().map(|e| e.value).collect())
        .map_err(|e| GameDataError::invalid(resource, e))
}

/// Autocomplete entries for one catalog.
fn operator_entries(ops: Vec<Operator>) -> Vec<CatalogEntry> {
    ops.into_iter()
        .filter(|op| !op.data.name.is_empty())
        .map(|op| {
            let upgradable = op.has_upgrades();
            let entry = CatalogEntry::new(op.data.name.clone(), op.data.name);
            if upgradable {
                entry.with_tag(TAG_UPGRADABLE)
            } else {
                entry
            }
        })
        .collect()
}

fn enemy_entries(enemies: Vec<Enemy>) -> Vec<CatalogEntry> {
    enemies
        .into_iter()
        .map(|e| {
            CatalogEntry::new(
                format!("{} - {}", e.excel.enemy_index, e.excel.name),
                e.excel.enemy_id,
            )
            .with_keyword(e.excel.name)
            .with_keyword(e.excel.enemy_index)
        })
        .collect()
}

/// Skills are looked up by id; the first level's name is what users type.
fn skill_entries(skills: Vec<Skill>) -> Vec<CatalogEntry> {
    skills
        .into_iter()
        .filter_map(|s| {
            let name = s.levels.first().map(|l| l.name.clone())?;
            Some(CatalogEntry::new(name, s.skill_id.clone()).with_keyword(s.skill_id))
        })
        .collect()
}

fn stage_entries(groups: Vec<Vec<Stage>>) -> Vec<CatalogEntry> {
    groups
        .into_iter()
        .flatten()
        .map(|s| {
            CatalogEntry::new(
                format!("{} - {}", s.excel.code, s.excel.name),
                s.excel.code.clone(),
            )
            .with_keyword(s.excel.name)
            .with_keyword(s.excel.code)
        })
        .collect()
}

#[async_trait]
impl GameDataPort for GameDataClient {
    async fn operator(&self, query: &str) -> Result<Option<Operator>, GameDataError> {
        self.get_one("operator", query, &[]).await
    }

    async fn enemy(&self, query: &str) -> Result<Option<Enemy>, GameDataError> {
        self.get_one("enemy", query, &["excel"]).await
    }

    async fn skill(&self, query: &str) -> Result<Option<Skill>, GameDataError> {
        self.get_one("skill", query, &[]).await
    }

    async fn item(&self, query: &str) -> Result<Option<Item>, GameDataError> {
        self.get_one("item", query, &["data"]).await
    }

    async fn definition(&self, query: &str) -> Result<Option<Definition>, GameDataError> {
        self.get_one("define", query, &[]).await
    }

    async fn definitions(&self) -> Result<Vec<Definition>, GameDataError> {
        self.get_all("define", &[]).await
    }

    async fn stages(
        &self,
        code: &str,
        difficulty: StageDifficulty,
    ) -> Result<Vec<Stage>, GameDataError> {
        let resource = match difficulty {
            StageDifficulty::Normal => "stage",
            StageDifficulty::Challenge => "toughstage",
        };
        Ok(self
            .get_one::<Vec<Stage>>(resource, code, &["excel"])
            .await?
            .unwrap_or_default())
    }

    async fn catalog(&self, kind: CatalogKind) -> Result<Vec<CatalogEntry>, GameDataError> {
        match kind {
            CatalogKind::Operator => Ok(operator_entries(
                self.get_all("operator", &["data.name", "data.rarity"]).await?,
            )),
            CatalogKind::Enemy => Ok(enemy_entries(
                self.get_all(
                    "enemy",
                    &["excel.name", "excel.enemyIndex", "excel.enemyId"],
                )
                .await?,
            )),
            CatalogKind::Skill => Ok(skill_entries(
                self.get_all("skill", &["skillId", "levels"]).await?,
            )),
            CatalogKind::Item => {
                let items: Vec<Item> = self.get_all("item", &["data.name"]).await?;
                Ok(items
                    .into_iter()
                    .map(|i| CatalogEntry::new(i.data.name.clone(), i.data.name))
                    .collect())
            }
            CatalogKind::Definition => {
                let defs: Vec<Definition> = self.get_all("define", &["termName"]).await?;
                Ok(defs
                    .into_iter()
                    .map(|d| CatalogEntry::new(d.term_name.clone(), d.term_name))
                    .collect())
            }
            CatalogKind::Stage => Ok(stage_entries(
                self.get_all("stage", &["excel.name", "excel.code", "excel.stageId"])
                    .await?,
            )),
            CatalogKind::ToughStage => Ok(stage_entries(
                self.get_all(
                    "toughstage",
                    &["excel.name", "excel.code", "excel.stageId"],
                )
                .await?,
            )),
        }
    }
}
