//! Subject lookup: turn a user's query into a render subject.

use std::sync::Arc;

use hellabot_domain::{Direction, Subject};

use super::SpineError;
use crate::infrastructure::ports::GameDataPort;

/// Looks up operators and enemies and builds their render subjects.
pub struct SubjectLookup {
    game_data: Arc<dyn GameDataPort>,
}

impl SubjectLookup {
    pub fn new(game_data: Arc<dyn GameDataPort>) -> Self {
        Self { game_data }
    }

    /// Operator subject for `name`, optionally in a skin.
    ///
    /// Operators that only ship a front skeleton are always rendered from
    /// the front, whatever direction was asked for.
    pub async fn operator(
        &self,
        name: &str,
        skin: Option<&str>,
        direction: Direction,
    ) -> Result<Subject, SpineError> {
        let op = self
            .game_data
            .operator(name)
            .await?
            .ok_or_else(|| SpineError::not_found("operator", name))?;

        let skeleton_id = op
            .battle_skeleton_id(skin)
            .ok_or_else(|| SpineError::not_found("skin", skin.unwrap_or_default()))?;

        let direction = if op.front_only() {
            Direction::Front
        } else {
            direction
        };

        Subject::operator(skeleton_id, direction, op.data.name)
            .map_err(|_| SpineError::not_found("operator", name))
    }

    pub async fn enemy(&self, name: &str) -> Result<Subject, SpineError> {
        let enemy = self
            .game_data
            .enemy(name)
            .await?
            .ok_or_else(|| SpineError::not_found("enemy", name))?;

        Subject::enemy(enemy.excel.enemy_id, enemy.excel.name)
            .map_err(|_| SpineError::not_found("enemy", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockGameDataPort;
    use hellabot_domain::{Enemy, Operator, SubjectKind};
    use mockall::predicate::eq;

    fn bard() -> Operator {
        serde_json::from_value(serde_json::json!({
            "id": "char_4019_ncdeer",
            "data": { "name": "Nine-Colored Deer", "rarity": "TIER_6", "subProfessionId": "bard" }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn front_only_operators_ignore_direction() {
        let mut game_data = MockGameDataPort::new();
        game_data
            .expect_operator()
            .with(eq("nine-colored deer"))
            .returning(|_| Ok(Some(bard())));

        let lookup = SubjectLookup::new(Arc::new(game_data));
        let subject = lookup
            .operator("nine-colored deer", None, Direction::Back)
            .await
            .unwrap();

        assert_eq!(subject.kind(), SubjectKind::Operator);
        assert_eq!(subject.id(), "char_4019_ncdeer");
        assert_eq!(subject.direction(), Some(Direction::Front));
        assert_eq!(subject.display_name(), "Nine-Colored Deer");
    }

    #[tokio::test]
    async fn unknown_skin_is_not_found() {
        let mut game_data = MockGameDataPort::new();
        game_data.expect_operator().returning(|_| Ok(Some(bard())));

        let lookup = SubjectLookup::new(Arc::new(game_data));
        let result = lookup
            .operator("nine-colored deer", Some("summer"), Direction::Front)
            .await;

        assert!(matches!(
            result,
            Err(SpineError::NotFound { entity: "skin", .. })
        ));
    }

    #[tokio::test]
    async fn missing_enemy_is_not_found() {
        let mut game_data = MockGameDataPort::new();
        game_data.expect_enemy().returning(|_| Ok(None));

        let lookup = SubjectLookup::new(Arc::new(game_data));
        let result = lookup.enemy("nobody").await;

        assert!(matches!(
            result,
            Err(SpineError::NotFound { entity: "enemy", .. })
        ));
    }

    #[tokio::test]
    async fn enemy_subject_uses_enemy_id() {
        let mut game_data = MockGameDataPort::new();
        game_data.expect_enemy().returning(|_| {
            Ok(Some(
                serde_json::from_value::<Enemy>(serde_json::json!({
                    "excel": { "enemyId": "enemy_1007_slime", "enemyIndex": "B1", "name": "Originium Slug" }
                }))
                .unwrap(),
            ))
        });

        let lookup = SubjectLookup::new(Arc::new(game_data));
        let subject = lookup.enemy("originium slug").await.unwrap();

        assert_eq!(subject.id(), "enemy_1007_slime");
        assert_eq!(subject.direction(), None);
    }
}
