use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};

/// The player identity a session is launched for.
///
/// The session id is a secret and never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PlayerConfigurationDecl")]
pub struct PlayerConfiguration {
    user_name: String,
    #[serde(skip)]
    session_id: Option<String>,
    player_uuid: Uuid,
}

#[derive(Deserialize)]
struct PlayerConfigurationDecl {
    user_name: Option<String>,
    player_uuid: Option<Uuid>,
}

impl TryFrom<PlayerConfigurationDecl> for PlayerConfiguration {
    type Error = LauncherError;

    fn try_from(decl: PlayerConfigurationDecl) -> LauncherResult<Self> {
        let user_name = decl
            .user_name
            .ok_or_else(|| LauncherError::config("user_name", "must be set"))?;
        let player_uuid = decl
            .player_uuid
            .ok_or_else(|| LauncherError::config("player_uuid", "must be set"))?;
        Self::new(user_name, player_uuid)
    }
}

impl PlayerConfiguration {
    pub fn new(user_name: impl Into<String>, player_uuid: Uuid) -> LauncherResult<Self> {
        let user_name = user_name.into();
        if user_name.trim().is_empty() {
            return Err(LauncherError::config("user_name", "must not be empty"));
        }
        Ok(Self {
            user_name,
            session_id: None,
            player_uuid,
        })
    }

    /// A player with a freshly generated identifier.
    pub fn offline(user_name: impl Into<String>) -> LauncherResult<Self> {
        Self::new(user_name, Uuid::new_v4())
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn player_uuid(&self) -> Uuid {
        self.player_uuid
    }

    /// Substitution variables for launch arguments.
    pub fn variables(&self) -> Vec<(&'static str, String)> {
        let mut vars = vec![
            ("user_name", self.user_name.clone()),
            ("player_uuid", self.player_uuid.to_string()),
        ];
        if let Some(session_id) = &self.session_id {
            vars.push(("session_id", session_id.clone()));
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_user_name_is_rejected() {
        assert!(PlayerConfiguration::new("   ", Uuid::nil()).is_err());
        assert!(PlayerConfiguration::offline("Steve").is_ok());
    }

    #[test]
    fn session_id_never_serialized() {
        let player = PlayerConfiguration::new("Steve", Uuid::nil())
            .unwrap()
            .with_session_id("secret-token");
        let json = serde_json::to_string(&player).unwrap();
        assert!(!json.contains("secret-token"));

        let back: PlayerConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user_name(), "Steve");
        assert_eq!(back.session_id(), None);
    }

    #[test]
    fn missing_uuid_is_a_configuration_error() {
        let err = serde_json::from_str::<PlayerConfiguration>(r#"{ "user_name": "Alex" }"#)
            .unwrap_err();
        assert!(err.to_string().contains("player_uuid"));
    }

    #[test]
    fn variables_include_session_only_when_set() {
        let player = PlayerConfiguration::new("Steve", Uuid::nil()).unwrap();
        assert_eq!(player.variables().len(), 2);
        assert_eq!(player.with_session_id("t").variables().len(), 3);
    }
}
