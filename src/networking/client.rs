//! Lichess Bot API client

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use std::io;
use std::time::Duration;
use tracing::{debug, info};

use shared::{AccountEvent, Challenge, DeclineForm, DeclineReason, GameEvent, UserProfile};

use super::stream::{ndjson_stream, EventStream};
use super::GameServer;
use crate::core::{BotError, BotResult};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Server address and bot account token
#[derive(Debug, Clone)]
pub struct LichessConfig {
    pub base_url: String,
    pub token: String,
}

/// HTTP client for the Lichess Bot API
///
/// No overall request timeout is set because event streams stay open for the
/// lifetime of the account or game.
pub struct LichessClient {
    http: reqwest::Client,
    config: LichessConfig,
}

impl LichessClient {
    pub fn new(config: LichessConfig) -> BotResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("xfchess-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .bearer_auth(&self.config.token)
    }

    async fn send(&self, request: RequestBuilder) -> BotResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(BotError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn post(&self, path: &str) -> BotResult<()> {
        self.send(self.request(Method::POST, path)).await?;
        Ok(())
    }

    async fn post_form<F: Serialize + ?Sized>(&self, path: &str, form: &F) -> BotResult<()> {
        self.send(self.request(Method::POST, path).form(form)).await?;
        Ok(())
    }

    async fn open_stream<T>(&self, path: &str) -> BotResult<EventStream<T>>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let response = self.send(self.request(Method::GET, path)).await?;
        debug!("[NETWORK] Stream open: {}", path);
        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other));
        Ok(ndjson_stream(bytes))
    }
}

#[async_trait]
impl GameServer for LichessClient {
    async fn stream_incoming_events(&self) -> BotResult<EventStream<AccountEvent>> {
        self.open_stream("/api/stream/event").await
    }

    async fn stream_game(&self, game_id: &str) -> BotResult<EventStream<GameEvent>> {
        self.open_stream(&format!("/api/bot/game/stream/{game_id}")).await
    }

    async fn accept_challenge(&self, challenge_id: &str) -> BotResult<()> {
        self.post(&format!("/api/challenge/{challenge_id}/accept")).await
    }

    async fn decline_challenge(
        &self,
        challenge_id: &str,
        reason: DeclineReason,
    ) -> BotResult<()> {
        self.post_form(
            &format!("/api/challenge/{challenge_id}/decline"),
            &DeclineForm { reason },
        )
        .await
    }

    async fn make_move(&self, game_id: &str, uci: &str) -> BotResult<()> {
        self.post(&format!("/api/bot/game/{game_id}/move/{uci}")).await
    }

    async fn resign_game(&self, game_id: &str) -> BotResult<()> {
        self.post(&format!("/api/bot/game/{game_id}/resign")).await
    }

    async fn abort_game(&self, game_id: &str) -> BotResult<()> {
        self.post(&format!("/api/bot/game/{game_id}/abort")).await
    }

    async fn create_challenge(&self, challenge: &Challenge) -> BotResult<()> {
        self.post_form(&format!("/api/challenge/{}", challenge.opponent), challenge)
            .await?;
        info!(
            "[NETWORK] Challenged {} ({}+{}, rated: {})",
            challenge.opponent, challenge.clock_limit, challenge.clock_increment, challenge.rated
        );
        Ok(())
    }

    async fn user_profile(&self, username: &str) -> BotResult<UserProfile> {
        let response = self
            .send(self.request(Method::GET, &format!("/api/user/{username}")))
            .await?;
        Ok(response.json().await?)
    }

    async fn online_bots(&self, limit: usize) -> BotResult<Vec<UserProfile>> {
        self.open_stream(&format!("/api/bot/online?nb={limit}"))
            .await?
            .try_collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> LichessClient {
        LichessClient::new(LichessConfig {
            base_url: base_url.to_string(),
            token: "lip_test".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_url_building() {
        let client = client("https://lichess.org/");
        assert_eq!(
            client.url("/api/bot/game/abc/move/e2e4"),
            "https://lichess.org/api/bot/game/abc/move/e2e4"
        );
    }

    #[test]
    fn test_requests_carry_bearer_token() {
        let client = client("https://lichess.org");
        let request = client
            .request(Method::POST, "/api/challenge/xyz/accept")
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/api/challenge/xyz/accept");
        assert_eq!(
            request.headers()["authorization"].to_str().unwrap(),
            "Bearer lip_test"
        );
    }

    #[test]
    fn test_decline_form_body() {
        let client = client("https://lichess.org");
        let request = client
            .request(Method::POST, "/api/challenge/xyz/decline")
            .form(&DeclineForm {
                reason: DeclineReason::Later,
            })
            .build()
            .unwrap();
        let body = request.body().and_then(|body| body.as_bytes()).unwrap();
        assert_eq!(body, b"reason=later");
    }

    #[test]
    fn test_challenge_form_body() {
        let client = client("https://lichess.org");
        let challenge = Challenge {
            opponent: "rival".to_string(),
            rated: true,
            clock_limit: 60,
            clock_increment: 0,
            color: shared::ColorChoice::Random,
        };
        let request = client
            .request(Method::POST, "/api/challenge/rival")
            .form(&challenge)
            .build()
            .unwrap();
        let body = request.body().and_then(|body| body.as_bytes()).unwrap();
        assert_eq!(
            std::str::from_utf8(body).unwrap(),
            "rated=true&clock.limit=60&clock.increment=0&color=random"
        );
    }
}
