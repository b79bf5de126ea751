use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{
    Client, Method, RequestBuilder,
    multipart::{Form, Part},
};
use serde::{Serialize, de::DeserializeOwned, de::IgnoredAny};
use tracing::debug;
use url::Url;

use crate::dto::{
    auth::{AuthStatus, LoginOutcome, MachineStatus},
    envelope::{Ack, ApiEnvelope},
    match_info::MatchInfo,
    player::{Group, Player, PlayerFilter},
    ranking::RankingItem,
    requests::{
        LoginRequest, NameRequest, RedeemCardRequest, RegisterRequest, SubmitPeakSongRequest,
        SubmitScoreRequest,
    },
    song_draw::SongDrawState,
};

use super::{RemoteError, RemoteResult, TournamentApi};

/// [`TournamentApi`] implementation speaking JSON over HTTP.
#[derive(Clone)]
pub struct HttpTournamentApi {
    client: Client,
    base_url: Arc<Url>,
}

impl HttpTournamentApi {
    /// Build a client for the service rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| RemoteError::ClientBuilder { source })?;

        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|source| RemoteError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;

        Ok(Self {
            client,
            base_url: Arc::new(base_url),
        })
    }

    fn request(&self, method: Method, path: &str) -> RemoteResult<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .map_err(|source| RemoteError::InvalidBaseUrl {
                url: format!("{}{}", self.base_url, path),
                source,
            })?;
        Ok(self.client.request(method, url))
    }

    async fn execute<T>(&self, builder: RequestBuilder, path: &str) -> RemoteResult<ApiEnvelope<T>>
    where
        T: DeserializeOwned,
    {
        let response = builder
            .send()
            .await
            .map_err(|source| RemoteError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| RemoteError::ReadBody {
                path: path.to_string(),
                source,
            })?;

        match serde_json::from_slice::<ApiEnvelope<T>>(&bytes) {
            Ok(envelope) if envelope.success => Ok(envelope),
            Ok(envelope) => {
                debug!(path, code = envelope.code, "request rejected by the service");
                Err(RemoteError::Rejected {
                    code: envelope.code,
                    message: envelope.message,
                })
            }
            Err(_) if !status.is_success() => Err(RemoteError::RequestStatus {
                path: path.to_string(),
                status,
            }),
            Err(source) => Err(RemoteError::DecodeResponse {
                path: path.to_string(),
                source,
            }),
        }
    }

    async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> RemoteResult<ApiEnvelope<T>>
    where
        T: DeserializeOwned,
    {
        let builder = self.request(Method::GET, path)?.query(query);
        self.execute(builder, path).await
    }

    async fn post<B, T>(&self, path: &str, body: Option<&B>) -> RemoteResult<ApiEnvelope<T>>
    where
        B: ?Sized + Serialize,
        T: DeserializeOwned,
    {
        let mut builder = self.request(Method::POST, path)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(builder, path).await
    }

    async fn post_ack<B>(&self, path: &str, body: Option<&B>) -> RemoteResult<Ack>
    where
        B: ?Sized + Serialize,
    {
        let envelope = self.post::<B, IgnoredAny>(path, body).await?;
        Ok(Ack::empty(envelope.message))
    }

    async fn register_multipart(&self, request: RegisterRequest) -> RemoteResult<LoginOutcome> {
        const PATH: &str = "auth/register";
        let mut form = Form::new()
            .text("name", request.name)
            .text("password", request.password);

        if let Some(avatar) = request.avatar {
            let part = Part::bytes(avatar.bytes)
                .file_name(avatar.file_name)
                .mime_str(&avatar.mime)
                .map_err(|source| RemoteError::RequestSend {
                    path: PATH.to_string(),
                    source,
                })?;
            form = form.part("avatar", part);
        }

        let builder = self.request(Method::POST, PATH)?.multipart(form);
        Ok(login_outcome(self.execute(builder, PATH).await?))
    }
}

/// Login and registration accept either an outcome payload or a bare
/// successful envelope carrying only a message.
fn login_outcome(envelope: ApiEnvelope<LoginOutcome>) -> LoginOutcome {
    let message = envelope.message;
    envelope.data.unwrap_or_else(|| LoginOutcome {
        success: true,
        msg: message.unwrap_or_default(),
    })
}

/// Extract the payload of a successful envelope that must carry one.
fn required<T>(envelope: ApiEnvelope<T>, path: &str) -> RemoteResult<T> {
    envelope.data.ok_or_else(|| RemoteError::MissingData {
        path: path.to_string(),
    })
}

fn player_path(id: u32, suffix: &str) -> String {
    if suffix.is_empty() {
        format!("v1/player/{id}")
    } else {
        format!("v1/player/{id}/{suffix}")
    }
}

impl TournamentApi for HttpTournamentApi {
    fn check_status(&self, name: String) -> BoxFuture<'static, RemoteResult<AuthStatus>> {
        let api = self.clone();
        Box::pin(async move {
            const PATH: &str = "auth/check_status";
            let envelope = api.post(PATH, Some(&NameRequest { name })).await?;
            required(envelope, PATH)
        })
    }

    fn login(&self, request: LoginRequest) -> BoxFuture<'static, RemoteResult<LoginOutcome>> {
        let api = self.clone();
        Box::pin(async move {
            const PATH: &str = "auth/login";
            let envelope = api.post(PATH, Some(&request)).await?;
            Ok(login_outcome(envelope))
        })
    }

    fn register(&self, request: RegisterRequest) -> BoxFuture<'static, RemoteResult<LoginOutcome>> {
        let api = self.clone();
        Box::pin(async move { api.register_multipart(request).await })
    }

    fn check_in(&self, name: String) -> BoxFuture<'static, RemoteResult<Ack<Player>>> {
        let api = self.clone();
        Box::pin(async move {
            const PATH: &str = "v1/player/checkin";
            let envelope: ApiEnvelope<Player> = api.post(PATH, Some(&NameRequest { name })).await?;
            let message = envelope.message.clone();
            Ok(Ack {
                data: required(envelope, PATH)?,
                message,
            })
        })
    }

    fn player(&self, id: u32) -> BoxFuture<'static, RemoteResult<Player>> {
        let api = self.clone();
        Box::pin(async move {
            let path = player_path(id, "");
            let envelope = api.get(&path, &[]).await?;
            required(envelope, &path)
        })
    }

    fn search_player(&self, name: String) -> BoxFuture<'static, RemoteResult<Player>> {
        let api = self.clone();
        Box::pin(async move {
            const PATH: &str = "v1/player/search";
            let envelope = api.get(PATH, &[("name", name)]).await?;
            required(envelope, PATH)
        })
    }

    fn list_players(&self, filter: PlayerFilter) -> BoxFuture<'static, RemoteResult<Vec<Player>>> {
        let api = self.clone();
        Box::pin(async move {
            const PATH: &str = "v1/players";
            let mut query = Vec::new();
            if let Some(group) = filter.group {
                query.push(("group", group.as_str().to_string()));
            }
            if let Some(checked_in) = filter.checked_in {
                query.push(("checked_in", checked_in.to_string()));
            }
            let envelope: ApiEnvelope<Vec<Player>> = api.get(PATH, &query).await?;
            Ok(envelope.data.unwrap_or_default())
        })
    }

    fn toggle_machine(&self, id: u32) -> BoxFuture<'static, RemoteResult<Ack<MachineStatus>>> {
        let api = self.clone();
        Box::pin(async move {
            let path = player_path(id, "toggle_machine");
            let envelope = api.post::<(), MachineStatus>(&path, None).await?;
            let message = envelope.message.clone();
            Ok(Ack {
                data: required(envelope, &path)?,
                message,
            })
        })
    }

    fn submit_score(
        &self,
        id: u32,
        request: SubmitScoreRequest,
    ) -> BoxFuture<'static, RemoteResult<Ack>> {
        let api = self.clone();
        Box::pin(async move {
            api.post_ack(&player_path(id, "submit_score"), Some(&request))
                .await
        })
    }

    fn forfeit(&self, id: u32) -> BoxFuture<'static, RemoteResult<Ack>> {
        let api = self.clone();
        Box::pin(async move { api.post_ack::<()>(&player_path(id, "forfeit"), None).await })
    }

    fn player_match(&self, id: u32) -> BoxFuture<'static, RemoteResult<Option<MatchInfo>>> {
        let api = self.clone();
        Box::pin(async move {
            let envelope = api.get(&player_path(id, "match"), &[]).await?;
            Ok(envelope.data)
        })
    }

    fn submit_peak_song(
        &self,
        id: u32,
        request: SubmitPeakSongRequest,
    ) -> BoxFuture<'static, RemoteResult<Ack>> {
        let api = self.clone();
        Box::pin(async move {
            api.post_ack(&player_path(id, "peak/submit_song"), Some(&request))
                .await
        })
    }

    fn ban_peak_song(&self, id: u32) -> BoxFuture<'static, RemoteResult<Ack>> {
        let api = self.clone();
        Box::pin(async move {
            api.post_ack::<()>(&player_path(id, "peak/ban_song"), None)
                .await
        })
    }

    fn redeem_card(
        &self,
        id: u32,
        request: RedeemCardRequest,
    ) -> BoxFuture<'static, RemoteResult<Ack>> {
        let api = self.clone();
        Box::pin(async move {
            api.post_ack(&player_path(id, "redeem_card"), Some(&request))
                .await
        })
    }

    fn rankings(&self, group: Option<Group>) -> BoxFuture<'static, RemoteResult<Vec<RankingItem>>> {
        let api = self.clone();
        Box::pin(async move {
            const PATH: &str = "v1/rankings";
            let query: Vec<_> = group
                .map(|group| ("group", group.as_str().to_string()))
                .into_iter()
                .collect();
            let envelope: ApiEnvelope<Vec<RankingItem>> = api.get(PATH, &query).await?;
            Ok(envelope.data.unwrap_or_default())
        })
    }

    fn song_draw_state(&self) -> BoxFuture<'static, RemoteResult<SongDrawState>> {
        let api = self.clone();
        Box::pin(async move {
            const PATH: &str = "v1/song_draw/state";
            let envelope = api.get(PATH, &[]).await?;
            required(envelope, PATH)
        })
    }
}
