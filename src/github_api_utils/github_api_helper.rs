use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode, Url};

use super::list_repos_api_response::Repo;
use super::repos_report::{PageRequest, RepoPageSource};
use crate::config::GithubConfig;
use crate::error::{KataError, Result};

const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Creates the standard github api request headers:
/// 1. **accept**, the github json media type.
/// 2. **X-GitHub-Api-Version**, github api version.
/// 3. **user-agent**, from *GH_API_USER_AGENT* (github rejects requests without one).
/// 4. **authorization**, only if *GH_API_KEY* is set.
fn get_requests_headers(config: &GithubConfig) -> Result<HeaderMap> {
    let invalid = |name: &str| KataError::Config {
        message: format!("'{name}' is not a valid header value"),
    };

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
    headers.insert(
        "X-GitHub-Api-Version",
        HeaderValue::from_static(GITHUB_API_VERSION),
    );
    headers.insert(
        USER_AGENT,
        config
            .user_agent
            .parse()
            .map_err(|_| invalid("GH_API_USER_AGENT"))?,
    );
    if let Some(token) = &config.token {
        let mut value: HeaderValue = format!("Bearer {token}")
            .parse()
            .map_err(|_| invalid("GH_API_KEY"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// Reads *x-ratelimit-reset* (unix seconds) if github sent it.
fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let timestamp = headers
        .get("x-ratelimit-reset")?
        .to_str()
        .ok()?
        .parse::<i64>()
        .ok()?;
    Utc.timestamp_opt(timestamp, 0).single()
}

/// 403 is github's answer once the request quota is used up,
/// every other non-success status is reported as is.
fn handle_response_status(status: StatusCode, headers: &HeaderMap) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::FORBIDDEN {
        let reset_at = rate_limit_reset(headers);
        if let Some(remaining) = headers.get("x-ratelimit-remaining") {
            warn!("GitHub rate limit remaining: {:?}", remaining);
        }
        return Err(KataError::RateLimited {
            service: "GitHub",
            reset_at,
        });
    }
    error!("Request failed: {}", status);
    Err(KataError::from_status(status))
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url).map_err(|err| KataError::Config {
        message: format!("invalid GitHub base url '{base_url}': {err}"),
    })?;
    if url.cannot_be_a_base() {
        return Err(KataError::Config {
            message: format!("'{base_url}' can't be used as GitHub base url"),
        });
    }
    Ok(url)
}

/// `{base_url}/users/{username}/repos`, with the username escaped as a single path segment.
fn repos_url(base_url: &Url, username: &str) -> Result<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| KataError::Config {
            message: format!("'{base_url}' can't be used as GitHub base url"),
        })?
        .pop_if_empty()
        .extend(["users", username, "repos"]);
    Ok(url)
}

pub struct GithubClient {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
}

impl GithubClient {
    pub fn new(client: Client, config: &GithubConfig) -> Result<Self> {
        Ok(GithubClient {
            client,
            base_url: parse_base_url(&config.base_url)?,
            headers: get_requests_headers(config)?,
        })
    }
}

impl RepoPageSource for GithubClient {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<Repo>> {
        let url = repos_url(&self.base_url, request.username)?;
        debug!(
            "Requesting page {} of {} ({} per page)",
            request.page_number, request.username, request.page_size
        );

        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .query(&[
                ("per_page", request.page_size),
                ("page", request.page_number),
            ])
            .send()
            .await?;

        handle_response_status(response.status(), response.headers())?;
        info!("Request successful: {}", response.status());

        let response_body = response.text().await?;
        let repositories: Vec<Repo> = serde_json::from_str(&response_body)?;
        Ok(repositories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github_api_utils::repos_report::{fetch_all, RepoListing};
    use axum::{
        extract::{Path, Query},
        http::{HeaderMap as AxumHeaderMap, StatusCode as AxumStatusCode},
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use std::collections::HashMap;
    use std::time::Duration;

    const TOTAL_REPOS: u32 = 45;

    /// Fake `/users/:username/repos`: octocat owns 45 repos, ghost none,
    /// limited is rate limited, broken returns objects without a name.
    async fn list_repos(
        Path(username): Path<String>,
        Query(params): Query<HashMap<String, String>>,
        headers: AxumHeaderMap,
    ) -> Response {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("");
        if header("accept") != GITHUB_MEDIA_TYPE || header("x-github-api-version") != GITHUB_API_VERSION {
            return AxumStatusCode::BAD_REQUEST.into_response();
        }
        if header("user-agent").is_empty() {
            return AxumStatusCode::FORBIDDEN.into_response();
        }

        let per_page: u32 = params.get("per_page").and_then(|v| v.parse().ok()).unwrap_or(30);
        let page: u32 = params.get("page").and_then(|v| v.parse().ok()).unwrap_or(1);

        match username.as_str() {
            "octocat" => {
                let start = (page - 1) * per_page;
                let end = (start + per_page).min(TOTAL_REPOS);
                let repos: Vec<serde_json::Value> = (start..end)
                    .map(|i| serde_json::json!({ "id": i, "name": format!("repo-{i}"), "private": false }))
                    .collect();
                Json(repos).into_response()
            }
            "ghost" => Json(Vec::<serde_json::Value>::new()).into_response(),
            "limited" => (
                AxumStatusCode::FORBIDDEN,
                [("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", "1700000000")],
                "API rate limit exceeded",
            )
                .into_response(),
            "broken" => Json(serde_json::json!([{ "id": 1 }])).into_response(),
            _ => AxumStatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn spawn_fake_github() -> String {
        let app = Router::new().route("/users/:username/repos", get(list_repos));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(base_url: String) -> GithubClient {
        let config = GithubConfig {
            base_url,
            user_agent: String::from("katapy-tests"),
            token: None,
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        GithubClient::new(client, &config).unwrap()
    }

    #[test]
    fn headers_include_token_only_when_configured() {
        let mut config = GithubConfig {
            base_url: String::from("http://localhost"),
            user_agent: String::from("katapy"),
            token: None,
        };
        let headers = get_requests_headers(&config).unwrap();
        assert_eq!(headers[ACCEPT], GITHUB_MEDIA_TYPE);
        assert_eq!(headers["X-GitHub-Api-Version"], GITHUB_API_VERSION);
        assert_eq!(headers[USER_AGENT], "katapy");
        assert!(headers.get(AUTHORIZATION).is_none());

        config.token = Some(String::from("t0ken"));
        let headers = get_requests_headers(&config).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer t0ken");
    }

    #[test]
    fn invalid_user_agent_is_a_config_error() {
        let config = GithubConfig {
            base_url: String::from("http://localhost"),
            user_agent: String::from("bad\nagent"),
            token: None,
        };
        assert!(matches!(
            get_requests_headers(&config),
            Err(KataError::Config { .. })
        ));
    }

    #[test]
    fn forbidden_is_rate_limit_with_reset_time() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));

        match handle_response_status(StatusCode::FORBIDDEN, &headers) {
            Err(KataError::RateLimited { service, reset_at }) => {
                assert_eq!(service, "GitHub");
                assert_eq!(reset_at.map(|r| r.timestamp()), Some(1_700_000_000));
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[test]
    fn other_statuses_keep_code_and_reason() {
        let err = handle_response_status(StatusCode::SERVICE_UNAVAILABLE, &HeaderMap::new())
            .unwrap_err();
        match err {
            KataError::HttpStatus { code, reason } => {
                assert_eq!(code, 503);
                assert_eq!(reason, "Service Unavailable");
            }
            other => panic!("expected http status error, got {other:?}"),
        }
        assert!(handle_response_status(StatusCode::OK, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn username_is_a_single_escaped_segment() {
        let base = parse_base_url("http://localhost:8080/api/").unwrap();

        let url = repos_url(&base, "nobody/../octocat").unwrap();
        assert_eq!(url.path(), "/api/users/nobody%2F..%2Foctocat/repos");
        assert_eq!(url.query(), None);

        let url = repos_url(&base, "ghost?x=#frag").unwrap();
        assert_eq!(url.path(), "/api/users/ghost%3Fx=%23frag/repos");
        assert_eq!(url.fragment(), None);

        let root = parse_base_url("https://api.github.com").unwrap();
        assert_eq!(
            repos_url(&root, "octocat").unwrap().as_str(),
            "https://api.github.com/users/octocat/repos"
        );
    }

    #[test]
    fn unusable_base_url_is_a_config_error() {
        assert!(matches!(parse_base_url("not a url"), Err(KataError::Config { .. })));
        assert!(matches!(parse_base_url("mailto:me@example.com"), Err(KataError::Config { .. })));
    }

    #[tokio::test]
    async fn path_characters_do_not_reach_another_user() {
        let github = client_for(spawn_fake_github().await);

        for username in ["nobody/../octocat", "ghost?x=", "octocat#"] {
            let request = PageRequest {
                username,
                page_size: 20,
                page_number: 1,
            };
            let err = github.fetch_page(&request).await.unwrap_err();
            assert!(
                matches!(err, KataError::HttpStatus { code: 404, .. }),
                "{username}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn fetches_requested_page() {
        let github = client_for(spawn_fake_github().await);

        let request = PageRequest {
            username: "octocat",
            page_size: 20,
            page_number: 2,
        };
        let repos = github.fetch_page(&request).await.unwrap();

        assert_eq!(repos.len(), 20);
        assert_eq!(repos[0].name, "repo-20");
        assert_eq!(repos[19].name, "repo-39");
    }

    #[tokio::test]
    async fn fetch_all_walks_every_page() {
        let github = client_for(spawn_fake_github().await);

        let names = fetch_all(&github, "octocat").await.unwrap().into_names();

        assert_eq!(names.len(), 45);
        assert_eq!(names.first().map(String::as_str), Some("repo-0"));
        assert_eq!(names.last().map(String::as_str), Some("repo-44"));
    }

    #[tokio::test]
    async fn fetch_all_detects_user_without_repositories() {
        let github = client_for(spawn_fake_github().await);

        let listing = fetch_all(&github, "ghost").await.unwrap();

        assert_eq!(listing, RepoListing::NoRepositories);
    }

    #[tokio::test]
    async fn forbidden_response_surfaces_rate_limit() {
        let github = client_for(spawn_fake_github().await);

        let err = fetch_all(&github, "limited").await.unwrap_err();

        assert!(matches!(
            err,
            KataError::RateLimited {
                service: "GitHub",
                reset_at: Some(_)
            }
        ));
    }

    #[tokio::test]
    async fn unknown_user_is_http_status_error() {
        let github = client_for(spawn_fake_github().await);

        let err = fetch_all(&github, "nobody").await.unwrap_err();

        assert!(matches!(err, KataError::HttpStatus { code: 404, .. }));
    }

    #[tokio::test]
    async fn record_without_name_is_decode_error() {
        let github = client_for(spawn_fake_github().await);

        let err = fetch_all(&github, "broken").await.unwrap_err();

        assert!(matches!(err, KataError::Decode(_)));
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let github = client_for(format!("http://{addr}"));

        let err = fetch_all(&github, "octocat").await.unwrap_err();

        assert!(matches!(err, KataError::Network(_)));
        assert!(err.is_fatal());
    }
}
