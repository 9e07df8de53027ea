#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use reqwest::Url;
use streamlib::{
    AuthError, Res,
    spotify::{AuthorizationPrompt, TokenEndpoint, TokenGrant},
    types::{ClientIdentity, GrantedToken, ProviderError, ScopeSet, TokenResponse},
};

pub const AUTHORIZE_URL: &str = "https://accounts.example.com/authorize";

pub fn identity(scope: &str) -> ClientIdentity {
    ClientIdentity::new("x", "y", "http://localhost/cb", ScopeSet::parse(scope))
}

pub fn granted(access: &str, refresh: Option<&str>, expires_in: i64, scope: Option<&str>) -> TokenResponse {
    TokenResponse::Granted(GrantedToken {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        expires_in,
        scope: scope.map(str::to_string),
        token_type: Some("Bearer".to_string()),
    })
}

pub fn rejected(error: &str) -> TokenResponse {
    TokenResponse::Rejected(ProviderError {
        error: error.to_string(),
        error_description: None,
    })
}

/// Token endpoint answering from a script and counting its calls.
#[derive(Default)]
pub struct FakeEndpoint {
    responses: Mutex<VecDeque<Res<TokenResponse>>>,
    forms: Mutex<Vec<Vec<(String, String)>>>,
    calls: AtomicUsize,
}

impl FakeEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: TokenResponse) -> Self {
        self.push(Ok(response));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Err(message.to_string().into()));
        self
    }

    fn push(&self, response: Res<TokenResponse>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Form bodies of every request, in call order.
    pub fn forms(&self) -> Vec<Vec<(String, String)>> {
        self.forms.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenEndpoint for FakeEndpoint {
    async fn request(&self, _identity: &ClientIdentity, grant: TokenGrant<'_>) -> Res<TokenResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.forms.lock().unwrap().push(
            grant
                .form()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("unexpected token endpoint call".into()))
    }
}

/// How a [`ScriptedPrompt`] answers the authorization URL.
#[derive(Clone, Copy)]
pub enum Redirect {
    /// Echo the state token with this code.
    Code(&'static str),
    /// Use a state token other than the one sent.
    WrongState,
    /// Leave the state token out.
    NoState,
    /// Report a provider error together with the right state.
    Error(&'static str),
    /// Report a provider error and a wrong state.
    ErrorWithWrongState(&'static str),
}

/// Prompt that plays the user's browser: it reads the state from the URL it
/// is shown and redirects the way it was scripted to.
pub struct ScriptedPrompt {
    redirect: Redirect,
    presented: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(redirect: Redirect) -> Self {
        Self {
            redirect,
            presented: Vec::new(),
        }
    }

    pub fn presented(&self) -> &[String] {
        &self.presented
    }
}

pub fn query_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

#[async_trait]
impl AuthorizationPrompt for ScriptedPrompt {
    async fn present(&mut self, authorization_url: &str) -> Result<(), AuthError> {
        self.presented.push(authorization_url.to_string());
        Ok(())
    }

    async fn await_callback(&mut self) -> Result<String, AuthError> {
        let url = self
            .presented
            .last()
            .ok_or_else(|| AuthError::Prompt("nothing presented".to_string()))?;
        let state = query_param(url, "state").unwrap_or_default();

        Ok(match self.redirect {
            Redirect::Code(code) => format!("http://localhost/cb?code={}&state={}", code, state),
            Redirect::WrongState => "http://localhost/cb?code=abc&state=forged".to_string(),
            Redirect::NoState => "http://localhost/cb?code=abc".to_string(),
            Redirect::Error(error) => format!("http://localhost/cb?error={}&state={}", error, state),
            Redirect::ErrorWithWrongState(error) => {
                format!("http://localhost/cb?error={}&state=forged", error)
            }
        })
    }
}
