use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url, header};
use serde_json::Value;

use crate::{
    Res, config,
    error::AuthError,
    spotify::prompt::AuthorizationPrompt,
    types::{
        ClientIdentity, Credential, IssuedCredential, ScopeMismatch, ScopeSet, TokenResponse,
    },
    utils, warning,
};

/// Form body of a token endpoint request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenGrant<'a> {
    AuthorizationCode {
        code: &'a str,
        redirect_uri: &'a str,
    },
    RefreshToken {
        refresh_token: &'a str,
    },
}

impl<'a> TokenGrant<'a> {
    pub fn form(&self) -> Vec<(&'static str, &'a str)> {
        match *self {
            TokenGrant::AuthorizationCode { code, redirect_uri } => vec![
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ],
            TokenGrant::RefreshToken { refresh_token } => vec![
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ],
        }
    }
}

/// Server-to-server token endpoint.
///
/// Implementations authenticate as `identity` and return the classified
/// answer. `Err` is reserved for transport failures and unreadable bodies; a
/// provider error travels as [`TokenResponse::Rejected`].
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    async fn request(
        &self,
        identity: &ClientIdentity,
        grant: TokenGrant<'_>,
    ) -> Res<TokenResponse>;
}

/// [`TokenEndpoint`] speaking HTTP to the provider's accounts service.
#[derive(Debug, Clone)]
pub struct HttpTokenEndpoint {
    client: Client,
    token_url: String,
}

impl HttpTokenEndpoint {
    pub fn new(token_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token_url: token_url.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(config::token_url())
    }
}

#[async_trait]
impl TokenEndpoint for HttpTokenEndpoint {
    async fn request(
        &self,
        identity: &ClientIdentity,
        grant: TokenGrant<'_>,
    ) -> Res<TokenResponse> {
        let res = self
            .client
            .post(&self.token_url)
            .header(
                header::AUTHORIZATION,
                utils::basic_auth_header(&identity.client_id, &identity.client_secret),
            )
            .form(&grant.form())
            .send()
            .await?;

        // error answers come with a non-2xx status and a JSON body; read both
        let status = res.status();
        let body = res.text().await?;
        let json: Value = serde_json::from_str(&body).map_err(|e| {
            format!(
                "token endpoint answered {} with an unreadable body: {}",
                status, e
            )
        })?;

        Ok(TokenResponse::from_json(json)?)
    }
}

/// Where an [`AuthorizationFlow`] is in the Authorization Code exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    AwaitingUserRedirect,
    TokenExchange,
    Complete,
    Failed,
}

/// An authorization URL together with the single-use state token embedded
/// in it.
#[derive(Debug)]
pub struct AuthorizationRequest {
    url: String,
    state: String,
}

impl AuthorizationRequest {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> &str {
        &self.state
    }
}

/// Drives one interactive Authorization Code login for `identity`.
///
/// A flow is single-use: once it has completed or failed a new flow (and a
/// new state token) is needed for another attempt.
pub struct AuthorizationFlow<'a> {
    identity: &'a ClientIdentity,
    authorize_url: String,
    state: FlowState,
}

impl<'a> AuthorizationFlow<'a> {
    pub fn new(identity: &'a ClientIdentity, authorize_url: impl Into<String>) -> Self {
        Self {
            identity,
            authorize_url: authorize_url.into(),
            state: FlowState::Idle,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Runs the whole flow: presents the authorization URL, waits for the
    /// callback and exchanges the returned code.
    pub async fn run<P, E>(
        &mut self,
        prompt: &mut P,
        endpoint: &E,
    ) -> Result<IssuedCredential, AuthError>
    where
        P: AuthorizationPrompt + ?Sized,
        E: TokenEndpoint + ?Sized,
    {
        let request = self.begin()?;

        let callback = match prompt.present(request.url()).await {
            Ok(()) => prompt.await_callback().await,
            Err(e) => Err(e),
        };
        let callback = match callback {
            Ok(callback) => callback,
            Err(e) => return Err(self.fail(e)),
        };

        self.complete(request, &callback, endpoint).await
    }

    /// Generates a fresh state token and the authorization URL carrying it.
    pub fn begin(&mut self) -> Result<AuthorizationRequest, AuthError> {
        if self.state != FlowState::Idle {
            return Err(AuthError::Authorization(
                "an authorization flow can only be started once".to_string(),
            ));
        }

        let state = utils::generate_state();
        let url = authorization_url(&self.authorize_url, self.identity, &state)
            .map_err(|e| self.fail(e))?;

        self.state = FlowState::AwaitingUserRedirect;
        Ok(AuthorizationRequest { url, state })
    }

    /// Validates the callback URI against `request` and exchanges its code.
    /// Consumes the request so its state token cannot be checked twice.
    pub async fn complete<E>(
        &mut self,
        request: AuthorizationRequest,
        callback_uri: &str,
        endpoint: &E,
    ) -> Result<IssuedCredential, AuthError>
    where
        E: TokenEndpoint + ?Sized,
    {
        if self.state != FlowState::AwaitingUserRedirect {
            return Err(AuthError::Authorization(
                "no authorization request is pending".to_string(),
            ));
        }

        let code = validate_callback(callback_uri, &request.state).map_err(|e| self.fail(e))?;
        drop(request);

        let identity = self.identity;
        self.state = FlowState::TokenExchange;
        let grant = TokenGrant::AuthorizationCode {
            code: &code,
            redirect_uri: &identity.redirect_uri,
        };
        let response = endpoint
            .request(identity, grant)
            .await
            .map_err(|e| self.fail(AuthError::TokenExchange(e.to_string())))?;

        let issued = issue_credential(response, &identity.scope, None, Utc::now())
            .map_err(|e| self.fail(AuthError::TokenExchange(e)))?;

        self.state = FlowState::Complete;
        Ok(issued)
    }

    fn fail(&mut self, e: AuthError) -> AuthError {
        self.state = FlowState::Failed;
        e
    }
}

/// Authorization endpoint URL for `identity` with the given state token.
pub fn authorization_url(
    authorize_url: &str,
    identity: &ClientIdentity,
    state: &str,
) -> Result<String, AuthError> {
    let scope = identity.scope.to_scope_string();
    let params = [
        ("client_id", identity.client_id.as_str()),
        ("response_type", "code"),
        ("redirect_uri", identity.redirect_uri.as_str()),
        ("state", state),
        ("scope", scope.as_str()),
    ];

    Url::parse_with_params(authorize_url, &params)
        .map(String::from)
        .map_err(|e| {
            AuthError::Authorization(format!(
                "invalid authorization endpoint {}: {}",
                authorize_url, e
            ))
        })
}

/// Checks the redirect the provider sent the user to and extracts the code.
///
/// A reported `error` is surfaced first, before the state is looked at. A
/// missing or different `state` is always fatal.
pub fn validate_callback(callback_uri: &str, expected_state: &str) -> Result<String, AuthError> {
    let url = Url::parse(callback_uri.trim()).map_err(|e| {
        AuthError::Authorization(format!("malformed callback URI {}: {}", callback_uri, e))
    })?;

    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(error) = param("error") {
        return Err(AuthError::Authorization(format!(
            "the provider reported error: {}",
            error
        )));
    }

    match param("state") {
        Some(state) if state == expected_state => {}
        Some(_) => {
            return Err(AuthError::Authorization(
                "returned state does not match the state sent; the login may have been tampered with"
                    .to_string(),
            ));
        }
        None => {
            return Err(AuthError::Authorization(
                "callback carries no state; the login may have been tampered with".to_string(),
            ));
        }
    }

    param("code")
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AuthError::Authorization("callback carries no authorization code".to_string()))
}

/// Turns a token endpoint answer into a credential.
///
/// `previous_refresh_token` is kept when the answer carries no new one. The
/// granted scope is compared as a set against `requested`; when absent from
/// the answer the requested scope is assumed.
pub fn issue_credential(
    response: TokenResponse,
    requested: &ScopeSet,
    previous_refresh_token: Option<&str>,
    issued_at: DateTime<Utc>,
) -> Result<IssuedCredential, String> {
    let granted = match response {
        TokenResponse::Granted(granted) => granted,
        TokenResponse::Rejected(e) => return Err(format!("the provider reported error: {}", e)),
    };

    let refresh_token = granted
        .refresh_token
        .filter(|token| !token.is_empty())
        .or_else(|| previous_refresh_token.map(str::to_string))
        .ok_or_else(|| "response carries no refresh_token".to_string())?;

    if let Some(token_type) = granted
        .token_type
        .as_deref()
        .filter(|t| !t.eq_ignore_ascii_case("bearer"))
    {
        warning!("Unexpected token type {}, sending it as a bearer token", token_type);
    }

    let expires_at = match granted.expires_in {
        0.. => utils::expiry_from(issued_at, granted.expires_in),
        _ => None,
    }
    .ok_or_else(|| format!("invalid expires_in {}", granted.expires_in))?;

    let granted_scope = granted
        .scope
        .as_deref()
        .map(ScopeSet::parse)
        .unwrap_or_else(|| requested.clone());

    let scope_mismatch = if granted_scope != *requested {
        let mismatch = ScopeMismatch {
            requested: requested.clone(),
            granted: granted_scope.clone(),
        };
        warning!("Scopes allowed by the provider differ: {}", mismatch);
        Some(mismatch)
    } else {
        None
    };

    Ok(IssuedCredential {
        credential: Credential {
            access_token: granted.access_token,
            refresh_token,
            expires_at,
        },
        granted_scope,
        scope_mismatch,
    })
}
