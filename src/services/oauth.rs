//! OAuth provider endpoints and tokens.

use std::str::FromStr;

use crate::error::Error;

/// An access token as returned by a token endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, when the provider reports one.
    pub expires_in: Option<u64>,
}

/// Authorization and token endpoints plus default scopes for a known provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub authorization_url: &'static str,
    pub token_url: &'static str,
    pub scopes: &'static [&'static str],
}

impl OAuthEndpoints {
    pub const GOOGLE: Self = Self {
        authorization_url: "https://accounts.google.com/o/oauth2/auth",
        token_url: "https://accounts.google.com/o/oauth2/token",
        scopes: &["https://www.googleapis.com/auth/userinfo.email"],
    };

    pub const GITHUB: Self = Self {
        authorization_url: "https://github.com/login/oauth/authorize",
        token_url: "https://github.com/login/oauth/access_token",
        scopes: &["user:email"],
    };

    pub const FACEBOOK: Self = Self {
        authorization_url: "https://www.facebook.com/v8.0/dialog/oauth",
        token_url: "https://graph.facebook.com/v8.0/oauth/access_token",
        scopes: &["email"],
    };

    /// Endpoints for `google`, `github` or `facebook`. Anything else is a
    /// configuration error.
    pub fn for_provider(name: &str) -> Result<Self, Error> {
        match name {
            "google" => Ok(Self::GOOGLE),
            "github" => Ok(Self::GITHUB),
            "facebook" => Ok(Self::FACEBOOK),
            _ => Err(Error::UnsupportedProvider { service: "oauth", name: name.to_owned() }),
        }
    }
}

impl FromStr for OAuthEndpoints {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::for_provider(s)
    }
}
