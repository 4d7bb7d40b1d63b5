//! Auth command - log in and print the token.

use anyhow::Result;
use clap::Args;
use forcelink_config::Credentials;
use serde_json::json;

use super::Context;

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    /// Username (defaults to the configured one)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password (defaults to the configured one or FORCELINK_PASSWORD)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Use the OAuth JWT bearer flow
    #[arg(long)]
    pub jwt: bool,

    /// User to act as in the JWT bearer flow
    #[arg(long)]
    pub act_as: Option<String>,
}

impl AuthArgs {
    fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            use_oauth_jwt_flow: self.jwt.then_some(true),
            act_as_username: self.act_as.clone(),
            ..Credentials::default()
        }
    }
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    let credentials = args.credentials();
    super::run_with_connector(ctx, |connector| async move {
        let response = connector.authenticate(Some(&credentials)).await?;
        let sentinel = &response.auth == connector.sentinel();
        Ok(json!({ "auth": response.auth, "jwtBearer": sentinel }))
    })
    .await
}
