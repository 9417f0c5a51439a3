//! `login`, `logout` and `config`.

use serde::Serialize;

use super::Context;
use super::args::ConfigArgs;
use crate::core::request::token_prefix;
use crate::error::{EukError, Result};
use crate::render::human;
use crate::storage::{Config, SessionStore};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResult {
    path: String,
    token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LogoutResult {
    removed: bool,
}

/// Save `value`, or the `--token` flag, as the session token.
///
/// # Errors
/// Returns a validation error when no token was given; I/O errors otherwise.
pub fn login(ctx: &Context, value: Option<String>) -> Result<String> {
    let token = value
        .or_else(|| ctx.config.token.clone())
        .ok_or_else(|| EukError::validation("token", "navedite token: euk login <TOKEN>"))?;

    let store = SessionStore::new(&ctx.config.session_path);
    let session = store.save(&token)?;
    let result = LoginResult {
        path: store.path().display().to_string(),
        token: token_prefix(Some(&session.token)),
    };
    ctx.output.render("login", &result, |r, color| {
        human::render_done(&format!("Prijavljeni ste ({}…), sačuvano u {}", r.token, r.path), color)
    })
}

/// Remove the saved session token.
///
/// # Errors
/// Returns I/O errors from removing the file.
pub fn logout(ctx: &Context) -> Result<String> {
    let removed = SessionStore::new(&ctx.config.session_path).clear()?;
    ctx.backend.client().clear_cache();
    ctx.output.render("logout", &LogoutResult { removed }, |r, color| {
        if r.removed {
            human::render_done("Odjavljeni ste.", color)
        } else {
            human::render_done("Niste bili prijavljeni.", color)
        }
    })
}

/// Print the resolved configuration, optionally creating the config file.
///
/// # Errors
/// Returns I/O errors from writing the default config.
pub fn show_config(ctx: &Context, args: &ConfigArgs) -> Result<String> {
    if args.init && !ctx.config.config_path.exists() {
        Config::default().save_to(&ctx.config.config_path)?;
        tracing::info!(path = %ctx.config.config_path.display(), "default config written");
    }
    ctx.output
        .render("config", &ctx.config.summary(), human::render_config)
}
