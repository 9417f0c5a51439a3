//! `users` and `routes` subcommands.

use serde::Serialize;
use serde_json::json;

use super::Context;
use super::args::{RoutesCommand, UsersCommand};
use crate::core::models::UserFilter;
use crate::error::Result;
use crate::render::human;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessCheck {
    user_id: i64,
    route_id: i64,
    has_access: bool,
}

/// Execute a `users` subcommand.
///
/// # Errors
/// Propagates validation and backend errors. Writes never fall back.
pub async fn users(ctx: &Context, cmd: UsersCommand) -> Result<String> {
    let service = ctx.backend.users();

    let (command, id, message) = match cmd {
        UsersCommand::List {
            page,
            size,
            role,
            active,
            search,
        } => {
            let filter = UserFilter {
                role,
                is_active: active,
                search,
            };
            let page = service.list(page, size, &filter).await?;
            return ctx.output.render("users list", &page, human::render_users);
        }
        UsersCommand::Approve { id } => {
            service.approve(id).await?;
            ("users approve", id, "Korisnik je odobren.".to_string())
        }
        UsersCommand::Reject { id } => {
            service.reject(id).await?;
            ("users reject", id, "Korisnik je odbijen.".to_string())
        }
        UsersCommand::Delete { id } => {
            service.delete(id).await?;
            ("users delete", id, "Korisnik je obrisan.".to_string())
        }
        UsersCommand::SetRole { id, role } => {
            service.set_role(id, &role).await?;
            ("users set-role", id, format!("Uloga promenjena u {}.", role.to_uppercase()))
        }
        UsersCommand::SetLevel { id, level } => {
            service.set_level(id, level).await?;
            ("users set-level", id, format!("Nivo pristupa promenjen u {level}."))
        }
    };

    ctx.output
        .render(command, &json!({ "userId": id, "ok": true }), |_, color| {
            human::render_done(&message, color)
        })
}

/// Execute a `routes` subcommand.
///
/// # Errors
/// Propagates validation and backend errors the endpoint policies do not
/// absorb.
pub async fn routes(ctx: &Context, cmd: RoutesCommand) -> Result<String> {
    let service = ctx.backend.routes();
    let out = &ctx.output;

    let view = match cmd {
        RoutesCommand::List => {
            let routes = service.get_routes().await?;
            return out.render("routes list", &routes, |routes, color| {
                human::render_routes(routes, color)
            });
        }
        RoutesCommand::Check { user, route } => {
            let has_access = service.check_access(user, route).await?;
            let check = AccessCheck {
                user_id: user,
                route_id: route,
                has_access,
            };
            return out.render("routes check", &check, |c, color| {
                let verdict = if c.has_access { "ima" } else { "nema" };
                human::render_done(
                    &format!("Korisnik {} {verdict} pristup ruti {}.", c.user_id, c.route_id),
                    color,
                )
            });
        }
        RoutesCommand::Assignments { user } => service.assignments(user).await?,
        RoutesCommand::Assign { user, route, level } => service.assign(user, route, level).await?,
        RoutesCommand::SetLevel { user, route, level } => {
            service.update_level(user, route, level).await?
        }
        RoutesCommand::Revoke { user, route } => service.revoke(user, route).await?,
    };

    out.render("routes assignments", &view, human::render_assignments)
}
