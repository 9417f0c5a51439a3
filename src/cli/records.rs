//! `kategorije`, `predmeti` and `lica` subcommands.

use serde_json::json;

use super::Context;
use super::args::{KategorijeCommand, LicaCommand, PredmetiCommand, SchemaArg, SearchArgs};
use crate::core::models::{UgrozenoLiceT1, UgrozenoLiceT2};
use crate::error::Result;
use crate::render::human;
use crate::services::LiceRecord;
use crate::services::T1SearchFilters;
use crate::services::predmeti::PredmetQuery;

/// Execute a `kategorije` subcommand.
///
/// # Errors
/// Propagates validation and backend errors.
pub async fn kategorije(ctx: &Context, cmd: KategorijeCommand) -> Result<String> {
    let service = ctx.backend.kategorije();
    let out = &ctx.output;

    match cmd {
        KategorijeCommand::List => {
            let items = service.list().await?;
            out.render("kategorije list", &items, |items, color| {
                human::render_kategorije(items, color)
            })
        }
        KategorijeCommand::Create { naziv } => {
            let created = service.create(&naziv).await?;
            out.render("kategorije create", &created, human::render_kategorija)
        }
        KategorijeCommand::Update { id, naziv } => {
            let updated = service.update(id, &naziv).await?;
            out.render("kategorije update", &updated, human::render_kategorija)
        }
        KategorijeCommand::Delete { id } => {
            service.delete(id).await?;
            deleted(ctx, "kategorije delete", id)
        }
    }
}

/// Execute a `predmeti` subcommand.
///
/// # Errors
/// Propagates validation and backend errors.
pub async fn predmeti(ctx: &Context, cmd: PredmetiCommand) -> Result<String> {
    let service = ctx.backend.predmeti();
    let out = &ctx.output;

    match cmd {
        PredmetiCommand::List {
            page,
            size,
            status,
            prioritet,
            kategorija_id,
            search,
        } => {
            let query = PredmetQuery {
                page,
                size,
                status,
                prioritet,
                kategorija_id,
                search,
            };
            let page = service.list(&query).await?;
            out.render("predmeti list", &page, human::render_predmeti)
        }
        PredmetiCommand::Get { id } => {
            let predmet = service.get(id).await?;
            out.render("predmeti get", &predmet, human::render_predmet)
        }
        PredmetiCommand::Delete { id } => {
            service.delete(id).await?;
            deleted(ctx, "predmeti delete", id)
        }
    }
}

/// Execute a `lica` subcommand.
///
/// # Errors
/// Propagates validation and backend errors.
pub async fn lica(ctx: &Context, cmd: LicaCommand) -> Result<String> {
    match cmd {
        LicaCommand::List { schema, page, size } => match schema {
            SchemaArg::T1 => list::<UgrozenoLiceT1>(ctx, page, size).await,
            SchemaArg::T2 => list::<UgrozenoLiceT2>(ctx, page, size).await,
        },
        LicaCommand::Get { schema, id } => match schema {
            SchemaArg::T1 => get::<UgrozenoLiceT1>(ctx, id).await,
            SchemaArg::T2 => get::<UgrozenoLiceT2>(ctx, id).await,
        },
        LicaCommand::Delete { schema, id } => {
            match schema {
                SchemaArg::T1 => ctx.backend.lica::<UgrozenoLiceT1>().delete(id).await?,
                SchemaArg::T2 => ctx.backend.lica::<UgrozenoLiceT2>().delete(id).await?,
            }
            deleted(ctx, "lica delete", id)
        }
        LicaCommand::Search(args) => search(ctx, args).await,
        LicaCommand::Count => {
            let count = ctx.backend.lica::<UgrozenoLiceT2>().count().await?;
            ctx.output
                .render("lica count", &json!({ "count": count }), |_, _| {
                    format!("T2 ugroženih lica: {count}\n")
                })
        }
    }
}

async fn list<R: LiceRecord>(ctx: &Context, page: u32, size: u32) -> Result<String> {
    let page = ctx.backend.lica::<R>().list(page, size).await?;
    ctx.output.render("lica list", &page, human::render_lica::<R>)
}

async fn get<R: LiceRecord>(ctx: &Context, id: i64) -> Result<String> {
    let record = ctx.backend.lica::<R>().get(id).await?;
    ctx.output.render("lica get", &record, human::render_lice::<R>)
}

async fn search(ctx: &Context, args: SearchArgs) -> Result<String> {
    let filters = T1SearchFilters {
        ime: args.ime,
        prezime: args.prezime,
        jmbg: args.jmbg,
        grad_opstina: args.grad_opstina,
        osnov_statusa: args.osnov_statusa,
        ed_broj: args.ed_broj,
        ..T1SearchFilters::default()
    };
    let page = ctx
        .backend
        .lica::<UgrozenoLiceT1>()
        .search(&filters, args.page, args.size)
        .await?;
    ctx.output.render("lica search", &page, human::render_lica::<UgrozenoLiceT1>)
}

fn deleted(ctx: &Context, command: &str, id: i64) -> Result<String> {
    ctx.output
        .render(command, &json!({ "deleted": id }), |_, color| {
            human::render_done(&format!("Obrisano (ID {id})."), color)
        })
}
