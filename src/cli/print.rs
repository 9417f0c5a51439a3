//! `print`: envelope and register PDFs from a JSON file of beneficiaries.

use std::path::Path;

use serde_json::Value;

use super::Context;
use super::args::PrintArgs;
use crate::core::Page;
use crate::core::models::{TemplateKind, UgrozenoLiceT1, UgrozenoLiceT2};
use crate::error::{EukError, Result};
use crate::render::human;
use crate::services::DocumentKind;
use crate::services::ugrozena_lica::{LiceRecord, validate_record};

/// Execute the `print` command.
///
/// # Errors
/// Rejects unreadable input and invalid records before any request;
/// propagates backend and I/O errors.
pub async fn execute(ctx: &Context, args: &PrintArgs) -> Result<String> {
    let template = TemplateKind::from(args.template);
    let kind = DocumentKind::from(args.kind);
    let records = load_records(&args.input)?;

    match template {
        TemplateKind::T1 => validate_all::<UgrozenoLiceT1>(&records)?,
        TemplateKind::T2 => validate_all::<UgrozenoLiceT2>(&records)?,
    }

    let saved = ctx
        .backend
        .documents()
        .generate_to_dir(kind, template, records, &args.out)
        .await?;
    ctx.output.render("print", &saved, human::render_saved)
}

/// Read beneficiary records from a JSON array or any paged list shape.
///
/// # Errors
/// Returns I/O errors and a validation error for anything that is not a
/// list of objects.
pub fn load_records(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    let page: Page<Value> = Page::from_value(value, None).map_err(|e| {
        EukError::validation("input", format!("{}: {e}", path.display()))
    })?;
    if page.items.iter().any(|item| !item.is_object()) {
        return Err(EukError::validation(
            "input",
            format!("{}: očekivana lista objekata", path.display()),
        ));
    }
    Ok(page.items)
}

fn validate_all<R: LiceRecord>(records: &[Value]) -> Result<()> {
    for (index, value) in records.iter().enumerate() {
        let record: R = serde_json::from_value(value.clone()).map_err(|e| {
            EukError::validation(format!("ugrozenaLica[{index}]"), e.to_string())
        })?;
        validate_record(&record).map_err(|err| match err {
            EukError::Validation { field, message } => {
                EukError::validation(format!("ugrozenaLica[{index}].{field}"), message)
            }
            other => other,
        })?;
    }
    Ok(())
}
