//! Human-readable output: aligned tables and short status lines.
//!
//! Every function takes `color` explicitly; callers decide it from the
//! resolved config and the terminal.

use colored::Colorize;

use crate::core::Page;
use crate::core::models::{
    GlobalLicenseCheck, GlobalLicenseInfo, GlobalLicenseResponse, Kategorija, Predmet, Route, User,
};
use crate::services::license::{format_end_date, is_expired, is_expiring_soon, status_message};
use crate::services::{LiceRecord, RouteAssignments, SavedDocument};
use crate::storage::ConfigSummary;

// =============================================================================
// Table
// =============================================================================

/// A plain text table with a bold header row.
struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    fn render(&self, color: bool) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let mut out = String::new();
        let header = join_padded(self.headers.iter().copied(), &widths);
        out.push_str(&paint(&header, color, |s| s.bold().to_string()));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&join_padded(row.iter().map(String::as_str), &widths));
            out.push('\n');
        }
        out
    }
}

fn join_padded<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    line.join("  ").trim_end().to_string()
}

fn paint(text: &str, color: bool, style: impl FnOnce(&str) -> String) -> String {
    if color { style(text) } else { text.to_string() }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn page_footer<T>(page: &Page<T>, color: bool) -> String {
    let line = format!(
        "{} od {} (strana: {})",
        page.len(),
        page.total,
        page.total_pages
    );
    paint(&line, color, |s| s.dimmed().to_string())
}

fn empty(label: &str, color: bool) -> String {
    paint(&format!("Nema podataka: {label}.\n"), color, |s| s.dimmed().to_string())
}

// =============================================================================
// Resources
// =============================================================================

#[must_use]
pub fn render_kategorije(items: &[Kategorija], color: bool) -> String {
    if items.is_empty() {
        return empty("kategorije", color);
    }
    let mut table = Table::new(&["ID", "NAZIV"]);
    for k in items {
        table.row(vec![opt(k.kategorija_id), k.naziv.clone()]);
    }
    table.render(color)
}

#[must_use]
pub fn render_kategorija(item: &Kategorija, color: bool) -> String {
    render_kategorije(std::slice::from_ref(item), color)
}

#[must_use]
pub fn render_predmeti(page: &Page<Predmet>, color: bool) -> String {
    if page.is_empty() {
        return empty("predmeti", color);
    }
    let mut table = Table::new(&["ID", "NAZIV", "STATUS", "PRIORITET", "ODGOVORNA OSOBA", "KATEGORIJA"]);
    for p in &page.items {
        table.row(vec![
            opt(p.predmet_id),
            p.naziv_predmeta.clone(),
            p.status.clone(),
            p.prioritet.clone(),
            p.odgovorna_osoba.clone(),
            opt(p.kategorija_naziv.as_deref()),
        ]);
    }
    format!("{}{}\n", table.render(color), page_footer(page, color))
}

#[must_use]
pub fn render_predmet(item: &Predmet, color: bool) -> String {
    let mut out = String::new();
    out.push_str(&paint(&item.naziv_predmeta, color, |s| s.bold().to_string()));
    out.push('\n');
    for (label, value) in [
        ("ID", opt(item.predmet_id)),
        ("Status", item.status.clone()),
        ("Prioritet", item.prioritet.clone()),
        ("Odgovorna osoba", item.odgovorna_osoba.clone()),
        ("Kategorija", opt(item.kategorija_naziv.as_deref())),
        ("Rok", opt(item.rok_za_zavrsetak.as_deref())),
        ("Ugrožena lica", opt(item.broj_ugrozenih_lica)),
    ] {
        out.push_str(&format!("  {label:<16} {value}\n"));
    }
    out
}

#[must_use]
pub fn render_lica<R: LiceRecord>(page: &Page<R>, color: bool) -> String {
    if page.is_empty() {
        return empty("ugrožena lica", color);
    }
    let mut table = Table::new(&["R.BR.", "IME", "PREZIME", "JMBG"]);
    for r in &page.items {
        table.row(vec![
            r.redni_broj().to_string(),
            r.ime().to_string(),
            r.prezime().to_string(),
            r.jmbg().to_string(),
        ]);
    }
    format!(
        "{} {}\n{}{}\n",
        paint("Šablon", color, |s| s.dimmed().to_string()),
        R::KIND,
        table.render(color),
        page_footer(page, color)
    )
}

#[must_use]
pub fn render_lice<R: LiceRecord>(record: &R, color: bool) -> String {
    let name = format!("{} {}", record.ime(), record.prezime());
    format!(
        "{} ({})\n  Redni broj  {}\n  JMBG        {}\n",
        paint(&name, color, |s| s.bold().to_string()),
        R::KIND,
        record.redni_broj(),
        record.jmbg()
    )
}

#[must_use]
pub fn render_users(page: &Page<User>, color: bool) -> String {
    if page.is_empty() {
        return empty("korisnici", color);
    }
    let mut table = Table::new(&["ID", "KORISNIK", "IME I PREZIME", "ULOGA", "NIVO", "STATUS"]);
    for u in &page.items {
        let status = if u.is_active { "aktivan" } else { "na čekanju" };
        table.row(vec![
            u.id.to_string(),
            u.username.clone(),
            u.full_name(),
            u.role.clone(),
            opt(u.nivo_pristupa),
            status.to_string(),
        ]);
    }
    format!("{}{}\n", table.render(color), page_footer(page, color))
}

#[must_use]
pub fn render_routes(routes: &[Route], color: bool) -> String {
    if routes.is_empty() {
        return empty("rute", color);
    }
    let mut table = Table::new(&["ID", "RUTA", "NAZIV", "SEKCIJA", "OPIS"]);
    for r in routes {
        table.row(vec![
            r.id.to_string(),
            r.ruta.clone(),
            r.naziv.clone(),
            r.sekcija.clone(),
            r.opis.clone(),
        ]);
    }
    table.render(color)
}

#[must_use]
pub fn render_assignments(view: &RouteAssignments, color: bool) -> String {
    let mut out = paint(
        &format!("Dodeljene rute (korisnik {})", view.user_id),
        color,
        |s| s.bold().to_string(),
    );
    out.push('\n');
    if view.assigned.is_empty() {
        out.push_str("  -\n");
    } else {
        let mut table = Table::new(&["ID", "RUTA", "NAZIV", "NIVO"]);
        for a in &view.assigned {
            table.row(vec![
                a.route.id.to_string(),
                a.route.ruta.clone(),
                a.route.naziv.clone(),
                opt(a.nivo_dozvola),
            ]);
        }
        out.push_str(&table.render(color));
    }

    out.push('\n');
    out.push_str(&paint("Dostupne rute", color, |s| s.bold().to_string()));
    out.push('\n');
    if view.available.is_empty() {
        out.push_str("  -\n");
    } else {
        out.push_str(&render_routes(&view.available, color));
    }
    out
}

// =============================================================================
// License
// =============================================================================

#[must_use]
pub fn render_license_info(info: &GlobalLicenseInfo, color: bool) -> String {
    let line = status_message(info);
    let styled = if is_expired(info) {
        paint(&line, color, |s| s.red().bold().to_string())
    } else if is_expiring_soon(info) {
        paint(&line, color, |s| s.yellow().to_string())
    } else {
        paint(&line, color, |s| s.green().to_string())
    };
    format!(
        "{styled}\n  Ističe      {}\n  Preostalo   {} dana\n",
        format_end_date(&info.end_date),
        info.days_until_expiry
    )
}

#[must_use]
pub fn render_license_check(check: &GlobalLicenseCheck, color: bool) -> String {
    let mark = if check.has_valid_license {
        paint("✓", color, |s| s.green().to_string())
    } else {
        paint("✗", color, |s| s.red().to_string())
    };
    format!("{mark} {}\n", check.message)
}

#[must_use]
pub fn render_active_license(response: &GlobalLicenseResponse, color: bool) -> String {
    let license = &response.license;
    let state = if license.is_active { "aktivna" } else { "neaktivna" };
    format!(
        "{} #{} ({state})\n  Ključ       {}\n  Važi od     {}\n  Važi do     {}\n",
        paint("Globalna licenca", color, |s| s.bold().to_string()),
        license.id,
        license.license_key,
        format_end_date(&license.start_date),
        format_end_date(&license.end_date)
    )
}

// =============================================================================
// Misc
// =============================================================================

#[must_use]
pub fn render_saved(doc: &SavedDocument, color: bool) -> String {
    format!(
        "{} {} ({} B)\n",
        paint("Sačuvano:", color, |s| s.green().to_string()),
        doc.path.display(),
        doc.bytes
    )
}

#[must_use]
pub fn render_done(message: &str, color: bool) -> String {
    format!("{}\n", paint(message, color, |s| s.green().to_string()))
}

#[must_use]
pub fn render_config(config: &ConfigSummary, color: bool) -> String {
    let sources = &config.sources;
    let mut table = Table::new(&["KLJUČ", "VREDNOST", "IZVOR"]);
    for (key, value, source) in [
        ("api.base_url", config.base_url.clone(), sources.base_url),
        ("api.environment", config.environment.as_str().to_string(), sources.environment),
        ("api.timeout", format!("{}s", config.timeout_seconds), sources.timeout),
        ("api.min_interval", format!("{}ms", config.min_interval_ms), sources.min_interval),
        ("token", opt(config.token.as_deref()), sources.token),
    ] {
        table.row(vec![key.to_string(), value, source.to_string()]);
    }
    for (key, policy) in [
        ("endpoints.license_status", config.policies.license_status),
        ("endpoints.routes", config.policies.routes),
        ("endpoints.users", config.policies.users),
        ("endpoints.user_routes", config.policies.user_routes),
    ] {
        table.row(vec![key.to_string(), policy.as_str().to_string(), "-".to_string()]);
    }
    format!(
        "{}{} {}\n{} {}\n",
        table.render(color),
        paint("Konfiguracija:", color, |s| s.dimmed().to_string()),
        config.config_path.display(),
        paint("Sesija:", color, |s| s.dimmed().to_string()),
        config.session_path.display()
    )
}
