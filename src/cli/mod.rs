//! Interactive console commands. Parsing is separate from execution so the
//! REPL loop in `main` stays a thin shell around `execute`.

pub mod table;

use std::path::PathBuf;

use serde_json::Value;

use crate::app::App;
use crate::error::{AppError, AppResult};
use crate::identity::{catalog, PermissionRef};
use crate::routes::{RouteMatch, View};
use crate::services::{export_file_name, CaseQuery, DashboardFilters, ExportFormat};

pub const HELP: &str = "\
comandos:
  login <email> <contraseña>   iniciar sesión
  logout                       cerrar sesión
  go <ruta>                    navegar (p.ej. /expedientes/12)
  back                         volver a la ubicación anterior
  whoami                       usuario, rol y permisos de la sesión
  can <id|nombre>              comprobar un permiso
  menu                         opciones del menú lateral
  get <ruta-api>               GET crudo contra la API
  approve <id>                 aprobar un expediente
  reject <id> <motivo...>      rechazar un expediente
  export <json|csv> [dir]      exportar el reporte del dashboard
  status                       ubicación, vista y sesión
  help                         esta ayuda
  quit | exit                  salir";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Logout,
    Go(String),
    Back,
    WhoAmI,
    Can(PermissionRef),
    Menu,
    Get(String),
    Approve(u64),
    Reject { id: u64, reason: String },
    Export { format: ExportFormat, dir: Option<PathBuf> },
    Status,
    Help,
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let args: Vec<&str> = rest.split_whitespace().collect();
    let cmd = match head.to_ascii_lowercase().as_str() {
        "" => Command::Empty,
        "login" => match args.as_slice() {
            [email, password] => Command::Login { email: email.to_string(), password: password.to_string() },
            _ => return Err("uso: login <email> <contraseña>".into()),
        },
        "logout" => Command::Logout,
        "go" | "cd" => {
            if rest.is_empty() { return Err("uso: go <ruta>".into()); }
            let path = if rest.starts_with('/') { rest.to_string() } else { format!("/{}", rest) };
            Command::Go(path)
        }
        "back" => Command::Back,
        "whoami" => Command::WhoAmI,
        "can" => {
            if rest.is_empty() { return Err("uso: can <id|nombre>".into()); }
            Command::Can(rest.parse().unwrap_or_else(|_| PermissionRef::Name(rest.to_string())))
        }
        "menu" => Command::Menu,
        "get" => {
            if rest.is_empty() { return Err("uso: get <ruta-api>".into()); }
            Command::Get(rest.to_string())
        }
        "approve" => Command::Approve(parse_id(args.first().copied())?),
        "reject" => {
            let id = parse_id(args.first().copied())?;
            let reason = args.get(1..).map(|r| r.join(" ")).unwrap_or_default();
            Command::Reject { id, reason }
        }
        "export" => {
            let format = args.first().and_then(|f| ExportFormat::parse(f)).ok_or("uso: export <json|csv> [dir]")?;
            Command::Export { format, dir: args.get(1).map(PathBuf::from) }
        }
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("comando desconocido: {} (escriba help)", other)),
    };
    Ok(cmd)
}

fn parse_id(arg: Option<&str>) -> Result<u64, String> {
    arg.and_then(|s| s.parse().ok()).ok_or_else(|| "se esperaba un id numérico".to_string())
}

/// What the REPL should show after a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    /// Payload to print as a table when list-shaped, else as JSON.
    Data { heading: String, data: Value },
    Quit,
    Nothing,
}

fn describe(route: &RouteMatch) -> String {
    format!("{} [{}]", route.view.title(), route.location)
}

pub async fn execute(app: &App, cmd: Command) -> AppResult<Reply> {
    match cmd {
        Command::Empty => Ok(Reply::Nothing),
        Command::Help => Ok(Reply::Text(HELP.to_string())),
        Command::Quit => Ok(Reply::Quit),
        Command::Login { email, password } => {
            let resp = app.login(&email, &password).await?;
            let mut msg = format!("bienvenido, {} ({})", resp.principal.full_name(), resp.principal.role_name());
            if resp.requires_password_change {
                msg.push_str("\ndebe cambiar su contraseña antes de continuar");
            }
            Ok(Reply::Text(msg))
        }
        Command::Logout => {
            let route = app.logout()?;
            Ok(Reply::Text(format!("sesión cerrada -> {}", describe(&route))))
        }
        Command::Go(path) => {
            let route = app.navigate(&path)?;
            load_view(app, &route).await
        }
        Command::Back => match app.back()? {
            Some(route) => Ok(Reply::Text(describe(&route))),
            None => Ok(Reply::Text("no hay ubicación anterior".into())),
        },
        Command::WhoAmI => {
            let Some(p) = app.store().principal() else {
                return Ok(Reply::Text("sin sesión".into()));
            };
            let perms: Vec<String> = p
                .permissions
                .grants()
                .iter()
                .map(|g| match (g.id, &g.name) {
                    (Some(id), Some(name)) => format!("{}:{}", id, name),
                    (Some(id), None) => id.to_string(),
                    (None, Some(name)) => name.clone(),
                    (None, None) => "?".into(),
                })
                .collect();
            Ok(Reply::Text(format!(
                "{} <{}>\nrol: {}\npermisos ({}): {}",
                p.full_name(),
                p.email,
                p.role_name(),
                perms.len(),
                perms.join(", ")
            )))
        }
        Command::Can(req) => {
            let answer = if app.can(&req) { "sí" } else { "no" };
            Ok(Reply::Text(format!("{} -> {}", req, answer)))
        }
        Command::Menu => {
            let lines: Vec<String> = app.menu().iter().map(|m| format!("  {:<16} {}", m.title, m.path)).collect();
            Ok(Reply::Text(format!("{}\n  {:<16} {}", lines.join("\n"), "Cerrar sesión", "logout")))
        }
        Command::Get(path) => {
            let scope = app.view_scope();
            let val: Value = app.api().get(&path, Some(&scope)).await?;
            let data = val.get("data").cloned().unwrap_or(val);
            Ok(Reply::Data { heading: format!("GET {}", path), data })
        }
        Command::Approve(id) => {
            require(app, catalog::APPROVE_CASE, "aprobar expedientes")?;
            let msg = app.cases().approve(id).await?;
            Ok(Reply::Text(if msg.is_empty() { format!("expediente {} aprobado", id) } else { msg }))
        }
        Command::Reject { id, reason } => {
            require(app, catalog::APPROVE_CASE, "rechazar expedientes")?;
            let msg = app.cases().reject(id, &reason).await?;
            Ok(Reply::Text(if msg.is_empty() { format!("expediente {} rechazado", id) } else { msg }))
        }
        Command::Export { format, dir } => {
            let scope = app.view_scope();
            let bytes = app.dashboard().export(format, &DashboardFilters::default(), Some(&scope)).await?;
            let name = export_file_name(format, chrono::Local::now().date_naive());
            let path = dir.unwrap_or_else(|| PathBuf::from(".")).join(name);
            tokio::fs::write(&path, &bytes).await?;
            Ok(Reply::Text(format!("{} bytes -> {}", bytes.len(), path.display())))
        }
        Command::Status => {
            let route = app.settle()?;
            let session = match app.store().principal() {
                Some(p) => format!("autenticado como {}", p.full_name()),
                None => "sin sesión".to_string(),
            };
            Ok(Reply::Text(format!(
                "ubicación: {}\nvista: {}\nsesión: {}\napi: {}\nrecargas: {}",
                app.location(),
                route.view.title(),
                session,
                app.api().base_url(),
                app.navigator().reload_epoch()
            )))
        }
    }
}

fn require(app: &App, id: u32, what: &str) -> AppResult<()> {
    if app.can(&PermissionRef::Id(id)) {
        Ok(())
    } else {
        Err(AppError::forbidden("missing_permission".to_string(), format!("sin permiso para {}", what)))
    }
}

/// Fetch what the rendered view shows. Requests run in the view's scope, so
/// leaving the view cancels them.
async fn load_view(app: &App, route: &RouteMatch) -> AppResult<Reply> {
    let scope = app.view_scope();
    let mut heading = describe(route);
    let data = match route.view {
        View::Dashboard => {
            let d = app.dashboard().refresh(&DashboardFilters::default(), Some(&scope)).await?;
            serde_json::json!({ "reporte": d.report, "metricasTecnicos": d.technician_metrics })
        }
        View::CaseList => {
            let page = app.cases().list(&CaseQuery::default(), Some(&scope)).await?;
            serde_json::json!({ "expedientes": page.expedientes })
        }
        View::CaseDetail | View::CaseEdit => {
            let id = route.param("id").and_then(|s| s.parse::<u64>().ok()).ok_or_else(|| {
                AppError::validation("invalid_id".to_string(), format!("id de expediente inválido en {}", route.location))
            })?;
            let detail = app.cases().detail(id, Some(&scope)).await?;
            heading.push_str(&format!("\n{}", detail.expediente.numero_expediente));
            if let Some(estado) = detail.expediente.nombre_estado.as_deref() {
                heading.push_str(&format!(" ({})", estado));
            }
            serde_json::to_value(&detail.indicios)?
        }
        View::Profile => serde_json::to_value(app.auth().profile(Some(&scope)).await?)?,
        _ => return Ok(Reply::Text(heading)),
    };
    Ok(Reply::Data { heading, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_command("login ana@mp.gob.gt Clave1").unwrap(),
            Command::Login { email: "ana@mp.gob.gt".into(), password: "Clave1".into() }
        );
        assert_eq!(parse_command("go expedientes/4").unwrap(), Command::Go("/expedientes/4".into()));
        assert_eq!(parse_command("can 11").unwrap(), Command::Can(PermissionRef::Id(11)));
        assert_eq!(parse_command("can gestionar_sistema").unwrap(), Command::Can(PermissionRef::Name("gestionar_sistema".into())));
        assert_eq!(
            parse_command("reject 7 faltan firmas del fiscal").unwrap(),
            Command::Reject { id: 7, reason: "faltan firmas del fiscal".into() }
        );
        assert_eq!(parse_command("export CSV /tmp").unwrap(), Command::Export { format: ExportFormat::Csv, dir: Some(PathBuf::from("/tmp")) });
        assert_eq!(parse_command("   ").unwrap(), Command::Empty);
        assert_eq!(parse_command("EXIT").unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command("login solo-email").is_err());
        assert!(parse_command("approve abc").is_err());
        assert!(parse_command("export xml").is_err());
        assert!(parse_command("frobnicate").is_err());
    }
}
