//! Commands exposed by the `salesdesk` shell.
//!
//! Each command maps to a route (or a pipeline gesture), runs the matching
//! loader or flow against the application state, and answers with a JSON
//! value for the presentation layer.

use serde_json::{json, Value};

use crate::error::{CrmError, UserFacingError};
use crate::filter::StatusFilter;
use crate::gateway::RecordGateway;
use crate::pipeline::DropOutcome;
use crate::services::{companies, contacts, dashboard, pipeline};
use crate::state::AppState;
use crate::types::{DealStage, RecordId, Route};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Show(Route),
    /// Contacts list with a text query and status filter.
    Contacts { query: String, status: StatusFilter },
    Companies { query: String },
    /// Drag a deal onto a board column.
    MoveDeal { deal_id: RecordId, target: Option<DealStage> },
}

impl Command {
    /// The page this command renders.
    pub fn route(&self) -> Route {
        match self {
            Command::Show(route) => *route,
            Command::Contacts { .. } => Route::Contacts,
            Command::Companies { .. } => Route::Companies,
            Command::MoveDeal { .. } => Route::Pipeline,
        }
    }
}

pub const USAGE: &str = "usage: salesdesk [dashboard | pipeline | contacts [QUERY] [--status STATUS] | companies [QUERY] | settings | move DEAL_ID STAGE]";

/// Parse shell arguments (without the program name).
pub fn parse_args<I, S>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
    let Some(first) = args.first() else {
        return Ok(Command::Show(Route::Dashboard));
    };

    if first == "move" {
        let deal_id = args
            .get(1)
            .and_then(|s| s.parse::<RecordId>().ok())
            .ok_or_else(|| USAGE.to_string())?;
        // Anything that is not a board column counts as a drop outside the board.
        let target = args
            .get(2)
            .map(|s| s.trim().to_ascii_lowercase())
            .and_then(|s| DealStage::ALL.into_iter().find(|st| st.as_str() == s));
        return Ok(Command::MoveDeal { deal_id, target });
    }

    let route = Route::parse(first).ok_or_else(|| format!("unknown route '{}'\n{}", first, USAGE))?;
    let rest = &args[1..];
    match route {
        Route::Contacts => {
            let mut query = Vec::new();
            let mut status = StatusFilter::All;
            let mut iter = rest.iter();
            while let Some(arg) = iter.next() {
                if arg == "--status" {
                    let value = iter.next().ok_or_else(|| USAGE.to_string())?;
                    status = StatusFilter::parse(value);
                } else {
                    query.push(arg.as_str());
                }
            }
            Ok(Command::Contacts {
                query: query.join(" "),
                status,
            })
        }
        Route::Companies => Ok(Command::Companies {
            query: rest.join(" "),
        }),
        other => Ok(Command::Show(other)),
    }
}

fn error_json(err: &CrmError) -> Value {
    json!({ "status": "error", "error": UserFacingError::from(err) })
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| error_json(&CrmError::from(e)))
}

async fn contacts_json(gateway: &dyn RecordGateway, query: String, status: StatusFilter) -> Value {
    match contacts::load_view(gateway).await {
        Ok(mut view) => {
            view.set_query(query);
            view.set_status_filter(status);
            json!({ "status": "success", "data": view.visible(), "total": view.source().len() })
        }
        Err(e) => error_json(&e),
    }
}

async fn companies_json(gateway: &dyn RecordGateway, query: String) -> Value {
    match companies::load_view(gateway).await {
        Ok(mut view) => {
            view.set_query(query);
            json!({ "status": "success", "data": view.visible(), "total": view.source().len() })
        }
        Err(e) => error_json(&e),
    }
}

/// Run a command and tag its answer with the path of the page it renders.
pub async fn execute(state: &AppState, command: Command) -> Value {
    let route = command.route();
    let mut output = dispatch(state, command).await;
    if let Value::Object(ref mut map) = output {
        map.insert("route".to_string(), json!(route.path()));
    }
    output
}

async fn dispatch(state: &AppState, command: Command) -> Value {
    let gateway = state.gateway.as_ref();
    match command {
        Command::Show(Route::Dashboard) => to_json(&dashboard::load_dashboard(gateway).await),
        Command::Show(Route::Pipeline) => to_json(&pipeline::load_pipeline(gateway).await),
        Command::Show(Route::Settings) => json!({
            "status": "success",
            "data": state.config.redacted(),
        }),
        Command::Show(Route::Contacts) => {
            contacts_json(gateway, String::new(), StatusFilter::All).await
        }
        Command::Show(Route::Companies) => companies_json(gateway, String::new()).await,
        Command::Contacts { query, status } => contacts_json(gateway, query, status).await,
        Command::Companies { query } => companies_json(gateway, query).await,
        Command::MoveDeal { deal_id, target } => {
            let mut board = match pipeline::load_board(gateway).await {
                Ok(board) => board,
                Err(e) => return error_json(&e),
            };
            if let Err(e) = board.drag_start(deal_id) {
                return error_json(&e);
            }
            match board.drop_on(target, gateway, state.notifier.as_ref()).await {
                Ok(DropOutcome::Unchanged) => json!({ "status": "unchanged", "dealId": deal_id }),
                Ok(DropOutcome::Moved { deal_id, to }) => {
                    json!({ "status": "success", "dealId": deal_id, "stage": to })
                }
                Ok(DropOutcome::Failed { deal_id, message }) => {
                    json!({ "status": "error", "dealId": deal_id, "message": message })
                }
                Err(e) => error_json(&e),
            }
        }
    }
}
