// Devtools seed data uses large tuple types for fixtures.
#![allow(clippy::type_complexity)]

pub mod commands;
mod devtools;
pub mod error;
pub mod events;
pub mod filter;
pub mod gateway;
pub mod hooks;
pub mod metrics;
pub mod notification;
pub mod pipeline;
pub mod services;
pub mod state;
pub mod types;
pub mod util;
pub mod validation;

pub use devtools::demo_gateway;

use state::AppState;

/// Entry point of the `salesdesk` shell: load config, build the state,
/// run one command and print its JSON answer.
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let command = match commands::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(usage) => {
            eprintln!("{}", usage);
            std::process::exit(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let exit_code = runtime.block_on(async move {
        let state = match state::load_config()
            .map_err(error::CrmError::from)
            .and_then(AppState::from_config)
        {
            Ok(state) => state,
            Err(e) => {
                log::error!("{}", e);
                print_json(&serde_json::json!({
                    "status": "error",
                    "error": error::UserFacingError::from(&e),
                }));
                return 1;
            }
        };
        let hooks = state.start_hooks();

        let output = commands::execute(&state, command).await;
        let failed = output["status"] == "error";
        print_json(&output);

        // Let queued post-create hooks finish before exiting.
        drop(state);
        if let Some(handle) = hooks {
            if let Err(e) = handle.await {
                log::warn!("Hook consumer stopped abnormally: {}", e);
            }
        }
        i32::from(failed)
    });
    std::process::exit(exit_code);
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => log::error!("Failed to render output: {}", e),
    }
}
