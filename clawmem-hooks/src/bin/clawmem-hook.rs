//! The hook entry point: reads one [`clawmem_hooks::HookInput`] from stdin,
//! dispatches it, and writes one [`clawmem_hooks::HookOutput`] to stdout.
//! Never exits non-zero (§5) — a malformed request or any handler failure
//! still produces a structured empty response.

use clawmem_core::config::RuntimeConfig;
use clawmem_hooks::{gateway_from_config, read_request, run, write_response, HookOutput};
use clawmem_store::Store;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cfg = RuntimeConfig::from_env();

    let input = match read_request(std::io::stdin()) {
        Ok(input) => input,
        Err(err) => {
            tracing::warn!(error = %err, "malformed hook input");
            let _ = write_response(std::io::stdout(), &HookOutput::empty(""));
            return;
        }
    };

    let db_path = cfg.resolve_db_path();
    let store = match Store::open(&db_path).await {
        Ok(store) => store,
        Err(err) => {
            tracing::warn!(error = %err, "failed to open store");
            let event = input.hook_event_name.clone().unwrap_or_default();
            let _ = write_response(std::io::stdout(), &HookOutput::empty(event));
            return;
        }
    };
    let gateway = gateway_from_config(&cfg);

    let output = run(&store, &gateway, &cfg, &input).await;
    if let Err(err) = write_response(std::io::stdout(), &output) {
        tracing::warn!(error = %err, "failed to write hook output");
    }
}
