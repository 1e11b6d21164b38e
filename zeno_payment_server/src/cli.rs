use std::{env, env::VarError, fmt::Write};

const HELP: &str = include_str!("./cli-help.txt");

/// Settings whose values are safe to print.
const PUBLIC_SETTINGS: [&str; 17] = [
    "RUST_LOG",
    "ZPG_HOST",
    "ZPG_PORT",
    "ZPG_PRODUCTION",
    "ZPG_PUBLIC_URL",
    "ZPG_DEV_URL",
    "ZPG_DATABASE_URL",
    "ZPG_ZENOPAY_BASE_URL",
    "ZPG_PROVIDER_TIMEOUT",
    "ZPG_MINIMUM_AMOUNT",
    "ZPG_DEFAULT_BUYER_EMAIL",
    "ZPG_DEFAULT_BUYER_NAME",
    "ZPG_IDEMPOTENCY_WINDOW",
    "ZPG_ORDER_RETENTION",
    "ZPG_WEBHOOK_HMAC_CHECKS",
    "ZPG_WEBHOOK_HMAC_HEADER",
    "ZPG_EVENT_BUFFER_SIZE",
];

/// Settings that are only reported as present or absent.
const SECRET_SETTINGS: [&str; 2] = ["ZPG_ZENOPAY_API_KEY", "ZPG_WEBHOOK_HMAC_SECRET"];

/// The server takes no arguments. If any are given, print the help text and the current configuration and return
/// true, so that `main` can exit without starting the server.
pub fn handle_command_line_args() -> bool {
    if env::args().len() <= 1 {
        return false;
    }
    println!("\n{HELP}\n");
    println!("{}", environment_report());
    true
}

pub fn environment_report() -> String {
    let mut report = String::from("Current configuration (secret values are hidden):\n");
    for name in PUBLIC_SETTINGS {
        let value = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        let _ = writeln!(report, "  {name:<35} {value}");
    }
    for name in SECRET_SETTINGS {
        let value = match env::var_os(name) {
            Some(v) if !v.is_empty() => "<set>",
            _ => "Not set",
        };
        let _ = writeln!(report, "  {name:<35} {value}");
    }
    report
}
