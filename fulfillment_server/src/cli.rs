use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Only variables without secrets. API keys and webhook secrets are never printed.
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "DD_ENV",
        "DD_HOST",
        "DD_PORT",
        "DD_DATABASE_URL",
        "DD_PUBLIC_BASE_URL",
        "DD_HTTP_TIMEOUT_SECS",
        "DD_ACCEPT_UNSIGNED_WEBHOOKS",
        "DD_SHIPPING_CARRIER",
        "DD_SHIPPING_SERVICE",
        "DD_CREATE_PACKING_SLIPS",
        "DD_PAYPAL_CLIENT_ID",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
