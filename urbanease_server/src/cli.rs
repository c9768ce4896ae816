use std::{env, env::VarError};

/// The server takes no arguments. Passing any prints the help text and the current configuration, and returns true.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
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
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "UE_HOST",
        "UE_PORT",
        "UE_DATABASE_URL",
        "UE_UPI_VPA",
        "UE_UPI_NAME",
        "UE_PAYMENT_TIMEOUT_MS",
        "UE_VERIFY_ORDER_TOTAL",
        "UE_STRICT_STATUS_TRANSITIONS",
        "UE_WS_REQUIRE_TOKEN",
        "UE_AUTO_MIGRATE",
        "UE_MAX_BODY_BYTES",
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
