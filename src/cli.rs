// File: ./src/cli.rs
//! Shared command-line interface logic, like printing help.

pub fn print_help(binary_name: &str) {
    println!(
        "Jobcal v{} - Keeps a Google Calendar in sync with run posts on a subreddit",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [--root <path>] [--once] [--verbose]", binary_name);
    println!("    {} --help", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -1, --once            Run a single pass and exit.");
    println!("    -v, --verbose         Log debug output.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("CONFIGURATION:");
    println!("    config.toml in the config directory, with the sections");
    println!("    [common]    subreddit, subreddit_name");
    println!("    [reddit]    client_id, client_secret, username, password, template_post_link");
    println!("    [google]    calendar_id, client_id, client_secret, refresh_token,");
    println!("                calendar_public_url, calendar_docs_url, creator");
    println!("    [bot]       poll_interval_secs, skip_flairs, event_duration_hours");
    println!();
    println!("POST FORMAT:");
    println!("    [Metaplot] Name of Run 2021-08-16 23:00 UTC");
    println!("    A body block overrides the title:");
    println!("    {}", crate::notify::HINT_EXAMPLE);
    println!();
    println!("MORE INFO:");
    println!("    License:    GPL-3.0");
}
