use anyhow::{Result, anyhow};
use log::error;
use pico_args::Arguments;
use std::{env, path::PathBuf};

use arplace::config::{self, Profile};
use arplace::replay::{self, Script};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("replay") => {
            let profile_path: Option<PathBuf> = pargs.opt_value_from_str("--profile")?;
            let script_path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: arplace replay <script.json> [--profile <path>]"))?;

            let profile = match profile_path {
                Some(p) => Profile::load(&p)?,
                None => config::load_or_install_default()?,
            };
            let script = Script::load(&script_path)?;
            let summary = replay::run_script(&script, &profile).inspect_err(|e| {
                error!("replay of {} failed: {e}", script_path.display());
            })?;
            print_json(&serde_json::to_value(&summary)?);
            Ok(())
        }

        Some("profile") => {
            let what: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: arplace profile <show|check|path>"))?;
            match what.as_str() {
                "show" => {
                    let profile = config::load_or_install_default()?;
                    print_json(&serde_json::to_value(&profile)?);
                }
                "check" => {
                    let path: PathBuf = pargs
                        .free_from_str()
                        .map_err(|_| anyhow!("usage: arplace profile check <path>"))?;
                    let profile = Profile::load(&path)?;
                    println!("ok: {} ({})", path.display(), profile.display_name());
                }
                "path" => println!("{}", config::profiles_dir()?.display()),
                other => return Err(anyhow!("unknown profile command: {other}")),
            }
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!(
        r#"arplace - tap-to-place and touch manipulation on AR planes

USAGE:
  arplace help [command]                       Show general or command-specific help
  arplace replay <script.json> [--profile <p>] Run a recorded touch script
  arplace profile show                         Print the default profile
  arplace profile check <path>                 Validate a profile file
  arplace profile path                         Print the profiles directory

TIPS:
  - Profiles: ~/.config/arplace/profiles
  - Log level: RUST_LOG=debug arplace replay ...
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "replay" => println!(
            "usage: arplace replay <script.json> [--profile <path>]\nFeeds a JSON touch script through a session and prints a summary."
        ),
        "profile" => println!(
            "usage:\n  arplace profile show\n  arplace profile check <path>\n  arplace profile path"
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_json(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
