use serde::Serialize;

use xeox_social::config::Config;
use xeox_social::error::{AppError, Result};
use xeox_social::feed::FeedKind;
use xeox_social::models::NewUser;
use xeox_social::{youtube, Engine};

const USAGE: &str = "usage: xeox --register <username> [first] [last]
       xeox --feed <home|explore|search|profile> [arg] [--viewer <username>] [--page <n>]
       xeox --reels [--viewer <username>]
       xeox --notifications <username>
       xeox --reel-id <url>";

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Value following `flag` anywhere in the argument list.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Positional argument at `index`, unless it is another flag.
fn positional(args: &[String], index: usize) -> Option<&str> {
    args.get(index)
        .map(String::as_str)
        .filter(|a| !a.starts_with("--"))
}

/// `--page` value, defaulting to the first page.
fn page_arg(args: &[String]) -> Result<u32> {
    match flag_value(args, "--page") {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| AppError::validation("page", format!("Invalid page '{}'.", raw))),
        None => Ok(1),
    }
}

async fn viewer_id(engine: &Engine, args: &[String]) -> Result<Option<i64>> {
    match flag_value(args, "--viewer") {
        Some(username) => Ok(Some(engine.user(username).await?.id)),
        None => Ok(None),
    }
}

async fn run(args: &[String], config: &Config) -> Result<()> {
    let command = args.get(1).map(String::as_str).unwrap_or("");

    // Pure parsing, no store needed
    if command == "--reel-id" {
        let url = positional(args, 2).unwrap_or("");
        return print_json(&youtube::extract_video_id(url));
    }

    let engine = Engine::new(config).await?;

    match command {
        "--register" => {
            let username = positional(args, 2)
                .ok_or_else(|| AppError::validation("username", "Username is required."))?;
            let user = NewUser::new(username).with_name(
                positional(args, 3).unwrap_or(""),
                positional(args, 4).unwrap_or(""),
            );
            print_json(&engine.register_user(user).await?)
        }
        "--feed" => {
            let kind = positional(args, 2).unwrap_or("home");
            let kind = FeedKind::parse(kind, positional(args, 3))?;
            let page = page_arg(args)?;
            let viewer = viewer_id(&engine, args).await?;
            print_json(&engine.list_feed(&kind, page, viewer).await?)
        }
        "--reels" => {
            let viewer = viewer_id(&engine, args).await?;
            print_json(&engine.list_reels(viewer).await?)
        }
        "--notifications" => {
            let username = positional(args, 2)
                .ok_or_else(|| AppError::validation("username", "Username is required."))?;
            let recipient = engine.user(username).await?;
            let page = page_arg(args)?;
            print_json(&engine.list_notifications(recipient.id, page).await?)
        }
        _ => {
            eprintln!("{}", USAGE);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = Config::load()?;

    if let Err(err) = run(&args, &config).await {
        // Domain errors print as a structured body; infrastructure errors bubble up.
        if err.code() == "internal_error" {
            return Err(err);
        }
        print_json(&err.body())?;
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn page_flag_parses_or_defaults() {
        assert_eq!(page_arg(&args(&["xeox", "--feed", "home"])).unwrap(), 1);
        assert_eq!(page_arg(&args(&["xeox", "--notifications", "bob", "--page", "3"])).unwrap(), 3);
    }

    #[test]
    fn bad_page_flag_is_rejected_everywhere() {
        for command in [
            args(&["xeox", "--feed", "home", "--page", "two"]),
            args(&["xeox", "--notifications", "bob", "--page", "-1"]),
        ] {
            let err = page_arg(&command).unwrap_err();
            assert_eq!(err.body().field, Some("page"));
        }
    }
}
