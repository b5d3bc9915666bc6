use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::commands;
use crate::error::AssistError;

#[derive(Parser)]
#[command(
    name = "seoassist",
    version,
    about = "SEO metadata assistant: suggest, review, and apply search/social metadata for content items"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a metadata suggestion bundle for a post
    Suggest {
        #[arg(long)]
        post_id: u64,
        /// Override the post's stored title
        #[arg(long, default_value = "")]
        title: String,
        /// Override the post's stored content
        #[arg(long, default_value = "")]
        content: String,
        /// Structured block JSON, preferred over plain content for AI prompts
        #[arg(long)]
        raw_blocks: Option<String>,
    },
    /// Write suggestion fields into the post's metadata
    Apply {
        #[arg(long)]
        post_id: u64,
        #[arg(long, default_value = "")]
        meta_title: String,
        #[arg(long, default_value = "")]
        meta_description: String,
        #[arg(long, default_value = "")]
        open_graph_title: String,
        #[arg(long, default_value = "")]
        open_graph_description: String,
        #[arg(long, default_value = "")]
        twitter_title: String,
        #[arg(long, default_value = "")]
        twitter_description: String,
        /// Per-field toggle, e.g. --apply meta_title=false; absent fields apply
        #[arg(long = "apply", value_name = "FIELD=BOOL")]
        apply: Vec<String>,
    },
    /// Render and attach a social card image through the configured service
    SocialImage {
        #[arg(long)]
        post_id: u64,
        /// Screenshot target; defaults to the configured override or the post permalink
        #[arg(long)]
        url: Option<String>,
    },
    /// Show the effective settings, or persist operator-editable ones
    Settings {
        /// e.g. --set seo_plugin=tsf; may repeat
        #[arg(long, value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Drive the authoring session: fetch, optionally refresh, optionally apply
    Review {
        #[arg(long)]
        post_id: u64,
        /// Evict the cached bundle and regenerate
        #[arg(long)]
        refresh: bool,
        /// Apply the fetched bundle after review
        #[arg(long)]
        apply: bool,
        /// Fields to exclude from apply; may repeat
        #[arg(long, value_name = "FIELD")]
        skip: Vec<String>,
    },
    /// Report paths, settings, and environment overrides
    Status,
}

/// Endpoint-shaped commands print their response as JSON; typed endpoint
/// failures print the structured error body and exit nonzero.
fn emit<T: Serialize>(result: Result<T>) -> Result<()> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(err) => match err.downcast_ref::<AssistError>() {
            Some(assist) => {
                println!("{}", serde_json::to_string_pretty(&assist.body())?);
                std::process::exit(1);
            }
            None => Err(err),
        },
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Suggest {
            post_id,
            title,
            content,
            raw_blocks,
        } => emit(commands::suggest::run(&commands::suggest::SuggestOptions {
            post_id,
            title,
            content,
            raw_blocks,
        })),
        Command::Apply {
            post_id,
            meta_title,
            meta_description,
            open_graph_title,
            open_graph_description,
            twitter_title,
            twitter_description,
            apply,
        } => emit(commands::apply::run(&commands::apply::ApplyOptions {
            post_id,
            meta_title,
            meta_description,
            open_graph_title,
            open_graph_description,
            twitter_title,
            twitter_description,
            apply,
        })),
        Command::SocialImage { post_id, url } => emit(commands::social_image::run(
            &commands::social_image::SocialImageOptions { post_id, url },
        )),
        Command::Settings { set } => emit(commands::settings::run(
            &commands::settings::SettingsOptions { set },
        )),
        Command::Review {
            post_id,
            refresh,
            apply,
            skip,
        } => emit(commands::review::run(&commands::review::ReviewOptions {
            post_id,
            refresh,
            apply,
            skip,
        })),
        Command::Status => {
            let report = commands::status::run()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}
