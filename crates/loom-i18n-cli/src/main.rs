// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use loom_i18n::{
	load_config, LoadRequest, Localizer, LocalizerConfig, LocalizerConfigLayer, MessageArgs,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Resolve and format localized messages
#[derive(Parser, Debug)]
#[command(name = "loom-i18n", version, about, long_about = None)]
struct Args {
	/// Path to a TOML configuration file
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Language to localize into (overrides config)
	#[arg(long)]
	language: Option<String>,

	/// Print the key itself when no pattern exists for it
	#[arg(long)]
	use_key_if_missing: bool,

	/// Log level
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Output logs as JSON
	#[arg(long)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Format one message
	Localize {
		/// Resource file to load, optionally as PATH@LANG for a flat file
		#[arg(long = "resources", short = 'r', value_name = "PATH[@LANG]")]
		resources: Vec<ResourceArg>,

		/// Message key
		key: String,

		/// Parameters as NAME VALUE pairs
		#[arg(value_name = "NAME VALUE")]
		params: Vec<String>,
	},

	/// Print the merged resource store as JSON
	Dump {
		#[arg(long = "resources", short = 'r', value_name = "PATH[@LANG]")]
		resources: Vec<ResourceArg>,
	},
}

/// A `--resources` value: a path or URL with an optional language suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResourceArg {
	path: String,
	language: Option<String>,
}

impl FromStr for ResourceArg {
	type Err = String;

	fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
		if value.is_empty() {
			return Err("resource path must not be empty".to_string());
		}

		// Only a suffix that looks like a language tag is split off, so
		// `https://user@host/en.json` stays intact.
		if let Some((path, language)) = value.rsplit_once('@') {
			if is_language_tag(language) {
				if path.is_empty() {
					return Err(format!("missing path before '@{language}'"));
				}
				return Ok(Self {
					path: path.to_string(),
					language: Some(language.to_string()),
				});
			}
		}

		Ok(Self {
			path: value.to_string(),
			language: None,
		})
	}
}

fn is_language_tag(value: &str) -> bool {
	!value.is_empty()
		&& value
			.split('-')
			.all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()))
}

impl From<&ResourceArg> for LoadRequest {
	fn from(arg: &ResourceArg) -> Self {
		let request = LoadRequest::new(&arg.path);
		match &arg.language {
			Some(language) => request.language(language),
			None => request,
		}
	}
}

fn init_tracing(level: &str, json: bool) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(format!("loom_i18n={level}")));

	if json {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().json().with_writer(std::io::stderr))
			.init();
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().compact().with_writer(std::io::stderr))
			.init();
	}
}

fn cli_overrides(args: &Args) -> LocalizerConfigLayer {
	LocalizerConfigLayer {
		language: args.language.clone(),
		use_key_if_missing: args.use_key_if_missing.then_some(true),
		..LocalizerConfigLayer::default()
	}
}

/// Builds a localizer and loads the configured and requested resources, in
/// that order.
async fn prepare(config: LocalizerConfig, resources: &[ResourceArg]) -> Result<Localizer> {
	let localizer = Localizer::builder().config(config).build();

	for (resource, outcome) in localizer.config().preload.iter().zip(localizer.preload().await) {
		if !outcome.is_loaded() {
			bail!("failed to load preloaded resources from {}", resource.path);
		}
	}

	for resource in resources {
		let outcome = localizer.load_resources(LoadRequest::from(resource)).await;
		if !outcome.is_loaded() {
			bail!("failed to load resources from {}", resource.path);
		}
	}

	Ok(localizer)
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();
	init_tracing(&args.log_level, args.json_logs);

	let config =
		load_config(args.config.as_deref(), cli_overrides(&args)).context("failed to load configuration")?;
	debug!(language = ?config.language, "configuration resolved");

	match &args.command {
		Command::Localize {
			resources,
			key,
			params,
		} => {
			let localizer = prepare(config, resources).await?;
			let text = localizer
				.localize_args(key, &MessageArgs::from_flat(params.as_slice()))
				.with_context(|| format!("failed to format message '{key}'"))?;

			match text {
				Some(text) => println!("{text}"),
				None => {
					info!(key = %key, "message could not be resolved");
					eprintln!("<undefined>");
					std::process::exit(1);
				}
			}
		}
		Command::Dump { resources } => {
			let localizer = prepare(config, resources).await?;
			let dump = match localizer.resources() {
				Some(resources) => serde_json::to_string_pretty(&*resources)?,
				None => "{}".to_string(),
			};
			println!("{dump}");
		}
	}

	Ok(())
}
