use anyhow::Context;
use cerebro_guard::config::{Config, DEFAULT_CONFIG_PATH};
use cerebro_guard::view::{render_html, render_text};
use cerebro_guard::{
    classify, AnalysisBackend, AnalysisClient, AnalysisRequest, FormController, FormField, Page,
    ScoreAnimator, UiState,
};
use clap::{Arg, ArgGroup, Command};
use log::LevelFilter;
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = Command::new("cerebro-guard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Submit an email to the analysis service and show its risk report")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("server")
                .long("server")
                .value_name("URL")
                .help("Base URL of the analysis service (overrides the configuration)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("check-address")
                .long("check-address")
                .value_name("ADDRESS")
                .help("Check the shape of one address and exit")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("sender")
                .long("sender")
                .value_name("ADDRESS")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("recipient")
                .long("recipient")
                .value_name("ADDRESS")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("body")
                .long("body")
                .value_name("TEXT")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("body-file")
                .long("body-file")
                .value_name("FILE")
                .help("Read the message body from a file")
                .action(clap::ArgAction::Set),
        )
        .group(ArgGroup::new("body-source").args(["body", "body-file"]))
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .help("Report format (text, html)")
                .value_parser(["text", "html"])
                .default_value("text"),
        )
        .arg(
            Arg::new("fail-on-error")
                .long("fail-on-error")
                .help("Exit with status 2 when the analysis could not be completed")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);
    let explicit_config = matches.value_source("config")
        == Some(clap::parser::ValueSource::CommandLine);
    let config = Config::load(config_path, explicit_config);

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        config
            .as_ref()
            .ok()
            .and_then(Config::log_level)
            .unwrap_or(LevelFilter::Info)
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        match Config::default().to_file(generate_path) {
            Ok(()) => println!("✅ Default configuration written to: {generate_path}"),
            Err(e) => {
                eprintln!("❌ Failed to write configuration: {e:#}");
                process::exit(1);
            }
        }
        return;
    }

    if let Some(address) = matches.get_one::<String>("check-address") {
        let shape = classify(address);
        println!("{address}: {}", shape.css_class());
        process::exit(if shape.is_valid() { 0 } else { 1 });
    }

    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };
    if let Some(server) = matches.get_one::<String>("server") {
        config.service_url = server.clone();
    }

    let (Some(sender), Some(recipient)) = (
        matches.get_one::<String>("sender"),
        matches.get_one::<String>("recipient"),
    ) else {
        eprintln!("--sender and --recipient are required (see --help)");
        process::exit(1);
    };

    let body = match read_body(&matches) {
        Ok(body) => body,
        Err(e) => {
            eprintln!("Error reading message body: {e:#}");
            process::exit(1);
        }
    };

    let client = match AnalysisClient::new(&config.service_url) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Invalid service URL {}: {e}", config.service_url);
            process::exit(1);
        }
    };
    log::info!("Using analysis service at {}", client.endpoint());

    let html = matches.get_one::<String>("format").map(String::as_str) == Some("html");
    let page = if html {
        Page::new()
    } else {
        Page::new().with_live_score()
    };
    let mut form = FormController::new(client, page, ScoreAnimator::new(config.animation_tick()));

    for (field, value) in [(FormField::Sender, sender), (FormField::Recipient, recipient)] {
        form.input_changed(field, value);
        if let Some(shape) = form.view().hint(field) {
            if !shape.is_valid() {
                log::warn!("{} does not look like an email address: {}", field.name(), value);
            }
        }
    }

    let request = AnalysisRequest::new(sender.as_str(), recipient.as_str(), body);
    if let Some(submission) = form.begin_submit(request) {
        println!("⏳ {}", form.view().trigger_label());
        let outcome = form.backend().submit(&submission.request).await;
        form.complete(submission.ticket, outcome);
    }
    form.animation_finished().await;

    if html {
        print!("{}", render_html(form.view()));
    } else {
        print!("{}", render_text(form.view()));
    }

    if matches.get_flag("fail-on-error") && matches!(form.state(), UiState::ShowingError(_)) {
        process::exit(2);
    }
}

fn read_body(matches: &clap::ArgMatches) -> anyhow::Result<String> {
    if let Some(path) = matches.get_one::<String>("body-file") {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read message body from {path}"));
    }
    Ok(matches
        .get_one::<String>("body")
        .cloned()
        .unwrap_or_default())
}
