extern crate env_logger;
extern crate optimo;
extern crate serde_json;

pub mod options;

use clap::Parser;
use optimo::document::CssPosition;
use optimo::{
    audit_html, ChatCompletionService, Completion, DeferredChatService, ElementSpec, Entitlement,
    EntitlementView, HostDocument, MemoryDocument, OptimizationService, OptionSet, Provider,
    ProviderConfig, Rect, Rejection, Session, SessionConfig, SubmitOutcome, Tier,
};
use options::{Cli, Commands, OptimizeArgs, ProviderArgs};
use serde_json::json;
use std::process;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// Read a file or exit with a message.
async fn read_file(path: &str) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) => {
            eprintln!("Unable to read {}: {}", path, e);
            process::exit(1);
        }
    }
}

async fn session_config(path: &Option<String>) -> SessionConfig {
    match path {
        Some(path) => match SessionConfig::from_json_str(&read_file(path).await) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        },
        None => SessionConfig::default(),
    }
}

async fn provider_config(args: &ProviderArgs) -> ProviderConfig {
    let mut config = match &args.provider_config {
        Some(path) => match serde_json::from_str::<ProviderConfig>(&read_file(path).await) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Invalid provider config {}: {}", path, e);
                process::exit(1);
            }
        },
        None => match args.provider.parse::<Provider>() {
            Ok(provider) => ProviderConfig::new(provider, ""),
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        },
    };

    if let Some(key) = &args.api_key {
        config.api_key = key.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config = config.with_custom_endpoint(endpoint.clone());
    }
    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }

    config
}

async fn service(args: &ProviderArgs) -> ChatCompletionService {
    match ChatCompletionService::new(provider_config(args).await) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

async fn scan(file: &str, as_json: bool) {
    let html = read_file(file).await;
    let audit = match audit_html(&html) {
        Ok(audit) => audit,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let mut stdout = tokio::io::stdout();

    if as_json {
        match serde_json::to_string_pretty(&audit) {
            Ok(j) => {
                if let Err(e) = stdout.write_all(format!("{}\n", j).as_bytes()).await {
                    eprintln!("{:?}", e)
                }
            }
            Err(e) => eprintln!("{:?}", e),
        }
        return;
    }

    for entry in &audit {
        let label = entry
            .snapshot
            .id
            .as_deref()
            .or(entry.snapshot.placeholder.as_deref())
            .unwrap_or("-");
        let fired: Vec<&str> = entry.signals.iter().map(|s| s.as_str()).collect();
        let line = format!(
            "#{} {} {} [{}]\n",
            entry.index,
            if entry.is_prompt_surface { "prompt" } else { "skip  " },
            label,
            fired.join(", ")
        );
        if let Err(e) = stdout.write_all(line.as_bytes()).await {
            eprintln!("{:?}", e)
        }
    }
}

async fn optimize(args: OptimizeArgs, config: SessionConfig) {
    let tier = match args.tier.parse::<Tier>() {
        Ok(tier) => tier,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    let mut entitlement = Entitlement::new(tier);
    if let Some(user_id) = &args.user_id {
        entitlement = entitlement.with_user_id(user_id.clone());
    }

    // Credentials are checked on the first call, after the local gates ran.
    let service = DeferredChatService::new(provider_config(&args.provider).await);

    let mut document = MemoryDocument::new();
    let body = document.body();
    let surface = document
        .append(
            body,
            ElementSpec::div()
                .class("composer")
                .position(CssPosition::Relative)
                .rect(Rect::new(0.0, 0.0, 800.0, 200.0)),
        )
        .and_then(|wrapper| {
            document.append(
                wrapper,
                ElementSpec::textarea()
                    .placeholder("Message")
                    .rect(Rect::new(16.0, 16.0, 768.0, 120.0))
                    .value(args.text.clone()),
            )
        });
    let surface = match surface {
        Some(surface) => surface,
        None => {
            eprintln!("Unable to build the prompt surface.");
            process::exit(1);
        }
    };

    let mut session = Session::new(
        document,
        config,
        Arc::new(service),
        EntitlementView::fixed(entitlement),
    );
    session.start();
    session.open_panel(surface);

    let options = OptionSet::new()
        .with_tone(args.tone)
        .with_length(args.length)
        .with_format(args.format)
        .with_persona(args.persona)
        .with_audience(args.audience)
        .with_negative_prompt(args.avoid);

    match session.submit(options) {
        SubmitOutcome::Dispatched(_) => match session.settle().await {
            Some(Completion::Applied { surface }) => {
                println!("{}", session.document().value(surface).unwrap_or_default());
            }
            Some(other) => {
                if let Some(notice) = other.notice() {
                    eprintln!("{}", notice.text);
                }
                process::exit(1);
            }
            None => process::exit(1),
        },
        SubmitOutcome::Rejected(rejection) => {
            match session.notice() {
                Some(notice) => eprintln!("{}", notice.text),
                None => eprintln!("{}", rejection),
            }
            if let Rejection::UpgradeRequired(_) = rejection {
                eprintln!("Upgrade: {}", session.upgrade_url());
            }
            process::exit(2);
        }
    }
}

async fn test_connection(args: ProviderArgs) {
    let service = service(&args).await;
    match service.test_connection().await {
        Ok(reply) if reply.success => {
            println!(
                "{}",
                json!({ "provider": service.provider_name(), "model": service.model(), "success": true })
            );
        }
        Ok(reply) => {
            eprintln!(
                "{}",
                reply.error.unwrap_or_else(|| "Connection failed".to_string())
            );
            process::exit(1);
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        use env_logger::Env;
        let env = Env::default()
            .filter_or("RUST_LOG", "info")
            .write_style_or("RUST_LOG_STYLE", "always");

        env_logger::init_from_env(env);
    }

    match cli.command {
        Some(Commands::SCAN { file, json }) => scan(&file, json).await,
        Some(Commands::OPTIMIZE(args)) => {
            let config = session_config(&cli.config).await;
            optimize(args, config).await
        }
        Some(Commands::TestConnection(args)) => test_connection(args).await,
        None => (),
    }
}
