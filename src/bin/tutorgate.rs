//! tutorgate: one-shot CLI for the LLM request gateway
//!
//! Sends a single prompt through a gateway built from the standard config
//! locations and environment secrets.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tutorgate::{Gateway, GatewayConfig, GatewayRequest, GatewayBuilder, Secrets};

/// tutorgate CLI
#[derive(Parser)]
#[command(name = "tutorgate")]
#[command(version = tutorgate::PKG_VERSION)]
#[command(about = "LLM request gateway for tutoring sessions")]
struct Args {
    /// Config file (default: ~/.tutorgate/config.toml, then /etc/tutorgate/config.toml)
    #[arg(short, long, env = "TUTORGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check gateway configuration and collaborators
    Health,

    /// Send one message through the gateway
    Ask {
        /// User message (or omit to read from stdin)
        message: Option<String>,
        /// System prompt
        #[arg(short, long, default_value = "You are a helpful tutor.")]
        system: String,
        /// Sampling temperature
        #[arg(short, long, default_value_t = 0.3)]
        temperature: f32,
        /// Maximum output tokens
        #[arg(long, default_value_t = 750)]
        max_tokens: u32,
        /// Learning phase, for logging
        #[arg(long)]
        phase: Option<String>,
        /// Component within the phase, for logging
        #[arg(long)]
        component: Option<String>,
        /// Skip the response cache
        #[arg(long)]
        no_cache: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = GatewayConfig::load_or_default(args.config.as_deref())?;
    let gateway: Gateway = GatewayBuilder::from_config(&config, &Secrets::from_env())?.build()?;

    match args.command {
        Command::Health => {
            let health = gateway.health();
            println!("tutorgate {}", health.version);
            match &health.provider {
                Some(provider) => println!("provider:         {provider}"),
                None => println!("provider:         none (mock responses)"),
            }
            println!("model:            {}", health.model);
            println!(
                "durable store:    {}",
                if health.durable_store { "available" } else { "unavailable" }
            );
            println!("cache entries:    {}", health.cache_entries);
            println!("fallback records: {}", health.fallback_records);
        }

        Command::Ask {
            message,
            system,
            temperature,
            max_tokens,
            phase,
            component,
            no_cache,
        } => {
            let message = resolve_text(message, "ask")?;
            let mut request = GatewayRequest::new(system, message)
                .temperature(temperature)
                .max_tokens(max_tokens)
                .use_cache(!no_cache);
            request.correlation.phase = phase;
            request.correlation.component = component;

            let response = gateway.call(request).await;
            gateway.logger().flush().await;

            println!("{}", response.content);
            if !response.metadata.is_empty() {
                println!();
                for (key, value) in &response.metadata {
                    println!("{key}: {value}");
                }
            }
            eprintln!(
                "[{} | {} in / {} out]",
                response.model, response.usage.input_tokens, response.usage.output_tokens
            );
            if let Some(code) = response.error {
                return Err(format!("provider call failed: {code}").into());
            }
        }
    }

    Ok(())
}

/// Resolve text input from an optional CLI argument and/or stdin.
///
/// - arg only → arg
/// - stdin only → stdin
/// - both → `"{arg}\n\n{stdin}"`
/// - neither → error
fn resolve_text(arg: Option<String>, command: &str) -> Result<String, Box<dyn std::error::Error>> {
    let stdin_text = if io::stdin().is_terminal() {
        None
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Some(buf.trim().to_string()).filter(|s| !s.is_empty())
    };

    match (arg, stdin_text) {
        (Some(a), Some(s)) => Ok(format!("{a}\n\n{s}")),
        (Some(a), None) => Ok(a),
        (None, Some(s)) => Ok(s),
        (None, None) => {
            Err(format!("{command}: no input provided (pass text as argument or via stdin)").into())
        }
    }
}
