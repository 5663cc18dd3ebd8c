use std::sync::Arc;

use futures::StreamExt;
use vigil::audit::AuditLog;
use vigil::channels::TelegramChannel;
use vigil::commands;
use vigil::config::Config;
use vigil::context::ContextCache;
use vigil::pipeline::{ModerationPipeline, ModeratorApi};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Missing platform credential is the only fatal startup condition.
    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  export TELEGRAM_BOT_TOKEN=123456:ABC...");
            std::process::exit(1);
        }
    };

    eprintln!("🛡️ Vigil v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Thresholds: mute {} / escalate {} / ban {}",
        config.thresh_temp_mute, config.thresh_escalate, config.thresh_auto_ban
    );
    eprintln!(
        "   Actions: delete={} warn={} mute={} auto_ban={}",
        config.delete_message, config.warn_user, config.temp_mute, config.auto_ban
    );
    eprintln!(
        "   Tier A: {}",
        if config.openai_api_key.is_some() {
            "enabled"
        } else {
            "disabled (scores neutral)"
        }
    );
    eprintln!(
        "   Tier B: {}",
        config.tier_b_endpoint.as_deref().unwrap_or("disabled")
    );
    eprintln!(
        "   Mod queue: {}",
        if config.mod_queue_chat_id == 0 {
            "not configured".to_string()
        } else {
            config.mod_queue_chat_id.to_string()
        }
    );
    eprintln!("   Audit log: {}\n", config.audit_log_path.display());

    let channel = Arc::new(TelegramChannel::new(
        config.bot_token.clone(),
        config.mod_queue_chat_id,
    ));

    if let Err(e) = channel.register_commands().await {
        tracing::warn!(error = %e, "Command registration failed");
    }

    let audit = AuditLog::new(config.audit_log_path.clone());
    let api: Arc<dyn ModeratorApi> = channel.clone();
    let pipeline = ModerationPipeline::new(Arc::clone(&config), api, audit.clone());

    let mut context = ContextCache::new();
    let mut messages = channel.start();

    while let Some(message) = messages.next().await {
        if message.author_is_bot || !message.is_group() {
            continue;
        }
        if message.text.trim().is_empty() {
            continue;
        }

        if let Some(command) = commands::parse(&message.text) {
            commands::handle(&command, &message, &channel, &audit, &config).await;
            continue;
        }

        // Snapshot before push so a message never appears in its own context.
        let snippet = context.snapshot(message.chat_id, config.context_window);
        context.push(message.chat_id, &message.author_name, &message.text);

        let _ = pipeline.handle_message(&message, &snippet).await;
    }

    Ok(())
}
