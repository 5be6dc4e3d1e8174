//! Command handlers. Each returns the text to print so the binary stays a thin dispatcher.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use conversation_sync::{Conversation, ConversationSyncEngine, MessagesApi};
use flow_config::validate::collect_violations;
use flow_config::{FlowConfig, FlowConfigModel, SettingsStore, TemplateKind, Violation};
use serde::Serialize;
use tracing::info;
use wabot_core::{InMemoryChannel, SessionContext};

const PREVIEW_CHARS: usize = 40;

/// Lowercase wire name of a serde enum value (`"barberia"`, `"table"`, ...).
fn wire_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn preview(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut)
    }
}

pub fn render_settings(config: &FlowConfig) -> String {
    let mut out = String::new();
    let days: Vec<String> = config.working_days.iter().map(wire_name).collect();
    let _ = writeln!(out, "Template: {}", wire_name(&config.template));
    let _ = writeln!(out, "Greeting: {}", preview(&config.greeting));
    let _ = writeln!(
        out,
        "Hours: {}-{} every {} min ({})",
        config.business_hours.start,
        config.business_hours.end,
        config.appointment_interval,
        days.join(", ")
    );
    let _ = writeln!(
        out,
        "Auto-confirm: {}  Reminders: {}",
        config.auto_confirm_appointments, config.reminders.enabled
    );

    let _ = writeln!(out, "Menu ({}):", config.menu_items.len());
    for (i, item) in config.menu_items.iter().enumerate() {
        let mut kind = wire_name(&item.kind);
        if let Some(key) = &item.action_key {
            kind = format!("{}/{}", kind, wire_name(key));
        }
        let fixed = if item.fixed { " (fixed)" } else { "" };
        let _ = writeln!(out, "  {}. {} [{}]{}", i + 1, item.label, kind, fixed);
    }

    let _ = writeln!(out, "Form ({}):", config.form_fields.len());
    for field in &config.form_fields {
        let mut flags = Vec::new();
        if field.required {
            flags.push("required");
        }
        if field.to_modified {
            flags.push("toModified");
        }
        let _ = writeln!(
            out,
            "  - {:<10} {:<24} {:<8} {}",
            field.key,
            field.label,
            wire_name(&field.field_type),
            flags.join(",")
        );
    }
    out
}

pub fn render_conversations(conversations: &[Conversation]) -> String {
    if conversations.is_empty() {
        return "No conversations.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:<20} {:<17} {:>6}  {}",
        "customer", "name", "last_message_at", "unread", "last_message"
    );
    let _ = writeln!(out, "{}", "-".repeat(100));
    for c in conversations {
        let at = c
            .last_message_time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let name = if c.customer_name.is_empty() {
            "-"
        } else {
            c.customer_name.as_str()
        };
        let _ = writeln!(
            out,
            "{:<16} {:<20} {:<17} {:>6}  {}",
            c.customer_wa_id,
            name,
            at,
            c.unread_count,
            preview(&c.last_message)
        );
    }
    out
}

/// Loads the saved settings and renders them (summary or JSON).
pub async fn show_settings(
    store: &dyn SettingsStore,
    session: SessionContext,
    json: bool,
) -> Result<String> {
    let model = FlowConfigModel::load(store, session)
        .await
        .context("Load bot settings (check AUTH_TOKEN and USER_ID)")?;
    if json {
        return Ok(serde_json::to_string_pretty(model.draft())? + "\n");
    }
    Ok(render_settings(model.draft()))
}

/// Resets the flow to `template`. With `dry_run` the cleaned document is returned and nothing
/// is saved.
pub async fn apply_template(
    store: &dyn SettingsStore,
    session: SessionContext,
    template: TemplateKind,
    dry_run: bool,
) -> Result<String> {
    let mut model = FlowConfigModel::load(store, session)
        .await
        .context("Load bot settings (check AUTH_TOKEN and USER_ID)")?;
    model.select_template(template);

    if dry_run {
        model.validate_for_save()?;
        let document = model.build_cleaned_document();
        return Ok(serde_json::to_string_pretty(&document)? + "\n");
    }

    let reply = model.save(store).await.context("Save bot settings")?;
    info!(template = template.as_str(), "template applied");
    Ok(format!(
        "Applied template {}{}\n",
        template.as_str(),
        reply
            .message
            .map(|m| format!(": {}", m))
            .unwrap_or_default()
    ))
}

/// Parses a `botSettings` document and returns every save-time violation.
pub fn validate_file(path: &Path) -> Result<Vec<Violation>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Read {}", path.display()))?;
    let config: FlowConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Parse {} as bot settings", path.display()))?;
    Ok(collect_violations(&config))
}

/// Fetches the conversation snapshot through the sync engine and renders it.
pub async fn list_conversations(
    api: Arc<dyn MessagesApi>,
    session: SessionContext,
    limit: usize,
    unread_only: bool,
) -> Result<String> {
    let channel = Arc::new(InMemoryChannel::new());
    let mut engine = ConversationSyncEngine::new(session, api, channel);
    engine
        .load_conversations()
        .await
        .context("Load conversations")?;

    let mut conversations: Vec<Conversation> = engine
        .conversations()
        .iter()
        .filter(|c| !unread_only || c.unread_count > 0)
        .cloned()
        .collect();
    conversations.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
    conversations.truncate(limit);

    let mut out = render_conversations(&conversations);
    let _ = writeln!(out, "Total unread: {}", engine.total_unread());
    Ok(out)
}
