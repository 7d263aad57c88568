use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use clap::Parser;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, Message, MessageId, ParseMode,
    PhotoSize, WebAppInfo,
};
use tokio::sync::Mutex;
use url::Url;

mod broadcast;
mod callback_handlers;
mod dialogue;
mod gateway;
mod helpers;
mod identities;
mod keyboards;
mod message_handlers;
mod store;
mod surface;


use broadcast::*;
use callback_handlers::*;
use dialogue::*;
use gateway::*;
use helpers::*;
use identities::*;
use keyboards::*;
use message_handlers::*;
use store::*;
use surface::*;

const FAILURE_NOTICE: &str = "❌ Something went wrong. Please try again.";
const DENIED_NOTICE: &str = "⛔ You are not allowed to use the admin menu.";

#[derive(Parser, Debug)]
struct Args {
    /// Optional TOML file providing `token`, `admin_id` and `data_dir`.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,
    #[arg(long, env = "ADMIN_ID")]
    admin_id: Option<i64>,
    #[arg(long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct SettingsFile {
    token: Option<String>,
    admin_id: Option<i64>,
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct Settings {
    token: String,
    primary_admin: i64,
    data_dir: PathBuf,
}

/// In-flight admin dialogue for one user.
#[derive(Clone, Debug, PartialEq, Eq)]
struct DialogueState {
    step: DialogueStep,
    chat_id: ChatId,
    anchor: MessageId,
}

/// Who sent an inbound message, and which message it was.
#[derive(Clone, Copy, Debug)]
struct Sender {
    chat_id: ChatId,
    user_id: i64,
    message_id: MessageId,
}

#[derive(Clone, Debug)]
struct CallbackInput {
    id: String,
    chat_id: ChatId,
    user_id: i64,
    message_id: MessageId,
    data: String,
}

struct AppState<G: Gateway> {
    gateway: G,
    store: Store,
    config: Mutex<BotConfig>,
    identities: Mutex<Identities>,
    dialogues: Mutex<HashMap<i64, DialogueState>>,
    surfaces: Surfaces,
}

impl<G: Gateway> AppState<G> {
    fn new(gateway: G, store: Store, config: BotConfig, identities: Identities) -> Self {
        AppState {
            gateway,
            store,
            config: Mutex::new(config),
            identities: Mutex::new(identities),
            dialogues: Mutex::new(HashMap::new()),
            surfaces: Surfaces::default(),
        }
    }

    async fn is_admin(&self, user_id: i64) -> bool {
        self.identities.lock().await.is_admin(user_id)
    }

    async fn config_snapshot(&self) -> BotConfig {
        self.config.lock().await.clone()
    }
}

type BotState = Arc<AppState<TelegramGateway>>;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    env_logger::init();

    let args = Args::parse();
    let settings = load_settings(args)?;

    let store = Store::new(&settings.data_dir);
    store.prepare()?;
    let config = store.load_config()?;
    let identities = store.load_identities(settings.primary_admin)?;
    info!(
        "loaded config from {} ({} users, {} admins)",
        settings.data_dir.display(),
        identities.users().len(),
        identities.admins().len()
    );

    let bot = Bot::new(settings.token.clone());
    let state: BotState = Arc::new(AppState::new(
        TelegramGateway::new(bot.clone()),
        store,
        config,
        identities,
    ));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    info!("bot started, primary admin {}", settings.primary_admin);
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .distribution_function(|_| Some(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(msg: Message, state: BotState) -> Result<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let sender = Sender {
        chat_id: msg.chat.id,
        user_id: user.id.0 as i64,
        message_id: msg.id,
    };

    let outcome = if let Some(photo) = msg.photo().and_then(pick_best_photo) {
        on_photo(&state, sender, &photo.file.id).await
    } else if let Some(text) = msg.text() {
        on_text(&state, sender, text).await
    } else {
        Ok(())
    };

    report_outcome(&state.gateway, sender.chat_id, sender.user_id, outcome).await;
    Ok(())
}

async fn handle_callback(q: CallbackQuery, state: BotState) -> Result<()> {
    let Some(message) = q.message.as_ref() else {
        state.gateway.answer_callback(&q.id, None).await?;
        return Ok(());
    };
    let input = CallbackInput {
        id: q.id.clone(),
        chat_id: message.chat.id,
        user_id: q.from.id.0 as i64,
        message_id: message.id,
        data: q.data.clone().unwrap_or_default(),
    };

    let outcome = on_callback(&state, &input).await;
    report_outcome(&state.gateway, input.chat_id, input.user_id, outcome).await;
    Ok(())
}

/// Handler errors stop here: logged, and the chat gets the generic notice.
async fn report_outcome<G: Gateway + ?Sized>(
    gateway: &G,
    chat_id: ChatId,
    user_id: i64,
    outcome: Result<()>,
) {
    if let Err(err) = outcome {
        error!("handler failed for user {}: {:#}", user_id, err);
        notify_failure(gateway, chat_id).await;
    }
}

async fn notify_failure<G: Gateway + ?Sized>(gateway: &G, chat_id: ChatId) {
    let notice = Surface::text(FAILURE_NOTICE, InlineKeyboardMarkup::default());
    if let Err(err) = gateway.send(chat_id, &notice).await {
        warn!("failure notice to {} not delivered: {:#}", chat_id.0, err);
    }
}
