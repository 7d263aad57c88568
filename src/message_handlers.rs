use super::*;

const UNSAVED_NOTICE: &str = "⚠️ Writing to disk failed; the change is live but will be lost on restart.";

pub(super) async fn on_text<G: Gateway>(state: &AppState<G>, sender: Sender, text: &str) -> Result<()> {
    match parse_command(text) {
        Some("start") => return handle_start_command(state, sender).await,
        Some("admin") => return handle_admin_command(state, sender).await,
        _ => {}
    }

    let Some(current) = current_dialogue(state, sender.user_id).await else {
        return Ok(());
    };
    delete_inbound(state, sender).await;

    let config = state.config_snapshot().await;
    match advance(current.step.clone(), text, &config) {
        Advance::Next(step) => enter_step(state, sender.user_id, &current, step, None).await,
        Advance::Invalid { retry, reason } => {
            enter_step(state, sender.user_id, &current, retry, Some(&reason)).await
        }
        Advance::Cancelled => {
            finish_dialogue(state, sender.user_id, &current, "❌ Action cancelled.").await
        }
        Advance::Commit(commit) => {
            let outcome = apply_commit(state, commit).await;
            finish_dialogue(state, sender.user_id, &current, &outcome).await
        }
    }
}

pub(super) async fn on_photo<G: Gateway>(
    state: &AppState<G>,
    sender: Sender,
    file_id: &str,
) -> Result<()> {
    let Some(current) = current_dialogue(state, sender.user_id).await else {
        return Ok(());
    };
    delete_inbound(state, sender).await;

    if current.step != DialogueStep::EditingPhoto {
        let step = current.step.clone();
        return enter_step(
            state,
            sender.user_id,
            &current,
            step,
            Some("This step expects text, not a photo."),
        )
        .await;
    }

    let name = welcome_image_name();
    let dest = state.store.image_path(&name);
    if let Err(err) = state.gateway.download_file(file_id, &dest).await {
        error!("welcome photo download failed: {:#}", err);
        return enter_step(
            state,
            sender.user_id,
            &current,
            DialogueStep::EditingPhoto,
            Some("Downloading the photo failed, please send it again."),
        )
        .await;
    }

    let (previous, saved) = {
        let mut config = state.config.lock().await;
        let previous = config.welcome_image.replace(name.clone());
        (previous, state.store.save_config(&config))
    };
    // The old file stays while config.json on disk still names it.
    if saved.is_ok() {
        if let Some(previous) = previous.filter(|previous| *previous != name) {
            remove_image(state, &previous);
        }
    }
    let outcome = persisted("✅ Welcome photo updated.", saved);
    finish_dialogue(state, sender.user_id, &current, &outcome).await
}

async fn handle_start_command<G: Gateway>(state: &AppState<G>, sender: Sender) -> Result<()> {
    {
        let mut identities = state.identities.lock().await;
        if identities.record_user(sender.user_id) {
            info!("new user {}", sender.user_id);
            if let Err(err) = state.store.save_users(&identities) {
                error!("saving users failed: {:#}", err);
            }
        }
    }
    delete_inbound(state, sender).await;

    let config = state.config_snapshot().await;
    let surface = welcome_view(&config, &state.store);
    state
        .surfaces
        .show(&state.gateway, sender.chat_id, &surface)
        .await?;
    Ok(())
}

async fn handle_admin_command<G: Gateway>(state: &AppState<G>, sender: Sender) -> Result<()> {
    if !state.is_admin(sender.user_id).await {
        warn!("user {} tried to open the admin menu", sender.user_id);
        let denial = Surface::text(DENIED_NOTICE, InlineKeyboardMarkup::default());
        state.gateway.send(sender.chat_id, &denial).await?;
        return Ok(());
    }
    delete_inbound(state, sender).await;

    let surface = {
        let identities = state.identities.lock().await;
        admin_menu_view(&identities, None)
    };
    state
        .surfaces
        .show(&state.gateway, sender.chat_id, &surface)
        .await?;
    Ok(())
}

/// The user's in-flight dialogue, dropped if they are no longer an admin.
async fn current_dialogue<G: Gateway>(state: &AppState<G>, user_id: i64) -> Option<DialogueState> {
    let current = state.dialogues.lock().await.get(&user_id).cloned()?;
    if !state.is_admin(user_id).await {
        state.dialogues.lock().await.remove(&user_id);
        return None;
    }
    Some(current)
}

async fn delete_inbound<G: Gateway>(state: &AppState<G>, sender: Sender) {
    if let Err(err) = state.gateway.delete(sender.chat_id, sender.message_id).await {
        debug!("delete of inbound {} ignored: {:#}", sender.message_id.0, err);
    }
}

/// Shows the prompt for `step` on the dialogue surface and records the step.
pub(super) async fn enter_step<G: Gateway>(
    state: &AppState<G>,
    user_id: i64,
    current: &DialogueState,
    step: DialogueStep,
    error: Option<&str>,
) -> Result<()> {
    let surface = prompt_view(&step, error);
    let anchor = state
        .surfaces
        .update(&state.gateway, current.chat_id, current.anchor, &surface)
        .await?;
    state.dialogues.lock().await.insert(
        user_id,
        DialogueState {
            step,
            chat_id: current.chat_id,
            anchor,
        },
    );
    Ok(())
}

/// Ends the dialogue and replaces its surface with the single confirmation.
pub(super) async fn finish_dialogue<G: Gateway>(
    state: &AppState<G>,
    user_id: i64,
    current: &DialogueState,
    outcome: &str,
) -> Result<()> {
    state.dialogues.lock().await.remove(&user_id);
    state
        .surfaces
        .update(&state.gateway, current.chat_id, current.anchor, &result_view(outcome))
        .await?;
    Ok(())
}

/// Applies a finished dialogue and persists it; returns the confirmation text.
pub(super) async fn apply_commit<G: Gateway>(state: &AppState<G>, commit: Commit) -> String {
    match commit {
        Commit::WelcomeMessage(text) => {
            update_config(state, "✅ Welcome message updated.", |config| {
                config.welcome_message = text;
            })
            .await
        }
        Commit::InfoText(text) => {
            update_config(state, "✅ Info page updated.", |config| {
                config.info_text = text;
            })
            .await
        }
        Commit::WelcomeImageCleared => {
            let (previous, saved) = {
                let mut config = state.config.lock().await;
                let previous = config.welcome_image.take();
                (previous, state.store.save_config(&config))
            };
            let done = if previous.is_some() {
                "✅ Welcome photo removed."
            } else {
                "ℹ️ There was no welcome photo."
            };
            if saved.is_ok() {
                if let Some(previous) = &previous {
                    remove_image(state, previous);
                }
            }
            persisted(done, saved)
        }
        Commit::MiniApp { text, url } => {
            let done = if url.is_some() {
                "✅ Mini app updated."
            } else {
                "✅ Mini app link removed."
            };
            update_config(state, done, |config| {
                config.mini_app = Some(MiniApp { text, url });
            })
            .await
        }
        Commit::SocialNetwork(network) => {
            let done = format!("✅ {} {} added.", network.emoji, network.name);
            update_config(state, &done, |config| {
                config.social_networks.push(network);
            })
            .await
        }
        Commit::Broadcast(text) => {
            let (users, admins) = {
                let identities = state.identities.lock().await;
                (identities.users().clone(), identities.admins().clone())
            };
            broadcast(&state.gateway, &users, &admins, &text)
                .await
                .summary()
        }
        Commit::Admin(user_id) => {
            let mut identities = state.identities.lock().await;
            match identities.add_admin(user_id) {
                AddAdminOutcome::Added => {
                    info!("user {} promoted to admin", user_id);
                    persisted(
                        &format!("✅ {} is now an admin.", user_id),
                        state.store.save_admins(&identities),
                    )
                }
                AddAdminOutcome::AlreadyAdmin => format!("ℹ️ {} is already an admin.", user_id),
            }
        }
    }
}

pub(super) async fn update_config<G: Gateway>(
    state: &AppState<G>,
    done: &str,
    mutate: impl FnOnce(&mut BotConfig),
) -> String {
    let mut config = state.config.lock().await;
    mutate(&mut config);
    config.normalize();
    persisted(done, state.store.save_config(&config))
}

/// Confirmation text for a mutation whose save may have failed.
pub(super) fn persisted(done: &str, saved: Result<()>) -> String {
    match saved {
        Ok(()) => done.to_string(),
        Err(err) => {
            error!("persisting change failed: {:#}", err);
            format!("{}\n{}", done, UNSAVED_NOTICE)
        }
    }
}

fn remove_image<G: Gateway>(state: &AppState<G>, name: &str) {
    let path = state.store.image_path(name);
    if path.exists() {
        if let Err(err) = fs::remove_file(&path) {
            warn!("removing old image {} failed: {}", path.display(), err);
        }
    }
}
