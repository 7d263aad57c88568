use super::*;

pub(super) async fn on_callback<G: Gateway>(state: &AppState<G>, input: &CallbackInput) -> Result<()> {
    let Some(action) = CallbackAction::parse(&input.data) else {
        debug!("ignoring unknown callback {:?}", input.data);
        state.gateway.answer_callback(&input.id, None).await?;
        return Ok(());
    };

    if action.requires_admin() && !state.is_admin(input.user_id).await {
        warn!("user {} denied admin action {:?}", input.user_id, action);
        state
            .gateway
            .answer_callback(&input.id, Some(DENIED_NOTICE))
            .await?;
        return Ok(());
    }

    let outcome = run_action(state, input, action).await;
    let alert = match &outcome {
        Ok(alert) => alert.as_deref(),
        Err(_) => None,
    };
    let answer_result = state.gateway.answer_callback(&input.id, alert).await;
    match outcome {
        Ok(_) => {
            answer_result?;
            Ok(())
        }
        Err(err) => {
            if let Err(answer_err) = answer_result {
                error!(
                    "answer callback query failed after callback error: {:#}",
                    answer_err
                );
            }
            Err(err)
        }
    }
}

/// Returns the alert to attach to the callback answer, if any.
async fn run_action<G: Gateway>(
    state: &AppState<G>,
    input: &CallbackInput,
    action: CallbackAction,
) -> Result<Option<String>> {
    match action {
        CallbackAction::Info => {
            let config = state.config_snapshot().await;
            show_on(state, input, &info_view(&config)).await?;
        }
        CallbackAction::Home => {
            let config = state.config_snapshot().await;
            show_on(state, input, &welcome_view(&config, &state.store)).await?;
        }
        CallbackAction::Cancel => {
            state.dialogues.lock().await.remove(&input.user_id);
            show_on(state, input, &result_view("❌ Action cancelled.")).await?;
        }
        CallbackAction::AdminMenu => {
            state.dialogues.lock().await.remove(&input.user_id);
            let surface = {
                let identities = state.identities.lock().await;
                admin_menu_view(&identities, None)
            };
            show_on(state, input, &surface).await?;
        }
        CallbackAction::Close => {
            state.dialogues.lock().await.remove(&input.user_id);
            if state.surfaces.active(input.chat_id).await == Some(input.message_id) {
                state.surfaces.dismiss(&state.gateway, input.chat_id).await;
            } else if let Err(err) = state.gateway.delete(input.chat_id, input.message_id).await {
                debug!("close of stale {} ignored: {:#}", input.message_id.0, err);
            }
        }
        CallbackAction::EditWelcome => start_dialogue(state, input, DialogueStep::EditingWelcome).await?,
        CallbackAction::EditPhoto => start_dialogue(state, input, DialogueStep::EditingPhoto).await?,
        CallbackAction::EditInfo => start_dialogue(state, input, DialogueStep::EditingInfo).await?,
        CallbackAction::EditMiniApp => {
            start_dialogue(state, input, DialogueStep::EditingMiniAppName).await?
        }
        CallbackAction::AddSocial => {
            start_dialogue(state, input, DialogueStep::AddingSocialName).await?
        }
        CallbackAction::Broadcast => {
            start_dialogue(state, input, DialogueStep::BroadcastMessage).await?
        }
        CallbackAction::AddAdmin => start_dialogue(state, input, DialogueStep::AddingAdmin).await?,
        CallbackAction::ManageSocial => {
            let config = state.config_snapshot().await;
            show_on(state, input, &social_view(&config, None)).await?;
        }
        CallbackAction::DeleteSocial { index, fingerprint } => {
            return delete_social(state, input, index, &fingerprint).await;
        }
        CallbackAction::CycleSocialLayout => {
            let (config, outcome) = {
                let mut config = state.config.lock().await;
                let per_row = config.cycle_buttons_per_row();
                let outcome = persisted(
                    &format!("✅ {} per row.", count_label(per_row, "button", "buttons")),
                    state.store.save_config(&config),
                );
                (config.clone(), outcome)
            };
            show_on(state, input, &social_view(&config, Some(&outcome))).await?;
        }
        CallbackAction::ManageAdmins => {
            let surface = {
                let identities = state.identities.lock().await;
                admins_view(&identities, None)
            };
            show_on(state, input, &surface).await?;
        }
        CallbackAction::RemoveAdmin(user_id) => {
            return remove_admin(state, input, user_id).await;
        }
    }
    Ok(None)
}

async fn show_on<G: Gateway>(state: &AppState<G>, input: &CallbackInput, surface: &Surface) -> Result<()> {
    state
        .surfaces
        .update(&state.gateway, input.chat_id, input.message_id, surface)
        .await?;
    Ok(())
}

/// Repurposes the pressed menu message as the dialogue surface.
async fn start_dialogue<G: Gateway>(
    state: &AppState<G>,
    input: &CallbackInput,
    step: DialogueStep,
) -> Result<()> {
    let current = DialogueState {
        step: step.clone(),
        chat_id: input.chat_id,
        anchor: input.message_id,
    };
    enter_step(state, input.user_id, &current, step, None).await
}

async fn delete_social<G: Gateway>(
    state: &AppState<G>,
    input: &CallbackInput,
    index: usize,
    fingerprint: &str,
) -> Result<Option<String>> {
    let (config, notice, alert) = {
        let mut config = state.config.lock().await;
        let current = social_fingerprint(&config.social_networks);
        if current != fingerprint || index >= config.social_networks.len() {
            let alert = "This list is out of date; nothing was removed.".to_string();
            (config.clone(), None, Some(alert))
        } else {
            let removed = config.social_networks.remove(index);
            info!("social network {} removed", removed.name);
            let outcome = persisted(
                &format!("✅ {} {} removed.", removed.emoji, removed.name),
                state.store.save_config(&config),
            );
            (config.clone(), Some(outcome), None)
        }
    };
    show_on(state, input, &social_view(&config, notice.as_deref())).await?;
    Ok(alert)
}

async fn remove_admin<G: Gateway>(
    state: &AppState<G>,
    input: &CallbackInput,
    user_id: i64,
) -> Result<Option<String>> {
    let (surface, alert) = {
        let mut identities = state.identities.lock().await;
        match identities.remove_admin(user_id) {
            RemoveAdminOutcome::Protected => {
                warn!("user {} tried to remove the primary admin", input.user_id);
                return Ok(Some("The primary admin cannot be removed.".to_string()));
            }
            RemoveAdminOutcome::NotFound => {
                (admins_view(&identities, None), Some(format!("{} is not an admin.", user_id)))
            }
            RemoveAdminOutcome::Removed => {
                info!("admin {} removed by {}", user_id, input.user_id);
                let outcome = persisted(
                    &format!("✅ {} is no longer an admin.", user_id),
                    state.store.save_admins(&identities),
                );
                (admins_view(&identities, Some(&outcome)), None)
            }
        }
    };
    state.dialogues.lock().await.remove(&user_id);
    show_on(state, input, &surface).await?;
    Ok(alert)
}
