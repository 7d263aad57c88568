use super::*;

/// Every callback payload the bot renders, and therefore accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum CallbackAction {
    Info,
    Home,
    Cancel,
    AdminMenu,
    Close,
    EditWelcome,
    EditPhoto,
    EditInfo,
    EditMiniApp,
    ManageSocial,
    AddSocial,
    DeleteSocial { index: usize, fingerprint: String },
    CycleSocialLayout,
    Broadcast,
    ManageAdmins,
    AddAdmin,
    RemoveAdmin(i64),
}

impl CallbackAction {
    pub(super) fn parse(data: &str) -> Option<Self> {
        let action = match data {
            "info" => CallbackAction::Info,
            "home" => CallbackAction::Home,
            "cancel" => CallbackAction::Cancel,
            "admin_menu" => CallbackAction::AdminMenu,
            "admin_close" => CallbackAction::Close,
            "admin_edit_welcome" => CallbackAction::EditWelcome,
            "admin_edit_photo" => CallbackAction::EditPhoto,
            "admin_edit_info" => CallbackAction::EditInfo,
            "admin_edit_miniapp" => CallbackAction::EditMiniApp,
            "admin_manage_social" => CallbackAction::ManageSocial,
            "admin_add_social" => CallbackAction::AddSocial,
            "admin_social_layout" => CallbackAction::CycleSocialLayout,
            "admin_broadcast" => CallbackAction::Broadcast,
            "admin_manage_admins" => CallbackAction::ManageAdmins,
            "admin_add_admin" => CallbackAction::AddAdmin,
            other => {
                let mut parts = other.split(':');
                match parts.next()? {
                    "admin_del_social" => {
                        let index = parts.next()?.parse::<usize>().ok()?;
                        let fingerprint = parts.next()?.to_string();
                        CallbackAction::DeleteSocial { index, fingerprint }
                    }
                    "admin_rm_admin" => CallbackAction::RemoveAdmin(parts.next()?.parse().ok()?),
                    _ => return None,
                }
            }
        };
        Some(action)
    }

    pub(super) fn data(&self) -> String {
        match self {
            CallbackAction::Info => "info".into(),
            CallbackAction::Home => "home".into(),
            CallbackAction::Cancel => "cancel".into(),
            CallbackAction::AdminMenu => "admin_menu".into(),
            CallbackAction::Close => "admin_close".into(),
            CallbackAction::EditWelcome => "admin_edit_welcome".into(),
            CallbackAction::EditPhoto => "admin_edit_photo".into(),
            CallbackAction::EditInfo => "admin_edit_info".into(),
            CallbackAction::EditMiniApp => "admin_edit_miniapp".into(),
            CallbackAction::ManageSocial => "admin_manage_social".into(),
            CallbackAction::AddSocial => "admin_add_social".into(),
            CallbackAction::DeleteSocial { index, fingerprint } => {
                format!("admin_del_social:{}:{}", index, fingerprint)
            }
            CallbackAction::CycleSocialLayout => "admin_social_layout".into(),
            CallbackAction::Broadcast => "admin_broadcast".into(),
            CallbackAction::ManageAdmins => "admin_manage_admins".into(),
            CallbackAction::AddAdmin => "admin_add_admin".into(),
            CallbackAction::RemoveAdmin(id) => format!("admin_rm_admin:{}", id),
        }
    }

    pub(super) fn requires_admin(&self) -> bool {
        !matches!(
            self,
            CallbackAction::Info | CallbackAction::Home | CallbackAction::Cancel
        )
    }
}

fn button(label: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.data())
}

pub(super) fn main_keyboard(config: &BotConfig) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    if let Some(app) = &config.mini_app {
        if let Some(url) = app.url.as_deref().and_then(parse_http_url) {
            rows.push(vec![InlineKeyboardButton::web_app(
                app.text.clone(),
                WebAppInfo { url },
            )]);
        }
    }

    rows.push(vec![button("ℹ️ Info", CallbackAction::Info)]);

    let mut current_row = Vec::new();
    for network in &config.social_networks {
        let Some(url) = parse_http_url(&network.url) else {
            warn!("skipping social network {} with invalid url", network.name);
            continue;
        };
        current_row.push(InlineKeyboardButton::url(
            format!("{} {}", network.emoji, network.name),
            url,
        ));
        if current_row.len() == config.social_buttons_per_row.max(1) {
            rows.push(std::mem::take(&mut current_row));
        }
    }
    if !current_row.is_empty() {
        rows.push(current_row);
    }

    InlineKeyboardMarkup::new(rows)
}

pub(super) fn admin_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("📝 Welcome message", CallbackAction::EditWelcome)],
        vec![button("🖼️ Welcome photo", CallbackAction::EditPhoto)],
        vec![button("📱 Mini app", CallbackAction::EditMiniApp)],
        vec![button("🌐 Social networks", CallbackAction::ManageSocial)],
        vec![button("ℹ️ Info page", CallbackAction::EditInfo)],
        vec![button("📢 Broadcast", CallbackAction::Broadcast)],
        vec![button("👥 Admins", CallbackAction::ManageAdmins)],
        vec![button("❌ Close", CallbackAction::Close)],
    ])
}

pub(super) fn social_keyboard(config: &BotConfig) -> InlineKeyboardMarkup {
    let fingerprint = social_fingerprint(&config.social_networks);
    let mut rows = Vec::new();
    for (index, network) in config.social_networks.iter().enumerate() {
        rows.push(vec![button(
            format!("❌ {} {}", network.emoji, network.name),
            CallbackAction::DeleteSocial {
                index,
                fingerprint: fingerprint.clone(),
            },
        )]);
    }
    rows.push(vec![button("➕ Add network", CallbackAction::AddSocial)]);
    rows.push(vec![button(
        format!("↔️ Buttons per row: {}", config.social_buttons_per_row),
        CallbackAction::CycleSocialLayout,
    )]);
    rows.push(vec![button("⬅️ Back", CallbackAction::AdminMenu)]);
    InlineKeyboardMarkup::new(rows)
}

pub(super) fn admins_keyboard(identities: &Identities) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    for admin in identities.admins() {
        if *admin == identities.primary_admin() {
            continue;
        }
        rows.push(vec![button(
            format!("❌ Remove {}", admin),
            CallbackAction::RemoveAdmin(*admin),
        )]);
    }
    rows.push(vec![button("➕ Add admin", CallbackAction::AddAdmin)]);
    rows.push(vec![button("⬅️ Back", CallbackAction::AdminMenu)]);
    InlineKeyboardMarkup::new(rows)
}

pub(super) fn cancel_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("❌ Cancel", CallbackAction::Cancel)]])
}

pub(super) fn back_to_admin_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("⬅️ Admin menu", CallbackAction::AdminMenu)]])
}

pub(super) fn welcome_view(config: &BotConfig, store: &Store) -> Surface {
    let surface = Surface::text(config.welcome_message.clone(), main_keyboard(config)).html();
    match &config.welcome_image {
        Some(name) => {
            let path = store.image_path(name);
            if path.exists() {
                surface.with_photo(path)
            } else {
                warn!("welcome image {} is missing", path.display());
                surface
            }
        }
        None => surface,
    }
}

pub(super) fn info_view(config: &BotConfig) -> Surface {
    let keyboard = InlineKeyboardMarkup::new(vec![vec![button("⬅️ Back", CallbackAction::Home)]]);
    Surface::text(config.info_text.clone(), keyboard).html()
}

pub(super) fn admin_menu_view(identities: &Identities, notice: Option<&str>) -> Surface {
    let mut text = String::new();
    if let Some(notice) = notice {
        text.push_str(notice);
        text.push_str("\n\n");
    }
    text.push_str(&format!(
        "🔧 Admin menu\n{} · {}",
        count_label(identities.users().len(), "user", "users"),
        count_label(identities.admins().len(), "admin", "admins")
    ));
    Surface::text(text, admin_keyboard())
}

pub(super) fn social_view(config: &BotConfig, notice: Option<&str>) -> Surface {
    let mut text = String::new();
    if let Some(notice) = notice {
        text.push_str(notice);
        text.push_str("\n\n");
    }
    text.push_str("🌐 Social networks\n");
    if config.social_networks.is_empty() {
        text.push_str("No networks yet.");
    } else {
        for (index, network) in config.social_networks.iter().enumerate() {
            text.push_str(&format!(
                "{}. {} {}: {}\n",
                index + 1,
                network.emoji,
                network.name,
                network.url
            ));
        }
    }
    Surface::text(text.trim_end(), social_keyboard(config))
}

pub(super) fn admins_view(identities: &Identities, notice: Option<&str>) -> Surface {
    let mut text = String::new();
    if let Some(notice) = notice {
        text.push_str(notice);
        text.push_str("\n\n");
    }
    text.push_str("👥 Admins\n");
    for admin in identities.admins() {
        if *admin == identities.primary_admin() {
            text.push_str(&format!("• {} (primary)\n", admin));
        } else {
            text.push_str(&format!("• {}\n", admin));
        }
    }
    Surface::text(text.trim_end(), admins_keyboard(identities))
}

pub(super) fn prompt_view(step: &DialogueStep, error: Option<&str>) -> Surface {
    let text = match error {
        Some(error) => format!("⚠️ {}\n\n{}", error, step.prompt()),
        None => step.prompt(),
    };
    Surface::text(text, cancel_keyboard())
}

pub(super) fn result_view(text: impl Into<String>) -> Surface {
    Surface::text(text, back_to_admin_keyboard())
}
