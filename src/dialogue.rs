use super::*;

const CANCEL_TOKENS: &[&str] = &["supprimer", "cancel", "/cancel"];
const SKIP_TOKENS: &[&str] = &["skip", "/skip"];
const MAX_CAPTION_LEN: usize = 1024;
const MAX_MESSAGE_LEN: usize = 4096;

/// One step of a multi-step admin dialogue. Idle is the absence of a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum DialogueStep {
    EditingWelcome,
    EditingPhoto,
    EditingInfo,
    EditingMiniAppName,
    EditingMiniAppUrl { text: String },
    AddingSocialName,
    AddingSocialUrl { name: String },
    AddingSocialEmoji { name: String, url: String },
    BroadcastMessage,
    AddingAdmin,
}

/// Accumulated input of a finished dialogue, ready to apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum Commit {
    WelcomeMessage(String),
    WelcomeImageCleared,
    InfoText(String),
    MiniApp { text: String, url: Option<String> },
    SocialNetwork(SocialNetwork),
    Broadcast(String),
    Admin(i64),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum Advance {
    Next(DialogueStep),
    Commit(Commit),
    Invalid {
        retry: DialogueStep,
        reason: String,
    },
    Cancelled,
}

impl DialogueStep {
    pub(super) fn prompt(&self) -> String {
        match self {
            DialogueStep::EditingWelcome => "📝 Send the new welcome message (HTML allowed).".into(),
            DialogueStep::EditingPhoto => {
                "🖼️ Send the new welcome photo, or \"supprimer\" to remove the current one.".into()
            }
            DialogueStep::EditingInfo => "ℹ️ Send the new text for the info page (HTML allowed).".into(),
            DialogueStep::EditingMiniAppName => {
                "📱 Send the mini app button label, or /skip to keep the current one.".into()
            }
            DialogueStep::EditingMiniAppUrl { text } => format!(
                "📱 Button: {}\nSend the mini app URL, or \"supprimer\" to remove the link.",
                text
            ),
            DialogueStep::AddingSocialName => "➕ Send the social network name.".into(),
            DialogueStep::AddingSocialUrl { name } => {
                format!("🔗 Send the URL for {}.", name)
            }
            DialogueStep::AddingSocialEmoji { name, .. } => format!(
                "😀 Send an emoji for {}, or /skip to use {}.",
                name, DEFAULT_SOCIAL_EMOJI
            ),
            DialogueStep::BroadcastMessage => "📢 Send the message to broadcast.".into(),
            DialogueStep::AddingAdmin => "👤 Send the numeric user id of the new admin.".into(),
        }
    }
}

pub(super) fn is_cancel_token(input: &str) -> bool {
    let input = input.trim();
    CANCEL_TOKENS
        .iter()
        .any(|token| input.eq_ignore_ascii_case(token))
}

pub(super) fn is_skip_token(input: &str) -> bool {
    let input = input.trim();
    SKIP_TOKENS.iter().any(|token| input.eq_ignore_ascii_case(token))
}

/// Feeds one piece of free text into the current step.
pub(super) fn advance(step: DialogueStep, input: &str, config: &BotConfig) -> Advance {
    let input = input.trim();

    // In the clearable steps the cancel token empties the field instead of aborting.
    if is_cancel_token(input) {
        return match step {
            DialogueStep::EditingMiniAppUrl { text } => {
                Advance::Commit(Commit::MiniApp { text, url: None })
            }
            DialogueStep::EditingPhoto => Advance::Commit(Commit::WelcomeImageCleared),
            _ => Advance::Cancelled,
        };
    }

    if input.is_empty() {
        return invalid(step, "The message is empty.");
    }

    match step {
        DialogueStep::EditingWelcome => {
            if input.chars().count() > MAX_CAPTION_LEN {
                return invalid(
                    DialogueStep::EditingWelcome,
                    format!("The welcome message must fit in {} characters.", MAX_CAPTION_LEN),
                );
            }
            if let Err(reason) = check_telegram_html(input) {
                return invalid(DialogueStep::EditingWelcome, reason);
            }
            Advance::Commit(Commit::WelcomeMessage(input.to_string()))
        }
        DialogueStep::EditingPhoto => invalid(DialogueStep::EditingPhoto, "Please send a photo."),
        DialogueStep::EditingInfo => {
            if input.chars().count() > MAX_MESSAGE_LEN {
                return invalid(
                    DialogueStep::EditingInfo,
                    format!("The info text must fit in {} characters.", MAX_MESSAGE_LEN),
                );
            }
            if let Err(reason) = check_telegram_html(input) {
                return invalid(DialogueStep::EditingInfo, reason);
            }
            Advance::Commit(Commit::InfoText(input.to_string()))
        }
        DialogueStep::EditingMiniAppName => {
            let text = if is_skip_token(input) {
                config.mini_app_text().to_string()
            } else {
                input.to_string()
            };
            Advance::Next(DialogueStep::EditingMiniAppUrl { text })
        }
        DialogueStep::EditingMiniAppUrl { text } => match parse_http_url(input) {
            Some(_) => Advance::Commit(Commit::MiniApp {
                text,
                url: Some(input.to_string()),
            }),
            None => invalid(
                DialogueStep::EditingMiniAppUrl { text },
                "That is not a valid http(s) URL.",
            ),
        },
        DialogueStep::AddingSocialName => Advance::Next(DialogueStep::AddingSocialUrl {
            name: input.to_string(),
        }),
        DialogueStep::AddingSocialUrl { name } => match parse_http_url(input) {
            Some(_) => Advance::Next(DialogueStep::AddingSocialEmoji {
                name,
                url: input.to_string(),
            }),
            None => invalid(
                DialogueStep::AddingSocialUrl { name },
                "That is not a valid http(s) URL.",
            ),
        },
        DialogueStep::AddingSocialEmoji { name, url } => {
            let emoji = if is_skip_token(input) {
                DEFAULT_SOCIAL_EMOJI.to_string()
            } else {
                input.to_string()
            };
            Advance::Commit(Commit::SocialNetwork(SocialNetwork { name, url, emoji }))
        }
        DialogueStep::BroadcastMessage => {
            if input.chars().count() > MAX_MESSAGE_LEN {
                return invalid(
                    DialogueStep::BroadcastMessage,
                    format!("Broadcasts must fit in {} characters.", MAX_MESSAGE_LEN),
                );
            }
            Advance::Commit(Commit::Broadcast(input.to_string()))
        }
        DialogueStep::AddingAdmin => match input.parse::<i64>() {
            Ok(id) if id > 0 => Advance::Commit(Commit::Admin(id)),
            _ => invalid(
                DialogueStep::AddingAdmin,
                "User ids are positive whole numbers.",
            ),
        },
    }
}

fn invalid(retry: DialogueStep, reason: impl Into<String>) -> Advance {
    Advance::Invalid {
        retry,
        reason: reason.into(),
    }
}
