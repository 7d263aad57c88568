use super::*;

pub(super) fn load_settings(args: Args) -> Result<Settings> {
    let file = match &args.config {
        Some(path) => load_settings_file(path)?,
        None => SettingsFile::default(),
    };

    let token = args
        .token
        .or(file.token)
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| anyhow!("BOT_TOKEN is not set"))?;
    let primary_admin = args
        .admin_id
        .or(file.admin_id)
        .ok_or_else(|| anyhow!("ADMIN_ID is not set"))?;
    if primary_admin <= 0 {
        bail!("ADMIN_ID must be a positive user id, got {}", primary_admin);
    }
    let data_dir = args
        .data_dir
        .or(file.data_dir)
        .unwrap_or_else(|| PathBuf::from("data"));

    Ok(Settings {
        token,
        primary_admin,
        data_dir,
    })
}

pub(super) fn load_settings_file(path: &Path) -> Result<SettingsFile> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let file: SettingsFile = toml::from_str(&contents).context("parse config")?;
    Ok(file)
}

pub(super) fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(data).context("write temp file")?;
    tmp.flush().context("flush temp file")?;
    tmp.as_file_mut().sync_all().context("sync temp file")?;
    tmp.persist(path)
        .map_err(|e| anyhow!("persist temp file: {}", e))?;
    Ok(())
}

pub(super) fn parse_command(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }
    let cmd = first.trim_start_matches('/');
    Some(cmd.split('@').next().unwrap_or(cmd))
}

pub(super) fn pick_best_photo(photos: &[PhotoSize]) -> Option<&PhotoSize> {
    photos
        .iter()
        .max_by_key(|photo| (u64::from(photo.width) * u64::from(photo.height), photo.file.size))
}

/// Absolute http(s) URL, as Telegram URL and web-app buttons require.
pub(super) fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}

pub(super) fn welcome_image_name() -> String {
    format!("welcome_{}.jpg", chrono::Utc::now().timestamp_millis())
}

/// Cheap fingerprint of the social list, embedded in delete buttons at render time.
pub(super) fn social_fingerprint(networks: &[SocialNetwork]) -> String {
    use std::hash::{Hash, Hasher};

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    networks.len().hash(&mut hasher);
    for network in networks {
        network.name.hash(&mut hasher);
        network.url.hash(&mut hasher);
        network.emoji.hash(&mut hasher);
    }
    format!("{:08x}", hasher.finish() as u32)
}

pub(super) fn count_label(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

const HTML_TAGS: &[&str] = &[
    "a",
    "b",
    "blockquote",
    "code",
    "del",
    "em",
    "i",
    "ins",
    "pre",
    "s",
    "span",
    "strike",
    "strong",
    "tg-emoji",
    "tg-spoiler",
    "u",
];

/// Checks `text` against the HTML subset Telegram's parse mode accepts.
pub(super) fn check_telegram_html(text: &str) -> Result<(), String> {
    let mut open: Vec<String> = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find(|c: char| c == '<' || c == '&') {
        let tail = &rest[pos..];
        if tail.starts_with('&') {
            let end = tail
                .find(';')
                .filter(|end| is_html_entity(&tail[1..*end]))
                .ok_or_else(|| "A literal \"&\" must be written as &amp;.".to_string())?;
            rest = &tail[end + 1..];
            continue;
        }

        let end = tail
            .find('>')
            .ok_or_else(|| "A literal \"<\" must be written as &lt;.".to_string())?;
        let inner = &tail[1..end];
        let (closing, inner) = match inner.strip_prefix('/') {
            Some(inner) => (true, inner),
            None => (false, inner),
        };
        let name = inner
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        if !HTML_TAGS.contains(&name.as_str()) {
            return Err(format!(
                "Unsupported tag <{}>. A literal \"<\" must be written as &lt;.",
                inner.trim()
            ));
        }
        if closing {
            if open.pop().as_deref() != Some(name.as_str()) {
                return Err(format!("Unexpected closing tag </{}>.", name));
            }
        } else {
            open.push(name);
        }
        rest = &tail[end + 1..];
    }

    match open.last() {
        Some(name) => Err(format!("Tag <{}> is never closed.", name)),
        None => Ok(()),
    }
}

fn is_html_entity(body: &str) -> bool {
    match body.strip_prefix('#') {
        Some(code) => match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()),
        },
        None => matches!(body, "lt" | "gt" | "amp" | "quot"),
    }
}
