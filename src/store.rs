use super::*;

pub(super) const DEFAULT_SOCIAL_EMOJI: &str = "🔗";
pub(super) const DEFAULT_MINI_APP_TEXT: &str = "🎮 Mini Application";
const DEFAULT_BUTTONS_PER_ROW: usize = 3;
const MAX_BUTTONS_PER_ROW: usize = 4;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(super) struct SocialNetwork {
    pub(super) name: String,
    pub(super) url: String,
    #[serde(default = "default_social_emoji")]
    pub(super) emoji: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(super) struct MiniApp {
    pub(super) text: String,
    #[serde(default)]
    pub(super) url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct BotConfig {
    pub(super) welcome_message: String,
    pub(super) welcome_image: Option<String>,
    pub(super) info_text: String,
    pub(super) mini_app: Option<MiniApp>,
    pub(super) social_networks: Vec<SocialNetwork>,
    pub(super) social_buttons_per_row: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            welcome_message: "👋 Welcome!".to_string(),
            welcome_image: None,
            info_text: "ℹ️ No information yet.".to_string(),
            mini_app: None,
            social_networks: Vec::new(),
            social_buttons_per_row: DEFAULT_BUTTONS_PER_ROW,
        }
    }
}

impl BotConfig {
    pub(super) fn normalize(&mut self) {
        self.social_buttons_per_row = self.social_buttons_per_row.max(1);
    }

    pub(super) fn mini_app_text(&self) -> &str {
        self.mini_app
            .as_ref()
            .map(|app| app.text.as_str())
            .unwrap_or(DEFAULT_MINI_APP_TEXT)
    }

    /// Next value in the 1..=MAX_BUTTONS_PER_ROW cycle. Larger stored values wrap to 1.
    pub(super) fn cycle_buttons_per_row(&mut self) -> usize {
        self.social_buttons_per_row = if self.social_buttons_per_row >= MAX_BUTTONS_PER_ROW {
            1
        } else {
            self.social_buttons_per_row + 1
        };
        self.social_buttons_per_row
    }
}

fn default_social_emoji() -> String {
    DEFAULT_SOCIAL_EMOJI.to_string()
}

/// Flat-file persistence rooted at the data directory.
pub(super) struct Store {
    config_path: PathBuf,
    users_path: PathBuf,
    admins_path: PathBuf,
    images_dir: PathBuf,
}

impl Store {
    pub(super) fn new(data_dir: &Path) -> Self {
        Store {
            config_path: data_dir.join("config.json"),
            users_path: data_dir.join("users.json"),
            admins_path: data_dir.join("admins.json"),
            images_dir: data_dir.join("images"),
        }
    }

    pub(super) fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.images_dir)
            .with_context(|| format!("create images dir {}", self.images_dir.display()))
    }

    pub(super) fn image_path(&self, name: &str) -> PathBuf {
        self.images_dir.join(name)
    }

    /// Missing file yields the defaults, which are written back immediately.
    pub(super) fn load_config(&self) -> Result<BotConfig> {
        if !self.config_path.exists() {
            let config = BotConfig::default();
            self.save_config(&config)?;
            return Ok(config);
        }
        let data = fs::read_to_string(&self.config_path)
            .with_context(|| format!("read config {}", self.config_path.display()))?;
        let mut config: BotConfig = serde_json::from_str(&data).context("parse config")?;
        config.normalize();
        Ok(config)
    }

    pub(super) fn save_config(&self, config: &BotConfig) -> Result<()> {
        let data = serde_json::to_vec_pretty(config).context("serialize config")?;
        atomic_write(&self.config_path, &data)
    }

    pub(super) fn load_identities(&self, primary_admin: i64) -> Result<Identities> {
        let users = load_ids(&self.users_path)?;
        let admins = load_ids(&self.admins_path)?;
        let identities = Identities::new(primary_admin, users, admins);
        // The primary admin may have been missing from disk.
        self.save_admins(&identities)?;
        Ok(identities)
    }

    pub(super) fn save_users(&self, identities: &Identities) -> Result<()> {
        save_ids(&self.users_path, identities.users())
    }

    pub(super) fn save_admins(&self, identities: &Identities) -> Result<()> {
        save_ids(&self.admins_path, identities.admins())
    }
}

fn load_ids(path: &Path) -> Result<BTreeSet<i64>> {
    if !path.exists() {
        return Ok(BTreeSet::new());
    }
    let data = fs::read_to_string(path).with_context(|| format!("read ids {}", path.display()))?;
    let ids: Vec<i64> =
        serde_json::from_str(&data).with_context(|| format!("parse ids {}", path.display()))?;
    Ok(ids.into_iter().collect())
}

fn save_ids(path: &Path, ids: &BTreeSet<i64>) -> Result<()> {
    let ids: Vec<i64> = ids.iter().copied().collect();
    let data = serde_json::to_vec_pretty(&ids).context("serialize ids")?;
    atomic_write(path, &data)
}
