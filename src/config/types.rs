use serde::Deserialize;

/// Main configuration structure for Market-Mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub hosts: HostsConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub markers: Markers,
    #[serde(default)]
    pub location: Option<LocationConfig>,
    #[serde(default)]
    pub seeds: SeedsConfig,
}

/// Which item crawler a run drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlerMode {
    #[default]
    Sellers,
    Reviews,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of simultaneous upstream requests
    pub concurrency: u32,

    /// Hard cap on buffered bytes per HTML body
    pub max_bytes: usize,

    /// Wall-clock budget per host attempt (milliseconds)
    pub timeout_ms: u64,

    /// Stop reading a seller page once the early-abort marker is seen
    #[serde(default = "default_true")]
    pub early_abort: bool,

    /// Buffered bytes required before the early-abort marker is tested
    pub early_abort_min_bytes: usize,

    /// Hard cap on buffered bytes per JSON body
    #[serde(default = "default_json_max_bytes")]
    pub json_max_bytes: usize,

    /// Reviews requested per page
    #[serde(default = "default_review_page_size")]
    pub review_page_size: u32,

    /// Upper bound on pages fetched per item
    #[serde(default = "default_max_review_pages")]
    pub max_review_pages: u32,

    /// Lifetime of cached seller pages (seconds)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default)]
    pub mode: CrawlerMode,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Candidate upstream hosts, tried in order
#[derive(Debug, Clone, Deserialize)]
pub struct HostsConfig {
    pub candidates: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite blob store
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Structural markers used to locate regions in upstream HTML
///
/// The upstream markup is treated as a black box; these are the class
/// tokens and patterns that identify the parts we care about.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Markers {
    /// Class tokens the manifesto region's opening tag must carry
    pub manifesto_classes: Vec<String>,

    /// Class token of the label wrapper stripped from the manifesto
    pub manifesto_label_class: String,

    /// Class tokens of the online/joined metadata region
    pub meta_classes: Vec<String>,

    /// Class token identifying the seller's avatar image
    pub image_class: String,

    /// Regex matching placeholder image file names
    pub placeholder_pattern: String,

    /// Regex matching paths of real uploaded assets
    pub asset_path_pattern: String,

    /// Regex tested against a partially read seller page
    pub early_abort_pattern: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            manifesto_classes: vec!["reginald".to_string(), "Bp3".to_string()],
            manifesto_label_class: "manifesto-label".to_string(),
            meta_classes: vec!["subject-meta".to_string()],
            image_class: "subject-avatar".to_string(),
            placeholder_pattern: r"(?i)(placeholder|default[-_]?avatar|blank)\.(png|jpe?g|gif|svg|webp)"
                .to_string(),
            asset_path_pattern: r"(?i)/(avatars?|user-?images|uploads)/".to_string(),
            early_abort_pattern: r#"(?is)class="[^"]*\bsubject-meta\b.*?joined[^<]*<"#
                .to_string(),
        }
    }
}

/// Form fields posted to the location filter endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LocationConfig {
    pub ships_to: String,
    pub source_page: String,
    pub fp: String,
}

/// Default crawl targets used when none are given on the command line
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedsConfig {
    #[serde(default)]
    pub sellers: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_json_max_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_review_page_size() -> u32 {
    20
}

fn default_max_review_pages() -> u32 {
    50
}

fn default_cache_ttl_secs() -> u64 {
    600
}
