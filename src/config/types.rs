use serde::Deserialize;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub site: SiteConfig,
    pub output: OutputConfig,
    pub schema: SchemaConfig,
}

/// Crawl traversal and retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// First list page to visit (1-based)
    #[serde(rename = "start-page", default = "default_start_page")]
    pub start_page: u32,

    /// Last list page to visit (inclusive); unbounded when absent
    #[serde(rename = "page-ceiling", default)]
    pub page_ceiling: Option<u32>,

    /// Upper bound on item slots attempted per list page
    #[serde(rename = "items-per-page", default = "default_items_per_page")]
    pub items_per_page: u32,

    /// Attempts per navigation step before giving up
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Bounded wait for a ready marker to appear (milliseconds)
    #[serde(rename = "ready-timeout-ms", default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    /// Interval between ready-marker checks (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_page: default_start_page(),
            page_ceiling: None,
            items_per_page: default_items_per_page(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            ready_timeout_ms: default_ready_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_start_page() -> u32 {
    1
}

fn default_items_per_page() -> u32 {
    24
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_ready_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    500
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

impl UserAgentConfig {
    /// Formats the user agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// How the crawl moves from one list page to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pagination {
    /// Substitute the next page number into the list URL template
    Url,
    /// Activate the "next page" control found on the list page
    NextControl,
}

/// Site-specific locators and URLs
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// List page URL template; `{page}` is replaced by the page number
    #[serde(rename = "list-url")]
    pub list_url: String,

    /// Marker present once a list page has loaded
    #[serde(rename = "list-ready")]
    pub list_ready: String,

    /// Matches every item link on a list page, in slot order
    #[serde(rename = "item-link")]
    pub item_link: String,

    /// Marker present once an item detail view has loaded
    #[serde(rename = "item-ready", default)]
    pub item_ready: Option<String>,

    /// Page advance mechanism
    #[serde(default = "default_pagination")]
    pub pagination: Pagination,

    /// The "next page" control
    #[serde(rename = "next-page", default)]
    pub next_page: Option<String>,
}

fn default_pagination() -> Pagination {
    Pagination::Url
}

impl SiteConfig {
    /// Builds the list page URL for a page number
    pub fn list_url_for(&self, page: u32) -> String {
        self.list_url.replace("{page}", &page.to_string())
    }
}

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Tsv,
}

impl ExportFormat {
    /// Field delimiter byte for this format
    pub fn delimiter(&self) -> u8 {
        match self {
            Self::Csv => b',',
            Self::Tsv => b'\t',
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the tabular export
    pub path: String,

    /// Export format
    #[serde(default = "default_format")]
    pub format: ExportFormat,

    /// Placeholder written for fields that could not be located
    #[serde(rename = "missing-value", default = "default_missing_value")]
    pub missing_value: String,

    /// Path to the markdown run summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

fn default_format() -> ExportFormat {
    ExportFormat::Csv
}

fn default_missing_value() -> String {
    "N/A".to_string()
}

/// Field schema configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    /// Matches each labeled section of the detail view's aside
    #[serde(default)]
    pub section: Option<String>,

    /// Heading inside a section, relative to the section
    #[serde(rename = "section-heading", default)]
    pub section_heading: Option<String>,

    /// Field descriptors in column order
    pub fields: Vec<FieldEntry>,
}

/// One declared field
#[derive(Debug, Clone, Deserialize)]
pub struct FieldEntry {
    pub name: String,

    #[serde(flatten)]
    pub kind: FieldKindEntry,
}

/// Kind-specific settings of a declared field
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldKindEntry {
    /// Text of the first element matching `locator`
    Text { locator: String },

    /// Texts of the first `capacity` elements matching `locator`
    List { locator: String, capacity: usize },

    /// Entries of the aside section whose heading equals `heading`
    Section {
        heading: String,
        entry: String,
        capacity: usize,
    },

    /// A fixed value written into every record
    Constant {
        #[serde(default)]
        value: String,
    },
}
