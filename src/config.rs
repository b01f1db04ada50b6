use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATA_PATH: &str = "data/ev_market.csv";

/// Runtime settings, assembled by the binary from its command line.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Dataset to load at startup.
    pub data_path: PathBuf,
    /// Seed for the fallback sample data; `None` picks one at random.
    pub sample_seed: Option<u64>,
    pub notices: NoticeConfig,
    pub export: ExportConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            sample_seed: None,
            notices: NoticeConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// How long transient banners stay on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeConfig {
    pub error_lifetime: Duration,
    pub info_lifetime: Duration,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            error_lifetime: Duration::from_secs(5),
            info_lifetime: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub image_size: (u32, u32),
    pub csv_file_name: String,
    pub png_file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            image_size: (1200, 800),
            csv_file_name: "ev_market_data.csv".to_string(),
            png_file_name: "ev_market_chart.png".to_string(),
        }
    }
}
