use crate::configuration::Configuration;
use chrono::{FixedOffset, Offset, Utc};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "meeting_planner", about = "Meeting time coordination backend")]
pub struct ConfigurationHandler {
    #[arg(long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Requests carrying this value in `x-admin-password` act as admin.
    #[arg(long, env = "ADMIN_PASSWORD")]
    admin_password: Option<String>,

    #[arg(long, env = "UTC_OFFSET_HOURS", default_value_t = 9, allow_hyphen_values = true)]
    utc_offset_hours: i32,

    #[arg(long, env = "PAGE_SIZE", default_value_t = 30)]
    page_size: usize,
}

impl ConfigurationHandler {
    pub fn parse_arguments() -> Self {
        Self::parse()
    }
}

impl Configuration for ConfigurationHandler {
    fn port(&self) -> String {
        self.port.to_string()
    }

    fn admin_password(&self) -> Option<String> {
        self.admin_password.clone()
    }

    fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    fn page_size(&self) -> usize {
        self.page_size.max(1)
    }
}
