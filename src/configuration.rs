use chrono::FixedOffset;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> String;
    fn admin_password(&self) -> Option<String>;
    /// Offset of the single time zone all wall-clock values are read in.
    fn utc_offset(&self) -> FixedOffset;
    fn page_size(&self) -> usize;
}
