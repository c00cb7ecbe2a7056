//! Configuration access port.

pub trait ConfigPort {
    fn get_str(&self, section: &str, key: &str) -> Option<String>;
    fn get_i64(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_f64(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// All key/value pairs of a section, in file order where the backing
    /// store preserves it. Used for table-valued sections such as the
    /// sector map.
    fn section_pairs(&self, section: &str) -> Vec<(String, String)>;
}
