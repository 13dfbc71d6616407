use std::path::{Path, PathBuf};
use std::time::Duration;

/// Milliseconds per simulation tick when nothing overrides it.
pub const DEFAULT_TICK_MILLIS: u64 = 600;

#[derive(Debug)]
pub struct AppConfig {
    pub root: PathBuf,
    pub tick_millis: u64,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        if args.len() < 2 {
            return Err("usage: edgeville <data-root> [tick_millis]".to_string());
        }

        let root = Path::new(&args[1]).to_path_buf();
        let tick_millis = if args.len() > 2 {
            parse_tick_millis(&args[2])?
        } else {
            match std::env::var("EDGEVILLE_TICK_MILLIS") {
                Ok(value) if !value.trim().is_empty() => parse_tick_millis(value.trim())?,
                _ => DEFAULT_TICK_MILLIS,
            }
        };

        Ok(Self { root, tick_millis })
    }

    pub fn tick_length(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

fn parse_tick_millis(value: &str) -> Result<u64, String> {
    let millis: u64 = value
        .parse()
        .map_err(|_| format!("invalid tick_millis '{}'", value))?;
    if millis == 0 {
        return Err("tick_millis must be positive".to_string());
    }
    Ok(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    #[test]
    fn requires_a_data_root() {
        assert!(AppConfig::from_args(&args(&["edgeville"])).is_err());
    }

    #[test]
    fn defaults_the_tick_length() {
        let config = AppConfig::from_args(&args(&["edgeville", "data"])).expect("config");
        assert_eq!(config.root, PathBuf::from("data"));
        assert_eq!(config.tick_millis, DEFAULT_TICK_MILLIS);
        assert_eq!(config.tick_length(), Duration::from_millis(600));
    }

    #[test]
    fn accepts_an_explicit_tick_length() {
        let config = AppConfig::from_args(&args(&["edgeville", "data", "50"])).expect("config");
        assert_eq!(config.tick_millis, 50);
    }

    #[test]
    fn rejects_a_zero_tick_length() {
        assert!(AppConfig::from_args(&args(&["edgeville", "data", "0"])).is_err());
    }
}
