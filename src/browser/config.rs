use std::path::PathBuf;
use std::time::Duration;

/// Launch settings for the per-cycle Chrome process
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,

    /// Browser window size
    pub window_size: (u32, u32),

    /// Chrome/Chromium binary; auto-detected when `None`
    pub chrome_path: Option<PathBuf>,

    /// Custom user agent
    pub user_agent: Option<String>,

    /// Disable image loading for performance
    pub disable_images: bool,

    /// Kill the browser when no CDP traffic happened for this long
    pub idle_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            chrome_path: None,
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            disable_images: true,
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl BrowserConfig {
    /// Extra Chrome flags derived from this config.
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-setuid-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
        ];
        if self.disable_images {
            args.push("--blink-settings=imagesEnabled=false".to_string());
        }
        if let Some(ua) = &self.user_agent {
            args.push(format!("--user-agent={}", ua));
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert_eq!(config.window_size, (1920, 1080));
        assert!(config.chrome_path.is_none());
    }

    #[test]
    fn test_chrome_args_follow_flags() {
        let mut config = BrowserConfig::default();
        let args = config.chrome_args();
        assert!(args.iter().any(|a| a == "--no-sandbox"));
        assert!(args.iter().any(|a| a.starts_with("--blink-settings")));
        assert!(args.iter().any(|a| a.starts_with("--user-agent=")));

        config.disable_images = false;
        config.user_agent = None;
        let args = config.chrome_args();
        assert!(!args.iter().any(|a| a.starts_with("--blink-settings")));
        assert!(!args.iter().any(|a| a.starts_with("--user-agent=")));
    }
}
