use clap::Parser;

use crate::config::AppConfig;
use crate::screen::ScreenId;
use crate::theme::ThemePreference;

#[derive(Parser, Debug)]
#[command(name = "eventspark", version, about = "Terminal client for browsing and booking events")]
pub struct Args {
    /// Backend base URL (e.g., "http://localhost:8080")
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Screen to open first
    #[arg(short, long, value_enum, default_value_t = ScreenId::Events)]
    pub screen: ScreenId,

    /// Light/dark preference, overriding the config file
    #[arg(short, long, value_enum)]
    pub theme: Option<ThemePreference>,
}

impl Args {
    /// Layer command-line overrides on top of the loaded config.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(base_url) = &self.base_url {
            config.api.base_url.clone_from(base_url);
        }
        if let Some(theme) = self.theme {
            config.theme.preference = theme;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_events_screen() {
        let args = Args::try_parse_from(["eventspark"]).unwrap();
        assert_eq!(args.screen, ScreenId::Events);
        assert!(args.base_url.is_none());
    }

    #[test]
    fn overrides_config() {
        let args = Args::try_parse_from([
            "eventspark",
            "--base-url",
            "https://tickets.example.com",
            "--screen",
            "login",
            "--theme",
            "dark",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(args.screen, ScreenId::Login);
        assert_eq!(config.api.base_url, "https://tickets.example.com");
        assert_eq!(config.theme.preference, ThemePreference::Dark);
    }

    #[test]
    fn rejects_unknown_screen() {
        assert!(Args::try_parse_from(["eventspark", "--screen", "admin"]).is_err());
    }
}
